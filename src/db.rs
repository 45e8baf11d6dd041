use anyhow::Context;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::{
    ArchivedCourse, Component, ComponentSetup, Course, CourseSetup, Module, ModuleSetup, Year,
    YearSetup,
};

pub async fn init_db(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS courses (
            id BLOB PRIMARY KEY,
            name TEXT NOT NULL,
            is_archived INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS years (
            id BLOB PRIMARY KEY,
            course_id BLOB NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
            year_number INTEGER NOT NULL,
            weight REAL NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS modules (
            id BLOB PRIMARY KEY,
            year_id BLOB NOT NULL REFERENCES years(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            credits INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS components (
            id BLOB PRIMARY KEY,
            module_id BLOB NOT NULL REFERENCES modules(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            weight REAL NOT NULL,
            grade REAL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn seed(pool: &SqlitePool) -> anyhow::Result<()> {
    let setup = CourseSetup {
        name: "BSc Computer Science".to_string(),
        years: vec![
            YearSetup {
                year_number: 1,
                weight: 10.0,
                modules: vec![
                    ModuleSetup {
                        name: "Data Structures".to_string(),
                        credits: 15,
                        components: vec![ComponentSetup {
                            name: "Exam".to_string(),
                            weight: 100.0,
                            grade: Some(70.0),
                        }],
                    },
                    ModuleSetup {
                        name: "Web Technologies".to_string(),
                        credits: 15,
                        components: vec![ComponentSetup {
                            name: "Project".to_string(),
                            weight: 100.0,
                            grade: Some(90.0),
                        }],
                    },
                ],
            },
            YearSetup {
                year_number: 2,
                weight: 30.0,
                modules: vec![
                    ModuleSetup {
                        name: "Advanced Programming".to_string(),
                        credits: 30,
                        components: vec![
                            ComponentSetup {
                                name: "Exam".to_string(),
                                weight: 60.0,
                                grade: Some(60.0),
                            },
                            ComponentSetup {
                                name: "Coursework".to_string(),
                                weight: 40.0,
                                grade: Some(60.0),
                            },
                        ],
                    },
                    ModuleSetup {
                        name: "Databases".to_string(),
                        credits: 30,
                        components: vec![ComponentSetup {
                            name: "Project".to_string(),
                            weight: 100.0,
                            grade: Some(50.0),
                        }],
                    },
                ],
            },
            YearSetup {
                year_number: 3,
                weight: 60.0,
                modules: vec![ModuleSetup {
                    name: "Dissertation".to_string(),
                    credits: 60,
                    components: vec![ComponentSetup {
                        name: "Thesis".to_string(),
                        weight: 100.0,
                        grade: None,
                    }],
                }],
            },
        ],
    };

    setup_course(pool, &setup).await?;
    Ok(())
}

/// Create the active course, or replace the structure of the existing one.
/// Replacement deletes the old years; the cascade removes their modules
/// and components.
pub async fn setup_course(pool: &SqlitePool, setup: &CourseSetup) -> anyhow::Result<Uuid> {
    let mut tx = pool.begin().await?;
    let now = Utc::now();

    let existing = sqlx::query("SELECT id FROM courses WHERE is_archived = 0")
        .fetch_optional(&mut *tx)
        .await?;

    let course_id = match existing {
        Some(row) => {
            let id: Uuid = row.get("id");
            sqlx::query("UPDATE courses SET name = ?, updated_at = ? WHERE id = ?")
                .bind(&setup.name)
                .bind(now)
                .bind(id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM years WHERE course_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            id
        }
        None => {
            let id = Uuid::new_v4();
            sqlx::query(
                "INSERT INTO courses (id, name, is_archived, created_at, updated_at) \
                 VALUES (?, ?, 0, ?, ?)",
            )
            .bind(id)
            .bind(&setup.name)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;
            id
        }
    };

    for year in setup.years.iter() {
        let year_id = Uuid::new_v4();
        sqlx::query("INSERT INTO years (id, course_id, year_number, weight) VALUES (?, ?, ?, ?)")
            .bind(year_id)
            .bind(course_id)
            .bind(year.year_number)
            .bind(year.weight)
            .execute(&mut *tx)
            .await?;

        for module in year.modules.iter() {
            let module_id = Uuid::new_v4();
            sqlx::query("INSERT INTO modules (id, year_id, name, credits) VALUES (?, ?, ?, ?)")
                .bind(module_id)
                .bind(year_id)
                .bind(&module.name)
                .bind(module.credits)
                .execute(&mut *tx)
                .await?;

            for component in module.components.iter() {
                sqlx::query(
                    "INSERT INTO components (id, module_id, name, weight, grade) \
                     VALUES (?, ?, ?, ?, ?)",
                )
                .bind(Uuid::new_v4())
                .bind(module_id)
                .bind(&component.name)
                .bind(component.weight)
                .bind(component.grade)
                .execute(&mut *tx)
                .await?;
            }
        }
    }

    tx.commit().await?;
    Ok(course_id)
}

/// Load the active course as an owned tree, children in insertion order.
pub async fn fetch_active_course(pool: &SqlitePool) -> anyhow::Result<Option<Course>> {
    let row = sqlx::query(
        "SELECT id, name, created_at, updated_at FROM courses WHERE is_archived = 0 LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;

    let row = match row {
        Some(row) => row,
        None => return Ok(None),
    };

    let course_id: Uuid = row.get("id");
    let mut years = Vec::new();

    let year_rows = sqlx::query(
        "SELECT id, year_number, weight FROM years WHERE course_id = ? ORDER BY year_number",
    )
    .bind(course_id)
    .fetch_all(pool)
    .await?;

    for year_row in year_rows {
        let year_id: Uuid = year_row.get("id");
        let mut modules = Vec::new();

        let module_rows =
            sqlx::query("SELECT id, name, credits FROM modules WHERE year_id = ? ORDER BY rowid")
                .bind(year_id)
                .fetch_all(pool)
                .await?;

        for module_row in module_rows {
            let module_id: Uuid = module_row.get("id");
            let mut components = Vec::new();

            let component_rows = sqlx::query(
                "SELECT name, weight, grade FROM components WHERE module_id = ? ORDER BY rowid",
            )
            .bind(module_id)
            .fetch_all(pool)
            .await?;

            for component_row in component_rows {
                components.push(Component {
                    name: component_row.get("name"),
                    weight: component_row.get("weight"),
                    grade: component_row.get("grade"),
                });
            }

            modules.push(Module {
                name: module_row.get("name"),
                credits: module_row.get("credits"),
                components,
            });
        }

        years.push(Year {
            year_number: year_row.get("year_number"),
            weight: year_row.get("weight"),
            modules,
        });
    }

    Ok(Some(Course {
        name: row.get("name"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        years,
    }))
}

pub async fn find_component_id(
    pool: &SqlitePool,
    year_number: i32,
    module_name: &str,
    component_name: &str,
) -> anyhow::Result<Option<Uuid>> {
    let row = sqlx::query(
        "SELECT c.id FROM components c \
         JOIN modules m ON m.id = c.module_id \
         JOIN years y ON y.id = m.year_id \
         JOIN courses co ON co.id = y.course_id \
         WHERE co.is_archived = 0 AND y.year_number = ? AND m.name = ? AND c.name = ?",
    )
    .bind(year_number)
    .bind(module_name)
    .bind(component_name)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| row.get("id")))
}

/// Set or clear a single component grade and bump the course timestamp.
pub async fn update_component_grade(
    pool: &SqlitePool,
    component_id: Uuid,
    grade: Option<f64>,
) -> anyhow::Result<()> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query("UPDATE components SET grade = ? WHERE id = ?")
        .bind(grade)
        .bind(component_id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        anyhow::bail!("component not found");
    }

    sqlx::query("UPDATE courses SET updated_at = ? WHERE is_archived = 0")
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// Clear every component grade on the active course, keeping the structure.
pub async fn reset_grades(pool: &SqlitePool) -> anyhow::Result<u64> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "UPDATE components SET grade = NULL WHERE module_id IN (\
         SELECT m.id FROM modules m \
         JOIN years y ON y.id = m.year_id \
         JOIN courses co ON co.id = y.course_id \
         WHERE co.is_archived = 0)",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query("UPDATE courses SET updated_at = ? WHERE is_archived = 0")
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(result.rows_affected())
}

pub async fn archive_course(pool: &SqlitePool) -> anyhow::Result<Uuid> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query("SELECT id FROM courses WHERE is_archived = 0")
        .fetch_optional(&mut *tx)
        .await?;

    let course_id: Uuid = match row {
        Some(row) => row.get("id"),
        None => anyhow::bail!("no active course to archive"),
    };

    sqlx::query("UPDATE courses SET is_archived = 1, updated_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(course_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(course_id)
}

pub async fn fetch_archived(pool: &SqlitePool) -> anyhow::Result<Vec<ArchivedCourse>> {
    let rows = sqlx::query(
        "SELECT id, name, created_at, updated_at FROM courses \
         WHERE is_archived = 1 ORDER BY updated_at DESC",
    )
    .fetch_all(pool)
    .await?;

    let mut courses = Vec::new();
    for row in rows {
        courses.push(ArchivedCourse {
            id: row.get("id"),
            name: row.get("name"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        });
    }

    Ok(courses)
}

pub async fn import_grades_csv(
    pool: &SqlitePool,
    csv_path: &std::path::Path,
) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        year_number: i32,
        module: String,
        component: String,
        grade: f64,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut updated = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        if !(0.0..=100.0).contains(&row.grade) {
            anyhow::bail!(
                "grade {} for {} must be between 0 and 100",
                row.grade,
                row.component
            );
        }

        let component_id = find_component_id(pool, row.year_number, &row.module, &row.component)
            .await?
            .with_context(|| {
                format!(
                    "no component {} in module {} (year {})",
                    row.component, row.module, row.year_number
                )
            })?;

        update_component_grade(pool, component_id, Some(row.grade)).await?;
        updated += 1;
    }

    Ok(updated)
}
