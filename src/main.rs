use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgGroup, Parser, Subcommand};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

mod db;
mod grades;
mod models;
mod report;

#[derive(Parser)]
#[command(name = "grade-tracker")]
#[command(about = "Weighted grade tracker for a degree course", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a sample three-year course
    Seed,
    /// Create or replace the active course from a JSON file
    Setup {
        #[arg(long)]
        file: PathBuf,
    },
    /// Show the active course with computed grades
    Status,
    /// Record or clear a single component grade
    #[command(group(
        ArgGroup::new("value")
            .args(["mark", "clear"])
            .required(true)
            .multiple(false)
    ))]
    Grade {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        module: String,
        #[arg(long)]
        component: String,
        /// Percentage mark for the component
        #[arg(long)]
        mark: Option<f64>,
        /// Remove the recorded mark instead
        #[arg(long)]
        clear: bool,
    },
    /// Import component grades from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Clear every component grade, keeping the course structure
    ResetGrades,
    /// Archive the active course
    Archive,
    /// List archived courses
    Archived,
    /// Generate a markdown report
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://grades.db".to_string());

    let options = database_url
        .parse::<SqliteConnectOptions>()
        .context("DATABASE_URL is not a valid sqlite URL")?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .context("failed to open the grades database")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Sample course inserted.");
        }
        Commands::Setup { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let setup: models::CourseSetup =
                serde_json::from_str(&raw).context("setup file is not valid course JSON")?;
            setup.validate()?;
            let course_id = db::setup_course(&pool, &setup).await?;
            println!("Course {} ready ({course_id}).", setup.name);
        }
        Commands::Status => {
            let course = db::fetch_active_course(&pool).await?;
            match course {
                Some(course) => print_status(&course),
                None => println!("No active course. Run setup or seed first."),
            }
        }
        Commands::Grade {
            year,
            module,
            component,
            mark,
            clear,
        } => {
            let value = if clear {
                None
            } else {
                Some(mark.context("provide --mark or --clear")?)
            };
            if let Some(mark) = value {
                if !(0.0..=100.0).contains(&mark) {
                    anyhow::bail!("mark must be between 0 and 100");
                }
            }

            let component_id = db::find_component_id(&pool, year, &module, &component)
                .await?
                .with_context(|| {
                    format!("no component {component} in module {module} (year {year})")
                })?;
            db::update_component_grade(&pool, component_id, value).await?;

            match value {
                Some(mark) => println!("Recorded {mark}% for {component} in {module}."),
                None => println!("Cleared the grade for {component} in {module}."),
            }
        }
        Commands::Import { csv } => {
            let updated = db::import_grades_csv(&pool, &csv).await?;
            println!("Updated {updated} grades from {}.", csv.display());
        }
        Commands::ResetGrades => {
            let count = db::reset_grades(&pool).await?;
            println!("Reset {count} component grades.");
        }
        Commands::Archive => {
            let course_id = db::archive_course(&pool).await?;
            println!("Course archived ({course_id}).");
        }
        Commands::Archived => {
            let courses = db::fetch_archived(&pool).await?;
            if courses.is_empty() {
                println!("No archived courses.");
            } else {
                for course in courses.iter() {
                    println!(
                        "- {} ({}) created {}, archived {}",
                        course.name,
                        course.id,
                        course.created_at.date_naive(),
                        course.updated_at.date_naive()
                    );
                }
            }
        }
        Commands::Report { out } => {
            let course = db::fetch_active_course(&pool)
                .await?
                .context("no active course to report on")?;
            let report = report::build_report(&course);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

fn print_status(course: &models::Course) {
    println!("Course: {} (created {})", course.name, course.created_at.date_naive());

    for year in course.years.iter() {
        if year.is_fully_graded() {
            println!(
                "Year {} (weight {}): {:.2}%",
                year.year_number,
                year.weight,
                grades::year_grade(year)
            );
        } else {
            println!("Year {} (weight {}): in progress", year.year_number, year.weight);
        }

        for module in year.modules.iter() {
            if module.is_fully_graded() {
                println!(
                    "  - {} ({} credits): {:.2}%",
                    module.name,
                    module.credits,
                    grades::module_grade(module)
                );
            } else {
                println!("  - {} ({} credits): in progress", module.name, module.credits);
            }

            for component in module.components.iter() {
                match component.grade {
                    Some(grade) => println!(
                        "      {} (weight {}): {:.1}%",
                        component.name, component.weight, grade
                    ),
                    None => println!(
                        "      {} (weight {}): ungraded",
                        component.name, component.weight
                    ),
                }
            }
        }
    }

    let progress = course.progress();
    println!(
        "Progress: {}/{} components graded ({:.1}%)",
        progress.graded,
        progress.total,
        progress.percentage()
    );

    if course.is_fully_graded() {
        println!("Degree total: {:.2}%", grades::degree_total(&course.years));
    } else {
        println!("Degree total: pending");
    }
}
