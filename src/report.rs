use std::fmt::Write;

use chrono::Utc;

use crate::grades;
use crate::models::Course;

/// Render the active course as a markdown report.
///
/// A grade is only printed once its whole subtree is marked, so an
/// in-progress term reads as pending rather than as a diluted total.
pub fn build_report(course: &Course) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Grade Report: {}", course.name);
    let _ = writeln!(
        output,
        "Generated {} (last updated {})",
        Utc::now().date_naive(),
        course.updated_at.date_naive()
    );

    for year in course.years.iter() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Year {} (weight {})", year.year_number, year.weight);

        for module in year.modules.iter() {
            if module.is_fully_graded() {
                let _ = writeln!(
                    output,
                    "- {} ({} credits): {:.2}%",
                    module.name,
                    module.credits,
                    grades::module_grade(module)
                );
            } else {
                let _ = writeln!(
                    output,
                    "- {} ({} credits): in progress",
                    module.name, module.credits
                );
            }
        }

        if year.is_fully_graded() {
            let _ = writeln!(output, "Year average: {:.2}%", grades::year_grade(year));
        } else {
            let _ = writeln!(output, "Year average: pending");
        }
    }

    let progress = course.progress();
    let _ = writeln!(output);
    let _ = writeln!(output, "## Progress");
    let _ = writeln!(
        output,
        "{} of {} components graded ({:.1}%)",
        progress.graded,
        progress.total,
        progress.percentage()
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Degree Total");
    if course.is_fully_graded() {
        let _ = writeln!(
            output,
            "{:.2}%",
            grades::degree_total(&course.years)
        );
    } else {
        let _ = writeln!(
            output,
            "Pending: {} components still ungraded.",
            progress.total - progress.graded
        );
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Component, Module, Year};

    fn sample_course(thesis_grade: Option<f64>) -> Course {
        Course {
            name: "BSc Computer Science".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            years: vec![
                Year {
                    year_number: 1,
                    weight: 40.0,
                    modules: vec![Module {
                        name: "Data Structures".to_string(),
                        credits: 15,
                        components: vec![Component {
                            name: "Exam".to_string(),
                            weight: 100.0,
                            grade: Some(70.0),
                        }],
                    }],
                },
                Year {
                    year_number: 2,
                    weight: 60.0,
                    modules: vec![Module {
                        name: "Dissertation".to_string(),
                        credits: 60,
                        components: vec![Component {
                            name: "Thesis".to_string(),
                            weight: 100.0,
                            grade: thesis_grade,
                        }],
                    }],
                },
            ],
        }
    }

    #[test]
    fn complete_course_reports_every_level() {
        let report = build_report(&sample_course(Some(80.0)));
        assert!(report.contains("# Grade Report: BSc Computer Science"));
        assert!(report.contains("- Data Structures (15 credits): 70.00%"));
        assert!(report.contains("Year average: 70.00%"));
        assert!(report.contains("Year average: 80.00%"));
        assert!(report.contains("2 of 2 components graded (100.0%)"));
        // (70*40 + 80*60) / 100
        assert!(report.contains("76.00%"));
    }

    #[test]
    fn incomplete_course_reports_pending_not_a_diluted_total() {
        let report = build_report(&sample_course(None));
        assert!(report.contains("- Dissertation (60 credits): in progress"));
        assert!(report.contains("Year average: pending"));
        assert!(report.contains("1 of 2 components graded (50.0%)"));
        assert!(report.contains("Pending: 1 components still ungraded."));
        assert!(!report.contains("76.00%"));
    }
}
