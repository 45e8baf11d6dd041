use crate::models::{Module, Year};

/// Weighted mean over the graded components of a module.
///
/// Ungraded components are skipped entirely: neither their weight nor a
/// stand-in zero is counted, so a partially graded module averages over
/// the weight seen so far. Returns 0 when nothing is graded.
pub fn module_grade(module: &Module) -> f64 {
    let mut score = 0.0;
    let mut weight_seen = 0.0;

    for component in module.components.iter() {
        if let Some(grade) = component.grade {
            score += grade * (component.weight / 100.0);
            weight_seen += component.weight;
        }
    }

    if weight_seen == 0.0 {
        return 0.0;
    }
    (score / weight_seen) * 100.0
}

/// Credit-weighted mean of module grades for a year.
///
/// Every module contributes at full credit weight, graded or not, so a
/// module without any recorded marks pulls the year down until it is graded.
pub fn year_grade(year: &Year) -> f64 {
    let mut score = 0.0;
    let mut credit_sum = 0.0;

    for module in year.modules.iter() {
        score += module_grade(module) * module.credits as f64;
        credit_sum += module.credits as f64;
    }

    if credit_sum == 0.0 {
        return 0.0;
    }
    score / credit_sum
}

/// Weight-adjusted mean of year grades across the degree.
pub fn degree_total(years: &[Year]) -> f64 {
    let mut score = 0.0;
    let mut weight_sum = 0.0;

    for year in years.iter() {
        score += year_grade(year) * year.weight;
        weight_sum += year.weight;
    }

    if weight_sum == 0.0 {
        return 0.0;
    }
    score / weight_sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Component;

    fn component(weight: f64, grade: Option<f64>) -> Component {
        Component {
            name: "Exam".to_string(),
            weight,
            grade,
        }
    }

    fn module(credits: i32, components: Vec<Component>) -> Module {
        Module {
            name: "Data Structures".to_string(),
            credits,
            components,
        }
    }

    fn year(weight: f64, modules: Vec<Module>) -> Year {
        Year {
            year_number: 1,
            weight,
            modules,
        }
    }

    #[test]
    fn single_full_weight_component_sets_the_module_grade() {
        let module = module(15, vec![component(100.0, Some(70.0))]);
        assert!((module_grade(&module) - 70.0).abs() < 0.001);
    }

    #[test]
    fn equal_weights_reduce_to_the_plain_mean() {
        let module = module(
            15,
            vec![
                component(25.0, Some(60.0)),
                component(25.0, Some(70.0)),
                component(25.0, Some(80.0)),
                component(25.0, Some(90.0)),
            ],
        );
        assert!((module_grade(&module) - 75.0).abs() < 0.001);
    }

    #[test]
    fn ungraded_components_are_skipped_not_counted_as_zero() {
        let module = module(
            15,
            vec![component(50.0, Some(80.0)), component(50.0, None)],
        );
        assert!((module_grade(&module) - 80.0).abs() < 0.001);
    }

    #[test]
    fn weights_need_not_sum_to_one_hundred() {
        let module = module(
            15,
            vec![component(30.0, Some(60.0)), component(30.0, Some(90.0))],
        );
        assert!((module_grade(&module) - 75.0).abs() < 0.001);
    }

    #[test]
    fn module_with_no_grades_scores_zero() {
        let module = module(15, vec![component(60.0, None), component(40.0, None)]);
        assert_eq!(module_grade(&module), 0.0);
    }

    #[test]
    fn module_with_no_components_scores_zero() {
        assert_eq!(module_grade(&module(15, Vec::new())), 0.0);
    }

    #[test]
    fn year_grade_weights_modules_by_credits() {
        let year = year(
            10.0,
            vec![
                module(15, vec![component(100.0, Some(70.0))]),
                module(15, vec![component(100.0, Some(90.0))]),
            ],
        );
        assert!((year_grade(&year) - 80.0).abs() < 0.001);
    }

    #[test]
    fn ungraded_module_dilutes_the_year() {
        let year = year(
            10.0,
            vec![
                module(15, vec![component(100.0, Some(80.0))]),
                module(15, vec![component(100.0, None)]),
            ],
        );
        assert!((year_grade(&year) - 40.0).abs() < 0.001);
    }

    #[test]
    fn year_with_no_credits_scores_zero() {
        let year = year(10.0, vec![module(0, vec![component(100.0, Some(80.0))])]);
        assert_eq!(year_grade(&year), 0.0);
    }

    #[test]
    fn degree_total_weights_years() {
        let years = vec![
            year(10.0, vec![module(15, vec![component(100.0, Some(80.0))])]),
            year(30.0, vec![module(30, vec![component(100.0, Some(55.0))])]),
            year(60.0, vec![module(60, vec![component(100.0, Some(80.0))])]),
        ];
        assert!((degree_total(&years) - 72.5).abs() < 0.001);
    }

    #[test]
    fn zero_weight_years_score_zero_without_panicking() {
        let years = vec![
            year(0.0, vec![module(15, vec![component(100.0, Some(80.0))])]),
            year(0.0, vec![module(15, vec![component(100.0, Some(60.0))])]),
        ];
        assert_eq!(degree_total(&years), 0.0);
    }

    #[test]
    fn empty_degree_scores_zero() {
        assert_eq!(degree_total(&[]), 0.0);
    }

    #[test]
    fn repeated_calls_return_identical_results() {
        let years = vec![year(
            100.0,
            vec![module(
                20,
                vec![component(60.0, Some(72.0)), component(40.0, None)],
            )],
        )];
        assert_eq!(degree_total(&years), degree_total(&years));
        assert_eq!(year_grade(&years[0]), year_grade(&years[0]));
        assert_eq!(
            module_grade(&years[0].modules[0]),
            module_grade(&years[0].modules[0])
        );
    }

    #[test]
    fn raising_a_grade_never_lowers_any_total() {
        let mut years = vec![
            year(
                40.0,
                vec![
                    module(
                        15,
                        vec![component(60.0, Some(55.0)), component(40.0, Some(65.0))],
                    ),
                    module(15, vec![component(100.0, None)]),
                ],
            ),
            year(60.0, vec![module(30, vec![component(100.0, Some(70.0))])]),
        ];

        let before_module = module_grade(&years[0].modules[0]);
        let before_year = year_grade(&years[0]);
        let before_total = degree_total(&years);

        years[0].modules[0].components[0].grade = Some(75.0);

        assert!(module_grade(&years[0].modules[0]) >= before_module);
        assert!(year_grade(&years[0]) >= before_year);
        assert!(degree_total(&years) >= before_total);
    }
}
