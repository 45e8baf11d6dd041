use anyhow::bail;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Course {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub years: Vec<Year>,
}

#[derive(Debug, Clone)]
pub struct Year {
    pub year_number: i32,
    pub weight: f64,
    pub modules: Vec<Module>,
}

#[derive(Debug, Clone)]
pub struct Module {
    pub name: String,
    pub credits: i32,
    pub components: Vec<Component>,
}

#[derive(Debug, Clone)]
pub struct Component {
    pub name: String,
    pub weight: f64,
    pub grade: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct ArchivedCourse {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
pub struct Progress {
    pub graded: usize,
    pub total: usize,
}

impl Progress {
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.graded as f64 / self.total as f64 * 100.0
    }
}

impl Module {
    pub fn is_fully_graded(&self) -> bool {
        self.components.iter().all(|c| c.grade.is_some())
    }
}

impl Year {
    pub fn is_fully_graded(&self) -> bool {
        self.modules.iter().all(|m| m.is_fully_graded())
    }
}

impl Course {
    pub fn is_fully_graded(&self) -> bool {
        self.years.iter().all(|y| y.is_fully_graded())
    }

    pub fn progress(&self) -> Progress {
        let mut graded = 0;
        let mut total = 0;
        for year in self.years.iter() {
            for module in year.modules.iter() {
                for component in module.components.iter() {
                    total += 1;
                    if component.grade.is_some() {
                        graded += 1;
                    }
                }
            }
        }
        Progress { graded, total }
    }
}

/// Course structure as accepted by `setup`, decoded from a JSON file.
#[derive(Debug, Deserialize)]
pub struct CourseSetup {
    pub name: String,
    #[serde(default)]
    pub years: Vec<YearSetup>,
}

#[derive(Debug, Deserialize)]
pub struct YearSetup {
    pub year_number: i32,
    pub weight: f64,
    #[serde(default)]
    pub modules: Vec<ModuleSetup>,
}

#[derive(Debug, Deserialize)]
pub struct ModuleSetup {
    pub name: String,
    pub credits: i32,
    #[serde(default)]
    pub components: Vec<ComponentSetup>,
}

#[derive(Debug, Deserialize)]
pub struct ComponentSetup {
    pub name: String,
    pub weight: f64,
    pub grade: Option<f64>,
}

impl CourseSetup {
    /// Range checks only; structural validation is the JSON decoder's job.
    pub fn validate(&self) -> anyhow::Result<()> {
        for year in self.years.iter() {
            if year.weight < 0.0 {
                bail!("year {} has a negative weight", year.year_number);
            }
            for module in year.modules.iter() {
                if module.credits < 0 {
                    bail!("module {} has negative credits", module.name);
                }
                for component in module.components.iter() {
                    if component.weight < 0.0 {
                        bail!(
                            "component {} in {} has a negative weight",
                            component.name,
                            module.name
                        );
                    }
                    if let Some(grade) = component.grade {
                        if !(0.0..=100.0).contains(&grade) {
                            bail!(
                                "grade for {} in {} must be between 0 and 100",
                                component.name,
                                module.name
                            );
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
