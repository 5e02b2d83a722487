//! Employee record input
//!
//! The record is the single inbound value of the prediction core. It knows how to
//! validate its own field domains and how to materialize itself as the one-row
//! feature table the fitted pipeline expects, using the column names the pipeline
//! was trained with (including their quirks).

use crate::error::{AttritionError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column names exactly as they appeared in the training data.
///
/// `average_montly_hours` is misspelled and the department column carries a
/// trailing space; the preprocessing stage matches by exact name, so both are
/// kept verbatim.
pub mod columns {
    pub const SATISFACTION_LEVEL: &str = "satisfaction_level";
    pub const LAST_EVALUATION: &str = "last_evaluation";
    pub const NUMBER_PROJECT: &str = "number_project";
    pub const AVERAGE_MONTHLY_HOURS: &str = "average_montly_hours";
    pub const TIME_SPEND_COMPANY: &str = "time_spend_company";
    pub const WORK_ACCIDENT: &str = "Work_accident";
    pub const PROMOTION_LAST_5YEARS: &str = "promotion_last_5years";
    pub const DEPARTMENT: &str = "Departments ";
    pub const SALARY: &str = "salary";

    /// All training columns in frame order
    pub const TRAINING_COLUMNS: [&str; 9] = [
        SATISFACTION_LEVEL,
        LAST_EVALUATION,
        NUMBER_PROJECT,
        AVERAGE_MONTHLY_HOURS,
        TIME_SPEND_COMPANY,
        WORK_ACCIDENT,
        PROMOTION_LAST_5YEARS,
        DEPARTMENT,
        SALARY,
    ];
}

/// Department of the employee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Department {
    #[serde(rename = "sales")]
    Sales,
    #[serde(rename = "accounting")]
    Accounting,
    #[serde(rename = "hr")]
    Hr,
    #[serde(rename = "technical")]
    Technical,
    #[serde(rename = "support")]
    Support,
    #[serde(rename = "management")]
    Management,
    #[serde(rename = "IT")]
    It,
    #[serde(rename = "product_mng")]
    ProductMng,
    #[serde(rename = "marketing")]
    Marketing,
    #[serde(rename = "RandD")]
    RandD,
}

impl Department {
    pub const ALL: [Department; 10] = [
        Department::Sales,
        Department::Accounting,
        Department::Hr,
        Department::Technical,
        Department::Support,
        Department::Management,
        Department::It,
        Department::ProductMng,
        Department::Marketing,
        Department::RandD,
    ];

    /// Category string used in the training data
    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Sales => "sales",
            Department::Accounting => "accounting",
            Department::Hr => "hr",
            Department::Technical => "technical",
            Department::Support => "support",
            Department::Management => "management",
            Department::It => "IT",
            Department::ProductMng => "product_mng",
            Department::Marketing => "marketing",
            Department::RandD => "RandD",
        }
    }
}

impl std::str::FromStr for Department {
    type Err = AttritionError;

    fn from_str(s: &str) -> Result<Self> {
        Department::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| AttritionError::InvalidRecord {
                field: "department".to_string(),
                value: s.to_string(),
                reason: "unknown department".to_string(),
            })
    }
}

/// Salary band of the employee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SalaryBand {
    Low,
    Medium,
    High,
}

impl SalaryBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            SalaryBand::Low => "low",
            SalaryBand::Medium => "medium",
            SalaryBand::High => "high",
        }
    }
}

impl std::str::FromStr for SalaryBand {
    type Err = AttritionError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "low" => Ok(SalaryBand::Low),
            "medium" => Ok(SalaryBand::Medium),
            "high" => Ok(SalaryBand::High),
            other => Err(AttritionError::InvalidRecord {
                field: "salary".to_string(),
                value: other.to_string(),
                reason: "expected one of low, medium, high".to_string(),
            }),
        }
    }
}

/// A yes/no field carried as 0 or 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum BinaryFlag {
    No,
    Yes,
}

impl BinaryFlag {
    pub fn as_i64(&self) -> i64 {
        match self {
            BinaryFlag::No => 0,
            BinaryFlag::Yes => 1,
        }
    }
}

impl TryFrom<u8> for BinaryFlag {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(BinaryFlag::No),
            1 => Ok(BinaryFlag::Yes),
            other => Err(format!("expected 0 or 1, got {}", other)),
        }
    }
}

impl From<BinaryFlag> for u8 {
    fn from(flag: BinaryFlag) -> u8 {
        flag.as_i64() as u8
    }
}

/// One employee to score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    /// Satisfaction level in [0, 1]
    pub satisfaction_level: f64,
    /// Last evaluation score in [0, 1]
    pub last_evaluation: f64,
    /// Number of projects, > 0
    pub number_project: i64,
    /// Average monthly working hours, > 10
    #[serde(alias = "average_montly_hours")]
    pub average_monthly_hours: i64,
    /// Years at the company, > 0
    pub time_spend_company: i64,
    #[serde(alias = "Work_accident")]
    pub work_accident: BinaryFlag,
    pub promotion_last_5years: BinaryFlag,
    #[serde(alias = "Departments")]
    pub department: Department,
    pub salary: SalaryBand,
}

impl EmployeeRecord {
    /// Check every field against its declared domain
    pub fn validate(&self) -> Result<()> {
        check_unit_interval("satisfaction_level", self.satisfaction_level)?;
        check_unit_interval("last_evaluation", self.last_evaluation)?;
        check_greater_than("number_project", self.number_project, 0)?;
        check_greater_than("average_monthly_hours", self.average_monthly_hours, 10)?;
        check_greater_than("time_spend_company", self.time_spend_company, 0)?;
        Ok(())
    }

    /// Materialize as a single-row frame with the training column names and dtypes
    pub fn to_frame(&self) -> Result<DataFrame> {
        use columns::*;

        let frame = DataFrame::new(vec![
            Column::new(SATISFACTION_LEVEL.into(), &[self.satisfaction_level]),
            Column::new(LAST_EVALUATION.into(), &[self.last_evaluation]),
            Column::new(NUMBER_PROJECT.into(), &[self.number_project]),
            Column::new(AVERAGE_MONTHLY_HOURS.into(), &[self.average_monthly_hours]),
            Column::new(TIME_SPEND_COMPANY.into(), &[self.time_spend_company]),
            Column::new(WORK_ACCIDENT.into(), &[self.work_accident.as_i64()]),
            Column::new(PROMOTION_LAST_5YEARS.into(), &[self.promotion_last_5years.as_i64()]),
            Column::new(DEPARTMENT.into(), &[self.department.as_str()]),
            Column::new(SALARY.into(), &[self.salary.as_str()]),
        ])?;

        Ok(frame)
    }
}

impl fmt::Display for EmployeeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "satisfaction={:.2} evaluation={:.2} projects={} hours={} tenure={} dept={} salary={}",
            self.satisfaction_level,
            self.last_evaluation,
            self.number_project,
            self.average_monthly_hours,
            self.time_spend_company,
            self.department.as_str(),
            self.salary.as_str(),
        )
    }
}

fn check_unit_interval(field: &str, value: f64) -> Result<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(AttritionError::InvalidRecord {
            field: field.to_string(),
            value: value.to_string(),
            reason: "must be within [0, 1]".to_string(),
        })
    }
}

fn check_greater_than(field: &str, value: i64, bound: i64) -> Result<()> {
    if value > bound {
        Ok(())
    } else {
        Err(AttritionError::InvalidRecord {
            field: field.to_string(),
            value: value.to_string(),
            reason: format!("must be greater than {}", bound),
        })
    }
}
