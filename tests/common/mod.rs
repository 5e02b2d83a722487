//! Shared fixtures for the integration tests

#![allow(dead_code)]

use attrition_explain::model::{DecisionTree, RandomForestClassifier, TreeNode};
use attrition_explain::pipeline::AttritionPipeline;
use attrition_explain::preprocessing::{
    ColumnStage, ColumnTransformer, OneHotEncoder, StandardScaler, TransformerKind,
};
use attrition_explain::record::columns::*;
use attrition_explain::record::{BinaryFlag, Department, EmployeeRecord, SalaryBand};
use std::path::PathBuf;

pub const NUMERIC_COLUMNS: [&str; 7] = [
    SATISFACTION_LEVEL,
    LAST_EVALUATION,
    NUMBER_PROJECT,
    AVERAGE_MONTHLY_HOURS,
    TIME_SPEND_COMPANY,
    WORK_ACCIDENT,
    PROMOTION_LAST_5YEARS,
];

pub const DEPARTMENTS: [&str; 10] = [
    "IT",
    "RandD",
    "accounting",
    "hr",
    "management",
    "marketing",
    "product_mng",
    "sales",
    "support",
    "technical",
];

pub const SALARIES: [&str; 3] = ["high", "low", "medium"];

// Transformed feature indices used by the fixture trees
pub const F_SATISFACTION: usize = 0;
pub const F_EVALUATION: usize = 1;
pub const F_PROJECTS: usize = 2;
pub const F_HOURS: usize = 3;
pub const F_TENURE: usize = 4;
pub const F_SALARY_LOW: usize = 18;

/// Path of the artifact shipped with the crate
pub fn bundled_artifact() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("experiments/attrition_pipeline.json")
}

pub fn fixture_preprocessor() -> ColumnTransformer {
    let scaler = StandardScaler::new(
        vec![0.6128, 0.7161, 3.803, 201.05, 3.498, 0.1446, 0.0213],
        vec![0.2486, 0.1711, 1.2326, 49.94, 1.4601, 0.3517, 0.1443],
    )
    .unwrap();
    let encoder = OneHotEncoder::new(vec![
        DEPARTMENTS.iter().map(|s| s.to_string()).collect(),
        SALARIES.iter().map(|s| s.to_string()).collect(),
    ]);

    ColumnTransformer::new(
        &TRAINING_COLUMNS,
        vec![
            ColumnStage::new("num", &NUMERIC_COLUMNS, TransformerKind::StandardScaler(scaler)),
            ColumnStage::new("cat", &[DEPARTMENT, SALARY], TransformerKind::OneHotEncoder(encoder)),
        ],
    )
    .unwrap()
}

pub fn fixture_forest() -> RandomForestClassifier {
    let satisfaction_tree = DecisionTree::new(TreeNode::split(
        F_SATISFACTION,
        -1.55,
        TreeNode::split(
            F_PROJECTS,
            1.78,
            TreeNode::leaf(vec![60.0, 40.0], 100),
            TreeNode::leaf(vec![5.0, 295.0], 300),
        ),
        TreeNode::split(
            F_TENURE,
            0.69,
            TreeNode::leaf(vec![1800.0, 200.0], 2000),
            TreeNode::split(
                F_EVALUATION,
                0.5,
                TreeNode::leaf(vec![250.0, 50.0], 300),
                TreeNode::leaf(vec![100.0, 500.0], 600),
            ),
        ),
    ));

    let hours_tree = DecisionTree::new(TreeNode::split(
        F_HOURS,
        1.2,
        TreeNode::split(
            F_SATISFACTION,
            -0.9,
            TreeNode::leaf(vec![300.0, 300.0], 600),
            TreeNode::leaf(vec![1900.0, 100.0], 2000),
        ),
        TreeNode::split(
            F_PROJECTS,
            1.78,
            TreeNode::leaf(vec![200.0, 100.0], 300),
            TreeNode::split(
                F_SATISFACTION,
                -1.55,
                TreeNode::leaf(vec![4.0, 196.0], 200),
                TreeNode::leaf(vec![80.0, 20.0], 100),
            ),
        ),
    ));

    let projects_tree = DecisionTree::new(TreeNode::split(
        F_PROJECTS,
        1.78,
        TreeNode::split(
            F_SALARY_LOW,
            0.5,
            TreeNode::leaf(vec![1500.0, 200.0], 1700),
            TreeNode::leaf(vec![900.0, 300.0], 1200),
        ),
        TreeNode::split(
            F_HOURS,
            0.8,
            TreeNode::leaf(vec![60.0, 40.0], 100),
            TreeNode::leaf(vec![10.0, 290.0], 300),
        ),
    ));

    RandomForestClassifier::new(
        vec![0, 1],
        20,
        vec![satisfaction_tree, hours_tree, projects_tree],
    )
    .unwrap()
}

pub fn fixture_pipeline() -> AttritionPipeline {
    AttritionPipeline::new(fixture_preprocessor(), fixture_forest()).unwrap()
}

/// Overworked, dissatisfied employee
pub fn leaving_record() -> EmployeeRecord {
    EmployeeRecord {
        satisfaction_level: 0.11,
        last_evaluation: 0.88,
        number_project: 7,
        average_monthly_hours: 272,
        time_spend_company: 4,
        work_accident: BinaryFlag::No,
        promotion_last_5years: BinaryFlag::No,
        department: Department::Sales,
        salary: SalaryBand::Low,
    }
}

/// Satisfied employee with a normal workload
pub fn staying_record() -> EmployeeRecord {
    EmployeeRecord {
        satisfaction_level: 0.8,
        last_evaluation: 0.6,
        number_project: 3,
        average_monthly_hours: 160,
        time_spend_company: 3,
        work_accident: BinaryFlag::No,
        promotion_last_5years: BinaryFlag::No,
        department: Department::Technical,
        salary: SalaryBand::Medium,
    }
}
