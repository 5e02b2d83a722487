//! Attrition CLI Module
//!
//! Command-line interface for scoring employee records and inspecting the
//! fitted pipeline artifact.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::explainability::ImpactDirection;
use crate::pipeline::{AttritionPipeline, PredictionPipeline};
use crate::record::{BinaryFlag, Department, EmployeeRecord, SalaryBand};
use crate::service::{AttritionService, PredictionLabel, PredictionResult, RiskLevel, ServiceConfig};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn kv(key: &str, val: &str) -> String {
    format!("{:<22} {}", muted(key), val.white())
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "attrition-explain")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Employee attrition prediction with per-prediction explanations")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict attrition for one employee and list the top factors
    Predict {
        /// Pipeline artifact (defaults to ATTRITION_MODEL_PATH or the bundled path)
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// JSON file holding the employee record
        #[arg(short, long, conflicts_with_all = ["satisfaction_level", "last_evaluation", "number_project", "average_monthly_hours", "time_spend_company", "department", "salary"])]
        record: Option<PathBuf>,

        #[command(flatten)]
        fields: RecordArgs,

        /// Number of factors to report
        #[arg(long)]
        top_factors: Option<usize>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the structure of a pipeline artifact
    Inspect {
        /// Pipeline artifact (defaults to ATTRITION_MODEL_PATH or the bundled path)
        #[arg(short, long)]
        model: Option<PathBuf>,
    },
}

/// Employee fields given directly on the command line
#[derive(clap::Args, Debug, Default)]
pub struct RecordArgs {
    /// Satisfaction level in [0, 1]
    #[arg(long)]
    pub satisfaction_level: Option<f64>,

    /// Last evaluation score in [0, 1]
    #[arg(long)]
    pub last_evaluation: Option<f64>,

    /// Number of projects
    #[arg(long)]
    pub number_project: Option<i64>,

    /// Average monthly working hours
    #[arg(long)]
    pub average_monthly_hours: Option<i64>,

    /// Years at the company
    #[arg(long)]
    pub time_spend_company: Option<i64>,

    /// Had a work accident (0 or 1)
    #[arg(long, default_value = "0")]
    pub work_accident: u8,

    /// Promoted in the last 5 years (0 or 1)
    #[arg(long, default_value = "0")]
    pub promotion_last_5years: u8,

    /// sales, accounting, hr, technical, support, management, IT, product_mng, marketing, RandD
    #[arg(long)]
    pub department: Option<Department>,

    /// low, medium, high
    #[arg(long)]
    pub salary: Option<SalaryBand>,
}

impl RecordArgs {
    /// Build a record, naming the first missing flag
    pub fn into_record(self) -> anyhow::Result<EmployeeRecord> {
        fn required<T>(value: Option<T>, flag: &str) -> anyhow::Result<T> {
            value.ok_or_else(|| anyhow::anyhow!("missing --{} (or pass --record)", flag))
        }

        Ok(EmployeeRecord {
            satisfaction_level: required(self.satisfaction_level, "satisfaction-level")?,
            last_evaluation: required(self.last_evaluation, "last-evaluation")?,
            number_project: required(self.number_project, "number-project")?,
            average_monthly_hours: required(self.average_monthly_hours, "average-monthly-hours")?,
            time_spend_company: required(self.time_spend_company, "time-spend-company")?,
            work_accident: BinaryFlag::try_from(self.work_accident).map_err(anyhow::Error::msg)?,
            promotion_last_5years: BinaryFlag::try_from(self.promotion_last_5years)
                .map_err(anyhow::Error::msg)?,
            department: required(self.department, "department")?,
            salary: required(self.salary, "salary")?,
        })
    }
}

// ─── Record loading ────────────────────────────────────────────────────────────

pub fn load_record(path: &Path) -> anyhow::Result<EmployeeRecord> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

fn resolve_config(model: Option<PathBuf>, top_factors: Option<usize>) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    if let Some(path) = model {
        config = config.with_model_path(path);
    }
    if let Some(k) = top_factors {
        config = config.with_top_factors(k);
    }
    config
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub async fn cmd_predict(
    model: Option<PathBuf>,
    record_path: Option<&Path>,
    fields: RecordArgs,
    top_factors: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    let record = match record_path {
        Some(path) => load_record(path)?,
        None => fields.into_record()?,
    };
    // Records are validated here, before they reach the service
    record.validate()?;

    let config = resolve_config(model, top_factors);
    let service = Arc::new(AttritionService::from_config(&config)?);
    if !service.is_ready() {
        anyhow::bail!(
            "prediction pipeline could not be loaded from {}",
            config.model_path.display()
        );
    }

    let start = Instant::now();
    let result = Arc::clone(&service).predict_and_explain_async(record.clone()).await?;
    let elapsed = start.elapsed();

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    section("Predict");
    println!("  {}", dim(&record.to_string()));
    print_result(&result);
    println!();
    println!("  {}", dim(&format!("scored in {:?}", elapsed)));
    println!();
    Ok(())
}

fn print_result(result: &PredictionResult) {
    let label = match result.prediction {
        PredictionLabel::Leave => result.prediction.as_str().red().bold(),
        PredictionLabel::Stay => result.prediction.as_str().green().bold(),
    };
    let risk = match result.risk_level {
        RiskLevel::High => result.risk_level.as_str().red(),
        RiskLevel::Medium => result.risk_level.as_str().yellow(),
        RiskLevel::Low => result.risk_level.as_str().green(),
    };

    println!();
    println!("  {:<22} {}", muted("Prediction"), label);
    println!(
        "  {}",
        kv("Leave probability", &format!("{:.0}%", result.leave_probability * 100.0))
    );
    println!("  {:<22} {}", muted("Risk level"), risk);

    section("Top factors");
    for factor in &result.top_factors {
        let arrow = factor.direction.arrow().to_string();
        let arrow = match factor.direction {
            ImpactDirection::IncreasesLeaveRisk => arrow.red(),
            ImpactDirection::DecreasesLeaveRisk => arrow.green(),
        };
        println!(
            "  {} {:<32} {}",
            arrow,
            factor.feature.white(),
            dim(&format!("{:.3}", factor.magnitude))
        );
    }
}

pub fn cmd_inspect(model: Option<PathBuf>) -> anyhow::Result<()> {
    let config = resolve_config(model, None);
    section("Inspect");

    step_run("Loading pipeline");
    let start = Instant::now();
    let pipeline = AttritionPipeline::load(&config.model_path)?;
    step_done(&format!("{:?}", start.elapsed()));

    let forest = pipeline.shared_model();
    let depths: Vec<usize> = forest.trees.iter().map(|t| t.get_depth()).collect();
    let leaves: usize = forest.trees.iter().map(|t| t.get_n_leaves()).sum();

    println!();
    println!("  {}", kv("Artifact", &config.model_path.display().to_string()));
    println!("  {}", kv("Classes", &format!("{:?}", forest.classes)));
    println!("  {}", kv("Trees", &forest.n_estimators().to_string()));
    println!(
        "  {}",
        kv("Max depth", &depths.iter().max().copied().unwrap_or(0).to_string())
    );
    println!("  {}", kv("Leaves", &leaves.to_string()));
    println!(
        "  {}",
        kv("Input columns", &pipeline.column_transformer().feature_names_in.len().to_string())
    );

    section("Features");
    for (idx, name) in pipeline.feature_names().iter().enumerate() {
        println!("  {} {}", dim(&format!("{:>3}", idx)), name);
    }
    println!();
    Ok(())
}
