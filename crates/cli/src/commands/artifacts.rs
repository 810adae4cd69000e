//! Offline commands that work directly on an artifact directory

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tabled::{builder::Builder, settings::Style, Tabled};
use wellness_core::artifacts::{compute_checksum, MANIFEST_FILE};
use wellness_core::{
    evaluate, ArtifactBundle, ArtifactSlot, EvaluationReport, LabeledRecord, ServingMetrics,
    ServingOrchestrator, StructuredLogger,
};

use crate::output::{
    color_accuracy, format_percent, print_info, print_json, print_success, print_table,
    print_warning, OutputFormat,
};

/// Files that may make up an artifact bundle
const ARTIFACT_FILES: &[&str] = &[
    "classifier.onnx",
    "classifier.json",
    "scaler.json",
    "department_encoder.json",
    "label_encoder.json",
    "resources.json",
];

/// Row for the label table
#[derive(Tabled, Serialize)]
struct LabelRow {
    #[tabled(rename = "Code")]
    code: usize,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Resources")]
    resources: usize,
}

/// Row for the file checksum table
#[derive(Tabled, Serialize)]
struct FileRow {
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "SHA-256")]
    sha256: String,
}

#[derive(Serialize)]
struct Inspection<'a> {
    version: &'a str,
    classifier: &'a str,
    departments: &'a [String],
    labels: Vec<LabelRow>,
    files: Vec<FileRow>,
}

/// Load a bundle exactly as the server would and describe it
pub fn inspect(dir: &Path, format: OutputFormat) -> Result<()> {
    let bundle = ArtifactBundle::load(dir)
        .with_context(|| format!("Failed to load artifacts from {}", dir.display()))?;

    let labels: Vec<LabelRow> = bundle
        .labels()
        .iter()
        .enumerate()
        .map(|(code, label)| LabelRow {
            code,
            label: label.clone(),
            resources: bundle.resources().resolve(label).len(),
        })
        .collect();

    let files = checksums(dir)?;

    match format {
        OutputFormat::Json => print_json(&Inspection {
            version: bundle.version(),
            classifier: bundle.classifier_kind(),
            departments: bundle.departments(),
            labels,
            files,
        })?,
        OutputFormat::Table => {
            print_success(&format!("Artifacts in {} load cleanly", dir.display()));
            println!("Version:     {}", bundle.version());
            println!("Classifier:  {}", bundle.classifier_kind());
            println!("Departments: {}", bundle.departments().join(", "));
            println!();

            print_table(&labels, "Label encoder has no classes");
            for row in labels.iter().filter(|row| row.resources == 0) {
                print_warning(&format!("No resources curated for '{}'", row.label));
            }
            println!();

            print_table(&files, "No artifact files found");
            if !dir.join(MANIFEST_FILE).is_file() {
                print_info(&format!(
                    "No {} present; checksums above can seed one",
                    MANIFEST_FILE
                ));
            }
        }
    }

    Ok(())
}

fn checksums(dir: &Path) -> Result<Vec<FileRow>> {
    let mut rows = Vec::new();
    for file in ARTIFACT_FILES {
        let path = dir.join(file);
        if !path.is_file() {
            continue;
        }
        let data =
            std::fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        rows.push(FileRow {
            file: file.to_string(),
            sha256: compute_checksum(&data),
        });
    }
    Ok(rows)
}

/// Read labeled records from a CSV with a header row. Extra columns are
/// ignored.
pub fn read_records(path: &Path) -> Result<Vec<LabeledRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    reader
        .deserialize()
        .enumerate()
        .map(|(idx, row)| row.with_context(|| format!("Invalid record on data row {}", idx + 1)))
        .collect()
}

/// Replay a labeled dataset through the serving pipeline and report how
/// well the served labels match
pub fn run_evaluation(
    dir: &Path,
    data: &Path,
    min_accuracy: Option<f64>,
    format: OutputFormat,
) -> Result<()> {
    let bundle = ArtifactBundle::load(dir)
        .with_context(|| format!("Failed to load artifacts from {}", dir.display()))?;
    let records = read_records(data)?;

    let orchestrator = ServingOrchestrator::new(
        Arc::new(ArtifactSlot::loaded(bundle)),
        ServingMetrics::new(),
        StructuredLogger::new("wellness-cli"),
    );
    let report = evaluate(&orchestrator, &records);

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => print_report(&report, min_accuracy.unwrap_or(0.0)),
    }

    if let Some(target) = min_accuracy {
        if report.accuracy() < target {
            anyhow::bail!(
                "Accuracy {} is below the required {}",
                format_percent(report.accuracy()),
                format_percent(target)
            );
        }
    }

    Ok(())
}

fn print_report(report: &EvaluationReport, target: f64) {
    println!("Records:  {}", report.total);
    println!("Scored:   {}", report.scored());
    println!("Correct:  {}", report.correct);
    println!("Accuracy: {}", color_accuracy(report.accuracy(), target));
    for (kind, count) in &report.rejected {
        print_warning(&format!("{} records rejected as {}", count, kind));
    }

    let labels = report.labels();
    if labels.is_empty() {
        return;
    }
    println!();
    println!("{}", confusion_table(report, &labels));

    println!();
    let mut builder = Builder::default();
    builder.push_record(["Label", "Precision", "Recall"]);
    for label in &labels {
        let fmt = |v: Option<f64>| v.map(format_percent).unwrap_or_else(|| "-".to_string());
        builder.push_record([
            label.clone(),
            fmt(report.precision(label)),
            fmt(report.recall(label)),
        ]);
    }
    println!("{}", builder.build().with(Style::rounded()));
}

/// Rows are actual labels, columns are predicted labels
fn confusion_table(report: &EvaluationReport, labels: &[String]) -> String {
    let mut builder = Builder::default();

    let mut header = vec!["actual \\ predicted".to_string()];
    header.extend(labels.iter().cloned());
    builder.push_record(header);

    for actual in labels {
        let mut row = vec![actual.clone()];
        row.extend(
            labels
                .iter()
                .map(|predicted| report.count(actual, predicted).to_string()),
        );
        builder.push_record(row);
    }

    builder.build().with(Style::rounded()).to_string()
}
