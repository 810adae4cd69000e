//! Remote prediction against a running service

use anyhow::{Context, Result};
use std::path::Path;
use tabled::Tabled;
use wellness_core::{PredictionRequest, PredictionResponse};

use crate::client::ApiClient;
use crate::output::{color_label, print_json, print_success, print_table, OutputFormat};

/// Row for the resources table
#[derive(Tabled)]
struct ResourceRow {
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Link")]
    link: String,
}

/// Read a request body from a JSON file
pub fn read_request(path: &Path) -> Result<PredictionRequest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read request file {}", path.display()))?;
    serde_json::from_str(&content).context("Failed to parse request file")
}

/// Send one request to `/predict` and print the label and resources
pub async fn predict(
    client: &ApiClient,
    request: &PredictionRequest,
    format: OutputFormat,
) -> Result<()> {
    let response: PredictionResponse = client.post("predict", request).await?;

    match format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Table => {
            print_success(&format!(
                "Wellness label: {}",
                color_label(&response.wellness_label)
            ));
            println!();

            let rows: Vec<ResourceRow> = response
                .recommended_resources
                .iter()
                .map(|r| ResourceRow {
                    title: r.title.clone(),
                    description: r.description.clone(),
                    link: r.link.clone(),
                })
                .collect();
            print_table(&rows, "No resources curated for this label");
        }
    }

    Ok(())
}
