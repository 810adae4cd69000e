//! Service health and readiness

use anyhow::Result;
use serde::Serialize;
use tabled::Tabled;
use wellness_core::{HealthResponse, ReadinessResponse};

use crate::client::ApiClient;
use crate::output::{color_status, print_info, print_json, print_table, OutputFormat};

/// Row for the component table
#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    component: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
}

#[derive(Serialize)]
struct HealthReport<'a> {
    health: &'a HealthResponse,
    readiness: &'a ReadinessResponse,
}

/// Show `/healthz` and `/readyz` for a running service
pub async fn show_health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let (_, health): (_, HealthResponse) = client.probe("healthz").await?;
    let (_, readiness): (_, ReadinessResponse) = client.probe("readyz").await?;

    match format {
        OutputFormat::Json => print_json(&HealthReport {
            health: &health,
            readiness: &readiness,
        })?,
        OutputFormat::Table => {
            print_info(&format!("Service is {}", color_status(health.status.as_str())));

            let ready = if readiness.ready { "ready" } else { "not ready" };
            match &readiness.reason {
                Some(reason) => print_info(&format!("Readiness: {} ({})", color_status(ready), reason)),
                None => print_info(&format!("Readiness: {}", color_status(ready))),
            }
            println!();

            let mut rows: Vec<ComponentRow> = health
                .components
                .iter()
                .map(|(name, component)| ComponentRow {
                    component: name.clone(),
                    status: color_status(component.status.as_str()),
                    message: component.message.clone().unwrap_or_default(),
                })
                .collect();
            rows.sort_by(|a, b| a.component.cmp(&b.component));
            print_table(&rows, "No components registered");
        }
    }

    Ok(())
}
