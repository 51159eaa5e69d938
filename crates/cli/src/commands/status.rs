//! Liveness check

use anyhow::Result;
use colored::Colorize;

use crate::client::ApiClient;
use crate::commands::report;
use crate::output::{print_success, OutputFormat};

/// Query `GET /` and show which service answered
pub async fn show_status(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let liveness = client.liveness().await.map_err(|e| report(e, format))?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&liveness)?);
        }
        OutputFormat::Table => {
            print_success(&liveness.message);
            println!("Service URL: {}", client.base_url().as_str().cyan());
        }
    }

    Ok(())
}
