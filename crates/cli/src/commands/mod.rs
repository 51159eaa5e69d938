//! CLI subcommands

pub mod predict;
pub mod status;

use crate::client::ApiError;
use crate::output::{print_validation_issues, OutputFormat};

/// Render a validation rejection in full; pass everything else through
pub(crate) fn report(err: ApiError, format: OutputFormat) -> anyhow::Error {
    match err {
        ApiError::Validation(issues) => {
            print_validation_issues(&issues, format);
            anyhow::anyhow!("input rejected by the server")
        }
        other => other.into(),
    }
}
