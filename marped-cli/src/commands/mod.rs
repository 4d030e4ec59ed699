pub mod convert;
pub mod includes;
pub mod render;

use std::process::{ExitCode, ExitStatus};

use anyhow::{Context, Result};
use marped_core::CommandSpec;

/// Run `spec` to completion, inheriting stdio.
pub(crate) fn run_command(spec: &CommandSpec) -> Result<ExitStatus> {
    tracing::debug!(command = %spec, "running");
    spec.to_command()
        .status()
        .with_context(|| format!("failed to run {}", spec.program.display()))
}

/// Process exit code for a failed child; codes outside `1..=255` become 1.
pub(crate) fn failure_code(code: Option<i32>) -> ExitCode {
    let code = code
        .and_then(|c| u8::try_from(c).ok())
        .filter(|c| *c != 0)
        .unwrap_or(1);
    ExitCode::from(code)
}
