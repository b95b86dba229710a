//! Running the external analysis tools.

use std::ffi::OsStr;
use std::process::Command;

use tracing::{debug, info};

use crate::error::{BinSizeError, Result};

/// Run `program args...` to completion and return its stdout.
///
/// Tool output is the only source of size data, so a spawn failure or a
/// non-zero exit is reported as an error rather than an empty result.
pub fn run_tool<I, S>(program: &str, args: I) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command.args(args);
    info!(command = ?command, "Running tool");

    let output = command.output().map_err(|source| BinSizeError::ToolSpawn {
        program: program.to_string(),
        source,
    })?;

    if !output.status.success() {
        return Err(BinSizeError::ToolFailed {
            program: program.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    debug!(program, bytes = stdout.len(), "Tool finished");
    Ok(stdout)
}
