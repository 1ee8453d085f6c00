use crate::error::{Error, Result};
use std::{ffi::OsString, process::Stdio};
use tokio::process::Command;
use tracing::debug;

/// Run an external tool to completion, discarding stdout.
///
/// # Errors
///
/// - `Error::Io` if the process cannot be spawned.
/// - `Error::ToolFailed` for a non-zero exit code (with trimmed stderr).
pub async fn run_command(program: &str, args: &[OsString]) -> Result<()> {
    debug!(command = %render_command(program, args), "running external tool");

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await?;

    if output.status.success() {
        return Ok(());
    }

    Err(Error::ToolFailed {
        tool: program.to_owned(),
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
    })
}

/// Shell-quoted command line for logs.
fn render_command(program: &str, args: &[OsString]) -> String {
    let words = std::iter::once(program.to_owned())
        .chain(args.iter().map(|a| a.to_string_lossy().into_owned()))
        .collect::<Vec<_>>();
    shlex::try_join(words.iter().map(String::as_str)).unwrap_or_else(|_| words.join(" "))
}
