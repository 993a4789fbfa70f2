use anyhow::Result;
use std::process::{Command, Stdio};

/// Run a command to completion on the current thread and capture its output.
/// Callers on an async runtime must be inside `spawn_blocking`.
pub fn exec_capture(cmd: &str, args: &[&str]) -> Result<(i32, Vec<u8>, Vec<u8>)> {
    let output = Command::new(cmd)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()?;
    let code = output.status.code().unwrap_or(-1);
    Ok((code, output.stdout, output.stderr))
}
