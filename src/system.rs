//! Sanctioned execution of external system commands.
//!
//! All shelling out (apt-get, dpkg-query, gpg, systemctl, swapon, ...) goes
//! through `run`/`run_with_stdin` so every invocation is logged with its exact
//! arguments and every exit status is captured into a `CmdOutput`. Direct use
//! of `std::process::Command` elsewhere in the library is not allowed.

use crate::error::{Result, StewardError};
use log::{debug, info};
use std::io::Write;
use std::process::{Command, Stdio};

/// Output from an external command execution.
#[derive(Debug, Clone)]
pub struct CmdOutput {
    /// Standard output from the command.
    pub stdout: String,
    /// Standard error from the command.
    pub stderr: String,
    /// Exit code (None if terminated by signal).
    pub exit_code: Option<i32>,
    /// Whether the command exited successfully (exit code 0).
    pub success: bool,
}

impl CmdOutput {
    /// Check that the command succeeded and return a `MutationFailed` if not.
    pub fn ensure_success(&self, context: &str) -> Result<()> {
        if self.success {
            Ok(())
        } else {
            let code = self.exit_code.unwrap_or(-1);
            Err(StewardError::mutation(format!(
                "{} failed (exit code {}): {}",
                context,
                code,
                self.stderr.trim()
            )))
        }
    }
}

/// Run an external command, capturing stdout and stderr.
///
/// A non-zero exit is not an error at this layer; callers decide via
/// `ensure_success` whether a failure propagates or is absorbed.
pub fn run(program: &str, args: &[&str]) -> Result<CmdOutput> {
    debug!("exec: {} {}", program, args.join(" "));

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()?;

    Ok(collect(program, output))
}

/// Run an external command with environment variables set.
pub fn run_with_env(program: &str, args: &[&str], env: &[(&str, &str)]) -> Result<CmdOutput> {
    debug!("exec: {} {} env={:?}", program, args.join(" "), env);

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (key, value) in env {
        cmd.env(key, value);
    }

    Ok(collect(program, cmd.output()?))
}

/// Run an external command feeding `input` to its stdin.
///
/// Used for pipelines the shell scripts expressed as `curl ... | gpg
/// --dearmor`: the fetch output is captured first, then fed to gpg here.
pub fn run_with_stdin(program: &str, args: &[&str], input: &[u8]) -> Result<CmdOutput> {
    debug!("exec (stdin {} bytes): {} {}", input.len(), program, args.join(" "));

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(input)?;
        // stdin drops here, closing the pipe so the child sees EOF
    }

    let output = child.wait_with_output()?;
    Ok(collect(program, output))
}

/// Check if a binary is available in PATH
pub fn binary_exists(name: &str) -> bool {
    Command::new("which")
        .arg(name)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

fn collect(program: &str, output: std::process::Output) -> CmdOutput {
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code();
    let success = output.status.success();

    if success {
        debug!("{} exited 0", program);
    } else {
        info!(
            "{} failed with exit code {:?}: {}",
            program,
            exit_code,
            stderr.trim()
        );
    }

    CmdOutput {
        stdout,
        stderr,
        exit_code,
        success,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_captures_stdout() {
        let output = run("echo", &["hello"]).unwrap();
        assert!(output.success);
        assert_eq!(output.stdout.trim(), "hello");
        assert_eq!(output.exit_code, Some(0));
    }

    #[test]
    fn test_run_nonzero_exit_is_not_an_error() {
        let output = run("false", &[]).unwrap();
        assert!(!output.success);
        assert!(output.ensure_success("false").is_err());
    }

    #[test]
    fn test_run_missing_binary_is_io_error() {
        let result = run("this_binary_definitely_does_not_exist_12345", &[]);
        assert!(matches!(result, Err(StewardError::Io(_))));
    }

    #[test]
    fn test_run_with_stdin() {
        let output = run_with_stdin("cat", &[], b"piped input").unwrap();
        assert!(output.success);
        assert_eq!(output.stdout, "piped input");
    }

    #[test]
    fn test_run_with_env() {
        let output = run_with_env("sh", &["-c", "echo $STEWARD_TEST_VAR"], &[(
            "STEWARD_TEST_VAR",
            "42",
        )])
        .unwrap();
        assert_eq!(output.stdout.trim(), "42");
    }

    #[test]
    fn test_binary_exists() {
        assert!(binary_exists("sh"));
        assert!(!binary_exists("this_binary_definitely_does_not_exist_12345"));
    }

    #[test]
    fn test_ensure_success_message_names_context() {
        let output = CmdOutput {
            stdout: String::new(),
            stderr: "E: Unable to locate package".to_string(),
            exit_code: Some(100),
            success: false,
        };
        let err = output.ensure_success("apt-get install").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("apt-get install"));
        assert!(msg.contains("100"));
    }
}
