//! Running external tools (ffmpeg, ffprobe, gtts-cli).

use std::ffi::OsStr;
use std::process::Command;

use crate::error::{ComposeError, ComposeResult};

/// Lines of stderr kept in error messages.
const STDERR_TAIL_LINES: usize = 12;

/// Captured result of a finished tool.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Whether the tool exited with status 0.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Last few stderr lines, for error messages.
    pub fn stderr_tail(&self) -> String {
        let lines: Vec<&str> = self.stderr.lines().collect();
        let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
        lines[start..].join("\n")
    }
}

/// Thin wrapper around `std::process::Command` for one executable.
#[derive(Debug, Clone)]
pub struct ToolRunner {
    program: String,
}

impl ToolRunner {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Executable name or path.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Shell-style rendering of a command line for logs.
    pub fn command_line<S: AsRef<str>>(&self, args: &[S]) -> String {
        let mut line = self.program.clone();
        for arg in args {
            let arg = arg.as_ref();
            line.push(' ');
            if arg.is_empty() || arg.contains([' ', '\'', '"', ';', '[']) {
                line.push('\'');
                line.push_str(&arg.replace('\'', r"'\''"));
                line.push('\'');
            } else {
                line.push_str(arg);
            }
        }
        line
    }

    /// Run to completion and capture output. Never fails on exit status.
    pub fn run<I, S>(&self, args: I) -> ComposeResult<CommandOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|e| ComposeError::io(format!("executing {}", self.program), e))?;

        Ok(CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    /// Run and turn a non-zero exit into an error built by `on_error`.
    pub fn run_checked<I, S, F>(&self, args: I, on_error: F) -> ComposeResult<CommandOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
        F: FnOnce(String) -> ComposeError,
    {
        let output = self.run(args)?;
        if !output.success() {
            return Err(on_error(format!(
                "{} exited with code {}: {}",
                self.program,
                output.exit_code,
                output.stderr_tail()
            )));
        }
        Ok(output)
    }
}
