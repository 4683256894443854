//! Shell command and script file sources
//!
//! The process runs on first use; its standard output is then read as
//! delimited text.

use super::delimited::DelimitedSource;
use super::{RowSource, Side};
use crate::error::{CompareError, Result};
use crate::value::{Header, Row};
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;
use std::time::Instant;

/// What to execute
#[derive(Debug, Clone)]
pub enum ScriptCommand {
    /// Inline commands passed to a shell: `<shell> <option> <commands>`
    Inline {
        commands: String,
        shell: String,
        shell_option: String,
    },
    /// Executable file with whitespace-separated arguments
    File { path: PathBuf, args: String },
}

impl ScriptCommand {
    fn to_command(&self) -> Command {
        match self {
            ScriptCommand::Inline {
                commands,
                shell,
                shell_option,
            } => {
                let mut command = Command::new(shell);
                if !shell_option.is_empty() {
                    command.arg(shell_option);
                }
                command.arg(commands);
                command
            }
            ScriptCommand::File { path, args } => {
                let mut command = Command::new(path);
                command.args(args.split_whitespace());
                command
            }
        }
    }
}

/// Captured result of one process run
#[derive(Debug, Clone)]
pub struct ScriptOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Run a command to completion, capturing stdout, stderr and exit code
pub fn run_script(script: &ScriptCommand) -> Result<ScriptOutput> {
    let output = script.to_command().output().map_err(|e| {
        CompareError::source_failure(format!("starting script {:?}", script), e.to_string())
    })?;
    Ok(ScriptOutput {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

pub struct ScriptSource {
    side: Side,
    script: ScriptCommand,
    delimiter: u8,
    output: Option<DelimitedSource>,
}

impl ScriptSource {
    pub fn new(side: Side, script: ScriptCommand, delimiter: u8) -> Self {
        Self {
            side,
            script,
            delimiter,
            output: None,
        }
    }

    fn output(&mut self) -> Result<&mut DelimitedSource> {
        self.output
            .as_mut()
            .ok_or_else(|| CompareError::source_failure("reading script output", "script has not run"))
    }
}

impl RowSource for ScriptSource {
    fn open(&mut self) -> Result<Header> {
        let started = Instant::now();
        let result = run_script(&self.script)?;
        log::debug!(
            "Script for {} data finished with code {} in {:.3} sec.",
            self.side,
            result.exit_code,
            started.elapsed().as_secs_f64()
        );
        if result.exit_code != 0 {
            return Err(CompareError::Script {
                side: self.side,
                exit_code: result.exit_code,
                stdout: result.stdout,
                stderr: result.stderr,
            });
        }

        let mut output = DelimitedSource::from_text(result.stdout, self.delimiter);
        let header = output.open()?;
        self.output = Some(output);
        Ok(header)
    }

    fn advance(&mut self) -> Result<bool> {
        self.output()?.advance()
    }

    fn read_row(&mut self, header: &Arc<Header>) -> Result<Row> {
        self.output()?.read_row(header)
    }

    fn close(&mut self) -> Result<()> {
        match self.output.take() {
            Some(mut output) => output.close(),
            None => Ok(()),
        }
    }

    fn describe(&self) -> String {
        match &self.script {
            ScriptCommand::Inline { shell, .. } => format!("{} script", shell),
            ScriptCommand::File { path, .. } => format!("script file '{}'", path.display()),
        }
    }
}
