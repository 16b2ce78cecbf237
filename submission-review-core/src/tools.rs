//! Collaborators backed by external commands.
//!
//! Each tool is a [`ToolCommand`] whose arguments may contain placeholders:
//! `{file}`, `{source}` and `{output}` are substituted inside an argument,
//! `{inputs}` must stand alone and expands to one argument per input.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, error};

use crate::contract::{DocumentMerger, Formatter, ToolError, Typesetter};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Feed the file on stdin instead of naming it in the arguments.
    #[serde(default)]
    pub stdin: bool,
}

impl ToolCommand {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            stdin: false,
        }
    }

    pub fn with_stdin(mut self) -> Self {
        self.stdin = true;
        self
    }

    pub fn clang_format() -> Self {
        Self::new("clang-format", &["{file}"])
    }

    pub fn par() -> Self {
        Self::new("par", &[]).with_stdin()
    }

    pub fn pdflatex() -> Self {
        Self::new("pdflatex", &["-shell-escape", "-halt-on-error", "{source}"])
    }

    pub fn pdfunite() -> Self {
        Self::new("pdfunite", &["{inputs}", "{output}"])
    }

    fn expand(&self, vars: &[(&str, &Path)], inputs: &[PathBuf]) -> Vec<OsString> {
        let mut out = Vec::with_capacity(self.args.len() + inputs.len());
        for arg in &self.args {
            if arg == "{inputs}" {
                out.extend(inputs.iter().map(|p| p.as_os_str().to_os_string()));
                continue;
            }
            let mut expanded = arg.clone();
            for (name, value) in vars {
                expanded = expanded.replace(&format!("{{{name}}}"), &value.to_string_lossy());
            }
            out.push(expanded.into());
        }
        out
    }

    async fn run(
        &self,
        args: Vec<OsString>,
        cwd: Option<&Path>,
        stdin_file: Option<&Path>,
    ) -> Result<Output, ToolError> {
        let mut command = Command::new(&self.program);
        command.args(&args);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }
        match stdin_file {
            Some(path) => {
                command.stdin(Stdio::from(std::fs::File::open(path)?));
            }
            None => {
                command.stdin(Stdio::null());
            }
        }

        debug!(program = %self.program, ?args, "Launching tool");
        let output = command.output().await.map_err(|e| {
            error!(error = ?e, program = %self.program, "Failed to launch tool");
            ToolError::Unavailable {
                program: self.program.clone(),
                source: e,
            }
        })?;

        if !output.status.success() {
            error!(program = %self.program, status = %output.status, "Tool exited with non-zero status");
            return Err(ToolError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(output)
    }
}

/// Formatter or reflow tool; returns the command's stdout.
pub struct CommandFormatter {
    command: ToolCommand,
}

impl CommandFormatter {
    pub fn new(command: ToolCommand) -> Self {
        Self { command }
    }
}

#[async_trait]
impl Formatter for CommandFormatter {
    async fn format(&self, path: &Path) -> Result<Vec<u8>, ToolError> {
        let args = self.command.expand(&[("file", path)], &[]);
        let stdin = self.command.stdin.then_some(path);
        let output = self.command.run(args, None, stdin).await?;
        Ok(output.stdout)
    }
}

pub struct CommandTypesetter {
    command: ToolCommand,
}

impl CommandTypesetter {
    pub fn new(command: ToolCommand) -> Self {
        Self { command }
    }
}

#[async_trait]
impl Typesetter for CommandTypesetter {
    async fn typeset(&self, source_name: &str, workdir: &Path) -> Result<(), ToolError> {
        let args = self.command.expand(&[("source", Path::new(source_name))], &[]);
        let stdin = self.command.stdin.then(|| workdir.join(source_name));
        self.command.run(args, Some(workdir), stdin.as_deref()).await?;
        Ok(())
    }
}

pub struct CommandMerger {
    command: ToolCommand,
}

impl CommandMerger {
    pub fn new(command: ToolCommand) -> Self {
        Self { command }
    }
}

#[async_trait]
impl DocumentMerger for CommandMerger {
    async fn merge(&self, inputs: &[PathBuf], output: &Path) -> Result<(), ToolError> {
        let args = self.command.expand(&[("output", output)], inputs);
        self.command.run(args, None, None).await?;
        Ok(())
    }
}
