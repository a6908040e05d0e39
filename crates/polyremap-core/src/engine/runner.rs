//! Invocation of external programs.
//!
//! Every tool call goes through [`ToolRunner`], so a whole pipeline can be driven by a
//! scripted runner in tests. Commands are argument vectors, never shell strings, and each
//! carries its own working directory instead of changing the process-wide one.

use super::error::ToolError;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    /// When set, stdout and stderr are captured and appended to
    /// `<label>.stdout.txt` / `<label>.stderr.txt` in the working directory.
    pub capture_label: Option<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: working_dir.into(),
            capture_label: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn capture(mut self, label: impl Into<String>) -> Self {
        self.capture_label = Some(label.into());
        self
    }

    /// Value following `flag` in the argument vector, if any.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    /// The command as a single line, for logs and error messages.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

pub trait ToolRunner {
    /// Runs `command` to completion.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Execution`] for a non-zero exit. Captured output is recorded
    /// before the exit status is examined.
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput, ToolError>;

    /// Whether `program` can be started at all.
    fn is_available(&self, program: &str) -> bool;
}

/// Runs tools as child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl ToolRunner for ProcessRunner {
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput, ToolError> {
        info!(
            cwd = %command.working_dir.display(),
            "Running `{}`",
            command.command_line()
        );

        let mut process = Command::new(&command.program);
        process.args(&command.args).current_dir(&command.working_dir);
        let spawn_error = |source: std::io::Error| ToolError::Spawn {
            program: command.program.clone(),
            source,
        };

        let (status, output) = match &command.capture_label {
            Some(label) => {
                let result = process.output().map_err(spawn_error)?;
                let output = ToolOutput {
                    stdout: String::from_utf8_lossy(&result.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
                };
                record_output(&command.working_dir, label, &output).map_err(|source| {
                    ToolError::Io {
                        program: command.program.clone(),
                        source,
                    }
                })?;
                (result.status, output)
            }
            None => (process.status().map_err(spawn_error)?, ToolOutput::default()),
        };

        if !status.success() {
            return Err(ToolError::Execution {
                command: command.command_line(),
                code: status.code(),
            });
        }
        debug!(program = %command.program, "Tool finished successfully");
        Ok(output)
    }

    fn is_available(&self, program: &str) -> bool {
        find_executable(program).is_some()
    }
}

fn record_output(dir: &Path, label: &str, output: &ToolOutput) -> std::io::Result<()> {
    for (suffix, text) in [("stdout", &output.stdout), ("stderr", &output.stderr)] {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(format!("{label}.{suffix}.txt")))?;
        file.write_all(text.as_bytes())?;
    }
    Ok(())
}

/// Resolves `program` the way the OS would: explicit paths as given, bare names on `PATH`.
///
/// Only files the current user may execute are reported.
pub fn find_executable(program: &str) -> Option<PathBuf> {
    which::which(program).ok()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn command_line_joins_program_and_args() {
        let command = ToolCommand::new("cpptraj", "/tmp")
            .args(["-p", "a.psf"])
            .arg("-x")
            .arg("a.mol2");
        assert_eq!(command.command_line(), "cpptraj -p a.psf -x a.mol2");
        assert_eq!(command.flag_value("-x"), Some("a.mol2"));
        assert_eq!(command.flag_value("-y"), None);
    }

    #[test]
    fn process_runs_in_its_working_directory_and_records_output() {
        let dir = tempdir().unwrap();
        let command = ToolCommand::new("sh", dir.path())
            .args(["-c", "pwd; echo oops >&2"])
            .capture("shell");

        let output = ProcessRunner::new().run(&command).unwrap();
        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(
            PathBuf::from(output.stdout.trim()).canonicalize().unwrap(),
            expected
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("shell.stderr.txt")).unwrap(),
            "oops\n"
        );

        ProcessRunner::new().run(&command).unwrap();
        let log = std::fs::read_to_string(dir.path().join("shell.stdout.txt")).unwrap();
        assert_eq!(log.lines().count(), 2);
    }

    #[test]
    fn non_zero_exit_is_an_execution_error_after_output_is_kept() {
        let dir = tempdir().unwrap();
        let before = std::env::current_dir().unwrap();
        let command = ToolCommand::new("sh", dir.path())
            .args(["-c", "echo partial; exit 3"])
            .capture("failing");

        let err = ProcessRunner::new().run(&command).unwrap_err();
        match err {
            ToolError::Execution { command, code } => {
                assert!(command.starts_with("sh -c"));
                assert_eq!(code, Some(3));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            std::fs::read_to_string(dir.path().join("failing.stdout.txt")).unwrap(),
            "partial\n"
        );
        assert_eq!(std::env::current_dir().unwrap(), before);
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let dir = tempdir().unwrap();
        let command = ToolCommand::new("definitely-not-a-real-tool-xyz", dir.path());
        assert!(matches!(
            ProcessRunner::new().run(&command),
            Err(ToolError::Spawn { .. })
        ));
        assert!(!ProcessRunner::new().is_available("definitely-not-a-real-tool-xyz"));
        assert!(ProcessRunner::new().is_available("sh"));
    }

    #[test]
    fn non_executable_file_is_not_available() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let tool = dir.path().join("fake-tleap");
        std::fs::write(&tool, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o644)).unwrap();
        let program = tool.to_string_lossy().into_owned();
        assert!(!ProcessRunner::new().is_available(&program));

        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(
            find_executable(&program).map(|path| path.canonicalize().unwrap()),
            Some(tool.canonicalize().unwrap())
        );
    }
}
