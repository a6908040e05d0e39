//! Thin wrappers around the external programs the pipeline drives.
//!
//! Each wrapper builds an argument vector, hands it to [`invoke`], and names the files
//! the program is expected to leave behind. Those files are removed before the program
//! starts, so one that exits cleanly without writing them is reported as
//! [`PipelineError::BuildIncomplete`] even when an earlier run left copies behind.

use super::error::PipelineError;
use super::runner::{ToolCommand, ToolOutput, ToolRunner};
use std::path::PathBuf;
use tracing::debug;

pub mod assembler;
pub mod builder;
pub mod converter;
pub mod typer;

/// Runs `command` and checks that every path in `expected` was written by it.
pub fn invoke(
    runner: &dyn ToolRunner,
    command: &ToolCommand,
    expected: &[PathBuf],
) -> Result<ToolOutput, PipelineError> {
    remove_stale(expected)?;
    let output = runner.run(command)?;
    if let Some(missing) = expected.iter().find(|path| !path.is_file()) {
        return Err(PipelineError::BuildIncomplete {
            program: command.program.clone(),
            path: missing.clone(),
        });
    }
    Ok(output)
}

/// Deletes leftovers of an earlier run. Absent files are fine.
pub(crate) fn remove_stale(paths: &[PathBuf]) -> Result<(), PipelineError> {
    for path in paths {
        match std::fs::remove_file(path) {
            Ok(()) => debug!(path = %path.display(), "Removed stale artifact"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(PipelineError::io(path)(e)),
        }
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::testing::FnRunner;
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn invoke_reports_missing_artifact_after_clean_exit() {
        let dir = tempdir().unwrap();
        let runner = FnRunner::new(|_| Ok(()));
        let command = ToolCommand::new("quiet-tool", dir.path());
        let expected = vec![dir.path().join("never-written.txt")];

        match invoke(&runner, &command, &expected).unwrap_err() {
            PipelineError::BuildIncomplete { program, path } => {
                assert_eq!(program, "quiet-tool");
                assert!(path.ends_with("never-written.txt"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn invoke_passes_when_artifacts_exist() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("out.txt");
        let written = target.clone();
        let runner = FnRunner::new(move |_| {
            std::fs::write(&written, "ok").unwrap();
            Ok(())
        });
        let command = ToolCommand::new("tool", dir.path());
        assert!(invoke(&runner, &command, &[target]).is_ok());
        assert_eq!(runner.calls.borrow().len(), 1);
    }

    #[test]
    fn leftover_artifact_does_not_satisfy_a_silent_tool() {
        let dir = tempdir().unwrap();
        let leftover = dir.path().join("out.txt");
        std::fs::write(&leftover, "previous run").unwrap();
        let runner = FnRunner::new(|_| Ok(()));
        let command = ToolCommand::new("tool", dir.path());

        assert!(matches!(
            invoke(&runner, &command, std::slice::from_ref(&leftover)),
            Err(PipelineError::BuildIncomplete { .. })
        ));
        assert!(!leftover.exists());
    }
}
