use super::invoke;
use crate::engine::config::ToolPaths;
use crate::engine::error::PipelineError;
use crate::engine::runner::{ToolCommand, ToolRunner};
use std::path::{Path, PathBuf};

/// Rewrites `coordinates` (with an optional separate `topology`) as `output`.
///
/// All file names are relative to `dir`. The converter interprets nothing; the only check
/// is that `output` exists afterwards.
pub fn convert(
    runner: &dyn ToolRunner,
    tools: &ToolPaths,
    dir: &Path,
    topology: Option<&str>,
    coordinates: &str,
    output: &str,
) -> Result<PathBuf, PipelineError> {
    let mut command = ToolCommand::new(&tools.cpptraj, dir);
    if let Some(topology) = topology {
        command = command.args(["-p", topology]);
    }
    let command = command
        .args(["-y", coordinates, "-x", output])
        .capture("cpptraj.convert");

    let output = dir.join(output);
    invoke(runner, &command, std::slice::from_ref(&output))?;
    Ok(output)
}
