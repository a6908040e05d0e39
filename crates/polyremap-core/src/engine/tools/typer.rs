use super::invoke;
use crate::engine::config::ToolPaths;
use crate::engine::error::PipelineError;
use crate::engine::runner::{ToolCommand, ToolRunner};
use std::path::{Path, PathBuf};
use tracing::info;

/// Arguments for one atom-typing run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingOptions<'a> {
    pub residue_name: &'a str,
    pub net_charge: i32,
    pub atom_type_scheme: &'a str,
    pub charge_method: &'a str,
}

/// Assigns target-force-field atom types and charges to the MOL2 file `input`, writing
/// the result to `output`. Coordinates and bonds are left to the tool to preserve.
pub fn assign_types(
    runner: &dyn ToolRunner,
    tools: &ToolPaths,
    dir: &Path,
    input: &str,
    output: &str,
    options: &TypingOptions<'_>,
) -> Result<PathBuf, PipelineError> {
    let command = ToolCommand::new(&tools.antechamber, dir)
        .args(["-i", input, "-fi", "mol2", "-o", output, "-fo", "mol2"])
        .args(["-c", options.charge_method])
        .args(["-rn", options.residue_name])
        .args(["-at", options.atom_type_scheme])
        .args(["-s", "0", "-pl", "-1"])
        .arg("-nc")
        .arg(options.net_charge.to_string())
        .args(["-pf", "n"])
        .capture("antechamber");

    info!("Assigning {} types and charges; this may take a while", options.atom_type_scheme);
    let output = dir.join(output);
    invoke(runner, &command, std::slice::from_ref(&output))?;
    Ok(output)
}
