use super::{invoke, remove_stale};
use crate::core::forcefield::mapping::normalize_smiles;
use crate::core::io::compress::gunzip_in_place;
use crate::engine::config::{PolymerRequest, SystemSize, ToolPaths};
use crate::engine::error::PipelineError;
use crate::engine::runner::{ToolCommand, ToolRunner};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Script written by the setup tool and consumed by the build tool.
pub const BUILD_SCRIPT: &str = "build.emc";

/// Structure files left by a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltSystem {
    /// Coordinates, including the `CRYST1` cell record.
    pub pdb: PathBuf,
    /// Topology typed under the builder's force field.
    pub psf: PathBuf,
}

/// Renders the builder setup file for `request`.
pub fn render_setup(prefix: &str, request: &PolymerRequest, field: &str, seed: u64) -> String {
    let repeat_unit = normalize_smiles(&request.chemistry.repeat_unit);
    let end_group = normalize_smiles(&request.chemistry.end_group);
    let (size_option, cluster_amount) = match request.size {
        SystemSize::TotalAtoms(n) => (format!("ntotal\t\t{n}"), 1),
        SystemSize::ChainCount(n) => ("number\t\ttrue".to_string(), n),
    };
    let density = request.density;
    let chain_length = request.chain_length;

    format!(
        "# polyremap builder setup for {prefix}

ITEM\tOPTIONS

replace\t\ttrue
field\t\t{field}
density\t\t{density}
{size_option}
seed\t\t{seed}
project\t\t{prefix}
focus\t\ttrue
pdb\t\ttrue
psf\t\ttrue

ITEM\tEND

ITEM\tGROUPS

RU\t\t{repeat_unit},1,RU:2,1,TM:1,2,TM:1
TM\t\t{end_group},1,RU:1,1,RU:2

ITEM\tEND

ITEM\tCLUSTERS

poly\t\talternate\t{cluster_amount}

ITEM\tEND

ITEM\tPOLYMERS

poly
1\t\tRU,{chain_length},TM,2

ITEM\tEND
"
    )
}

/// Builds a polymer system named `prefix` in `dir` with the builder's `field`.
///
/// The builder writes gzip-compressed structure files; they are expanded next to
/// themselves. Plain files already present are accepted as they are.
///
/// # Errors
///
/// Returns [`PipelineError::BuildIncomplete`] if either tool exits cleanly but a structure
/// file is missing.
pub fn build_polymer(
    runner: &dyn ToolRunner,
    tools: &ToolPaths,
    dir: &Path,
    prefix: &str,
    request: &PolymerRequest,
    field: &str,
    seed: u64,
) -> Result<BuiltSystem, PipelineError> {
    let setup_path = dir.join(format!("{prefix}.esh"));
    std::fs::write(&setup_path, render_setup(prefix, request, field, seed))
        .map_err(PipelineError::io(&setup_path))?;
    debug!(path = %setup_path.display(), "Wrote builder setup file");

    let setup = ToolCommand::new(&tools.emc_setup, dir)
        .arg(format!("{prefix}.esh"))
        .capture("emc_setup");
    invoke(runner, &setup, &[dir.join(BUILD_SCRIPT)])?;

    let stale: Vec<PathBuf> = ["pdb", "pdb.gz", "psf", "psf.gz"]
        .iter()
        .map(|ext| dir.join(format!("{prefix}.{ext}")))
        .collect();
    remove_stale(&stale)?;
    let build = ToolCommand::new(&tools.emc, dir)
        .arg(BUILD_SCRIPT)
        .capture("emc");
    runner.run(&build)?;

    let built = BuiltSystem {
        pdb: expand(dir, &format!("{prefix}.pdb"), &tools.emc)?,
        psf: expand(dir, &format!("{prefix}.psf"), &tools.emc)?,
    };
    info!(
        pdb = %built.pdb.display(),
        psf = %built.psf.display(),
        "Builder produced '{}'",
        prefix
    );
    Ok(built)
}

fn expand(dir: &Path, name: &str, program: &str) -> Result<PathBuf, PipelineError> {
    let compressed = dir.join(format!("{name}.gz"));
    if compressed.is_file() {
        return gunzip_in_place(&compressed).map_err(PipelineError::io(&compressed));
    }
    let plain = dir.join(name);
    if plain.is_file() {
        return Ok(plain);
    }
    Err(PipelineError::BuildIncomplete {
        program: program.to_string(),
        path: compressed,
    })
}
