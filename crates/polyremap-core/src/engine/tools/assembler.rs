use super::invoke;
use crate::engine::config::{Solvation, ToolPaths};
use crate::engine::error::PipelineError;
use crate::engine::runner::{ToolCommand, ToolRunner};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File names of one assembler run, all relative to its working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyFiles {
    pub script: String,
    pub log: String,
    pub input_mol2: String,
    pub prmtop: String,
    pub rst7: String,
}

impl AssemblyFiles {
    /// Standard names for system `prefix` parameterized with `target`.
    pub fn for_prefix(prefix: &str, target: &str) -> Self {
        Self {
            script: format!("{prefix}.{target}.tleap"),
            log: format!("{prefix}.leap.log"),
            input_mol2: format!("{prefix}.{target}.mol2"),
            prmtop: format!("{prefix}.{target}.prmtop"),
            rst7: format!("{prefix}.{target}.rst7"),
        }
    }
}

/// Renders the assembler script.
///
/// The box set here is recomputed from unwrapped coordinates and is replaced later by the
/// builder's cell.
pub fn render_script(files: &AssemblyFiles, leap_source: &str, solvation: Option<&Solvation>) -> String {
    let mut lines = vec![
        "# tleap script to build polymer system.".to_string(),
        format!("logFile {}", files.log),
        format!("source {leap_source}"),
    ];
    if let Some(solvation) = solvation {
        lines.push(format!("source leaprc.water.{}", solvation.water_model));
    }
    lines.push(format!("sys = loadMol2 {}", files.input_mol2));
    if let Some(solvation) = solvation {
        lines.push(format!("addIons2 sys {} 0", solvation.cation));
        lines.push(format!("addIons2 sys {} 0", solvation.anion));
    }
    lines.push("setBox sys vdw 1".to_string());
    lines.push(format!("saveAmberParm sys {} {}", files.prmtop, files.rst7));
    lines.push("quit".to_string());

    let mut script = lines.join("\n");
    script.push('\n');
    script
}

/// Writes the script and runs the assembler, returning the topology and restart paths.
///
/// The script stays on disk whatever the outcome.
pub fn assemble(
    runner: &dyn ToolRunner,
    tools: &ToolPaths,
    dir: &Path,
    files: &AssemblyFiles,
    leap_source: &str,
    solvation: Option<&Solvation>,
) -> Result<(PathBuf, PathBuf), PipelineError> {
    let script_path = dir.join(&files.script);
    std::fs::write(&script_path, render_script(files, leap_source, solvation))
        .map_err(PipelineError::io(&script_path))?;
    debug!(path = %script_path.display(), "Wrote assembler script");

    let command = ToolCommand::new(&tools.tleap, dir)
        .args(["-f", files.script.as_str()])
        .capture("tleap");
    let prmtop = dir.join(&files.prmtop);
    let rst7 = dir.join(&files.rst7);
    invoke(runner, &command, &[prmtop.clone(), rst7.clone()])?;
    Ok((prmtop, rst7))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::error::ToolError;
    use crate::engine::tools::testing::FnRunner;
    use tempfile::tempdir;

    #[test]
    fn script_directives_come_in_order() {
        let files = AssemblyFiles::for_prefix("system", "gaff2");
        let script = render_script(&files, "leaprc.gaff2", Some(&Solvation::default()));
        let lines: Vec<&str> = script.lines().skip(1).collect();

        assert_eq!(
            lines,
            vec![
                "logFile system.leap.log",
                "source leaprc.gaff2",
                "source leaprc.water.tip3p",
                "sys = loadMol2 system.gaff2.mol2",
                "addIons2 sys Na+ 0",
                "addIons2 sys Cl- 0",
                "setBox sys vdw 1",
                "saveAmberParm sys system.gaff2.prmtop system.gaff2.rst7",
                "quit",
            ]
        );
    }

    #[test]
    fn vacuum_script_has_no_water_or_ions() {
        let files = AssemblyFiles::for_prefix("system", "gaff");
        let script = render_script(&files, "leaprc.gaff", None);
        assert!(!script.contains("water"));
        assert!(!script.contains("addIons2"));
        assert!(script.contains("source leaprc.gaff\n"));
    }

    #[test]
    fn failed_assembly_keeps_the_script() {
        let dir = tempdir().unwrap();
        let runner = FnRunner::new(|command: &ToolCommand| {
            Err(ToolError::Execution {
                command: command.command_line(),
                code: Some(1),
            })
        });
        let files = AssemblyFiles::for_prefix("system", "gaff2");

        let err = assemble(
            &runner,
            &ToolPaths::default(),
            dir.path(),
            &files,
            "leaprc.gaff2",
            None,
        )
        .unwrap_err();

        assert!(matches!(err, PipelineError::Tool(ToolError::Execution { .. })));
        assert!(dir.path().join("system.gaff2.tleap").is_file());
        assert_eq!(runner.calls.borrow()[0].command_line(), "tleap -f system.gaff2.tleap");
    }
}
