use std::path::PathBuf;
use thiserror::Error;

use super::config::ConfigError;
use super::state::Stage;
use crate::core::forcefield::mapping::MappingError;
use crate::core::io::amber::AmberError;
use crate::core::io::lammps::LammpsError;
use crate::core::io::mol2::Mol2Error;
use crate::core::io::pdb::PdbError;
use crate::core::io::psf::PsfError;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Command `{command}` exited with {}", describe_exit(.code))]
    Execution { command: String, code: Option<i32> },

    #[error("Failed to record output of '{program}': {source}")]
    Io {
        program: String,
        source: std::io::Error,
    },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("'{program}' reported success but did not write {}", .path.display())]
    BuildIncomplete { program: String, path: PathBuf },

    #[error("Required tool '{program}' was not found")]
    ToolUnavailable { program: String },

    #[error("No atom mapping is loaded; acquire one before remapping")]
    MappingNotLoaded,

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("MOL2 error: {0}")]
    Mol2(#[from] Mol2Error),

    #[error("PSF error: {0}")]
    Psf(#[from] PsfError),

    #[error("Box extraction failed: {0}")]
    Pdb(#[from] PdbError),

    #[error("Amber file error: {0}")]
    Amber(#[from] AmberError),

    #[error("LAMMPS data error: {0}")]
    Lammps(#[from] LammpsError),

    #[error("File I/O error for '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| PipelineError::Io { path, source }
    }
}

/// A pipeline failure together with the last stage the run completed.
#[derive(Debug, Error)]
#[error("Pipeline aborted at stage '{stage}': {source}")]
pub struct WorkflowError {
    pub stage: Stage,
    #[source]
    pub source: PipelineError,
}

impl WorkflowError {
    pub fn new(stage: Stage, source: impl Into<PipelineError>) -> Self {
        Self {
            stage,
            source: source.into(),
        }
    }
}
