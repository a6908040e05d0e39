use crate::core::forcefield::catalog::{self, TargetField};
use crate::core::forcefield::mapping::{AtomMapping, Chemistry};
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_SOURCE_FORCE_FIELD: &str = "opls-aa";
pub const DEFAULT_TARGET_FORCE_FIELD: &str = "gaff2";
pub const DEFAULT_CHARGE_METHOD: &str = "bcc";
pub const DEFAULT_RESIDUE_NAME: &str = "POL";
pub const DEFAULT_SEED: u64 = 12345;
pub const DEFAULT_DATA_FILE_NAME: &str = "data.lmps";

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Unsupported force field '{name}' (supported: {})", .supported.join(", "))]
    UnsupportedForceField {
        name: String,
        supported: Vec<&'static str>,
    },

    #[error("Invalid value for {parameter}: {message}")]
    InvalidValue {
        parameter: &'static str,
        message: String,
    },
}

/// Executables invoked by the pipeline, looked up on `PATH` unless given as paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub emc_setup: String,
    pub emc: String,
    pub cpptraj: String,
    pub antechamber: String,
    pub tleap: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            emc_setup: "emc_setup.pl".to_string(),
            emc: "emc".to_string(),
            cpptraj: "cpptraj".to_string(),
            antechamber: "antechamber".to_string(),
            tleap: "tleap".to_string(),
        }
    }
}

impl ToolPaths {
    /// Every configured executable, in pipeline order.
    pub fn programs(&self) -> [&str; 5] {
        [
            self.emc_setup.as_str(),
            self.emc.as_str(),
            self.cpptraj.as_str(),
            self.antechamber.as_str(),
            self.tleap.as_str(),
        ]
    }
}

/// Water model and neutralizing ions loaded by the system assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solvation {
    pub water_model: String,
    pub cation: String,
    pub anion: String,
}

impl Default for Solvation {
    fn default() -> Self {
        Self {
            water_model: "tip3p".to_string(),
            cation: "Na+".to_string(),
            anion: "Cl-".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CleanupPolicy {
    #[default]
    Never,
    OnSuccess,
    Always,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub work_dir: PathBuf,
    pub scratch_dir_name: String,
    pub source_force_field: String,
    pub target_force_field: String,
    pub charge_method: String,
    pub residue_name: String,
    pub net_charge: i32,
    pub tools: ToolPaths,
    pub seed: u64,
    pub solvation: Option<Solvation>,
    pub data_file_name: String,
    pub cleanup: CleanupPolicy,
}

impl PipelineConfig {
    /// Directory holding every intermediate artifact of a run.
    pub fn scratch_dir(&self) -> PathBuf {
        self.work_dir.join(&self.scratch_dir_name)
    }

    pub fn mapping_path(&self) -> PathBuf {
        self.work_dir.join(AtomMapping::file_name(
            &self.source_force_field,
            &self.target_force_field,
        ))
    }

    pub fn data_path(&self) -> PathBuf {
        self.work_dir.join(&self.data_file_name)
    }

    pub fn target_field(&self) -> Result<&'static TargetField, ConfigError> {
        catalog::target_field(&self.target_force_field).ok_or_else(|| {
            ConfigError::UnsupportedForceField {
                name: self.target_force_field.clone(),
                supported: catalog::target_fields(),
            }
        })
    }
}

#[derive(Default)]
pub struct PipelineConfigBuilder {
    work_dir: Option<PathBuf>,
    scratch_dir_name: Option<String>,
    source_force_field: Option<String>,
    target_force_field: Option<String>,
    charge_method: Option<String>,
    residue_name: Option<String>,
    net_charge: Option<i32>,
    tools: Option<ToolPaths>,
    seed: Option<u64>,
    solvation: Option<Option<Solvation>>,
    data_file_name: Option<String>,
    cleanup: Option<CleanupPolicy>,
}

impl PipelineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn work_dir(mut self, path: PathBuf) -> Self {
        self.work_dir = Some(path);
        self
    }
    pub fn scratch_dir_name(mut self, name: impl Into<String>) -> Self {
        self.scratch_dir_name = Some(name.into());
        self
    }
    pub fn source_force_field(mut self, name: impl Into<String>) -> Self {
        self.source_force_field = Some(name.into());
        self
    }
    pub fn target_force_field(mut self, name: impl Into<String>) -> Self {
        self.target_force_field = Some(name.into());
        self
    }
    pub fn charge_method(mut self, method: impl Into<String>) -> Self {
        self.charge_method = Some(method.into());
        self
    }
    pub fn residue_name(mut self, name: impl Into<String>) -> Self {
        self.residue_name = Some(name.into());
        self
    }
    pub fn net_charge(mut self, charge: i32) -> Self {
        self.net_charge = Some(charge);
        self
    }
    pub fn tools(mut self, tools: ToolPaths) -> Self {
        self.tools = Some(tools);
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
    /// `None` builds the system in vacuum without water or ion sources.
    pub fn solvation(mut self, solvation: Option<Solvation>) -> Self {
        self.solvation = Some(solvation);
        self
    }
    pub fn data_file_name(mut self, name: impl Into<String>) -> Self {
        self.data_file_name = Some(name.into());
        self
    }
    pub fn cleanup(mut self, policy: CleanupPolicy) -> Self {
        self.cleanup = Some(policy);
        self
    }

    pub fn build(self) -> Result<PipelineConfig, ConfigError> {
        let work_dir = self
            .work_dir
            .ok_or(ConfigError::MissingParameter("work_dir"))?;

        let source_force_field = self
            .source_force_field
            .unwrap_or_else(|| DEFAULT_SOURCE_FORCE_FIELD.to_string());
        if !catalog::is_builder_field(&source_force_field) {
            return Err(ConfigError::UnsupportedForceField {
                name: source_force_field,
                supported: catalog::builder_fields(),
            });
        }

        let target_force_field = self
            .target_force_field
            .unwrap_or_else(|| DEFAULT_TARGET_FORCE_FIELD.to_string());
        if catalog::target_field(&target_force_field).is_none() {
            return Err(ConfigError::UnsupportedForceField {
                name: target_force_field,
                supported: catalog::target_fields(),
            });
        }

        let residue_name = self
            .residue_name
            .unwrap_or_else(|| DEFAULT_RESIDUE_NAME.to_string());
        if residue_name.is_empty() || residue_name.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidValue {
                parameter: "residue_name",
                message: format!("'{residue_name}' must be a single non-empty token"),
            });
        }

        let data_file_name = self
            .data_file_name
            .unwrap_or_else(|| DEFAULT_DATA_FILE_NAME.to_string());
        if data_file_name.is_empty() {
            return Err(ConfigError::InvalidValue {
                parameter: "data_file_name",
                message: "must not be empty".to_string(),
            });
        }

        Ok(PipelineConfig {
            work_dir,
            scratch_dir_name: self
                .scratch_dir_name
                .unwrap_or_else(|| format!("_{target_force_field}")),
            source_force_field,
            target_force_field,
            charge_method: self
                .charge_method
                .unwrap_or_else(|| DEFAULT_CHARGE_METHOD.to_string()),
            residue_name,
            net_charge: self.net_charge.unwrap_or(0),
            tools: self.tools.unwrap_or_default(),
            seed: self.seed.unwrap_or(DEFAULT_SEED),
            solvation: self.solvation.unwrap_or_else(|| Some(Solvation::default())),
            data_file_name,
            cleanup: self.cleanup.unwrap_or_default(),
        })
    }
}

/// How large the full system should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemSize {
    /// Approximate total number of atoms; the builder derives the chain count.
    TotalAtoms(usize),
    /// Exact number of chains.
    ChainCount(usize),
}

/// What to build: chemistry, chain length, density and size of a polymer system.
#[derive(Debug, Clone, PartialEq)]
pub struct PolymerRequest {
    pub chemistry: Chemistry,
    pub density: f64,
    pub chain_length: usize,
    pub size: SystemSize,
}

impl PolymerRequest {
    pub fn new(
        chemistry: Chemistry,
        density: f64,
        chain_length: usize,
        size: SystemSize,
    ) -> Result<Self, ConfigError> {
        if !(density.is_finite() && density > 0.0) {
            return Err(ConfigError::InvalidValue {
                parameter: "density",
                message: format!("{density} is not a positive density"),
            });
        }
        if chain_length == 0 {
            return Err(ConfigError::InvalidValue {
                parameter: "chain_length",
                message: "must be at least 1".to_string(),
            });
        }
        let count = match size {
            SystemSize::TotalAtoms(n) | SystemSize::ChainCount(n) => n,
        };
        if count == 0 {
            return Err(ConfigError::InvalidValue {
                parameter: "size",
                message: "must be at least 1".to_string(),
            });
        }
        if chemistry.repeat_unit.is_empty() {
            return Err(ConfigError::MissingParameter("repeat_unit"));
        }
        Ok(Self {
            chemistry,
            density,
            chain_length,
            size,
        })
    }
}
