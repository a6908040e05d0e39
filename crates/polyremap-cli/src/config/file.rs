use crate::error::{CliError, Result};
use polyremap::engine::config::{CleanupPolicy, Solvation, ToolPaths};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileForcefieldConfig {
    pub source: Option<String>,
    pub target: Option<String>,
    pub charge_method: Option<String>,
    pub residue_name: Option<String>,
    pub net_charge: Option<i32>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileBuilderConfig {
    pub seed: Option<u64>,
    pub density: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileToolsConfig {
    pub emc_setup: Option<String>,
    pub emc: Option<String>,
    pub cpptraj: Option<String>,
    pub antechamber: Option<String>,
    pub tleap: Option<String>,
}

impl FileToolsConfig {
    pub fn into_tool_paths(self) -> ToolPaths {
        let defaults = ToolPaths::default();
        ToolPaths {
            emc_setup: self.emc_setup.unwrap_or(defaults.emc_setup),
            emc: self.emc.unwrap_or(defaults.emc),
            cpptraj: self.cpptraj.unwrap_or(defaults.cpptraj),
            antechamber: self.antechamber.unwrap_or(defaults.antechamber),
            tleap: self.tleap.unwrap_or(defaults.tleap),
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileAssemblerConfig {
    pub solvate: Option<bool>,
    pub water_model: Option<String>,
    pub cation: Option<String>,
    pub anion: Option<String>,
}

impl FileAssemblerConfig {
    /// Solvation settings, or `None` when the system should be built in vacuum.
    pub fn into_solvation(self, solvate: bool) -> Option<Solvation> {
        if !solvate {
            return None;
        }
        let defaults = Solvation::default();
        Some(Solvation {
            water_model: self.water_model.unwrap_or(defaults.water_model),
            cation: self.cation.unwrap_or(defaults.cation),
            anion: self.anion.unwrap_or(defaults.anion),
        })
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FileCleanup {
    Never,
    OnSuccess,
    Always,
}

impl From<FileCleanup> for CleanupPolicy {
    fn from(value: FileCleanup) -> Self {
        match value {
            FileCleanup::Never => CleanupPolicy::Never,
            FileCleanup::OnSuccess => CleanupPolicy::OnSuccess,
            FileCleanup::Always => CleanupPolicy::Always,
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileOutputConfig {
    pub data_file: Option<String>,
    pub scratch_dir: Option<String>,
    pub cleanup: Option<FileCleanup>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub forcefield: Option<FileForcefieldConfig>,
    pub builder: Option<FileBuilderConfig>,
    pub tools: Option<FileToolsConfig>,
    pub assembler: Option<FileAssemblerConfig>,
    pub output: Option<FileOutputConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}
