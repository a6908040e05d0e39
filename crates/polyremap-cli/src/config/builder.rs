use super::defaults::DefaultsConfig;
use super::file::FileConfig;
use crate::cli::{BuildArgs, ChemistryArgs, CommonArgs};
use crate::error::{CliError, Result};
use polyremap::core::forcefield::mapping::Chemistry;
use polyremap::engine::config::{
    CleanupPolicy, PipelineConfig, PipelineConfigBuilder, PolymerRequest, SystemSize,
};

/// Flags only the `build` command offers.
#[derive(Debug, Default, Clone)]
pub struct OutputOverrides {
    pub data_file: Option<String>,
    pub no_solvation: bool,
}

impl From<&BuildArgs> for OutputOverrides {
    fn from(args: &BuildArgs) -> Self {
        Self {
            data_file: args.data_file.clone(),
            no_solvation: args.no_solvation,
        }
    }
}

#[derive(Debug)]
pub struct AppConfig {
    pub pipeline: PipelineConfig,
    /// Density used when `--density` is not given.
    pub density: f64,
}

pub fn build_config(args: &CommonArgs, overrides: &OutputOverrides) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = match &args.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let ff_file = file_config.forcefield.take().unwrap_or_default();
    let builder_file = file_config.builder.take().unwrap_or_default();
    let assembler_file = file_config.assembler.take().unwrap_or_default();
    let output_file = file_config.output.take().unwrap_or_default();
    let tools = file_config.tools.take().unwrap_or_default().into_tool_paths();

    let solvate = !overrides.no_solvation && assembler_file.solvate.unwrap_or(defaults.solvate);
    let cleanup = args
        .cleanup
        .map(CleanupPolicy::from)
        .or(output_file.cleanup.map(CleanupPolicy::from))
        .unwrap_or(defaults.cleanup);

    let mut builder = PipelineConfigBuilder::new()
        .work_dir(args.work_dir.clone())
        .tools(tools)
        .solvation(assembler_file.into_solvation(solvate))
        .cleanup(cleanup);

    if let Some(source) = args.source_ff.clone().or(ff_file.source) {
        builder = builder.source_force_field(source);
    }
    if let Some(target) = args.target_ff.clone().or(ff_file.target) {
        builder = builder.target_force_field(target);
    }
    if let Some(method) = ff_file.charge_method {
        builder = builder.charge_method(method);
    }
    if let Some(name) = ff_file.residue_name {
        builder = builder.residue_name(name);
    }
    if let Some(charge) = ff_file.net_charge {
        builder = builder.net_charge(charge);
    }
    if let Some(seed) = args.seed.or(builder_file.seed) {
        builder = builder.seed(seed);
    }
    if let Some(name) = overrides.data_file.clone().or(output_file.data_file) {
        builder = builder.data_file_name(name);
    }
    if let Some(name) = output_file.scratch_dir {
        builder = builder.scratch_dir_name(name);
    }

    let pipeline = builder
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    Ok(AppConfig {
        pipeline,
        density: builder_file.density.unwrap_or(defaults.density),
    })
}

pub fn chemistry(args: &ChemistryArgs) -> Chemistry {
    Chemistry::new(&args.repeat_unit, &args.end_group)
}

pub fn build_request(args: &BuildArgs, app: &AppConfig) -> Result<PolymerRequest> {
    let size = match (args.size.total_atoms, args.size.chains) {
        (Some(n), None) => SystemSize::TotalAtoms(n),
        (None, Some(n)) => SystemSize::ChainCount(n),
        _ => {
            return Err(CliError::Argument(
                "exactly one of --total-atoms or --chains is required".to_string(),
            ));
        }
    };
    PolymerRequest::new(
        chemistry(&args.chemistry),
        args.density.unwrap_or(app.density),
        args.chain_length,
        size,
    )
    .map_err(|e| CliError::Argument(e.to_string()))
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };
        let value = value.to_string();

        match key {
            "forcefield.source" => {
                config.forcefield.get_or_insert_with(Default::default).source = Some(value);
            }
            "forcefield.target" => {
                config.forcefield.get_or_insert_with(Default::default).target = Some(value);
            }
            "forcefield.charge-method" => {
                config
                    .forcefield
                    .get_or_insert_with(Default::default)
                    .charge_method = Some(value);
            }
            "forcefield.residue-name" => {
                config
                    .forcefield
                    .get_or_insert_with(Default::default)
                    .residue_name = Some(value);
            }
            "forcefield.net-charge" => {
                config
                    .forcefield
                    .get_or_insert_with(Default::default)
                    .net_charge = Some(value.parse().map_err(|_| {
                    CliError::Config(format!("Invalid integer value for {}: {}", key, value))
                })?);
            }
            "builder.seed" => {
                config.builder.get_or_insert_with(Default::default).seed =
                    Some(value.parse().map_err(|_| {
                        CliError::Config(format!("Invalid integer value for {}: {}", key, value))
                    })?);
            }
            "builder.density" => {
                config.builder.get_or_insert_with(Default::default).density =
                    Some(value.parse().map_err(|_| {
                        CliError::Config(format!("Invalid float value for {}: {}", key, value))
                    })?);
            }
            "assembler.water-model" => {
                config
                    .assembler
                    .get_or_insert_with(Default::default)
                    .water_model = Some(value);
            }
            "output.data-file" => {
                config.output.get_or_insert_with(Default::default).data_file = Some(value);
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}
