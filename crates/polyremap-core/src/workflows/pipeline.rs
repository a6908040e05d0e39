use crate::core::forcefield::mapping::{AtomMapping, Chemistry, MappingError};
use crate::core::io::amber::ParameterizedSystem;
use crate::core::io::lammps;
use crate::core::io::mol2::Mol2File;
use crate::core::io::pdb;
use crate::core::io::psf::PsfFile;
use crate::core::io::traits::{MolecularFile, MolecularFileWriter};
use crate::core::models::cell::BoxMetadata;
use crate::core::models::system::MoleculeSystem;
use crate::engine::config::{CleanupPolicy, PipelineConfig, PolymerRequest, SystemSize};
use crate::engine::error::{PipelineError, WorkflowError};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::runner::ToolRunner;
use crate::engine::state::{MappingState, Stage, SystemStage};
use crate::engine::tools::assembler::{self, AssemblyFiles};
use crate::engine::tools::builder::{self, BuiltSystem};
use crate::engine::tools::converter;
use crate::engine::tools::typer::{self, TypingOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// File prefix of the representative chain the mapping is derived from.
pub const REPRESENTATIVE_PREFIX: &str = "1chain";
pub const REPRESENTATIVE_CHAIN_LENGTH: usize = 10;
const REPRESENTATIVE_DENSITY: f64 = 1.0;
/// File prefix of the full system.
pub const SYSTEM_PREFIX: &str = "system";

const CHARGE_TOLERANCE: f64 = 1e-3;

/// Files produced by a completed system-creation run.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemOutput {
    pub data_file: PathBuf,
    pub prmtop: PathBuf,
    pub atom_count: usize,
    pub cell: BoxMetadata,
    /// Total charge of the remapped system before assembly.
    pub total_charge: f64,
}

/// Sequences the external tools into mapping acquisition and system creation.
///
/// A pipeline holds at most one mapping. It must be acquired with
/// [`Pipeline::acquire_mapping`] before [`Pipeline::create_system`] can remap anything.
pub struct Pipeline<'a> {
    config: PipelineConfig,
    runner: &'a dyn ToolRunner,
    reporter: &'a ProgressReporter<'a>,
    mapping: Option<AtomMapping>,
    mapping_state: MappingState,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: PipelineConfig,
        runner: &'a dyn ToolRunner,
        reporter: &'a ProgressReporter<'a>,
    ) -> Self {
        Self {
            config,
            runner,
            reporter,
            mapping: None,
            mapping_state: MappingState::Needed,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn mapping_state(&self) -> MappingState {
        self.mapping_state
    }

    pub fn mapping(&self) -> Option<&AtomMapping> {
        self.mapping.as_ref()
    }

    /// Availability of every configured tool, in pipeline order.
    pub fn tool_report(&self) -> Vec<(String, bool)> {
        self.config
            .tools
            .programs()
            .iter()
            .map(|program| (program.to_string(), self.runner.is_available(program)))
            .collect()
    }

    fn preflight(&self, programs: &[&str]) -> Result<(), PipelineError> {
        match programs.iter().find(|p| !self.runner.is_available(p)) {
            Some(program) => Err(PipelineError::ToolUnavailable {
                program: program.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Loads the cached mapping for `chemistry`, or derives and caches a new one.
    #[instrument(skip_all, name = "mapping_workflow", fields(chemistry = %chemistry))]
    pub fn acquire_mapping(&mut self, chemistry: &Chemistry) -> Result<&AtomMapping, WorkflowError> {
        self.reporter.report(Progress::PhaseStart { name: "Mapping" });
        self.mapping_state = MappingState::Needed;
        let path = self.config.mapping_path();

        let mapping = if path.is_file() {
            info!(path = %path.display(), "Reusing cached force-field mapping");
            AtomMapping::load_for(&path, chemistry)
                .map_err(|e| WorkflowError::new(Stage::Mapping(MappingState::Needed), e))?
        } else {
            self.mapping_state = MappingState::Building;
            debug!(state = %self.mapping_state, "Mapping stage");
            let result = self.build_mapping(chemistry, &path);
            self.finish(result.is_ok());
            result.map_err(|e| WorkflowError::new(Stage::Mapping(MappingState::Building), e))?
        };

        info!(
            entries = mapping.len(),
            source = mapping.source(),
            target = mapping.target(),
            "Force-field mapping ready"
        );
        self.mapping_state = MappingState::Ready;
        self.reporter.report(Progress::PhaseFinish);
        Ok(&*self.mapping.insert(mapping))
    }

    fn build_mapping(&self, chemistry: &Chemistry, path: &Path) -> Result<AtomMapping, PipelineError> {
        let config = &self.config;
        let tools = &config.tools;
        self.preflight(&[
            tools.emc_setup.as_str(),
            tools.emc.as_str(),
            tools.cpptraj.as_str(),
            tools.antechamber.as_str(),
        ])?;
        let target = config.target_field()?;
        let dir = self.prepare_scratch_dir()?;

        self.reporter.report(Progress::TaskStart { total_steps: 4 });
        let request = PolymerRequest::new(
            chemistry.clone(),
            REPRESENTATIVE_DENSITY,
            REPRESENTATIVE_CHAIN_LENGTH,
            SystemSize::ChainCount(1),
        )?;
        let built = builder::build_polymer(
            self.runner,
            tools,
            &dir,
            REPRESENTATIVE_PREFIX,
            &request,
            &config.source_force_field,
            config.seed,
        )?;
        self.reporter.report(Progress::TaskIncrement);

        let mol2 = format!("{REPRESENTATIVE_PREFIX}.mol2");
        self.convert(&dir, &built, &mol2)?;
        self.reporter.report(Progress::TaskIncrement);

        let typed_mol2 = format!("{REPRESENTATIVE_PREFIX}.{}.mol2", config.target_force_field);
        let options = TypingOptions {
            residue_name: &config.residue_name,
            net_charge: config.net_charge,
            atom_type_scheme: target.atom_type_scheme,
            charge_method: &config.charge_method,
        };
        let typed_path = typer::assign_types(self.runner, tools, &dir, &mol2, &typed_mol2, &options)?;
        self.reporter.report(Progress::TaskIncrement);

        let (source_typed, _) = PsfFile::read_from_path(&built.psf)?;
        let (target_typed, _) = Mol2File::read_from_path(&typed_path)?;
        let mapping = AtomMapping::create(
            &config.source_force_field,
            &config.target_force_field,
            chemistry.clone(),
            &source_typed,
            &target_typed,
        )?;
        mapping.persist(path)?;
        self.reporter.report(Progress::TaskIncrement);
        self.reporter.report(Progress::TaskFinish);

        info!(path = %path.display(), "Wrote force-field mapping");
        Ok(mapping)
    }

    /// Builds the full system, remaps it with the acquired mapping, parameterizes it and
    /// writes the data file.
    ///
    /// A failure is reported with the last stage that completed; intermediate files stay
    /// in the scratch directory unless the cleanup policy is [`CleanupPolicy::Always`].
    #[instrument(skip_all, name = "system_workflow", fields(chemistry = %request.chemistry))]
    pub fn create_system(&self, request: &PolymerRequest) -> Result<SystemOutput, WorkflowError> {
        self.reporter.report(Progress::PhaseStart { name: "System" });
        let mut stage = SystemStage::Start;
        let result = self.run_system_stages(request, &mut stage);
        self.finish(result.is_ok());
        self.reporter.report(Progress::PhaseFinish);
        result.map_err(|e| WorkflowError::new(Stage::System(stage), e))
    }

    fn run_system_stages(
        &self,
        request: &PolymerRequest,
        stage: &mut SystemStage,
    ) -> Result<SystemOutput, PipelineError> {
        let mapping = self.mapping.as_ref().ok_or(PipelineError::MappingNotLoaded)?;
        if mapping.chemistry() != &request.chemistry {
            return Err(MappingError::ChemistryMismatch {
                path: self.config.mapping_path().to_string_lossy().to_string(),
                expected: request.chemistry.clone(),
                found: mapping.chemistry().clone(),
            }
            .into());
        }

        let config = &self.config;
        let tools = &config.tools;
        self.preflight(&[
            tools.emc_setup.as_str(),
            tools.emc.as_str(),
            tools.cpptraj.as_str(),
            tools.tleap.as_str(),
        ])?;
        let target = config.target_field()?;
        let dir = self.prepare_scratch_dir()?;
        self.reporter.report(Progress::TaskStart { total_steps: 7 });

        let built = builder::build_polymer(
            self.runner,
            tools,
            &dir,
            SYSTEM_PREFIX,
            request,
            &config.source_force_field,
            config.seed,
        )?;
        self.advance(stage, SystemStage::ChainBuilt);

        let mol2 = self.convert(&dir, &built, &format!("{SYSTEM_PREFIX}.mol2"))?;
        self.advance(stage, SystemStage::FormatConverted);

        let files = AssemblyFiles::for_prefix(SYSTEM_PREFIX, &config.target_force_field);
        let total_charge = self.remap(&mol2, &dir.join(&files.input_mol2))?;
        self.advance(stage, SystemStage::Remapped);

        let (prmtop, rst7) = assembler::assemble(
            self.runner,
            tools,
            &dir,
            &files,
            target.leap_source,
            config.solvation.as_ref(),
        )?;
        self.advance(stage, SystemStage::Assembled);

        // The assembler's box comes from unwrapped chains; the builder's cell replaces it.
        let cell = pdb::read_cell_from_path(&built.pdb)?;
        let parameterized = ParameterizedSystem::read_from_paths(&prmtop, &rst7)?.with_cell(cell);
        info!(
            a = cell.lengths.x,
            b = cell.lengths.y,
            c = cell.lengths.z,
            "Applied builder cell to the parameterized system"
        );
        self.advance(stage, SystemStage::BoxCorrected);

        let data_file = config.data_path();
        let title = format!("Polymer System with {}", config.target_force_field.to_uppercase());
        lammps::write_data_to_path(&parameterized, &title, &data_file)?;
        let exported = config.work_dir.join(format!("{SYSTEM_PREFIX}.prmtop"));
        std::fs::copy(&prmtop, &exported).map_err(PipelineError::io(&exported))?;
        self.advance(stage, SystemStage::Written);

        self.advance(stage, SystemStage::Done);
        self.reporter.report(Progress::TaskFinish);
        info!(path = %data_file.display(), "Wrote simulation data file");

        Ok(SystemOutput {
            data_file,
            prmtop: exported,
            atom_count: parameterized.topology.atoms.len(),
            cell,
            total_charge,
        })
    }

    /// Replaces every type and charge in `input` via the mapping and writes `output`.
    ///
    /// Returns the total charge of the remapped system.
    fn remap(&self, input: &Path, output: &Path) -> Result<f64, PipelineError> {
        let mapping = self.mapping.as_ref().ok_or(PipelineError::MappingNotLoaded)?;
        let (system, mut metadata) = Mol2File::read_from_path(input)?;
        let remapped: MoleculeSystem = mapping.apply(&system)?;

        let total_charge = remapped.total_charge();
        let expected = f64::from(self.config.net_charge);
        if (total_charge - expected).abs() > CHARGE_TOLERANCE {
            warn!(
                total_charge,
                expected, "Remapped system charge deviates from the requested net charge"
            );
            self.reporter.report(Progress::Message(format!(
                "Remapped charge {total_charge:+.4} e differs from the requested {expected:+} e"
            )));
        } else {
            info!(total_charge, "Remapped system charge");
        }

        metadata.charge_type = "USER_CHARGES".to_string();
        Mol2File::write_to_path(&remapped, &metadata, output)?;
        Ok(total_charge)
    }

    fn convert(&self, dir: &Path, built: &BuiltSystem, output: &str) -> Result<PathBuf, PipelineError> {
        converter::convert(
            self.runner,
            &self.config.tools,
            dir,
            Some(file_name(&built.psf)),
            file_name(&built.pdb),
            output,
        )
    }

    fn advance(&self, stage: &mut SystemStage, next: SystemStage) {
        *stage = next;
        debug!(stage = %next, "System stage");
        self.reporter.report(Progress::TaskIncrement);
    }

    fn prepare_scratch_dir(&self) -> Result<PathBuf, PipelineError> {
        let dir = self.config.scratch_dir();
        std::fs::create_dir_all(&dir).map_err(PipelineError::io(&dir))?;
        Ok(dir)
    }

    fn finish(&self, succeeded: bool) {
        let remove = match self.config.cleanup {
            CleanupPolicy::Never => false,
            CleanupPolicy::OnSuccess => succeeded,
            CleanupPolicy::Always => true,
        };
        if !remove {
            return;
        }
        let dir = self.config.scratch_dir();
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => debug!(path = %dir.display(), "Removed scratch directory"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %dir.display(), error = %e, "Could not remove scratch directory"),
        }
    }
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
}
