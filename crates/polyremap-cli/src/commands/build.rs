use crate::cli::BuildArgs;
use crate::config::{self, OutputOverrides};
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use polyremap::engine::progress::ProgressReporter;
use polyremap::engine::runner::ProcessRunner;
use polyremap::workflows::pipeline::Pipeline;
use tracing::info;

pub fn run(args: BuildArgs) -> Result<()> {
    let app = config::build_config(&args.common, &OutputOverrides::from(&args))?;
    let request = config::build_request(&args, &app)?;

    let handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(handler.get_callback());
    let runner = ProcessRunner::new();
    let mut pipeline = Pipeline::new(app.pipeline, &runner, &reporter);

    let mapped = pipeline.acquire_mapping(&request.chemistry)?.len();
    info!(atoms = mapped, "Mapping ready, building the full system");

    let output = pipeline.create_system(&request)?;
    let lengths = output.cell.lengths;
    println!("LAMMPS data file: {}", output.data_file.display());
    println!("Amber topology:   {}", output.prmtop.display());
    println!(
        "{} atoms, box {:.3} x {:.3} x {:.3} A, total charge {:+.4} e",
        output.atom_count, lengths.x, lengths.y, lengths.z, output.total_charge
    );
    Ok(())
}
