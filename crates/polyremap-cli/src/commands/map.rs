use crate::cli::MapArgs;
use crate::config::{self, OutputOverrides};
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use polyremap::engine::progress::ProgressReporter;
use polyremap::engine::runner::ProcessRunner;
use polyremap::workflows::pipeline::Pipeline;
use tracing::info;

pub fn run(args: MapArgs) -> Result<()> {
    let app = config::build_config(&args.common, &OutputOverrides::default())?;
    let chemistry = config::chemistry(&args.chemistry);
    let mapping_path = app.pipeline.mapping_path();

    let handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(handler.get_callback());
    let runner = ProcessRunner::new();
    let mut pipeline = Pipeline::new(app.pipeline, &runner, &reporter);

    let mapping = pipeline.acquire_mapping(&chemistry)?;
    info!(atoms = mapping.len(), "Mapping ready");
    println!(
        "Mapping {} -> {} for {} covers {} atom names: {}",
        mapping.source(),
        mapping.target(),
        mapping.chemistry(),
        mapping.len(),
        mapping_path.display()
    );
    Ok(())
}
