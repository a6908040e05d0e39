use crate::cli::CheckArgs;
use crate::config::{self, OutputOverrides};
use crate::error::{CliError, Result};
use polyremap::engine::progress::ProgressReporter;
use polyremap::engine::runner::ProcessRunner;
use polyremap::workflows::pipeline::Pipeline;

pub fn run(args: CheckArgs) -> Result<()> {
    let app = config::build_config(&args.common, &OutputOverrides::default())?;
    let runner = ProcessRunner::new();
    let reporter = ProgressReporter::new();
    let pipeline = Pipeline::new(app.pipeline, &runner, &reporter);

    let report = pipeline.tool_report();
    for (program, available) in &report {
        let mark = if *available { "✓" } else { "✗" };
        println!("{mark} {program}");
    }

    let missing: Vec<String> = report
        .into_iter()
        .filter(|(_, available)| !available)
        .map(|(program, _)| program)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(CliError::ToolsMissing(missing))
    }
}
