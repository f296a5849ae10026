pub mod loader;
pub mod scenario;

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::{loader::FixtureLoader, scenario::Scenario};
use insight_service::InsightEditor;

#[derive(Debug, Parser)]
#[command(
	version = insight_cli::VERSION,
	rename_all = "kebab",
	styles = insight_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// JSON scenario of editor events and scripted load responses.
	#[arg(long, short = 's', value_name = "FILE")]
	pub scenario: PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = insight_config::load(&args.config)?;

	init_tracing(&config);

	let scenario = Scenario::load(&args.scenario)?;
	let props = scenario.props.clone().into_props();
	let loader = Arc::new(FixtureLoader::new(scenario.responses, config.loader.timeout_ms));
	let mut editor = InsightEditor::from_config(&config, &props, loader);

	tracing::info!(
		scenario = %args.scenario.display(),
		steps = scenario.steps.len(),
		"Replaying scenario."
	);

	let snapshot = scenario::replay(&mut editor, &props, scenario.steps).await;

	println!("{}", serde_json::to_string_pretty(&snapshot)?);

	Ok(())
}

fn init_tracing(config: &insight_config::Config) {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
