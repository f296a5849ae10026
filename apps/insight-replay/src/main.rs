use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = insight_replay::Args::parse();

	insight_replay::run(args).await
}
