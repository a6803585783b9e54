use clap::Parser;
use color_eyre::Result;
use tracing_subscriber::EnvFilter;

use invogen::app::App;
use invogen::cli::Args;
use invogen::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();

  let config = Config::load(args.config.as_deref())?;

  let mut app = App::new(config)?;
  app.run(args.command).await
}
