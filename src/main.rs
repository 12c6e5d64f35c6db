use clap::Parser;
use mesa::cli::{Cli, Commands};
use mesa::{Config, run};

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match (&cli.config, cli.command) {
        (_, Some(Commands::Init)) => Config::default(),
        (Some(path), _) => Config::load_from_path(path)?.with_env_overrides(),
        (None, _) => Config::load()?,
    };
    let worker_threads = config.general.worker_threads;

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();

    if worker_threads > 0 {
        builder.worker_threads(worker_threads);
    }

    let runtime = builder.build()?;
    runtime.block_on(run(cli, config))
}
