use accountd::{Cli, Commands, Config, run};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = match cli.config.as_deref() {
        Some(path) if path.exists() => Config::load_from_path(path)?,
        Some(path) if cli.command != Some(Commands::Init) => {
            anyhow::bail!("Config file not found: {}", path.display())
        }
        _ => Config::load()?,
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
