use chute::cli::commands::{Cli, Commands};
use chute::cli::handlers;
use clap::Parser;
use env_logger::Env;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        None => {
            // No subcommand → launch the cockpit
            handlers::Context::from_cli(&cli).and_then(chute::tui::run)
        }
        Some(Commands::Init(args)) => {
            // Init runs before vault discovery
            handlers::cmd_init(args, cli.vault_dir.as_deref())
        }
        Some(_) => handlers::dispatch(cli),
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
