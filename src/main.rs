//! Call Recorder CLI entry point

use std::process::ExitCode;

use clap::Parser;

use call_recorder::cli::{
    app::{init_tracing, load_merged_config, EXIT_ERROR, EXIT_USAGE_ERROR},
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    policy_cmd::handle_policy_command,
    presenter::Presenter,
};
use call_recorder::domain::config::AppConfig;
use call_recorder::domain::recording::{AudioFormat, CapabilityTier};
use call_recorder::infrastructure::XdgConfigStore;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let presenter = Presenter::new();

    // Build CLI config from args
    let cli_config = AppConfig {
        audio_format: cli.format.map(|f| AudioFormat::from(f).to_string()),
        capability_tier: cli.tier.map(|t| CapabilityTier::from(t).to_string()),
        country: cli.country.clone(),
        socket_path: cli.socket.clone(),
        notify: if cli.notify { Some(true) } else { None },
        ..Default::default()
    };

    match cli.command {
        Commands::Config { action } => {
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            ExitCode::SUCCESS
        }
        Commands::Policy { file } => {
            let config = load_merged_config(cli_config).await;
            match handle_policy_command(file, config.country, &presenter) {
                Ok(_) => ExitCode::SUCCESS,
                Err(e) => {
                    presenter.error(&e);
                    ExitCode::from(EXIT_USAGE_ERROR)
                }
            }
        }
        command => run_daemon_command(command, cli_config, &presenter).await,
    }
}

#[cfg(unix)]
async fn run_daemon_command(
    command: Commands,
    cli_config: AppConfig,
    presenter: &Presenter,
) -> ExitCode {
    use call_recorder::cli::{ctl_cmd::handle_ctl_command, ipc::SocketPath, run_engine, run_supervisor};

    let config = load_merged_config(cli_config).await;
    match command {
        Commands::Engine => run_engine(config).await,
        Commands::Supervise => run_supervisor(config).await,
        Commands::Ctl { action } => {
            let socket_path = SocketPath::resolve(config.socket_path.as_deref());
            if let Err(e) = handle_ctl_command(action, &socket_path, presenter).await {
                presenter.error(&e);
                return ExitCode::from(EXIT_ERROR);
            }
            ExitCode::SUCCESS
        }
        Commands::Config { .. } | Commands::Policy { .. } => ExitCode::from(EXIT_USAGE_ERROR),
    }
}

#[cfg(not(unix))]
async fn run_daemon_command(
    _command: Commands,
    _cli_config: AppConfig,
    presenter: &Presenter,
) -> ExitCode {
    presenter.error("The engine and supervisor require Unix domain sockets");
    ExitCode::from(EXIT_ERROR)
}
