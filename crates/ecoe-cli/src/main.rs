//! ECOE question editor CLI.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};
use ecoe_cli::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use ecoe_cli::commands::{
    Report, client_config, run_move, run_options, run_qblocks, run_reorder, run_tree,
};
use ecoe_cli::logging::{LogConfig, LogFormat, init_logging};
use ecoe_client::HttpFetcher;
use tracing::level_filters::LevelFilter;

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("error: failed to start runtime: {error}");
            std::process::exit(1);
        }
    };

    let exit_code = match runtime.block_on(run(&cli)) {
        Ok(report) => {
            println!("{report}");
            0
        }
        Err(error) => {
            tracing::error!("command failed: {error:#}");
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

async fn run(cli: &Cli) -> anyhow::Result<Report> {
    let config = client_config(cli.config.as_deref(), cli.base_url.clone(), cli.token.clone())?;
    let fetcher = HttpFetcher::new(&config)?;
    match &cli.command {
        Command::Tree(args) => run_tree(&fetcher, args).await,
        Command::Options(args) => run_options(&fetcher, args).await,
        Command::Reorder(args) => run_reorder(&fetcher, args).await,
        Command::Move(args) => run_move(&fetcher, args).await,
        Command::Qblocks(args) => run_qblocks(&fetcher, args).await,
    }
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
