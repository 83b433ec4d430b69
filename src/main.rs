use anyhow::Result;
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use pianosheet::app::{
    ConvertOptions, ConvertOutcome, run_analyze_command, run_convert_command, run_status_command,
};
use pianosheet::cli::{Cli, Commands, ConfigAction};
use pianosheet::config::Config;
use std::path::{Path, PathBuf};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Convert {
            input,
            source,
            out,
            name,
            stdout,
        } => {
            let config = load_config(
                cli.config.as_deref(),
                cli.backend_url,
                cli.locale,
                cli.timeout,
            )?;
            let options = ConvertOptions {
                input,
                source: source.map(Into::into),
                out,
                name,
                to_stdout: stdout,
                quiet: cli.quiet,
            };
            match run_convert_command(config, options).await? {
                ConvertOutcome::Exported(paths) => {
                    if !cli.quiet {
                        for path in paths {
                            println!("{} {}", "Wrote".green(), path.display());
                        }
                    }
                }
                ConvertOutcome::Printed => {}
                ConvertOutcome::Cancelled => {
                    if !cli.quiet {
                        eprintln!("{}", "Cancelled".dimmed());
                    }
                }
                ConvertOutcome::Failed(message) => {
                    // The renderer already printed it unless quiet
                    if cli.quiet {
                        eprintln!("Error: {}", message);
                    }
                    std::process::exit(1);
                }
            }
        }
        Commands::Analyze { url } => {
            let config = load_config(
                cli.config.as_deref(),
                cli.backend_url,
                cli.locale,
                cli.timeout,
            )?;
            run_analyze_command(config, &url).await?;
        }
        Commands::Status => {
            let config = load_config(
                cli.config.as_deref(),
                cli.backend_url,
                cli.locale,
                cli.timeout,
            )?;
            run_status_command(config).await?;
        }
        Commands::Config { action } => {
            handle_config_command(
                action,
                cli.config.as_deref(),
                cli.backend_url,
                cli.locale,
                cli.timeout,
            )?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "pianosheet",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

/// Log to stderr. RUST_LOG wins over -v.
fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "pianosheet=warn",
        1 => "pianosheet=info",
        _ => "pianosheet=debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Priority order (later wins):
/// 1. Built-in defaults
/// 2. Config file (--config, or ~/.config/pianosheet/config.toml if present)
/// 3. Environment variables
/// 4. Command-line flags
fn load_config(
    custom_path: Option<&Path>,
    backend_url: Option<String>,
    locale: Option<pianosheet::Locale>,
    timeout: Option<u64>,
) -> Result<Config> {
    let config = match custom_path {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(&Config::default_path())?,
    };
    let config = config
        .with_env_overrides()
        .with_overrides(backend_url, locale, timeout);
    config.validate()?;
    Ok(config)
}

fn handle_config_command(
    action: ConfigAction,
    custom_path: Option<&Path>,
    backend_url: Option<String>,
    locale: Option<pianosheet::Locale>,
    timeout: Option<u64>,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(custom_path, backend_url, locale, timeout)?;
            print!("{}", config.to_display_toml()?);
        }
        ConfigAction::Path => {
            let path = custom_path
                .map(PathBuf::from)
                .unwrap_or_else(Config::default_path);
            println!("{}", path.display());
            if !path.exists() {
                eprintln!("{}", "(file does not exist; defaults are in use)".dimmed());
            }
        }
        ConfigAction::Dump => {
            print!("{}", Config::dump_template());
        }
    }
    Ok(())
}
