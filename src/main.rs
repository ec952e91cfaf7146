mod app;
pub mod audio;
pub mod chat;
pub mod client;
mod config;
pub mod error; // contains api, app, chat, config submodules
pub mod report;
pub mod session;
mod telemetry;
pub mod types;

#[cfg(test)]
mod tests;

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "voice-analysis")]
#[command(about = "Record or upload speech and read back its voice analysis", long_about = None)]
struct Args {
    /// Analysis server base URL (overrides the config file)
    #[arg(long, global = true)]
    server: Option<String>,

    /// Config file to use instead of the platform default
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: app::Command,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Secrets such as GEMINI_API_KEY may live in a local .env
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match config::AppConfig::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => config::AppConfig::load(),
    };
    if let Some(server) = args.server {
        config.server.base_url = server;
    }
    if args.verbose {
        config.logging.level = "debug".to_string();
    }
    telemetry::init_tracing(&config.logging);

    let app = match app::VoiceApp::new(config) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(e.exit_code());
        }
    };

    match app.run(args.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
