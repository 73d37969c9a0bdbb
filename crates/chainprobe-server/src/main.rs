use std::net::SocketAddr;
use std::process::ExitCode;

use chainprobe_core::init_observability;
use chainprobe_server::config::{self, AppConfig};
use chainprobe_server::console::{ConsoleWriter, watch};
use chainprobe_server::error::CliError;
use chainprobe_server::render::summary;
use chainprobe_server::{app_state, routes};
use clap::{Parser, Subcommand};
use tracing::{error, info};

/// Compare transfer fees and confirmation times across three networks.
#[derive(Parser)]
#[command(name = "chainprobe", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API and event stream
    Serve {
        /// Listen address (overrides CHAINPROBE_BIND)
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Open a session on a running server and print it live
    Watch {
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        server: String,
    },
    /// Run one session in-process and print it
    Run {
        /// Extra factor applied to every simulated delay
        #[arg(long)]
        latency_scale: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    config::load_dotenv();
    init_observability();
    let cli = Cli::parse();
    match execute(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "command failed");
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn execute(command: Command) -> Result<(), CliError> {
    let mut config = AppConfig::from_env()?;
    match command {
        Command::Serve { bind } => {
            let bind = bind.unwrap_or(config.bind);
            let app = routes::router(app_state(&config)?);
            let listener = tokio::net::TcpListener::bind(bind).await?;
            info!(%bind, "listening");
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = tokio::signal::ctrl_c().await;
                    info!("shutdown requested");
                })
                .await?;
        }
        Command::Watch { server } => {
            let http = reqwest::Client::builder().build()?;
            let view = watch(&http, &server).await?;
            print!("\n{}", summary(&view));
        }
        Command::Run { latency_scale } => {
            if let Some(scale) = latency_scale {
                config.probes = config.probes.with_latency_scale(scale);
            }
            let state = app_state(&config)?;
            let (writer, view) = ConsoleWriter::new();
            let report = state.multiplexer.run(writer).await;
            info!(session_id = %report.session_id, end = ?report.end, "session finished");
            if let Ok(view) = view.await {
                print!("\n{}", summary(&view));
            }
        }
    }
    Ok(())
}
