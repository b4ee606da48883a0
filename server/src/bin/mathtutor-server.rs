use clap::Parser;
use mathtutor_core::config::{get_default_config_file, TutorConfig, APP_NAME};
use mathtutor_core::{ChatController, GeminiGateway, ResponseRenderer};
use mathtutor_server::{run_server, AppState};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "mathtutor-server", about = "HTTP server for the grade 12 math tutor")]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Gemini API key
    #[arg(short = 'k', long)]
    api_key: Option<String>,

    /// Gemini model to use
    #[arg(short = 'o', long)]
    model: Option<String>,

    /// HTTP server address
    #[arg(long)]
    http_addr: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn overrides(&self) -> TutorConfig {
        TutorConfig {
            api_key: self.api_key.clone(),
            model_name: self.model.clone(),
            http_addr: self.http_addr.clone(),
            log_level: self.log_level.clone(),
            ..Default::default()
        }
    }
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line args
    let args = Args::parse();

    // File < environment < command line
    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => get_default_config_file(APP_NAME)?,
    };
    let file_config = TutorConfig::load_from_file(&config_path)
        .map_err(|e| anyhow::anyhow!("Configuration error in {}: {}", config_path.display(), e))?;
    let config = file_config
        .merge(&TutorConfig::from_env())
        .merge(&args.overrides());

    // Initialize logging
    init_tracing(config.log_level())?;
    info!("Starting MathTutor server");
    info!("Loaded configuration from {}", config_path.display());

    let gateway_config = match config.gateway_config() {
        Ok(gateway_config) => gateway_config,
        Err(e) => {
            error!(error = %e, "Cannot initialize Gemini gateway");
            return Err(e.into());
        }
    };
    let gateway = GeminiGateway::new(gateway_config);

    let addr: SocketAddr = config
        .http_addr()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid HTTP address {}: {}", config.http_addr(), e))?;

    let state = AppState::new(
        ChatController::new(Arc::new(gateway)),
        ResponseRenderer::default(),
    );

    if let Err(e) = run_server(state, addr).await {
        error!(error = %e, "HTTP server failed");
        return Err(e);
    }

    info!("MathTutor server shutting down");
    Ok(())
}
