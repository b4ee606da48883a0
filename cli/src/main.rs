use clap::Parser;
use colored::*;
use mathtutor_core::config::{get_default_config_file, TutorConfig, APP_NAME};
use mathtutor_core::{ChatController, GeminiGateway};
use std::sync::Arc;

mod app;
mod cli;
mod logging;
mod output;
mod utils;

use crate::cli::Args;
use crate::logging::log_error;
use crate::output::print_usage_instructions;

/// Main function - Loads configuration and runs the requested mode
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    // File < environment < command line
    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => get_default_config_file(APP_NAME)?,
    };
    let config = TutorConfig::load_from_file(&config_path)?
        .merge(&TutorConfig::from_env())
        .merge(&args.overrides());

    // Initialize logger with configured log level
    logging::init(config.log_level());

    let query = args.single_query();
    if query.is_none() && !args.interactive {
        print_usage_instructions();
        return Ok(());
    }

    let gateway = match config.gateway_config() {
        Ok(gateway_config) => GeminiGateway::new(gateway_config),
        Err(e) => {
            log_error(&format!("Failed to initialize Gemini gateway: {}", e));
            eprintln!(
                "{}",
                format!("Config file: {}", config_path.display()).yellow()
            );
            return Err(e.into());
        }
    };
    let controller = ChatController::new(Arc::new(gateway));

    if args.interactive {
        if let Err(e) = crate::app::run_interactive_chat(&controller).await {
            log_error(&format!("Error in interactive chat: {:#}", e));
        }
    } else if let Some(prompt) = query {
        if let Err(e) =
            crate::app::run_single_query(&controller, prompt, args.image.as_deref()).await
        {
            log_error(&format!("Error processing question: {:#}", e));
        }
    }

    Ok(())
}
