use clap::Parser;
use mathtutor_core::config::TutorConfig;
use std::path::PathBuf;

/// Terminal client for the grade 12 math tutor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The question to send
    #[arg(index = 1)] // Positional argument
    pub prompt: Option<String>,

    /// Image of the exercise to attach to the question
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Enter interactive chat mode
    #[arg(short, long, default_value_t = false)]
    pub interactive: bool,

    /// Enable verbose output
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Gemini API key
    #[arg(short = 'k', long)]
    pub api_key: Option<String>,

    /// Gemini model to use
    #[arg(short = 'o', long)]
    pub model: Option<String>,
}

impl Args {
    /// Config values given on the command line
    pub fn overrides(&self) -> TutorConfig {
        TutorConfig {
            api_key: self.api_key.clone(),
            model_name: self.model.clone(),
            log_level: self.verbose.then(|| "debug".to_string()),
            ..Default::default()
        }
    }

    /// Question for single query mode. An image alone is enough; the
    /// question text is then empty.
    pub fn single_query(&self) -> Option<String> {
        if self.interactive || (self.prompt.is_none() && self.image.is_none()) {
            return None;
        }
        Some(self.prompt.clone().unwrap_or_default())
    }
}
