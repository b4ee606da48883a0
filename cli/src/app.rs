use anyhow::{Context, Result};
use colored::*;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use mathtutor_core::{ChatController, ConfirmPrompt, Rejected, SubmitOutcome};
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use crate::logging::log_error;
use crate::output::{print_chat_commands, print_message};
use crate::utils::{load_image_as_data_url, parse_image_command};

/// Asks the clear-history question on the terminal
struct TerminalConfirm;

impl ConfirmPrompt for TerminalConfirm {
    fn confirm(&self, question: &str) -> bool {
        Confirm::new()
            .with_prompt(question)
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}

fn spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        .template("{spinner} {msg}")
    {
        spinner.set_style(style);
    }
    spinner.set_message("Đang suy nghĩ...");
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

/// Submit one question and print what the controller appended
async fn ask(controller: &ChatController, text: &str, image_url: Option<String>) {
    let spinner = spinner();
    let outcome = controller.submit(text, image_url).await;
    spinner.finish_and_clear();

    match outcome {
        SubmitOutcome::Rejected(Rejected::Empty) => debug!("Nothing to send"),
        SubmitOutcome::Rejected(reason) => log_error(&format!("Question not sent: {:?}", reason)),
        SubmitOutcome::Answered { reply, .. } | SubmitOutcome::Failed { reply, .. } => {
            print_message(&reply);
        }
    }
}

/// Runs a single query mode, sending one question and displaying the answer
pub async fn run_single_query(
    controller: &ChatController,
    prompt: String,
    image: Option<&Path>,
) -> Result<()> {
    info!("Running single query: {}", prompt);

    let image_url = image.map(load_image_as_data_url).transpose()?;
    ask(controller, &prompt, image_url).await;
    Ok(())
}

/// Runs an interactive tutoring session
pub async fn run_interactive_chat(controller: &ChatController) -> Result<()> {
    for message in controller.messages() {
        print_message(&message);
    }
    println!();
    print_chat_commands();

    loop {
        // Prompt for user input
        print!("{}: ", "Bạn".green().bold());
        io::stdout().flush().context("Failed to flush stdout")?;

        let mut input = String::new();
        let read = io::stdin()
            .read_line(&mut input)
            .context("Failed to read input")?;
        if read == 0 {
            break;
        }

        let line = input.trim_end_matches(['\r', '\n']);
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        // Check for exit command
        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            println!("Exiting chat session.");
            break;
        }

        if input == "/clear" {
            if controller.clear(&TerminalConfirm) {
                for message in controller.messages() {
                    print_message(&message);
                }
            }
            continue;
        }

        if let Some(rest) = input.strip_prefix("/image") {
            let Some((path, question)) = parse_image_command(rest) else {
                log_error("Usage: /image <FILE> [question]");
                continue;
            };
            match load_image_as_data_url(Path::new(path)) {
                Ok(url) => ask(controller, question, Some(url)).await,
                Err(e) => log_error(&format!("{:#}", e)),
            }
        } else {
            debug!("Sending question: {}", line);
            ask(controller, line, None).await;
        }

        println!(); // Add spacing between interactions
    }

    Ok(())
}
