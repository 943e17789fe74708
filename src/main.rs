use anyhow::Result;
use clap::Parser;
use huddle::app::Outcome;
use huddle::calendar::format_upcoming;
use huddle::cli::Cli;
use huddle::confirm::TerminalConfirmer;
use log::{error, info};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

const PLAN_PROMPT: &str = "What's the plan?: ";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    huddle::init_logger();

    info!("Starting Huddle");
    let runtime = huddle::bootstrap()?;

    let text = match cli.request_text() {
        Some(text) => text,
        None => match read_request()? {
            Some(text) => text,
            None => {
                println!("Nothing to schedule.");
                return Ok(());
            }
        },
    };

    let mut confirmer = TerminalConfirmer::new()?;
    match runtime.app.process(&text, &mut confirmer).await {
        Ok(Outcome::Committed(committed)) => {
            println!("Event created: {}", committed.event.summary);
            println!("Link: {}", committed.link);
            if !committed.event.unresolved_guest_names.is_empty() {
                println!(
                    "Not invited (unknown): {}",
                    committed.event.unresolved_guest_names.join(", ")
                );
            }
        }
        Ok(Outcome::Rejected(_)) => println!("Cancelled. No event was created."),
        Err(e) => {
            error!("Request failed: {:?}", e);
            return Err(e.into());
        }
    }

    match runtime.app.upcoming(runtime.config.calendar.upcoming_count).await {
        Ok(events) => println!("\n{}", format_upcoming(&events)),
        Err(e) => {
            error!("Failed to list upcoming events: {:?}", e);
            return Err(e.into());
        }
    }

    Ok(())
}

/// Prompt for the request text. `None` on Ctrl-C, Ctrl-D or an empty line.
fn read_request() -> Result<Option<String>> {
    let mut rl = DefaultEditor::new()?;
    match rl.readline(PLAN_PROMPT) {
        Ok(line) if line.trim().is_empty() => Ok(None),
        Ok(line) => Ok(Some(line)),
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
        Err(err) => Err(err.into()),
    }
}
