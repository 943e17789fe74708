use clap::Parser;

/// Huddle - turn a sentence into a calendar invite
#[derive(Debug, Parser)]
#[command(name = "huddle")]
#[command(about = "Schedule a calendar event from a free-text request", long_about = None)]
#[command(version)]
pub struct Cli {
    /// The request, e.g. `lunch with Sam and the design team Friday at noon`.
    /// Prompts interactively when omitted.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub request: Vec<String>,
}

impl Cli {
    /// Request words joined with spaces, or `None` when nothing was given
    pub fn request_text(&self) -> Option<String> {
        let text = self.request.join(" ");
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}
