//! Confirmation gate.
//!
//! Shows the candidate event and asks the user to accept or reject it.
//! Rejection ends the request; there is no edit-and-retry loop.

use crate::composer::CandidateEvent;
use log::{debug, info};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::fmt::Write as _;

pub const CONFIRM_PROMPT: &str = "Create this event? [y/N]: ";

/// The user's answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accepted,
    Rejected,
}

/// Gate state. `Accepted` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfirmationState {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl ConfirmationState {
    /// Record a decision. Only the first decision counts.
    pub fn decide(self, decision: Decision) -> Self {
        match self {
            ConfirmationState::Pending => match decision {
                Decision::Accepted => ConfirmationState::Accepted,
                Decision::Rejected => ConfirmationState::Rejected,
            },
            terminal => terminal,
        }
    }

    pub fn is_accepted(self) -> bool {
        self == ConfirmationState::Accepted
    }
}

/// Asks the user whether a candidate event should be committed
pub trait Confirmer {
    fn confirm(&mut self, event: &CandidateEvent) -> Result<Decision, ReadlineError>;
}

/// Interprets a typed answer. Anything but yes is a no.
pub fn parse_answer(answer: &str) -> Decision {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" => Decision::Accepted,
        _ => Decision::Rejected,
    }
}

/// Human-readable description of the candidate event
pub fn render_candidate(event: &CandidateEvent) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Proposed event");
    if event.has_summary() {
        let _ = writeln!(out, "  Summary: {}", event.summary);
    } else {
        let _ = writeln!(out, "  Summary: (no summary) - the request did not produce a title");
    }
    let _ = writeln!(out, "  Start:   {}", event.start.format("%a %Y-%m-%d %H:%M %Z"));
    let _ = writeln!(out, "  End:     {}", event.end.format("%a %Y-%m-%d %H:%M %Z"));
    if event.attendee_emails.is_empty() {
        let _ = writeln!(out, "  Guests:  none");
    } else {
        let guests = event.attendee_emails.iter().cloned().collect::<Vec<_>>().join(", ");
        let _ = writeln!(out, "  Guests:  {}", guests);
    }
    if !event.unresolved_guest_names.is_empty() {
        let _ = writeln!(
            out,
            "  Warning: not in contacts, will not be invited: {}",
            event.unresolved_guest_names.join(", ")
        );
    }
    out
}

/// Prompts on the terminal through rustyline
pub struct TerminalConfirmer {
    editor: DefaultEditor,
}

impl TerminalConfirmer {
    pub fn new() -> Result<Self, ReadlineError> {
        Ok(Self { editor: DefaultEditor::new()? })
    }
}

impl Confirmer for TerminalConfirmer {
    fn confirm(&mut self, event: &CandidateEvent) -> Result<Decision, ReadlineError> {
        println!("{}", render_candidate(event));
        let decision = match self.editor.readline(CONFIRM_PROMPT) {
            Ok(line) => parse_answer(&line),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                debug!("Confirmation prompt closed without an answer");
                Decision::Rejected
            }
            Err(err) => return Err(err),
        };
        info!("User decision: {:?}", decision);
        Ok(decision)
    }
}
