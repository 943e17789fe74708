//! Validation helpers shared by the contact directory and the intent extractor.
//
// Email checks guard everything that ends up in an attendee list, input
// sanitizing guards everything that ends up in an oracle prompt.

use once_cell::sync::Lazy;
use regex::Regex;

/// Longest request text accepted for extraction.
pub const MAX_REQUEST_LEN: usize = 1000;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]{1,64}@(?:[A-Za-z0-9-]+\.)+[A-Za-z]{2,63}$")
        .expect("email regex is valid")
});

/// Check that an address looks like a deliverable email
pub fn validate_email(email: &str) -> bool {
    EMAIL_RE.is_match(email) && !contains_dangerous_characters(email)
}

/// Characters that have no business in an address or a display name
pub fn contains_dangerous_characters(input: &str) -> bool {
    input.contains(';')
        || input.contains('&')
        || input.contains('|')
        || input.contains('<')
        || input.contains('>')
        || input.contains('$')
}

/// Strip control characters (except newlines and tabs) from user input
pub fn sanitize_user_input(input: &str) -> String {
    input.chars().filter(|&c| !c.is_control() || c == '\n' || c == '\t').collect::<String>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("alice@x.com" ; "simple")]
    #[test_case("first.last+tag@mail.example.org" ; "dotted with tag")]
    #[test_case("design-team@corp.co" ; "hyphenated local part")]
    fn test_valid_emails(email: &str) {
        assert!(validate_email(email), "expected '{}' to be valid", email);
    }

    #[test_case("" ; "empty")]
    #[test_case("alice" ; "no at sign")]
    #[test_case("alice@localhost" ; "no top level domain")]
    #[test_case("alice@x.com;rm" ; "semicolon")]
    #[test_case("a b@x.com" ; "whitespace")]
    fn test_invalid_emails(email: &str) {
        assert!(!validate_email(email), "expected '{}' to be rejected", email);
    }

    #[test]
    fn test_sanitize_user_input_keeps_newlines() {
        let input = "lunch\u{0007} with Sam\nFriday\tnoon";
        assert_eq!(sanitize_user_input(input), "lunch with Sam\nFriday\tnoon");
    }
}
