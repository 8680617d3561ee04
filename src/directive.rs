//! Classification of one line of user input
//!
//! Matching is case-insensitive and ignores surrounding whitespace. Anything
//! that is not one of the fixed directives is an ordinary message, passed on
//! with its original casing.

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Leave the session loop
    Exit,
    /// Clear the transcript
    Reset,
    /// Export the transcript to a Markdown file
    SaveChat,
    /// Run the automode controller with this iteration budget
    Automode(u32),
    /// Ask for an image path to attach to the next message
    Image,
    /// Ordinary user message
    Message(String),
}

/// Classify `line` into exactly one [`Directive`]
///
/// # Errors
///
/// `InvalidArgument` when the line starts with `automode` but the iteration
/// count is missing, not a number, or not positive.
///
/// # Examples
///
/// ```rust
/// use groq_engineer::{parse_directive, Directive};
///
/// assert_eq!(parse_directive("  EXIT ").unwrap(), Directive::Exit);
/// assert_eq!(parse_directive("automode 3").unwrap(), Directive::Automode(3));
/// assert!(parse_directive("automode").is_err());
/// ```
pub fn parse_directive(line: &str) -> Result<Directive> {
    let trimmed = line.trim();
    let lowered = trimmed.to_lowercase();

    match lowered.as_str() {
        "exit" => return Ok(Directive::Exit),
        "reset" => return Ok(Directive::Reset),
        "image" => return Ok(Directive::Image),
        _ => {}
    }

    let words: Vec<&str> = lowered.split_whitespace().collect();
    match words.as_slice() {
        ["save", "chat"] => Ok(Directive::SaveChat),
        ["automode"] => Err(Error::invalid_argument(
            "automode needs an iteration count, e.g. 'automode 5'",
        )),
        ["automode", count] => parse_iterations(count).map(Directive::Automode),
        ["automode", ..] => Err(Error::invalid_argument(
            "automode takes exactly one argument, e.g. 'automode 5'",
        )),
        _ => Ok(Directive::Message(trimmed.to_string())),
    }
}

fn parse_iterations(raw: &str) -> Result<u32> {
    let count: u32 = raw.parse().map_err(|_| {
        Error::invalid_argument(format!(
            "'{}' is not a valid iteration count; use a positive integer",
            raw
        ))
    })?;

    if count == 0 {
        return Err(Error::invalid_argument(
            "automode iteration count must be positive",
        ));
    }

    Ok(count)
}
