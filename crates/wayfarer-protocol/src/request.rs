//! Inbound commands.

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// One command as a client sends it: a verb and its (possibly empty)
/// parameter. Verbs are matched case-sensitively by the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub verb: String,
    #[serde(default)]
    pub param: String,
}

impl Request {
    pub fn new(verb: &str, param: &str) -> Self {
        Self {
            verb: verb.to_string(),
            param: param.to_string(),
        }
    }

    /// Parses a console line, `"verb rest of line"`. The parameter is
    /// everything after the first space, trimmed.
    ///
    /// # Errors
    /// `ProtocolError::InvalidMessage` for a blank line.
    pub fn parse_line(line: &str) -> Result<Self, ProtocolError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ProtocolError::InvalidMessage("empty command".into()));
        }
        Ok(match line.split_once(char::is_whitespace) {
            Some((verb, param)) => Self::new(verb, param.trim()),
            None => Self::new(line, ""),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_splits_on_first_space() {
        assert_eq!(Request::parse_line("go in").unwrap(), Request::new("go", "in"));
        assert_eq!(
            Request::parse_line("  inspect  Old Lantern ").unwrap(),
            Request::new("inspect", "Old Lantern")
        );
        assert_eq!(Request::parse_line("look").unwrap(), Request::new("look", ""));
    }

    #[test]
    fn test_parse_blank_line_is_invalid() {
        assert!(matches!(
            Request::parse_line("   "),
            Err(ProtocolError::InvalidMessage(_))
        ));
    }
}
