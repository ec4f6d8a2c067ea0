//! Line-based call event feed for the supervisor
//!
//! Each stdin line is one command, e.g. `active +15551234`,
//! `hold +15551234`, `record`, `stop`.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedCommand {
    /// A call became active (new or resumed)
    Active(String),
    Hold(String),
    Resume(String),
    Disconnect(String),
    /// Record the given call, or the most recent active one
    Record(Option<String>),
    Stop,
    Status,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedParseError {
    pub line: String,
    pub reason: &'static str,
}

impl fmt::Display for FeedParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: '{}'", self.reason, self.line)
    }
}

impl std::error::Error for FeedParseError {}

impl FromStr for FeedCommand {
    type Err = FeedParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().map(str::to_lowercase);
        let number = words.next().map(str::to_string);
        let err = |reason| FeedParseError {
            line: line.to_string(),
            reason,
        };

        if words.next().is_some() {
            return Err(err("too many arguments"));
        }

        let needs_number = |number: Option<String>| number.ok_or_else(|| err("missing number"));

        match verb.as_deref() {
            Some("active") | Some("dial") => Ok(Self::Active(needs_number(number)?)),
            Some("hold") => Ok(Self::Hold(needs_number(number)?)),
            Some("resume") => Ok(Self::Resume(needs_number(number)?)),
            Some("disconnect") | Some("hangup") => Ok(Self::Disconnect(needs_number(number)?)),
            Some("record") => Ok(Self::Record(number)),
            Some("stop") if number.is_none() => Ok(Self::Stop),
            Some("status") if number.is_none() => Ok(Self::Status),
            Some("stop") | Some("status") => Err(err("unexpected argument")),
            Some(_) => Err(err("unknown command")),
            None => Err(err("empty line")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_call_events() {
        assert_eq!(
            "active +15551234".parse::<FeedCommand>(),
            Ok(FeedCommand::Active("+15551234".to_string()))
        );
        assert_eq!(
            "HOLD 555".parse::<FeedCommand>(),
            Ok(FeedCommand::Hold("555".to_string()))
        );
        assert_eq!(
            "hangup 555".parse::<FeedCommand>(),
            Ok(FeedCommand::Disconnect("555".to_string()))
        );
    }

    #[test]
    fn record_number_is_optional() {
        assert_eq!("record".parse::<FeedCommand>(), Ok(FeedCommand::Record(None)));
        assert_eq!(
            "record 555".parse::<FeedCommand>(),
            Ok(FeedCommand::Record(Some("555".to_string())))
        );
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!("hold".parse::<FeedCommand>().is_err());
        assert!("stop 555".parse::<FeedCommand>().is_err());
        assert!("active 1 2".parse::<FeedCommand>().is_err());
        assert!("toggle".parse::<FeedCommand>().is_err());
        assert!("   ".parse::<FeedCommand>().is_err());
    }
}
