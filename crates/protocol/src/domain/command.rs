//! Command Parsing
//!
//! A line is split on single spaces into a command name and argument
//! tokens, then classified into a [`Request`]. Consecutive spaces produce
//! empty tokens, which count toward the arity.

use crate::error::ProtocolViolation;
use derive_more::Display;
use pow::Difficulty;

/// Raw tokens of one input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command<'a> {
    pub name: &'a str,
    pub args: Vec<&'a str>,
}

impl<'a> Command<'a> {
    pub fn parse(line: &'a str) -> Self {
        let mut tokens = line.split(' ');
        let name = tokens.next().unwrap_or_default();
        Self {
            name,
            args: tokens.collect(),
        }
    }

    fn expect_args(&self, expected: usize) -> Result<(), ProtocolViolation> {
        if self.args.len() == expected {
            Ok(())
        } else {
            Err(ProtocolViolation::WrongArity {
                command: self.name.to_string(),
                expected,
                actual: self.args.len(),
            })
        }
    }
}

/// Identity field addressed by a query command
///
/// Indices are 1-based as sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum IdentityField {
    #[display("NAME")]
    Name,
    #[display("MAILNUM")]
    MailCount,
    #[display("MAIL{_0}")]
    Mail(usize),
    #[display("SKYPE")]
    Skype,
    #[display("BIRTHDATE")]
    Birthdate,
    #[display("COUNTRY")]
    Country,
    #[display("ADDRNUM")]
    AddressCount,
    #[display("ADDRLINE{_0}")]
    AddressLine(usize),
}

impl IdentityField {
    /// Match a command name, `None` when it is not a query
    fn from_name(name: &str) -> Result<Option<Self>, ProtocolViolation> {
        let field = match name {
            "NAME" => Self::Name,
            "MAILNUM" => Self::MailCount,
            "SKYPE" => Self::Skype,
            "BIRTHDATE" => Self::Birthdate,
            "COUNTRY" => Self::Country,
            "ADDRNUM" => Self::AddressCount,
            _ => {
                if let Some(index) = name.strip_prefix("ADDRLINE") {
                    Self::AddressLine(parse_index(name, index)?)
                } else if let Some(index) = name.strip_prefix("MAIL") {
                    Self::Mail(parse_index(name, index)?)
                } else {
                    return Ok(None);
                }
            }
        };
        Ok(Some(field))
    }
}

/// Decimal digits only; range is checked against the identity later
fn parse_index(name: &str, digits: &str) -> Result<usize, ProtocolViolation> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ProtocolViolation::InvalidIndex(name.to_string()));
    }
    digits
        .parse()
        .map_err(|_| ProtocolViolation::InvalidIndex(name.to_string()))
}

/// Classified peer request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Helo,
    Error { reason: String },
    Pow { challenge: String, difficulty: Difficulty },
    End,
    Query { field: IdentityField, nonce: String },
}

impl Request {
    /// Parse one trimmed input line
    pub fn parse(line: &str) -> Result<Self, ProtocolViolation> {
        Self::from_command(&Command::parse(line))
    }

    pub fn from_command(command: &Command<'_>) -> Result<Self, ProtocolViolation> {
        match command.name {
            "HELO" => {
                command.expect_args(0)?;
                Ok(Request::Helo)
            }
            "ERROR" => Ok(Request::Error {
                reason: command.args.join(" "),
            }),
            "POW" => {
                command.expect_args(2)?;
                let difficulty = command.args[1]
                    .parse::<Difficulty>()
                    .map_err(|_| ProtocolViolation::InvalidDifficulty(command.args[1].to_string()))?;
                Ok(Request::Pow {
                    challenge: command.args[0].to_string(),
                    difficulty,
                })
            }
            "END" => {
                command.expect_args(0)?;
                Ok(Request::End)
            }
            name => match IdentityField::from_name(name)? {
                Some(field) => {
                    command.expect_args(1)?;
                    Ok(Request::Query {
                        field,
                        nonce: command.args[0].to_string(),
                    })
                }
                None => Err(ProtocolViolation::UnknownCommand(name.to_string())),
            },
        }
    }

    /// Command name for logging
    pub fn name(&self) -> String {
        match self {
            Request::Helo => "HELO".to_string(),
            Request::Error { .. } => "ERROR".to_string(),
            Request::Pow { .. } => "POW".to_string(),
            Request::End => "END".to_string(),
            Request::Query { field, .. } => field.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_single_spaces() {
        let command = Command::parse("POW  abc 3");
        assert_eq!(command.name, "POW");
        assert_eq!(command.args, vec!["", "abc", "3"]);
        assert_eq!(Command::parse("").name, "");
    }

    #[test]
    fn test_control_commands() {
        assert_eq!(Request::parse("HELO").unwrap(), Request::Helo);
        assert_eq!(Request::parse("END").unwrap(), Request::End);
        assert_eq!(
            Request::parse("ERROR bad client cert").unwrap(),
            Request::Error {
                reason: "bad client cert".to_string()
            }
        );
        assert_eq!(
            Request::parse("ERROR").unwrap(),
            Request::Error {
                reason: String::new()
            }
        );
    }

    #[test]
    fn test_pow_command() {
        assert_eq!(
            Request::parse("POW abc123 6").unwrap(),
            Request::Pow {
                challenge: "abc123".to_string(),
                difficulty: Difficulty::new(6).unwrap(),
            }
        );
        assert_eq!(
            Request::parse("POW abc123 x"),
            Err(ProtocolViolation::InvalidDifficulty("x".to_string()))
        );
        assert_eq!(
            Request::parse("POW abc123 41"),
            Err(ProtocolViolation::InvalidDifficulty("41".to_string()))
        );
        assert!(matches!(
            Request::parse("POW abc123"),
            Err(ProtocolViolation::WrongArity { expected: 2, actual: 1, .. })
        ));
    }

    #[test]
    fn test_query_commands() {
        let cases = [
            ("NAME n1", IdentityField::Name),
            ("MAILNUM n1", IdentityField::MailCount),
            ("MAIL1 n1", IdentityField::Mail(1)),
            ("MAIL12 n1", IdentityField::Mail(12)),
            ("SKYPE n1", IdentityField::Skype),
            ("BIRTHDATE n1", IdentityField::Birthdate),
            ("COUNTRY n1", IdentityField::Country),
            ("ADDRNUM n1", IdentityField::AddressCount),
            ("ADDRLINE2 n1", IdentityField::AddressLine(2)),
        ];
        for (line, field) in cases {
            assert_eq!(
                Request::parse(line).unwrap(),
                Request::Query {
                    field,
                    nonce: "n1".to_string()
                },
                "{line}"
            );
        }
    }

    #[test]
    fn test_index_must_be_digits() {
        for line in ["MAIL n1", "MAILx n1", "MAIL-1 n1", "ADDRLINE n1", "ADDRLINE1a n1"] {
            assert!(
                matches!(Request::parse(line), Err(ProtocolViolation::InvalidIndex(_))),
                "{line}"
            );
        }
        // Range is the identity's business
        assert_eq!(
            Request::parse("MAIL0 n1").unwrap(),
            Request::Query {
                field: IdentityField::Mail(0),
                nonce: "n1".to_string()
            }
        );
    }

    #[test]
    fn test_strict_arity() {
        assert!(matches!(
            Request::parse("NAME"),
            Err(ProtocolViolation::WrongArity { expected: 1, actual: 0, .. })
        ));
        assert!(matches!(
            Request::parse("NAME a b"),
            Err(ProtocolViolation::WrongArity { expected: 1, actual: 2, .. })
        ));
        assert!(matches!(
            Request::parse("HELO there"),
            Err(ProtocolViolation::WrongArity { expected: 0, .. })
        ));
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            Request::parse("PING"),
            Err(ProtocolViolation::UnknownCommand("PING".to_string()))
        );
        assert_eq!(
            Request::parse("helo"),
            Err(ProtocolViolation::UnknownCommand("helo".to_string()))
        );
    }

    #[test]
    fn test_field_display() {
        assert_eq!(IdentityField::Mail(3).to_string(), "MAIL3");
        assert_eq!(IdentityField::AddressLine(1).to_string(), "ADDRLINE1");
    }
}
