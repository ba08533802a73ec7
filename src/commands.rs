// gSENSOR - Command intake
//
// Serial console tokens:
//   r / R      reset peak
//   c / C      reset filters
//   s1..s4     sample rate 100 / 200 / 400 / 800 Hz
//   n<Hz>      wireless notification rate, e.g. `n25` (clamped to 5..50);
//              the first non-digit ends the number and is consumed
//   ?          status line

use crate::events::{Command, SampleRate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// `s` followed by something other than `1`..`4`.
    #[error("Invalid rate {:?}. Use s1=100Hz, s2=200Hz, s3=400Hz, s4=800Hz", *.0 as char)]
    InvalidRate(u8),
    /// `n` not followed by at least one digit.
    #[error("Invalid notify rate. Use n<Hz>, e.g. n20 (5-50 Hz)")]
    MissingNotifyRate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Pending {
    #[default]
    Idle,
    RateDigit,
    NotifyDigits { value: u16, digits: u8 },
}

/// Byte-at-a-time parser for the serial console.
#[derive(Debug, Default)]
pub struct CommandParser {
    pending: Pending,
}

impl CommandParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte. Unknown bytes (line endings included) yield `Ok(None)`.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Command>, ParseError> {
        match std::mem::take(&mut self.pending) {
            Pending::Idle => Ok(self.start(byte)),
            Pending::RateDigit => {
                let rate = match byte {
                    b'1' => SampleRate::Hz100,
                    b'2' => SampleRate::Hz200,
                    b'3' => SampleRate::Hz400,
                    b'4' => SampleRate::Hz800,
                    other => return Err(ParseError::InvalidRate(other)),
                };
                Ok(Some(Command::SetSampleRate(rate)))
            }
            Pending::NotifyDigits { value, digits } => {
                if byte.is_ascii_digit() {
                    // Saturates well above the clamp range; extra digits are harmless.
                    let value = (value * 10 + u16::from(byte - b'0')).min(999);
                    self.pending = Pending::NotifyDigits {
                        value,
                        digits: digits.saturating_add(1),
                    };
                    return Ok(None);
                }
                if digits == 0 {
                    return Err(ParseError::MissingNotifyRate);
                }
                let hz = u8::try_from(value).unwrap_or(u8::MAX);
                Ok(Some(Command::SetNotifyRate(hz)))
            }
        }
    }

    fn start(&mut self, byte: u8) -> Option<Command> {
        match byte {
            b'r' | b'R' => Some(Command::ResetPeak),
            b'c' | b'C' => Some(Command::ResetFilters),
            b'?' => Some(Command::Status),
            b's' | b'S' => {
                self.pending = Pending::RateDigit;
                None
            }
            b'n' | b'N' => {
                self.pending = Pending::NotifyDigits { value: 0, digits: 0 };
                None
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_all(input: &[u8]) -> Vec<Result<Option<Command>, ParseError>> {
        let mut parser = CommandParser::new();
        input.iter().map(|&b| parser.feed(b)).collect()
    }

    #[test]
    fn single_letter_commands() {
        let out: Vec<_> = parse_all(b"rC?\n").into_iter().map(Result::unwrap).collect();
        assert_eq!(
            out,
            vec![
                Some(Command::ResetPeak),
                Some(Command::ResetFilters),
                Some(Command::Status),
                None
            ]
        );
    }

    #[test]
    fn rate_selection_takes_two_bytes() {
        let out = parse_all(b"s3");
        assert_eq!(out[0], Ok(None));
        assert_eq!(out[1], Ok(Some(Command::SetSampleRate(SampleRate::Hz400))));
    }

    #[test]
    fn bad_rate_digit_is_reported_then_forgotten() {
        let mut parser = CommandParser::new();
        assert_eq!(parser.feed(b'S'), Ok(None));
        assert_eq!(parser.feed(b'9'), Err(ParseError::InvalidRate(b'9')));
        // The next byte is parsed as a fresh command.
        assert_eq!(parser.feed(b'1'), Ok(None));
        assert_eq!(parser.feed(b'r'), Ok(Some(Command::ResetPeak)));
    }

    #[test]
    fn errors_print_the_usage_hint() {
        assert_eq!(
            ParseError::InvalidRate(b'9').to_string(),
            "Invalid rate '9'. Use s1=100Hz, s2=200Hz, s3=400Hz, s4=800Hz"
        );
        assert!(ParseError::MissingNotifyRate.to_string().contains("n20"));
    }

    #[test]
    fn notify_rate_is_read_until_a_non_digit() {
        let out: Vec<_> = parse_all(b"n25\n").into_iter().map(Result::unwrap).collect();
        assert_eq!(out, vec![None, None, None, Some(Command::SetNotifyRate(25))]);

        let mut parser = CommandParser::new();
        for &b in b"N0" {
            assert_eq!(parser.feed(b), Ok(None));
        }
        assert_eq!(parser.feed(b'\r'), Ok(Some(Command::SetNotifyRate(0))));
    }

    #[test]
    fn oversized_notify_rate_saturates() {
        let out = parse_all(b"n123456\n");
        assert_eq!(out.last(), Some(&Ok(Some(Command::SetNotifyRate(u8::MAX)))));
    }

    #[test]
    fn notify_token_without_digits_is_reported() {
        let mut parser = CommandParser::new();
        assert_eq!(parser.feed(b'n'), Ok(None));
        assert_eq!(parser.feed(b'\n'), Err(ParseError::MissingNotifyRate));
        assert_eq!(parser.feed(b'?'), Ok(Some(Command::Status)));
    }
}
