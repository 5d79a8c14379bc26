//! Keyboard commands that drive the mock sensor.
//!
//! Without a serial port the binary runs against [`MockSensor`], and lines
//! typed on stdin stand in for fingers on the glass.
//!
//! [`MockSensor`]: fingerlight_hardware::mock::MockSensor

use std::str::FromStr;

use fingerlight_hardware::mock::MockSensorHandle;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

const DEFAULT_CONFIDENCE: u16 = 100;

pub const HELP: &str = "commands: known <id> [confidence] | new | hold <polls> | help";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// An enrolled finger is placed on the sensor.
    Known { id: u16, confidence: u16 },
    /// An unknown finger is held long enough to enroll.
    New,
    /// The finger stays on the sensor for more polls.
    Hold(usize),
    Help,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = match words.next() {
            Some("known" | "k") => {
                let id = parse_arg(words.next(), "id")?;
                let confidence = match words.next() {
                    Some(raw) => parse_arg(Some(raw), "confidence")?,
                    None => DEFAULT_CONFIDENCE,
                };
                Self::Known { id, confidence }
            }
            Some("new" | "n") => Self::New,
            Some("hold" | "h") => Self::Hold(parse_arg(words.next(), "polls")?),
            Some("help" | "?") => Self::Help,
            Some(other) => return Err(format!("unknown command '{other}'")),
            None => return Err("empty command".to_string()),
        };
        match words.next() {
            Some(extra) => Err(format!("unexpected argument '{extra}'")),
            None => Ok(command),
        }
    }
}

fn parse_arg<T: FromStr>(raw: Option<&str>, name: &str) -> Result<T, String> {
    let raw = raw.ok_or_else(|| format!("missing {name}"))?;
    raw.parse().map_err(|_| format!("invalid {name} '{raw}'"))
}

impl Command {
    pub fn apply(self, sensor: &MockSensorHandle) {
        match self {
            Self::Known { id, confidence } => sensor.present_known_finger(id, confidence),
            Self::New => sensor.present_new_finger(),
            Self::Hold(polls) => sensor.hold_finger(polls),
            Self::Help => info!("{}", HELP),
        }
    }
}

/// Read commands from stdin until it closes.
pub async fn run(sensor: MockSensorHandle) {
    info!("Mock sensor ready; {}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => {}
            Ok(Some(line)) => match line.parse::<Command>() {
                Ok(command) => command.apply(&sensor),
                Err(e) => warn!("{}; {}", e, HELP),
            },
            Ok(None) => break,
            Err(e) => {
                warn!("Cannot read stdin: {}", e);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fingerlight_hardware::mock::MockSensor;
    use rstest::rstest;

    #[rstest]
    #[case("known 3", Command::Known { id: 3, confidence: 100 })]
    #[case("k 7 42", Command::Known { id: 7, confidence: 42 })]
    #[case("  new ", Command::New)]
    #[case("hold 5", Command::Hold(5))]
    #[case("?", Command::Help)]
    fn test_parse(#[case] line: &str, #[case] expected: Command) {
        assert_eq!(line.parse::<Command>(), Ok(expected));
    }

    #[rstest]
    #[case("", "empty command")]
    #[case("known", "missing id")]
    #[case("known x", "invalid id 'x'")]
    #[case("hold -1", "invalid polls '-1'")]
    #[case("new 2", "unexpected argument '2'")]
    #[case("wave", "unknown command 'wave'")]
    fn test_parse_errors(#[case] line: &str, #[case] message: &str) {
        assert_eq!(line.parse::<Command>(), Err(message.to_string()));
    }

    #[test]
    fn test_apply_scripts_sensor() {
        let (_sensor, handle) = MockSensor::new();
        Command::New.apply(&handle);
        assert_eq!(handle.pending_captures(), 3);

        Command::Hold(2).apply(&handle);
        assert_eq!(handle.pending_captures(), 5);
    }
}
