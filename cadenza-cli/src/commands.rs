//! Interactive commands read from stdin while playing.

use cadenza_core::Direction;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerCommand {
    Toggle,
    Advance(Direction),
    SkipForward,
    SkipBackward,
    /// Drag the slider to a value in `[0, 100]` and release it
    Scrub(f64),
    Quit,
    Help,
}

pub const HELP: &str = "\
p        play/pause
n / b    next / previous track
f / r    forward / rewind
s <0-100> seek to a slider position
q        quit";

impl PlayerCommand {
    /// Parse one input line. Unknown input yields `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace();
        let command = match words.next()? {
            "p" | "play" | "pause" => Self::Toggle,
            "n" | "next" => Self::Advance(Direction::Next),
            "b" | "prev" | "previous" => Self::Advance(Direction::Previous),
            "f" | "forward" => Self::SkipForward,
            "r" | "rewind" => Self::SkipBackward,
            "s" | "seek" => {
                let value: f64 = words.next()?.parse().ok()?;
                if !value.is_finite() {
                    return None;
                }
                Self::Scrub(value)
            }
            "q" | "quit" => Self::Quit,
            "h" | "help" | "?" => Self::Help,
            _ => return None,
        };
        Some(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(PlayerCommand::parse("p"), Some(PlayerCommand::Toggle));
        assert_eq!(
            PlayerCommand::parse(" next "),
            Some(PlayerCommand::Advance(Direction::Next))
        );
        assert_eq!(
            PlayerCommand::parse("b"),
            Some(PlayerCommand::Advance(Direction::Previous))
        );
        assert_eq!(PlayerCommand::parse("f"), Some(PlayerCommand::SkipForward));
        assert_eq!(PlayerCommand::parse("q"), Some(PlayerCommand::Quit));
    }

    #[test]
    fn test_parse_scrub() {
        assert_eq!(PlayerCommand::parse("s 50"), Some(PlayerCommand::Scrub(50.0)));
        assert_eq!(PlayerCommand::parse("s"), None);
        assert_eq!(PlayerCommand::parse("s abc"), None);
        assert_eq!(PlayerCommand::parse("s NaN"), None);
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(PlayerCommand::parse(""), None);
        assert_eq!(PlayerCommand::parse("dance"), None);
    }
}
