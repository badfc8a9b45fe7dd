//! Landing page greeting.

use chrono::{Local, Timelike};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Greeting {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl Greeting {
    /// Greeting for an hour of the local day (0-23)
    #[must_use]
    pub const fn for_hour(hour: u32) -> Self {
        match hour {
            5..=11 => Self::Morning,
            12..=16 => Self::Afternoon,
            17..=19 => Self::Evening,
            _ => Self::Night,
        }
    }

    /// Greeting for the current local time
    #[must_use]
    pub fn current() -> Self {
        Self::for_hour(Local::now().hour())
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Morning => "Good Morning",
            Self::Afternoon => "Good Afternoon",
            Self::Evening => "Good Evening",
            Self::Night => "Good Night",
        }
    }
}

impl std::fmt::Display for Greeting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_boundaries() {
        assert_eq!(Greeting::for_hour(4), Greeting::Night);
        assert_eq!(Greeting::for_hour(5), Greeting::Morning);
        assert_eq!(Greeting::for_hour(11), Greeting::Morning);
        assert_eq!(Greeting::for_hour(12), Greeting::Afternoon);
        assert_eq!(Greeting::for_hour(16), Greeting::Afternoon);
        assert_eq!(Greeting::for_hour(17), Greeting::Evening);
        assert_eq!(Greeting::for_hour(19), Greeting::Evening);
        assert_eq!(Greeting::for_hour(20), Greeting::Night);
        assert_eq!(Greeting::for_hour(0), Greeting::Night);
    }

    #[test]
    fn test_greeting_text() {
        assert_eq!(Greeting::Afternoon.to_string(), "Good Afternoon");
    }
}
