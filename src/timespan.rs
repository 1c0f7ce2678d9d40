use core::fmt;
use core::str::FromStr;
use core::time::Duration;
use std::sync::LazyLock;

use regex::Regex;

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 60 * SECONDS_PER_MINUTE;

static SHORTHAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?P<hours>[0-9]+)h)?(?:(?P<minutes>[0-9]+)m)?(?:(?P<seconds>[0-9]+)s)?$")
        .expect("timespan pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeSpanError {
    #[error("invalid timespan '{input}': expected a shorthand like 3h30m, 20m or 1m15s")]
    InvalidFormat { input: String },

    #[error("invalid seconds value '{input}': expected a non-negative integer")]
    InvalidType { input: String },
}

/// A non-negative number of whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimeSpan(u64);

impl TimeSpan {
    pub const fn from_secs(seconds: u64) -> Self {
        Self(seconds)
    }

    pub const fn as_secs(self) -> u64 {
        self.0
    }

    pub const fn as_duration(self) -> Duration {
        Duration::from_secs(self.0)
    }

    /// Splits the span into hours, minutes and seconds, with minutes and
    /// seconds below 60. Hours are unbounded.
    pub const fn components(self) -> (u64, u64, u64) {
        let hours = self.0 / SECONDS_PER_HOUR;
        let rest = self.0 % SECONDS_PER_HOUR;
        (hours, rest / SECONDS_PER_MINUTE, rest % SECONDS_PER_MINUTE)
    }

    /// Parses a raw seconds count, as handed over by a launcher's run arguments.
    pub fn from_seconds_text(text: &str) -> Result<Self, TimeSpanError> {
        if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TimeSpanError::InvalidType {
                input: text.to_owned(),
            });
        }

        text.parse().map(Self::from_secs).map_err(|_| TimeSpanError::InvalidType {
            input: text.to_owned(),
        })
    }

    /// Canonical `XhYmZs` form, zero components left out.
    pub fn to_shorthand(self) -> String {
        let (hours, minutes, seconds) = self.components();

        if self.0 == 0 {
            return "0s".to_owned();
        }

        let mut out = String::new();
        for (value, unit) in [(hours, 'h'), (minutes, 'm'), (seconds, 's')] {
            if value > 0 {
                out.push_str(&value.to_string());
                out.push(unit);
            }
        }
        out
    }
}

impl FromStr for TimeSpan {
    type Err = TimeSpanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TimeSpanError::InvalidFormat {
            input: s.to_owned(),
        };

        let captures = SHORTHAND.captures(s).ok_or_else(invalid)?;

        let mut total: u64 = 0;
        let mut matched_any = false;

        for (group, multiplier) in [
            ("hours", SECONDS_PER_HOUR),
            ("minutes", SECONDS_PER_MINUTE),
            ("seconds", 1),
        ] {
            let Some(digits) = captures.name(group) else {
                continue;
            };
            matched_any = true;

            let value: u64 = digits.as_str().parse().map_err(|_| invalid())?;
            total = value
                .checked_mul(multiplier)
                .and_then(|part| total.checked_add(part))
                .ok_or_else(invalid)?;
        }

        // The pattern also matches the empty string.
        if !matched_any {
            return Err(invalid());
        }

        Ok(Self(total))
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return f.write_str("0 seconds");
        }

        let (hours, minutes, seconds) = self.components();
        let parts: Vec<String> = [(hours, "hour"), (minutes, "minute"), (seconds, "second")]
            .into_iter()
            .filter(|&(value, _)| value > 0)
            .map(|(value, unit)| {
                if value == 1 {
                    format!("{value} {unit}")
                } else {
                    format!("{value} {unit}s")
                }
            })
            .collect();

        match parts.split_last() {
            Some((last, rest)) if !rest.is_empty() => {
                write!(f, "{} and {last}", rest.join(", "))
            }
            Some((last, _)) => f.write_str(last),
            None => Ok(()),
        }
    }
}
