use crate::timespan::{TimeSpan, TimeSpanError};

pub const DEFAULT_MESSAGE: &str = "Time's up!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerRequest {
    pub span: TimeSpan,
    pub message: Option<String>,
}

impl TimerRequest {
    pub fn new(span: TimeSpan, message: &[String]) -> Self {
        let message = message.join(" ");
        let message = message.trim();

        Self {
            span,
            message: (!message.is_empty()).then(|| message.to_owned()),
        }
    }

    /// Builds a request from launcher-style arguments: a timespan followed
    /// by an optional free-text message.
    pub fn from_arguments(args: &[String]) -> Result<Self, TimeSpanError> {
        let (timespan, message) = args
            .split_first()
            .ok_or_else(|| TimeSpanError::InvalidFormat {
                input: String::new(),
            })?;

        Ok(Self::new(timespan.parse()?, message))
    }

    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or(DEFAULT_MESSAGE)
    }

    pub fn title(&self) -> String {
        format!("Set an alarm for {}", self.span)
    }
}
