//! Message-carrying results for the reading and rendering stages.
//!
//! Readers never throw for recoverable conditions. Each reader function
//! returns a [`ReadResult`] holding its value together with the warnings it
//! accumulated, and callers combine those results so that no message is ever
//! dropped on the way up.

use serde::{Deserialize, Serialize};

/// Severity of a conversion message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A non-fatal condition encountered during conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message severity
    pub severity: Severity,
    /// Human-readable description
    pub text: String,
}

impl Message {
    /// Create a warning message.
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            text: text.into(),
        }
    }

    /// Create an error message.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            text: text.into(),
        }
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.severity {
            Severity::Warning => write!(f, "warning: {}", self.text),
            Severity::Error => write!(f, "error: {}", self.text),
        }
    }
}

/// A value paired with the messages produced while computing it.
///
/// An empty value (e.g. `Vec::new()`) is legal and propagates silently; the
/// messages still travel with it.
#[derive(Debug, Clone)]
pub struct ReadResult<T> {
    /// The computed value
    pub value: T,
    /// Messages accumulated while computing the value
    pub messages: Vec<Message>,
}

impl<T> ReadResult<T> {
    /// Create a result with no messages.
    pub fn new(value: T) -> Self {
        Self {
            value,
            messages: Vec::new(),
        }
    }

    /// Create a result carrying the given messages.
    pub fn with_messages(value: T, messages: Vec<Message>) -> Self {
        Self { value, messages }
    }

    /// Create a result carrying a single warning.
    pub fn warning(value: T, text: impl Into<String>) -> Self {
        Self {
            value,
            messages: vec![Message::warning(text)],
        }
    }

    /// Transform the value, keeping the messages.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ReadResult<U> {
        ReadResult {
            value: f(self.value),
            messages: self.messages,
        }
    }

    /// Chain a computation that itself produces messages.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> ReadResult<U>) -> ReadResult<U> {
        let mut next = f(self.value);
        let mut messages = self.messages;
        messages.append(&mut next.messages);
        ReadResult {
            value: next.value,
            messages,
        }
    }

    /// Append a message after the fact.
    pub fn add_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }
}

impl<T> ReadResult<Vec<T>> {
    /// An empty value with no messages.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Combine a sequence of results: values are flattened in order and
    /// messages are concatenated in order.
    pub fn combine(results: impl IntoIterator<Item = ReadResult<Vec<T>>>) -> Self {
        let mut value = Vec::new();
        let mut messages = Vec::new();
        for mut result in results {
            value.append(&mut result.value);
            messages.append(&mut result.messages);
        }
        Self { value, messages }
    }
}

impl<T: Default> Default for ReadResult<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_display() {
        let msg = Message::warning("something odd");
        assert_eq!(msg.to_string(), "warning: something odd");
        let msg = Message::error("something bad");
        assert_eq!(msg.to_string(), "error: something bad");
    }

    #[test]
    fn test_map_keeps_messages() {
        let result = ReadResult::warning(2, "two").map(|n| n * 3);
        assert_eq!(result.value, 6);
        assert_eq!(result.messages.len(), 1);
    }

    #[test]
    fn test_and_then_concatenates_messages() {
        let result = ReadResult::warning(1, "first").and_then(|n| ReadResult::warning(n + 1, "second"));
        assert_eq!(result.value, 2);
        let texts: Vec<_> = result.messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn test_combine_flattens_in_order() {
        let combined = ReadResult::combine(vec![
            ReadResult::new(vec![1, 2]),
            ReadResult::warning(vec![], "empty but noisy"),
            ReadResult::new(vec![3]),
        ]);
        assert_eq!(combined.value, vec![1, 2, 3]);
        assert_eq!(combined.messages.len(), 1);
    }
}
