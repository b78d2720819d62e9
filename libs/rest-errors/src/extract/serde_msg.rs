//! Reading structure back out of serde deserialisation messages
//!
//! serde reports type mismatches as text only. The formats below are stable
//! across serde 1.x and are what `serde_json` and the axum JSON extractor
//! surface:
//!
//! - `unknown variant `X`, expected one of `A`, `B``
//! - `invalid type: string "abc", expected u32`
//! - `invalid value: integer `-1`, expected u8`
//!
//! optionally followed by ` at line N column M` and optionally preceded by a
//! `path: ` prefix.

use super::location::FieldPath;

/// Messages serde produces without any path prefix.
const BARE_PREFIXES: &[&str] = &[
    "invalid type:",
    "invalid value:",
    "invalid length",
    "unknown variant",
    "unknown field",
    "missing field",
    "duplicate field",
    "expected ",
    "trailing ",
    "EOF ",
    "key must be",
    "recursion limit",
];

/// What a serde data-error message says, as far as it can be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataMessage {
    UnknownVariant {
        value: String,
        accepted: Vec<String>,
    },
    InvalidType {
        value: String,
        expected: String,
    },
    InvalidValue {
        value: String,
        expected: String,
    },
    Other(String),
}

/// Drop a trailing ` at line N column M`.
#[must_use]
pub fn strip_position(msg: &str) -> &str {
    let Some(idx) = msg.rfind(" at line ") else {
        return msg;
    };
    let tail = &msg[idx + " at line ".len()..];
    let mut words = tail.split(' ');
    let well_formed = matches!(
        (words.next(), words.next(), words.next(), words.next()),
        (Some(line), Some("column"), Some(col), None)
            if line.chars().all(|c| c.is_ascii_digit()) && col.chars().all(|c| c.is_ascii_digit())
    );
    if well_formed { &msg[..idx] } else { msg }
}

/// Split a leading `path: ` off a rejection message.
///
/// Returns the root path when the text starts with a bare serde message.
#[must_use]
pub fn split_path(text: &str) -> (FieldPath, &str) {
    if BARE_PREFIXES.iter().any(|p| text.starts_with(p)) {
        return (FieldPath::default(), text);
    }
    match text.split_once(": ") {
        Some((path, rest)) if !path.is_empty() && !path.contains(char::is_whitespace) => {
            (FieldPath::parse(path), rest)
        }
        _ => (FieldPath::default(), text),
    }
}

#[must_use]
pub fn parse_data_message(msg: &str) -> DataMessage {
    let msg = strip_position(msg);

    if let Some(rest) = msg.strip_prefix("unknown variant `") {
        if let Some((value, expected)) = rest.split_once("`, ") {
            return DataMessage::UnknownVariant {
                value: value.to_owned(),
                accepted: backticked(expected),
            };
        }
    }
    if let Some(rest) = msg.strip_prefix("invalid type: ") {
        if let Some((unexpected, expected)) = rest.split_once(", expected ") {
            return DataMessage::InvalidType {
                value: unexpected_value(unexpected),
                expected: expected.to_owned(),
            };
        }
    }
    if let Some(rest) = msg.strip_prefix("invalid value: ") {
        if let Some((unexpected, expected)) = rest.split_once(", expected ") {
            return DataMessage::InvalidValue {
                value: unexpected_value(unexpected),
                expected: expected.to_owned(),
            };
        }
    }
    DataMessage::Other(msg.to_owned())
}

/// Literal out of an `Unexpected value 'X'` message, as raised by
/// hand-written enum parsers.
#[must_use]
pub fn unexpected_value_literal(msg: &str) -> Option<&str> {
    let rest = msg.strip_prefix("Unexpected value '")?;
    rest.split_once('\'').map(|(value, _)| value)
}

/// Every `quoted` token, in order.
fn backticked(text: &str) -> Vec<String> {
    text.split('`')
        .skip(1)
        .step_by(2)
        .map(ToOwned::to_owned)
        .collect()
}

/// The offending literal out of serde's `Unexpected` rendering:
/// `string "abc"` -> `abc`, `integer `5`` -> `5`, `map` -> `map`.
fn unexpected_value(text: &str) -> String {
    if let Some(quoted) = text.strip_prefix("string \"") {
        return quoted.strip_suffix('"').unwrap_or(quoted).to_owned();
    }
    match backticked(text).into_iter().next() {
        Some(inner) => inner,
        None => text.to_owned(),
    }
}
