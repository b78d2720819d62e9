//! Turning raw payload-reading errors into recognised [`Failure`] shapes
//!
//! This is the single place that inspects engine-specific errors; the
//! classifier only ever sees the resulting [`FailureKind`](crate::FailureKind).

use serde_json::error::Category;

use crate::extract::location::FieldPath;
use crate::extract::serde_msg::{self, DataMessage};
use crate::failure::{Failure, InvalidFormat, TargetType};

/// Shape for a serde data error found at `path`.
///
/// Type mismatches become [`InvalidFormat`]; anything else with a usable
/// path is a field mapping failure. Without a path nothing can be located,
/// so the error stays a plain parse failure.
#[track_caller]
#[must_use]
pub fn data_error(path: FieldPath, message: &str) -> Failure {
    let message = serde_msg::strip_position(message);
    if path.is_empty() {
        return Failure::parse().with_message(message);
    }
    match serde_msg::parse_data_message(message) {
        DataMessage::UnknownVariant { value, accepted } => Failure::invalid_format(InvalidFormat {
            path,
            value,
            target: TargetType::Enumeration {
                name: None,
                accepted,
            },
        })
        .with_message(message),
        DataMessage::InvalidType { value, expected }
        | DataMessage::InvalidValue { value, expected } => {
            Failure::invalid_format(InvalidFormat {
                path,
                value,
                target: TargetType::Scalar { name: expected },
            })
            .with_message(message)
        }
        DataMessage::Other(text) => Failure::field_mapping(path).with_message(text),
    }
}

/// Shape for a rejection text of the form `[path: ]serde message`.
#[track_caller]
#[must_use]
pub fn data_error_text(text: &str) -> Failure {
    let (path, message) = serde_msg::split_path(text);
    data_error(path, message)
}

/// Shape for a `serde_json` error raised at the payload root.
#[track_caller]
#[must_use]
pub fn json_error(err: &serde_json::Error) -> Failure {
    json_error_at(FieldPath::default(), err)
}

/// Shape for a `serde_json` error raised while reading the value at `path`.
#[track_caller]
#[must_use]
pub fn json_error_at(path: FieldPath, err: &serde_json::Error) -> Failure {
    let failure = match err.classify() {
        Category::Data => data_error(path, &err.to_string()),
        Category::Syntax | Category::Eof | Category::Io => {
            Failure::parse().with_message(err.to_string())
        }
    };
    failure.with_type_name("serde_json::Error")
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::failure::FailureKind;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    enum Currency {
        Usd,
        Eur,
        Gbp,
    }

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Payment {
        currency: Currency,
        amount: u32,
    }

    #[test]
    fn unknown_variant_becomes_enumeration_mismatch() {
        let err = serde_json::from_str::<Currency>(r#""INVALID_VALUE""#).unwrap_err();
        let failure = json_error_at(FieldPath::default().field("currency"), &err);
        let FailureKind::InvalidFormat(invalid) = failure.kind() else {
            panic!("expected invalid format, got {:?}", failure.kind());
        };
        assert_eq!(invalid.path.render(), "currency");
        assert_eq!(invalid.value, "INVALID_VALUE");
        assert_eq!(
            invalid.target,
            TargetType::Enumeration {
                name: None,
                accepted: vec!["Usd".to_owned(), "Eur".to_owned(), "Gbp".to_owned()],
            }
        );
    }

    #[test]
    fn wrong_scalar_becomes_scalar_mismatch() {
        let err = serde_json::from_str::<u32>(r#""not_a_number""#).unwrap_err();
        let failure = json_error_at(FieldPath::default().field("amount"), &err);
        let FailureKind::InvalidFormat(invalid) = failure.kind() else {
            panic!("expected invalid format");
        };
        assert_eq!(invalid.path.render(), "amount");
        assert_eq!(invalid.value, "not_a_number");
        assert_eq!(invalid.target, TargetType::Scalar { name: "u32".to_owned() });
        assert_eq!(failure.type_name(), Some("serde_json::Error"));
    }

    #[test]
    fn mismatch_without_path_is_parse_failure() {
        let err = serde_json::from_str::<Payment>(r#"{"currency":"X"}"#).unwrap_err();
        let failure = json_error(&err);
        assert!(matches!(failure.kind(), FailureKind::Parse));
        assert_eq!(
            failure.message(),
            Some("unknown variant `X`, expected one of `Usd`, `Eur`, `Gbp`")
        );
        assert_eq!(failure.type_name(), Some("serde_json::Error"));
    }

    #[test]
    fn scalar_mismatch_without_path_is_parse_failure() {
        let err = serde_json::from_str::<u32>(r#""not_a_number""#).unwrap_err();
        let failure = data_error(FieldPath::default(), &err.to_string());
        assert!(matches!(failure.kind(), FailureKind::Parse));
        assert!(failure.message().unwrap().starts_with("invalid type: string"));
    }

    #[test]
    fn syntax_errors_are_parse_failures() {
        let err = serde_json::from_str::<Payment>("{\"currency\":").unwrap_err();
        let failure = json_error(&err);
        assert!(matches!(failure.kind(), FailureKind::Parse));
        assert!(failure.message().unwrap().contains("EOF"));
    }

    #[test]
    fn missing_field_with_path_is_field_mapping() {
        let failure = data_error_text("items[0]: missing field `name`");
        let FailureKind::FieldMapping(path) = failure.kind() else {
            panic!("expected field mapping");
        };
        assert_eq!(path.render(), "items.[0]");
        assert_eq!(failure.message(), Some("missing field `name`"));
    }

    #[test]
    fn missing_field_at_root_is_parse_failure() {
        let failure = data_error_text("missing field `amount` at line 1 column 21");
        assert!(matches!(failure.kind(), FailureKind::Parse));
        assert_eq!(failure.message(), Some("missing field `amount`"));
    }
}
