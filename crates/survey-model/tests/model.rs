//! Tests for the survey model types.

use std::str::FromStr;

use polars::prelude::AnyValue;
use survey_model::{CodeType, MatchMode, NameSequence, RawValue, SurveyError, TransformOptions};

#[test]
fn match_mode_parses_known_values() {
    assert_eq!(MatchMode::from_str("any").unwrap(), MatchMode::Any);
    assert_eq!(MatchMode::from_str("strict").unwrap(), MatchMode::Strict);
    assert_eq!(MatchMode::default(), MatchMode::Any);
}

#[test]
fn match_mode_rejects_unknown_values() {
    let err = MatchMode::from_str("loose").unwrap_err();
    assert!(matches!(err, SurveyError::InvalidMode { ref mode } if mode == "loose"));
    assert_eq!(
        err.to_string(),
        "matching mode can only be 'strict' or 'any', got 'loose'"
    );
}

#[test]
fn match_mode_serde_uses_lowercase() {
    let json = serde_json::to_string(&MatchMode::Strict).unwrap();
    assert_eq!(json, "\"strict\"");
    let mode: MatchMode = serde_json::from_str("\"any\"").unwrap();
    assert_eq!(mode, MatchMode::Any);
}

#[test]
fn code_type_parses_aliases() {
    assert_eq!(CodeType::from_str("int").unwrap(), CodeType::Int);
    assert_eq!(CodeType::from_str("Int64").unwrap(), CodeType::Int);
    assert_eq!(CodeType::from_str("float64").unwrap(), CodeType::Float);
    assert!(CodeType::from_str("str").is_err());
}

#[test]
fn name_sequences_are_independent() {
    let mut a = NameSequence::encoders();
    let mut b = NameSequence::encoders();
    assert_eq!(a.next_name(), "encoder-0");
    assert_eq!(a.next_name(), "encoder-1");
    assert_eq!(b.next_name(), "encoder-0");
    assert_eq!(NameSequence::labels().next(), Some("label-0".to_string()));
}

#[test]
fn raw_value_normalizes_numbers() {
    assert_eq!(RawValue::from_any(AnyValue::Int32(3)), Some(RawValue::Integer(3)));
    assert_eq!(RawValue::from_any(AnyValue::Float64(3.0)), Some(RawValue::Integer(3)));
    assert_eq!(
        RawValue::from_any(AnyValue::Float64(2.5)),
        Some(RawValue::Text("2.5".to_string()))
    );
    assert_eq!(RawValue::from_any(AnyValue::Boolean(true)), Some(RawValue::Boolean(true)));
}

#[test]
fn raw_value_deserializes_untagged() {
    let values: Vec<RawValue> = serde_json::from_str(r#"["Agree", 4, true]"#).unwrap();
    assert_eq!(
        values,
        vec![RawValue::from("Agree"), RawValue::Integer(4), RawValue::Boolean(true)]
    );
}

#[test]
fn transform_options_track_ignored_columns() {
    let options = TransformOptions::new()
        .with_columns(["q1", "q2"])
        .with_ignore(["q2"])
        .with_mode(MatchMode::Strict);
    assert_eq!(options.columns.as_deref(), Some(&["q1".to_string(), "q2".to_string()][..]));
    assert!(options.is_ignored("q2"));
    assert!(!options.is_ignored("q1"));
}
