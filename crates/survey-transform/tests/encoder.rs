//! Tests for single-encoder transforms and neutral counts.

use polars::prelude::{Column, DataFrame, DataType, IntoColumn, NamedFrom, Series};
use survey_common::column_f64;
use survey_model::{CodeType, MatchMode, NameSequence, RawValue, SurveyError, TransformOptions};
use survey_transform::{Encoder, NEUTRAL_COUNT_COLUMN};

fn agreement() -> Encoder {
    Encoder::builder()
        .name("agreement")
        .encoding([("Disagree", 1.0), ("Neutral", 2.0), ("Agree", 3.0)])
        .neutral(2.0)
        .build(&mut NameSequence::encoders())
        .unwrap()
}

fn text_column(name: &str, values: &[Option<&str>]) -> Column {
    Series::new(name.into(), values.to_vec()).into_column()
}

fn survey_frame() -> DataFrame {
    DataFrame::new(vec![
        text_column("q1", &[Some("Agree"), Some("Neutral"), Some("Disagree")]),
        text_column("q2", &[Some("Neutral"), Some("Neutral"), None]),
        text_column("comment", &[Some("fine"), None, Some("bad")]),
    ])
    .unwrap()
}

#[test]
fn test_build_requires_encoding_or_template() {
    let err = Encoder::builder()
        .name("empty")
        .build(&mut NameSequence::encoders())
        .unwrap_err();
    assert!(matches!(err, SurveyError::MissingEncoding));
}

#[test]
fn test_build_rejects_empty_encoding() {
    let err = Encoder::new("none", Vec::<(&str, f64)>::new()).unwrap_err();
    assert!(matches!(err, SurveyError::EmptyEncoding { .. }));
}

#[test]
fn test_unnamed_encoders_draw_from_sequence() {
    let mut names = NameSequence::encoders();
    let first = Encoder::builder()
        .encoding([("Yes", 1.0)])
        .build(&mut names)
        .unwrap();
    let second = Encoder::builder()
        .encoding([("No", 0.0)])
        .build(&mut names)
        .unwrap();
    assert_eq!(first.name(), "encoder-0");
    assert_eq!(second.name(), "encoder-1");
}

#[test]
fn test_template_supplies_settings_unless_overridden() {
    let template = Encoder::builder()
        .name("base")
        .encoding([("Yes", 1.0), ("No", 0.0)])
        .default_code(2.0)
        .neutral(2.0)
        .dtype(CodeType::Int)
        .build(&mut NameSequence::encoders())
        .unwrap();

    let copy = Encoder::builder()
        .name("copy")
        .template(&template)
        .neutral(1.0)
        .build(&mut NameSequence::encoders())
        .unwrap();

    assert_eq!(copy.encoding(), template.encoding());
    assert_eq!(copy.default_code(), Some(2.0));
    assert_eq!(copy.neutral(), Some(1.0));
    assert_eq!(copy.dtype(), CodeType::Int);
}

#[test]
fn test_explicit_encoding_wins_over_template() {
    let template = Encoder::new("base", [("Yes", 1.0), ("No", 0.0)]).unwrap();
    let encoder = Encoder::builder()
        .template(&template)
        .encoding([("Ja", 1.0)])
        .build(&mut NameSequence::encoders())
        .unwrap();
    assert_eq!(encoder.target(), [&RawValue::from("Ja")].into_iter().collect());
}

#[test]
fn test_inverse_swaps_likert_polarity() {
    let mut encoder = Encoder::new("likert", (1..=5i32).map(|v| (v, f64::from(v)))).unwrap();
    encoder.inverse();
    assert_eq!(encoder.code(&RawValue::Integer(5)), Some(1.0));
    assert_eq!(encoder.code(&RawValue::Integer(4)), Some(2.0));
    assert_eq!(encoder.code(&RawValue::Integer(3)), Some(3.0));
    assert_eq!(encoder.code(&RawValue::Integer(1)), Some(5.0));
}

#[test]
fn test_inverse_from_builder() {
    let encoder = Encoder::builder()
        .encoding([("Agree", 3.0), ("Neutral", 2.0), ("Disagree", 1.0)])
        .inverse(true)
        .build(&mut NameSequence::encoders())
        .unwrap();
    assert_eq!(encoder.code(&RawValue::from("Agree")), Some(1.0));
    assert_eq!(encoder.code(&RawValue::from("Disagree")), Some(3.0));
}

#[test]
fn test_transform_series_replaces_then_fills_default() {
    let encoder = Encoder::builder()
        .encoding([("Agree", 4.0), ("Disagree", 2.0)])
        .default_code(3.0)
        .build(&mut NameSequence::encoders())
        .unwrap();
    let series = Series::new("q1".into(), [Some("Agree"), None, Some("Unknown")]);

    let encoded = encoder.transform_series(&series).unwrap();

    assert_eq!(encoded.name().as_str(), "q1");
    assert_eq!(encoded.dtype(), &DataType::Float64);
    assert_eq!(
        column_f64(&encoded.into_column()),
        vec![Some(4.0), Some(3.0), Some(3.0)]
    );
}

#[test]
fn test_transform_series_unmapped_becomes_missing() {
    let encoder = agreement();
    let series = Series::new("q1".into(), [Some("Agree"), Some("Maybe"), None]);
    let encoded = encoder.transform_series(&series).unwrap();
    assert_eq!(column_f64(&encoded.into_column()), vec![Some(3.0), None, None]);
}

#[test]
fn test_transform_series_casts_to_int() {
    let encoder = Encoder::builder()
        .encoding([("Yes", 1.0), ("No", 0.0)])
        .dtype(CodeType::Int)
        .build(&mut NameSequence::encoders())
        .unwrap();
    let series = Series::new("q".into(), ["Yes", "No"]);
    let encoded = encoder.transform_series(&series).unwrap();
    assert_eq!(encoded.dtype(), &DataType::Int64);
}

#[test]
fn test_int_dtype_rejects_fractional_codes() {
    let build = |codes: [(&str, f64); 2], default: f64, neutral: f64| {
        Encoder::builder()
            .name("halves")
            .encoding(codes)
            .default_code(default)
            .neutral(neutral)
            .dtype(CodeType::Int)
            .build(&mut NameSequence::encoders())
    };

    let err = build([("Agree", 2.5), ("Disagree", 1.0)], 1.5, 1.5).unwrap_err();
    assert!(matches!(
        err,
        SurveyError::NonIntegralCode { ref name, field: "code", value } if name == "halves" && value == 2.5
    ));

    let err = build([("Agree", 2.0), ("Disagree", 1.0)], 1.5, 1.0).unwrap_err();
    assert!(matches!(err, SurveyError::NonIntegralCode { field: "default", .. }));

    let err = build([("Agree", 2.0), ("Disagree", 1.0)], 1.0, 1.5).unwrap_err();
    assert!(matches!(err, SurveyError::NonIntegralCode { field: "neutral", .. }));

    let template = build([("Agree", 2.0), ("Disagree", 1.0)], 1.0, 1.0).unwrap();
    let err = Encoder::builder()
        .template(&template)
        .default_code(0.5)
        .build(&mut NameSequence::encoders())
        .unwrap_err();
    assert!(matches!(err, SurveyError::NonIntegralCode { field: "default", .. }));
}

#[test]
fn test_float_dtype_keeps_fractional_codes() {
    let encoder = Encoder::builder()
        .encoding([("Agree", 2.5), ("Disagree", 1.0)])
        .default_code(1.5)
        .neutral(1.5)
        .build(&mut NameSequence::encoders())
        .unwrap();
    let series = Series::new("q".into(), [Some("Agree"), None]);

    let encoded = encoder.transform_series(&series).unwrap();
    assert_eq!(column_f64(&encoded.into_column()), vec![Some(2.5), Some(1.5)]);
    let flags = encoder.count_neutral_series(&series).unwrap().unwrap();
    assert_eq!(column_f64(&flags.into_column()), vec![Some(0.0), Some(1.0)]);
}

#[test]
fn test_int_dtype_counts_defaulted_neutral() {
    let encoder = Encoder::builder()
        .encoding([("Agree", 3.0), ("Disagree", 1.0)])
        .default_code(2.0)
        .neutral(2.0)
        .dtype(CodeType::Int)
        .build(&mut NameSequence::encoders())
        .unwrap();
    let series = Series::new("q".into(), [Some("Agree"), None]);

    let flags = encoder.count_neutral_series(&series).unwrap().unwrap();
    assert_eq!(column_f64(&flags.into_column()), vec![Some(0.0), Some(1.0)]);
}

#[test]
fn test_numeric_answers_match_integer_keys() {
    let encoder = Encoder::new("likert", [(1i64, 10.0), (2i64, 20.0)]).unwrap();
    let series = Series::new("q".into(), [1.0f64, 2.0]);
    let encoded = encoder.transform_series(&series).unwrap();
    assert_eq!(column_f64(&encoded.into_column()), vec![Some(10.0), Some(20.0)]);
}

#[test]
fn test_transform_frame_auto_selects_matching_columns() {
    let df = survey_frame();
    let encoded = agreement()
        .transform_frame(&df, &TransformOptions::new())
        .unwrap();

    assert_eq!(encoded.rules.get("q1"), Some("agreement"));
    assert_eq!(encoded.rules.get("q2"), Some("agreement"));
    assert_eq!(encoded.rules.get("comment"), None);
    assert_eq!(
        column_f64(encoded.frame.column("q1").unwrap()),
        vec![Some(3.0), Some(2.0), Some(1.0)]
    );
    assert!(
        encoded.frame.column("comment").unwrap().as_materialized_series()
            .equals_missing(df.column("comment").unwrap().as_materialized_series())
    );
}

#[test]
fn test_transform_frame_strict_requires_full_target() {
    let df = survey_frame();
    let options = TransformOptions::new().with_mode(MatchMode::Strict);
    let encoded = agreement().transform_frame(&df, &options).unwrap();

    assert_eq!(encoded.rules.get("q1"), Some("agreement"));
    assert_eq!(encoded.rules.get("q2"), None);
}

#[test]
fn test_transform_frame_honors_ignore_list() {
    let df = survey_frame();
    let options = TransformOptions::new().with_ignore(["q1"]);
    let encoded = agreement().transform_frame(&df, &options).unwrap();

    assert_eq!(encoded.rules.get("q1"), None);
    assert_eq!(encoded.rules.get("q2"), Some("agreement"));
}

#[test]
fn test_transform_frame_explicit_columns() {
    let df = survey_frame();
    let options = TransformOptions::new().with_columns(["q2", "missing"]);
    let encoded = agreement().transform_frame(&df, &options).unwrap();

    assert_eq!(encoded.rules.matched().collect::<Vec<_>>(), vec![("q2", "agreement")]);
    assert!(
        encoded.frame.column("q1").unwrap().as_materialized_series()
            .equals_missing(df.column("q1").unwrap().as_materialized_series())
    );
}

#[test]
fn test_transform_frame_leaves_input_untouched() {
    let df = survey_frame();
    let before = df.clone();
    agreement()
        .transform_frame(&df, &TransformOptions::new())
        .unwrap();
    assert!(df.equals_missing(&before));
}

#[test]
fn test_rules_to_frame() {
    let df = survey_frame();
    let encoded = agreement()
        .transform_frame(&df, &TransformOptions::new())
        .unwrap();
    let rules = encoded.rules.to_frame().unwrap();

    assert_eq!(rules.height(), 3);
    let encoders = rules.column("encoder").unwrap();
    assert_eq!(encoders.null_count(), 1);
}

#[test]
fn test_count_neutral_series() {
    let series = Series::new("q2".into(), [Some("Neutral"), Some("Agree"), None]);
    let counts = agreement().count_neutral_series(&series).unwrap().unwrap();
    assert_eq!(column_f64(&counts.into_column()), vec![Some(1.0), Some(0.0), Some(0.0)]);
}

#[test]
fn test_count_neutral_frame_only_counts_matched_columns() {
    let df = DataFrame::new(vec![
        text_column("q1", &[Some("Neutral"), Some("Agree")]),
        text_column("q2", &[Some("Neutral"), Some("Neutral")]),
        text_column("other", &[Some("Neutral"), Some("Unknown")]),
    ])
    .unwrap();

    let counts = agreement()
        .count_neutral_frame(&df, &TransformOptions::new())
        .unwrap()
        .unwrap();

    assert_eq!(counts.name().as_str(), NEUTRAL_COUNT_COLUMN);
    assert_eq!(column_f64(&counts.into_column()), vec![Some(2.0), Some(1.0)]);
}

#[test]
fn test_count_neutral_without_neutral_is_absent() {
    let encoder = Encoder::new("plain", [("Yes", 1.0)]).unwrap();
    let series = Series::new("q".into(), ["Yes"]);
    assert!(encoder.count_neutral_series(&series).unwrap().is_none());
    let df = DataFrame::new(vec![series.into_column()]).unwrap();
    assert!(
        encoder
            .count_neutral_frame(&df, &TransformOptions::new())
            .unwrap()
            .is_none()
    );
}
