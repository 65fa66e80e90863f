//! Integration tests for survey definitions and the command pipelines.

use std::fs;
use std::path::PathBuf;

use survey_cli::config::SurveyConfig;
use survey_cli::pipeline::{neutral_table, parse_key, read_responses, run_encode, run_score, write_csv};
use survey_common::{column_f64, column_strings};
use survey_model::{MatchMode, MatchOptions, RawValue};
use tempfile::TempDir;

const SURVEY: &str = r#"
key_column = "respondent"

[[encoders]]
name = "agreement"
default = 3
neutral = 3
codes = [
    { value = "Disagree", code = 1 },
    { value = "Neutral", code = 3 },
    { value = "Agree", code = 5 },
]

[[encoders]]
name = "agreement-reversed"
template = "agreement"
inverse = true

[[encoders]]
name = "yes-no"
codes = [{ value = "Yes", code = 1 }, { value = "No", code = 0 }]

[[scorings]]
name = "wellbeing"
bindings = [
    { encoder = "agreement", columns = ["q1", "q2"] },
    { encoder = "agreement-reversed", columns = ["q3"] },
]

[[scorings.labels]]
name = "band"
intervals = [
    { category = "Low", low = 0, high = 7 },
    { category = "High", low = 8, high = 15 },
]
"#;

const RESPONSES: &str = "\
respondent,q1,q2,q3,smoker
r1,Agree,Agree,Disagree,Yes
r2,Disagree,Neutral,Agree,No
r3,Neutral,,Neutral,No
";

fn write_fixture(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_build_resolves_templates_and_bindings() {
    let survey = SurveyConfig::from_toml_str(SURVEY).unwrap().build().unwrap();

    assert_eq!(survey.key_column.as_deref(), Some("respondent"));
    assert_eq!(survey.encoders.len(), 3);
    let reversed = &survey.encoders[1];
    assert_eq!(reversed.code(&RawValue::from("Agree")), Some(1.0));
    assert_eq!(reversed.neutral(), Some(3.0));
    assert_eq!(survey.scorings[0].columns(), ["q1", "q2", "q3"]);
}

#[test]
fn test_unknown_encoder_reference() {
    let config = SurveyConfig::from_toml_str(
        r#"
        [[scorings]]
        name = "s"
        bindings = [{ encoder = "missing", columns = ["q1"] }]
        "#,
    )
    .unwrap();
    let err = config.build().unwrap_err();
    assert!(err.to_string().contains("unknown encoder 'missing'"));
}

#[test]
fn test_duplicate_encoder_name() {
    let config = SurveyConfig::from_toml_str(
        r#"
        [[encoders]]
        name = "a"
        codes = [{ value = "x", code = 1 }]

        [[encoders]]
        name = "a"
        codes = [{ value = "y", code = 1 }]
        "#,
    )
    .unwrap();
    assert!(config.build().is_err());
}

#[test]
fn test_score_pipeline() {
    let dir = TempDir::new().unwrap();
    let data_path = write_fixture(&dir, "responses.csv", RESPONSES);
    let survey = SurveyConfig::from_toml_str(SURVEY).unwrap().build().unwrap();
    let data = read_responses(&data_path).unwrap();

    let result = run_score(&data, &survey, &[]).unwrap();

    assert_eq!(result.key_column, "respondent");
    let names: Vec<String> = result
        .table
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();
    assert_eq!(names, vec!["respondent", "wellbeing score", "wellbeing - Label band"]);
    assert_eq!(
        column_f64(result.table.column("wellbeing score").unwrap()),
        vec![Some(15.0), Some(5.0), Some(9.0)]
    );
    assert_eq!(
        column_strings(result.table.column("wellbeing - Label band").unwrap()),
        vec![
            Some("High".to_string()),
            Some("Low".to_string()),
            Some("High".to_string())
        ]
    );
}

#[test]
fn test_score_pipeline_drops_rows() {
    let dir = TempDir::new().unwrap();
    let data_path = write_fixture(&dir, "responses.csv", RESPONSES);
    let survey = SurveyConfig::from_toml_str(SURVEY).unwrap().build().unwrap();
    let data = read_responses(&data_path).unwrap();

    let result = run_score(&data, &survey, &[parse_key("r2")]).unwrap();

    assert_eq!(result.dropped, 1);
    assert_eq!(
        column_strings(result.table.column("respondent").unwrap()),
        vec![Some("r1".to_string()), Some("r3".to_string())]
    );
}

#[test]
fn test_score_output_written() {
    let dir = TempDir::new().unwrap();
    let data_path = write_fixture(&dir, "responses.csv", RESPONSES);
    let out_path = dir.path().join("scores.csv");
    let survey = SurveyConfig::from_toml_str(SURVEY).unwrap().build().unwrap();
    let data = read_responses(&data_path).unwrap();
    let mut result = run_score(&data, &survey, &[]).unwrap();

    write_csv(&mut result.table, &out_path).unwrap();

    let written = read_responses(&out_path).unwrap();
    assert_eq!(written.height(), 3);
    assert_eq!(
        column_f64(written.column("wellbeing score").unwrap()),
        vec![Some(15.0), Some(5.0), Some(9.0)]
    );
}

#[test]
fn test_encode_pipeline_rules() {
    let dir = TempDir::new().unwrap();
    let data_path = write_fixture(&dir, "responses.csv", RESPONSES);
    let survey = SurveyConfig::from_toml_str(SURVEY).unwrap().build().unwrap();
    let data = read_responses(&data_path).unwrap();

    let options = MatchOptions::new().with_ignore(["respondent"]);
    let result = run_encode(&data, &survey, &options).unwrap();

    insta::assert_json_snapshot!(result.rules, @r#"
    [
      {
        "column": "respondent",
        "encoder": null
      },
      {
        "column": "q1",
        "encoder": "agreement"
      },
      {
        "column": "q2",
        "encoder": "agreement"
      },
      {
        "column": "q3",
        "encoder": "agreement"
      },
      {
        "column": "smoker",
        "encoder": "yes-no"
      }
    ]
    "#);

    let counts = result.neutral_counts.unwrap();
    assert_eq!(column_f64(&counts.clone().into()), vec![Some(0.0), Some(1.0), Some(3.0)]);
    assert_eq!(neutral_table(&counts).unwrap().width(), 2);
}

#[test]
fn test_encode_pipeline_strict_mode() {
    let dir = TempDir::new().unwrap();
    let data_path = write_fixture(&dir, "responses.csv", RESPONSES);
    let survey = SurveyConfig::from_toml_str(SURVEY).unwrap().build().unwrap();
    let data = read_responses(&data_path).unwrap();

    let options = MatchOptions::new().with_mode(MatchMode::Strict);
    let result = run_encode(&data, &survey, &options).unwrap();

    let matched: Vec<(&str, Option<&str>)> = result
        .rules
        .iter()
        .map(|row| (row.column.as_str(), row.encoder.as_deref()))
        .collect();
    assert_eq!(
        matched,
        vec![
            ("respondent", None),
            ("q1", Some("agreement")),
            ("q2", None),
            ("q3", Some("agreement")),
            ("smoker", Some("yes-no")),
        ]
    );
}

#[test]
fn test_load_reports_path_on_error() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(&dir, "broken.toml", "[[encoders]]\ncodes = 3\n");
    let err = SurveyConfig::load(&path).unwrap_err();
    assert!(format!("{err:#}").contains("broken.toml"));
}
