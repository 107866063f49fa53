use polars::df;
use polars::prelude::*;
use voltcast_core::error::PipelineError;
use voltcast_core::median_imputer::impute_numeric_medians;
use voltcast_core::normalizer::normalize_numeric_columns;
use voltcast_core::pipelines::{run_preprocessing, PreprocessOptions};
use voltcast_core::schema;

/// Raw table the way the loader produces it: every column textual, missing
/// sentinels already turned into nulls.
fn raw_frame() -> DataFrame {
    df![
        "DateTime" => [
            Some("2017-01-01 00:00:00"),
            Some("not a date"),
            Some("2017-01-01 00:00:00"),
            Some("2017-01-01 00:20:00"),
        ],
        "Temperature" => [Some("12,5"), Some("11,0"), Some("10,0"), Some("9,5")],
        "Humidity" => [Some("50"), None, Some("49"), None],
        "WindSpeed" => [Some("1"), Some("2"), None, Some("3")],
        "GeneralDiffuseFlows" => [Some("100"), Some("101"), None, Some("102")],
        "DiffuseFlows" => [Some("60"), Some("61"), Some("62"), Some("63")],
        "PowerConsumption_Zone1" => [Some("20000"), Some("20100"), Some("20200"), Some("20300")],
        "PowerConsumption_Zone2" => [Some("15000"), Some("15100"), Some("15200"), Some("15300")],
        "PowerConsumption_Zone3" => [Some("10000"), Some("10100"), Some("10200"), Some("10300")],
        "mixed_type_col" => [Some("x"), Some("7"), None, Some("y")],
    ]
    .expect("raw frame")
}

#[test]
fn full_pipeline_dedupes_imputes_and_augments() {
    let output = run_preprocessing(&raw_frame(), &PreprocessOptions::default()).expect("pipeline");
    let df = output.dataframe;

    // Rows 0..2 all resolve to the same timestamp (row 1 is imputed onto the
    // midpoint of its identical neighbors) and collapse to the most complete
    // row; row 3 survives on its own timestamp.
    assert_eq!(df.height(), 2);
    assert_eq!(df.width(), 15);

    let names: Vec<&str> = df.get_column_names().iter().map(|n| n.as_str()).collect();
    assert_eq!(names, schema::processed_columns());

    // No missing cells anywhere at output.
    for column in df.get_columns() {
        assert_eq!(column.null_count(), 0, "column {}", column.name());
    }

    let temperature = df.column("Temperature").expect("column").f64().expect("f64");
    assert_eq!(temperature.get(0), Some(12.5));
    assert_eq!(temperature.get(1), Some(9.5));

    // Row 3's missing humidity was filled with the column median.
    let humidity = df.column("Humidity").expect("column").f64().expect("f64");
    assert_eq!(humidity.get(1), Some(50.0));

    // 2017-01-01 is a Sunday.
    let day_week = df.column("DayWeek").expect("column").i32().expect("i32");
    assert_eq!(day_week.get(0), Some(7));
    let day_year = df.column("DayYear").expect("column").i32().expect("i32");
    assert_eq!(day_year.get(0), Some(1));
}

#[test]
fn stage_summaries_track_every_stage() {
    let output = run_preprocessing(&raw_frame(), &PreprocessOptions::default()).expect("pipeline");

    let stages: Vec<&str> = output.stages.iter().map(|s| s.stage).collect();
    assert_eq!(
        stages,
        vec![
            "numeric_normalizer",
            "column_pruner",
            "timestamp_reconciler",
            "median_imputer",
            "outlier_smoother",
            "calendar_features",
            "finalizer",
        ]
    );

    assert_eq!(output.stages[0].rows, 4);
    assert_eq!(output.stages[1].columns, 9);
    let last = output.stages.last().expect("finalizer summary");
    assert_eq!(last.rows, 2);
    assert_eq!(last.columns, 15);
}

#[test]
fn keeping_the_timestamp_column_is_an_option() {
    let options = PreprocessOptions {
        drop_timestamp: false,
        ..PreprocessOptions::default()
    };
    let output = run_preprocessing(&raw_frame(), &options).expect("pipeline");

    assert_eq!(output.dataframe.width(), 16);
    assert!(output.dataframe.column("DateTime").is_ok());
}

#[test]
fn numeric_normalization_is_idempotent() {
    let numeric = schema::numeric_columns();
    let once = normalize_numeric_columns(&raw_frame(), &numeric).expect("first pass");
    let twice = normalize_numeric_columns(&once, &numeric).expect("second pass");

    assert!(once.equals_missing(&twice));
}

#[test]
fn median_imputation_fills_with_the_column_median() {
    let df = df![
        "Temperature" => [Some(1.0), None, Some(3.0)],
    ]
    .expect("df");

    let out = impute_numeric_medians(&df).expect("impute");
    let temperature = out.column("Temperature").expect("column").f64().expect("f64");
    assert_eq!(temperature.get(1), Some(2.0));
}

#[test]
fn missing_required_column_fails_fast() {
    let df = raw_frame().drop("DateTime").expect("drop");
    let err = run_preprocessing(&df, &PreprocessOptions::default()).expect_err("must fail");

    match err {
        PipelineError::MissingColumn { column } => assert_eq!(column, "DateTime"),
        other => panic!("unexpected error: {other}"),
    }
}
