use chrono::NaiveDateTime;
use polars::prelude::*;
use voltcast_core::calendar_features::{
    assemble_prediction_row, derive_calendar_features, WeatherObservation,
};
use voltcast_core::schema::FEATURE_ORDER;

fn parse_naive(ts: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S").expect("parse timestamp")
}

#[test]
fn calendar_columns_match_the_reference_timestamp() {
    let times = vec![Some(parse_naive("2023-03-15 14:45:00").and_utc().timestamp_micros())];
    let df = DataFrame::new(vec![Series::new("DateTime".into(), times)
        .cast(&DataType::Datetime(TimeUnit::Microseconds, None))
        .expect("cast")
        .into()])
    .expect("df");

    let out = derive_calendar_features(&df, "DateTime").expect("derive");

    let expectations = [
        ("Day", 15),
        ("Month", 3),
        ("Hour", 14),
        ("Minute", 45),
        ("DayWeek", 3),
        ("QuarterYear", 1),
        ("DayYear", 74),
    ];
    for (name, expected) in expectations {
        let column = out.column(name).expect("column").i32().expect("i32");
        assert_eq!(column.get(0), Some(expected), "column {name}");
    }
}

#[test]
fn quarter_bins_cover_the_year() {
    let samples = [
        ("2023-01-15 00:00:00", 1),
        ("2023-04-01 00:00:00", 2),
        ("2023-09-30 00:00:00", 3),
        ("2023-12-31 00:00:00", 4),
    ];

    for (ts, expected) in samples {
        let features =
            voltcast_core::calendar_features::calendar_features_for(parse_naive(ts));
        assert_eq!(features.quarter_year, expected, "timestamp {ts}");
    }
}

#[test]
fn prediction_row_uses_the_exact_training_column_order() {
    let observation = WeatherObservation {
        temperature: 25.5,
        humidity: 60.2,
        wind_speed: 5.0,
        general_diffuse_flows: 150.0,
        diffuse_flows: 80.0,
    };
    let row = assemble_prediction_row(&observation, parse_naive("2023-03-15 14:45:00"))
        .expect("assemble");

    let names: Vec<&str> = row.get_column_names().iter().map(|n| n.as_str()).collect();
    assert_eq!(names, FEATURE_ORDER.to_vec());

    assert_eq!(row.height(), 1);
    let minute = row.column("Minute").expect("column").f64().expect("f64");
    assert_eq!(minute.get(0), Some(45.0));
    let temperature = row.column("Temperature").expect("column").f64().expect("f64");
    assert_eq!(temperature.get(0), Some(25.5));
}
