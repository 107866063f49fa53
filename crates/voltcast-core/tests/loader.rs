use voltcast_core::error::PipelineError;
use voltcast_core::loader;
use voltcast_core::schema;

const RAW_HEADER: &str =
    "DateTime,Temperature,Humidity,WindSpeed,GeneralDiffuseFlows,DiffuseFlows,\
     PowerConsumption_Zone1,PowerConsumption_Zone2,PowerConsumption_Zone3,mixed_type_col";

#[test]
fn sentinels_become_missing_on_read() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("raw.csv");
    let body = format!(
        "{RAW_HEADER}\n\
         2017-01-01 00:00:00,\"12,5\",50,1,100,60,20000,15000,10000,x\n\
         nan,NAN,NaT,,2,61,20100,15100,10100,7\n"
    );
    std::fs::write(&path, body).expect("write csv");

    let df = loader::read_raw_dataset(&path).expect("read");
    assert_eq!(df.height(), 2);
    assert_eq!(df.width(), 10);

    let names: Vec<&str> = df.get_column_names().iter().map(|n| n.as_str()).collect();
    let expected: Vec<&str> = schema::source_columns().iter().map(|s| s.name).collect();
    assert_eq!(names, expected);

    // Row 2 hits every sentinel: "nan", "NAN", "NaT" and the empty string.
    for column in ["DateTime", "Temperature", "Humidity", "WindSpeed"] {
        assert_eq!(
            df.column(column).expect("column").null_count(),
            1,
            "column {column}"
        );
    }

    // The comma-decimal cell is preserved as raw text for the normalizer.
    let temperature = df.column("Temperature").expect("column").str().expect("str");
    assert_eq!(temperature.get(0), Some("12,5"));
}

#[test]
fn junk_column_is_optional() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("raw.csv");
    let body = "a,b,c,d,e,f,g,h,i\n2017-01-01 00:00:00,1,2,3,4,5,6,7,8\n";
    std::fs::write(&path, body).expect("write csv");

    let df = loader::read_raw_dataset(&path).expect("read");
    assert_eq!(df.width(), 9);
    assert!(df.column(schema::JUNK_COLUMN).is_err());
}

#[test]
fn wrong_column_count_fails_fast() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("raw.csv");
    std::fs::write(&path, "a,b,c\n1,2,3\n").expect("write csv");

    let err = loader::read_raw_dataset(&path).expect_err("must fail");
    match err {
        PipelineError::ColumnCount { found, .. } => assert_eq!(found, 3),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_source_file_is_a_configuration_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("does-not-exist.csv");

    let err = loader::read_raw_dataset(&path).expect_err("must fail");
    assert!(matches!(err, PipelineError::MissingResource(_)));
}

#[test]
fn missing_destination_directory_is_a_configuration_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("absent").join("out.csv");

    let mut df = polars::df!["Temperature" => [1.0]].expect("df");
    let err = loader::write_processed_dataset(&mut df, &path).expect_err("must fail");
    assert!(matches!(err, PipelineError::MissingResource(_)));
}

#[test]
fn processed_dataset_reads_under_canonical_names() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("processed.csv");

    let header = schema::processed_columns().join(",");
    let row: Vec<String> = (1..=15).map(|v| v.to_string()).collect();
    let body = format!("{header}\n{}\n", row.join(","));
    std::fs::write(&path, body).expect("write csv");

    let df = loader::read_processed_dataset(&path).expect("read");
    assert_eq!(df.height(), 1);
    assert_eq!(df.width(), 15);

    let temperature = df.column("Temperature").expect("column").f64().expect("f64");
    assert_eq!(temperature.get(0), Some(1.0));
}
