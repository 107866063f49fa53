use polars::df;
use polars::prelude::*;
use voltcast_core::model::{train_and_select, ModelArtifact, ModelKind, TrainingOptions};
use voltcast_core::reproducibility::verify_reproducibility;
use voltcast_core::schema;

/// Processed-style table with a deterministic linear target so both
/// candidates have something learnable.
fn processed_frame(rows: usize) -> DataFrame {
    let temperature: Vec<f64> = (0..rows).map(|i| 10.0 + (i % 7) as f64).collect();
    let humidity: Vec<f64> = (0..rows).map(|i| 40.0 + (i % 5) as f64).collect();
    let wind_speed: Vec<f64> = (0..rows).map(|i| (i % 3) as f64).collect();
    let general_diffuse: Vec<f64> = (0..rows).map(|i| 100.0 + (i % 11) as f64).collect();
    let diffuse: Vec<f64> = (0..rows).map(|i| 50.0 + (i % 13) as f64).collect();

    let month: Vec<f64> = (0..rows).map(|i| (i % 12 + 1) as f64).collect();
    let quarter: Vec<f64> = month.iter().map(|m| ((*m as i64 - 1) / 3 + 1) as f64).collect();

    let zone2: Vec<f64> = (0..rows)
        .map(|i| 100.0 * temperature[i] + 10.0 * humidity[i] + 5.0 * wind_speed[i])
        .collect();
    let zone1: Vec<f64> = zone2.iter().map(|v| v * 1.2).collect();
    let zone3: Vec<f64> = zone2.iter().map(|v| v * 0.8).collect();

    df![
        "Temperature" => temperature,
        "Humidity" => humidity,
        "WindSpeed" => wind_speed,
        "GeneralDiffuseFlows" => general_diffuse,
        "DiffuseFlows" => diffuse,
        "PowerConsumption_Zone1" => zone1,
        "PowerConsumption_Zone2" => zone2,
        "PowerConsumption_Zone3" => zone3,
        "Day" => (0..rows).map(|i| (i % 28 + 1) as f64).collect::<Vec<f64>>(),
        "Month" => month,
        "Hour" => (0..rows).map(|i| (i % 24) as f64).collect::<Vec<f64>>(),
        "Minute" => (0..rows).map(|i| ((i * 10) % 60) as f64).collect::<Vec<f64>>(),
        "DayWeek" => (0..rows).map(|i| (i % 7 + 1) as f64).collect::<Vec<f64>>(),
        "QuarterYear" => quarter,
        "DayYear" => (0..rows).map(|i| (i + 1) as f64).collect::<Vec<f64>>(),
    ]
    .expect("processed frame")
}

fn options() -> TrainingOptions {
    TrainingOptions {
        folds: 3,
        seed: 7,
        ..TrainingOptions::default()
    }
}

#[test]
fn selection_scores_every_candidate_and_evaluates_the_winner() {
    let df = processed_frame(60);
    let (artifact, report) = train_and_select(&df, &options()).expect("train");

    assert_eq!(report.scores.len(), ModelKind::all().len());
    assert!(report.scores[0].rmse_mean <= report.scores[1].rmse_mean);
    assert_eq!(report.best, report.scores[0].model);
    assert_eq!(report.train_rows, 48);
    assert_eq!(report.test_rows, 12);
    assert!(report.test.rmse.is_finite());

    assert_eq!(
        artifact.metadata.feature_names,
        schema::FEATURE_ORDER
            .iter()
            .map(|name| name.to_string())
            .collect::<Vec<_>>()
    );
    assert_eq!(artifact.metadata.seed, 7);
}

#[test]
fn artifact_round_trips_through_disk() {
    let df = processed_frame(60);
    let (artifact, _) = train_and_select(&df, &options()).expect("train");

    let features = df
        .drop("PowerConsumption_Zone1")
        .and_then(|df| df.drop("PowerConsumption_Zone2"))
        .and_then(|df| df.drop("PowerConsumption_Zone3"))
        .expect("features");

    let before = artifact.predict_frame(&features).expect("predict");

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("model.bin");
    artifact.save(&path).expect("save");

    let restored = ModelArtifact::load(&path).expect("load");
    let after = restored.predict_frame(&features).expect("predict");

    assert_eq!(before, after);
    assert_eq!(restored.metadata.model, artifact.metadata.model);
}

#[test]
fn predict_rejects_a_mismatched_feature_count() {
    let df = processed_frame(60);
    let (artifact, _) = train_and_select(&df, &options()).expect("train");

    let narrow = df!["Temperature" => [20.0]].expect("df");
    assert!(artifact.predict_frame(&narrow).is_err());
}

#[test]
fn identical_seeds_reproduce_identical_metrics() {
    let df = processed_frame(60);
    let report = verify_reproducibility(&df, &options(), 2, 1e-9, "test-hash".to_string())
        .expect("verify");

    assert_eq!(report.runs.len(), 2);
    assert!(report.reproducible, "max delta {}", report.max_rmse_delta);
    assert_eq!(report.seed, 7);
    assert_eq!(report.data_hash, "test-hash");
}
