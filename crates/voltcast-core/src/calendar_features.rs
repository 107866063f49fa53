use chrono::{DateTime, Datelike, NaiveDateTime, Timelike, Utc};
use polars::prelude::*;

use crate::error::Result;
use crate::schema::{self, FEATURE_ORDER};

/// Calendar values derived from one reconciled timestamp. The same formulas
/// serve both the batch pipeline and single-observation prediction, so the
/// two can never drift apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarFeatures {
    pub day: i32,
    pub month: i32,
    pub hour: i32,
    pub minute: i32,
    /// Monday = 1 through Sunday = 7.
    pub day_week: i32,
    /// Month binned into [1-3], [4-6], [7-9], [10-12].
    pub quarter_year: i32,
    /// 1 through 366.
    pub day_year: i32,
}

pub fn calendar_features_for(dt: NaiveDateTime) -> CalendarFeatures {
    CalendarFeatures {
        day: dt.day() as i32,
        month: dt.month() as i32,
        hour: dt.hour() as i32,
        minute: dt.minute() as i32,
        day_week: dt.weekday().number_from_monday() as i32,
        quarter_year: ((dt.month() as i32 - 1) / 3) + 1,
        day_year: dt.ordinal() as i32,
    }
}

/// Appends the seven calendar columns derived from the timestamp column.
/// Existing columns are never overwritten.
pub fn derive_calendar_features(df: &DataFrame, timestamp_column: &str) -> Result<DataFrame> {
    let timestamps = df.column(timestamp_column)?.datetime()?;
    let len = timestamps.len();

    let mut days: Vec<Option<i32>> = Vec::with_capacity(len);
    let mut months: Vec<Option<i32>> = Vec::with_capacity(len);
    let mut hours: Vec<Option<i32>> = Vec::with_capacity(len);
    let mut minutes: Vec<Option<i32>> = Vec::with_capacity(len);
    let mut day_weeks: Vec<Option<i32>> = Vec::with_capacity(len);
    let mut quarters: Vec<Option<i32>> = Vec::with_capacity(len);
    let mut day_years: Vec<Option<i32>> = Vec::with_capacity(len);

    for idx in 0..len {
        match timestamps.get(idx).and_then(naive_from_micros) {
            Some(dt) => {
                let features = calendar_features_for(dt);
                days.push(Some(features.day));
                months.push(Some(features.month));
                hours.push(Some(features.hour));
                minutes.push(Some(features.minute));
                day_weeks.push(Some(features.day_week));
                quarters.push(Some(features.quarter_year));
                day_years.push(Some(features.day_year));
            }
            None => {
                days.push(None);
                months.push(None);
                hours.push(None);
                minutes.push(None);
                day_weeks.push(None);
                quarters.push(None);
                day_years.push(None);
            }
        }
    }

    let mut output = df.clone();
    output.hstack_mut(&mut [
        Series::new("Day".into(), days).into(),
        Series::new("Month".into(), months).into(),
        Series::new("Hour".into(), hours).into(),
        Series::new("Minute".into(), minutes).into(),
        Series::new("DayWeek".into(), day_weeks).into(),
        Series::new("QuarterYear".into(), quarters).into(),
        Series::new("DayYear".into(), day_years).into(),
    ])?;

    Ok(output)
}

/// Raw weather readings for one prediction request.
#[derive(Debug, Clone, Copy)]
pub struct WeatherObservation {
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub general_diffuse_flows: f64,
    pub diffuse_flows: f64,
}

/// Assembles a single-row feature table for the prediction service: the
/// five weather readings plus the seven calendar features, in the exact
/// column order the model was trained on.
pub fn assemble_prediction_row(
    observation: &WeatherObservation,
    timestamp: NaiveDateTime,
) -> Result<DataFrame> {
    let calendar = calendar_features_for(timestamp);
    let values: [f64; 12] = [
        observation.temperature,
        observation.humidity,
        observation.wind_speed,
        observation.general_diffuse_flows,
        observation.diffuse_flows,
        calendar.day as f64,
        calendar.month as f64,
        calendar.hour as f64,
        calendar.minute as f64,
        calendar.day_week as f64,
        calendar.quarter_year as f64,
        calendar.day_year as f64,
    ];

    let columns: Vec<Column> = FEATURE_ORDER
        .iter()
        .zip(values)
        .map(|(name, value)| Series::new((*name).into(), vec![value]).into())
        .collect();
    Ok(DataFrame::new(columns)?)
}

/// Drops the timestamp column once calendar features exist; it is not a
/// model feature.
pub fn drop_timestamp_column(df: &DataFrame) -> Result<DataFrame> {
    if df
        .get_column_names()
        .iter()
        .any(|name| name.as_str() == schema::TIMESTAMP_COLUMN)
    {
        Ok(df.drop(schema::TIMESTAMP_COLUMN)?)
    } else {
        Ok(df.clone())
    }
}

pub(crate) fn naive_from_micros(value: i64) -> Option<NaiveDateTime> {
    let secs = value.div_euclid(1_000_000);
    let micros = value.rem_euclid(1_000_000) as u32;
    DateTime::<Utc>::from_timestamp(secs, micros * 1_000).map(|dt| dt.naive_utc())
}
