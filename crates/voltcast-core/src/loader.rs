use std::fs::File;
use std::path::Path;

use polars::prelude::*;
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::schema;

/// Missing-value sentinels recognized on read. The set is a fixed,
/// case-sensitive list; anything else is kept as raw text for the
/// normalization stages to interpret.
pub const MISSING_SENTINELS: [&str; 4] = ["", "nan", "NAN", "NaT"];

/// Reads the raw delimited source file into a table of string columns named
/// by the canonical positional mapping. All cells stay textual here; type
/// coercion is the pipeline's job.
pub fn read_raw_dataset(path: &Path) -> Result<DataFrame> {
    if !path.is_file() {
        return Err(PipelineError::MissingResource(path.to_path_buf()));
    }

    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(file);

    let width = reader.headers()?.len();
    let has_junk = schema::validate_source_width(width)?;
    let specs = &schema::source_columns()[..width];

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); width];
    for record in reader.records() {
        let record = record?;
        for (idx, value) in record.iter().enumerate() {
            if idx >= width {
                break;
            }
            if MISSING_SENTINELS.contains(&value) {
                cells[idx].push(None);
            } else {
                cells[idx].push(Some(value.to_string()));
            }
        }
    }

    let mut columns: Vec<Column> = Vec::with_capacity(width);
    for (spec, values) in specs.iter().zip(cells) {
        columns.push(Series::new(spec.name.into(), values).into());
    }

    let df = DataFrame::new(columns)?;
    info!(
        rows = df.height(),
        columns = df.width(),
        junk_column = has_junk,
        "loaded raw dataset"
    );
    Ok(df)
}

/// Reads a processed table (the output of the preprocessing pipeline with
/// the timestamp column removed) as float columns under the canonical
/// processed names. Unparseable cells degrade to missing.
pub fn read_processed_dataset(path: &Path) -> Result<DataFrame> {
    if !path.is_file() {
        return Err(PipelineError::MissingResource(path.to_path_buf()));
    }

    let names = schema::processed_columns();
    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(file);

    let width = reader.headers()?.len();
    if width != names.len() {
        return Err(PipelineError::ColumnCount {
            expected_min: names.len(),
            expected_max: names.len(),
            found: width,
        });
    }

    let mut cells: Vec<Vec<Option<f64>>> = vec![Vec::new(); width];
    for record in reader.records() {
        let record = record?;
        for (idx, value) in record.iter().enumerate() {
            if idx >= width {
                break;
            }
            if MISSING_SENTINELS.contains(&value) {
                cells[idx].push(None);
            } else {
                cells[idx].push(value.trim().parse::<f64>().ok().filter(|v| !v.is_nan()));
            }
        }
    }

    let mut columns: Vec<Column> = Vec::with_capacity(width);
    for (name, values) in names.iter().zip(cells) {
        columns.push(Series::new((*name).into(), values).into());
    }

    let df = DataFrame::new(columns)?;
    info!(
        rows = df.height(),
        columns = df.width(),
        "loaded processed dataset"
    );
    Ok(df)
}

/// Writes the processed table as CSV. The destination directory must already
/// exist; a missing directory is a configuration error, not something to
/// paper over.
pub fn write_processed_dataset(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            return Err(PipelineError::MissingResource(parent.to_path_buf()));
        }
    }

    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    info!(rows = df.height(), path = %path.display(), "wrote processed dataset");
    Ok(())
}

/// Content hash of an on-disk dataset, recorded in reproducibility reports
/// so two runs can be pinned to identical input bytes.
pub fn hash_file(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(PipelineError::MissingResource(path.to_path_buf()));
    }
    let bytes = std::fs::read(path)?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}
