use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;
use thiserror::Error;

pub mod coerce;
pub mod corpus;
pub mod record;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("record payload must be a JSON object")]
    NotAnObject,
    #[error("field {field} has an invalid value: {value}")]
    InvalidField { field: &'static str, value: String },
    #[error("missing input: {0}")]
    MissingInput(String),
    #[error("corpus {0} has no rows")]
    EmptyCorpus(String),
    #[error("parse error: {0}")]
    Parse(String),
}

pub fn open_maybe_gz(path: &Path) -> Result<Box<dyn BufRead>, InputError> {
    let file = File::open(path)?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}
