use std::io::BufRead;
use std::path::Path;

use crate::input::coerce::{float_from_str, int_from_str};
use crate::input::{InputError, open_maybe_gz};
use crate::model::features::{
    DocumentType, FEATURE_COLUMNS, FeatureVector, IDX_DOCUMENT_TYPE, IDX_SIMILARITY, N_FEATURES,
    TARGET_COLUMN,
};

/// Labeled training rows in `FEATURE_COLUMNS` order.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub rows: Vec<FeatureVector>,
    pub labels: Vec<u8>,
}

impl Corpus {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn positives(&self) -> usize {
        self.labels.iter().filter(|&&l| l == 1).count()
    }
}

/// Reads a comma-separated corpus with a header row; `.gz` is decompressed.
/// Columns are located by name, so their order in the file is free.
pub fn load_corpus(path: &Path) -> Result<Corpus, InputError> {
    if !path.exists() {
        return Err(InputError::MissingInput(format!(
            "training corpus {} not found",
            path.display()
        )));
    }
    let mut reader = open_maybe_gz(path)?;
    let mut buf = String::new();

    let read = reader.read_line(&mut buf)?;
    if read == 0 || buf.trim().is_empty() {
        return Err(InputError::EmptyCorpus(path.display().to_string()));
    }
    let header: Vec<String> = split_csv_line(buf.trim_end_matches(['\r', '\n']))
        .into_iter()
        .map(|name| name.trim().trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut feature_cols: [Option<usize>; N_FEATURES] = [None; N_FEATURES];
    for (slot, name) in feature_cols.iter_mut().zip(FEATURE_COLUMNS) {
        *slot = header.iter().position(|h| h == name);
        if slot.is_none() {
            tracing::warn!(column = name, "corpus has no such column; using defaults");
        }
    }
    let target_col = header
        .iter()
        .position(|h| h == TARGET_COLUMN)
        .ok_or_else(|| InputError::Parse(format!("corpus is missing column {}", TARGET_COLUMN)))?;

    let mut corpus = Corpus::default();
    let mut line_no = 1usize;
    loop {
        buf.clear();
        let read = reader.read_line(&mut buf)?;
        if read == 0 {
            break;
        }
        line_no += 1;
        let line = buf.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_csv_line(line);
        let mut row = [0.0; N_FEATURES];
        for (idx, col) in feature_cols.iter().enumerate() {
            let cell = col
                .and_then(|c| fields.get(c))
                .map(|s| s.trim())
                .unwrap_or("");
            row[idx] = parse_feature_cell(idx, cell).ok_or_else(|| {
                InputError::Parse(format!(
                    "line {} column {}: invalid value {:?}",
                    line_no, FEATURE_COLUMNS[idx], cell
                ))
            })?;
        }

        let label_cell = fields.get(target_col).map(|s| s.trim()).unwrap_or("");
        let label = match int_from_str(label_cell) {
            Some(0) => 0u8,
            Some(1) => 1u8,
            _ => {
                return Err(InputError::Parse(format!(
                    "line {} column {}: expected a binary label, found {:?}",
                    line_no, TARGET_COLUMN, label_cell
                )));
            }
        };

        corpus.rows.push(row);
        corpus.labels.push(label);
    }

    if corpus.is_empty() {
        return Err(InputError::EmptyCorpus(path.display().to_string()));
    }
    Ok(corpus)
}

/// Empty cells take the record defaults.
fn parse_feature_cell(idx: usize, cell: &str) -> Option<f64> {
    if idx == IDX_DOCUMENT_TYPE {
        let doc = if cell.is_empty() {
            DocumentType::Desconocido
        } else {
            DocumentType::from_label(cell)
        };
        return Some(doc.code() as f64);
    }
    if cell.is_empty() {
        return Some(0.0);
    }
    if idx == IDX_SIMILARITY {
        float_from_str(cell)
    } else {
        int_from_str(cell).map(|v| v as f64)
    }
}

/// Splits one CSV record, honouring double quotes and `""` escapes.
pub fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/corpus.rs"]
mod tests;
