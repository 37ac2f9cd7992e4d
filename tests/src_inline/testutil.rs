use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::model::features::FeatureVector;

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

pub fn make_temp_dir(tag: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("verif_scorer_{}_{}_{}", tag, std::process::id(), id));
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Approval iff similarity >= 60, liveness and OCR match.
pub fn synthetic_row(i: usize) -> (FeatureVector, u8) {
    let similarity = ((i * 37) % 100) as f64;
    let liveness = if i % 4 != 0 { 1.0 } else { 0.0 };
    let document = ((i / 4) % 3) as f64;
    let ocr = if i % 5 != 0 { 1.0 } else { 0.0 };
    let age = if i % 7 != 0 { 1.0 } else { 0.0 };
    let label = u8::from(similarity >= 60.0 && liveness == 1.0 && ocr == 1.0);
    ([similarity, liveness, document, ocr, age], label)
}

pub fn synthetic_dataset(n: usize) -> (Vec<FeatureVector>, Vec<u8>) {
    (0..n).map(synthetic_row).unzip()
}

/// Same rows as `synthetic_dataset`, with shuffled column order and the
/// mixed boolean spellings found in database exports.
pub fn synthetic_csv(n: usize) -> String {
    let docs = ["DUI", "Pasaporte", "DESCONOCIDO"];
    let mut out =
        String::from("id,match_result,edad_valida,OCR_match,tipoDocumentoDetectado,liveness,similarityScore\n");
    for i in 0..n {
        let (row, label) = synthetic_row(i);
        out.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            i,
            if label == 1 { "true" } else { "false" },
            if row[4] == 1.0 { "t" } else { "f" },
            row[3] as i64,
            docs[row[2] as usize],
            row[1] as i64,
            row[0]
        ));
    }
    out
}
