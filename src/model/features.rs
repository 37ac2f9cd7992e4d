pub const N_FEATURES: usize = 5;

/// Column order shared by the model input and the attribution output.
pub const FEATURE_COLUMNS: [&str; N_FEATURES] = [
    "similarityScore",
    "liveness",
    "tipoDocumentoDetectado",
    "OCR_match",
    "edad_valida",
];

pub const TARGET_COLUMN: &str = "match_result";

pub const IDX_SIMILARITY: usize = 0;
pub const IDX_LIVENESS: usize = 1;
pub const IDX_DOCUMENT_TYPE: usize = 2;
pub const IDX_OCR_MATCH: usize = 3;
pub const IDX_AGE_VALID: usize = 4;

pub type FeatureVector = [f64; N_FEATURES];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentType {
    Dui,
    Pasaporte,
    #[default]
    Desconocido,
}

impl DocumentType {
    /// Total mapping; anything outside the table is `Desconocido`.
    pub fn from_label(label: &str) -> Self {
        match label {
            "DUI" => DocumentType::Dui,
            "Pasaporte" => DocumentType::Pasaporte,
            _ => DocumentType::Desconocido,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            DocumentType::Dui => 0,
            DocumentType::Pasaporte => 1,
            DocumentType::Desconocido => 2,
        }
    }
}
