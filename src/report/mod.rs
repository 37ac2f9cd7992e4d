pub mod json;
pub mod text;

/// Rounds for log lines only; payloads keep full precision.
pub fn format_f64_6(v: f64) -> String {
    format!("{:.6}", v)
}
