use crate::model::text_confidence::length_confidence;

pub fn render_length_explanation(text: &str) -> String {
    if text.is_empty() {
        return "Texto no detectado".to_string();
    }
    format!(
        "Confianza: {:.1}/1.0 (basado en la longitud).",
        length_confidence(text)
    )
}
