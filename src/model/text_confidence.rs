/// Placeholder "confidence": character count scaled by 1/100. No model involved.
pub fn length_confidence(text: &str) -> f64 {
    text.chars().count() as f64 / 100.0
}
