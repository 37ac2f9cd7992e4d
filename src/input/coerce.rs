//! Value coercion shared by JSON records and CSV cells.

/// Integer flag/code from text: `1/0`, `true/false`, `t/f`, `yes/no`, or a
/// number truncated toward zero.
pub fn int_from_str(raw: &str) -> Option<i64> {
    let s = raw.trim();
    match s.to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" => return Some(1),
        "false" | "f" | "no" | "n" => return Some(0),
        _ => {}
    }
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    float_from_str(s).and_then(truncate_to_i64)
}

pub fn float_from_str(raw: &str) -> Option<f64> {
    let s = raw.trim();
    match s.to_ascii_lowercase().as_str() {
        "true" | "t" => return Some(1.0),
        "false" | "f" => return Some(0.0),
        _ => {}
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn truncate_to_i64(v: f64) -> Option<i64> {
    if !v.is_finite() || v.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(v.trunc() as i64)
}
