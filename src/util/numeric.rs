/// Keep only ASCII digits and the first `.` of `raw`, in order.
///
/// `"12a.3.4"` becomes `"12.34"`. Nothing is reformatted: leading zeros,
/// a leading or trailing dot and the empty string all survive as typed.
pub fn sanitize_number(raw: &str) -> String {
    let mut seen_dot = false;
    raw.chars()
        .filter(|&c| {
            if c == '.' {
                !std::mem::replace(&mut seen_dot, true)
            } else {
                c.is_ascii_digit()
            }
        })
        .collect()
}

/// Parse a cell's text as a finite number. Empty, malformed and
/// non-finite input all yield `None`.
pub fn parse_finite(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Render a number the way the backend's documents carry it: integral
/// values without a fractional part, `-0` as `0`.
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    format!("{}", n)
}
