// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

pub fn format_money(v: f64) -> String {
    format!("{v:.2}")
}

pub fn format_optional_money(v: Option<f64>) -> String {
    v.map_or("—".to_string(), format_money)
}

pub fn format_percent(v: Option<f64>) -> String {
    match v {
        Some(p) => format!("{p:.2}%"),
        None => "—".to_string(),
    }
}

/// Unix epoch milliseconds to `HH:MM:SS` (UTC).
pub fn format_time_ms(ms: i64) -> String {
    let secs = (ms / 1_000).max(0) as u64;
    let h = (secs / 3600) % 24;
    let m = (secs / 60) % 60;
    let s = secs % 60;
    format!("{h:02}:{m:02}:{s:02}")
}

/// Truncate on character boundaries, marking the cut with an ellipsis.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}
