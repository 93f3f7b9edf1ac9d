//! Number and chart formatting shared by the narrative and the generator.

/// Format a count with thousands separators, e.g. `345991` → `345,991`.
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out
}

/// Format a float with thousands separators and fixed decimals.
pub fn format_decimal(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (whole, fraction) = match formatted.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut out = String::new();
    if value < 0.0 && formatted.chars().any(|c| c != '0' && c != '.') {
        out.push('-');
    }
    out.push_str(&format_count(whole.parse::<u64>().unwrap_or(0)));
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(fraction);
    }

    out
}

/// Signed percentage such as `+64.9%` or `-3.0%`.
pub fn format_percent(value: f64) -> String {
    format!("{:+.1}%", value)
}

/// Relative change from `from` to `to` in percent; `None` when `from` is zero.
pub fn percent_change(from: f64, to: f64) -> Option<f64> {
    if from == 0.0 {
        None
    } else {
        Some((to - from) / from * 100.0)
    }
}

/// Hour of day as `HH:00`.
pub fn format_hour(hour: u8) -> String {
    format!("{:02}:00", hour)
}

/// Horizontal text bar proportional to `value / max`.
pub fn bar(value: f64, max: f64, width: usize) -> String {
    if width == 0 || max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let filled = ((value / max) * width as f64).round() as usize;
    "█".repeat(filled.clamp(1, width))
}

/// Markdown anchor for a heading.
pub fn anchor(heading: &str) -> String {
    heading
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            'a'..='z' | '0'..='9' | '-' => Some(c),
            ' ' => Some('-'),
            _ => None,
        })
        .collect()
}
