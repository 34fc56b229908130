// Latency value encoding shared by the chart values and the services reading them

/// Env var the services read their artificial delay from
pub const EXTRA_LATENCY_ENV: &str = "EXTRA_LATENCY";

/// Integer field written by older versions of this tool
pub const LEGACY_LATENCY_FIELD: &str = "extraLatencyMs";

const MS_SUFFIX: &str = "ms";

/// Format a latency as an env value, e.g. `250` -> `"250ms"`
pub fn format_latency(latency_ms: i64) -> String {
    format!("{latency_ms}{MS_SUFFIX}")
}

/// Parse an env value the way the services do at startup.
///
/// One trailing `ms` is stripped and the leading integer is taken, so
/// `"12.5ms"` reads as 12. The services hold the value in a 32-bit `int`, so
/// anything past `i32::MAX` counts as invalid. Negative values are clamped to
/// 0, and values with no leading integer count as 0.
pub fn parse_latency(raw: &str) -> i64 {
    let trimmed = raw.trim();
    let body = trimmed.strip_suffix(MS_SUFFIX).unwrap_or(trimmed);

    match leading_integer(body).parse::<i32>() {
        Ok(latency_ms) if latency_ms < 0 => {
            tracing::warn!(value = raw, "{EXTRA_LATENCY_ENV} cannot be negative, treating as 0");
            0
        }
        Ok(latency_ms) => i64::from(latency_ms),
        Err(_) => {
            tracing::warn!(value = raw, "Invalid {EXTRA_LATENCY_ENV} value, treating as 0");
            0
        }
    }
}

fn leading_integer(s: &str) -> &str {
    let sign_len = usize::from(s.starts_with(['-', '+']));
    let digits_len = s
        .get(sign_len..)
        .map_or(0, |rest| rest.bytes().take_while(u8::is_ascii_digit).count());
    s.get(..sign_len + digits_len).unwrap_or_default()
}
