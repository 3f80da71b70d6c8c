use std::time::Duration;

/// `HH:MM:SS` rendering of a scan's elapsed time, for log fields.
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Rounds a monetary total to centavos.
///
/// Works on the exact decimal expansion of `value` and breaks exact ties to
/// the even digit, so `0.125` becomes `0.12` while `1.005` (stored slightly
/// below the tie) becomes `1.0`.
pub fn round_two_decimals(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}

/// Formats a 14-digit CNPJ as `XX.XXX.XXX/XXXX-XX`.
///
/// Returns `None` for anything that is not exactly 14 ASCII digits.
pub fn format_cnpj(digits: &str) -> Option<String> {
    if digits.len() != 14 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(format!(
        "{}.{}.{}/{}-{}",
        &digits[..2],
        &digits[2..5],
        &digits[5..8],
        &digits[8..12],
        &digits[12..]
    ))
}
