use crate::Error;

/// Parse `HH:MM:SS,mmm`, `HH:MM:SS.mmm` or `MM:SS.mmm` into fractional
/// seconds. The separator before the fraction varies by producer, so both
/// are accepted.
pub fn parse_timestamp(raw: &str) -> Result<f64, Error> {
    let invalid = || Error::InvalidTimestamp(raw.to_string());
    let trimmed = raw.trim();

    let (clock, fraction) = match trimmed.rsplit_once([',', '.']) {
        Some((clock, fraction)) => (clock, Some(fraction)),
        None => (trimmed, None),
    };

    let parts: Vec<&str> = clock.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m, s] => (*h, *m, *s),
        [m, s] => ("0", *m, *s),
        _ => return Err(invalid()),
    };

    let field = |s: &str| -> Result<u64, Error> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        s.parse::<u64>().map_err(|_| invalid())
    };

    let whole = field(hours)? * 3600 + field(minutes)? * 60 + field(seconds)?;

    let frac = match fraction {
        Some(digits) => {
            let value = field(digits)? as f64;
            value / 10f64.powi(digits.len() as i32)
        }
        None => 0.0,
    };

    Ok(whole as f64 + frac)
}
