use crate::config::{MAX_INTERVAL_SEC, MIN_INTERVAL_SEC};
use once_cell::sync::Lazy;
use regex::Regex;

// Compiled regexes for interval parsing
static INTERVAL_MS_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+(?:\.\d+)?)\s*ms$").unwrap());
static INTERVAL_SEC_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+(?:\.\d+)?)\s*s$").unwrap());
static INTERVAL_MIN_SEC_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)m\s*(?:(\d+(?:\.\d+)?)s)?$").unwrap());
static INTERVAL_COLON_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+):(\d{2}(?:\.\d+)?)$").unwrap());

/// Clamp `n` into `[lo, hi]`.
pub fn clamp(n: f64, lo: f64, hi: f64) -> f64 {
    hi.min(lo.max(n))
}

/// Interval parsing error types for better error handling
#[derive(Debug)]
pub enum IntervalParseError {
    EmptyInput,
    InvalidFormat(String),
    InvalidSeconds(f64),
    OutOfRange(f64),
}

impl std::fmt::Display for IntervalParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntervalParseError::EmptyInput => write!(f, "Interval cannot be empty"),
            IntervalParseError::InvalidFormat(hint) => write!(f, "Invalid interval. {}", hint),
            IntervalParseError::InvalidSeconds(s) => {
                write!(f, "Invalid seconds: {} (must be below 60)", s)
            }
            IntervalParseError::OutOfRange(s) => write!(
                f,
                "Interval {}s is outside {}s to {}s",
                s, MIN_INTERVAL_SEC, MAX_INTERVAL_SEC
            ),
        }
    }
}

impl std::error::Error for IntervalParseError {}

/// Parse an interval in seconds from user input.
///
/// Supported formats:
/// - Plain number: "2.5" (seconds)
/// - Seconds: "2.5s"
/// - Milliseconds: "750ms"
/// - Minutes and seconds: "1m", "1m 30s"
/// - Colon format: "1:30" (minutes:seconds)
///
/// # Examples
/// ```
/// use reaction_trainer::utils::parse_interval_sec;
/// assert_eq!(parse_interval_sec("2.5"), Ok(2.5));
/// assert_eq!(parse_interval_sec("750ms"), Ok(0.75));
/// assert_eq!(parse_interval_sec("1m 30s"), Ok(90.0));
/// assert_eq!(parse_interval_sec("1:30"), Ok(90.0));
/// ```
pub fn parse_interval_sec(input: &str) -> Result<f64, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(IntervalParseError::EmptyInput.to_string());
    }

    let secs = parse_interval_unchecked(trimmed)?;
    if !(MIN_INTERVAL_SEC..=MAX_INTERVAL_SEC).contains(&secs) {
        return Err(IntervalParseError::OutOfRange(secs).to_string());
    }
    Ok(secs)
}

fn parse_interval_unchecked(trimmed: &str) -> Result<f64, String> {
    let invalid = || {
        IntervalParseError::InvalidFormat("Use: 2.5, 2.5s, 750ms, 1m 30s or 1:30".to_string())
            .to_string()
    };

    if let Ok(secs) = trimmed.parse::<f64>() {
        return if secs.is_finite() { Ok(secs) } else { Err(invalid()) };
    }

    if let Some(captures) = INTERVAL_MS_REGEX.captures(trimmed) {
        let ms: f64 = captures[1].parse().map_err(|_| invalid())?;
        return Ok(ms / 1000.0);
    }

    if let Some(captures) = INTERVAL_SEC_REGEX.captures(trimmed) {
        return captures[1].parse().map_err(|_| invalid());
    }

    if let Some(captures) = INTERVAL_MIN_SEC_REGEX.captures(trimmed) {
        let minutes: f64 = captures[1].parse().map_err(|_| invalid())?;
        let seconds: f64 = match captures.get(2) {
            Some(m) => m.as_str().parse().map_err(|_| invalid())?,
            None => 0.0,
        };
        if seconds >= 60.0 {
            return Err(IntervalParseError::InvalidSeconds(seconds).to_string());
        }
        return Ok(minutes * 60.0 + seconds);
    }

    if let Some(captures) = INTERVAL_COLON_REGEX.captures(trimmed) {
        let minutes: f64 = captures[1].parse().map_err(|_| invalid())?;
        let seconds: f64 = captures[2].parse().map_err(|_| invalid())?;
        if seconds >= 60.0 {
            return Err(IntervalParseError::InvalidSeconds(seconds).to_string());
        }
        return Ok(minutes * 60.0 + seconds);
    }

    Err(invalid())
}

/// Validate one end of the numeric range. Either end may be the larger one.
pub fn validate_range_bound(input: &str, field_name: &str) -> Result<i64, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(format!("{} cannot be empty", field_name));
    }
    trimmed
        .parse::<i64>()
        .map_err(|_| format!("{} must be a whole number", field_name))
}
