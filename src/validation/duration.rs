//! # Duration Parsing
//!
//! Kubernetes-style duration strings: `30s`, `5m`, `1h`, `7d`, and compound
//! forms such as `1h30m`.

use anyhow::Result;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

static DURATION_FORMAT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(?:\d+[smhd])+$").ok());

static DURATION_PART: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?P<number>\d+)(?P<unit>[smhd])").ok());

/// Parse a duration string into a `Duration`
///
/// # Errors
///
/// Returns an error for empty input, unknown units, zero totals or overflow.
pub fn parse_kubernetes_duration(duration_str: &str) -> Result<Duration> {
    let trimmed = duration_str.trim().to_lowercase();
    if trimmed.is_empty() {
        return Err(anyhow::anyhow!("Duration string cannot be empty"));
    }

    let (Some(format), Some(part)) = (DURATION_FORMAT.as_ref(), DURATION_PART.as_ref()) else {
        return Err(anyhow::anyhow!("Duration patterns failed to compile"));
    };

    if !format.is_match(&trimmed) {
        return Err(anyhow::anyhow!(
            "Invalid duration format '{}'. Expected <number><unit>[...] (e.g., '30s', '1h30m', '7d')",
            duration_str.trim()
        ));
    }

    let mut seconds: u64 = 0;
    for captures in part.captures_iter(&trimmed) {
        let number: u64 = captures["number"].parse().map_err(|e| {
            anyhow::anyhow!("Invalid duration number in '{}': {}", duration_str.trim(), e)
        })?;
        let multiplier = match &captures["unit"] {
            "s" => 1,
            "m" => 60,
            "h" => 3600,
            "d" => 86400,
            unit => {
                return Err(anyhow::anyhow!(
                    "Invalid unit '{}' in duration '{}'",
                    unit,
                    duration_str.trim()
                ))
            }
        };
        seconds = number
            .checked_mul(multiplier)
            .and_then(|part| seconds.checked_add(part))
            .ok_or_else(|| anyhow::anyhow!("Duration '{}' overflows", duration_str.trim()))?;
    }

    if seconds == 0 {
        return Err(anyhow::anyhow!(
            "Duration must be greater than 0, got '{}'",
            duration_str.trim()
        ));
    }

    Ok(Duration::from_secs(seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_units() {
        assert_eq!(parse_kubernetes_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_kubernetes_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_kubernetes_duration("1H").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_kubernetes_duration(" 2d ").unwrap(), Duration::from_secs(172_800));
    }

    #[test]
    fn test_compound() {
        assert_eq!(
            parse_kubernetes_duration("1h30m").unwrap(),
            Duration::from_secs(5400)
        );
        assert_eq!(
            parse_kubernetes_duration("1d12h").unwrap(),
            Duration::from_secs(129_600)
        );
    }

    #[test]
    fn test_rejects_invalid() {
        for input in ["", "10", "1x", "h1", "0s", "1.5h", "-1m"] {
            assert!(
                parse_kubernetes_duration(input).is_err(),
                "expected error for {input:?}"
            );
        }
    }
}
