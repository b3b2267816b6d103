//! Gauge text parsing

use regex::Regex;
use std::sync::LazyLock;

static PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)%").expect("valid percentage pattern"));

static MEMORY_USAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:[.,]\d+)?)\s*/\s*(\d+(?:[.,]\d+)?)\s*GB").expect("valid memory pattern")
});

/// First whole-number percentage in `text`, e.g. `"CPU\n12% 3.1 GHz"` -> 12.
pub fn extract_percentage(text: &str) -> Option<u32> {
    PERCENT
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Used and total gigabytes from memory text such as `"7.9/15.7 GB (50%)"`.
pub fn extract_memory_gb(text: &str) -> Option<(f64, f64)> {
    let caps = MEMORY_USAGE.captures(text)?;
    let used = parse_decimal(caps.get(1)?.as_str())?;
    let total = parse_decimal(caps.get(2)?.as_str())?;
    Some((used, total))
}

fn parse_decimal(raw: &str) -> Option<f64> {
    raw.replace(',', ".").parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_percentage() {
        assert_eq!(extract_percentage("12%"), Some(12));
        assert_eq!(extract_percentage("CPU\n7% 2.95 GHz"), Some(7));
        assert_eq!(extract_percentage("NPU 0\n100%"), Some(100));
        assert_eq!(extract_percentage("7.9/15.7 GB (50%)"), Some(50));
    }

    #[test]
    fn test_extract_percentage_missing() {
        assert_eq!(extract_percentage(""), None);
        assert_eq!(extract_percentage("NPU 0"), None);
        assert_eq!(extract_percentage("% only"), None);
    }

    #[test]
    fn test_extract_memory_gb() {
        assert_eq!(extract_memory_gb("7.9/15.7 GB (50%)"), Some((7.9, 15.7)));
        assert_eq!(extract_memory_gb("12/32 GB (37%)"), Some((12.0, 32.0)));
        assert_eq!(extract_memory_gb("7,9/15,7 GB (50%)"), Some((7.9, 15.7)));
        assert_eq!(extract_memory_gb("50%"), None);
    }
}
