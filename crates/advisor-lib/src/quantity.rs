//! Kubernetes resource quantity parsing
//!
//! CPU is normalized to millicores and memory to bytes. Fractional results are
//! rounded up, so any non-zero declaration stays non-zero.

/// Binary suffixes must be tried before their single-letter decimal prefixes
const SUFFIXES: &[(&str, f64)] = &[
    ("Ki", 1024.0),
    ("Mi", 1_048_576.0),
    ("Gi", 1_073_741_824.0),
    ("Ti", 1_099_511_627_776.0),
    ("Pi", 1_125_899_906_842_624.0),
    ("Ei", 1_152_921_504_606_846_976.0),
    ("k", 1e3),
    ("K", 1e3),
    ("M", 1e6),
    ("G", 1e9),
    ("T", 1e12),
    ("P", 1e15),
    ("E", 1e18),
    ("m", 1e-3),
];

/// Parse a CPU quantity ("250m", "1", "0.5", "500000n", "1k") into millicores
pub fn parse_cpu_quantity(quantity: &str) -> Option<u64> {
    let quantity = quantity.trim();

    if let Some(value) = quantity.strip_suffix('n') {
        scale(value, 1e-6)
    } else if let Some(value) = quantity.strip_suffix('u') {
        scale(value, 1e-3)
    } else {
        for (suffix, factor) in SUFFIXES {
            if let Some(value) = quantity.strip_suffix(suffix) {
                return scale(value, factor * 1000.0);
            }
        }
        scale(quantity, 1000.0)
    }
}

/// Parse a memory quantity ("128Mi", "1G", "1.5Gi", "1048576") into bytes
pub fn parse_memory_quantity(quantity: &str) -> Option<u64> {
    let quantity = quantity.trim();

    for (suffix, factor) in SUFFIXES {
        if let Some(value) = quantity.strip_suffix(suffix) {
            return scale(value, *factor);
        }
    }

    scale(quantity, 1.0)
}

fn scale(number: &str, factor: f64) -> Option<u64> {
    let value: f64 = number.trim().parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }

    let scaled = value * factor;
    if scaled == 0.0 {
        return Some(0);
    }

    // Absorb float noise such as 0.1 * 1000 = 100.00000000000001
    let nearest = scaled.round();
    let units = if (scaled - nearest).abs() < 1e-6 {
        nearest
    } else {
        scaled.ceil()
    };
    Some(units.max(1.0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cpu_quantity() {
        assert_eq!(parse_cpu_quantity("100m"), Some(100));
        assert_eq!(parse_cpu_quantity("1"), Some(1000));
        assert_eq!(parse_cpu_quantity("0.5"), Some(500));
        assert_eq!(parse_cpu_quantity("0.1"), Some(100));
        assert_eq!(parse_cpu_quantity("2.5"), Some(2500));
        assert_eq!(parse_cpu_quantity("500000000n"), Some(500));
        assert_eq!(parse_cpu_quantity("500000u"), Some(500));
        assert_eq!(parse_cpu_quantity(" 250m "), Some(250));
    }

    #[test]
    fn test_cpu_with_decimal_and_binary_suffixes() {
        assert_eq!(parse_cpu_quantity("1k"), Some(1_000_000));
        assert_eq!(parse_cpu_quantity("2M"), Some(2_000_000_000));
        assert_eq!(parse_cpu_quantity("1Ki"), Some(1_024_000));
        assert_eq!(parse_cpu_quantity("0.5k"), Some(500_000));
    }

    #[test]
    fn test_tiny_cpu_is_not_zero() {
        assert_eq!(parse_cpu_quantity("1n"), Some(1));
        assert_eq!(parse_cpu_quantity("0"), Some(0));
        assert_eq!(parse_cpu_quantity("0m"), Some(0));
    }

    #[test]
    fn test_parse_memory_quantity() {
        assert_eq!(parse_memory_quantity("128Mi"), Some(134_217_728));
        assert_eq!(parse_memory_quantity("1Gi"), Some(1_073_741_824));
        assert_eq!(parse_memory_quantity("1.5Gi"), Some(1_610_612_736));
        assert_eq!(parse_memory_quantity("256Ki"), Some(262_144));
        assert_eq!(parse_memory_quantity("1G"), Some(1_000_000_000));
        assert_eq!(parse_memory_quantity("500M"), Some(500_000_000));
        assert_eq!(parse_memory_quantity("64k"), Some(64_000));
        assert_eq!(parse_memory_quantity("1048576"), Some(1_048_576));
        assert_eq!(parse_memory_quantity("128974848000m"), Some(128_974_848));
    }

    #[test]
    fn test_invalid_quantities() {
        assert_eq!(parse_cpu_quantity(""), None);
        assert_eq!(parse_cpu_quantity("lots"), None);
        assert_eq!(parse_cpu_quantity("-1"), None);
        assert_eq!(parse_memory_quantity("12Xi"), None);
        assert_eq!(parse_memory_quantity("NaN"), None);
    }
}
