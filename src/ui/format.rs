/// Largest decimal unit that keeps `bits` at or above 1, rounded to two
/// places: `1500000` -> `1.5 Mb`.
pub fn best_unit(bits: f64) -> String {
    const UNITS: [&str; 4] = ["b", "Kb", "Mb", "Gb"];

    if bits <= 0.0 {
        return "0b".to_string();
    }

    let mut exponent = 0;
    let mut scaled = bits;
    while scaled >= 1000.0 && exponent < UNITS.len() - 1 {
        scaled /= 1000.0;
        exponent += 1;
    }
    let rounded = (scaled * 100.0).round() / 100.0;

    format!("{} {}", rounded, UNITS[exponent])
}

pub fn format_ms(ms: f64) -> String {
    format!("{}ms", ms.round() as i64)
}

/// Mb/s formatting for the live dashboard.
pub fn format_speed(mbps: f64) -> String {
    if mbps >= 1000.0 {
        format!("{:.1} Gbps", mbps / 1000.0)
    } else if mbps >= 1.0 {
        format!("{:.1} Mbps", mbps)
    } else if mbps > 0.0 {
        format!("{:.0} Kbps", mbps * 1000.0)
    } else {
        "—".to_string()
    }
}

pub fn format_bytes(bytes: u64) -> String {
    if bytes >= 1_000_000 {
        format!("{} MB", bytes / 1_000_000)
    } else if bytes >= 1_000 {
        format!("{} kB", bytes / 1_000)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_unit() {
        assert_eq!(best_unit(0.0), "0b");
        assert_eq!(best_unit(999.0), "999 b");
        assert_eq!(best_unit(1_000.0), "1 Kb");
        assert_eq!(best_unit(1_500_000.0), "1.5 Mb");
        assert_eq!(best_unit(93_456_789.0), "93.46 Mb");
        assert_eq!(best_unit(2_000_000_000.0), "2 Gb");
        assert_eq!(best_unit(5_000_000_000_000.0), "5000 Gb");
    }

    #[test]
    fn test_format_ms() {
        assert_eq!(format_ms(12.4), "12ms");
        assert_eq!(format_ms(12.5), "13ms");
    }

    #[test]
    fn test_format_speed() {
        assert_eq!(format_speed(0.0), "—");
        assert_eq!(format_speed(0.5), "500 Kbps");
        assert_eq!(format_speed(93.44), "93.4 Mbps");
        assert_eq!(format_speed(1500.0), "1.5 Gbps");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(100_000), "100 kB");
        assert_eq!(format_bytes(250_000_000), "250 MB");
        assert_eq!(format_bytes(12), "12 B");
    }
}
