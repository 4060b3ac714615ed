use super::error::{Result, SpeedTestError};
use reqwest::header::HeaderMap;

pub const SERVER_TIMING: &str = "server-timing";

/// Server processing time in seconds, read from the `dur=` entry of a
/// `Server-Timing` header such as `cfRequestDuration;dur=12.5`.
pub fn parse_server_timing(value: &str) -> Result<f64> {
    let dur = value
        .split([';', ','])
        .map(str::trim)
        .find_map(|part| part.strip_prefix("dur="))
        .ok_or_else(|| SpeedTestError::MalformedTimingHeader(value.to_string()))?;

    let millis: f64 = dur
        .trim_matches('"')
        .parse()
        .map_err(|_| SpeedTestError::MalformedTimingHeader(value.to_string()))?;

    Ok(millis / 1000.0)
}

pub fn server_time(headers: &HeaderMap) -> Result<f64> {
    let value = headers
        .get(SERVER_TIMING)
        .ok_or(SpeedTestError::MissingTimingHeader)?
        .to_str()
        .map_err(|e| SpeedTestError::MalformedTimingHeader(e.to_string()))?;

    parse_server_timing(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_parse_cloudflare_header() -> Result<()> {
        assert_eq!(parse_server_timing("cfRequestDuration;dur=12.5")?, 0.0125);
        assert_eq!(parse_server_timing("dur=10")?, 0.01);
        Ok(())
    }

    #[test]
    fn test_parse_multiple_metrics() -> Result<()> {
        let secs = parse_server_timing("cache;desc=\"hit\", app;dur=250")?;
        assert_eq!(secs, 0.25);
        Ok(())
    }

    #[test]
    fn test_parse_without_duration() {
        assert!(matches!(
            parse_server_timing("cfRequestDuration;desc=none"),
            Err(SpeedTestError::MalformedTimingHeader(_))
        ));
        assert!(matches!(
            parse_server_timing("app;dur=fast"),
            Err(SpeedTestError::MalformedTimingHeader(_))
        ));
    }

    #[test]
    fn test_missing_header() {
        let headers = HeaderMap::new();
        assert!(matches!(
            server_time(&headers),
            Err(SpeedTestError::MissingTimingHeader)
        ));
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() -> Result<()> {
        let mut headers = HeaderMap::new();
        headers.insert("Server-Timing", HeaderValue::from_static("x;dur=4"));
        assert_eq!(server_time(&headers)?, 0.004);
        Ok(())
    }
}
