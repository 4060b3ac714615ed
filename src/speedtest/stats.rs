use super::error::{Result, SpeedTestError};

/// Nearest-rank percentile: the value at 1-indexed rank `ceil(n * p / 100)`
/// of the ascending sorted samples. No interpolation between neighbours.
pub fn percentile(samples: &[f64], p: f64) -> Result<f64> {
    if samples.is_empty() {
        return Err(SpeedTestError::InvalidInput(
            "percentile of an empty sample set".into(),
        ));
    }
    if !(p > 0.0 && p <= 100.0) {
        return Err(SpeedTestError::InvalidInput(format!(
            "percentile {} is outside (0, 100]",
            p
        )));
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = (sorted.len() as f64 * p / 100.0).ceil() as usize;
    Ok(sorted[rank.clamp(1, sorted.len()) - 1])
}

/// Sample standard deviation (n - 1 in the denominator).
pub fn jitter(samples: &[f64]) -> Result<f64> {
    if samples.len() < 2 {
        return Err(SpeedTestError::InvalidInput(format!(
            "jitter needs at least 2 samples, got {}",
            samples.len()
        )));
    }

    let avg = samples.iter().sum::<f64>() / samples.len() as f64;
    let variance: f64 =
        samples.iter().map(|&x| (x - avg).powi(2)).sum::<f64>() / (samples.len() - 1) as f64;

    Ok(variance.sqrt())
}
