//! Numeric helpers shared by the metrics, risk and benchmark modules.
//!
//! Every helper returns 0.0 where the textbook value would be undefined
//! (empty input, zero denominator), so downstream figures stay finite.

pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() {
        0.0
    } else {
        numerator / denominator
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation: sqrt(sum((x - mean)^2) / n).
pub fn population_stddev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values
        .iter()
        .map(|v| {
            let diff = v - m;
            diff * diff
        })
        .sum::<f64>()
        / values.len() as f64;
    variance.sqrt()
}

/// Downside deviation around the mean: squared deviations of values below
/// the mean, summed and divided by the count of ALL values.
pub fn downside_deviation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let sum_sq: f64 = values
        .iter()
        .filter(|&&v| v < m)
        .map(|&v| (v - m).powi(2))
        .sum();
    (sum_sq / values.len() as f64).sqrt()
}

/// mean / stddev, zero risk-free rate.
pub fn sharpe(values: &[f64]) -> f64 {
    safe_div(mean(values), population_stddev(values))
}

/// mean / downside deviation.
pub fn sortino(values: &[f64]) -> f64 {
    safe_div(mean(values), downside_deviation(values))
}

/// Population covariance of two equally long series.
pub fn covariance(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    let ma = mean(&a[..n]);
    let mb = mean(&b[..n]);
    a[..n]
        .iter()
        .zip(&b[..n])
        .map(|(x, y)| (x - ma) * (y - mb))
        .sum::<f64>()
        / n as f64
}

/// Nearest-rank percentile (`pct` in 0..=100) of an unsorted series.
pub fn percentile(values: &[f64], pct: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let rank = ((pct / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn safe_div_zero_denominator() {
        assert_eq!(safe_div(5.0, 0.0), 0.0);
        assert_eq!(safe_div(5.0, f64::INFINITY), 0.0);
        assert_eq!(safe_div(6.0, 3.0), 2.0);
    }

    #[test]
    fn mean_and_stddev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_abs_diff_eq!(mean(&values), 5.0);
        assert_abs_diff_eq!(population_stddev(&values), 2.0);
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(population_stddev(&[]), 0.0);
    }

    #[test]
    fn downside_deviation_divides_by_all_values() {
        // mean 0; below-mean values: -2 -> 4; sum 4 over n = 4 -> sqrt(1) = 1
        let values = [-2.0, 0.0, 1.0, 1.0];
        assert_abs_diff_eq!(downside_deviation(&values), 1.0);
    }

    #[test]
    fn ratios_zero_on_constant_series() {
        let values = [3.0, 3.0, 3.0];
        assert_eq!(sharpe(&values), 0.0);
        assert_eq!(sortino(&values), 0.0);
    }

    #[test]
    fn covariance_of_identical_series_is_variance() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_abs_diff_eq!(covariance(&values, &values), 1.25);
    }

    #[test]
    fn percentile_nearest_rank() {
        let values = [5.0, 1.0, 3.0, 2.0, 4.0];
        assert_eq!(percentile(&values, 5.0), 1.0);
        assert_eq!(percentile(&values, 50.0), 3.0);
        assert_eq!(percentile(&values, 100.0), 5.0);
        assert_eq!(percentile(&[], 5.0), 0.0);
    }
}
