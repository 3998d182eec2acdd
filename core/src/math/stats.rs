pub struct StatsHelper;

impl StatsHelper {
    pub fn mean(samples: &[f64]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        samples.iter().sum::<f64>() / samples.len() as f64
    }

    pub fn rms(samples: &[f64]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = samples.iter().map(|&v| v * v).sum();
        (sum_sq / samples.len() as f64).sqrt()
    }

    /// Smallest and largest sample, or `None` for an empty slice.
    pub fn min_max(samples: &[f64]) -> Option<(f64, f64)> {
        let first = *samples.first()?;
        Some(
            samples
                .iter()
                .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rms_zero_sequence_yields_zero() {
        assert_eq!(StatsHelper::rms(&[]), 0.0);
        assert_eq!(StatsHelper::rms(&[0.0, 0.0]), 0.0);
    }

    #[test]
    fn rms_handles_single_value() {
        assert_eq!(StatsHelper::rms(&[4.0]), 4.0);
    }

    #[test]
    fn mean_and_extremes() {
        let samples = [1.0, 3.0, 2.0];
        assert_eq!(StatsHelper::mean(&samples), 2.0);
        assert_eq!(StatsHelper::min_max(&samples), Some((1.0, 3.0)));
        assert_eq!(StatsHelper::min_max(&[]), None);
    }
}
