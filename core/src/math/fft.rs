use num_complex::Complex64;
use rustfft::{num_traits::Zero, Fft, FftPlanner};
use std::sync::Arc;

/// Helper that wraps the `rustfft` planner for reuse.
pub struct FftHelper {
    fft: Arc<dyn Fft<f64>>,
    size: usize,
}

impl FftHelper {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        Self { fft, size }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Forward transform of a real signal, zero-padded or truncated to the plan size.
    pub fn forward(&self, input: &[f64]) -> Vec<Complex64> {
        let mut buffer: Vec<Complex64> = input
            .iter()
            .take(self.size)
            .map(|&value| Complex64::new(value, 0.0))
            .collect();
        buffer.resize(self.size, Complex64::zero());
        self.fft.process(&mut buffer);
        buffer
    }

    /// Index of the strongest non-DC bin in the lower half of the spectrum.
    pub fn peak_bin(&self, input: &[f64]) -> Option<usize> {
        let spectrum = self.forward(input);
        let half = self.size / 2;
        (1..=half)
            .map(|bin| (bin, spectrum[bin].norm()))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(bin, _)| bin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn fft_helper_returns_same_length() {
        let helper = FftHelper::new(4);
        let output = helper.forward(&[1.0, 0.0, -1.0, 0.0]);
        assert_eq!(output.len(), 4);
    }

    #[test]
    fn peak_bin_finds_pure_tone() {
        let helper = FftHelper::new(64);
        let tone: Vec<f64> = (0..64)
            .map(|i| (2.0 * PI * 8.0 * i as f64 / 64.0).sin())
            .collect();
        assert_eq!(helper.peak_bin(&tone), Some(8));
    }
}
