//! Second-order IIR filter stages.
//!
//! Coefficients follow the RBJ Audio EQ Cookbook. The filter keeps its delay
//! line when coefficients change, so parameters can be retuned while audio is
//! flowing without a click from a state reset.

use std::f32::consts::PI;

/// Lowest cutoff accepted by the coefficient helpers.
const MIN_FREQUENCY_HZ: f32 = 1.0;

/// Highest cutoff as a fraction of the sample rate (just below Nyquist).
const MAX_FREQUENCY_RATIO: f32 = 0.49;

/// Smallest Q accepted before the bandwidth term blows up.
const MIN_Q: f32 = 0.01;

/// Normalized biquad coefficients (`a0` already divided out).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoefficients {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

impl Default for BiquadCoefficients {
    /// Identity filter: output equals input.
    fn default() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
        }
    }
}

/// Shared `w0` terms for a cutoff at a given sample rate.
struct Prewarp {
    cos_w0: f32,
    alpha: f32,
}

impl Prewarp {
    fn new(frequency_hz: f32, q: f32, sample_rate: u32) -> Self {
        let nyquist_guard = sample_rate as f32 * MAX_FREQUENCY_RATIO;
        let frequency = frequency_hz.clamp(MIN_FREQUENCY_HZ, nyquist_guard.max(MIN_FREQUENCY_HZ));
        let w0 = 2.0 * PI * frequency / sample_rate as f32;
        Self {
            cos_w0: w0.cos(),
            alpha: w0.sin() / (2.0 * q.max(MIN_Q)),
        }
    }
}

impl BiquadCoefficients {
    /// Low-pass coefficients.
    pub fn low_pass(cutoff_hz: f32, q: f32, sample_rate: u32) -> Self {
        let Prewarp { cos_w0, alpha } = Prewarp::new(cutoff_hz, q, sample_rate);

        Self::normalized(
            (1.0 - cos_w0) / 2.0,
            1.0 - cos_w0,
            (1.0 - cos_w0) / 2.0,
            1.0 + alpha,
            -2.0 * cos_w0,
            1.0 - alpha,
        )
    }

    /// High-pass coefficients.
    pub fn high_pass(cutoff_hz: f32, q: f32, sample_rate: u32) -> Self {
        let Prewarp { cos_w0, alpha } = Prewarp::new(cutoff_hz, q, sample_rate);

        Self::normalized(
            (1.0 + cos_w0) / 2.0,
            -(1.0 + cos_w0),
            (1.0 + cos_w0) / 2.0,
            1.0 + alpha,
            -2.0 * cos_w0,
            1.0 - alpha,
        )
    }

    /// Peaking (bell) coefficients; `gain_db` boosts or cuts around the centre.
    pub fn peaking(center_hz: f32, q: f32, gain_db: f32, sample_rate: u32) -> Self {
        let Prewarp { cos_w0, alpha } = Prewarp::new(center_hz, q, sample_rate);
        let a = 10.0_f32.powf(gain_db / 40.0);

        Self::normalized(
            1.0 + alpha * a,
            -2.0 * cos_w0,
            1.0 - alpha * a,
            1.0 + alpha / a,
            -2.0 * cos_w0,
            1.0 - alpha / a,
        )
    }

    fn normalized(b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) -> Self {
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Magnitude response at `frequency_hz`, used to sanity-check a tuning.
    pub fn magnitude_at(&self, frequency_hz: f32, sample_rate: u32) -> f32 {
        let w = 2.0 * PI * frequency_hz / sample_rate as f32;
        let (cos1, sin1) = (w.cos(), w.sin());
        let (cos2, sin2) = ((2.0 * w).cos(), (2.0 * w).sin());

        let num_re = self.b0 + self.b1 * cos1 + self.b2 * cos2;
        let num_im = -(self.b1 * sin1 + self.b2 * sin2);
        let den_re = 1.0 + self.a1 * cos1 + self.a2 * cos2;
        let den_im = -(self.a1 * sin1 + self.a2 * sin2);

        ((num_re * num_re + num_im * num_im) / (den_re * den_re + den_im * den_im)).sqrt()
    }
}

/// One biquad stage in transposed direct form II.
#[derive(Debug, Clone, Default)]
pub struct Biquad {
    coefficients: BiquadCoefficients,
    z1: f32,
    z2: f32,
}

impl Biquad {
    pub fn new(coefficients: BiquadCoefficients) -> Self {
        Self {
            coefficients,
            z1: 0.0,
            z2: 0.0,
        }
    }

    /// Replaces the coefficients, keeping the delay line.
    pub fn set_coefficients(&mut self, coefficients: BiquadCoefficients) {
        self.coefficients = coefficients;
    }

    pub fn coefficients(&self) -> BiquadCoefficients {
        self.coefficients
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let c = &self.coefficients;
        let output = c.b0 * input + self.z1;
        self.z1 = c.b1 * input - c.a1 * output + self.z2;
        self.z2 = c.b2 * input - c.a2 * output;

        // Flush denormals and recover from a blown-up state
        if !output.is_finite() {
            self.reset();
            return 0.0;
        }
        if self.z1.abs() < 1e-20 {
            self.z1 = 0.0;
        }
        if self.z2.abs() < 1e-20 {
            self.z2 = 0.0;
        }

        output
    }

    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 48_000;

    #[test]
    fn test_low_pass_passes_dc_and_cuts_highs() {
        let c = BiquadCoefficients::low_pass(3000.0, 0.707, RATE);
        assert!((c.magnitude_at(10.0, RATE) - 1.0).abs() < 0.01);
        assert!(c.magnitude_at(15_000.0, RATE) < 0.1);
    }

    #[test]
    fn test_high_pass_cuts_lows() {
        let c = BiquadCoefficients::high_pass(250.0, 0.707, RATE);
        assert!(c.magnitude_at(20.0, RATE) < 0.05);
        assert!((c.magnitude_at(10_000.0, RATE) - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_peaking_boosts_centre() {
        let c = BiquadCoefficients::peaking(800.0, 1.5, 6.0, RATE);
        let expected = 10.0_f32.powf(6.0 / 20.0);
        assert!((c.magnitude_at(800.0, RATE) - expected).abs() < 0.05);
        assert!((c.magnitude_at(20.0, RATE) - 1.0).abs() < 0.05);
    }

    #[test]
    fn test_cutoff_above_nyquist_stays_stable() {
        let c = BiquadCoefficients::low_pass(8000.0, 0.8, 8000);
        let mut filter = Biquad::new(c);
        let mut last = 0.0;
        for _ in 0..10_000 {
            last = filter.process(1.0);
        }
        assert!(last.is_finite());
    }

    #[test]
    fn test_set_coefficients_keeps_state() {
        let mut filter = Biquad::new(BiquadCoefficients::low_pass(1000.0, 0.7, RATE));
        for _ in 0..64 {
            filter.process(0.5);
        }
        filter.set_coefficients(BiquadCoefficients::low_pass(2000.0, 0.7, RATE));
        // A fresh filter would start from zero; the retuned one continues near the input level.
        assert!(filter.process(0.5) > 0.3);
    }

    #[test]
    fn test_default_is_identity() {
        let mut filter = Biquad::default();
        assert_eq!(filter.process(0.25), 0.25);
        assert_eq!(filter.process(-0.75), -0.75);
    }
}
