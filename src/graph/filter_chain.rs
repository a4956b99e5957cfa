//! Vocal-band filter cascade.
//!
//! The chain is high-pass → low-pass → peaking → gain, fed with the mono mix
//! of the source. The UI side holds a [`FilterChain`] handle; the audio thread
//! owns the matching [`VocalChain`] and picks up new parameters at the start of
//! each block. Topology never changes after construction.

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::biquad::{Biquad, BiquadCoefficients};

/// Tunable parameters of the vocal-isolation chain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParameters {
    /// High-pass cutoff in Hz
    pub highpass_freq: f32,
    pub highpass_q: f32,
    /// Low-pass cutoff in Hz
    pub lowpass_freq: f32,
    pub lowpass_q: f32,
    /// Centre of the presence boost in Hz
    pub peaking_freq: f32,
    pub peaking_q: f32,
    /// Presence boost in dB
    pub peaking_gain: f32,
    /// Linear gain applied after the filters
    pub vocal_gain: f32,
}

impl Default for FilterParameters {
    fn default() -> Self {
        Self {
            highpass_freq: 250.0,
            highpass_q: 0.8,
            lowpass_freq: 3000.0,
            lowpass_q: 0.8,
            peaking_freq: 800.0,
            peaking_q: 1.5,
            peaking_gain: 4.0,
            vocal_gain: 3.0,
        }
    }
}

/// Control handle for a live filter chain.
///
/// Cloning the handle shares the same chain.
#[derive(Debug, Clone)]
pub struct FilterChain {
    shared: Arc<ArcSwap<FilterParameters>>,
}

impl FilterChain {
    /// Builds the cascade for `sample_rate` and returns the control handle plus
    /// the processing half that belongs on the audio thread.
    pub fn build(params: FilterParameters, sample_rate: u32) -> (Self, VocalChain) {
        let applied = Arc::new(params);
        let shared = Arc::new(ArcSwap::new(Arc::clone(&applied)));

        let mut chain = VocalChain {
            highpass: Biquad::default(),
            lowpass: Biquad::default(),
            peaking: Biquad::default(),
            gain: 1.0,
            sample_rate,
            shared: Arc::clone(&shared),
            applied,
        };
        chain.retune();

        tracing::debug!(
            "Vocal filter chain built at {}Hz: {:?}",
            sample_rate,
            params
        );

        (Self { shared }, chain)
    }

    /// Publishes new parameters; the audio thread applies them in place.
    pub fn apply(&self, params: FilterParameters) {
        self.shared.store(Arc::new(params));
        tracing::debug!("Filter parameters updated: {:?}", params);
    }

    /// Returns the most recently published parameters.
    pub fn parameters(&self) -> FilterParameters {
        **self.shared.load()
    }
}

/// Audio-thread half of the filter chain.
#[derive(Debug)]
pub struct VocalChain {
    highpass: Biquad,
    lowpass: Biquad,
    peaking: Biquad,
    gain: f32,
    sample_rate: u32,
    shared: Arc<ArcSwap<FilterParameters>>,
    applied: Arc<FilterParameters>,
}

impl VocalChain {
    /// Picks up parameters published since the last call.
    ///
    /// Returns `true` if the stages were retuned.
    pub fn refresh(&mut self) -> bool {
        let latest = self.shared.load();
        if Arc::ptr_eq(&*latest, &self.applied) {
            return false;
        }
        self.applied = Arc::clone(&*latest);
        drop(latest);
        self.retune();
        true
    }

    fn retune(&mut self) {
        let p = *self.applied;
        let rate = self.sample_rate;

        self.highpass
            .set_coefficients(BiquadCoefficients::high_pass(p.highpass_freq, p.highpass_q, rate));
        self.lowpass
            .set_coefficients(BiquadCoefficients::low_pass(p.lowpass_freq, p.lowpass_q, rate));
        self.peaking.set_coefficients(BiquadCoefficients::peaking(
            p.peaking_freq,
            p.peaking_q,
            p.peaking_gain,
            rate,
        ));
        self.gain = p.vocal_gain;
    }

    /// Runs one mono sample through the cascade.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let filtered = self
            .peaking
            .process(self.lowpass.process(self.highpass.process(input)));
        filtered * self.gain
    }

    pub fn parameters(&self) -> FilterParameters {
        *self.applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 48_000;

    fn sine(freq: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / RATE as f32).sin() * 0.5)
            .collect()
    }

    fn peak_after_settling(chain: &mut VocalChain, input: &[f32]) -> f32 {
        let mut peak = 0.0_f32;
        for (i, &x) in input.iter().enumerate() {
            let y = chain.process(x);
            if i > input.len() / 2 {
                peak = peak.max(y.abs());
            }
        }
        peak
    }

    #[test]
    fn test_chain_favours_vocal_band() {
        let (_handle, mut chain) = FilterChain::build(FilterParameters::default(), RATE);
        let voice = peak_after_settling(&mut chain, &sine(800.0, 9600));

        let (_handle, mut chain) = FilterChain::build(FilterParameters::default(), RATE);
        let bass = peak_after_settling(&mut chain, &sine(50.0, 9600));

        let (_handle, mut chain) = FilterChain::build(FilterParameters::default(), RATE);
        let hiss = peak_after_settling(&mut chain, &sine(15_000.0, 9600));

        assert!(voice > bass * 5.0, "voice {voice} bass {bass}");
        assert!(voice > hiss * 5.0, "voice {voice} hiss {hiss}");
    }

    #[test]
    fn test_apply_updates_in_place() {
        let (handle, mut chain) = FilterChain::build(FilterParameters::default(), RATE);
        assert!(!chain.refresh());

        let tuned = FilterParameters {
            vocal_gain: 6.0,
            peaking_gain: 8.5,
            ..FilterParameters::default()
        };
        handle.apply(tuned);

        assert_eq!(handle.parameters(), tuned);
        assert!(chain.refresh());
        assert_eq!(chain.parameters(), tuned);
        assert!(!chain.refresh());
    }

    #[test]
    fn test_gain_scales_output() {
        let quiet = FilterParameters {
            vocal_gain: 1.0,
            ..FilterParameters::default()
        };
        let loud = FilterParameters {
            vocal_gain: 4.0,
            ..FilterParameters::default()
        };
        let input = sine(800.0, 4800);

        let (_h, mut a) = FilterChain::build(quiet, RATE);
        let (_h, mut b) = FilterChain::build(loud, RATE);
        let pa = peak_after_settling(&mut a, &input);
        let pb = peak_after_settling(&mut b, &input);
        assert!((pb / pa - 4.0).abs() < 0.01);
    }

    #[test]
    fn test_parameters_deserialize_with_defaults() {
        let params: FilterParameters = toml::from_str("highpass_freq = 120.0").unwrap();
        assert_eq!(params.highpass_freq, 120.0);
        assert_eq!(params.lowpass_freq, 3000.0);
    }
}
