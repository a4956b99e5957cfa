//! Live calibration of the vocal filter chain.
//!
//! The panel edits a copy of the chain's [`FilterParameters`] one value at a
//! time, clamps every edit to the parameter's range and pushes the result to
//! the running chain immediately. The current values can be exported as a
//! report that doubles as a `[filters]` table for the config file.

use std::fmt::Write as _;
use std::ops::RangeInclusive;

use crate::graph::{FilterChain, FilterParameters};

/// One tunable parameter of the vocal chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    HighpassFreq,
    HighpassQ,
    LowpassFreq,
    LowpassQ,
    PeakingFreq,
    PeakingQ,
    PeakingGain,
    VocalGain,
}

impl Param {
    pub const ALL: [Param; 8] = [
        Param::HighpassFreq,
        Param::HighpassQ,
        Param::LowpassFreq,
        Param::LowpassQ,
        Param::PeakingFreq,
        Param::PeakingQ,
        Param::PeakingGain,
        Param::VocalGain,
    ];

    /// Config key, as in the `[filters]` table.
    pub fn key(self) -> &'static str {
        match self {
            Self::HighpassFreq => "highpass_freq",
            Self::HighpassQ => "highpass_q",
            Self::LowpassFreq => "lowpass_freq",
            Self::LowpassQ => "lowpass_q",
            Self::PeakingFreq => "peaking_freq",
            Self::PeakingQ => "peaking_q",
            Self::PeakingGain => "peaking_gain",
            Self::VocalGain => "vocal_gain",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::HighpassFreq => "High-pass frequency",
            Self::HighpassQ => "High-pass Q",
            Self::LowpassFreq => "Low-pass frequency",
            Self::LowpassQ => "Low-pass Q",
            Self::PeakingFreq => "Presence frequency",
            Self::PeakingQ => "Presence Q",
            Self::PeakingGain => "Presence gain",
            Self::VocalGain => "Vocal gain",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Self::HighpassFreq | Self::LowpassFreq | Self::PeakingFreq => "Hz",
            Self::PeakingGain => "dB",
            Self::VocalGain => "x",
            Self::HighpassQ | Self::LowpassQ | Self::PeakingQ => "",
        }
    }

    pub fn range(self) -> RangeInclusive<f32> {
        match self {
            Self::HighpassFreq => 50.0..=500.0,
            Self::LowpassFreq => 1000.0..=8000.0,
            Self::PeakingFreq => 200.0..=2000.0,
            Self::HighpassQ | Self::LowpassQ | Self::PeakingQ => 0.1..=5.0,
            Self::PeakingGain => 0.0..=10.0,
            Self::VocalGain => 0.5..=10.0,
        }
    }

    /// Amount one key press moves the value; coarse nudges move ten times as far.
    pub fn step(self) -> f32 {
        match self {
            Self::HighpassFreq | Self::PeakingFreq => 1.0,
            Self::LowpassFreq => 10.0,
            Self::HighpassQ | Self::LowpassQ | Self::PeakingQ | Self::VocalGain => 0.1,
            Self::PeakingGain => 0.5,
        }
    }

    fn decimals(self) -> usize {
        match self {
            Self::HighpassFreq | Self::LowpassFreq | Self::PeakingFreq => 0,
            _ => 1,
        }
    }

    pub fn get(self, params: &FilterParameters) -> f32 {
        match self {
            Self::HighpassFreq => params.highpass_freq,
            Self::HighpassQ => params.highpass_q,
            Self::LowpassFreq => params.lowpass_freq,
            Self::LowpassQ => params.lowpass_q,
            Self::PeakingFreq => params.peaking_freq,
            Self::PeakingQ => params.peaking_q,
            Self::PeakingGain => params.peaking_gain,
            Self::VocalGain => params.vocal_gain,
        }
    }

    /// Stores `value` clamped to the parameter's range.
    pub fn set(self, params: &mut FilterParameters, value: f32) {
        let range = self.range();
        let value = if value.is_finite() {
            value.clamp(*range.start(), *range.end())
        } else {
            self.get(&FilterParameters::default())
        };
        let slot = match self {
            Self::HighpassFreq => &mut params.highpass_freq,
            Self::HighpassQ => &mut params.highpass_q,
            Self::LowpassFreq => &mut params.lowpass_freq,
            Self::LowpassQ => &mut params.lowpass_q,
            Self::PeakingFreq => &mut params.peaking_freq,
            Self::PeakingQ => &mut params.peaking_q,
            Self::PeakingGain => &mut params.peaking_gain,
            Self::VocalGain => &mut params.vocal_gain,
        };
        *slot = value;
    }

    /// Formats `value` with the parameter's precision and unit.
    pub fn display(self, value: f32) -> String {
        let unit = self.unit();
        if unit.is_empty() {
            format!("{:.*}", self.decimals(), value)
        } else {
            format!("{:.*} {}", self.decimals(), value, unit)
        }
    }
}

/// Returns `params` with every value clamped to its range.
pub fn clamped(params: FilterParameters) -> FilterParameters {
    let mut out = params;
    for param in Param::ALL {
        param.set(&mut out, param.get(&params));
    }
    out
}

/// Human-readable listing of all parameters, valid as a config `[filters]` table.
pub fn report(params: &FilterParameters) -> String {
    let mut out = String::from("# vocalviz vocal filter calibration\n[filters]\n");
    for param in Param::ALL {
        let range = param.range();
        // Writing to a String cannot fail.
        let _ = writeln!(
            out,
            "{} = {:.2}  # {}, {}..{}",
            param.key(),
            param.get(params),
            param.label(),
            range.start(),
            range.end()
        );
    }
    out
}

/// Interactive editor bound to a live filter chain.
#[derive(Debug)]
pub struct CalibrationPanel {
    chain: FilterChain,
    params: FilterParameters,
    selected: usize,
    status: Option<String>,
}

impl CalibrationPanel {
    /// Opens the panel on the chain's current parameters.
    pub fn new(chain: FilterChain) -> Self {
        let params = clamped(chain.parameters());
        Self {
            chain,
            params,
            selected: 0,
            status: None,
        }
    }

    pub fn params(&self) -> FilterParameters {
        self.params
    }

    pub fn selected(&self) -> Param {
        Param::ALL[self.selected]
    }

    pub fn select_next(&mut self) {
        self.selected = (self.selected + 1) % Param::ALL.len();
    }

    pub fn select_prev(&mut self) {
        self.selected = (self.selected + Param::ALL.len() - 1) % Param::ALL.len();
    }

    /// Moves the selected parameter by `steps` UI steps (×10 when `coarse`).
    pub fn nudge(&mut self, steps: i32, coarse: bool) {
        let param = self.selected();
        let step = param.step() * if coarse { 10.0 } else { 1.0 };
        let raw = param.get(&self.params) + step * steps as f32;
        // Snap to the step grid so repeated nudges don't accumulate float noise.
        let snapped = (raw / param.step()).round() * param.step();
        param.set(&mut self.params, snapped);
        self.apply();
    }

    /// Restores the default parameters.
    pub fn reset(&mut self) {
        self.params = FilterParameters::default();
        self.apply();
        self.set_status("Defaults restored");
    }

    pub fn report(&self) -> String {
        report(&self.params)
    }

    /// Rows for display: parameter, formatted value, selected flag.
    pub fn rows(&self) -> Vec<(Param, String, bool)> {
        Param::ALL
            .iter()
            .enumerate()
            .map(|(i, &p)| (p, p.display(p.get(&self.params)), i == self.selected))
            .collect()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    fn apply(&mut self) {
        self.chain.apply(self.params);
        self.status = None;
        tracing::debug!("Filter parameters updated: {:?}", self.params);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn panel() -> CalibrationPanel {
        let (chain, _vocal) = FilterChain::build(FilterParameters::default(), 48_000);
        CalibrationPanel::new(chain)
    }

    #[test]
    fn test_nudge_applies_to_chain() {
        let (chain, _vocal) = FilterChain::build(FilterParameters::default(), 48_000);
        let mut panel = CalibrationPanel::new(chain.clone());

        panel.nudge(5, false);
        assert_eq!(panel.params().highpass_freq, 255.0);
        assert_eq!(chain.parameters().highpass_freq, 255.0);
    }

    #[test]
    fn test_nudge_clamps_to_range() {
        let mut panel = panel();
        panel.nudge(-1000, true);
        assert_eq!(panel.params().highpass_freq, 50.0);

        panel.select_next();
        panel.nudge(1000, true);
        assert_eq!(panel.params().highpass_q, 5.0);
    }

    #[test]
    fn test_coarse_lowpass_moves_by_hundred() {
        let mut panel = panel();
        panel.select_next();
        panel.select_next();
        assert_eq!(panel.selected(), Param::LowpassFreq);
        panel.nudge(1, true);
        assert_eq!(panel.params().lowpass_freq, 3100.0);
        panel.nudge(-1, false);
        assert_eq!(panel.params().lowpass_freq, 3090.0);
    }

    #[test]
    fn test_fine_steps_stay_on_grid() {
        let mut panel = panel();
        for _ in 0..7 {
            panel.select_next();
        }
        assert_eq!(panel.selected(), Param::VocalGain);
        for _ in 0..13 {
            panel.nudge(1, false);
        }
        assert!((panel.params().vocal_gain - 4.3).abs() < 1e-5);
        assert_eq!(panel.rows()[7].1, "4.3 x");
    }

    #[test]
    fn test_selection_wraps() {
        let mut panel = panel();
        panel.select_prev();
        assert_eq!(panel.selected(), Param::VocalGain);
        panel.select_next();
        assert_eq!(panel.selected(), Param::HighpassFreq);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut panel = panel();
        panel.nudge(40, true);
        panel.reset();
        assert_eq!(panel.params(), FilterParameters::default());
        assert_eq!(panel.status(), Some("Defaults restored"));
    }

    #[test]
    fn test_clamped_fixes_out_of_range_values() {
        let params = FilterParameters {
            highpass_freq: 10.0,
            vocal_gain: f32::NAN,
            peaking_gain: 99.0,
            ..FilterParameters::default()
        };
        let fixed = clamped(params);
        assert_eq!(fixed.highpass_freq, 50.0);
        assert_eq!(fixed.vocal_gain, 3.0);
        assert_eq!(fixed.peaking_gain, 10.0);
    }

    #[test]
    fn test_report_lists_every_parameter_as_toml() {
        #[derive(Deserialize)]
        struct Doc {
            filters: FilterParameters,
        }

        let mut params = FilterParameters::default();
        params.lowpass_freq = 4500.0;
        params.peaking_gain = 6.5;
        let text = report(&params);

        for param in Param::ALL {
            assert!(text.contains(param.key()), "missing {}", param.key());
        }
        let doc: Doc = toml::from_str(&text).unwrap();
        assert_eq!(doc.filters, params);
    }
}
