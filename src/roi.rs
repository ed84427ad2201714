//! ROI calculator arithmetic
//!
//! Four slider inputs feed a fixed formula:
//! `missed = round(leads × missed%)`, `lost = missed × job value × close%`,
//! `recovered = lost × 0.8`.

use crate::config::MetricsConfig;
use std::ops::RangeInclusive;

/// Bounds and step of one slider
#[derive(Clone, Debug, PartialEq)]
pub struct SliderBounds {
    pub range: RangeInclusive<u32>,
    pub step: u32,
}

impl SliderBounds {
    const fn new(min: u32, max: u32, step: u32) -> Self {
        Self {
            range: min..=max,
            step,
        }
    }

    /// Clamp a value into range and snap it onto the step grid
    pub fn clamp(&self, value: u32) -> u32 {
        let (min, max) = (*self.range.start(), *self.range.end());
        let value = value.clamp(min, max);
        if self.step <= 1 {
            return value;
        }
        let offset = value - min;
        let snapped = min + ((offset + self.step / 2) / self.step) * self.step;
        snapped.min(max)
    }
}

pub const LEADS_BOUNDS: SliderBounds = SliderBounds::new(10, 200, 1);
pub const MISSED_RATE_BOUNDS: SliderBounds = SliderBounds::new(0, 80, 1);
pub const JOB_VALUE_BOUNDS: SliderBounds = SliderBounds::new(10_000, 500_000, 5_000);
pub const CLOSE_RATE_BOUNDS: SliderBounds = SliderBounds::new(1, 50, 1);

/// Share of lost revenue the agent wins back
pub const RECOVERY_FACTOR: f64 = 0.8;

/// The four ROI slider values; percentages are whole numbers
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoiInputs {
    pub monthly_leads: u32,
    pub missed_rate_pct: u32,
    pub avg_job_value: u32,
    pub close_rate_pct: u32,
}

impl Default for RoiInputs {
    fn default() -> Self {
        Self::from_metrics(&MetricsConfig::default())
    }
}

impl RoiInputs {
    /// Starting slider positions from the deployment metrics
    pub fn from_metrics(metrics: &MetricsConfig) -> Self {
        let pct = |fraction: f64| (fraction * 100.0).round() as u32;
        Self {
            monthly_leads: metrics.default_leads,
            missed_rate_pct: pct(metrics.default_missed_rate),
            avg_job_value: metrics.avg_job_value,
            close_rate_pct: pct(metrics.default_close_rate),
        }
        .clamped()
    }

    /// Force every input into its slider bounds
    pub fn clamped(&self) -> Self {
        Self {
            monthly_leads: LEADS_BOUNDS.clamp(self.monthly_leads),
            missed_rate_pct: MISSED_RATE_BOUNDS.clamp(self.missed_rate_pct),
            avg_job_value: JOB_VALUE_BOUNDS.clamp(self.avg_job_value),
            close_rate_pct: CLOSE_RATE_BOUNDS.clamp(self.close_rate_pct),
        }
    }

    pub fn estimate(&self) -> RoiEstimate {
        RoiEstimate::compute(self)
    }
}

/// Result of the ROI formula
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoiEstimate {
    pub missed_leads: u32,
    pub lost_revenue: f64,
    pub recovered_revenue: f64,
}

impl RoiEstimate {
    pub fn compute(inputs: &RoiInputs) -> Self {
        // Multiply whole numbers first so the percentage division is the only inexact step.
        let missed_leads =
            ((inputs.monthly_leads as f64 * inputs.missed_rate_pct as f64) / 100.0).round() as u32;
        let lost_revenue =
            (missed_leads as f64 * inputs.avg_job_value as f64 * inputs.close_rate_pct as f64)
                / 100.0;
        let recovered_revenue = lost_revenue * RECOVERY_FACTOR;

        Self {
            missed_leads,
            lost_revenue,
            recovered_revenue,
        }
    }
}

/// Format as whole US dollars, e.g. `$172,800`
pub fn format_usd(value: f64) -> String {
    let rounded = value.round();
    let negative = rounded < 0.0;
    let digits = format!("{}", rounded.abs() as u64);

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> RoiInputs {
        RoiInputs {
            monthly_leads: 40,
            missed_rate_pct: 30,
            avg_job_value: 120_000,
            close_rate_pct: 15,
        }
    }

    #[test]
    fn test_reference_scenario() {
        let estimate = scenario().estimate();
        assert_eq!(estimate.missed_leads, 12);
        assert_eq!(estimate.lost_revenue, 216_000.0);
        assert_eq!(estimate.recovered_revenue, 172_800.0);
        assert_eq!(format_usd(estimate.lost_revenue), "$216,000");
        assert_eq!(format_usd(estimate.recovered_revenue), "$172,800");
    }

    #[test]
    fn test_missed_leads_rounded_before_multiplying() {
        // 25 × 30% = 7.5 leads, rounded to 8 before it reaches the revenue math
        let inputs = RoiInputs {
            monthly_leads: 25,
            ..scenario()
        };
        let estimate = inputs.estimate();
        assert_eq!(estimate.missed_leads, 8);
        assert_eq!(estimate.lost_revenue, 144_000.0);
    }

    #[test]
    fn test_defaults_match_metrics() {
        let inputs = RoiInputs::default();
        assert_eq!(inputs, scenario());
    }

    #[test]
    fn test_inputs_are_clamped_to_slider_bounds() {
        let wild = RoiInputs {
            monthly_leads: 5,
            missed_rate_pct: 95,
            avg_job_value: 1_000_000,
            close_rate_pct: 0,
        };
        let clamped = wild.clamped();
        assert_eq!(clamped.monthly_leads, 10);
        assert_eq!(clamped.missed_rate_pct, 80);
        assert_eq!(clamped.avg_job_value, 500_000);
        assert_eq!(clamped.close_rate_pct, 1);
    }

    #[test]
    fn test_recovery_is_a_fixed_share_of_lost_revenue() {
        let cases = [
            scenario(),
            RoiInputs {
                monthly_leads: 200,
                missed_rate_pct: 80,
                avg_job_value: 500_000,
                close_rate_pct: 50,
            },
            RoiInputs {
                monthly_leads: 17,
                missed_rate_pct: 33,
                avg_job_value: 45_000,
                close_rate_pct: 7,
            },
            RoiInputs {
                monthly_leads: 10,
                missed_rate_pct: 0,
                avg_job_value: 10_000,
                close_rate_pct: 1,
            },
        ];
        for inputs in cases {
            let estimate = inputs.estimate();
            assert_eq!(estimate.recovered_revenue, estimate.lost_revenue * 0.8);
        }
    }

    #[test]
    fn test_job_value_snaps_to_step() {
        assert_eq!(JOB_VALUE_BOUNDS.clamp(122_400), 120_000);
        assert_eq!(JOB_VALUE_BOUNDS.clamp(122_600), 125_000);
    }

    #[test]
    fn test_zero_missed_rate() {
        let inputs = RoiInputs {
            missed_rate_pct: 0,
            ..scenario()
        };
        let estimate = inputs.estimate();
        assert_eq!(estimate.missed_leads, 0);
        assert_eq!(estimate.recovered_revenue, 0.0);
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(0.0), "$0");
        assert_eq!(format_usd(999.4), "$999");
        assert_eq!(format_usd(1_000.0), "$1,000");
        assert_eq!(format_usd(1_234_567.0), "$1,234,567");
        assert_eq!(format_usd(-2_500.0), "-$2,500");
    }
}
