use clap::ValueEnum;

use crate::scoring::round_half_up;

pub const SGPA_MAX: f64 = 10.0;
pub const PERCENT_MAX: f64 = 100.0;

/// Scale imported subject marks are written on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum MarksScale {
    #[default]
    Percent,
    Sgpa,
}

impl MarksScale {
    /// `None` when an SGPA mark lies outside 0-10. Percent marks pass through
    /// unchanged, including values above 100.
    pub fn to_percent(self, marks: f64) -> Option<f64> {
        match self {
            MarksScale::Percent => Some(marks),
            MarksScale::Sgpa if (0.0..=SGPA_MAX).contains(&marks) => Some(sgpa_to_percent(marks)),
            MarksScale::Sgpa => None,
        }
    }
}

/// Percent to SGPA, rounded to two decimals. Clamped to 0-10 for display.
pub fn percent_to_sgpa(percent: f64) -> f64 {
    let sgpa = percent.clamp(0.0, PERCENT_MAX) / PERCENT_MAX * SGPA_MAX;
    round_half_up(sgpa * 100.0) / 100.0
}

/// SGPA to percent, rounded to one decimal. Clamped to 0-100; imports go
/// through `MarksScale::to_percent`, which rejects out-of-range marks first.
pub fn sgpa_to_percent(sgpa: f64) -> f64 {
    let percent = sgpa.clamp(0.0, SGPA_MAX) / SGPA_MAX * PERCENT_MAX;
    round_half_up(percent * 10.0) / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_between_scales() {
        assert_eq!(percent_to_sgpa(70.0), 7.0);
        assert_eq!(percent_to_sgpa(85.5), 8.55);
        assert_eq!(sgpa_to_percent(7.0), 70.0);
        assert_eq!(sgpa_to_percent(8.55), 85.5);
    }

    #[test]
    fn marks_scale_converts_only_sgpa() {
        assert_eq!(MarksScale::Percent.to_percent(72.0), Some(72.0));
        assert_eq!(MarksScale::Percent.to_percent(130.0), Some(130.0));
        assert_eq!(MarksScale::Sgpa.to_percent(7.2), Some(72.0));
        assert_eq!(MarksScale::Sgpa.to_percent(10.0), Some(100.0));
    }

    #[test]
    fn sgpa_marks_outside_range_are_rejected() {
        assert_eq!(MarksScale::Sgpa.to_percent(85.0), None);
        assert_eq!(MarksScale::Sgpa.to_percent(-3.0), None);
    }

    #[test]
    fn clamps_out_of_range_values() {
        assert_eq!(percent_to_sgpa(130.0), 10.0);
        assert_eq!(percent_to_sgpa(-4.0), 0.0);
        assert_eq!(sgpa_to_percent(12.0), 100.0);
    }
}
