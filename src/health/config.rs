use serde::Deserialize;

use crate::models::Severity;

/// Default sentinel magnitude: readings beyond this are ADC faults, not measurements.
pub const DEFAULT_SENTINEL_MAGNITUDE: f64 = 1e10;

/// Rate thresholds (percent) for one detection category.
/// critical if rate > critical_rate, warning if rate > warning_rate, info otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct EscalationRule {
    pub warning_rate: f64,
    pub critical_rate: f64,
}

impl EscalationRule {
    pub const fn new(warning_rate: f64, critical_rate: f64) -> Self {
        Self {
            warning_rate,
            critical_rate,
        }
    }

    pub fn classify(&self, rate_percent: f64) -> Severity {
        if rate_percent > self.critical_rate {
            Severity::Critical
        } else if rate_percent > self.warning_rate {
            Severity::Warning
        } else {
            Severity::Info
        }
    }

    fn validate(&self, key: &str) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.warning_rate >= 0.0 && self.warning_rate <= self.critical_rate,
            "analysis.{key} must satisfy 0 <= warning_rate <= critical_rate, got {} / {}",
            self.warning_rate,
            self.critical_rate
        );
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub temperature_delta_threshold: f64,
    pub voltage_delta_threshold: f64,
    pub current_delta_threshold: f64,
    /// Decimal places deltas and thresholds are rounded to before the strict comparison.
    pub delta_decimals: u32,
    /// Readings beyond this are sensor faults. Also applied to the report statistics.
    pub sentinel_magnitude: f64,
    pub communication: EscalationRule,
    pub hall_pulse: EscalationRule,
    pub spikes: EscalationRule,
    pub invalid_readings: EscalationRule,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            temperature_delta_threshold: 5.0,
            voltage_delta_threshold: 0.5,
            current_delta_threshold: 0.1,
            delta_decimals: 9,
            sentinel_magnitude: DEFAULT_SENTINEL_MAGNITUDE,
            communication: EscalationRule::new(0.0, 25.0),
            hall_pulse: EscalationRule::new(0.0, 10.0),
            spikes: EscalationRule::new(1.0, 10.0),
            invalid_readings: EscalationRule::new(0.0, 5.0),
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        for (key, v) in [
            ("temperature_delta_threshold", self.temperature_delta_threshold),
            ("voltage_delta_threshold", self.voltage_delta_threshold),
            ("current_delta_threshold", self.current_delta_threshold),
            ("sentinel_magnitude", self.sentinel_magnitude),
        ] {
            anyhow::ensure!(
                v.is_finite() && v > 0.0,
                "analysis.{key} must be > 0, got {v}"
            );
        }
        anyhow::ensure!(
            self.delta_decimals <= 15,
            "analysis.delta_decimals must be <= 15, got {}",
            self.delta_decimals
        );
        self.communication.validate("communication")?;
        self.hall_pulse.validate("hall_pulse")?;
        self.spikes.validate("spikes")?;
        self.invalid_readings.validate("invalid_readings")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_uses_strict_thresholds() {
        let rule = EscalationRule::new(0.0, 25.0);
        assert_eq!(rule.classify(0.0), Severity::Info);
        assert_eq!(rule.classify(0.01), Severity::Warning);
        assert_eq!(rule.classify(25.0), Severity::Warning);
        assert_eq!(rule.classify(25.01), Severity::Critical);
    }

    #[test]
    fn validate_rejects_inverted_rule() {
        let config = AnalysisConfig {
            spikes: EscalationRule::new(20.0, 10.0),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("analysis.spikes"));
    }
}
