//! Text readout for the most recent sample.

use chrono::{DateTime, Local};

use crate::telemetry::{LatencyMode, PowerSample};

/// The three readout lines plus the local time of the sample they show.
#[derive(Debug, Clone, PartialEq)]
pub struct Readout {
    pub current: String,
    pub voltage: String,
    pub power: String,
    pub updated_at: Option<DateTime<Local>>,
}

impl Readout {
    /// Placeholder shown before the first sample and after a failed tick.
    pub fn blank() -> Self {
        Self {
            current: "Current: -- mA".to_string(),
            voltage: "Voltage: -- mV".to_string(),
            power: "Power: -- mW".to_string(),
            updated_at: None,
        }
    }

    /// Values are shown as received; only the unit label depends on the mode.
    pub fn from_sample(sample: &PowerSample, mode: LatencyMode, updated_at: DateTime<Local>) -> Self {
        let (a, v, w) = match mode {
            LatencyMode::High => ("A", "V", "W"),
            LatencyMode::Low => ("mA", "mV", "mW"),
        };
        Self {
            current: format!("Current: {:.2} {}", sample.current, a),
            voltage: format!("Voltage: {:.2} {}", sample.voltage, v),
            power: format!("Power: {:.2} {}", sample.power, w),
            updated_at: Some(updated_at),
        }
    }

    pub fn updated_text(&self) -> String {
        match self.updated_at {
            Some(at) => format!("Last update: {}", at.format("%H:%M:%S")),
            None => "Last update: --".to_string(),
        }
    }
}

impl Default for Readout {
    fn default() -> Self {
        Self::blank()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 14, 3, 9).unwrap()
    }

    #[test]
    fn blank_uses_milli_units() {
        let r = Readout::blank();
        assert_eq!(r.current, "Current: -- mA");
        assert_eq!(r.voltage, "Voltage: -- mV");
        assert_eq!(r.power, "Power: -- mW");
        assert_eq!(r.updated_text(), "Last update: --");
    }

    #[test]
    fn high_latency_uses_base_units() {
        let r = Readout::from_sample(&PowerSample::new(1.5, 12.0, 18.004), LatencyMode::High, at());
        assert_eq!(r.current, "Current: 1.50 A");
        assert_eq!(r.voltage, "Voltage: 12.00 V");
        assert_eq!(r.power, "Power: 18.00 W");
        assert_eq!(r.updated_text(), "Last update: 14:03:09");
    }

    #[test]
    fn low_latency_labels_milli_units_without_scaling() {
        let r = Readout::from_sample(&PowerSample::new(0.5, -1.2, 12.34), LatencyMode::Low, at());
        assert_eq!(r.current, "Current: 0.50 mA");
        assert_eq!(r.voltage, "Voltage: -1.20 mV");
        assert_eq!(r.power, "Power: 12.34 mW");
    }
}
