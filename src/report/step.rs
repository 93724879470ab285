use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Timestamp format of step lines (millisecond precision)
pub const STEP_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Closed set of step severities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
    Screenshot,
    Data,
    Report,
}

impl Severity {
    /// Bracketed tag written to the aggregate file
    ///
    /// Log consumers grep for these exact strings.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "ИНФО",
            Severity::Success => "УСПЕХ",
            Severity::Warning => "ПРЕДУПРЕЖДЕНИЕ",
            Severity::Error => "ОШИБКА",
            Severity::Screenshot => "СКРИНШОТ",
            Severity::Data => "ДАННЫЕ",
            Severity::Report => "ОТЧЕТ",
        }
    }

    pub fn all() -> [Severity; 7] {
        [
            Severity::Info,
            Severity::Success,
            Severity::Warning,
            Severity::Error,
            Severity::Screenshot,
            Severity::Data,
            Severity::Report,
        ]
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One timestamped entry of a test report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub timestamp: DateTime<Local>,
    pub severity: Severity,
    pub message: String,
}

impl Step {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            severity,
            message: message.into(),
        }
    }

    /// `[YYYY-MM-DD HH:MM:SS.fff] [TAG] message`
    pub fn line(&self) -> String {
        format!(
            "[{}] [{}] {}",
            self.timestamp.format(STEP_TIMESTAMP_FORMAT),
            self.severity.label(),
            self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_step_line_format() {
        let step = Step {
            timestamp: Local.with_ymd_and_hms(2024, 3, 5, 9, 7, 2).unwrap(),
            severity: Severity::Warning,
            message: "ПРЕДУПРЕЖДЕНИЕ: fallback".to_string(),
        };
        assert_eq!(step.line(), "[2024-03-05 09:07:02.000] [ПРЕДУПРЕЖДЕНИЕ] ПРЕДУПРЕЖДЕНИЕ: fallback");
    }

    #[test]
    fn test_labels_are_unique() {
        let labels: std::collections::HashSet<_> = Severity::all().iter().map(|s| s.label()).collect();
        assert_eq!(labels.len(), 7);
        assert_eq!(Severity::Error.to_string(), "ОШИБКА");
    }
}
