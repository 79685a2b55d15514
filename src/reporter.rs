use serde::{Deserialize, Serialize};
use crate::{transformation_engine::TransformationError, validation::ValidationError};

/// Reporter for summarising a batch of decode calls in various formats
pub struct BatchReporter {
    output_format: ReportFormat,
}

/// Available output formats for batch reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum ReportFormat {
    Console,
    Json,
    Yaml,
}

/// Outcome of running many records through one root type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub operation: String,
    pub root_type: String,
    pub total: usize,
    pub succeeded: usize,
    pub failures: Vec<RecordFailure>,
    pub written: Vec<String>,
}

/// A record that could not be read, decoded or stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordFailure {
    pub source: String,
    pub message: String,
    pub validation: Option<ValidationError>,
}

impl BatchReport {
    pub fn new(operation: impl Into<String>, root_type: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            root_type: root_type.into(),
            ..Self::default()
        }
    }

    pub fn record_success(&mut self) {
        self.total += 1;
        self.succeeded += 1;
    }

    pub fn record_written(&mut self, path: impl Into<String>) {
        self.written.push(path.into());
    }

    pub fn record_failure(&mut self, source: impl Into<String>, error: &TransformationError) {
        self.total += 1;
        self.failures.push(RecordFailure {
            source: source.into(),
            message: error.to_string(),
            validation: error.as_validation().cloned(),
        });
    }

    /// Failures that happen outside the engine, e.g. unreadable files or fetch errors
    pub fn record_io_failure(&mut self, source: impl Into<String>, message: impl Into<String>) {
        self.total += 1;
        self.failures.push(RecordFailure {
            source: source.into(),
            message: message.into(),
            validation: None,
        });
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl BatchReporter {
    pub fn new() -> Self {
        Self {
            output_format: ReportFormat::Console,
        }
    }

    pub fn with_format(mut self, format: ReportFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Format the report according to the configured output format
    pub fn format_report(&self, report: &BatchReport) -> Result<String, ReportError> {
        match self.output_format {
            ReportFormat::Console => Ok(self.format_console_report(report)),
            ReportFormat::Json => serde_json::to_string_pretty(report)
                .map_err(|e| ReportError::SerializationError(e.to_string())),
            ReportFormat::Yaml => serde_yaml::to_string(report)
                .map_err(|e| ReportError::SerializationError(e.to_string())),
        }
    }

    fn format_console_report(&self, report: &BatchReport) -> String {
        let mut output = String::new();

        output.push_str(&format!("=== {} ({}) ===\n", report.operation, report.root_type));
        output.push_str(&format!("  total records: {}\n", report.total));
        output.push_str(&format!("  valid records: {}\n", report.succeeded));
        if !report.written.is_empty() {
            output.push_str(&format!("  files written: {}\n", report.written.len()));
        }

        if !report.failures.is_empty() {
            output.push_str(&format!("\nFailures ({}):\n", report.failed()));
            for failure in &report.failures {
                output.push_str(&format!("  ✗ {}: {}\n", failure.source, failure.message));
            }
        }

        output
    }
}

impl Default for BatchReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report_with_failure() -> BatchReport {
        let mut report = BatchReport::new("validate", "RoastData");
        report.record_success();
        report.record_written("temp/valid-roasts-1/a.json");

        let value = json!("hot");
        let error = TransformationError::Validation(
            ValidationError::new("an optional number", Some(&value))
                .with_key(Some("ambient"))
                .with_parent(Some("RoastData")),
        );
        report.record_failure("b.json", &error);
        report
    }

    #[test]
    fn test_reporter_defaults_to_console() {
        let reporter = BatchReporter::new();
        assert!(matches!(reporter.output_format, ReportFormat::Console));
    }

    #[test]
    fn test_reporter_with_format() {
        let reporter = BatchReporter::new().with_format(ReportFormat::Json);
        assert!(matches!(reporter.output_format, ReportFormat::Json));
    }

    #[test]
    fn test_batch_report_counts() {
        let mut report = report_with_failure();
        report.record_io_failure("c.json", "permission denied");

        assert_eq!(report.total, 3);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed(), 2);
        assert!(!report.is_clean());
        assert!(report.failures[0].validation.is_some());
        assert!(report.failures[1].validation.is_none());
    }

    #[test]
    fn test_format_console_report() {
        let formatted = BatchReporter::new()
            .format_report(&report_with_failure())
            .unwrap();

        assert!(formatted.contains("validate (RoastData)"));
        assert!(formatted.contains("total records: 2"));
        assert!(formatted.contains("valid records: 1"));
        assert!(formatted.contains("b.json: Invalid value for key \"ambient\" on RoastData"));
    }

    #[test]
    fn test_format_json_report() {
        let formatted = BatchReporter::new()
            .with_format(ReportFormat::Json)
            .format_report(&report_with_failure())
            .unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&formatted).unwrap();
        assert_eq!(parsed["succeeded"], 1);
        assert_eq!(parsed["failures"][0]["validation"]["key"], "ambient");
    }

    #[test]
    fn test_format_yaml_report() {
        let formatted = BatchReporter::new()
            .with_format(ReportFormat::Yaml)
            .format_report(&report_with_failure())
            .unwrap();

        assert!(formatted.contains("operation: validate"));
        assert!(formatted.contains("root_type: RoastData"));
    }
}
