use metrics::{counter, histogram};
use std::time::Duration;

use crate::error::Severity;

/// Metric names emitted during extraction
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    pub contacts_extracted_total: &'static str,
    pub messages_extracted_total: &'static str,
    pub body_fallbacks_total: &'static str,
    pub extraction_errors_total: &'static str,
    pub database_duration: &'static str,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            contacts_extracted_total: "tiktok_contacts_extracted_total",
            messages_extracted_total: "tiktok_messages_extracted_total",
            body_fallbacks_total: "tiktok_body_fallbacks_total",
            extraction_errors_total: "tiktok_extraction_errors_total",
            database_duration: "tiktok_database_duration_seconds",
        }
    }
}

impl MetricsCollector {
    /// Record one contact handed to the case
    pub fn record_contact(&self) {
        counter!(self.contacts_extracted_total).increment(1);
    }

    /// Record one message handed to the case
    pub fn record_message(&self) {
        counter!(self.messages_extracted_total).increment(1);
    }

    /// Record a message whose body fell back to the default
    pub fn record_body_fallback(&self, message_type: i64) {
        counter!(self.body_fallbacks_total, "type" => message_type.to_string()).increment(1);
    }

    /// Record a handled extraction error
    pub fn record_error(&self, severity: Severity) {
        counter!(self.extraction_errors_total, "severity" => severity.as_str()).increment(1);
    }

    /// Record the time spent draining one database
    pub fn record_database(&self, kind: &'static str, duration: Duration) {
        histogram!(self.database_duration, "kind" => kind).record(duration.as_secs_f64());
    }
}
