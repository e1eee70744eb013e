use std::collections::HashSet;

use crate::types::BatchResult;

/// Accumulates the message identifiers that must be redelivered.
///
/// Per-message and per-group problems are expected outcomes, so they are
/// recorded here instead of being returned as errors.
#[derive(Debug, Default)]
pub struct FailureReport {
    failed: Vec<String>,
    seen: HashSet<String>,
}

impl FailureReport {
    pub fn fail_message(&mut self, message_id: &str) {
        if self.seen.insert(message_id.to_string()) {
            self.failed.push(message_id.to_string());
        }
    }

    pub fn fail_group<'a>(&mut self, message_ids: impl IntoIterator<Item = &'a String>) {
        for message_id in message_ids {
            self.fail_message(message_id);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn into_batch_result(self) -> BatchResult {
        BatchResult {
            failed_message_ids: self.failed,
        }
    }

    /// Result for a batch that could not be attempted at all
    pub fn fail_all<'a>(message_ids: impl IntoIterator<Item = &'a str>) -> BatchResult {
        let mut report = FailureReport::default();
        for message_id in message_ids {
            report.fail_message(message_id);
        }
        report.into_batch_result()
    }
}
