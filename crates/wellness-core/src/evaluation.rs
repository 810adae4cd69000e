//! Offline evaluation against labeled telemetry
//!
//! Replays labeled records through the serving path and compares the served
//! label to the recorded one. A freshly generated dataset that scores badly
//! here points at train/serve skew in the artifacts rather than at the model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::PredictionRequest;
use crate::orchestrator::ServingOrchestrator;

/// One row of the generated dataset: request fields plus the true label
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LabeledRecord {
    pub focus_session_length_minutes: f64,
    pub break_frequency_per_hour: f64,
    pub after_hours_activity_minutes: f64,
    pub communication_sentiment_score: f64,
    pub department: String,
    pub wellness_label: String,
}

impl LabeledRecord {
    pub fn request(&self) -> PredictionRequest {
        PredictionRequest {
            focus_session_length_minutes: self.focus_session_length_minutes,
            break_frequency_per_hour: self.break_frequency_per_hour,
            after_hours_activity_minutes: self.after_hours_activity_minutes,
            communication_sentiment_score: self.communication_sentiment_score,
            department: self.department.clone(),
        }
    }
}

/// Outcome of an evaluation run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub total: usize,
    pub correct: usize,
    /// Rejected records by serving error kind
    pub rejected: BTreeMap<String, usize>,
    /// actual label → predicted label → count
    pub confusion: BTreeMap<String, BTreeMap<String, usize>>,
}

impl EvaluationReport {
    /// Records that produced a prediction
    pub fn scored(&self) -> usize {
        self.total - self.rejected.values().sum::<usize>()
    }

    /// Fraction of scored records predicted correctly; 0 when nothing scored
    pub fn accuracy(&self) -> f64 {
        match self.scored() {
            0 => 0.0,
            scored => self.correct as f64 / scored as f64,
        }
    }

    pub fn count(&self, actual: &str, predicted: &str) -> usize {
        self.confusion
            .get(actual)
            .and_then(|row| row.get(predicted))
            .copied()
            .unwrap_or(0)
    }

    /// Share of records labeled `label` that were predicted as `label`
    pub fn recall(&self, label: &str) -> Option<f64> {
        let support: usize = self.confusion.get(label)?.values().sum();
        (support > 0).then(|| self.count(label, label) as f64 / support as f64)
    }

    /// Share of predictions of `label` that were correct
    pub fn precision(&self, label: &str) -> Option<f64> {
        let predicted: usize = self
            .confusion
            .values()
            .filter_map(|row| row.get(label))
            .sum();
        (predicted > 0).then(|| self.count(label, label) as f64 / predicted as f64)
    }

    /// Every label seen as actual or predicted, sorted
    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self
            .confusion
            .iter()
            .flat_map(|(actual, row)| std::iter::once(actual).chain(row.keys()))
            .cloned()
            .collect();
        labels.sort();
        labels.dedup();
        labels
    }

    fn record(&mut self, actual: &str, predicted: &str) {
        if actual == predicted {
            self.correct += 1;
        }
        *self
            .confusion
            .entry(actual.to_string())
            .or_default()
            .entry(predicted.to_string())
            .or_default() += 1;
    }
}

/// Run every record through `orchestrator` and tally the results
pub fn evaluate<'a, I>(orchestrator: &ServingOrchestrator, records: I) -> EvaluationReport
where
    I: IntoIterator<Item = &'a LabeledRecord>,
{
    let mut report = EvaluationReport::default();

    for record in records {
        report.total += 1;
        match orchestrator.handle(&record.request()) {
            Ok(response) => report.record(&record.wellness_label, &response.wellness_label),
            Err(err) => *report.rejected.entry(err.kind().to_string()).or_default() += 1,
        }
    }

    report
}
