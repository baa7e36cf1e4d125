use chrono::{DateTime, Utc};
use tracing::debug;

use crate::{
    Classification, EvaluateError, FetchError, LocateError, MetricFamily, Selector, Thresholds,
    UnsupportedType,
};

/// Everything that makes a check end in [ServiceState::Unknown](crate::ServiceState::Unknown).
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Locate(#[from] LocateError),
    #[error(transparent)]
    UnsupportedType(#[from] UnsupportedType),
    #[error("Metric has no value -- {0}")]
    MissingValue(String),
    #[error("{source} -- {family}")]
    Evaluate {
        source: EvaluateError,
        family: String,
    },
}

/// A single check: which sample to look at and how to classify it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Check {
    selector: Selector,
    thresholds: Thresholds,
}

impl Check {
    pub fn new(selector: Selector, thresholds: Thresholds) -> Self {
        Check {
            selector,
            thresholds,
        }
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn evaluate(&self, families: &[MetricFamily]) -> Result<Classification, CheckError> {
        self.evaluate_at(families, Utc::now())
    }

    /// Locates the sample, rejects types that can't be compared and classifies the value with
    /// `now` as the current time.
    pub fn evaluate_at(
        &self,
        families: &[MetricFamily],
        now: DateTime<Utc>,
    ) -> Result<Classification, CheckError> {
        let located = self.selector.locate(families)?;
        let family = located.family;

        debug!(metric_type = %family.metric_type(), "checking metric type");
        family.metric_type().check()?;

        let raw = located
            .sample
            .value()
            .ok_or_else(|| CheckError::MissingValue(family.to_string()))?;

        let classification =
            self.thresholds
                .evaluate_at(raw, now)
                .map_err(|source| CheckError::Evaluate {
                    source,
                    family: family.to_string(),
                })?;

        debug!(state = %classification.state(), "metric classified");
        Ok(classification)
    }
}
