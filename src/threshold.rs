use std::fmt;
use std::num::ParseFloatError;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use crate::{Classification, ServiceState};

/// The comparison a check performs.
///
/// The date operators treat the metric value as a unix timestamp in seconds and compare the
/// timestamp plus the threshold duration against the current time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum Operator {
    Gt,
    Lt,
    GtDate,
    LtDate,
}

impl Operator {
    pub fn trigger(&self) -> TriggerIfValue {
        match self {
            Operator::Gt | Operator::GtDate => TriggerIfValue::Greater,
            Operator::Lt | Operator::LtDate => TriggerIfValue::Less,
        }
    }

    pub fn is_date(&self) -> bool {
        matches!(self, Operator::GtDate | Operator::LtDate)
    }
}

/// Unit of the thresholds of the date operators.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum DateUnit {
    #[default]
    Days,
    Hours,
    Minutes,
}

impl DateUnit {
    /// Converts a threshold into a duration, `None` if it doesn't fit.
    pub fn duration(&self, amount: i64) -> Option<TimeDelta> {
        match self {
            DateUnit::Days => TimeDelta::try_days(amount),
            DateUnit::Hours => TimeDelta::try_hours(amount),
            DateUnit::Minutes => TimeDelta::try_minutes(amount),
        }
    }
}

impl fmt::Display for DateUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DateUnit::Days => "days",
            DateUnit::Hours => "hours",
            DateUnit::Minutes => "minutes",
        };
        f.write_str(s)
    }
}

/// Direction in which a value has to cross a threshold to trigger it. Equality never triggers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerIfValue {
    Greater,
    Less,
}

impl TriggerIfValue {
    pub fn fires<T: PartialOrd>(&self, value: &T, threshold: &T) -> bool {
        match self {
            TriggerIfValue::Greater => value > threshold,
            TriggerIfValue::Less => value < threshold,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EvaluateError {
    #[error("error getting metric value as float, value = {value:?} -- {source}")]
    InvalidNumber {
        value: String,
        source: ParseFloatError,
    },
    #[error("metric value {0} is not a valid unix timestamp")]
    InvalidTimestamp(f64),
    #[error("threshold of {amount} {unit} is out of range")]
    ThresholdOutOfRange { amount: i64, unit: DateUnit },
    #[error("metric value {0} plus threshold is out of the supported date range")]
    DateOutOfRange(f64),
}

/// Warning and critical thresholds plus the operator to compare them with.
///
/// The critical threshold is always checked first. Nothing enforces an order between the two
/// thresholds, so with a warning threshold beyond the critical one the warning state can't be
/// reached.
///
/// ```rust
/// # use check_metric_value::{Operator, ServiceState, Thresholds};
/// let thresholds = Thresholds::new(Operator::Lt, 5, 0);
/// let classification = thresholds.evaluate("1").unwrap();
/// assert_eq!(classification.state(), ServiceState::Warning);
/// assert_eq!(classification.message(), "value = 1");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Thresholds {
    operator: Operator,
    warning: i64,
    critical: i64,
    unit: DateUnit,
}

impl Thresholds {
    pub fn new(operator: Operator, warning: i64, critical: i64) -> Self {
        Thresholds {
            operator,
            warning,
            critical,
            unit: DateUnit::default(),
        }
    }

    /// Sets the unit of the thresholds. Only used by the date operators.
    pub fn with_unit(mut self, unit: DateUnit) -> Self {
        self.unit = unit;
        self
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn warning(&self) -> i64 {
        self.warning
    }

    pub fn critical(&self) -> i64 {
        self.critical
    }

    pub fn unit(&self) -> DateUnit {
        self.unit
    }

    /// Classifies a raw metric value, comparing date operators against the current time.
    pub fn evaluate(&self, raw: &str) -> Result<Classification, EvaluateError> {
        self.evaluate_at(raw, Utc::now())
    }

    /// Classifies a raw metric value with `now` as the current time.
    pub fn evaluate_at(
        &self,
        raw: &str,
        now: DateTime<Utc>,
    ) -> Result<Classification, EvaluateError> {
        debug!(
            operator = ?self.operator,
            warning = self.warning,
            critical = self.critical,
            raw,
            "evaluating metric value"
        );

        let value = parse_value(raw)?;
        let trigger = self.operator.trigger();

        let (critical, warning) = if self.operator.is_date() {
            let timestamp = to_datetime(value)?;
            debug!(%timestamp, unit = %self.unit, %now, "parsed value as date");

            let critical_at = self.shift(timestamp, value, self.critical)?;
            let warning_at = self.shift(timestamp, value, self.warning)?;
            (
                trigger.fires(&critical_at, &now),
                trigger.fires(&warning_at, &now),
            )
        } else {
            debug!(value, "parsed value as number");
            (
                trigger.fires(&value, &(self.critical as f64)),
                trigger.fires(&value, &(self.warning as f64)),
            )
        };

        let state = if critical {
            ServiceState::Critical
        } else if warning {
            ServiceState::Warning
        } else {
            ServiceState::Ok
        };

        Ok(Classification::new(state, format!("value = {value}")))
    }

    fn shift(
        &self,
        timestamp: DateTime<Utc>,
        value: f64,
        amount: i64,
    ) -> Result<DateTime<Utc>, EvaluateError> {
        let delta = self
            .unit
            .duration(amount)
            .ok_or(EvaluateError::ThresholdOutOfRange {
                amount,
                unit: self.unit,
            })?;

        timestamp
            .checked_add_signed(delta)
            .ok_or(EvaluateError::DateOutOfRange(value))
    }
}

fn parse_value(raw: &str) -> Result<f64, EvaluateError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|source| EvaluateError::InvalidNumber {
            value: raw.to_owned(),
            source,
        })
}

fn to_datetime(value: f64) -> Result<DateTime<Utc>, EvaluateError> {
    if !value.is_finite() {
        return Err(EvaluateError::InvalidTimestamp(value));
    }

    let secs = value.floor();
    let nanos = ((value - secs) * 1e9).round().min(999_999_999.0) as u32;

    DateTime::from_timestamp(secs as i64, nanos).ok_or(EvaluateError::InvalidTimestamp(value))
}
