//! The check_metric_value crate evaluates a single prometheus metric against warning and critical
//! thresholds and reports the outcome the way nagios and icinga expect it.
//!
//! The pipeline is: fetch the metric families via `prom2json` ([Converter]), find the requested
//! sample ([Selector]), make sure its type can be compared ([MetricType::check]) and classify the
//! value ([Thresholds]). [Check] ties the last three stages together.
//!
//! ```rust
//! # #[macro_use]
//! # extern crate check_metric_value;
//! # use check_metric_value::*;
//! # fn main() {
//! let families = vec![MetricFamily::new(
//!     "queue_length",
//!     MetricType::Gauge,
//!     vec![MetricSample::new(labels!["queue" => "mail"], "5")],
//! )];
//!
//! let check = Check::new(Selector::new("queue_length"), Thresholds::new(Operator::Gt, 3, 10));
//! let classification = check.evaluate(&families).unwrap();
//!
//! assert_eq!(&classification.to_nagios_string(), "WARNING - value = 5");
//! assert_eq!(classification.exit_code(), 1);
//! # }
//! ```

use std::fmt;
use std::process;

#[macro_use]
mod macros;

mod check;
#[cfg(feature = "clap")]
pub mod cli;
#[cfg(feature = "clap")]
pub mod config_generator;
mod family;
mod fetch;
mod locate;
mod runner;
mod threshold;

pub use crate::check::{Check, CheckError};
pub use crate::family::{Labels, MetricFamily, MetricSample, MetricType, MissingLabel, UnsupportedType};
pub use crate::fetch::{parse_families, Converter, FetchError, DEFAULT_CONVERTER};
pub use crate::locate::{LabelFilter, LocateError, Located, Selector};
pub use crate::runner::{Runner, RunnerResult};
pub use crate::threshold::{DateUnit, EvaluateError, Operator, Thresholds, TriggerIfValue};

/// Represents a service state from nagios.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceState {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl ServiceState {
    /// Returns the corresponding nagios exit code to signal the service state of self.
    pub fn exit_code(&self) -> i32 {
        match self {
            ServiceState::Ok => 0,
            ServiceState::Warning => 1,
            ServiceState::Critical => 2,
            ServiceState::Unknown => 3,
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceState::Ok => "OK",
            ServiceState::Warning => "WARNING",
            ServiceState::Critical => "CRITICAL",
            ServiceState::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// The final verdict of a check run: a [ServiceState] plus a human readable message.
#[derive(Clone, Debug, PartialEq)]
pub struct Classification {
    state: ServiceState,
    message: String,
}

impl Classification {
    pub fn new(state: ServiceState, message: impl Into<String>) -> Self {
        Classification {
            state,
            message: message.into(),
        }
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the line nagios reads to determine the service state, e.g. `OK - value = 5`.
    pub fn to_nagios_string(&self) -> String {
        format!("{} - {}", self.state, self.message)
    }

    /// Will return the exit code of the state via [ServiceState::exit_code].
    pub fn exit_code(&self) -> i32 {
        self.state.exit_code()
    }

    /// Will print Self::to_nagios_string and exit with the exit code from Self::exit_code
    pub fn print_and_exit(&self) -> ! {
        println!("{}", self.to_nagios_string());
        process::exit(self.exit_code());
    }
}
