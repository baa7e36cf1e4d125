use std::fmt::Display;

use crate::{Classification, ServiceState};

/// Runs a check and turns an error into a [Classification].
///
/// Errors are reported as [ServiceState::Unknown] unless a different state is chosen via
/// [Runner::on_error].
pub struct Runner<E> {
    on_error: Option<Box<dyn FnOnce(&E) -> ServiceState>>,
}

impl<E: Display> Runner<E> {
    pub fn new() -> Self {
        Self { on_error: None }
    }

    pub fn on_error(mut self, f: impl FnOnce(&E) -> ServiceState + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    /// This will run either the default error handler or the one specified by calling
    /// [Runner::on_error] if the closure fails.
    pub fn safe_run(self, f: impl FnOnce() -> Result<Classification, E>) -> RunnerResult<E> {
        match f() {
            Ok(classification) => RunnerResult::Ok(classification),
            Err(err) => {
                let state = self
                    .on_error
                    .map(|f| f(&err))
                    .unwrap_or(ServiceState::Unknown);

                RunnerResult::Err(state, err)
            }
        }
    }
}

impl<E: Display> Default for Runner<E> {
    fn default() -> Self {
        Self::new()
    }
}

pub enum RunnerResult<E> {
    Ok(Classification),
    Err(ServiceState, E),
}

impl<E: Display> RunnerResult<E> {
    pub fn into_classification(self) -> Classification {
        match self {
            RunnerResult::Ok(classification) => classification,
            RunnerResult::Err(state, err) => Classification::new(state, err.to_string()),
        }
    }

    pub fn print_and_exit(self) -> ! {
        self.into_classification().print_and_exit()
    }
}
