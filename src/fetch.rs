use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use tracing::debug;

use crate::MetricFamily;

/// Name of the converter executable, looked up via `PATH`.
pub const DEFAULT_CONVERTER: &str = "prom2json";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Error running subprocess {program} -- {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("Error running subprocess, {status}, output = {stderr} {stdout}")]
    Status {
        status: ExitStatus,
        stderr: String,
        stdout: String,
    },
    #[error("Error parsing JSON -- {0}")]
    Json(#[from] serde_json::Error),
}

/// Runs prom2json (or a compatible converter) against a metrics url.
///
/// The converter is invoked as `<program> <url>` without a shell and has to print the metric
/// families as a JSON array on stdout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Converter {
    program: PathBuf,
}

impl Converter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Converter {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn fetch(&self, url: &str) -> Result<Vec<MetricFamily>, FetchError> {
        debug!(program = %self.program.display(), url, "running converter");

        let output = Command::new(&self.program)
            .arg(url)
            .output()
            .map_err(|source| FetchError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        debug!(status = %output.status, "converter finished");

        if !output.status.success() {
            return Err(FetchError::Status {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
                stdout: String::from_utf8_lossy(&output.stdout).trim().to_owned(),
            });
        }

        parse_families(&String::from_utf8_lossy(&output.stdout))
    }
}

impl Default for Converter {
    fn default() -> Self {
        Converter::new(DEFAULT_CONVERTER)
    }
}

/// Decodes prom2json output. Unknown fields are ignored.
pub fn parse_families(json: &str) -> Result<Vec<MetricFamily>, FetchError> {
    let families: Vec<MetricFamily> = serde_json::from_str(json)?;
    debug!(count = families.len(), "decoded metric families");
    Ok(families)
}
