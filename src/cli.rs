//! Command line interface of the `check_metric_value` binary.

use std::path::PathBuf;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::{
    Check, CheckError, Classification, Converter, DateUnit, Operator, Selector, ServiceState,
    Thresholds, DEFAULT_CONVERTER,
};

#[derive(Debug, Parser)]
#[command(
    name = "check_metric_value",
    version,
    about = "Nagios/Icinga plugin for Prometheus metric values"
)]
pub struct Cli {
    /// Enable debug output on stderr
    #[arg(short = 'D', long)]
    pub debug: bool,

    /// prom2json executable
    #[arg(short = 'P', long, env = "PROM2JSON", default_value = DEFAULT_CONVERTER)]
    pub prom2json: PathBuf,

    /// Metrics URL, ex. http://localhost/metrics
    #[arg(short = 'U', long)]
    pub url: String,

    /// Metric name
    #[arg(short = 'M', long)]
    pub metric: String,

    /// Label name to match, required for metrics with multiple values
    #[arg(short = 'n', long)]
    pub label_name: Option<String>,

    /// Label value to match, required for metrics with multiple values
    #[arg(short = 'v', long)]
    pub label_value: Option<String>,

    /// Comparison operator
    #[arg(short = 'o', long, value_enum)]
    pub operator: Operator,

    /// Unit of the thresholds for the date operators
    #[arg(short = 'u', long, value_enum, default_value_t = DateUnit::Days)]
    pub unit: DateUnit,

    /// Warning threshold
    #[arg(short = 'w', long, allow_negative_numbers = true)]
    pub warning: i64,

    /// Critical threshold
    #[arg(short = 'c', long, allow_negative_numbers = true)]
    pub critical: i64,
}

impl Cli {
    /// Parses the command line. Usage errors become an UNKNOWN classification instead of clap's
    /// exit code 2, which nagios would read as CRITICAL. Help and version exit right away.
    pub fn parse_or_unknown() -> Result<Cli, Classification> {
        Cli::try_parse().map_err(|err| match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                err.exit()
            }
            _ => usage_error(&err),
        })
    }

    pub fn selector(&self) -> Selector {
        Selector::from_parts(&self.metric, self.label_name.clone(), self.label_value.clone())
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds::new(self.operator, self.warning, self.critical).with_unit(self.unit)
    }

    pub fn check(&self) -> Check {
        Check::new(self.selector(), self.thresholds())
    }

    pub fn converter(&self) -> Converter {
        Converter::new(&self.prom2json)
    }

    /// Logs go to stderr so stdout only ever carries the status line. `RUST_LOG` takes
    /// precedence over `--debug`.
    pub fn init_tracing(&self) {
        let default = if self.debug { "debug" } else { "warn" };

        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
            )
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    /// Fetches the metrics and classifies the selected value.
    pub fn run(&self) -> Result<Classification, CheckError> {
        debug!(converter = %self.prom2json.display(), url = %self.url, "fetching metrics");

        let families = self.converter().fetch(&self.url)?;
        self.check().evaluate(&families)
    }
}

/// Folds a clap error into a single UNKNOWN line. Everything up to the usage block is kept,
/// e.g. the list of missing arguments below the error header.
pub fn usage_error(err: &clap::Error) -> Classification {
    let rendered = err.to_string();
    let mut message = String::from("Error in Argument parse --");

    for line in rendered
        .lines()
        .take_while(|l| !l.starts_with("Usage:"))
        .map(str::trim)
        .filter(|l| !l.is_empty())
    {
        if message.ends_with(':') || message.ends_with("--") {
            message.push(' ');
        } else {
            message.push_str(", ");
        }
        message.push_str(line);
    }

    Classification::new(ServiceState::Unknown, message)
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use crate::cli::{usage_error, Cli};
    use crate::{DateUnit, LabelFilter, Operator, ServiceState, DEFAULT_CONVERTER};

    #[test]
    fn test_verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_short() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from([
            "check_metric_value",
            "-U",
            "http://localhost:9100/metrics",
            "-M",
            "node_filesystem_avail_bytes",
            "-n",
            "mountpoint",
            "-v",
            "/",
            "-o",
            "lt",
            "-w",
            "500000000",
            "-c",
            "100000000",
        ])?;

        assert!(!cli.debug);
        assert_eq!(cli.url, "http://localhost:9100/metrics");
        assert_eq!(cli.unit, DateUnit::Days);

        let check = cli.check();
        assert_eq!(check.selector().name(), "node_filesystem_avail_bytes");
        assert_eq!(
            check.selector().label(),
            Some(&LabelFilter {
                name: "mountpoint".to_owned(),
                value: "/".to_owned()
            })
        );
        assert_eq!(check.thresholds().operator(), Operator::Lt);
        assert_eq!(check.thresholds().warning(), 500_000_000);
        assert_eq!(check.thresholds().critical(), 100_000_000);
        Ok(())
    }

    #[test]
    fn test_parse_long() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from([
            "check_metric_value",
            "--debug",
            "--prom2json",
            "/opt/bin/prom2json",
            "--url",
            "http://localhost/metrics",
            "--metric",
            "ssl_certificate_expiry_seconds",
            "--operator",
            "gt-date",
            "--unit",
            "hours",
            "--warning",
            "-48",
            "--critical",
            "-24",
        ])?;

        assert!(cli.debug);
        assert_eq!(cli.converter().program().to_str(), Some("/opt/bin/prom2json"));
        assert!(cli.selector().label().is_none());

        let thresholds = cli.thresholds();
        assert_eq!(thresholds.operator(), Operator::GtDate);
        assert_eq!(thresholds.unit(), DateUnit::Hours);
        assert_eq!(thresholds.warning(), -48);
        assert_eq!(thresholds.critical(), -24);
        Ok(())
    }

    #[test]
    fn test_operator_values() -> anyhow::Result<()> {
        let test_data = [
            ("gt", Operator::Gt),
            ("lt", Operator::Lt),
            ("gt-date", Operator::GtDate),
            ("lt-date", Operator::LtDate),
        ];
        for (raw, expected) in test_data {
            let cli = parse(&["-o", raw, "-w", "1", "-c", "2"])?;
            assert_eq!(cli.operator, expected);
            assert_eq!(cli.prom2json.to_str(), Some(DEFAULT_CONVERTER));
        }
        Ok(())
    }

    fn parse(extra: &[&str]) -> Result<Cli, clap::Error> {
        let mut args = vec!["check_metric_value", "-U", "u", "-M", "m"];
        args.extend_from_slice(extra);
        Cli::try_parse_from(args)
    }

    #[test]
    fn test_rejects_invalid_arguments() {
        assert!(parse(&["-o", "eq", "-w", "1", "-c", "2"]).is_err());
        assert!(parse(&["-o", "gt", "-w", "1.5", "-c", "2"]).is_err());
        assert!(parse(&["-o", "gt", "-w", "1"]).is_err());
        assert!(parse(&["-o", "gt-date", "-u", "weeks", "-w", "1", "-c", "2"]).is_err());
    }

    #[test]
    fn test_usage_error_names_missing_arguments() {
        let err =
            Cli::try_parse_from(["check_metric_value", "-o", "gt", "-w", "1", "-c", "2"]).unwrap_err();
        let classification = usage_error(&err);

        assert_eq!(classification.state(), ServiceState::Unknown);
        assert_eq!(classification.exit_code(), 3);
        assert!(classification
            .to_nagios_string()
            .starts_with("UNKNOWN - Error in Argument parse -- error: "));
        assert!(classification.message().contains("--url <URL>"));
        assert!(classification.message().contains("--metric <METRIC>"));
        assert!(!classification.message().contains('\n'));
        assert!(!classification.message().contains("Usage:"));
    }

    #[test]
    fn test_usage_error_invalid_value() {
        let err = parse(&["-o", "eq", "-w", "1", "-c", "2"]).unwrap_err();
        let message = usage_error(&err).message().to_owned();

        assert!(message.contains("'eq'"));
        assert!(message.contains("--operator"));
        assert!(!message.contains('\n'));
    }

    #[test]
    fn test_label_filter_needs_both_parts() -> anyhow::Result<()> {
        let cli = parse(&["-n", "job", "-o", "gt", "-w", "1", "-c", "2"])?;
        assert_eq!(cli.label_name.as_deref(), Some("job"));
        assert!(cli.selector().label().is_none());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_run_with_failing_converter() {
        let cli = parse(&["-P", "false", "-o", "gt", "-w", "1", "-c", "2"]).unwrap();
        let err = cli.run().unwrap_err();
        assert!(err.to_string().starts_with("Error running subprocess, "));
    }
}
