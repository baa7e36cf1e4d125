use clap::CommandFactory;

use check_metric_value::cli::Cli;
use check_metric_value::config_generator::icinga_command_if_requested;
use check_metric_value::{Classification, Runner, ServiceState};

fn main() {
    // GENERATE_ICINGA_COMMAND has to be set to print the Icinga command definition instead
    match icinga_command_if_requested("check-metric-value", &Cli::command()) {
        Ok(Some(config)) => {
            println!("{}", config.trim());
            std::process::exit(0);
        }
        Ok(None) => {}
        Err(err) => Classification::new(ServiceState::Unknown, err.to_string()).print_and_exit(),
    }

    let cli = match Cli::parse_or_unknown() {
        Ok(cli) => cli,
        Err(classification) => classification.print_and_exit(),
    };

    cli.init_tracing();

    Runner::new().safe_run(|| cli.run()).print_and_exit()
}
