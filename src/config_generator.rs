//! Generates an Icinga 2 `CheckCommand` definition from the clap definition of the plugin.

/// Set this environment variable to make the plugin print its Icinga command definition.
pub const GENERATE_ENV: &str = "GENERATE_ICINGA_COMMAND";

pub struct IcingaCommand {
    name: String,
    arguments: Vec<IcingaArgument>,
}

struct IcingaArgument {
    flag: String,
    var: String,
    description: Option<String>,
    is_flag: bool,
    required: bool,
    default_value: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum GenerateCommandError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid executable path")]
    InvalidExecutablePath,
    #[error("argument {0} has no long name")]
    MissingLongArgument(String),
}

impl IcingaCommand {
    /// Collects the arguments of `cmd`. Custom variables are named `<name>_<long argument>`.
    pub fn from_clap(name: &str, cmd: &clap::Command) -> Result<Self, GenerateCommandError> {
        let prefix = name.replace('-', "_");
        let mut arguments = Vec::new();

        for arg in cmd.get_arguments() {
            let long = arg
                .get_long()
                .ok_or_else(|| GenerateCommandError::MissingLongArgument(arg.get_id().to_string()))?;

            let is_flag = {
                let values = arg.get_possible_values();
                values.len() == 2
                    && values.iter().any(|v| v.get_name() == "true")
                    && values.iter().any(|v| v.get_name() == "false")
            };

            arguments.push(IcingaArgument {
                flag: format!("--{long}"),
                var: format!("{prefix}_{}", long.replace('-', "_")),
                description: arg.get_help().map(|s| s.to_string()),
                is_flag,
                required: arg.is_required_set(),
                default_value: arg
                    .get_default_values()
                    .first()
                    .and_then(|v| v.to_str())
                    .filter(|_| !is_flag)
                    .map(|s| s.to_string()),
            });
        }

        Ok(IcingaCommand {
            name: name.to_owned(),
            arguments,
        })
    }

    /// Renders the `object CheckCommand` block pointing at `executable`.
    pub fn render(&self, executable: &str) -> String {
        let mut out = format!("object CheckCommand \"{}\" {{\n", self.name);
        out.push_str(&format!("  command = [ \"{}\" ]\n", escape_string(executable)));
        out.push_str("  arguments = {\n");

        for arg in &self.arguments {
            out.push_str(&format!("    \"{}\" = {{\n", arg.flag));

            if arg.is_flag {
                out.push_str(&format!("      set_if = \"${}$\"\n", arg.var));
            } else {
                out.push_str(&format!("      value = \"${}$\"\n", arg.var));
            }

            if arg.required {
                out.push_str("      required = true\n");
            }

            if let Some(description) = &arg.description {
                out.push_str(&format!(
                    "      description = \"{}\"\n",
                    escape_string(description)
                ));
            }

            out.push_str("    }\n");
        }

        out.push_str("  }\n");

        let defaults: Vec<_> = self
            .arguments
            .iter()
            .filter_map(|arg| arg.default_value.as_ref().map(|d| (&arg.var, d)))
            .collect();

        if !defaults.is_empty() {
            out.push('\n');
            for (var, default_value) in defaults {
                out.push_str(&format!(
                    "  vars.{} = \"{}\"\n",
                    var,
                    escape_string(default_value)
                ));
            }
        }

        out.push_str("}\n");
        out
    }

    /// Renders the command for the currently running executable.
    pub fn render_for_current_exe(&self) -> Result<String, GenerateCommandError> {
        let current_exe = std::env::current_exe()?;
        let current_exe = current_exe
            .to_str()
            .ok_or(GenerateCommandError::InvalidExecutablePath)?;

        Ok(self.render(current_exe))
    }
}

fn escape_string(s: &str) -> String {
    ["\\", "\"", "$"]
        .iter()
        .fold(s.to_string(), |acc, c| acc.replace(c, &format!("\\{c}")))
}

/// Returns the Icinga command definition if [GENERATE_ENV] is set, `None` otherwise.
pub fn icinga_command_if_requested(
    name: &str,
    cmd: &clap::Command,
) -> Result<Option<String>, GenerateCommandError> {
    if std::env::var_os(GENERATE_ENV).is_none() {
        return Ok(None);
    }

    let out = IcingaCommand::from_clap(name, cmd)?.render_for_current_exe()?;
    Ok(Some(out))
}
