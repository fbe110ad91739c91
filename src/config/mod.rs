pub mod cli;
pub mod toml_config;

pub use cli::LocalStorage;
pub use toml_config::{AppConfig, CacheConfig, MappingsConfig, ServerConfig, SourceConfig, UpstreamConfig};

#[cfg(feature = "cli")]
use crate::domain::model::{OutputFormat, ScenarioIdentifier};
#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "oedatamodel-api")]
#[command(about = "Fetch OEP scenarios and reshape them into JSON or zipped CSV")]
pub struct CliConfig {
    #[arg(short, long, global = true, default_value = "oedatamodel-api.toml")]
    pub config: String,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Start the HTTP API
    Serve(ServeArgs),
    /// Fetch one scenario and write the result to a local directory
    Export(ExportArgs),
    /// List the available mappings
    Mappings,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Override server.bind from the config file
    #[arg(long)]
    pub bind: Option<String>,

    /// Override server.port from the config file
    #[arg(long)]
    pub port: Option<u16>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    #[arg(long)]
    pub source: String,

    #[arg(long, conflicts_with = "name", required_unless_present = "name")]
    pub id: Option<i64>,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub mapping: String,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub output: OutputFormat,

    #[arg(long, default_value = "./output")]
    pub output_dir: String,

    /// Defaults to `<mapping>_<id or name>.<json|zip>`
    #[arg(long)]
    pub filename: Option<String>,
}

#[cfg(feature = "cli")]
impl ExportArgs {
    pub fn identifier(&self) -> Option<ScenarioIdentifier> {
        match (&self.id, &self.name) {
            (Some(id), _) => Some(ScenarioIdentifier::ById(*id)),
            (None, Some(name)) => Some(ScenarioIdentifier::ByName(name.clone())),
            (None, None) => None,
        }
    }

    pub fn output_filename(&self) -> String {
        if let Some(filename) = &self.filename {
            return filename.clone();
        }
        let suffix = match (&self.id, &self.name) {
            (Some(id), _) => id.to_string(),
            (None, Some(name)) => name
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
                .collect(),
            (None, None) => "scenario".to_string(),
        };
        format!("{}_{}.{}", self.mapping, suffix, self.output.extension())
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_parse_export_args() {
        let cli = CliConfig::try_parse_from([
            "oedatamodel-api",
            "export",
            "--source",
            "scenario",
            "--name",
            "Base Case",
            "--mapping",
            "oed_scenario",
            "--output",
            "csv",
        ])
        .unwrap();

        let Command::Export(args) = cli.command else {
            panic!("expected export command");
        };
        assert_eq!(args.output, OutputFormat::Csv);
        assert_eq!(
            args.identifier(),
            Some(ScenarioIdentifier::ByName("Base Case".to_string()))
        );
        assert_eq!(args.output_filename(), "oed_scenario_Base_Case.zip");
        assert_eq!(cli.config, "oedatamodel-api.toml");
    }

    #[test]
    fn test_export_requires_identifier() {
        let result = CliConfig::try_parse_from([
            "oedatamodel-api",
            "export",
            "--source",
            "scenario",
            "--mapping",
            "oed_scenario",
        ]);
        assert!(result.is_err());

        let both = CliConfig::try_parse_from([
            "oedatamodel-api",
            "export",
            "--source",
            "scenario",
            "--id",
            "1",
            "--name",
            "x",
            "--mapping",
            "oed_scenario",
        ]);
        assert!(both.is_err());
    }

    #[test]
    fn test_serve_overrides() {
        let cli =
            CliConfig::try_parse_from(["oedatamodel-api", "-v", "serve", "--port", "9100"]).unwrap();
        assert!(cli.verbose);
        let Command::Serve(args) = cli.command else {
            panic!("expected serve command");
        };
        assert_eq!(args.port, Some(9100));
        assert!(!args.json_logs);
    }
}
