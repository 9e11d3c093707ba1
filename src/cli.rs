use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Schema-driven mock value generator
#[derive(Parser, Debug, Clone)]
#[command(name = "shapemock", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "SHAPEMOCK_CONFIG", default_value = "shapemock.toml", global = true)]
    pub config: PathBuf,

    /// Seed for reproducible output
    #[arg(long, env = "SHAPEMOCK_SEED", global = true)]
    pub seed: Option<u64>,

    /// Nesting depth past which subtrees are left empty
    #[arg(long, global = true)]
    pub max_depth: Option<usize>,

    /// Directory external `$ref` paths are resolved against
    #[arg(long, env = "SHAPEMOCK_REFERENCE_ROOT", global = true)]
    pub reference_root: Option<PathBuf>,

    /// Number of values to generate
    #[arg(short = 'n', long, default_value_t = 1, global = true)]
    pub count: usize,

    /// Pretty-print generated JSON
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Generate values from a typed type graph (JSON or YAML)
    Typed {
        /// Type graph file
        file: PathBuf,

        /// Type to generate; the graph's body declaration when omitted
        #[arg(long)]
        root: Option<String>,
    },
    /// Generate values from a JSON Schema constraint document
    Schema {
        /// Schema file (JSON or YAML)
        file: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["shapemock", "schema", "person.json"]);
        assert_eq!(cli.config, PathBuf::from("shapemock.toml"));
        assert!(cli.seed.is_none());
        assert!(cli.max_depth.is_none());
        assert_eq!(cli.count, 1);
        assert!(!cli.pretty);
        assert_eq!(cli.verbose, 0);
        assert_eq!(
            cli.command,
            Command::Schema {
                file: PathBuf::from("person.json")
            }
        );
    }

    #[test]
    fn test_cli_with_args() {
        let cli = Cli::parse_from([
            "shapemock",
            "typed",
            "api.yaml",
            "--root",
            "Pet",
            "--seed",
            "42",
            "--count",
            "3",
            "--max-depth",
            "5",
            "--pretty",
            "-vv",
        ]);

        assert_eq!(cli.seed, Some(42));
        assert_eq!(cli.count, 3);
        assert_eq!(cli.max_depth, Some(5));
        assert!(cli.pretty);
        assert_eq!(cli.verbose, 2);
        assert_eq!(
            cli.command,
            Command::Typed {
                file: PathBuf::from("api.yaml"),
                root: Some("Pet".to_string()),
            }
        );
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["shapemock"]).is_err());
    }
}
