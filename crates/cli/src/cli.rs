use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use wrapgen_core::Layer;

use crate::commands::{GenerateArgs, generate_command, init_command, tasks_command};

#[derive(Parser, Debug)]
#[command(name = "wrapgen")]
#[command(version, about, long_about = None)]
#[command(subcommand_required = true, arg_required_else_help = true)]
#[command(after_help = "ENVIRONMENT:\n    RUST_LOG=debug    Enable debug logging")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Binding layer as spelled on the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerArg {
    C,
    F08,
}

impl From<LayerArg> for Layer {
    fn from(value: LayerArg) -> Self {
        match value {
            LayerArg::C => Layer::C,
            LayerArg::F08 => Layer::F08,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate the wrappers of one binding layer from a catalog
    #[command(visible_alias = "g")]
    Generate {
        /// Procedure catalog (defaults to the one in .wrapgen.json)
        catalog: Option<PathBuf>,

        /// Binding layer to generate
        #[arg(short, long, value_enum)]
        layer: Option<LayerArg>,

        /// Only generate these procedures (repeatable)
        #[arg(short, long = "procedure")]
        procedures: Vec<String>,

        /// Write the wrappers to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the done/todo/not seen report as JSON
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Interleave hook trace comments with the wrappers
        #[arg(short, long, overrides_with = "no_debug")]
        debug: bool,

        /// Disable trace comments enabled in .wrapgen.json
        #[arg(long, overrides_with = "debug")]
        no_debug: bool,

        /// Emit placeholders for failing procedures instead of stopping
        #[arg(long)]
        permissive: bool,

        /// Generate procedures sorted by name
        #[arg(long, overrides_with = "no_sort")]
        sort: bool,

        /// Keep catalog order even if .wrapgen.json enables sorting
        #[arg(long, overrides_with = "sort")]
        no_sort: bool,
    },
    /// List the task types of a binding layer
    #[command(visible_alias = "t")]
    Tasks {
        #[arg(short, long, value_enum, default_value = "c")]
        layer: LayerArg,

        /// Print the descriptions as JSON
        #[arg(long)]
        json: bool,
    },
    /// Initialize wrapgen configuration
    Init {
        /// Custom working directory (defaults to current directory)
        #[arg(long = "cwd")]
        cwd: Option<String>,

        /// Force overwrite an existing configuration file
        #[arg(short, long)]
        force: bool,
    },
}

/// Tri-state from a `--x` / `--no-x` pair; `None` defers to the config.
fn flag(yes: bool, no: bool) -> Option<bool> {
    match (yes, no) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

impl Commands {
    /// Execute the command
    pub fn execute(self) -> Result<()> {
        match self {
            Commands::Generate {
                catalog,
                layer,
                procedures,
                output,
                report,
                debug,
                no_debug,
                permissive,
                sort,
                no_sort,
            } => generate_command(GenerateArgs {
                catalog,
                layer: layer.map(Layer::from),
                procedures,
                output,
                report,
                debug: flag(debug, no_debug),
                permissive,
                sort: flag(sort, no_sort),
            }),
            Commands::Tasks { layer, json } => tasks_command(layer.into(), json),
            Commands::Init { cwd, force } => init_command(cwd.as_deref(), force),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_arguments() {
        let cli = Cli::try_parse_from([
            "wrapgen", "generate", "catalog.json", "--layer", "f08", "-p", "mpi_send", "-p", "mpi_recv",
            "--permissive",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate {
                catalog,
                layer,
                procedures,
                permissive,
                debug,
                ..
            } => {
                assert_eq!(catalog, Some(PathBuf::from("catalog.json")));
                assert_eq!(layer, Some(LayerArg::F08));
                assert_eq!(procedures, vec!["mpi_send", "mpi_recv"]);
                assert!(permissive);
                assert!(!debug);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_tasks_defaults_to_c() {
        let cli = Cli::try_parse_from(["wrapgen", "tasks"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Tasks {
                layer: LayerArg::C,
                json: false
            }
        ));
        assert!(Cli::try_parse_from(["wrapgen", "tasks", "--layer", "f77"]).is_err());
    }

    #[test]
    fn test_debug_flag_pair() {
        let parse = |args: &[&str]| match Cli::try_parse_from(args).unwrap().command {
            Commands::Generate { debug, no_debug, .. } => flag(debug, no_debug),
            other => panic!("unexpected command {other:?}"),
        };
        assert_eq!(parse(&["wrapgen", "generate"]), None);
        assert_eq!(parse(&["wrapgen", "generate", "--debug"]), Some(true));
        assert_eq!(parse(&["wrapgen", "generate", "--no-debug"]), Some(false));
        assert_eq!(parse(&["wrapgen", "generate", "--no-debug", "--debug"]), Some(true));
        assert_eq!(parse(&["wrapgen", "generate", "--debug", "--no-debug"]), Some(false));
    }
}
