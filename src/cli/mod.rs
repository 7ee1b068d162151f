//! CLI argument definitions for roadmap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Version string with build information, shown by `--version`.
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit ",
    env!("ROADMAP_GIT_COMMIT"),
    ", built ",
    env!("ROADMAP_BUILD_TIMESTAMP"),
    ")"
);

/// Roadmap - Roll up work-item schedules into a filtered Gantt view.
///
/// Point it at a snapshot (`--snapshot`, `ROADMAP_SNAPSHOT` or the `snapshot`
/// config key), then run `roadmap build` to get Gantt tasks and links.
#[derive(Parser, Debug)]
#[command(name = "roadmap")]
#[command(author, version, long_version = LONG_VERSION, about = "Roll up and filter hierarchical work-item schedules", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Run as if roadmap was started in <path> instead of the current directory.
    /// The project config is read from <path>/.roadmap/config.kdl.
    /// Can also be set via ROADMAP_DIR environment variable.
    #[arg(short = 'C', long = "dir", global = true, env = "ROADMAP_DIR")]
    pub dir: Option<PathBuf>,

    /// Snapshot file with work items and metadata (JSON).
    /// Can also be set via ROADMAP_SNAPSHOT or the `snapshot` config key.
    #[arg(long, global = true)]
    pub snapshot: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the filtered Gantt view (tasks and links)
    Build(BuildArgs),

    /// Show an aggregated work item with its ancestor chain
    Show {
        /// Work item ID
        id: u64,
    },

    /// List area path options for --area
    Areas,

    /// List backlog levels, highest rank first
    Levels,

    /// List display intervals for --interval
    Intervals,

    /// List "changed since" presets (fiscal years, starting in April)
    Presets,

    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Filter and display options for `roadmap build`.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct BuildArgs {
    /// Keep items under this area path (repeatable)
    #[arg(long = "area", short = 'a')]
    pub areas: Vec<String>,

    /// Keep items of this work item type (repeatable)
    #[arg(long = "type", short = 't')]
    pub types: Vec<String>,

    /// Keep the work item types of this backlog level (repeatable)
    #[arg(long = "level", short = 'l')]
    pub levels: Vec<String>,

    /// Keep items whose title contains this text (case-insensitive)
    #[arg(long, short = 'k')]
    pub keyword: Option<String>,

    /// Keep items carrying this tag (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// How tags match
    #[arg(long, value_parser = ["any", "all", "any-top", "all-top"])]
    pub tag_mode: Option<String>,

    /// Gantt display interval
    #[arg(long, short = 'i')]
    pub interval: Option<String>,

    /// Only items changed on or after: YYYY-MM-DD, month, quarter, year,
    /// fiscal-year or previous-fiscal-year
    #[arg(long)]
    pub changed_since: Option<String>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the resolved configuration and where each value came from
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (snapshot, output-format, interval, tag-mode)
        key: String,
        /// Configuration value
        value: String,
        /// Write to the system config instead of the project config
        #[arg(long)]
        system: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build_with_filters() {
        let cli = Cli::try_parse_from([
            "roadmap",
            "build",
            "--area",
            "Proj\\Web",
            "--type",
            "Epic",
            "--type",
            "Feature",
            "--tag",
            "q3",
            "--tag-mode",
            "any-top",
            "--keyword",
            "checkout",
        ])
        .unwrap();

        let Commands::Build(args) = cli.command else {
            panic!("expected build command");
        };
        assert_eq!(args.areas, vec!["Proj\\Web"]);
        assert_eq!(args.types, vec!["Epic", "Feature"]);
        assert_eq!(args.tags, vec!["q3"]);
        assert_eq!(args.tag_mode.as_deref(), Some("any-top"));
        assert_eq!(args.keyword.as_deref(), Some("checkout"));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["roadmap", "areas", "-H", "--snapshot", "s.json"]).unwrap();
        assert!(cli.human_readable);
        assert_eq!(cli.snapshot, Some(PathBuf::from("s.json")));
    }

    #[test]
    fn test_rejects_unknown_tag_mode() {
        assert!(Cli::try_parse_from(["roadmap", "build", "--tag-mode", "some"]).is_err());
    }

    #[test]
    fn test_parse_config_set() {
        let cli =
            Cli::try_parse_from(["roadmap", "config", "set", "interval", "Quarter", "--system"])
                .unwrap();
        match cli.command {
            Commands::Config {
                command: ConfigCommands::Set { key, value, system },
            } => {
                assert_eq!(key, "interval");
                assert_eq!(value, "Quarter");
                assert!(system);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
