//! Configuration management for roadmap.
//!
//! ## config.kdl - User preferences
//!
//! Located at:
//! - System: `~/.config/roadmap/config.kdl` (or `$ROADMAP_CONFIG_DIR/config.kdl`)
//! - Project: `<dir>/.roadmap/config.kdl`
//!
//! Contains:
//! - `snapshot` - Snapshot file to load work items from
//! - `output-format` - "json" or "human"
//! - `interval` - Default Gantt display interval
//! - `tag-mode` - Default tag filter mode
//!
//! ## Precedence
//!
//! CLI flag > environment > project config > system config > defaults
//!
//! Use the [`resolver`] module for unified precedence resolution.

pub mod resolver;
pub mod schema;

pub use resolver::{
    CONFIG_DIR_ENV, ConfigOverrides, ConfigPaths, Resolved, ResolvedConfig, SNAPSHOT_ENV,
    ValueSource, resolve_config, resolve_config_with_env,
};
pub use schema::{CONFIG_KEYS, OutputFormat, RoadmapConfig};
