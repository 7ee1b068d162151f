//! Precedence resolution for configuration.
//!
//! ## Config Precedence (highest to lowest)
//!
//! 1. CLI flags (passed at runtime)
//! 2. Environment variables (`ROADMAP_SNAPSHOT`)
//! 3. Project config.kdl (`<dir>/.roadmap/config.kdl`)
//! 4. System config.kdl (`~/.config/roadmap/config.kdl`)
//! 5. Built-in defaults
//!
//! Relative `snapshot` paths in a config file are resolved against the
//! directory the file belongs to: the project directory for the project
//! layer and the config directory for the system layer.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::Result;
use crate::config::{OutputFormat, RoadmapConfig};
use crate::models::DisplayInterval;
use crate::roadmap::TagMode;

/// Environment variable naming the snapshot file.
pub const SNAPSHOT_ENV: &str = "ROADMAP_SNAPSHOT";

/// Environment variable overriding the system config directory.
pub const CONFIG_DIR_ENV: &str = "ROADMAP_CONFIG_DIR";

/// Config file name inside each layer's directory.
pub const CONFIG_FILE: &str = "config.kdl";

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from environment variable
    EnvVar(String),
    /// Value from project-level config
    Project,
    /// Value from system-level config
    System,
    /// Value from CLI flag
    CliFlag,
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::EnvVar(name) => write!(f, "env:{}", name),
            ValueSource::Project => write!(f, "project"),
            ValueSource::System => write!(f, "system"),
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

impl Serialize for ValueSource {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone, Serialize)]
pub struct Resolved<T> {
    /// The resolved value
    pub value: T,
    /// Where the value came from
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    /// Create a new resolved value.
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// Locations of the config layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    /// Project directory (relative snapshot paths resolve against it)
    pub project_dir: PathBuf,
    /// System config directory, if one can be determined
    pub system_dir: Option<PathBuf>,
}

impl ConfigPaths {
    /// Paths for a project directory, with the system layer taken from
    /// `ROADMAP_CONFIG_DIR` or the platform config directory.
    pub fn for_dir(project_dir: &Path) -> Self {
        let system_dir = std::env::var_os(CONFIG_DIR_ENV)
            .map(PathBuf::from)
            .or_else(|| dirs::config_dir().map(|d| d.join("roadmap")));
        Self {
            project_dir: project_dir.to_path_buf(),
            system_dir,
        }
    }

    /// Paths with explicit directories.
    pub fn with_dirs(project_dir: &Path, system_dir: Option<&Path>) -> Self {
        Self {
            project_dir: project_dir.to_path_buf(),
            system_dir: system_dir.map(Path::to_path_buf),
        }
    }

    /// Project config file (`<dir>/.roadmap/config.kdl`).
    pub fn project_config(&self) -> PathBuf {
        self.project_dir.join(".roadmap").join(CONFIG_FILE)
    }

    /// System config file, if a system directory is known.
    pub fn system_config(&self) -> Option<PathBuf> {
        self.system_dir.as_ref().map(|d| d.join(CONFIG_FILE))
    }
}

/// Fully resolved configuration with source tracking.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    /// Snapshot file, if any layer names one
    pub snapshot: Option<Resolved<PathBuf>>,
    /// Output format preference
    pub output_format: Resolved<OutputFormat>,
    /// Gantt display interval
    pub interval: Resolved<DisplayInterval>,
    /// Tag filter mode
    pub tag_mode: Resolved<TagMode>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            snapshot: None,
            output_format: Resolved::new(OutputFormat::Json, ValueSource::Default),
            interval: Resolved::new(DisplayInterval::default(), ValueSource::Default),
            tag_mode: Resolved::new(TagMode::default(), ValueSource::Default),
        }
    }
}

impl ResolvedConfig {
    /// Get the snapshot path, if set.
    pub fn snapshot(&self) -> Option<&Path> {
        self.snapshot.as_ref().map(|r| r.value.as_path())
    }

    /// Get the output format value.
    pub fn output_format(&self) -> &OutputFormat {
        &self.output_format.value
    }

    /// Get the display interval value.
    pub fn interval(&self) -> DisplayInterval {
        self.interval.value
    }

    /// Get the tag mode value.
    pub fn tag_mode(&self) -> TagMode {
        self.tag_mode.value
    }
}

/// CLI overrides for configuration resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Snapshot override from CLI flag
    pub snapshot: Option<PathBuf>,
    /// Output format override from CLI flag
    pub output_format: Option<OutputFormat>,
    /// Interval override from CLI flag
    pub interval: Option<DisplayInterval>,
    /// Tag mode override from CLI flag
    pub tag_mode: Option<TagMode>,
}

impl ConfigOverrides {
    /// Create empty overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set snapshot override.
    pub fn with_snapshot(mut self, snapshot: impl Into<PathBuf>) -> Self {
        self.snapshot = Some(snapshot.into());
        self
    }

    /// Set output format override.
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    /// Set interval override.
    pub fn with_interval(mut self, interval: DisplayInterval) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Set tag mode override.
    pub fn with_tag_mode(mut self, mode: TagMode) -> Self {
        self.tag_mode = Some(mode);
        self
    }
}

fn anchored(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Resolve configuration with full precedence chain, reading environment
/// variables from the process environment.
pub fn resolve_config(paths: &ConfigPaths, overrides: &ConfigOverrides) -> Result<ResolvedConfig> {
    resolve_config_with_env(paths, overrides, |name| std::env::var(name).ok())
}

/// Resolve configuration with full precedence chain.
///
/// `env` looks up environment variables, so callers can supply a fixed
/// environment.
pub fn resolve_config_with_env<F>(
    paths: &ConfigPaths,
    overrides: &ConfigOverrides,
    env: F,
) -> Result<ResolvedConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut result = ResolvedConfig::default();

    let system_config = match paths.system_config() {
        Some(path) => RoadmapConfig::load(&path)?,
        None => RoadmapConfig::new(),
    };
    let project_config = RoadmapConfig::load(&paths.project_config())?;

    // Resolve snapshot
    let env_snapshot = env(SNAPSHOT_ENV).filter(|s| !s.trim().is_empty());
    if let Some(ref snapshot) = overrides.snapshot {
        result.snapshot = Some(Resolved::new(snapshot.clone(), ValueSource::CliFlag));
    } else if let Some(snapshot) = env_snapshot {
        result.snapshot = Some(Resolved::new(
            PathBuf::from(snapshot),
            ValueSource::EnvVar(SNAPSHOT_ENV.to_string()),
        ));
    } else if let Some(ref snapshot) = project_config.snapshot {
        result.snapshot = Some(Resolved::new(
            anchored(&paths.project_dir, snapshot),
            ValueSource::Project,
        ));
    } else if let (Some(snapshot), Some(system_dir)) =
        (&system_config.snapshot, &paths.system_dir)
    {
        result.snapshot = Some(Resolved::new(
            anchored(system_dir, snapshot),
            ValueSource::System,
        ));
    }
    // else: remains None (no default snapshot)

    // Resolve output_format
    if let Some(ref format) = overrides.output_format {
        result.output_format = Resolved::new(format.clone(), ValueSource::CliFlag);
    } else if let Some(ref format) = project_config.output_format {
        result.output_format = Resolved::new(format.clone(), ValueSource::Project);
    } else if let Some(ref format) = system_config.output_format {
        result.output_format = Resolved::new(format.clone(), ValueSource::System);
    }

    // Resolve interval
    if let Some(interval) = overrides.interval {
        result.interval = Resolved::new(interval, ValueSource::CliFlag);
    } else if let Some(interval) = project_config.interval {
        result.interval = Resolved::new(interval, ValueSource::Project);
    } else if let Some(interval) = system_config.interval {
        result.interval = Resolved::new(interval, ValueSource::System);
    }

    // Resolve tag_mode
    if let Some(mode) = overrides.tag_mode {
        result.tag_mode = Resolved::new(mode, ValueSource::CliFlag);
    } else if let Some(mode) = project_config.tag_mode {
        result.tag_mode = Resolved::new(mode, ValueSource::Project);
    } else if let Some(mode) = system_config.tag_mode {
        result.tag_mode = Resolved::new(mode, ValueSource::System);
    }

    debug!(
        snapshot = ?result.snapshot.as_ref().map(|r| r.source.to_string()),
        output_format = %result.output_format.source,
        interval = %result.interval.source,
        tag_mode = %result.tag_mode.source,
        "resolved config"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestEnv;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write_system(env: &TestEnv, config: &RoadmapConfig) {
        config
            .save(&env.config_paths().system_config().unwrap())
            .unwrap();
    }

    fn write_project(env: &TestEnv, config: &RoadmapConfig) {
        config.save(&env.config_paths().project_config()).unwrap();
    }

    #[test]
    fn test_value_source_display() {
        assert_eq!(
            format!("{}", ValueSource::EnvVar("FOO".to_string())),
            "env:FOO"
        );
        assert_eq!(format!("{}", ValueSource::Project), "project");
        assert_eq!(format!("{}", ValueSource::System), "system");
        assert_eq!(format!("{}", ValueSource::CliFlag), "cli");
        assert_eq!(format!("{}", ValueSource::Default), "default");
    }

    #[test]
    fn test_config_paths() {
        let env = TestEnv::new();
        let paths = env.config_paths();

        assert_eq!(
            paths.project_config(),
            env.path().join(".roadmap").join("config.kdl")
        );
        assert_eq!(
            paths.system_config(),
            Some(env.system_dir.path().join("config.kdl"))
        );
        assert!(ConfigPaths::with_dirs(env.path(), None).system_config().is_none());
    }

    #[test]
    fn test_resolve_config_defaults() {
        let env = TestEnv::new();

        let config =
            resolve_config_with_env(&env.config_paths(), &ConfigOverrides::default(), no_env)
                .unwrap();

        assert!(config.snapshot.is_none());
        assert_eq!(*config.output_format(), OutputFormat::Json);
        assert_eq!(config.output_format.source, ValueSource::Default);
        assert_eq!(config.interval(), DisplayInterval::Month);
        assert_eq!(config.tag_mode(), TagMode::Any);
        assert_eq!(config.tag_mode.source, ValueSource::Default);
    }

    #[test]
    fn test_resolve_config_from_system() {
        let env = TestEnv::new();
        write_system(
            &env,
            &RoadmapConfig {
                snapshot: Some(PathBuf::from("shared.json")),
                interval: Some(DisplayInterval::Year),
                ..Default::default()
            },
        );

        let config =
            resolve_config_with_env(&env.config_paths(), &ConfigOverrides::default(), no_env)
                .unwrap();

        assert_eq!(
            config.snapshot(),
            Some(env.system_dir.path().join("shared.json").as_path())
        );
        assert_eq!(config.snapshot.as_ref().unwrap().source, ValueSource::System);
        assert_eq!(config.interval(), DisplayInterval::Year);
        assert_eq!(config.interval.source, ValueSource::System);
    }

    #[test]
    fn test_resolve_config_project_overrides_system() {
        let env = TestEnv::new();
        write_system(
            &env,
            &RoadmapConfig {
                snapshot: Some(PathBuf::from("shared.json")),
                output_format: Some(OutputFormat::Human),
                tag_mode: Some(TagMode::All),
                ..Default::default()
            },
        );
        write_project(
            &env,
            &RoadmapConfig {
                snapshot: Some(PathBuf::from("team.json")),
                tag_mode: Some(TagMode::AnyTop),
                ..Default::default()
            },
        );

        let config =
            resolve_config_with_env(&env.config_paths(), &ConfigOverrides::default(), no_env)
                .unwrap();

        assert_eq!(config.snapshot(), Some(env.path().join("team.json").as_path()));
        assert_eq!(
            config.snapshot.as_ref().unwrap().source,
            ValueSource::Project
        );
        assert_eq!(config.tag_mode(), TagMode::AnyTop);
        assert_eq!(config.tag_mode.source, ValueSource::Project);
        // Not set in project, falls through to system
        assert_eq!(*config.output_format(), OutputFormat::Human);
        assert_eq!(config.output_format.source, ValueSource::System);
    }

    #[test]
    fn test_resolve_config_env_overrides_project() {
        let env = TestEnv::new();
        write_project(
            &env,
            &RoadmapConfig {
                snapshot: Some(PathBuf::from("team.json")),
                ..Default::default()
            },
        );

        let config = resolve_config_with_env(
            &env.config_paths(),
            &ConfigOverrides::default(),
            |name| (name == SNAPSHOT_ENV).then(|| "/tmp/env.json".to_string()),
        )
        .unwrap();

        assert_eq!(config.snapshot(), Some(Path::new("/tmp/env.json")));
        assert_eq!(
            config.snapshot.as_ref().unwrap().source,
            ValueSource::EnvVar(SNAPSHOT_ENV.to_string())
        );
    }

    #[test]
    fn test_resolve_config_cli_overrides_everything() {
        let env = TestEnv::new();
        write_project(
            &env,
            &RoadmapConfig {
                snapshot: Some(PathBuf::from("team.json")),
                output_format: Some(OutputFormat::Human),
                interval: Some(DisplayInterval::Week),
                tag_mode: Some(TagMode::All),
            },
        );

        let overrides = ConfigOverrides::new()
            .with_snapshot("cli.json")
            .with_output_format(OutputFormat::Json)
            .with_interval(DisplayInterval::Sprint)
            .with_tag_mode(TagMode::AllTop);
        let config = resolve_config_with_env(&env.config_paths(), &overrides, |_| {
            Some("/tmp/env.json".to_string())
        })
        .unwrap();

        assert_eq!(config.snapshot(), Some(Path::new("cli.json")));
        assert_eq!(config.snapshot.as_ref().unwrap().source, ValueSource::CliFlag);
        assert_eq!(*config.output_format(), OutputFormat::Json);
        assert_eq!(config.output_format.source, ValueSource::CliFlag);
        assert_eq!(config.interval(), DisplayInterval::Sprint);
        assert_eq!(config.tag_mode(), TagMode::AllTop);
    }

    #[test]
    fn test_resolve_config_invalid_project_file() {
        let env = TestEnv::new();
        env.write(".roadmap/config.kdl", "interval {");

        let result =
            resolve_config_with_env(&env.config_paths(), &ConfigOverrides::default(), no_env);
        assert!(matches!(result, Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_resolved_config_serializes_sources() {
        let config = ResolvedConfig::default();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["output_format"]["value"], "json");
        assert_eq!(json["output_format"]["source"], "default");
        assert_eq!(json["interval"]["value"], "Month");
        assert_eq!(json["tag_mode"]["value"], "any");
    }
}
