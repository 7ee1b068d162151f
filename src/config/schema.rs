//! KDL schema definitions for config.kdl.
//!
//! This module provides:
//! - Rust structs representing the KDL schema
//! - Serialization/deserialization to/from KDL format
//! - Validation functions
//! - Loading and saving config files

use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::models::DisplayInterval;
use crate::roadmap::TagMode;
use crate::{Error, Result};

/// Config keys understood in config.kdl.
pub const CONFIG_KEYS: [&str; 4] = ["snapshot", "output-format", "interval", "tag-mode"];

/// Output format preference for CLI commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON output (default, machine-readable)
    #[default]
    Json,
    /// Human-readable output
    Human,
}

impl OutputFormat {
    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "human" => Some(OutputFormat::Human),
            _ => None,
        }
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Human => "human",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Preferences stored in config.kdl.
///
/// # KDL Schema
///
/// ```kdl
/// snapshot "exports/roadmap.json"
/// output-format "human"  // or "json"
/// interval "Quarter"
/// tag-mode "any-top"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapConfig {
    /// Snapshot file to load work items from
    pub snapshot: Option<PathBuf>,

    /// Default output format for CLI commands
    pub output_format: Option<OutputFormat>,

    /// Default Gantt display interval
    pub interval: Option<DisplayInterval>,

    /// Default tag filter mode
    pub tag_mode: Option<TagMode>,
}

fn string_arg<'a>(doc: &'a KdlDocument, key: &str) -> Option<&'a str> {
    doc.get(key)
        .and_then(|node| node.entries().first())
        .and_then(|entry| entry.value().as_string())
}

fn string_node(key: &str, value: &str) -> KdlNode {
    let mut node = KdlNode::new(key);
    node.push(KdlEntry::new(KdlValue::String(value.to_string())));
    node
}

impl RoadmapConfig {
    /// Create an empty config with no values set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no value is set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Validate the config values.
    ///
    /// Returns an error message if any value is invalid.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if let Some(ref snapshot) = self.snapshot {
            if snapshot.as_os_str().is_empty() {
                return Err("snapshot must not be empty".to_string());
            }
        }
        Ok(())
    }

    /// Parse config from a KDL document.
    ///
    /// Unrecognized values are skipped with a warning.
    pub fn from_kdl(doc: &KdlDocument) -> Self {
        let mut config = Self::new();

        if let Some(s) = string_arg(doc, "snapshot") {
            config.snapshot = Some(PathBuf::from(s));
        }

        if let Some(s) = string_arg(doc, "output-format") {
            config.output_format = OutputFormat::parse(s);
            if config.output_format.is_none() {
                warn!(value = s, "ignoring unknown output-format");
            }
        }

        if let Some(s) = string_arg(doc, "interval") {
            config.interval = DisplayInterval::parse(s);
            if config.interval.is_none() {
                warn!(value = s, "ignoring unknown interval");
            }
        }

        if let Some(s) = string_arg(doc, "tag-mode") {
            config.tag_mode = TagMode::parse(s);
            if config.tag_mode.is_none() {
                warn!(value = s, "ignoring unknown tag-mode");
            }
        }

        config
    }

    /// Convert config to a KDL document.
    pub fn to_kdl(&self) -> KdlDocument {
        let mut doc = KdlDocument::new();

        if let Some(ref snapshot) = self.snapshot {
            doc.nodes_mut()
                .push(string_node("snapshot", &snapshot.to_string_lossy()));
        }
        if let Some(ref format) = self.output_format {
            doc.nodes_mut()
                .push(string_node("output-format", format.as_str()));
        }
        if let Some(interval) = self.interval {
            doc.nodes_mut().push(string_node("interval", interval.as_str()));
        }
        if let Some(mode) = self.tag_mode {
            doc.nodes_mut().push(string_node("tag-mode", mode.as_str()));
        }

        doc
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` if they are Some.
    pub fn merge(&mut self, other: &RoadmapConfig) {
        if other.snapshot.is_some() {
            self.snapshot = other.snapshot.clone();
        }
        if other.output_format.is_some() {
            self.output_format = other.output_format.clone();
        }
        if other.interval.is_some() {
            self.interval = other.interval;
        }
        if other.tag_mode.is_some() {
            self.tag_mode = other.tag_mode;
        }
    }

    /// Set a single key from its string form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "snapshot" => self.snapshot = Some(PathBuf::from(value)),
            "output-format" => {
                self.output_format = Some(OutputFormat::parse(value).ok_or_else(|| {
                    Error::InvalidInput(format!(
                        "Invalid output-format '{}': expected json or human",
                        value
                    ))
                })?)
            }
            "interval" => {
                self.interval = Some(DisplayInterval::parse(value).ok_or_else(|| {
                    Error::InvalidInput(format!("Invalid interval '{}'", value))
                })?)
            }
            "tag-mode" => {
                self.tag_mode = Some(TagMode::parse(value).ok_or_else(|| {
                    Error::InvalidInput(format!(
                        "Invalid tag-mode '{}': expected any, all, any-top or all-top",
                        value
                    ))
                })?)
            }
            _ => {
                return Err(Error::InvalidInput(format!(
                    "Unknown config key '{}'. Valid keys: {}",
                    key,
                    CONFIG_KEYS.join(", ")
                )));
            }
        }
        self.validate().map_err(Error::Config)
    }

    /// Load config from a file. A missing file is an empty config.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Other(format!("Failed to read {}: {}", path.display(), e)))?;

        let doc: KdlDocument = content.parse().map_err(|e| {
            Error::Config(format!("Failed to parse KDL in {}: {}", path.display(), e))
        })?;

        let config = Self::from_kdl(&doc);
        config
            .validate()
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// Write config to a file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_kdl().to_string())?;
        Ok(())
    }
}
