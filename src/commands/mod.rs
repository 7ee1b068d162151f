//! Command implementations for the roadmap CLI.
//!
//! This module contains the business logic for each CLI command. Every
//! command returns a result struct implementing [`Output`], which the binary
//! prints as JSON or as human-readable text.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::info;

use crate::cli::BuildArgs;
use crate::config::{ConfigOverrides, ConfigPaths, ResolvedConfig, RoadmapConfig};
use crate::dates::{self, ChangedAfterPreset};
use crate::models::{BacklogLevel, DisplayInterval, WorkItem, WorkItemId};
use crate::roadmap::{FilterCriteria, GanttConfig, Roadmap, TagFilter, TagMode};
use crate::source::{AreaPathOption, Snapshot};
use crate::{Error, Result};

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

fn json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!(r#"{{"error": "{}"}}"#, e))
}

/// Load the snapshot named by the resolved configuration.
pub fn load_snapshot(config: &ResolvedConfig) -> Result<Snapshot> {
    let path = config.snapshot().ok_or_else(|| {
        Error::NotConfigured(
            "No snapshot configured. Pass --snapshot, set ROADMAP_SNAPSHOT, or run `roadmap config set snapshot <path>`".to_string(),
        )
    })?;
    Snapshot::load(path)
}

// === Build ===

/// Result of `roadmap build`.
#[derive(Debug, Serialize)]
pub struct BuildResult {
    /// Chart configuration with tasks and links
    #[serde(flatten)]
    pub gantt: GanttConfig,
}

impl Output for BuildResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let tasks = &self.gantt.data.tasks;
        if tasks.is_empty() {
            return "No work items match the current filters.".to_string();
        }

        let mut lines = vec![format!(
            "{} work item(s), {} link(s), interval {}:",
            tasks.len(),
            self.gantt.data.links.len(),
            self.gantt.unit
        )];
        let mut depth: HashMap<&str, usize> = HashMap::new();
        for task in tasks {
            let level = task
                .parent
                .as_deref()
                .and_then(|p| depth.get(p))
                .map_or(0, |d| d + 1);
            depth.insert(task.id.as_str(), level);

            let schedule = if task.is_scheduled() {
                format!(
                    "{} .. {}",
                    task.start_date.as_deref().unwrap_or("?"),
                    task.end_date.as_deref().unwrap_or("?")
                )
            } else {
                "unscheduled".to_string()
            };
            lines.push(format!(
                "{}[{}] {}: {} ({}, {:.0}%)",
                "  ".repeat(level + 1),
                task.id,
                task.work_item_type,
                task.text,
                schedule,
                task.progress * 100.0
            ));
        }
        for link in &self.gantt.data.links {
            lines.push(format!("  {} -> {}", link.source, link.target));
        }
        lines.join("\n")
    }
}

/// Add the `--interval` and `--tag-mode` flags of `roadmap build` to the
/// CLI overrides, so the resolved config reports them with a `cli` source.
pub fn build_overrides(
    args: &BuildArgs,
    mut overrides: ConfigOverrides,
) -> Result<ConfigOverrides> {
    if let Some(ref s) = args.interval {
        let interval = DisplayInterval::parse(s)
            .ok_or_else(|| Error::InvalidInput(format!("Invalid interval: {}", s)))?;
        overrides = overrides.with_interval(interval);
    }
    if let Some(ref s) = args.tag_mode {
        let mode = TagMode::parse(s)
            .ok_or_else(|| Error::InvalidInput(format!("Invalid tag mode: {}", s)))?;
        overrides = overrides.with_tag_mode(mode);
    }
    Ok(overrides)
}

/// Turn CLI filter flags into criteria, expanding backlog levels to types.
pub fn build_criteria(
    snapshot: &Snapshot,
    args: &BuildArgs,
    mode: TagMode,
) -> Result<FilterCriteria> {
    let mut types = args.types.clone();
    for ty in snapshot.types_for_levels(&args.levels)? {
        if !types.contains(&ty) {
            types.push(ty);
        }
    }

    let mut criteria = FilterCriteria::new()
        .with_area_paths(args.areas.iter().cloned())
        .with_work_item_types(types);
    if let Some(ref keyword) = args.keyword {
        criteria = criteria.with_keyword(keyword.clone());
    }
    if !args.tags.is_empty() {
        criteria = criteria.with_tags(TagFilter::new(args.tags.iter().cloned(), mode));
    }
    Ok(criteria)
}

/// Build the filtered Gantt view.
///
/// The interval and tag mode come from `config`; resolve it with
/// [`build_overrides`] applied to honor the flags in `args`.
pub fn build(config: &ResolvedConfig, args: &BuildArgs, today: NaiveDate) -> Result<BuildResult> {
    let mut snapshot = load_snapshot(config)?;

    if let Some(ref since) = args.changed_since {
        let date = dates::parse_changed_since(since, today)?;
        snapshot.filter_changed_since(date);
    }

    let unit = config.interval();
    let criteria = build_criteria(&snapshot, args, config.tag_mode())?;

    let metadata = snapshot.metadata();
    let roadmap = Roadmap::build(snapshot.items, metadata);
    let gantt = roadmap.gantt(&criteria, unit);
    info!(
        tasks = gantt.data.tasks.len(),
        links = gantt.data.links.len(),
        "built gantt view"
    );
    Ok(BuildResult { gantt })
}

// === Show ===

/// An ancestor in a work item's chain.
#[derive(Debug, Serialize)]
pub struct AncestorSummary {
    pub id: WorkItemId,
    pub title: String,
    #[serde(rename = "type")]
    pub work_item_type: String,
}

/// Result of `roadmap show`.
#[derive(Debug, Serialize)]
pub struct ShowResult {
    /// Aggregated work item
    pub item: WorkItem,
    /// Ancestors, nearest first
    pub ancestors: Vec<AncestorSummary>,
    /// Direct children ids
    pub children: Vec<WorkItemId>,
}

impl Output for ShowResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let item = &self.item;
        let mut lines = vec![
            format!("[{}] {}: {}", item.id, item.work_item_type, item.title),
            format!(
                "  State: {}",
                if item.state.is_empty() { "-" } else { item.state.as_str() }
            ),
            format!("  Progress: {:.0}%", item.progress),
        ];

        let date = |d: Option<NaiveDate>, calculated: bool| match d {
            Some(d) if calculated => format!("{} (calculated)", d),
            Some(d) => d.to_string(),
            None => "-".to_string(),
        };
        lines.push(format!(
            "  Start: {}",
            date(item.start, item.calculated_start)
        ));
        lines.push(format!("  End: {}", date(item.end, item.calculated_end)));

        if !item.area_path.is_empty() {
            lines.push(format!("  Area: {}", item.area_path));
        }
        if !item.tags.is_empty() {
            let tags: Vec<&str> = item.tags.iter().map(String::as_str).collect();
            lines.push(format!("  Tags: {}", tags.join(", ")));
        }
        if !self.ancestors.is_empty() {
            lines.push("  Ancestors:".to_string());
            for a in &self.ancestors {
                lines.push(format!("    [{}] {}: {}", a.id, a.work_item_type, a.title));
            }
        }
        if !self.children.is_empty() {
            let ids: Vec<String> = self.children.iter().map(|c| c.to_string()).collect();
            lines.push(format!("  Children: {}", ids.join(", ")));
        }
        lines.join("\n")
    }
}

/// Show an aggregated work item with its ancestor chain.
pub fn show(config: &ResolvedConfig, id: WorkItemId) -> Result<ShowResult> {
    let snapshot = load_snapshot(config)?;
    let metadata = snapshot.metadata();
    let roadmap = Roadmap::build(snapshot.items, metadata);

    let item = roadmap
        .get(id)
        .cloned()
        .ok_or_else(|| Error::NotFound(format!("Work item not found: {}", id)))?;
    let ancestors = roadmap
        .ancestors(id)
        .into_iter()
        .filter_map(|a| roadmap.get(a))
        .map(|a| AncestorSummary {
            id: a.id,
            title: a.title.clone(),
            work_item_type: a.work_item_type.clone(),
        })
        .collect();
    let children = roadmap
        .tree()
        .get(id)
        .map(|node| node.children.clone())
        .unwrap_or_default();

    Ok(ShowResult {
        item,
        ancestors,
        children,
    })
}

// === Areas ===

/// Result of `roadmap areas`.
#[derive(Debug, Serialize)]
pub struct AreasResult {
    pub count: usize,
    pub areas: Vec<AreaPathOption>,
}

impl Output for AreasResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.areas.is_empty() {
            return "No area paths found.".to_string();
        }
        let mut lines = vec![format!("{} area path(s):", self.count)];
        for area in &self.areas {
            lines.push(format!("  {} ({})", area.path, area.name));
        }
        lines.join("\n")
    }
}

/// List area path options.
pub fn areas(config: &ResolvedConfig) -> Result<AreasResult> {
    let areas = load_snapshot(config)?.area_path_options();
    Ok(AreasResult {
        count: areas.len(),
        areas,
    })
}

// === Levels ===

/// Result of `roadmap levels`.
#[derive(Debug, Serialize)]
pub struct LevelsResult {
    pub count: usize,
    pub levels: Vec<BacklogLevel>,
}

impl Output for LevelsResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.levels.is_empty() {
            return "No backlog levels found.".to_string();
        }
        let mut lines = vec![format!("{} backlog level(s):", self.count)];
        for level in &self.levels {
            lines.push(format!(
                "  {} (rank {}): {}",
                level.name,
                level.rank,
                level.work_item_types.join(", ")
            ));
        }
        lines.join("\n")
    }
}

/// List backlog levels, highest rank first.
pub fn levels(config: &ResolvedConfig) -> Result<LevelsResult> {
    let levels = load_snapshot(config)?.backlog_levels();
    Ok(LevelsResult {
        count: levels.len(),
        levels,
    })
}

// === Intervals ===

/// Result of `roadmap intervals`.
#[derive(Debug, Serialize)]
pub struct IntervalsResult {
    pub intervals: Vec<DisplayInterval>,
    pub default: DisplayInterval,
}

impl Output for IntervalsResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        self.intervals
            .iter()
            .map(|i| {
                if *i == self.default {
                    format!("{} (default)", i)
                } else {
                    i.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// List display intervals, marking the configured one as default.
pub fn intervals(config: &ResolvedConfig) -> IntervalsResult {
    IntervalsResult {
        intervals: DisplayInterval::ALL.to_vec(),
        default: config.interval(),
    }
}

// === Presets ===

/// Result of `roadmap presets`.
#[derive(Debug, Serialize)]
pub struct PresetsResult {
    pub presets: Vec<ChangedAfterPreset>,
}

impl Output for PresetsResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        self.presets
            .iter()
            .map(|p| p.text.clone())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// List "changed after" presets relative to `today`.
pub fn presets(today: NaiveDate) -> PresetsResult {
    PresetsResult {
        presets: dates::changed_after_presets(today),
    }
}

// === Config ===

/// Result of `roadmap config show`.
#[derive(Debug, Serialize)]
pub struct ConfigShowResult {
    pub config: ResolvedConfig,
    pub project_config: PathBuf,
    pub system_config: Option<PathBuf>,
}

impl Output for ConfigShowResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let c = &self.config;
        let snapshot = match c.snapshot {
            Some(ref r) => format!("{} ({})", r.value.display(), r.source),
            None => "(not set)".to_string(),
        };
        let mut lines = vec![
            format!("snapshot: {}", snapshot),
            format!(
                "output-format: {} ({})",
                c.output_format.value, c.output_format.source
            ),
            format!("interval: {} ({})", c.interval.value, c.interval.source),
            format!("tag-mode: {} ({})", c.tag_mode.value, c.tag_mode.source),
            String::new(),
            format!("Project config: {}", self.project_config.display()),
        ];
        match self.system_config {
            Some(ref path) => lines.push(format!("System config: {}", path.display())),
            None => lines.push("System config: (unavailable)".to_string()),
        }
        lines.join("\n")
    }
}

/// Show the resolved configuration with value sources.
pub fn config_show(config: &ResolvedConfig, paths: &ConfigPaths) -> ConfigShowResult {
    ConfigShowResult {
        config: config.clone(),
        project_config: paths.project_config(),
        system_config: paths.system_config(),
    }
}

/// Result of `roadmap config set`.
#[derive(Debug, Serialize)]
pub struct ConfigSetResult {
    pub key: String,
    pub value: String,
    pub path: PathBuf,
}

impl Output for ConfigSetResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!("Set {} = {} in {}", self.key, self.value, self.path.display())
    }
}

/// Set a configuration value in the project or system config file.
pub fn config_set(
    paths: &ConfigPaths,
    key: &str,
    value: &str,
    system: bool,
) -> Result<ConfigSetResult> {
    let path = if system {
        paths.system_config().ok_or_else(|| {
            Error::Config("Cannot determine system config directory".to_string())
        })?
    } else {
        paths.project_config()
    };

    let mut config = RoadmapConfig::load(&path)?;
    config.set(key, value)?;
    config.save(&path)?;
    info!(key, path = %path.display(), "updated config");

    Ok(ConfigSetResult {
        key: key.to_string(),
        value: value.to_string(),
        path,
    })
}
