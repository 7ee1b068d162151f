//! Gantt chart records produced from a projection.
//!
//! Field names follow what DHTMLX-style Gantt renderers read (`text`,
//! `start_date`, `end_date`, `unscheduled`, ...). Dates are formatted as
//! ISO `YYYY-MM-DD` and progress is scaled to `[0, 1]`.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::filter::Projection;
use crate::models::{DisplayInterval, WorkItem, WorkItemId, WorkItemTypes};

/// Date format used for task bounds.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// CSS class for tasks whose schedule is only an estimate.
pub const ESTIMATED_CLASS: &str = "gantt-estimated";

/// Percentage a bar color is brightened by relative to its progress color.
const BRIGHTEN_PERCENT: u8 = 20;

/// Format a date for the Gantt chart.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Kind of dependency between two tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkType {
    /// Source must finish before target starts
    #[default]
    #[serde(rename = "finish-to-start")]
    FinishToStart,
}

/// A dependency where the predecessor `source` must happen before the
/// successor `target`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GanttLink {
    /// Unique link id (`<source>-<target>`)
    pub id: String,
    /// Predecessor id
    pub source: String,
    /// Successor id
    pub target: String,
    /// Dependency kind
    #[serde(rename = "type")]
    pub link_type: LinkType,
}

impl GanttLink {
    /// Create a finish-to-start link.
    pub fn finish_to_start(source: WorkItemId, target: WorkItemId) -> Self {
        Self {
            id: format!("{}-{}", source, target),
            source: source.to_string(),
            target: target.to_string(),
            link_type: LinkType::FinishToStart,
        }
    }
}

/// A row of the Gantt chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GanttTask {
    /// Work item id
    pub id: String,

    /// Title shown for the task
    pub text: String,

    /// Start date (`YYYY-MM-DD`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,

    /// End date (`YYYY-MM-DD`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,

    /// Completion where 1 is done
    pub progress: f64,

    /// Expanded in the tree view
    pub open: bool,

    /// Parent task id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// Renderer task type
    #[serde(rename = "type")]
    pub task_type: String,

    /// Work item type in the tracking system
    pub work_item_type: String,

    /// Set when the task lacks a start or an end date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unscheduled: Option<bool>,

    /// Work item description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Workflow state
    pub state: String,

    /// Start date was derived
    pub calculated_start: bool,

    /// End date was derived
    pub calculated_end: bool,

    /// Bar background color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Progress fill color (the work item type's color)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_color: Option<String>,

    /// Extra CSS class for the bar
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css_class: Option<String>,
}

impl GanttTask {
    /// Convert a projected work item into a Gantt row.
    ///
    /// The item's `parent` is expected to already point at a visible task.
    pub fn from_item(item: &WorkItem, types: &WorkItemTypes, colors: &mut ColorCache) -> Self {
        let ty = types.get(&item.work_item_type);

        let progress_color = ty.and_then(|t| t.color.as_deref()).map(|c| {
            normalize_hex(c).unwrap_or_else(|| c.to_string())
        });
        let color = progress_color.as_deref().and_then(|c| colors.lighter(c));

        let css_class = ty
            .filter(|t| t.is_estimated(&item.state))
            .map(|_| ESTIMATED_CLASS.to_string());

        let scheduled = item.start.is_some() && item.end.is_some();

        Self {
            id: item.id.to_string(),
            text: item.title.clone(),
            start_date: item.start.map(format_date),
            end_date: item.end.map(format_date),
            progress: item.progress / 100.0,
            open: true,
            parent: item.parent_id().map(|p| p.to_string()),
            task_type: "task".to_string(),
            work_item_type: item.work_item_type.clone(),
            unscheduled: if scheduled { None } else { Some(true) },
            description: item.description.clone(),
            state: item.state.clone(),
            calculated_start: item.calculated_start,
            calculated_end: item.calculated_end,
            color,
            progress_color,
            css_class,
        }
    }

    /// Whether both bounds are set.
    pub fn is_scheduled(&self) -> bool {
        self.unscheduled != Some(true)
    }
}

/// Tasks and links handed to the renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GanttData {
    /// Rows in display order
    pub tasks: Vec<GanttTask>,
    /// Dependencies between rows
    pub links: Vec<GanttLink>,
}

/// Gantt chart configuration including the data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GanttConfig {
    /// Time scale of the chart
    pub unit: DisplayInterval,
    /// Chart data
    pub data: GanttData,
}

impl GanttConfig {
    /// Build the chart configuration for a projection.
    pub fn from_projection(
        projection: &Projection,
        types: &WorkItemTypes,
        unit: DisplayInterval,
    ) -> Self {
        let mut colors = ColorCache::new();
        let tasks = projection
            .tasks
            .iter()
            .map(|item| GanttTask::from_item(item, types, &mut colors))
            .collect();

        Self {
            unit,
            data: GanttData {
                tasks,
                links: projection.links.clone(),
            },
        }
    }
}

/// Memoizes brightened bar colors per progress color.
#[derive(Debug, Clone, Default)]
pub struct ColorCache {
    lighter: HashMap<String, Option<String>>,
}

impl ColorCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The bar color for `progress_color`, or `None` if it is not a hex color.
    pub fn lighter(&mut self, progress_color: &str) -> Option<String> {
        self.lighter
            .entry(progress_color.to_string())
            .or_insert_with(|| brighten(progress_color, BRIGHTEN_PERCENT))
            .clone()
    }
}

/// Brighten a hex color by `percent` of full scale on every channel.
///
/// Accepts `#rrggbb`, `rrggbb`, `#rgb` or `rgb`; returns `#rrggbb` in lower case.
pub fn brighten(color: &str, percent: u8) -> Option<String> {
    let (r, g, b) = parse_hex(color)?;
    let step = (255.0 * f64::from(percent) / 100.0).round() as u16;
    let channel = |c: u8| (u16::from(c) + step).min(255) as u8;
    Some(format!("#{:02x}{:02x}{:02x}", channel(r), channel(g), channel(b)))
}

fn normalize_hex(color: &str) -> Option<String> {
    let (r, g, b) = parse_hex(color)?;
    Some(format!("#{:02x}{:02x}{:02x}", r, g, b))
}

fn parse_hex(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.trim().trim_start_matches('#');
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        6 => Some((
            u8::from_str_radix(&hex[0..2], 16).ok()?,
            u8::from_str_radix(&hex[2..4], 16).ok()?,
            u8::from_str_radix(&hex[4..6], 16).ok()?,
        )),
        3 => {
            let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|d| d * 17);
            Some((digit(0)?, digit(1)?, digit(2)?))
        }
        _ => None,
    }
}
