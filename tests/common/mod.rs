//! Common test utilities for roadmap integration tests.
//!
//! Provides `TestEnv` for isolated test environments that don't read the
//! user's `~/.config/roadmap/` directory.

#![allow(dead_code)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
pub use tempfile::TempDir;

/// Snapshot with one epic, two features and a story.
///
/// - 1 Epic "Ship v2" (tag `q3`, area `Proj\Web`)
/// - 2 Feature "Ship checkout" under 1, Done, dated January 2024
/// - 3 Feature "Reporting" under 1, Active, area `Proj\Data`, after 2
/// - 4 User Story "Export CSV" under 3, sprint 1 dates via its iteration
pub const SAMPLE_SNAPSHOT: &str = r##"{
    "items": [
        {"id": 1, "title": "Ship v2", "type": "Epic", "state": "Active",
         "area_path": "Proj\\Web", "tags": ["q3"],
         "changed_date": "2024-06-01T08:00:00Z"},
        {"id": 2, "parent": 1, "title": "Ship checkout", "type": "Feature",
         "state": "Done", "area_path": "Proj\\Web\\Checkout",
         "start": "2024-01-01", "end": "2024-01-31",
         "changed_date": "2024-02-01T08:00:00Z"},
        {"id": 3, "parent": 1, "title": "Reporting", "type": "Feature",
         "state": "Active", "area_path": "Proj\\Data", "predecessors": [2],
         "changed_date": "2019-05-05T08:00:00Z"},
        {"id": 4, "parent": 3, "title": "Export CSV", "type": "User Story",
         "state": "New", "area_path": "Proj\\Data\\Exports",
         "iteration_path": "Proj\\Sprint 1"}
    ],
    "work_item_types": {
        "Epic": {"completed_states": ["Done"], "in_progress_states": ["Active"], "color": "#FF7B00"},
        "Feature": {"completed_states": ["Done"], "in_progress_states": ["Active"], "color": "#773B93"},
        "User Story": {"completed_states": ["Closed"], "removed_states": ["Removed"],
                       "in_progress_states": ["Active"], "color": "#009CCC"}
    },
    "iterations": {
        "Proj\\Sprint 1": {"start_date": "2024-02-05", "finish_date": "2024-02-16"}
    },
    "backlog_levels": [
        {"name": "Stories", "rank": 1, "work_item_types": ["User Story"]},
        {"name": "Epics", "rank": 3, "work_item_types": ["Epic"]},
        {"name": "Features", "rank": 2, "work_item_types": ["Feature"]}
    ]
}"##;

/// A test environment with isolated config directories.
///
/// Each `TestEnv` creates two temporary directories:
/// - `project_dir`: Working directory (holds `.roadmap/config.kdl`)
/// - `config_dir`: System config directory (via `ROADMAP_CONFIG_DIR`)
///
/// The `roadmap()` method returns a `Command` that sets the environment
/// per-invocation, making tests parallel-safe.
pub struct TestEnv {
    pub project_dir: TempDir,
    pub config_dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with isolated directories.
    pub fn new() -> Self {
        Self {
            project_dir: TempDir::new().unwrap(),
            config_dir: TempDir::new().unwrap(),
        }
    }

    /// Create a test environment with `SAMPLE_SNAPSHOT` written to
    /// `snapshot.json` in the project directory.
    pub fn with_sample() -> Self {
        let env = Self::new();
        env.write_snapshot(SAMPLE_SNAPSHOT);
        env
    }

    /// Get a Command for the roadmap binary with isolated configuration.
    pub fn roadmap(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_roadmap"));
        cmd.current_dir(self.project_dir.path());
        cmd.env("ROADMAP_CONFIG_DIR", self.config_dir.path());
        cmd.env_remove("ROADMAP_SNAPSHOT");
        cmd.env_remove("ROADMAP_DIR");
        cmd.env_remove("ROADMAP_LOG");
        cmd
    }

    /// Get the path to the project directory.
    pub fn path(&self) -> &Path {
        self.project_dir.path()
    }

    /// Path of `snapshot.json` in the project directory.
    pub fn snapshot_path(&self) -> PathBuf {
        self.path().join("snapshot.json")
    }

    /// Write `snapshot.json` in the project directory.
    pub fn write_snapshot(&self, contents: &str) -> PathBuf {
        let path = self.snapshot_path();
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// Write the project config file.
    pub fn write_project_config(&self, contents: &str) {
        let dir = self.path().join(".roadmap");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.kdl"), contents).unwrap();
    }

    /// Write the system config file.
    pub fn write_system_config(&self, contents: &str) {
        std::fs::write(self.config_dir.path().join("config.kdl"), contents).unwrap();
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse command stdout as JSON.
pub fn parse_json(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).unwrap()
}
