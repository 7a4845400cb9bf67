use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::warn;

use crate::error::{Error, Result};
use crate::store::{canonical_platform, PLATFORM_ALL};

pub const AUDIT_TABLE: &str = "evolve/audit.csv";
pub const CANONICAL_DOC: &str = "EVOLVE.md";
pub const RULES_DIR: &str = "evolve/rules";
pub const HISTORY_DIR: &str = "evolve/history";
pub const RUNBOOKS_DIR: &str = "evolve/runbooks";
pub const PLATFORM_TARGETS_CONFIG: &str = "evolve/platform_targets.json";

/// Where every artefact lives relative to the project root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    /// Resolve a project root. A root that does not exist is fatal.
    pub fn resolve(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::ProjectRoot(root));
        }
        Ok(Self { root })
    }

    /// Layout without the existence check, for callers that create the root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn audit_table(&self) -> PathBuf {
        self.root.join(AUDIT_TABLE)
    }

    pub fn canonical_doc(&self) -> PathBuf {
        self.root.join(CANONICAL_DOC)
    }

    pub fn rules_dir(&self) -> PathBuf {
        self.root.join(RULES_DIR)
    }

    pub fn history_dir(&self) -> PathBuf {
        self.root.join(HISTORY_DIR)
    }

    pub fn runbooks_dir(&self) -> PathBuf {
        self.root.join(RUNBOOKS_DIR)
    }

    pub fn platform_targets_config(&self) -> PathBuf {
        self.root.join(PLATFORM_TARGETS_CONFIG)
    }

    /// Detail document for a rule; unsafe filename characters become `_`.
    pub fn rule_detail_path(&self, rule_id: &str) -> PathBuf {
        let mut safe = String::new();
        let mut in_run = false;
        for ch in rule_id.trim().chars() {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
                safe.push(ch);
                in_run = false;
            } else if !in_run {
                safe.push('_');
                in_run = true;
            }
        }
        if safe.is_empty() {
            safe.push_str("rule");
        }
        self.rules_dir().join(format!("{safe}.md"))
    }

    /// Path relative to the root with `/` separators, or the full path when
    /// it lies outside the root.
    pub fn relative_posix(&self, path: &Path) -> String {
        match path.strip_prefix(&self.root) {
            Ok(rel) => rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
            Err(_) => path.to_string_lossy().replace('\\', "/"),
        }
    }
}

/// Explicit platform -> target file mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformTargets {
    pub files: BTreeMap<String, String>,
    pub warnings: Vec<String>,
}

impl PlatformTargets {
    /// Load `evolve/platform_targets.json`. A missing file is an empty
    /// mapping; a malformed one is an empty mapping plus a warning.
    pub fn load(layout: &ProjectLayout) -> Self {
        let path = layout.platform_targets_config();
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => Self::parse(&text),
            Err(e) => {
                let message = format!("failed to read platform target config {}: {e}", path.display());
                warn!("{message}");
                Self {
                    files: BTreeMap::new(),
                    warnings: vec![message],
                }
            }
        }
    }

    /// Accepts `{"platform_file_map": {...}}`, `{"platform_files": {...}}`,
    /// or a flat `{platform: path}` object.
    pub fn parse(text: &str) -> Self {
        let mut targets = Self::default();
        let value: Value = match serde_json::from_str(text) {
            Ok(v) => v,
            Err(e) => {
                let message = format!("malformed platform target config: {e}");
                warn!("{message}");
                targets.warnings.push(message);
                return targets;
            }
        };
        let Some(object) = value.as_object() else {
            let message = "platform target config is not a JSON object".to_string();
            warn!("{message}");
            targets.warnings.push(message);
            return targets;
        };

        const NESTED_KEYS: [&str; 2] = ["platform_file_map", "platform_files"];
        let mut raw: Vec<(&String, &Value)> = Vec::new();
        if NESTED_KEYS.iter().any(|k| object.contains_key(*k)) {
            for key in NESTED_KEYS {
                if let Some(Value::Object(nested)) = object.get(key) {
                    raw.extend(nested.iter());
                }
            }
        } else {
            raw.extend(object.iter());
        }

        for (platform, file) in raw {
            let Some(file) = file.as_str() else {
                targets
                    .warnings
                    .push(format!("ignoring non-string target for platform {platform:?}"));
                continue;
            };
            let platform = canonical_platform(platform);
            let file = file.trim();
            if platform == PLATFORM_ALL || file.is_empty() {
                continue;
            }
            targets.files.insert(platform, file.to_string());
        }
        targets
    }

    pub fn get(&self, platform: &str) -> Option<&str> {
        self.files.get(platform).map(String::as_str)
    }
}
