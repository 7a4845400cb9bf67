use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::warn;
use walkdir::WalkDir;

use crate::config::{PlatformTargets, ProjectLayout};
use crate::document::{Document, RegionKind};
use crate::store::{
    canonical_platform, default_platform_filename, KnownPlatform, RuleRecord, PLATFORM_ALL,
};

/// How a platform's target path was decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetSource {
    Config,
    Marker,
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformTarget {
    pub platform: String,
    pub path: PathBuf,
    pub source: TargetSource,
}

/// Platforms that already own a block in a root-level Markdown file.
/// Files are scanned in name order and the first block per platform wins.
pub fn scan_markers(layout: &ProjectLayout) -> BTreeMap<String, PathBuf> {
    let mut markers = BTreeMap::new();
    let entries = WalkDir::new(layout.root())
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "md"));

    for entry in entries {
        let text = match std::fs::read_to_string(entry.path()) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "skipping unreadable markdown file");
                continue;
            }
        };
        let doc = Document::parse(&text);
        for region in doc.regions().filter(|r| r.kind() == RegionKind::AutoSync) {
            let Some(raw) = region.key() else {
                continue;
            };
            let platform = canonical_platform(raw);
            if platform != PLATFORM_ALL {
                markers
                    .entry(platform)
                    .or_insert_with(|| entry.path().to_path_buf());
            }
        }
    }
    markers
}

/// Target path for a platform: explicit config, then an existing marker,
/// then the built-in default filename.
pub fn resolve_target_path(
    layout: &ProjectLayout,
    platform: &str,
    config: &PlatformTargets,
    markers: &BTreeMap<String, PathBuf>,
) -> (PathBuf, TargetSource) {
    if let Some(configured) = config.get(platform) {
        let configured = Path::new(configured);
        let path = if configured.is_absolute() {
            configured.to_path_buf()
        } else {
            layout.root().join(configured)
        };
        return (path, TargetSource::Config);
    }
    if let Some(path) = markers.get(platform) {
        return (path.clone(), TargetSource::Marker);
    }
    (
        layout.root().join(default_platform_filename(platform)),
        TargetSource::Default,
    )
}

/// Every platform to sync, in name order.
///
/// Platforms come from the config, existing markers, known platforms whose
/// default file exists, and platform values on `S-` rows. `only` narrows
/// the result to a single platform regardless of discovery.
pub fn discover_targets(
    layout: &ProjectLayout,
    records: &[RuleRecord],
    config: &PlatformTargets,
    only: Option<&str>,
) -> Vec<PlatformTarget> {
    let markers = scan_markers(layout);

    let platforms: BTreeSet<String> = match only.map(canonical_platform) {
        Some(p) if p != PLATFORM_ALL => BTreeSet::from([p]),
        _ => {
            let mut found = BTreeSet::new();
            found.extend(config.files.keys().cloned());
            found.extend(markers.keys().cloned());
            found.extend(
                KnownPlatform::ALL
                    .iter()
                    .filter(|p| layout.root().join(p.default_file()).exists())
                    .map(|p| p.as_str().to_string()),
            );
            found.extend(
                records
                    .iter()
                    .filter(|r| r.is_platform_lesson())
                    .map(|r| canonical_platform(&r.platform)),
            );
            found.remove(PLATFORM_ALL);
            found
        }
    };

    platforms
        .into_iter()
        .map(|platform| {
            let (path, source) = resolve_target_path(layout, &platform, config, &markers);
            PlatformTarget {
                platform,
                path,
                source,
            }
        })
        .collect()
}
