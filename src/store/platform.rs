/// Sentinel platform for rules that apply everywhere.
pub const PLATFORM_ALL: &str = "all";

/// Platforms with a built-in target document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum KnownPlatform {
    Claude,
    Codex,
    Cursor,
    Gemini,
}

impl KnownPlatform {
    pub const ALL: [KnownPlatform; 4] = [
        KnownPlatform::Claude,
        KnownPlatform::Codex,
        KnownPlatform::Cursor,
        KnownPlatform::Gemini,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KnownPlatform::Claude => "claude",
            KnownPlatform::Codex => "codex",
            KnownPlatform::Cursor => "cursor",
            KnownPlatform::Gemini => "gemini",
        }
    }

    /// Default root-level document that receives this platform's block.
    pub fn default_file(&self) -> &'static str {
        match self {
            KnownPlatform::Claude => "CLAUDE.md",
            KnownPlatform::Codex => "AGENTS.md",
            KnownPlatform::Cursor => "CURSOR.md",
            KnownPlatform::Gemini => "GEMINI.md",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == value)
    }
}

/// Resolved meaning of a raw platform label.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Alias {
    Universal,
    Known(KnownPlatform),
}

fn lookup_alias(normalized: &str) -> Option<Alias> {
    let alias = match normalized {
        "all" | "*" | "global" | "universal" | "shared" | "通用" | "全局" => Alias::Universal,
        "claude" => Alias::Known(KnownPlatform::Claude),
        "gemini" => Alias::Known(KnownPlatform::Gemini),
        "codex" | "agents" | "agent" => Alias::Known(KnownPlatform::Codex),
        "cursor" => Alias::Known(KnownPlatform::Cursor),
        _ => return None,
    };
    Some(alias)
}

/// Canonicalize a platform label.
///
/// Empty input maps to [`PLATFORM_ALL`]; known aliases map to their
/// canonical name; anything else passes through trimmed and lowercased.
pub fn canonical_platform(raw: &str) -> String {
    let normalized = raw.trim().to_lowercase();
    if normalized.is_empty() {
        return PLATFORM_ALL.to_string();
    }
    match lookup_alias(&normalized) {
        Some(Alias::Universal) => PLATFORM_ALL.to_string(),
        Some(Alias::Known(p)) => p.as_str().to_string(),
        None => normalized,
    }
}

/// `S-` prefixed ids are platform lessons; everything else is universal.
pub fn is_platform_lesson(rule_id: &str) -> bool {
    rule_id.starts_with("S-")
}

/// Best-effort platform for a legacy platform lesson stored as `all`,
/// taken from the top-level scope segment (`Claude/tools` -> `claude`).
pub fn infer_legacy_platform(rule_id: &str, scope: &str) -> String {
    if !is_platform_lesson(rule_id) {
        return PLATFORM_ALL.to_string();
    }
    let top = scope.split('/').next().unwrap_or("").trim().to_lowercase();
    match lookup_alias(&top) {
        Some(Alias::Known(p)) => p.as_str().to_string(),
        _ => PLATFORM_ALL.to_string(),
    }
}

/// Filesystem-safe slug of a platform name.
pub fn platform_slug(platform: &str) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;
    for ch in platform.to_lowercase().chars() {
        let keep = ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '.' | '_' | '-');
        if keep {
            if pending_dash {
                slug.push('-');
                pending_dash = false;
            }
            slug.push(ch);
        } else {
            pending_dash = true;
        }
    }
    if pending_dash {
        slug.push('-');
    }
    let trimmed = slug.trim_matches(|c| matches!(c, '-' | '_' | '.'));
    if trimmed.is_empty() {
        "platform".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Default target filename for any platform, known or not.
pub fn default_platform_filename(platform: &str) -> String {
    match KnownPlatform::parse(platform) {
        Some(known) => known.default_file().to_string(),
        None => format!("{}.md", platform_slug(platform).to_uppercase()),
    }
}
