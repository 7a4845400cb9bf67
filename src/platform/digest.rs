use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::content::{RuleContentResolver, TraceMap};
use crate::store::{canonical_platform, RuleRecord};

const DIGEST_LEN: usize = 12;

/// Lowercase hex SHA-256 of `text`.
pub fn sha256_hex(text: &str) -> String {
    let hash = Sha256::digest(text.as_bytes());
    hash.iter().map(|b| format!("{b:02x}")).collect()
}

// Field order is the serialized key order and must stay sorted.
#[derive(Serialize)]
struct RuleSnapshot<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
    err: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    history: Option<&'a [String]>,
    hit: i64,
    platform: String,
    rule_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    runbooks: Option<&'a [String]>,
    scope: &'a str,
    status: &'a str,
    title: &'a str,
    vio: i64,
}

#[derive(Serialize)]
struct DigestPayload<'a> {
    evolve_sha256: String,
    platform: &'a str,
    rules: Vec<RuleSnapshot<'a>>,
}

/// In-force rows visible on `platform`: its own lessons plus every
/// universal rule.
pub fn platform_relevant<'a>(records: &'a [RuleRecord], platform: &str) -> Vec<&'a RuleRecord> {
    records
        .iter()
        .filter(|r| r.status.is_in_force())
        .filter(|r| !r.is_platform_lesson() || canonical_platform(&r.platform) == platform)
        .collect()
}

/// Short fingerprint of everything a platform block is rendered from.
///
/// Content and trace fields only enter the payload when the caller
/// supplies them, so two callers agree on the digest only when they pass
/// the same inputs.
pub fn platform_digest(
    platform: &str,
    canonical_text: &str,
    records: &[RuleRecord],
    resolver: Option<&RuleContentResolver>,
    traces: Option<&TraceMap>,
) -> String {
    let mut rules: Vec<RuleSnapshot<'_>> = platform_relevant(records, platform)
        .into_iter()
        .map(|r| {
            let trace = traces.map(|t| t.get(&r.rule_id));
            RuleSnapshot {
                content: resolver.map(|res| res.content(&r.rule_id).unwrap_or("")),
                err: r.err,
                history: trace.map(|t| t.map_or(&[][..], |l| l.history.as_slice())),
                hit: r.hit,
                platform: canonical_platform(&r.platform),
                rule_id: &r.rule_id,
                runbooks: trace.map(|t| t.map_or(&[][..], |l| l.runbooks.as_slice())),
                scope: &r.scope,
                status: r.status.as_str(),
                title: &r.title,
                vio: r.vio,
            }
        })
        .collect();
    rules.sort_by(|a, b| a.rule_id.cmp(b.rule_id));

    let payload = DigestPayload {
        evolve_sha256: sha256_hex(canonical_text),
        platform,
        rules,
    };
    // Serializing plain structs of strings and integers cannot fail.
    let raw = serde_json::to_string(&payload).unwrap_or_default();
    let mut digest = sha256_hex(&raw);
    digest.truncate(DIGEST_LEN);
    digest
}
