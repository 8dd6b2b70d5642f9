use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// The distinguished profile returned by detection when no tag hint
/// matches and every profile scores zero. Keeps lines with no signal
/// from being labeled arbitrarily.
pub const FALLBACK_PROFILE: &str = "generic";

// ===== WIRE TYPES =====
// These mirror the persisted profile entry format: one JSON object per
// profile in the backing store. Rule order is semantically significant —
// later rules see the output of earlier ones.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileDef {
    pub name: String,
    /// Ordered [pattern, replacement] pairs
    pub rules: Vec<(String, String)>,
    /// Bare speaker tags (no separator character), e.g. "GC"
    #[serde(default)]
    pub tags: Vec<String>,
    /// Postprocessor step names, run in listed order after substitution
    #[serde(default)]
    pub postprocessors: Vec<String>,
}

// ===== COMPILED TYPES =====

/// A single compiled pattern/replacement pair.
/// `pattern` holds the post-macro-expansion regex source — it is what
/// explain mode reports and what detection scoring measures.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub pattern: String,
    pub replacement: String,
    pub matcher: Regex,
}

/// A profile compiled once at load time, then immutable for the
/// lifetime of the loader. Cached behind `Arc` — write-once, read-many.
#[derive(Debug, Clone)]
pub struct CompiledProfile {
    pub name: String,
    pub rules: Vec<CompiledRule>,
    pub tags: Vec<String>,
    pub postprocessors: Vec<String>,
    pub loaded_at: DateTime<Utc>,
}

// ===== RECORD TYPES =====
// Per-line metadata returned by auto-detect and explain modes.
// Line indices are 0-based and match split order exactly.

/// How many replacements a single rule performed on a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleHit {
    pub pattern: String,
    pub count: usize,
}

/// One line of auto-detect output. `profile` is None for blank or
/// whitespace-only lines, which pass through unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineRecord {
    pub line: usize,
    pub profile: Option<String>,
    pub input: String,
    pub output: String,
}

/// One line of explain output. `rule_counts` lists only rules with at
/// least one match, in rule-declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainRecord {
    pub line: usize,
    pub profile: Option<String>,
    pub rule_counts: Vec<RuleHit>,
}

/// Full result of auto-detect mode: reassembled text plus per-line records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockResult {
    pub text: String,
    pub lines: Vec<LineRecord>,
}

/// Full result of explain mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainResult {
    pub text: String,
    pub details: Vec<ExplainRecord>,
}
