use crate::types::{CompiledProfile, FALLBACK_PROFILE};
use anyhow::Result;
use regex::{Regex, RegexBuilder};
use std::sync::Arc;

/// A case-insensitive prefix matcher derived from one bare tag string,
/// tied to the profile that declared it.
struct TagHint {
    matcher: Regex,
    profile: String,
}

/// Chooses, per line, which profile to apply: explicit tag hints first,
/// rule-match scoring second, deterministic fallback last.
///
/// Construction order matters — hints are registered in the order
/// profiles are handed in (the loader's lexicographic discovery order),
/// and the first matching hint wins. That makes tie-breaks between
/// overlapping tags explicit rather than storage-enumeration luck.
pub struct ProfileDetector {
    profiles: Vec<Arc<CompiledProfile>>,
    tag_hints: Vec<TagHint>,
    fallback: String,
}

impl ProfileDetector {
    pub fn new(profiles: Vec<Arc<CompiledProfile>>) -> Result<Self> {
        Self::with_fallback(profiles, FALLBACK_PROFILE)
    }

    pub fn with_fallback(profiles: Vec<Arc<CompiledProfile>>, fallback: &str) -> Result<Self> {
        let mut tag_hints = Vec::new();
        for profile in &profiles {
            for tag in &profile.tags {
                // ^\s*TAG:\s* — the tag is a bare string, so escape it
                let pattern = format!(r"^\s*{}:\s*", regex::escape(tag));
                let matcher = RegexBuilder::new(&pattern)
                    .case_insensitive(true)
                    .build()?;
                tag_hints.push(TagHint {
                    matcher,
                    profile: profile.name.clone(),
                });
            }
        }

        Ok(Self {
            profiles,
            tag_hints,
            fallback: fallback.to_string(),
        })
    }

    /// The profile name to apply to `line`.
    ///
    /// 1. First tag hint whose prefix matches wins outright — hints take
    ///    absolute priority over scoring.
    /// 2. Otherwise every profile is scored; strictly highest wins.
    /// 3. All-zero scores fall back to the distinguished generic profile
    ///    instead of labeling a signal-free line arbitrarily.
    pub fn detect(&self, line: &str) -> &str {
        for hint in &self.tag_hints {
            if hint.matcher.is_match(line) {
                return &hint.profile;
            }
        }

        let mut best_profile = self.fallback.as_str();
        let mut best_score = 0usize;
        for profile in &self.profiles {
            let score = score_line(line, profile);
            if score > best_score {
                best_profile = &profile.name;
                best_score = score;
            }
        }

        best_profile
    }

    /// The compiled profile for `name`, if it is part of this detector's
    /// known set.
    pub fn profile(&self, name: &str) -> Option<&Arc<CompiledProfile>> {
        self.profiles.iter().find(|p| p.name == name)
    }
}

/// Score one profile against one line: for each rule, pattern-source
/// length times match count. Longer patterns are more specific, and more
/// matches mean more signal — both outweigh short generic patterns that
/// spuriously match many lines.
fn score_line(line: &str, profile: &CompiledProfile) -> usize {
    let mut score = 0usize;
    for rule in &profile.rules {
        let matches = rule.matcher.find_iter(line).count();
        if matches > 0 {
            score += rule.pattern.len().max(1) * matches;
        }
    }
    score
}
