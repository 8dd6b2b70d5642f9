use crate::types::{CompiledProfile, RuleHit};
use regex::Captures;

/// Applies a compiled profile's ordered rules to a text.
///
/// Pure string rewriting: no randomness, no external state, so identical
/// (text, profile) inputs always yield identical output. Every rule runs
/// `replace_all` over the whole current text before the next rule sees
/// it — later rules operate on the output of earlier ones.
pub struct SubstitutionEngine;

impl Default for SubstitutionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SubstitutionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Run every rule of `profile`, in declared order, replacing all
    /// occurrences. Postprocessing is not applied here — that is the
    /// caller's pipeline decision.
    pub fn apply(&self, text: &str, profile: &CompiledProfile) -> String {
        let mut out = text.to_string();
        for rule in &profile.rules {
            out = rule
                .matcher
                .replace_all(&out, rule.replacement.as_str())
                .into_owned();
        }
        out
    }

    /// Identical substitution pass, recording how many replacements each
    /// rule performed. Counts are collected through the substitution
    /// callback itself, and the callback expands group references the
    /// same way the plain path does — the counted output is byte-for-byte
    /// the output of `apply`.
    ///
    /// Rules with zero matches are omitted; the returned list preserves
    /// rule-declaration order.
    pub fn apply_with_counts(
        &self,
        text: &str,
        profile: &CompiledProfile,
    ) -> (String, Vec<RuleHit>) {
        let mut out = text.to_string();
        let mut hits = Vec::new();

        for rule in &profile.rules {
            let mut count = 0usize;
            out = rule
                .matcher
                .replace_all(&out, |caps: &Captures| {
                    count += 1;
                    let mut dst = String::new();
                    caps.expand(&rule.replacement, &mut dst);
                    dst
                })
                .into_owned();

            if count > 0 {
                hits.push(RuleHit {
                    pattern: rule.pattern.clone(),
                    count,
                });
            }
        }

        (out, hits)
    }
}
