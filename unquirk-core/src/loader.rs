use crate::storage::ProfileStore;
use crate::types::{CompiledProfile, CompiledRule, ProfileDef};
use chrono::Utc;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Reserved placeholder token inside a rule pattern.
pub const TAG_MACRO: &str = "@TAG";

/// What the macro expands to: an optional leading speaker tag of 1-30
/// word/hyphen characters followed by a colon and whitespace, captured
/// as group 1 so replacements can carry it through with `${1}`.
pub const TAG_MACRO_EXPANSION: &str = r"((?:\s*[\w\-]{1,30}:\s*)?)";

/// Load-time failures, scoped to a single profile. A failure here never
/// affects other, already-loaded profiles.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile '{0}' not found in the backing store")]
    NotFound(String),

    #[error("profile '{name}' has a malformed definition: {reason}")]
    Schema { name: String, reason: String },

    /// One bad pattern rejects the entire profile — a profile missing
    /// some of its rules silently changes translation semantics in ways
    /// that are hard to detect downstream.
    #[error("profile '{name}' rule #{index} failed to compile: {source}")]
    Pattern {
        name: String,
        index: usize,
        #[source]
        source: regex::Error,
    },

    #[error("backing store error while loading profile '{name}': {source}")]
    Store {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

/// One problem found by offline rule-file validation.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub entry: String,
    pub problem: String,
}

/// Discovers, parses, and compiles profile definitions from a backing
/// store, caching compiled profiles for the lifetime of the loader.
///
/// The cache is read-mostly and write-once per key: a populated entry is
/// never mutated, and compilation happens under the write lock so
/// concurrent first access compiles at most once per profile name.
pub struct ProfileLoader {
    store: Box<dyn ProfileStore>,
    cache: RwLock<HashMap<String, Arc<CompiledProfile>>>,
}

impl ProfileLoader {
    pub fn new(store: Box<dyn ProfileStore>) -> Self {
        Self {
            store,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Names of every store entry whose JSON content has a `rules` field
    /// that is an array. Malformed entries are silently excluded — a
    /// broken entry is a load-time error, not a listing-time one.
    ///
    /// Returned sorted lexicographically: this order is what drives
    /// detection tie-breaks, so it must be explicit and deterministic
    /// rather than whatever the storage medium happens to enumerate.
    pub fn list_profiles(&self) -> anyhow::Result<Vec<String>> {
        let mut names = Vec::new();
        for name in self.store.list_entries()? {
            let Ok(Some(content)) = self.store.read_entry(&name) else {
                continue;
            };
            if let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(&content) {
                if matches!(obj.get("rules"), Some(Value::Array(_))) {
                    names.push(name);
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Returns the cached compiled profile, or reads, macro-expands, and
    /// compiles it and populates the cache.
    pub fn load(&self, name: &str) -> Result<Arc<CompiledProfile>, ProfileError> {
        if let Some(profile) = self.cache.read().expect("profile cache poisoned").get(name) {
            return Ok(Arc::clone(profile));
        }

        // Compile under the write lock: concurrent first access for the
        // same name compiles exactly once, and readers of a populated
        // entry never contend with compilation.
        let mut cache = self.cache.write().expect("profile cache poisoned");
        if let Some(profile) = cache.get(name) {
            return Ok(Arc::clone(profile));
        }

        let compiled = Arc::new(self.compile_profile(name)?);
        cache.insert(name.to_string(), Arc::clone(&compiled));
        Ok(compiled)
    }

    /// Drop every cached compiled profile. Exposed for tests — there is
    /// no invalidation during normal operation.
    pub fn clear_cache(&self) {
        self.cache.write().expect("profile cache poisoned").clear();
    }

    fn compile_profile(&self, name: &str) -> Result<CompiledProfile, ProfileError> {
        let content = self
            .store
            .read_entry(name)
            .map_err(|source| ProfileError::Store {
                name: name.to_string(),
                source,
            })?
            .ok_or_else(|| ProfileError::NotFound(name.to_string()))?;

        let def: ProfileDef =
            serde_json::from_str(&content).map_err(|e| ProfileError::Schema {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        let mut rules = Vec::with_capacity(def.rules.len());
        for (index, (pattern, replacement)) in def.rules.into_iter().enumerate() {
            let expanded = pattern.replace(TAG_MACRO, TAG_MACRO_EXPANSION);
            let matcher = Regex::new(&expanded).map_err(|source| ProfileError::Pattern {
                name: name.to_string(),
                index,
                source,
            })?;
            rules.push(CompiledRule {
                pattern: expanded,
                replacement,
                matcher,
            });
        }

        println!("📚 Compiled profile '{}' ({} rules)", def.name, rules.len());

        Ok(CompiledProfile {
            name: def.name,
            rules,
            tags: def.tags,
            postprocessors: def.postprocessors,
            loaded_at: Utc::now(),
        })
    }

    /// Offline schema validation over every store entry: the same checks
    /// the external rule-file tool performs before profiles ever reach
    /// the loader. Returns one issue per problem found; an empty list
    /// means the store is clean.
    pub fn validate_all(&self) -> anyhow::Result<Vec<ValidationIssue>> {
        let mut issues = Vec::new();
        let mut entries = self.store.list_entries()?;
        entries.sort();

        for entry in entries {
            let Some(content) = self.store.read_entry(&entry)? else {
                continue;
            };

            let value: Value = match serde_json::from_str(&content) {
                Ok(v) => v,
                Err(e) => {
                    issues.push(ValidationIssue {
                        entry,
                        problem: format!("invalid JSON: {e}"),
                    });
                    continue;
                }
            };

            let Some(obj) = value.as_object() else {
                issues.push(ValidationIssue {
                    entry,
                    problem: "top level is not an object".to_string(),
                });
                continue;
            };

            if !obj.contains_key("name") || !obj.contains_key("rules") {
                issues.push(ValidationIssue {
                    entry,
                    problem: "missing 'name' or 'rules'".to_string(),
                });
                continue;
            }

            if let Some(rules) = obj.get("rules").and_then(|r| r.as_array()) {
                for (i, pair) in rules.iter().enumerate() {
                    let pattern = pair
                        .as_array()
                        .filter(|p| p.len() == 2)
                        .and_then(|p| p[0].as_str());
                    let Some(pattern) = pattern else {
                        issues.push(ValidationIssue {
                            entry: entry.clone(),
                            problem: format!("rule #{i}: not a [pattern, replacement] pair"),
                        });
                        continue;
                    };
                    let expanded = pattern.replace(TAG_MACRO, TAG_MACRO_EXPANSION);
                    if let Err(e) = Regex::new(&expanded) {
                        issues.push(ValidationIssue {
                            entry: entry.clone(),
                            problem: format!("rule #{i}: pattern {pattern:?} does not compile: {e}"),
                        });
                    }
                }
            } else {
                issues.push(ValidationIssue {
                    entry: entry.clone(),
                    problem: "'rules' is not an array".to_string(),
                });
            }

            if let Some(tags) = obj.get("tags").and_then(|t| t.as_array()) {
                for tag in tags.iter().filter_map(|t| t.as_str()) {
                    if tag.contains(':') {
                        issues.push(ValidationIssue {
                            entry: entry.clone(),
                            problem: format!("tag '{tag}' should be bare (no colon)"),
                        });
                    }
                }
            }
        }

        Ok(issues)
    }
}
