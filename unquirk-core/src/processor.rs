use crate::detector::ProfileDetector;
use crate::engine::SubstitutionEngine;
use crate::loader::{ProfileError, ProfileLoader, ValidationIssue};
use crate::postprocess::PostProcessor;
use crate::storage::{FileStore, ProfileStore};
use crate::types::{BlockResult, CompiledProfile, ExplainRecord, ExplainResult, LineRecord, RuleHit};
use anyhow::Result;

/// Top-level translation facade: owns the loader, engine, and
/// postprocessor, and drives per-line detection for block modes.
///
/// Translation itself is synchronous, CPU-only, and bounded by input
/// length; I/O happens only inside the loader and its result is cached.
pub struct Translator {
    loader: ProfileLoader,
    engine: SubstitutionEngine,
    post: PostProcessor,
}

impl Translator {
    /// Translator over a directory of `<name>.json` profile files.
    pub fn new(rules_dir: &str) -> Self {
        Self::with_store(Box::new(FileStore::new(rules_dir)))
    }

    /// Translator with full store injection (tests, embedding).
    pub fn with_store(store: Box<dyn ProfileStore>) -> Self {
        Self {
            loader: ProfileLoader::new(store),
            engine: SubstitutionEngine::new(),
            post: PostProcessor::new(),
        }
    }

    pub fn loader(&self) -> &ProfileLoader {
        &self.loader
    }

    /// Names of every well-formed profile in the backing store,
    /// lexicographic order.
    pub fn profiles(&self) -> Result<Vec<String>> {
        self.loader.list_profiles()
    }

    /// Direct mode: apply the named profile's rules to the whole text,
    /// then the profile's default postprocessing pipeline.
    pub fn translate(&self, text: &str, profile: &str) -> Result<String, ProfileError> {
        let profile = self.loader.load(profile)?;
        Ok(self.apply_profile(text, &profile))
    }

    /// Direct mode with per-rule hit counts, for explainability.
    pub fn translate_with_counts(
        &self,
        text: &str,
        profile: &str,
    ) -> Result<(String, Vec<RuleHit>), ProfileError> {
        let profile = self.loader.load(profile)?;
        let (out, hits) = self.engine.apply_with_counts(text, &profile);
        Ok((self.post.run_named(&out, &profile.postprocessors), hits))
    }

    /// Apply an arbitrary list of extra postprocessing steps to text that
    /// has already been produced. Unknown step names are ignored.
    pub fn apply_extra_post(&self, text: &str, steps: &[String]) -> String {
        self.post.run_named(text, steps)
    }

    /// Offline validation of every store entry (see `ProfileLoader`).
    pub fn validate_rules(&self) -> Result<Vec<ValidationIssue>> {
        self.loader.validate_all()
    }

    /// Build a detector over every loadable profile. A profile that fails
    /// to load is skipped with a warning — one broken entry must not
    /// prevent translation using the others.
    pub fn detector(&self) -> Result<ProfileDetector> {
        let mut profiles = Vec::new();
        for name in self.loader.list_profiles()? {
            match self.loader.load(&name) {
                Ok(profile) => profiles.push(profile),
                Err(e) => eprintln!("⚠️  Skipping profile '{name}': {e}"),
            }
        }
        ProfileDetector::new(profiles)
    }

    /// Auto-detect mode: split on line boundaries, detect and translate
    /// each non-blank line, reassemble with a single newline separator.
    ///
    /// Blank and whitespace-only lines pass through unchanged with an
    /// absent profile marker. Line indices are 0-based split order.
    pub fn translate_auto(&self, text: &str) -> Result<BlockResult> {
        let detector = self.detector()?;
        let mut out_lines = Vec::new();
        let mut records = Vec::new();

        for (i, line) in text.split('\n').enumerate() {
            if line.trim().is_empty() {
                out_lines.push(line.to_string());
                records.push(LineRecord {
                    line: i,
                    profile: None,
                    input: line.to_string(),
                    output: line.to_string(),
                });
                continue;
            }

            let name = detector.detect(line).to_string();
            let output = match detector.profile(&name) {
                Some(profile) => self.apply_profile(line, profile),
                // Fallback profile not installed in this store — leave
                // the line untouched rather than failing the whole block.
                None => line.to_string(),
            };

            out_lines.push(output.clone());
            records.push(LineRecord {
                line: i,
                profile: Some(name),
                input: line.to_string(),
                output,
            });
        }

        Ok(BlockResult {
            text: out_lines.join("\n"),
            lines: records,
        })
    }

    /// Explain mode: identical splitting and detection, but records which
    /// rules matched and how many times per line.
    pub fn explain(&self, text: &str) -> Result<ExplainResult> {
        let detector = self.detector()?;
        let mut out_lines = Vec::new();
        let mut details = Vec::new();

        for (i, line) in text.split('\n').enumerate() {
            if line.trim().is_empty() {
                out_lines.push(line.to_string());
                details.push(ExplainRecord {
                    line: i,
                    profile: None,
                    rule_counts: Vec::new(),
                });
                continue;
            }

            let name = detector.detect(line).to_string();
            let (output, rule_counts) = match detector.profile(&name) {
                Some(profile) => {
                    let (out, hits) = self.engine.apply_with_counts(line, profile);
                    (self.post.run_named(&out, &profile.postprocessors), hits)
                }
                None => (line.to_string(), Vec::new()),
            };

            out_lines.push(output);
            details.push(ExplainRecord {
                line: i,
                profile: Some(name),
                rule_counts,
            });
        }

        Ok(ExplainResult {
            text: out_lines.join("\n"),
            details,
        })
    }

    fn apply_profile(&self, text: &str, profile: &CompiledProfile) -> String {
        let substituted = self.engine.apply(text, profile);
        self.post.run_named(&substituted, &profile.postprocessors)
    }
}
