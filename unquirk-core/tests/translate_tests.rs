//! Translation pipeline tests — engine, detection, and block modes.
//!
//! Most tests run against in-memory stores so each one owns its profile
//! set. The `shipped_rules` module runs against the repository's actual
//! `rules/` directory to keep the shipped definitions honest.

use std::path::PathBuf;
use std::sync::Arc;

use unquirk_core::{MemoryStore, ProfileError, ProfileLoader, Translator};

// ============================================================================
// Fixture helpers
// ============================================================================

fn shipped_rules_dir() -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../rules")
        .to_string_lossy()
        .into_owned()
}

/// A small leetspeak world: a generic fallback profile plus one tagged
/// dialect with deliberately weak rules.
fn leet_store() -> MemoryStore {
    let mut store = MemoryStore::new();
    store.insert(
        "generic",
        r#"{
            "name": "generic",
            "rules": [["4", "A"], ["3", "E"], ["1", "I"], ["0", "O"], ["5", "S"], ["7", "T"]],
            "tags": [],
            "postprocessors": []
        }"#,
    );
    store.insert(
        "grouchy",
        r#"{
            "name": "grouchy",
            "rules": [["9", "G"]],
            "tags": ["CG"],
            "postprocessors": ["sentence_case"]
        }"#,
    );
    store
}

fn leet_translator() -> Translator {
    Translator::with_store(Box::new(leet_store()))
}

// ============================================================================
// ProfileLoader — listing, caching, rejection
// ============================================================================

mod loader {
    use super::*;

    #[test]
    fn lists_only_entries_with_rules_array() {
        let mut store = leet_store();
        store.insert("no_rules", r#"{"name": "no_rules"}"#);
        store.insert("not_json", "definitely not json");
        store.insert("rules_not_array", r#"{"name": "x", "rules": 7}"#);

        let loader = ProfileLoader::new(Box::new(store));
        assert_eq!(loader.list_profiles().unwrap(), vec!["generic", "grouchy"]);
    }

    #[test]
    fn listing_order_is_lexicographic() {
        let mut store = MemoryStore::new();
        for name in ["zeta", "alpha", "mid"] {
            store.insert(name, &format!(r#"{{"name": "{name}", "rules": []}}"#));
        }
        let loader = ProfileLoader::new(Box::new(store));
        assert_eq!(loader.list_profiles().unwrap(), vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn missing_profile_is_not_found() {
        let loader = ProfileLoader::new(Box::new(leet_store()));
        let err = loader.load("nonexistent").unwrap_err();
        assert!(matches!(err, ProfileError::NotFound(_)));
    }

    #[test]
    fn malformed_definition_is_schema_error() {
        let mut store = MemoryStore::new();
        store.insert("bad", r#"{"rules": []}"#);

        let loader = ProfileLoader::new(Box::new(store));
        let err = loader.load("bad").unwrap_err();
        assert!(matches!(err, ProfileError::Schema { .. }));
    }

    #[test]
    fn one_bad_pattern_rejects_the_whole_profile() {
        let mut store = MemoryStore::new();
        // Rule #0 is valid; rule #1 never compiles. Nothing partial may load.
        store.insert(
            "broken",
            r#"{"name": "broken", "rules": [["a", "b"], ["(", "x"]]}"#,
        );

        let loader = ProfileLoader::new(Box::new(store));
        match loader.load("broken") {
            Err(ProfileError::Pattern { name, index, .. }) => {
                assert_eq!(name, "broken");
                assert_eq!(index, 1);
            }
            other => panic!("expected Pattern error, got {other:?}"),
        }
    }

    #[test]
    fn cache_returns_same_compiled_profile() {
        let loader = ProfileLoader::new(Box::new(leet_store()));
        let first = loader.load("generic").unwrap();
        let second = loader.load("generic").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn clear_cache_recompiles() {
        let loader = ProfileLoader::new(Box::new(leet_store()));
        let first = loader.load("generic").unwrap();
        loader.clear_cache();
        let second = loader.load("generic").unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.name, second.name);
    }

    #[test]
    fn concurrent_first_access_compiles_once() {
        let loader = Arc::new(ProfileLoader::new(Box::new(leet_store())));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let loader = Arc::clone(&loader);
                std::thread::spawn(move || loader.load("generic").unwrap())
            })
            .collect();

        let profiles: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for profile in &profiles[1..] {
            assert!(Arc::ptr_eq(&profiles[0], profile));
        }
    }

    #[test]
    fn tag_macro_expands_to_speaker_tag_template() {
        let mut store = MemoryStore::new();
        store.insert(
            "tagged",
            r#"{"name": "tagged", "rules": [["@TAGH1", "${1}HI"]]}"#,
        );

        let translator = Translator::with_store(Box::new(store));
        // Tag is captured and carried through the replacement
        assert_eq!(
            translator.translate("eridan: H1 there", "tagged").unwrap(),
            "eridan: HI there"
        );
        // Macro group is optional — pattern still fires without a tag
        assert_eq!(translator.translate("H1 there", "tagged").unwrap(), "HI there");
    }

    #[test]
    fn validate_all_reports_shape_problems() {
        let mut store = leet_store();
        store.insert("corrupt", "{not json");
        store.insert("incomplete", r#"{"rules": []}"#);
        store.insert(
            "bad_rule",
            r#"{"name": "bad_rule", "rules": [["(", "x"], "lonely"]}"#,
        );
        store.insert(
            "colon_tag",
            r#"{"name": "colon_tag", "rules": [], "tags": ["GC:"]}"#,
        );

        let loader = ProfileLoader::new(Box::new(store));
        let issues = loader.validate_all().unwrap();

        let entries: Vec<&str> = issues.iter().map(|i| i.entry.as_str()).collect();
        assert!(entries.contains(&"corrupt"));
        assert!(entries.contains(&"incomplete"));
        assert!(entries.contains(&"colon_tag"));
        // bad_rule yields two issues: uncompilable pattern and non-pair rule
        assert_eq!(entries.iter().filter(|e| **e == "bad_rule").count(), 2);
        // well-formed profiles stay clean
        assert!(!entries.contains(&"generic"));
    }
}

// ============================================================================
// SubstitutionEngine — determinism and count conservation
// ============================================================================

mod engine {
    use super::*;

    #[test]
    fn translation_is_deterministic() {
        let translator = leet_translator();
        let text = "H3LL0 7H3R3, 7H15 15 4 73S7";
        let first = translator.translate(text, "generic").unwrap();
        let second = translator.translate(text, "generic").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn counts_sum_to_total_substitutions() {
        let translator = leet_translator();
        // 3→E twice, 1→I twice, 5→S once, 7→T once — six substitutions total
        let (out, hits) = translator.translate_with_counts("W31RD 71M35", "generic").unwrap();
        assert_eq!(out, "WEIRD TIMES");

        let total: usize = hits.iter().map(|h| h.count).sum();
        assert_eq!(total, 6);
        // Declaration order, zero-count rules omitted
        let patterns: Vec<&str> = hits.iter().map(|h| h.pattern.as_str()).collect();
        assert_eq!(patterns, vec!["3", "1", "5", "7"]);
    }

    #[test]
    fn counted_and_plain_output_agree() {
        let translator = leet_translator();
        let text = "50 L0N9 4ND 7H4NK5";
        let plain = translator.translate(text, "generic").unwrap();
        let (counted, _) = translator.translate_with_counts(text, "generic").unwrap();
        assert_eq!(plain, counted);
    }
}

// ============================================================================
// ProfileDetector — tag hints, scoring, fallback
// ============================================================================

mod detector {
    use super::*;

    #[test]
    fn tag_hint_beats_scoring() {
        let translator = leet_translator();
        let detector = translator.detector().unwrap();

        // Heavy leet signal would score "generic", but the CG tag wins outright
        assert_eq!(detector.detect("CG: 7H15 15 50 5TUP1D"), "grouchy");
        // Tag matching is case-insensitive and tolerates leading whitespace
        assert_eq!(detector.detect("  cg: whatever"), "grouchy");
    }

    #[test]
    fn scoring_picks_the_matching_profile() {
        let translator = leet_translator();
        let detector = translator.detector().unwrap();
        assert_eq!(detector.detect("7H3 B1G 5H1P"), "generic");
    }

    #[test]
    fn zero_score_falls_back_to_generic() {
        let translator = leet_translator();
        let detector = translator.detector().unwrap();
        // No digits, no tags — nothing matches any rule
        assert_eq!(detector.detect("perfectly ordinary words"), "generic");
    }

    #[test]
    fn broken_profile_does_not_block_the_others() {
        let mut store = leet_store();
        store.insert(
            "broken",
            r#"{"name": "broken", "rules": [["(", "x"]]}"#,
        );

        let translator = Translator::with_store(Box::new(store));
        let detector = translator.detector().unwrap();
        assert_eq!(detector.detect("7H3 B1G 5H1P"), "generic");
    }
}

// ============================================================================
// Block modes — translate_auto and explain
// ============================================================================

mod block_modes {
    use super::*;

    #[test]
    fn blank_lines_pass_through_with_absent_profile() {
        let translator = leet_translator();
        let result = translator.translate_auto("H3LL0\n\n   \nCG: 9R34T").unwrap();

        assert_eq!(result.lines.len(), 4);
        assert_eq!(result.lines[0].profile.as_deref(), Some("generic"));
        assert_eq!(result.lines[1].profile, None);
        assert_eq!(result.lines[2].profile, None);
        assert_eq!(result.lines[2].output, "   ");
        assert_eq!(result.lines[3].profile.as_deref(), Some("grouchy"));

        // Indices are 0-based split order
        for (i, record) in result.lines.iter().enumerate() {
            assert_eq!(record.line, i);
        }
    }

    #[test]
    fn reassembled_text_uses_single_newlines() {
        let translator = leet_translator();
        let result = translator.translate_auto("H1\n\nH0").unwrap();
        assert_eq!(result.text, "HI\n\nHO");
    }

    #[test]
    fn profile_default_postprocessors_run_per_line() {
        let translator = leet_translator();
        // grouchy carries sentence_case as its default pipeline
        let result = translator.translate_auto("CG: SCR34M1N9 1NT0 TH3 V01D").unwrap();
        assert_eq!(result.lines[0].profile.as_deref(), Some("grouchy"));
        // 9→G, then sentence_case lowers the body and raises its first letter
        assert_eq!(result.text, "CG: Scr34m1ng 1nt0 th3 v01d");
    }

    #[test]
    fn explain_reports_hits_in_declaration_order() {
        let translator = leet_translator();
        let result = translator.explain("4W350M3\n\nplain words").unwrap();

        assert_eq!(result.details.len(), 3);
        let first = &result.details[0];
        assert_eq!(first.profile.as_deref(), Some("generic"));
        let patterns: Vec<&str> = first.rule_counts.iter().map(|h| h.pattern.as_str()).collect();
        assert_eq!(patterns, vec!["4", "3", "0", "5"]);
        assert!(first.rule_counts.iter().all(|h| h.count > 0));

        // Blank line carries no counts; zero-signal line carries none either
        assert!(result.details[1].rule_counts.is_empty());
        assert!(result.details[2].rule_counts.is_empty());
    }

    #[test]
    fn extra_post_steps_apply_to_produced_text() {
        let translator = leet_translator();
        let out = translator.translate("H3LL0   W0RLD", "generic").unwrap();
        let normalized =
            translator.apply_extra_post(&out, &["collapse_whitespace".to_string()]);
        assert_eq!(normalized, "HELLO WORLD");
    }
}

// ============================================================================
// Shipped rules directory — the profiles this repository distributes
// ============================================================================

mod shipped_rules {
    use super::*;

    #[test]
    fn shipped_definitions_validate_clean() {
        let translator = Translator::new(&shipped_rules_dir());
        assert!(translator.validate_rules().unwrap().is_empty());
    }

    #[test]
    fn leet_text_with_escapes_translates() {
        let translator = Translator::new(&shipped_rules_dir());
        let out = translator.translate("H3LL0 W0RLD \\)\\(", "generic").unwrap();
        assert!(out.contains("HELLO WORLD"), "got: {out}");
        // Escaped parens are de-escaped, not dropped
        assert!(out.ends_with(")("), "got: {out}");
    }

    #[test]
    fn auto_detects_every_nonblank_line() {
        let translator = Translator::new(&shipped_rules_dir());
        let result = translator
            .translate_auto(")(3R3Z1 15 4W350M3\nK4RK4T 15 L0UD")
            .unwrap();

        assert_eq!(result.lines.len(), 2);
        for record in &result.lines {
            assert!(record.profile.is_some());
            assert!(!record.output.is_empty());
        }
        assert!(!result.text.is_empty());
    }

    #[test]
    fn explain_mode_reports_fired_rules() {
        let translator = Translator::new(&shipped_rules_dir());
        let src = "GC: *GC L4NDS ON YOUR WH3LP1NG STOOP*\nGC: *4ND ONC3 W1TH H3R M1GHTY SNOUT*";
        let result = translator.explain(src).unwrap();

        assert!(!result.text.is_empty());
        let fired: usize = result.details[0].rule_counts.iter().map(|h| h.count).sum();
        assert!(fired > 0, "at least one rule should fire on line 0");
    }

    #[test]
    fn sentence_case_preserves_speaker_tag() {
        let translator = Translator::new(&shipped_rules_dir());
        let out = translator.apply_extra_post(
            "GC: *GC L4NDS ON YOUR WH3LP1NG STOOP*",
            &["sentence_case".to_string()],
        );
        assert!(out.starts_with("GC: "), "got: {out}");
        assert!(out.contains("*Gc"), "first letter after '*' raised, got: {out}");
        assert!(out.contains("l4nds on your wh3lp1ng stoop"), "got: {out}");
    }
}
