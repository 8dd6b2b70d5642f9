use regex::{Captures, Regex};
use unicode_normalization::UnicodeNormalization;

/// The closed set of text-level normalization steps that can run after
/// substitution. Unknown step names map to `Noop` — pipelines stay
/// forward compatible with step names this version does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostStep {
    CollapseWhitespace,
    Nfkc,
    SentenceCase,
    Noop,
}

impl PostStep {
    pub fn from_name(name: &str) -> Self {
        match name {
            "collapse_whitespace" => Self::CollapseWhitespace,
            "nfkc" => Self::Nfkc,
            "sentence_case" => Self::SentenceCase,
            _ => Self::Noop,
        }
    }
}

/// Applies a named pipeline of normalization steps, in caller order, to
/// already-substituted text. Regexes are compiled once per instance.
pub struct PostProcessor {
    whitespace_re: Regex,
    speaker_tag_re: Regex,
    capitalize_re: Regex,
    pronoun_re: Regex,
}

impl Default for PostProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl PostProcessor {
    pub fn new() -> Self {
        Self {
            whitespace_re: Regex::new(r"\s+").expect("static regex"),
            // Optional leading speaker tag like "GC: " — 1-4 letters,
            // separator, whitespace. Preserved verbatim by sentence_case.
            speaker_tag_re: Regex::new(r"^(\s*[A-Za-z]{1,4}:\s*)(.*)$").expect("static regex"),
            // Start of line or sentence-ending punctuation + whitespace,
            // then any decorative non-letters, then the letter to raise.
            capitalize_re: Regex::new(r"(^|[.!?]\s+)([^A-Za-z]*)([a-z])").expect("static regex"),
            pronoun_re: Regex::new(r"\bi\b").expect("static regex"),
        }
    }

    /// Run the given steps in order over `text`.
    pub fn run(&self, text: &str, steps: &[PostStep]) -> String {
        let mut out = text.to_string();
        for step in steps {
            out = match step {
                PostStep::CollapseWhitespace => self.collapse_whitespace(&out),
                PostStep::Nfkc => out.nfkc().collect(),
                PostStep::SentenceCase => self.sentence_case(&out),
                PostStep::Noop => out,
            };
        }
        out
    }

    /// Run a pipeline given by raw step names (profile defaults or an
    /// explicit caller override). Unknown names are ignored.
    pub fn run_named(&self, text: &str, step_names: &[String]) -> String {
        let steps: Vec<PostStep> = step_names.iter().map(|s| PostStep::from_name(s)).collect();
        self.run(text, &steps)
    }

    fn collapse_whitespace(&self, text: &str) -> String {
        self.whitespace_re.replace_all(text, " ").trim().to_string()
    }

    /// Sentence-case each line independently, preserving a leading
    /// speaker tag and capitalizing the first alphabetic character even
    /// when decorative markup sits between the sentence boundary and
    /// the letter.
    fn sentence_case(&self, text: &str) -> String {
        text.split('\n')
            .map(|line| self.sentence_case_line(line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn sentence_case_line(&self, line: &str) -> String {
        let (prefix, body) = match self.speaker_tag_re.captures(line) {
            Some(caps) => (caps[1].to_string(), caps[2].to_string()),
            None => (String::new(), line.to_string()),
        };

        let lowered = body.to_lowercase();

        let capitalized = self
            .capitalize_re
            .replace_all(&lowered, |caps: &Captures| {
                format!("{}{}{}", &caps[1], &caps[2], caps[3].to_uppercase())
            })
            .into_owned();

        // Standalone pronoun "i" is always "I"
        let fixed = self.pronoun_re.replace_all(&capitalized, "I").into_owned();

        format!("{prefix}{fixed}")
    }
}
