//! Pronunciation substitution rules
//!
//! An ordered list of (term, replacement) pairs loaded from a CSV file with
//! a `term,replacement` header. Each rule is applied to utterance text as a
//! whole-word, case-insensitive substitution immediately before synthesis.

use crate::error::{Error, Result};
use regex::{NoExpand, Regex, RegexBuilder};
use std::fs;
use std::path::Path;
use tracing::debug;

/// One compiled substitution rule
#[derive(Debug, Clone)]
struct Rule {
    replacement: String,
    pattern: Regex,
}

/// Ordered pronunciation rules, applied first to last
#[derive(Debug, Clone, Default)]
pub struct PronunciationRules {
    rules: Vec<Rule>,
}

impl PronunciationRules {
    /// No rules: `apply` returns its input unchanged
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load rules from a CSV file with a `term,replacement` header
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Rules(format!("cannot read {}: {}", path.display(), e))
        })?;
        let rules = Self::parse_csv(&content)?;
        debug!("Loaded {} pronunciation rules from {}", rules.len(), path.display());
        Ok(rules)
    }

    /// Parse CSV content. Rows with an empty term or replacement are
    /// skipped, matching how incomplete rows behave in the rule editor.
    pub fn parse_csv(content: &str) -> Result<Self> {
        let mut lines = content.lines();

        let header = lines
            .next()
            .ok_or_else(|| Error::Rules("empty rules file".to_string()))?;
        let header_fields: Vec<String> = header
            .split(',')
            .map(|f| f.trim().trim_matches('"').to_ascii_lowercase())
            .collect();
        if header_fields != ["term", "replacement"] {
            return Err(Error::Rules(format!(
                "expected header \"term,replacement\", found \"{}\"",
                header.trim()
            )));
        }

        let mut rules = Vec::new();
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            let Some((term, replacement)) = line.split_once(',') else {
                continue;
            };
            let term = term.trim().trim_matches('"');
            let replacement = replacement.trim().trim_matches('"');
            if term.is_empty() || replacement.is_empty() {
                continue;
            }
            rules.push(Rule::compile(term, replacement)?);
        }

        Ok(Self { rules })
    }

    /// Apply every rule to the text, in order
    pub fn apply(&self, text: &str) -> String {
        let mut out = text.to_string();
        for rule in &self.rules {
            out = rule
                .pattern
                .replace_all(&out, NoExpand(&rule.replacement))
                .into_owned();
        }
        out
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Rule {
    fn compile(term: &str, replacement: &str) -> Result<Self> {
        let pattern = RegexBuilder::new(&format!(r"\b{}\b", regex::escape(term)))
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::Rules(format!("cannot compile rule for \"{}\": {}", term, e)))?;
        Ok(Self {
            replacement: replacement.to_string(),
            pattern,
        })
    }
}
