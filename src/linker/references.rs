//! Ticket reference extraction from commit messages

use regex::Regex;

use super::error::{LinkerError, LinkerResult};

/// Extracts ticket keys from free-text commit messages.
///
/// Three reference forms are recognised on the upper-cased message:
/// `<PROJECT>-<n>`, the legacy `ISSUE <n>` and the shorthand `#<n>`. The
/// latter two are rewritten to `<PROJECT>-<n>`.
#[derive(Debug, Clone)]
pub struct ReferenceExtractor {
    prefix: String,
    project_pattern: Regex,
    issue_pattern: Regex,
    hash_pattern: Regex,
}

impl ReferenceExtractor {
    pub fn new(project_name: &str) -> LinkerResult<Self> {
        let project = project_name.trim().to_uppercase();
        if project.is_empty() {
            return Err(LinkerError::EmptyProjectName);
        }

        let project_pattern = Regex::new(&format!(r"{}-\d+", regex::escape(&project)))
            .map_err(|e| LinkerError::pattern(e.to_string()))?;
        let issue_pattern = Regex::new(r"ISSUE\s(\d+)").map_err(|e| LinkerError::pattern(e.to_string()))?;
        let hash_pattern = Regex::new(r"#(\d+)").map_err(|e| LinkerError::pattern(e.to_string()))?;

        Ok(Self {
            prefix: format!("{}-", project),
            project_pattern,
            issue_pattern,
            hash_pattern,
        })
    }

    /// Raw matches in pattern order, deduplicated by exact string
    pub fn raw_references(&self, message: &str) -> Vec<String> {
        let upper = message.to_uppercase();
        let mut found: Vec<String> = Vec::new();

        for pattern in [&self.project_pattern, &self.issue_pattern, &self.hash_pattern] {
            for m in pattern.find_iter(&upper) {
                let text = m.as_str();
                if !found.iter().any(|f| f == text) {
                    found.push(text.to_string());
                }
            }
        }

        found
    }

    /// Rewrite a raw reference to `<PROJECT>-<n>`
    pub fn canonicalize(&self, reference: &str) -> String {
        let upper = reference.trim().to_uppercase();
        if let Some(caps) = self.issue_pattern.captures(&upper) {
            if caps.get(0).map(|m| m.as_str().len()) == Some(upper.len()) {
                return format!("{}{}", self.prefix, &caps[1]);
            }
        }
        if let Some(caps) = self.hash_pattern.captures(&upper) {
            if caps.get(0).map(|m| m.as_str().len()) == Some(upper.len()) {
                return format!("{}{}", self.prefix, &caps[1]);
            }
        }
        upper
    }

    /// Distinct canonical keys referenced by a message
    pub fn canonical_keys(&self, message: &str) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for reference in self.raw_references(message) {
            let key = self.canonicalize(&reference);
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }
}
