// Operator rules that override retrieved context
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::errors::Result;

/// Lines starting with this marker are comments
pub const COMMENT_MARKER: char = '#';

/// Ordered, always-authoritative directives
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    rules: Vec<String>,
}

impl RuleSet {
    pub fn new(rules: Vec<String>) -> Self {
        Self { rules }
    }

    /// Parse line-oriented rules, skipping blank and comment lines
    pub fn parse(text: &str) -> Self {
        let rules = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with(COMMENT_MARKER))
            .map(str::to_string)
            .collect();
        Self { rules }
    }

    /// Load rules from a file. A missing file yields an empty set.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no rules file");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let rules = Self::parse(&contents);
        info!(path = %path.display(), count = rules.len(), "loaded rules");
        Ok(rules)
    }

    pub fn rules(&self) -> &[String] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
