use crate::domain::SkipReason;
use crate::{ConfigError, ConfigResult};
use regex::Regex;

/// Compiled include/exclude link rules for one domain
///
/// Exclude rules win over include rules. An empty include list admits
/// everything that is not excluded.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl RuleSet {
    /// Compiles the raw rule strings
    pub fn new(include: &[String], exclude: &[String]) -> ConfigResult<Self> {
        Ok(Self {
            include: compile_all(include)?,
            exclude: compile_all(exclude)?,
        })
    }

    /// Checks a URL against the rules
    pub fn check(&self, url: &str) -> Result<(), SkipReason> {
        if let Some(rule) = self.exclude.iter().find(|r| r.is_match(url)) {
            return Err(SkipReason::Excluded {
                rule: rule.as_str().to_string(),
            });
        }

        if !self.include.is_empty() && !self.include.iter().any(|r| r.is_match(url)) {
            return Err(SkipReason::NotIncluded);
        }

        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }
}

fn compile_all(rules: &[String]) -> ConfigResult<Vec<Regex>> {
    rules
        .iter()
        .map(|rule| {
            Regex::new(rule)
                .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", rule, e)))
        })
        .collect()
}
