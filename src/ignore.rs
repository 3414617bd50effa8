//! Glob-style ignore rules.
//!
//! Each rule is compiled once into a regex anchored over the whole candidate
//! path: `*` matches any sequence of characters, `?` matches exactly one,
//! and every other regex metacharacter is escaped. Matching is
//! case-sensitive, and rules are tried in configured order with the first
//! hit winning.

use crate::error::Result;
use regex::Regex;

#[derive(Debug, Default)]
pub struct IgnoreMatcher {
    rules: Vec<Regex>,
}

/// Translate one glob pattern into an anchored regex.
fn glob_to_regex(pattern: &str) -> Result<Regex> {
    let mut expr = String::with_capacity(pattern.len() * 2 + 2);
    expr.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            '\\' | '^' | '$' | '.' | '[' | ']' | '|' | '(' | ')' | '+' | '{' | '}' | '-' | '/' => {
                expr.push('\\');
                expr.push(ch);
            }
            _ => expr.push(ch),
        }
    }
    expr.push('$');
    Ok(Regex::new(&expr)?)
}

impl IgnoreMatcher {
    /// Compile a list of glob rules, preserving their order.
    pub fn compile(patterns: &[String]) -> Result<Self> {
        let rules = patterns
            .iter()
            .map(|p| glob_to_regex(p))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// True when any rule matches the full path, first match wins.
    pub fn is_ignored(&self, path: &str) -> bool {
        self.rules.iter().any(|rule| rule.is_match(path))
    }
}
