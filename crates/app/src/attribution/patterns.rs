use std::collections::{BTreeMap, BTreeSet};

use pipecost_core::Unit;
use regex::{RegexSet, RegexSetBuilder};
use tracing::debug;

use crate::error::Result;

/// Patterns compiled per set. A single set over a large manifest would
/// outgrow the compiled-size limit.
const PATTERNS_PER_SET: usize = 256;
const SET_SIZE_LIMIT: usize = 64 << 20;

/// Lexical lookup from lower-cased table references to canonical unit names.
///
/// Each unit contributes its name, its alias when that differs, and both
/// forms qualified by the unit's schema. Patterns are held longest first so a
/// qualified `schema.table` reference is tested before the bare table name.
#[derive(Debug, Clone)]
pub struct PatternIndex {
    patterns: Vec<(String, String)>,
    /// Set `i` holds `patterns[i * PATTERNS_PER_SET..]`, at most
    /// `PATTERNS_PER_SET` of them.
    matchers: Vec<RegexSet>,
}

fn compile_set(chunk: &[(String, String)]) -> Result<RegexSet> {
    let set = RegexSetBuilder::new(
        chunk
            .iter()
            .map(|(pattern, _)| format!(r"\b{}\b", regex::escape(pattern))),
    )
    .size_limit(SET_SIZE_LIMIT)
    .dfa_size_limit(SET_SIZE_LIMIT)
    .build()?;
    Ok(set)
}

fn unit_patterns(unit: &Unit) -> Vec<String> {
    let name = unit.name.to_lowercase();
    let alias = unit
        .alias
        .as_deref()
        .map(str::to_lowercase)
        .filter(|alias| !alias.is_empty() && *alias != name);
    let mut patterns = vec![name.clone()];
    if let Some(alias) = &alias {
        patterns.push(alias.clone());
    }
    if let Some(schema) = unit.schema.as_deref().filter(|schema| !schema.is_empty()) {
        let schema = schema.to_lowercase();
        patterns.push(format!("{schema}.{name}"));
        if let Some(alias) = &alias {
            patterns.push(format!("{schema}.{alias}"));
        }
    }
    patterns
}

impl PatternIndex {
    pub fn new(units: &[Unit]) -> Result<Self> {
        // Later units win a shared pattern, matching manifest order.
        let mut lookup = BTreeMap::new();
        for unit in units {
            for pattern in unit_patterns(unit) {
                if !pattern.is_empty() {
                    lookup.insert(pattern, unit.name.clone());
                }
            }
        }
        let mut patterns: Vec<(String, String)> = lookup.into_iter().collect();
        patterns.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));
        let matchers = patterns
            .chunks(PATTERNS_PER_SET)
            .map(compile_set)
            .collect::<Result<Vec<_>>>()?;
        debug!(
            patterns = patterns.len(),
            sets = matchers.len(),
            units = units.len(),
            "compiled unit patterns"
        );
        Ok(Self { patterns, matchers })
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Distinct unit names referenced by `query_text`, sorted by name.
    /// A pattern only matches on word boundaries, so `stg_orders` is not
    /// found inside `stg_orders_v2`.
    pub fn match_units(&self, query_text: &str) -> Vec<String> {
        let lowered = query_text.to_lowercase();
        let matched: BTreeSet<&str> = self
            .matchers
            .iter()
            .enumerate()
            .flat_map(|(set, matcher)| {
                matcher
                    .matches(&lowered)
                    .into_iter()
                    .map(move |position| set * PATTERNS_PER_SET + position)
            })
            .map(|position| self.patterns[position].1.as_str())
            .collect();
        matched.into_iter().map(str::to_string).collect()
    }
}
