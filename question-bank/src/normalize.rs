//! Fuzzy subject/lesson name matching.
//!
//! Names are compared after three layers: case and separator canonicalization,
//! removal of connector words between two other words, and an optional alias
//! table for lesson names that differ beyond what the first two layers absorb.

use std::collections::HashMap;

const CONNECTOR_WORDS: [&str; 4] = ["and", "of", "the", "in"];

/// Canonical form of a name without any alias lookup.
///
/// `"Nationalism in India"`, `"nationalism-in-india"` and `"Nationalism_in_India"`
/// all become `"nationalism_india"`.
pub fn normalize_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .collect();
    let last = words.len().saturating_sub(1);

    words
        .iter()
        .enumerate()
        .filter(|(position, word)| {
            *position == 0 || *position == last || !CONNECTOR_WORDS.contains(*word)
        })
        .map(|(_, word)| *word)
        .collect::<Vec<_>>()
        .join("_")
}

pub fn names_match(a: &str, b: &str) -> bool {
    normalize_name(a) == normalize_name(b)
}

/// Name normalizer carrying an alias table of known lesson-name variants.
#[derive(Debug, Clone, Default)]
pub struct NameNormalizer {
    aliases: HashMap<String, String>,
}

impl NameNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Both sides of every alias pair are normalized up front, so the table can
    /// be written with display names.
    pub fn with_aliases<I, K, V>(aliases: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let aliases = aliases
            .into_iter()
            .map(|(alias, canonical)| {
                (
                    normalize_name(alias.as_ref()),
                    normalize_name(canonical.as_ref()),
                )
            })
            .filter(|(alias, canonical)| !alias.is_empty() && alias != canonical)
            .collect();

        Self { aliases }
    }

    pub fn normalize(&self, name: &str) -> String {
        let normalized = normalize_name(name);
        match self.aliases.get(&normalized) {
            Some(canonical) => canonical.clone(),
            None => normalized,
        }
    }

    pub fn names_match(&self, a: &str, b: &str) -> bool {
        self.normalize(a) == self.normalize(b)
    }

    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }
}
