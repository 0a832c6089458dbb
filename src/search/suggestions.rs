//! Suggestion variant generation for autocomplete
//!
//! Pure functions: given an artist's display name, produce every alternate
//! string form that should route autocomplete traffic to that artist. The
//! output is a deterministic function of the name alone, so a document's
//! suggestion set can be regenerated idempotently on every re-index.

use std::collections::BTreeSet;

/// Letter-pattern swaps covering common typing mistakes.
const TYPO_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("ph", "f"),
    ("f", "ph"),
    ("ck", "k"),
    ("k", "ck"),
    ("z", "s"),
    ("s", "z"),
    ("y", "i"),
    ("i", "y"),
    ("c", "k"),
    ("k", "c"),
    ("ei", "ie"),
    ("ie", "ei"),
    ("ou", "ow"),
    ("ow", "ou"),
];

/// Sound-alike replacements. Overlaps with the typo table but kept separate
/// so either set can be tuned or removed independently.
const PHONETIC_RULES: &[(&str, &str)] = &[
    ("ph", "f"),
    ("f", "ph"),
    ("ck", "k"),
    ("k", "ck"),
    ("z", "s"),
    ("s", "z"),
    ("y", "i"),
    ("ie", "ei"),
    ("ou", "ow"),
    ("ow", "ou"),
];

/// Canonical one-direction folding used for the phonetic index field.
/// Both spellings of each sound collapse to the same key, so
/// "Stephan" and "Stefan" produce identical phonetic terms.
const PHONETIC_FOLDING: &[(&str, &str)] = &[
    ("ph", "f"),
    ("ck", "k"),
    ("c", "k"),
    ("z", "s"),
    ("y", "i"),
    ("ou", "ow"),
];

/// Curated celebrity nicknames: canonical full name -> known short forms.
const NICKNAMES: &[(&str, &[&str])] = &[
    ("michael jackson", &["mj"]),
    ("justin timberlake", &["jt"]),
    ("jennifer lopez", &["jlo"]),
    ("eminem", &["em", "slim shady"]),
    ("rihanna", &["riri"]),
    ("beyonce", &["bee", "queen b"]),
];

/// Word suffixes stripped to produce stem-like variants.
const STRIP_SUFFIXES: &[&str] = &["er", "ed", "ing", "s"];

const MIN_VARIANT_LEN: usize = 2;
const MAX_VARIANT_LEN: usize = 50;

/// Generate the full suggestion set for a display name.
///
/// The set always contains the original name and its lower-cased trimmed
/// form; every generated variant is length-filtered to [2, 50] characters.
/// An empty name yields an empty set.
pub fn generate_suggestions(name: &str) -> BTreeSet<String> {
    let mut suggestions = BTreeSet::new();
    if name.trim().is_empty() {
        return suggestions;
    }

    let clean = name.trim().to_lowercase();
    suggestions.insert(name.to_string());
    suggestions.insert(clean.clone());

    let variants = typo_variants(&clean)
        .into_iter()
        .chain(phonetic_variants(&clean))
        .chain(abbreviation_variants(name))
        .chain(partial_variants(&clean))
        .chain(spacing_variants(name));

    for variant in variants {
        let len = variant.chars().count();
        if (MIN_VARIANT_LEN..=MAX_VARIANT_LEN).contains(&len) {
            suggestions.insert(variant);
        }
    }

    suggestions
}

/// Collapse a string to its phonetic key.
///
/// Shared by the document transformer (index side) and the query engine
/// (search side) so both fold spellings identically.
pub fn phonetic_key(text: &str) -> String {
    let mut key = text.trim().to_lowercase();
    for (from, to) in PHONETIC_FOLDING {
        key = key.replace(from, to);
    }
    key
}

/// Abbreviation forms for a name: initials (joined and spaced) when the
/// name has at least two words, plus any curated nickname whose canonical
/// full name occurs in this name.
pub fn abbreviation_variants(name: &str) -> Vec<String> {
    let lower = name.to_lowercase();
    let words: Vec<&str> = lower.split_whitespace().collect();
    let mut variants = Vec::new();

    if words.len() >= 2 {
        let initials: Vec<String> = words
            .iter()
            .filter_map(|w| w.chars().next())
            .map(|c| c.to_string())
            .collect();
        variants.push(initials.concat());
        variants.push(initials.join(" "));
    }

    for (full_name, aliases) in NICKNAMES {
        if lower.contains(full_name) {
            variants.extend(aliases.iter().map(|a| (*a).to_string()));
        }
    }

    variants
}

fn apply_substitutions(text: &str, table: &[(&str, &str)]) -> Vec<String> {
    let mut variants = Vec::new();
    for (from, to) in table {
        let variant = text.replace(from, to);
        if variant != text {
            variants.push(variant);
        }
    }
    variants
}

fn typo_variants(clean: &str) -> Vec<String> {
    apply_substitutions(clean, TYPO_SUBSTITUTIONS)
}

fn phonetic_variants(clean: &str) -> Vec<String> {
    apply_substitutions(clean, PHONETIC_RULES)
}

/// Per-word prefixes (length 3 up to one short of the word) and
/// suffix-stripped stems.
fn partial_variants(clean: &str) -> Vec<String> {
    let mut variants = Vec::new();
    for word in clean.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();
        if chars.len() < 3 {
            continue;
        }
        for len in 3..chars.len() {
            variants.push(chars[..len].iter().collect());
        }
        for suffix in STRIP_SUFFIXES {
            let suffix_len = suffix.chars().count();
            if word.ends_with(suffix) && chars.len() > suffix_len + 2 {
                variants.push(chars[..chars.len() - suffix_len].iter().collect());
            }
        }
    }
    variants
}

/// The name with all whitespace removed, and a lower-cased space-inserted
/// form wherever a lowercase letter runs straight into an uppercase one.
fn spacing_variants(name: &str) -> Vec<String> {
    let mut variants = Vec::new();

    let collapsed: String = name.split_whitespace().collect();
    variants.push(collapsed);

    let mut spaced = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if prev_lower && c.is_uppercase() {
            spaced.push(' ');
        }
        prev_lower = c.is_lowercase();
        spaced.push(c);
    }
    if spaced != name {
        variants.push(spaced.to_lowercase());
    }

    variants
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_original_and_lowercased() {
        let suggestions = generate_suggestions("The Weeknd");
        assert!(suggestions.contains("The Weeknd"));
        assert!(suggestions.contains("the weeknd"));
    }

    #[test]
    fn test_deterministic() {
        let first = generate_suggestions("Daft Punk");
        let second = generate_suggestions("Daft Punk");
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_name_yields_empty_set() {
        assert!(generate_suggestions("").is_empty());
        assert!(generate_suggestions("   ").is_empty());
    }

    #[test]
    fn test_variant_lengths_within_bounds() {
        for name in ["The Weeknd", "Beyonce", "X", "A Very Long Band Name Indeed"] {
            for variant in generate_suggestions(name) {
                // The original name and its lower-cased form are exempt from
                // the filter; everything else must fit the completion field.
                if variant == name || variant == name.trim().to_lowercase() {
                    continue;
                }
                let len = variant.chars().count();
                assert!(
                    (MIN_VARIANT_LEN..=MAX_VARIANT_LEN).contains(&len),
                    "variant {variant:?} of {name:?} has out-of-range length {len}"
                );
            }
        }
    }

    #[test]
    fn test_abbreviations_for_multi_word_name() {
        let suggestions = generate_suggestions("The Weeknd");
        assert!(suggestions.contains("tw"));
        assert!(suggestions.contains("t w"));
    }

    #[test]
    fn test_curated_nicknames() {
        let suggestions = generate_suggestions("Beyonce");
        assert!(suggestions.contains("bee"));
        assert!(suggestions.contains("queen b"));

        let suggestions = generate_suggestions("Michael Jackson");
        assert!(suggestions.contains("mj"));
    }

    #[test]
    fn test_typo_variants_differ_from_input() {
        let variants = typo_variants("phoenix");
        assert!(variants.contains(&"foenix".to_string()));
        assert!(!variants.contains(&"phoenix".to_string()));
    }

    #[test]
    fn test_word_prefixes() {
        let suggestions = generate_suggestions("Weeknd");
        assert!(suggestions.contains("wee"));
        assert!(suggestions.contains("week"));
        assert!(suggestions.contains("weekn"));
        // Single-character words contribute no prefixes, and nothing
        // shorter than two characters survives the length filter.
        assert!(!generate_suggestions("A B").contains("a"));
    }

    #[test]
    fn test_suffix_stripping() {
        let suggestions = generate_suggestions("Stunning");
        assert!(suggestions.contains("stunn"));
    }

    #[test]
    fn test_spacing_variants() {
        let suggestions = generate_suggestions("Daft Punk");
        assert!(suggestions.contains("DaftPunk"));

        let camel = generate_suggestions("OutKast");
        assert!(camel.contains("OutKast"));

        let split = generate_suggestions("AudioSlave");
        assert!(split.contains("audio slave"));
    }

    #[test]
    fn test_phonetic_key_collapses_spellings() {
        assert_eq!(phonetic_key("Stephan"), phonetic_key("Stefan"));
        assert_eq!(phonetic_key("Zack"), phonetic_key("Sak"));
    }
}
