//! Search query building
//!
//! Translates free text into the weighted multi-clause query served by
//! [`crate::search::SearchService`], and builds the fuzzy prefix
//! completion query behind autocomplete. Boost ordering is a design
//! contract: exact equality must outrank fuzzy and substring matches, so
//! the built clause plan is introspectable and asserted in tests
//! independent of live index scoring.

use crate::search::analyzer::{analyze, TOKENIZER_KEYWORD, TOKENIZER_WORDS};
use crate::search::document::{
    FIELD_NAME, FIELD_NAME_ABBREVIATION, FIELD_NAME_KEYWORD, FIELD_NAME_NGRAM,
    FIELD_NAME_PHONETIC, FIELD_NORMALIZED_NAME, FIELD_SUGGEST,
};
use crate::search::error::{SearchError, SearchResult};
use crate::search::suggestions::phonetic_key;
use serde::{Deserialize, Serialize};
use tantivy::query::{BooleanQuery, BoostQuery, FuzzyTermQuery, Occur, Query, RegexQuery, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Schema};
use tantivy::{Index, Term};

const BOOST_EXACT: f32 = 10.0;
const BOOST_FUZZY: f32 = 8.0;
const BOOST_PREFIX: f32 = 7.0;
const BOOST_PHONETIC: f32 = 6.0;
const BOOST_ABBREVIATION: f32 = 5.0;
const BOOST_CROSS_FIELD: f32 = 3.0;
const BOOST_SUBSTRING: f32 = 1.0;

/// Autocomplete fuzziness: edit distance 2, transpositions allowed,
/// no protected prefix.
const SUGGEST_FUZZY_DISTANCE: u8 = 2;

/// The matching strategies combined into one disjunctive search query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStrategy {
    /// Whole-string equality on the untokenized, folded name
    Exact,
    /// Per-word fuzzy match with automatic edit-distance tolerance
    Fuzzy,
    /// Case-insensitive prefix of the untokenized name
    Prefix,
    /// Sound-alike match on the phonetic field
    Phonetic,
    /// Exact match against the abbreviation forms
    Abbreviation,
    /// All query terms present across name and normalized name
    CrossField,
    /// Unboosted substring baseline on the untokenized name
    Substring,
}

/// One clause of the built query: which strategy, at what weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClauseWeight {
    pub strategy: MatchStrategy,
    pub boost: f32,
}

/// A built search query plus its introspectable clause plan.
pub struct BuiltQuery {
    pub query: Box<dyn Query>,
    pub plan: Vec<ClauseWeight>,
}

/// Query builder for the artist index
pub struct QueryBuilder {
    schema: Schema,
    index: Index,
}

impl QueryBuilder {
    pub fn new(schema: Schema, index: Index) -> Self {
        Self { schema, index }
    }

    /// Build the disjunctive multi-clause search query for free text.
    ///
    /// Returns `None` when the text analyzes to nothing — the caller
    /// short-circuits to an empty result without touching the index.
    pub fn search_query(&self, text: &str) -> SearchResult<Option<BuiltQuery>> {
        let folded = analyze(&self.index, TOKENIZER_KEYWORD, text)
            .into_iter()
            .next()
            .filter(|t| !t.trim().is_empty());
        let words = analyze(&self.index, TOKENIZER_WORDS, text);
        let phonetic_words = analyze(&self.index, TOKENIZER_WORDS, &phonetic_key(text));

        let name = self.field(FIELD_NAME)?;
        let name_ngram = self.field(FIELD_NAME_NGRAM)?;
        let name_keyword = self.field(FIELD_NAME_KEYWORD)?;
        let name_abbreviation = self.field(FIELD_NAME_ABBREVIATION)?;
        let name_phonetic = self.field(FIELD_NAME_PHONETIC)?;
        let normalized_name = self.field(FIELD_NORMALIZED_NAME)?;

        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        let mut plan = Vec::new();

        // Exact equality on the whole folded name.
        if let Some(ref folded) = folded {
            let term = TermQuery::new(
                Term::from_field_text(name_keyword, folded),
                IndexRecordOption::Basic,
            );
            clauses.push((Occur::Should, boosted(term, BOOST_EXACT)));
            plan.push(ClauseWeight {
                strategy: MatchStrategy::Exact,
                boost: BOOST_EXACT,
            });
        }

        // Per-word fuzzy tolerance, with the edge n-gram terms alongside so
        // a query word that is a prefix of a name word still hits.
        if !words.is_empty() {
            let mut word_clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
            for word in &words {
                let fuzzy = FuzzyTermQuery::new(
                    Term::from_field_text(name, word),
                    auto_fuzzy_distance(word),
                    true,
                );
                word_clauses.push((Occur::Should, Box::new(fuzzy)));
                let ngram = TermQuery::new(
                    Term::from_field_text(name_ngram, word),
                    IndexRecordOption::Basic,
                );
                word_clauses.push((Occur::Should, Box::new(ngram)));
            }
            clauses.push((
                Occur::Should,
                boosted(BooleanQuery::new(word_clauses), BOOST_FUZZY),
            ));
            plan.push(ClauseWeight {
                strategy: MatchStrategy::Fuzzy,
                boost: BOOST_FUZZY,
            });
        }

        // Case-insensitive prefix of the untokenized name.
        if let Some(ref folded) = folded {
            let pattern = format!("{}.*", regex_escape(folded));
            let prefix = RegexQuery::from_pattern(&pattern, name_keyword)
                .map_err(|e| SearchError::QueryFailed(format!("prefix pattern: {e}")))?;
            clauses.push((Occur::Should, boosted(prefix, BOOST_PREFIX)));
            plan.push(ClauseWeight {
                strategy: MatchStrategy::Prefix,
                boost: BOOST_PREFIX,
            });
        }

        // Sound-alike terms.
        if !phonetic_words.is_empty() {
            let phonetic_clauses: Vec<(Occur, Box<dyn Query>)> = phonetic_words
                .iter()
                .map(|word| {
                    let term = TermQuery::new(
                        Term::from_field_text(name_phonetic, word),
                        IndexRecordOption::Basic,
                    );
                    (Occur::Should, Box::new(term) as Box<dyn Query>)
                })
                .collect();
            clauses.push((
                Occur::Should,
                boosted(BooleanQuery::new(phonetic_clauses), BOOST_PHONETIC),
            ));
            plan.push(ClauseWeight {
                strategy: MatchStrategy::Phonetic,
                boost: BOOST_PHONETIC,
            });
        }

        // Exact abbreviation form ("mj" -> Michael Jackson).
        if let Some(ref folded) = folded {
            let term = TermQuery::new(
                Term::from_field_text(name_abbreviation, folded),
                IndexRecordOption::Basic,
            );
            clauses.push((Occur::Should, boosted(term, BOOST_ABBREVIATION)));
            plan.push(ClauseWeight {
                strategy: MatchStrategy::Abbreviation,
                boost: BOOST_ABBREVIATION,
            });
        }

        // Every term present somewhere across name and normalized name.
        if !words.is_empty() {
            let all_terms: Vec<(Occur, Box<dyn Query>)> = words
                .iter()
                .map(|word| {
                    let either: Vec<(Occur, Box<dyn Query>)> = vec![
                        (
                            Occur::Should,
                            Box::new(TermQuery::new(
                                Term::from_field_text(name, word),
                                IndexRecordOption::Basic,
                            )) as Box<dyn Query>,
                        ),
                        (
                            Occur::Should,
                            Box::new(TermQuery::new(
                                Term::from_field_text(normalized_name, word),
                                IndexRecordOption::Basic,
                            )) as Box<dyn Query>,
                        ),
                    ];
                    (
                        Occur::Must,
                        Box::new(BooleanQuery::new(either)) as Box<dyn Query>,
                    )
                })
                .collect();
            clauses.push((
                Occur::Should,
                boosted(BooleanQuery::new(all_terms), BOOST_CROSS_FIELD),
            ));
            plan.push(ClauseWeight {
                strategy: MatchStrategy::CrossField,
                boost: BOOST_CROSS_FIELD,
            });
        }

        // Substring baseline, unboosted.
        if let Some(ref folded) = folded {
            let pattern = format!(".*{}.*", regex_escape(folded));
            let substring = RegexQuery::from_pattern(&pattern, name_keyword)
                .map_err(|e| SearchError::QueryFailed(format!("substring pattern: {e}")))?;
            clauses.push((Occur::Should, Box::new(substring)));
            plan.push(ClauseWeight {
                strategy: MatchStrategy::Substring,
                boost: BOOST_SUBSTRING,
            });
        }

        if clauses.is_empty() {
            return Ok(None);
        }

        // All top-level clauses are `Occur::Should`; a BooleanQuery with only
        // Should clauses already requires at least one to match by default.
        let query = BooleanQuery::new(clauses);

        Ok(Some(BuiltQuery {
            query: Box::new(query),
            plan,
        }))
    }

    /// Build the fuzzy prefix completion query for autocomplete.
    pub fn suggest_query(&self, prefix: &str) -> SearchResult<Option<Box<dyn Query>>> {
        let folded = analyze(&self.index, TOKENIZER_KEYWORD, prefix)
            .into_iter()
            .next()
            .filter(|t| !t.trim().is_empty());

        let Some(folded) = folded else {
            return Ok(None);
        };

        let suggest = self.field(FIELD_SUGGEST)?;
        let query = FuzzyTermQuery::new_prefix(
            Term::from_field_text(suggest, &folded),
            SUGGEST_FUZZY_DISTANCE,
            true,
        );
        Ok(Some(Box::new(query)))
    }

    fn field(&self, name: &str) -> SearchResult<Field> {
        self.schema
            .get_field(name)
            .map_err(|e| SearchError::QueryFailed(format!("unknown field {name}: {e}")))
    }
}

fn boosted(query: impl Query + 'static, boost: f32) -> Box<dyn Query> {
    Box::new(BoostQuery::new(Box::new(query), boost))
}

/// Automatic edit-distance tolerance by term length, mirroring the
/// conventional AUTO fuzziness curve.
fn auto_fuzzy_distance(word: &str) -> u8 {
    match word.chars().count() {
        0..=2 => 0,
        3..=5 => 1,
        _ => 2,
    }
}

/// Escape regex metacharacters so analyzed text matches literally.
fn regex_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(
            c,
            '\\' | '.' | '^' | '$' | '*' | '+' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|'
        ) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::analyzer::register_tokenizers;
    use crate::search::document::build_artist_schema;

    fn builder() -> QueryBuilder {
        let schema = build_artist_schema();
        let index = Index::create_in_ram(schema.clone());
        register_tokenizers(&index);
        QueryBuilder::new(schema, index)
    }

    #[test]
    fn test_exact_clause_outranks_fuzzy() {
        let built = builder().search_query("The Weeknd").unwrap().unwrap();

        let exact = built
            .plan
            .iter()
            .find(|c| c.strategy == MatchStrategy::Exact)
            .unwrap();
        let fuzzy = built
            .plan
            .iter()
            .find(|c| c.strategy == MatchStrategy::Fuzzy)
            .unwrap();

        assert_eq!(exact.boost, 10.0);
        assert_eq!(fuzzy.boost, 8.0);
        assert!(exact.boost > fuzzy.boost);
        assert_eq!(built.plan[0].strategy, MatchStrategy::Exact);
    }

    #[test]
    fn test_clause_plan_is_boost_descending() {
        let built = builder().search_query("daft punk").unwrap().unwrap();
        let boosts: Vec<f32> = built.plan.iter().map(|c| c.boost).collect();
        let mut sorted = boosts.clone();
        sorted.sort_by(|a, b| b.partial_cmp(a).unwrap());
        assert_eq!(boosts, sorted);
    }

    #[test]
    fn test_all_strategies_present_for_plain_text() {
        let built = builder().search_query("Beyonce").unwrap().unwrap();
        let strategies: Vec<MatchStrategy> = built.plan.iter().map(|c| c.strategy).collect();
        for strategy in [
            MatchStrategy::Exact,
            MatchStrategy::Fuzzy,
            MatchStrategy::Prefix,
            MatchStrategy::Phonetic,
            MatchStrategy::Abbreviation,
            MatchStrategy::CrossField,
            MatchStrategy::Substring,
        ] {
            assert!(strategies.contains(&strategy), "missing {strategy:?}");
        }
    }

    #[test]
    fn test_suggest_query_empty_prefix() {
        assert!(builder().suggest_query("").unwrap().is_none());
    }

    #[test]
    fn test_auto_fuzzy_distance() {
        assert_eq!(auto_fuzzy_distance("ab"), 0);
        assert_eq!(auto_fuzzy_distance("abc"), 1);
        assert_eq!(auto_fuzzy_distance("weeknd"), 2);
    }

    #[test]
    fn test_regex_escape() {
        assert_eq!(regex_escape("ac/dc"), "ac/dc");
        assert_eq!(regex_escape("p!nk (band)"), "p!nk \\(band\\)");
    }
}
