//! Text analyzers for the artist index
//!
//! Three analyzers cover the field contract:
//! - `artist_ngram`: words, lower-cased, ASCII-folded, expanded into edge
//!   n-grams (min 2 / max 20) — substring and prefix matching on the name.
//! - `artist_words`: words, lower-cased, ASCII-folded — fuzzy and
//!   cross-field term matching.
//! - `artist_keyword`: the whole string as one lower-cased, ASCII-folded
//!   token — exact, prefix, wildcard, abbreviation and completion matching.

use tantivy::tokenizer::{
    AsciiFoldingFilter, LowerCaser, RawTokenizer, SimpleTokenizer, TextAnalyzer, Token,
    TokenFilter, TokenStream, Tokenizer,
};
use tantivy::Index;

pub(crate) const TOKENIZER_EDGE_NGRAM: &str = "artist_ngram";
pub(crate) const TOKENIZER_WORDS: &str = "artist_words";
pub(crate) const TOKENIZER_KEYWORD: &str = "artist_keyword";

const EDGE_NGRAM_MIN: usize = 2;
const EDGE_NGRAM_MAX: usize = 20;

/// Register the artist analyzers with an index. Must run on every open,
/// before any read or write touches the analyzed fields.
pub(crate) fn register_tokenizers(index: &Index) {
    let ngram = TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(LowerCaser)
        .filter(AsciiFoldingFilter)
        .filter(EdgeNgramFilter::new(EDGE_NGRAM_MIN, EDGE_NGRAM_MAX))
        .build();
    index.tokenizers().register(TOKENIZER_EDGE_NGRAM, ngram);

    let words = TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(LowerCaser)
        .filter(AsciiFoldingFilter)
        .build();
    index.tokenizers().register(TOKENIZER_WORDS, words);

    let keyword = TextAnalyzer::builder(RawTokenizer::default())
        .filter(LowerCaser)
        .filter(AsciiFoldingFilter)
        .build();
    index.tokenizers().register(TOKENIZER_KEYWORD, keyword);
}

/// Token filter that replaces each token with its leading-edge n-grams.
///
/// Tantivy ships an `NgramTokenizer`, but that operates on the raw text
/// stream; matching the per-word edge n-gram behavior of the index
/// contract requires a filter stage applied after word tokenization.
/// Emitted grams keep the source token's position and offsets. Tokens
/// shorter than `min_gram` produce nothing.
#[derive(Clone)]
pub(crate) struct EdgeNgramFilter {
    min_gram: usize,
    max_gram: usize,
}

impl EdgeNgramFilter {
    pub(crate) fn new(min_gram: usize, max_gram: usize) -> Self {
        debug_assert!(min_gram > 0 && min_gram <= max_gram);
        Self { min_gram, max_gram }
    }
}

impl TokenFilter for EdgeNgramFilter {
    type Tokenizer<T: Tokenizer> = EdgeNgramFilterWrapper<T>;

    fn transform<T: Tokenizer>(self, tokenizer: T) -> Self::Tokenizer<T> {
        EdgeNgramFilterWrapper {
            inner: tokenizer,
            min_gram: self.min_gram,
            max_gram: self.max_gram,
        }
    }
}

#[derive(Clone)]
pub(crate) struct EdgeNgramFilterWrapper<T> {
    inner: T,
    min_gram: usize,
    max_gram: usize,
}

impl<T: Tokenizer> Tokenizer for EdgeNgramFilterWrapper<T> {
    type TokenStream<'a> = EdgeNgramTokenStream<T::TokenStream<'a>>;

    fn token_stream<'a>(&'a mut self, text: &'a str) -> Self::TokenStream<'a> {
        EdgeNgramTokenStream {
            inner: self.inner.token_stream(text),
            min_gram: self.min_gram,
            max_gram: self.max_gram,
            grams: Vec::new(),
            cursor: 0,
            token: Token::default(),
        }
    }
}

pub(crate) struct EdgeNgramTokenStream<T> {
    inner: T,
    min_gram: usize,
    max_gram: usize,
    grams: Vec<Token>,
    cursor: usize,
    token: Token,
}

impl<T: TokenStream> TokenStream for EdgeNgramTokenStream<T> {
    fn advance(&mut self) -> bool {
        loop {
            if self.cursor < self.grams.len() {
                self.token = self.grams[self.cursor].clone();
                self.cursor += 1;
                return true;
            }

            if !self.inner.advance() {
                return false;
            }

            self.grams.clear();
            self.cursor = 0;

            let source = self.inner.token();
            let chars: Vec<char> = source.text.chars().collect();
            if chars.len() < self.min_gram {
                continue;
            }

            let upper = chars.len().min(self.max_gram);
            for len in self.min_gram..=upper {
                let mut gram = source.clone();
                gram.text = chars[..len].iter().collect();
                self.grams.push(gram);
            }
        }
    }

    fn token(&self) -> &Token {
        &self.token
    }

    fn token_mut(&mut self) -> &mut Token {
        &mut self.token
    }
}

/// Run `text` through a registered analyzer and collect the token texts.
pub(crate) fn analyze(index: &Index, tokenizer: &str, text: &str) -> Vec<String> {
    let mut analyzer = index
        .tokenizers()
        .get(tokenizer)
        .unwrap_or_else(|| panic!("tokenizer {tokenizer} not registered"));
    let mut stream = analyzer.token_stream(text);
    let mut tokens = Vec::new();
    while let Some(token) = stream.next() {
        tokens.push(token.text.clone());
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use tantivy::schema::Schema;

    fn test_index() -> Index {
        let index = Index::create_in_ram(Schema::builder().build());
        register_tokenizers(&index);
        index
    }

    #[test]
    fn test_edge_ngrams_per_word() {
        let index = test_index();
        let tokens = analyze(&index, TOKENIZER_EDGE_NGRAM, "The Weeknd");
        assert!(tokens.contains(&"th".to_string()));
        assert!(tokens.contains(&"the".to_string()));
        assert!(tokens.contains(&"we".to_string()));
        assert!(tokens.contains(&"wee".to_string()));
        assert!(tokens.contains(&"weeknd".to_string()));
        // Grams never cross word boundaries.
        assert!(!tokens.iter().any(|t| t.contains(' ')));
    }

    #[test]
    fn test_edge_ngrams_skip_short_tokens() {
        let index = test_index();
        let tokens = analyze(&index, TOKENIZER_EDGE_NGRAM, "a bc");
        assert_eq!(tokens, vec!["bc".to_string()]);
    }

    #[test]
    fn test_keyword_analyzer_folds_whole_string() {
        let index = test_index();
        let tokens = analyze(&index, TOKENIZER_KEYWORD, "Beyoncé Knowles");
        assert_eq!(tokens, vec!["beyonce knowles".to_string()]);
    }

    #[test]
    fn test_words_analyzer() {
        let index = test_index();
        let tokens = analyze(&index, TOKENIZER_WORDS, "Daft PUNK");
        assert_eq!(tokens, vec!["daft".to_string(), "punk".to_string()]);
    }
}
