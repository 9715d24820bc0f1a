//! Text normalization: noise stripping, segmentation and noun filtering.
//!
//! Segmentation itself is delegated to a [`Tokenizer`]. Any morphological
//! analyser that reports IPADIC-style part-of-speech strings (`名詞,一般`,
//! `名詞,数`, `助詞,格助詞`, ...) can be plugged in; two simple ones ship with
//! the crate for pre-segmented text and lexicon-driven segmentation.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use log::debug;
use regex::Regex;

use crate::error::Result;

/// One segment reported by a [`Tokenizer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Morpheme {
    pub surface: String,
    /// Comma-joined part-of-speech path, most general first.
    pub pos: String,
    /// Dictionary (lemma) form.
    pub base: String,
}

impl Morpheme {
    pub fn new(surface: &str, pos: &str, base: &str) -> Self {
        Morpheme {
            surface: surface.to_string(),
            pos: pos.to_string(),
            base: base.to_string(),
        }
    }

    /// Common nouns only: numeral and pronoun nouns are not content terms.
    pub fn is_content_noun(&self) -> bool {
        self.pos.starts_with("名詞")
            && !self.pos.starts_with("名詞,数")
            && !self.pos.starts_with("名詞,代名詞")
    }
}

/// Segments raw text into morphemes.
pub trait Tokenizer: Send + Sync {
    fn segment(&self, text: &str) -> Vec<Morpheme>;
}

fn is_digit_word(word: &str) -> bool {
    !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_digit() || ('０'..='９').contains(&c))
}

/// Tokenizer for text that is already segmented (one word per
/// whitespace-separated chunk). Every word is tagged as a common noun, except
/// digit-only words which are tagged as numerals.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn segment(&self, text: &str) -> Vec<Morpheme> {
        text.split(|c: char| {
            c.is_whitespace() || (c.is_ascii_punctuation() && c != '-') || "、。，．「」『』（）！？・".contains(c)
        })
        .filter(|w| !w.is_empty())
        .map(|w| {
            let pos = if is_digit_word(w) { "名詞,数" } else { "名詞,一般" };
            Morpheme::new(w, pos, w)
        })
        .collect()
    }
}

/// Longest-match tokenizer over a fixed lexicon.
///
/// Characters not covered by any lexicon entry are emitted one by one as
/// `記号,一般` so they never survive noun filtering.
#[derive(Debug, Clone, Default)]
pub struct LexiconTokenizer {
    entries: HashMap<String, (String, String)>,
    longest: usize,
}

impl LexiconTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) an entry. `surface` is matched literally.
    pub fn insert(&mut self, surface: &str, pos: &str, base: &str) {
        if surface.is_empty() {
            return;
        }
        self.longest = self.longest.max(surface.chars().count());
        self.entries
            .insert(surface.to_string(), (pos.to_string(), base.to_string()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Loads a tab-separated lexicon: `surface<TAB>pos<TAB>base`.
    /// A missing third column means the base form equals the surface form.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .comment(Some(b'#'))
            .from_path(path.as_ref())?;
        let mut lexicon = LexiconTokenizer::new();
        for record in rdr.records() {
            let record = record?;
            let surface = record.get(0).unwrap_or("").trim();
            let pos = record.get(1).unwrap_or("名詞,一般").trim();
            let base = record.get(2).map(str::trim).unwrap_or(surface);
            lexicon.insert(surface, pos, base);
        }
        debug!(
            "Loaded lexicon with {} entries from {}",
            lexicon.len(),
            path.as_ref().display()
        );
        Ok(lexicon)
    }
}

impl Tokenizer for LexiconTokenizer {
    fn segment(&self, text: &str) -> Vec<Morpheme> {
        let chars: Vec<char> = text.chars().collect();
        let mut out = Vec::new();
        let mut i = 0;
        while i < chars.len() {
            if chars[i].is_whitespace() {
                i += 1;
                continue;
            }
            let max_len = self.longest.min(chars.len() - i);
            let mut matched = None;
            for len in (1..=max_len).rev() {
                let candidate: String = chars[i..i + len].iter().collect();
                if let Some((pos, base)) = self.entries.get(&candidate) {
                    matched = Some((len, Morpheme::new(&candidate, pos, base)));
                    break;
                }
            }
            match matched {
                Some((len, morpheme)) => {
                    out.push(morpheme);
                    i += len;
                }
                None => {
                    let s = chars[i].to_string();
                    out.push(Morpheme::new(&s, "記号,一般", &s));
                    i += 1;
                }
            }
        }
        out
    }
}

/// Fixed synonym folding applied to every kept term.
const SYNONYM_FOLDS: [(&str, &str); 2] = [("サイト", "ネット"), ("携帯", "電話")];

/// Reads a stopword file, one word per line. A missing file is treated as an
/// empty list.
pub fn load_stopwords<P: AsRef<Path>>(path: P) -> Result<HashSet<String>> {
    let path = path.as_ref();
    if !path.exists() {
        debug!("Stopword file {} not found, using none", path.display());
        return Ok(HashSet::new());
    }
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect())
}

/// Turns raw record text into the ordered list of content terms.
pub struct TextNormalizer {
    tokenizer: Box<dyn Tokenizer>,
    stopwords: HashSet<String>,
    noise: Vec<Regex>,
}

impl TextNormalizer {
    pub fn new(tokenizer: Box<dyn Tokenizer>, stopwords: HashSet<String>) -> Result<Self> {
        let noise = [
            r"https?://\S+",
            r"\d{2,4}年\d{1,2}月\d{1,2}日",
            r"\d{2,4}[-/]\d{1,2}[-/]\d{1,2}",
            r"\d{2,4}-\d{2,4}-\d{2,4}",
        ]
        .iter()
        .map(|p| Regex::new(p))
        .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(TextNormalizer {
            tokenizer,
            stopwords,
            noise,
        })
    }

    /// Removes URLs and date literals.
    pub fn clean(&self, text: &str) -> String {
        let mut out = text.to_string();
        for re in &self.noise {
            out = re.replace_all(&out, "").into_owned();
        }
        out
    }

    /// # Example
    /// ```
    /// use std::collections::HashSet;
    /// use cooccur_trends::{TextNormalizer, WhitespaceTokenizer};
    ///
    /// let n = TextNormalizer::new(Box::new(WhitespaceTokenizer), HashSet::new()).unwrap();
    /// let terms = n.normalize("サイト 詐欺 2023/04/01 http://example.com 12 携帯");
    /// assert_eq!(terms, vec!["ネット", "詐欺", "電話"]);
    /// ```
    pub fn normalize(&self, raw: &str) -> Vec<String> {
        let cleaned = self.clean(raw);
        self.tokenizer
            .segment(&cleaned)
            .into_iter()
            .filter(|m| m.is_content_noun())
            .map(|m| m.base)
            .filter(|base| base.chars().count() > 1)
            .filter(|base| !self.stopwords.contains(base) && !is_digit_word(base))
            .map(|base| {
                SYNONYM_FOLDS
                    .iter()
                    .find(|(from, _)| *from == base)
                    .map(|(_, to)| to.to_string())
                    .unwrap_or(base)
            })
            .collect()
    }

    /// Normalizes every present text; absent texts are skipped.
    pub fn normalize_documents(&self, texts: &[Option<String>]) -> Vec<Vec<String>> {
        texts
            .iter()
            .flatten()
            .map(|t| self.normalize(t))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_lexicon() -> LexiconTokenizer {
        let mut lx = LexiconTokenizer::new();
        lx.insert("電話", "名詞,一般", "電話");
        lx.insert("携帯", "名詞,一般", "携帯");
        lx.insert("サイト", "名詞,一般", "サイト");
        lx.insert("詐欺", "名詞,サ変接続", "詐欺");
        lx.insert("被害", "名詞,一般", "被害");
        lx.insert("これ", "名詞,代名詞,一般", "これ");
        lx.insert("三", "名詞,数", "三");
        lx.insert("で", "助詞,格助詞,一般", "で");
        lx.insert("遭っ", "動詞,自立", "遭う");
        lx
    }

    #[test]
    fn content_noun_filter() {
        assert!(Morpheme::new("詐欺", "名詞,サ変接続", "詐欺").is_content_noun());
        assert!(!Morpheme::new("三", "名詞,数", "三").is_content_noun());
        assert!(!Morpheme::new("これ", "名詞,代名詞,一般", "これ").is_content_noun());
        assert!(!Morpheme::new("で", "助詞,格助詞,一般", "で").is_content_noun());
    }

    #[test]
    fn lexicon_longest_match() {
        let mut lx = LexiconTokenizer::new();
        lx.insert("電", "名詞,一般", "電");
        lx.insert("電話", "名詞,一般", "電話");
        let segs = lx.segment("電話だ");
        assert_eq!(segs[0].surface, "電話");
        assert_eq!(segs[1].pos, "記号,一般");
    }

    #[test]
    fn folds_synonyms_and_drops_pronouns() {
        let n = TextNormalizer::new(Box::new(sample_lexicon()), HashSet::new()).unwrap();
        assert_eq!(n.normalize("携帯でサイト"), vec!["電話", "ネット"]);
        assert!(n.normalize("これで三").is_empty());
    }

    #[test]
    fn stopwords_are_removed() {
        let mut stop = HashSet::new();
        stop.insert("被害".to_string());
        let n = TextNormalizer::new(Box::new(sample_lexicon()), stop).unwrap();
        assert_eq!(n.normalize("詐欺被害"), vec!["詐欺"]);
    }

    #[test]
    fn dates_and_urls_are_stripped() {
        let n = TextNormalizer::new(Box::new(WhitespaceTokenizer), HashSet::new()).unwrap();
        let cleaned = n.clean("2023年4月1日 相談 https://x.example/a?b=1 2023-04-01 23/4/1");
        assert!(!cleaned.contains("2023"));
        assert!(!cleaned.contains("https"));
        assert!(cleaned.contains("相談"));
    }

    #[test]
    fn digits_and_single_chars_are_dropped() {
        let n = TextNormalizer::new(Box::new(WhitespaceTokenizer), HashSet::new()).unwrap();
        assert_eq!(n.normalize("１２３ 4567 a 請求"), vec!["請求"]);
    }

    #[test]
    fn absent_documents_are_skipped() {
        let n = TextNormalizer::new(Box::new(WhitespaceTokenizer), HashSet::new()).unwrap();
        let docs = vec![Some("請求 詐欺".to_string()), None, Some(String::new())];
        let out = n.normalize_documents(&docs);
        assert_eq!(out.len(), 2);
        assert!(out[1].is_empty());
    }

    #[test]
    fn missing_stopword_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let stop = load_stopwords(dir.path().join("none.txt")).unwrap();
        assert!(stop.is_empty());
    }
}
