use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Inclusive frequency band a term must fall into to stay in the vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyBand {
    pub min: u32,
    pub max: u32,
}

impl Default for VocabularyBand {
    fn default() -> Self {
        VocabularyBand { min: 3, max: 500 }
    }
}

impl VocabularyBand {
    pub fn contains(&self, freq: u32) -> bool {
        self.min <= freq && freq <= self.max
    }
}

///Counts every term across `docs` and keeps, per document, only the terms whose
///corpus frequency lies inside `band`. Returns the filtered documents and the
///frequency table computed before filtering.
/// # Example
/// ```
/// use cooccur_trends::{filter_vocabulary, VocabularyBand};
/// let docs = vec![
///     vec!["a".to_string(), "b".to_string()],
///     vec!["a".to_string(), "a".to_string()],
/// ];
/// let (kept, freq) = filter_vocabulary(&docs, VocabularyBand { min: 2, max: 10 });
/// assert_eq!(kept, vec![vec!["a".to_string()], vec!["a".to_string(), "a".to_string()]]);
/// assert_eq!(freq["a"], 3);
/// assert_eq!(freq["b"], 1);
/// ```
pub fn filter_vocabulary(
    docs: &[Vec<String>],
    band: VocabularyBand,
) -> (Vec<Vec<String>>, BTreeMap<String, u32>) {
    let mut frequency: BTreeMap<String, u32> = BTreeMap::new();
    for token in docs.iter().flatten() {
        *frequency.entry(token.to_owned()).or_insert(0) += 1;
    }
    let filtered = docs
        .iter()
        .map(|doc| {
            doc.iter()
                .filter(|t| frequency.get(*t).is_some_and(|&f| band.contains(f)))
                .cloned()
                .collect()
        })
        .collect();
    (filtered, frequency)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn band_is_inclusive() {
        let band = VocabularyBand::default();
        assert!(band.contains(3));
        assert!(band.contains(500));
        assert!(!band.contains(2));
        assert!(!band.contains(501));
    }

    #[test]
    fn drops_rare_terms_per_document() {
        let docs = vec![
            doc(&["詐欺", "電話", "請求"]),
            doc(&["詐欺", "電話"]),
            doc(&["詐欺", "電話", "返金"]),
        ];
        let (kept, freq) = filter_vocabulary(&docs, VocabularyBand::default());
        assert_eq!(kept[0], doc(&["詐欺", "電話"]));
        assert_eq!(kept[2], doc(&["詐欺", "電話"]));
        assert_eq!(freq["請求"], 1);
    }

    #[test]
    fn drops_ultra_common_terms() {
        let docs = vec![doc(&["x", "x", "x", "y", "y", "y"])];
        let (kept, _) = filter_vocabulary(&docs, VocabularyBand { min: 1, max: 2 });
        assert!(kept[0].is_empty());
    }

    #[test]
    fn empty_input() {
        let (kept, freq) = filter_vocabulary(&[], VocabularyBand::default());
        assert!(kept.is_empty());
        assert!(freq.is_empty());
    }
}
