use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use crate::error::{AnalysisError, Result};

/// Maps channel/method terms ("telephone", "online", ...) to their category
/// label. Every other term is a problem term.
#[derive(Debug, Clone, Default)]
pub struct CategoryClassifier {
    word_to_label: HashMap<String, String>,
}

impl CategoryClassifier {
    /// Builds the classifier from `label -> members`.
    ///
    /// A token listed twice under the same label is fine; a token listed
    /// under two different labels is rejected.
    pub fn new<L, I, W>(mapping: L) -> Result<Self>
    where
        L: IntoIterator<Item = (String, I)>,
        I: IntoIterator<Item = W>,
        W: Into<String>,
    {
        let mut word_to_label: HashMap<String, String> = HashMap::new();
        for (label, members) in mapping {
            for word in members {
                let word = word.into();
                match word_to_label.get(&word) {
                    Some(existing) if *existing != label => {
                        return Err(AnalysisError::ConflictingCategory {
                            token: word,
                            first: existing.clone(),
                            second: label,
                        });
                    }
                    Some(_) => {}
                    None => {
                        word_to_label.insert(word, label.clone());
                    }
                }
            }
        }
        Ok(CategoryClassifier { word_to_label })
    }

    /// Channel categories used for consumer consultation records.
    pub fn default_channels() -> Self {
        let mut word_to_label = HashMap::new();
        for (label, members) in [
            ("電話", &["電話", "携帯"][..]),
            ("訪問", &["訪問"][..]),
            ("ネット", &["ネット", "サイト"][..]),
            ("メール", &["メール"][..]),
        ] {
            for m in members {
                word_to_label.insert(m.to_string(), label.to_string());
            }
        }
        CategoryClassifier { word_to_label }
    }

    /// Loads a JSON object of the form `{"label": ["token", ...], ...}`.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mapping: BTreeMap<String, Vec<String>> = serde_json::from_str(&content)?;
        CategoryClassifier::new(mapping)
    }

    pub fn is_category(&self, token: &str) -> bool {
        self.word_to_label.contains_key(token)
    }

    pub fn label_of(&self, token: &str) -> Option<&str> {
        self.word_to_label.get(token).map(String::as_str)
    }
}
