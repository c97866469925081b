pub mod engine;
pub mod reconciler;
mod tokenize;

use serde::{Deserialize, Serialize};

pub use engine::{AlignmentEngine, MilestoneAlignmentEngine};
pub use reconciler::{AlignmentReconciler, ReconciledVerse};

/// An original language word of a verse.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SourceWord {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strong: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lemma: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub morph: Option<String>,
    pub occurrence: u32,
    pub occurrences: u32,
}

impl SourceWord {
    pub fn new(text: impl Into<String>, occurrence: u32, occurrences: u32) -> Self {
        Self {
            text: text.into(),
            occurrence,
            occurrences,
            ..Self::default()
        }
    }

    /// Two source words denote the same token of the original text.
    pub fn is_same_token(&self, other: &SourceWord) -> bool {
        self.text == other.text && self.occurrence == other.occurrence
    }
}

/// A translation word, identified by its text and which occurrence of that
/// text it is within the verse.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub struct TargetWord {
    pub text: String,
    pub occurrence: u32,
    pub occurrences: u32,
}

impl TargetWord {
    pub fn new(text: impl Into<String>, occurrence: u32, occurrences: u32) -> Self {
        Self {
            text: text.into(),
            occurrence,
            occurrences,
        }
    }

    pub fn is_same_token(&self, other: &TargetWord) -> bool {
        self.text == other.text && self.occurrence == other.occurrence
    }
}

/// Original language words aligned to translation words. A pair without
/// targets is a source phrase nobody aligned yet.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentPair {
    pub sources: Vec<SourceWord>,
    pub targets: Vec<TargetWord>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct VerseAlignments {
    pub pairs: Vec<AlignmentPair>,
    /// Translation words not aligned to anything.
    pub wordbank: Vec<TargetWord>,
}
