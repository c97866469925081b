use serde::{Deserialize, Serialize};

use super::{verse_object::VerseObject, verse_reference::VerseReference};
use crate::alignment::SourceWord;

/// What a verse pane changed since it was last saved.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum EditKind {
    Text,
    Alignment,
    TextAndAlignment,
}

impl EditKind {
    pub fn has_text_change(self) -> bool {
        matches!(self, EditKind::Text | EditKind::TextAndAlignment)
    }

    pub fn has_alignment_change(self) -> bool {
        matches!(self, EditKind::Alignment | EditKind::TextAndAlignment)
    }
}

/// An unsaved edit of a single verse (or of a verse range, already flattened
/// into one verse object sequence by the pane).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerseEdit {
    pub reference: VerseReference,
    pub kind: EditKind,
    /// The edited verse text; only present for text changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_verse_text: Option<String>,
    /// The verse content the edit was made on, or the re-aligned content for
    /// alignment changes.
    pub verse_objects: Vec<VerseObject>,
    /// Original language words of the verse, when the pane has them loaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_words: Option<Vec<SourceWord>>,
}

impl VerseEdit {
    pub fn text(
        reference: VerseReference,
        verse_objects: Vec<VerseObject>,
        new_verse_text: impl Into<String>,
    ) -> Self {
        Self {
            reference,
            kind: EditKind::Text,
            new_verse_text: Some(new_verse_text.into()),
            verse_objects,
            source_words: None,
        }
    }

    pub fn alignment(reference: VerseReference, verse_objects: Vec<VerseObject>) -> Self {
        Self {
            reference,
            kind: EditKind::Alignment,
            new_verse_text: None,
            verse_objects,
            source_words: None,
        }
    }

    #[must_use]
    pub fn with_source_words(mut self, source_words: Vec<SourceWord>) -> Self {
        self.source_words = Some(source_words);
        self
    }

    /// Whether the verse text must be run through alignment reconciliation
    /// before it can be rendered.
    pub fn needs_text_reconciliation(&self) -> bool {
        self.kind.has_text_change() && self.new_verse_text.is_some()
    }
}
