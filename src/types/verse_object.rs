use serde::{Deserialize, Serialize};

/// A `\w` word. Target language words carry only their occurrence counts,
/// original language words also carry lexical data.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    pub text: String,
    pub occurrence: u32,
    pub occurrences: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strong: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lemma: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub morph: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_char: Option<String>,
}

/// An alignment milestone (`\zaln-s ... \zaln-e\*`). The attributes describe
/// the original language word; `children` are the target words aligned to
/// it, possibly wrapped in further milestones for many-to-many alignments.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub tag: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strong: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lemma: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub morph: Option<String>,
    pub occurrence: u32,
    pub occurrences: u32,
    #[serde(default)]
    pub children: Vec<VerseObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_char: Option<String>,
}

/// One node of the parsed content of a verse.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum VerseObject {
    Text {
        text: String,
    },
    Word(Word),
    Paragraph {
        tag: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        next_char: Option<String>,
    },
    Milestone(Milestone),
}

impl VerseObject {
    pub fn text(text: impl Into<String>) -> Self { VerseObject::Text { text: text.into() } }

    pub fn word(text: impl Into<String>, occurrence: u32, occurrences: u32) -> Self {
        VerseObject::Word(Word {
            text: text.into(),
            occurrence,
            occurrences,
            ..Word::default()
        })
    }

    pub fn paragraph(tag: impl Into<String>) -> Self {
        VerseObject::Paragraph {
            tag: tag.into(),
            next_char: None,
        }
    }

    pub fn next_char(&self) -> Option<&str> {
        match self {
            VerseObject::Text { .. } => None,
            VerseObject::Word(word) => word.next_char.as_deref(),
            VerseObject::Paragraph { next_char, .. } => next_char.as_deref(),
            VerseObject::Milestone(milestone) => milestone.next_char.as_deref(),
        }
    }

    fn push_verse_text(&self, out: &mut String) {
        match self {
            VerseObject::Text { text } => out.push_str(text),
            VerseObject::Word(word) => {
                out.push_str(&word.text);
                out.push_str(word.next_char.as_deref().unwrap_or_default());
            }
            VerseObject::Paragraph { tag, next_char } => {
                out.push('\\');
                out.push_str(tag);
                out.push_str(next_char.as_deref().unwrap_or("\n"));
            }
            VerseObject::Milestone(milestone) => {
                for child in &milestone.children {
                    child.push_verse_text(out);
                }
                out.push_str(milestone.next_char.as_deref().unwrap_or_default());
            }
        }
    }
}

/// The editable text of a verse: its USFM with all alignment markup removed.
pub fn verse_text(verse_objects: &[VerseObject]) -> String {
    let mut out = String::new();
    for object in verse_objects {
        object.push_verse_text(&mut out);
    }
    out
}

/// All words of a verse in reading order, including the ones nested inside
/// alignment milestones.
pub fn words(verse_objects: &[VerseObject]) -> Vec<&Word> {
    fn collect<'a>(objects: &'a [VerseObject], out: &mut Vec<&'a Word>) {
        for object in objects {
            match object {
                VerseObject::Word(word) => out.push(word),
                VerseObject::Milestone(milestone) => collect(&milestone.children, out),
                VerseObject::Text { .. } | VerseObject::Paragraph { .. } => {}
            }
        }
    }

    let mut out = Vec::new();
    collect(verse_objects, &mut out);
    out
}
