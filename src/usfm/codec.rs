use std::fmt::Write as _;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::book_index::{BookIndex, CHAPTER_MARKER, LabelledChunk, VERSE_MARKER};
use crate::types::{
    verse_object::{Milestone, VerseObject, Word},
    verse_reference::{VerseLabel, VerseReference},
};

/// Conversion between verse objects and USFM, at verse and at book level.
pub trait UsfmCodec {
    fn verse_to_usfm(&self, verse_objects: &[VerseObject]) -> String;

    fn parse_book(&self, usfm: &str) -> Result<BookObjects>;

    fn book_to_usfm(&self, book: &BookObjects) -> Result<String>;
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct VerseContent {
    pub label: String,
    pub separator: String,
    pub objects: Vec<VerseObject>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ChapterContent {
    pub label: String,
    pub separator: String,
    pub front: Vec<VerseObject>,
    pub verses: Vec<VerseContent>,
}

/// A whole book as verse objects, keeping every label and separator so that
/// rendering an unmodified book reproduces its source.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct BookObjects {
    pub header: Vec<VerseObject>,
    pub chapters: Vec<ChapterContent>,
}

/// Leading number of a label, `"3-5"` sorts as 3.
fn label_number(label: &str) -> Option<u32> {
    let digits = label.find(|c: char| !c.is_ascii_digit()).unwrap_or(label.len());
    label[..digits].parse().ok()
}

impl BookObjects {
    pub fn verse(&self, reference: &VerseReference) -> Option<&[VerseObject]> {
        let chapter_label = reference.chapter.to_string();
        let chapter = self.chapters.iter().find(|c| c.label == chapter_label)?;

        if reference.verse == VerseLabel::Front {
            return Some(&chapter.front);
        }

        let verse_label = reference.verse.to_string();
        chapter
            .verses
            .iter()
            .find(|v| v.label == verse_label)
            .map(|v| v.objects.as_slice())
    }

    /// Replace the content of a verse, creating the chapter or the verse in
    /// numeric order when the book does not have it yet.
    pub fn set_verse(&mut self, reference: &VerseReference, objects: Vec<VerseObject>) {
        let chapter_label = reference.chapter.to_string();
        let chapter_index = match self.chapters.iter().position(|c| c.label == chapter_label) {
            Some(index) => index,
            None => {
                let index = self
                    .chapters
                    .iter()
                    .position(|c| label_number(&c.label).is_some_and(|n| n > reference.chapter))
                    .unwrap_or(self.chapters.len());
                self.chapters.insert(index, ChapterContent {
                    label: chapter_label,
                    separator: "\n".to_owned(),
                    ..ChapterContent::default()
                });
                index
            }
        };
        let chapter = &mut self.chapters[chapter_index];

        if reference.verse == VerseLabel::Front {
            chapter.front = objects;
            return;
        }

        let verse_label = reference.verse.to_string();
        if let Some(verse) = chapter.verses.iter_mut().find(|v| v.label == verse_label) {
            verse.objects = objects;
            return;
        }

        let first_verse = reference.verse.first_verse();
        let index = chapter
            .verses
            .iter()
            .position(|v| label_number(&v.label).is_some_and(|n| n > first_verse))
            .unwrap_or(chapter.verses.len());
        chapter.verses.insert(index, VerseContent {
            label: verse_label,
            separator: " ".to_owned(),
            objects,
        });
    }
}

/// Renders verse objects in the aligned USFM flavour (`\w` words with
/// occurrence attributes inside `\zaln-s`/`\zaln-e\*` milestones). Books are
/// parsed into one text object per verse, which is enough to rebuild a book
/// around edited verses without touching anything else.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicUsfmCodec;

impl BasicUsfmCodec {
    fn write_word(out: &mut String, word: &Word) {
        let _ = write!(out, "\\w {}|", word.text);
        if let Some(lemma) = &word.lemma {
            let _ = write!(out, "lemma=\"{lemma}\" ");
        }
        if let Some(strong) = &word.strong {
            let _ = write!(out, "strong=\"{strong}\" ");
        }
        if let Some(morph) = &word.morph {
            let _ = write!(out, "x-morph=\"{morph}\" ");
        }
        let _ = write!(
            out,
            "x-occurrence=\"{}\" x-occurrences=\"{}\"\\w*",
            word.occurrence, word.occurrences
        );
        out.push_str(word.next_char.as_deref().unwrap_or_default());
    }

    fn write_milestone(&self, out: &mut String, milestone: &Milestone) {
        let _ = write!(out, "\\{}-s |", milestone.tag);
        if let Some(strong) = &milestone.strong {
            let _ = write!(out, "x-strong=\"{strong}\" ");
        }
        if let Some(lemma) = &milestone.lemma {
            let _ = write!(out, "x-lemma=\"{lemma}\" ");
        }
        if let Some(morph) = &milestone.morph {
            let _ = write!(out, "x-morph=\"{morph}\" ");
        }
        let _ = write!(
            out,
            "x-occurrence=\"{}\" x-occurrences=\"{}\" x-content=\"{}\"\\*",
            milestone.occurrence, milestone.occurrences, milestone.content
        );
        self.write_objects(out, &milestone.children);
        let _ = write!(out, "\\{}-e\\*", milestone.tag);
        out.push_str(milestone.next_char.as_deref().unwrap_or_default());
    }

    fn write_objects(&self, out: &mut String, verse_objects: &[VerseObject]) {
        for object in verse_objects {
            match object {
                VerseObject::Text { text } => out.push_str(text),
                VerseObject::Word(word) => Self::write_word(out, word),
                VerseObject::Paragraph { tag, next_char } => {
                    out.push('\\');
                    out.push_str(tag);
                    out.push_str(next_char.as_deref().unwrap_or("\n"));
                }
                VerseObject::Milestone(milestone) => self.write_milestone(out, milestone),
            }
        }
    }

    fn verbatim(text: &str) -> Vec<VerseObject> {
        if text.is_empty() {
            vec![]
        } else {
            vec![VerseObject::text(text)]
        }
    }

    fn verse_content(chunk: &LabelledChunk<'_>) -> VerseContent {
        VerseContent {
            label: chunk.label.to_owned(),
            separator: chunk.separator.to_owned(),
            objects: Self::verbatim(chunk.body),
        }
    }
}

impl UsfmCodec for BasicUsfmCodec {
    fn verse_to_usfm(&self, verse_objects: &[VerseObject]) -> String {
        let mut out = String::new();
        self.write_objects(&mut out, verse_objects);
        out
    }

    fn parse_book(&self, usfm: &str) -> Result<BookObjects> {
        let index = BookIndex::new(usfm);

        let chapters = index
            .chapters()
            .iter()
            .map(|chapter| ChapterContent {
                label: chapter.head.label.to_owned(),
                separator: chapter.head.separator.to_owned(),
                front: Self::verbatim(chapter.head.body),
                verses: chapter.verses.iter().map(Self::verse_content).collect(),
            })
            .collect();

        Ok(BookObjects {
            header: Self::verbatim(index.header()),
            chapters,
        })
    }

    fn book_to_usfm(&self, book: &BookObjects) -> Result<String> {
        let mut out = String::new();
        self.write_objects(&mut out, &book.header);

        for chapter in &book.chapters {
            out.push_str(CHAPTER_MARKER);
            out.push_str(&chapter.label);
            out.push_str(&chapter.separator);
            self.write_objects(&mut out, &chapter.front);

            for verse in &chapter.verses {
                out.push_str(VERSE_MARKER);
                out.push_str(&verse.label);
                out.push_str(&verse.separator);
                self.write_objects(&mut out, &verse.objects);
            }
        }

        Ok(out)
    }
}
