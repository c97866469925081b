use std::ops::Range;

use crate::{errors::MergeError, types::verse_reference::VerseLabel};

pub const CHAPTER_MARKER: &str = "\\c ";
pub const VERSE_MARKER: &str = "\\v ";

/// Byte ranges of one chapter: the text following its `\c ` marker, split
/// into the head (label and front matter) and the text following each `\v `
/// marker.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ChapterSpan {
    chunk: Range<usize>,
    head: Range<usize>,
    verses: Vec<Range<usize>>,
}

/// The part of the document holding the body of one verse (or the front
/// matter of a chapter). `separator` is set when the label is not followed by
/// any separator yet and one has to be inserted together with the new body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodySpan {
    pub range: Range<usize>,
    pub separator: Option<&'static str>,
}

/// A chapter or verse chunk split into its label, the single separator
/// character following it, and the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelledChunk<'a> {
    pub label: &'a str,
    pub separator: &'a str,
    pub body: &'a str,
}

impl<'a> LabelledChunk<'a> {
    fn split(chunk: &'a str) -> Self {
        let label_end = chunk.find(char::is_whitespace).unwrap_or(chunk.len());
        let separator_end = chunk[label_end..]
            .chars()
            .next()
            .map_or(label_end, |c| label_end + c.len_utf8());

        Self {
            label: &chunk[..label_end],
            separator: &chunk[label_end..separator_end],
            body: &chunk[separator_end..],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterChunk<'a> {
    pub head: LabelledChunk<'a>,
    pub verses: Vec<LabelledChunk<'a>>,
}

/// Chapter and verse positions of a book, computed in a single scan.
///
/// Chapter chunks are the text following each `\c ` marker and verse chunks
/// the text following each `\v ` marker within a chapter, mirroring how the
/// book would be split on the marker text. A chunk belongs to label `n` when
/// it starts with `n` and the next character is not a digit, so `1` never
/// matches `10`.
#[derive(Debug, Clone)]
pub struct BookIndex<'a> {
    document: &'a str,
    header: Range<usize>,
    chapters: Vec<ChapterSpan>,
}

impl<'a> BookIndex<'a> {
    pub fn new(document: &'a str) -> Self {
        let markers: Vec<usize> = document
            .match_indices(CHAPTER_MARKER)
            .map(|(index, _)| index)
            .collect();

        let header = 0..markers.first().copied().unwrap_or(document.len());
        let chapters = markers
            .iter()
            .enumerate()
            .map(|(i, &marker)| {
                let end = markers.get(i + 1).copied().unwrap_or(document.len());
                Self::index_chapter(document, marker + CHAPTER_MARKER.len()..end)
            })
            .collect();

        Self {
            document,
            header,
            chapters,
        }
    }

    fn index_chapter(document: &str, chunk: Range<usize>) -> ChapterSpan {
        let starts: Vec<usize> = document[chunk.clone()]
            .match_indices(VERSE_MARKER)
            .map(|(index, _)| chunk.start + index)
            .collect();

        let head = chunk.start..starts.first().copied().unwrap_or(chunk.end);
        let verses = starts
            .iter()
            .enumerate()
            .map(|(i, &start)| {
                let end = starts.get(i + 1).copied().unwrap_or(chunk.end);
                start + VERSE_MARKER.len()..end
            })
            .collect();

        ChapterSpan {
            chunk,
            head,
            verses,
        }
    }

    pub fn document(&self) -> &'a str { self.document }

    /// Everything before the first chapter marker (`\id`, `\h`, ...).
    pub fn header(&self) -> &'a str { &self.document[self.header.clone()] }

    pub fn chapter_count(&self) -> usize { self.chapters.len() }

    pub fn chapters(&self) -> Vec<ChapterChunk<'a>> {
        self.chapters
            .iter()
            .map(|chapter| ChapterChunk {
                head: LabelledChunk::split(&self.document[chapter.head.clone()]),
                verses: chapter
                    .verses
                    .iter()
                    .map(|verse| LabelledChunk::split(&self.document[verse.clone()]))
                    .collect(),
            })
            .collect()
    }

    fn find_chapter(&self, chapter: u32) -> Option<&ChapterSpan> {
        let label = chapter.to_string();
        self.chapters
            .iter()
            .find(|span| starts_with_label(&self.document[span.chunk.clone()], &label))
    }

    /// Locate the body of a verse, or the front matter of a chapter.
    pub fn locate(&self, chapter: u32, verse: VerseLabel) -> Result<BodySpan, MergeError> {
        let chapter_span = self
            .find_chapter(chapter)
            .ok_or(MergeError::ChapterNotFound { chapter })?;

        if verse == VerseLabel::Front {
            let head = &self.document[chapter_span.head.clone()];
            return Ok(match head.find('\n') {
                Some(newline) => BodySpan {
                    range: chapter_span.head.start + newline + 1..chapter_span.head.end,
                    separator: None,
                },
                None => BodySpan {
                    range: chapter_span.head.end..chapter_span.head.end,
                    separator: Some("\n"),
                },
            });
        }

        let label = verse.to_string();
        let verse_span = chapter_span
            .verses
            .iter()
            .find(|span| starts_with_label(&self.document[(*span).clone()], &label))
            .ok_or_else(|| MergeError::VerseNotFound {
                chapter,
                verse: label.clone(),
            })?;

        let after_label = verse_span.start + label.len();
        Ok(match self.document[after_label..verse_span.end].chars().next() {
            Some(c) => BodySpan {
                range: after_label + c.len_utf8()..verse_span.end,
                separator: None,
            },
            None => BodySpan {
                range: verse_span.end..verse_span.end,
                separator: Some(" "),
            },
        })
    }
}

fn starts_with_label(chunk: &str, label: &str) -> bool {
    chunk
        .strip_prefix(label)
        .is_some_and(|rest| !rest.starts_with(|c: char| c.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const BOOK: &str = "\\id TIT\n\\c 1\n\\p\n\\v 1 Paul, \\v 2 Titus\n\\c 10\n\\v 1 Ten\n";

    fn body<'a>(index: &BookIndex<'a>, chapter: u32, verse: VerseLabel) -> &'a str {
        let span = index.locate(chapter, verse).unwrap();
        &index.document()[span.range]
    }

    #[test]
    fn test_header_and_chapters() {
        let index = BookIndex::new(BOOK);

        assert_eq!(index.header(), "\\id TIT\n");
        assert_eq!(index.chapter_count(), 2);
        assert_eq!(
            index.chapters()[0],
            ChapterChunk {
                head: LabelledChunk {
                    label: "1",
                    separator: "\n",
                    body: "\\p\n",
                },
                verses: vec![
                    LabelledChunk {
                        label: "1",
                        separator: " ",
                        body: "Paul, ",
                    },
                    LabelledChunk {
                        label: "2",
                        separator: " ",
                        body: "Titus\n",
                    },
                ],
            }
        );
    }

    #[test]
    fn test_locate_verses() {
        let index = BookIndex::new(BOOK);

        assert_eq!(body(&index, 1, VerseLabel::Number(1)), "Paul, ");
        assert_eq!(body(&index, 1, VerseLabel::Number(2)), "Titus\n");
        assert_eq!(body(&index, 10, VerseLabel::Number(1)), "Ten\n");
        assert_eq!(body(&index, 1, VerseLabel::Front), "\\p\n");
    }

    #[test]
    fn test_chapter_label_does_not_match_longer_number() {
        let index = BookIndex::new("\\c 10\n\\v 1 Ten\n");

        assert_eq!(
            index.locate(1, VerseLabel::Number(1)),
            Err(MergeError::ChapterNotFound { chapter: 1 })
        );
    }

    #[test]
    fn test_missing_verse() {
        let index = BookIndex::new(BOOK);

        assert_eq!(
            index.locate(1, VerseLabel::Number(3)),
            Err(MergeError::VerseNotFound {
                chapter: 1,
                verse: "3".to_owned(),
            })
        );
    }

    #[test]
    fn test_verse_range_label() {
        let index = BookIndex::new("\\c 1\n\\v 1 a \\v 2-3 b c \\v 4 d");

        assert_eq!(body(&index, 1, VerseLabel::Range(2, 3)), "b c ");
    }

    #[test]
    fn test_missing_separators() {
        let index = BookIndex::new("\\c 1");
        let span = index.locate(1, VerseLabel::Front).unwrap();
        assert_eq!(span, BodySpan {
            range: 4..4,
            separator: Some("\n"),
        });

        let index = BookIndex::new("\\c 1\n\\v 1");
        let span = index.locate(1, VerseLabel::Number(1)).unwrap();
        assert_eq!(span, BodySpan {
            range: 9..9,
            separator: Some(" "),
        });
    }

    #[test]
    fn test_document_without_chapters() {
        let index = BookIndex::new("\\id TIT\n");

        assert_eq!(index.header(), "\\id TIT\n");
        assert_eq!(index.chapter_count(), 0);
    }
}
