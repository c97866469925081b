use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use super::number_or_string::NumberOrString;
use crate::errors::ReferenceError;

/// Label following a `\v` marker, or the chapter front matter that precedes
/// verse 1.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(try_from = "NumberOrString", into = "NumberOrString")]
pub enum VerseLabel {
    Front,
    Number(u32),
    Range(u32, u32),
}

impl VerseLabel {
    /// The first verse number covered by the label, `0` for front matter.
    pub fn first_verse(self) -> u32 {
        match self {
            VerseLabel::Front => 0,
            VerseLabel::Number(verse) | VerseLabel::Range(verse, _) => verse,
        }
    }
}

impl Display for VerseLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerseLabel::Front => write!(f, "front"),
            VerseLabel::Number(verse) => write!(f, "{verse}"),
            VerseLabel::Range(start, end) => write!(f, "{start}-{end}"),
        }
    }
}

impl FromStr for VerseLabel {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("front") {
            return Ok(VerseLabel::Front);
        }

        let invalid = || ReferenceError::InvalidVerse(s.to_owned());
        match trimmed.split_once('-') {
            Some((start, end)) => {
                let start = start.trim().parse::<u32>().map_err(|_| invalid())?;
                let end = end.trim().parse::<u32>().map_err(|_| invalid())?;
                if end < start {
                    return Err(invalid());
                }
                Ok(VerseLabel::Range(start, end))
            }
            None => trimmed.parse::<u32>().map(VerseLabel::Number).map_err(|_| invalid()),
        }
    }
}

impl TryFrom<NumberOrString> for VerseLabel {
    type Error = ReferenceError;

    fn try_from(value: NumberOrString) -> Result<Self, Self::Error> {
        match value {
            NumberOrString::Number(number) => u32::try_from(number)
                .map(VerseLabel::Number)
                .map_err(|_| ReferenceError::InvalidVerse(number.to_string())),
            NumberOrString::Text(text) => text.parse(),
        }
    }
}

impl From<VerseLabel> for NumberOrString {
    fn from(value: VerseLabel) -> Self {
        match value {
            VerseLabel::Number(verse) => NumberOrString::Number(u64::from(verse)),
            label => NumberOrString::Text(label.to_string()),
        }
    }
}

impl From<u32> for VerseLabel {
    fn from(value: u32) -> Self { VerseLabel::Number(value) }
}

fn chapter_from(value: NumberOrString) -> Result<u32, ReferenceError> {
    let invalid = || ReferenceError::InvalidChapter(value.to_string());
    let chapter = match &value {
        NumberOrString::Number(number) => u32::try_from(*number).map_err(|_| invalid())?,
        NumberOrString::Text(text) => text.trim().parse::<u32>().map_err(|_| invalid())?,
    };

    if chapter == 0 {
        return Err(invalid());
    }
    Ok(chapter)
}

#[derive(Deserialize)]
struct RawVerseReference {
    book_id: String,
    chapter: NumberOrString,
    verse: VerseLabel,
}

/// Immutable location of a verse within a book.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(try_from = "RawVerseReference")]
pub struct VerseReference {
    pub book_id: String,
    pub chapter: u32,
    pub verse: VerseLabel,
}

impl VerseReference {
    pub fn new(book_id: impl Into<String>, chapter: u32, verse: VerseLabel) -> Self {
        Self {
            book_id: book_id.into(),
            chapter,
            verse,
        }
    }

    /// Parse chapter and verse from their textual forms, e.g. `("1", "3-5")`.
    pub fn parse(book_id: &str, chapter: &str, verse: &str) -> Result<Self, ReferenceError> {
        Ok(Self {
            book_id: book_id.to_owned(),
            chapter: chapter_from(chapter.into())?,
            verse: verse.parse()?,
        })
    }

    pub fn is_front(&self) -> bool { self.verse == VerseLabel::Front }
}

impl TryFrom<RawVerseReference> for VerseReference {
    type Error = ReferenceError;

    fn try_from(raw: RawVerseReference) -> Result<Self, Self::Error> {
        Ok(Self {
            book_id: raw.book_id,
            chapter: chapter_from(raw.chapter)?,
            verse: raw.verse,
        })
    }
}

impl Display for VerseReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}:{}", self.book_id.to_uppercase(), self.chapter, self.verse)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;

    #[test_case("front", VerseLabel::Front; "front matter")]
    #[test_case("FRONT", VerseLabel::Front; "front matter in capitals")]
    #[test_case("7", VerseLabel::Number(7); "single verse")]
    #[test_case("3-5", VerseLabel::Range(3, 5); "verse range")]
    #[test_case(" 12 ", VerseLabel::Number(12); "surrounding whitespace")]
    fn test_parse_verse_label(input: &str, expected: VerseLabel) {
        assert_eq!(input.parse::<VerseLabel>(), Ok(expected));
    }

    #[test_case(""; "empty")]
    #[test_case("a"; "not a number")]
    #[test_case("5-3"; "reversed range")]
    #[test_case("3-"; "open range")]
    fn test_reject_invalid_verse_label(input: &str) {
        assert_eq!(
            input.parse::<VerseLabel>(),
            Err(ReferenceError::InvalidVerse(input.to_owned()))
        );
    }

    #[test]
    fn test_deserialise_reference_from_numbers_and_strings() {
        let reference: VerseReference =
            serde_json::from_str(r#"{"book_id": "tit", "chapter": "1", "verse": 2}"#).unwrap();
        assert_eq!(reference, VerseReference::new("tit", 1, VerseLabel::Number(2)));

        let reference: VerseReference =
            serde_json::from_str(r#"{"book_id": "tit", "chapter": 3, "verse": "front"}"#)
                .unwrap();
        assert!(reference.is_front());

        let error = serde_json::from_str::<VerseReference>(
            r#"{"book_id": "tit", "chapter": 0, "verse": 1}"#,
        );
        assert!(error.is_err());
    }

    #[test]
    fn test_serialise_label_round_trip() {
        let labels = vec![VerseLabel::Front, VerseLabel::Number(4), VerseLabel::Range(3, 5)];
        let json = serde_json::to_string(&labels).unwrap();

        assert_eq!(json, r#"["front",4,"3-5"]"#);
        assert_eq!(serde_json::from_str::<Vec<VerseLabel>>(&json).unwrap(), labels);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            VerseReference::parse("tit", "1", "3-5").unwrap().to_string(),
            "TIT 1:3-5"
        );
    }
}
