use log::debug;

use super::book_index::BookIndex;
use crate::{errors::MergeError, types::verse_reference::VerseReference};

/// Replace the body of one verse in `base` with `new_verse_usfm`, keeping the
/// verse marker and its label. For `front` the chapter's front matter (the text
/// between the chapter label line and the first verse) is replaced.
///
/// ```
/// use usfm_save::{VerseLabel, VerseReference, merge_verse};
///
/// let base = "\\id TIT\n\\c 1\n\\v 1 Paul, \\v 2 Titus";
/// let reference = VerseReference::new("tit", 1, VerseLabel::Number(1));
///
/// let merged = merge_verse(base, &reference, "Paul, servant").unwrap();
/// assert_eq!(merged, "\\id TIT\n\\c 1\n\\v 1 Paul, servant\\v 2 Titus");
/// ```
pub fn merge_verse(
    base: &str,
    reference: &VerseReference,
    new_verse_usfm: &str,
) -> Result<String, MergeError> {
    let index = BookIndex::new(base);
    let span = index.locate(reference.chapter, reference.verse)?;

    let separator = span.separator.unwrap_or_default();
    let mut merged = String::with_capacity(
        base.len() - span.range.len() + separator.len() + new_verse_usfm.len(),
    );
    merged.push_str(&base[..span.range.start]);
    merged.push_str(separator);
    merged.push_str(new_verse_usfm);
    merged.push_str(&base[span.range.end..]);

    Ok(merged)
}

/// Merge several verses one after the other into the accumulating document.
/// The first verse that cannot be located fails the whole batch; no partially
/// merged document is ever returned.
pub fn merge_verses<'a, I>(base: &str, verses: I) -> Result<String, MergeError>
where
    I: IntoIterator<Item = (&'a VerseReference, &'a str)>,
{
    verses
        .into_iter()
        .try_fold(base.to_owned(), |document, (reference, usfm)| {
            debug!("Merging {reference} into book");
            merge_verse(&document, reference, usfm)
        })
}

/// The current body of a verse, or the front matter of a chapter.
pub fn extract_verse<'a>(document: &'a str, reference: &VerseReference) -> Option<&'a str> {
    let index = BookIndex::new(document);
    index
        .locate(reference.chapter, reference.verse)
        .ok()
        .map(|span| &document[span.range])
}
