pub mod book_index;
pub mod codec;
pub mod verse_merger;

pub use book_index::BookIndex;
pub use codec::{BasicUsfmCodec, BookObjects, ChapterContent, UsfmCodec, VerseContent};
pub use verse_merger::{extract_verse, merge_verse, merge_verses};
