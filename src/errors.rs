use thiserror::Error;

/// A verse could not be located in a book by its chapter and verse markers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("Chapter {chapter} not found in book")]
    ChapterNotFound { chapter: u32 },

    #[error("Verse {chapter}:{verse} not found in book")]
    VerseNotFound { chapter: u32, verse: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("Invalid chapter `{0}`, expected a positive number")]
    InvalidChapter(String),

    #[error("Invalid verse `{0}`, expected a number, a range like `3-5` or `front`")]
    InvalidVerse(String),
}

/// Terminal failures of a save cycle. Every variant leaves the unsaved
/// changes in place.
#[derive(Error, Debug)]
pub enum SaveError {
    #[error("Failed to create an edit branch: {0}")]
    BranchCreationFailed(#[source] anyhow::Error),

    #[error("Failed to fetch {book_id}: {reason}")]
    FetchFailed { book_id: String, reason: String },

    #[error("Failed to merge edits into {book_id}: {source}")]
    MergeFailed {
        book_id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to upload {book_id} after {attempts} attempt(s)")]
    UploadFailed { book_id: String, attempts: usize },

    #[error("Collaborator error: {0:#}")]
    Collaborator(#[source] anyhow::Error),
}

fn mentions_access_denial(text: &str) -> bool {
    let text = text.to_lowercase();
    text.contains("401") || text.contains("403") || text.contains("access")
}

impl SaveError {
    /// Access errors are reported to the host separately so it can prompt
    /// for credentials instead of showing a generic failure.
    pub fn is_access_error(&self) -> bool {
        match self {
            SaveError::FetchFailed { reason, .. } => mentions_access_denial(reason),
            SaveError::BranchCreationFailed(error) | SaveError::Collaborator(error) => error
                .chain()
                .any(|cause| mentions_access_denial(&cause.to_string())),
            SaveError::MergeFailed { .. } | SaveError::UploadFailed { .. } => false,
        }
    }
}
