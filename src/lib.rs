pub mod alignment;
pub mod config;
mod consts;
pub mod errors;
pub mod ledger;
mod patch_builder;
pub mod save;
pub mod types;
pub mod usfm;
mod utils;

pub use alignment::{
    AlignmentEngine, AlignmentPair, AlignmentReconciler, MilestoneAlignmentEngine,
    ReconciledVerse, SourceWord, TargetWord, VerseAlignments,
};
pub use config::SaveConfig;
pub use errors::{MergeError, ReferenceError, SaveError};
pub use ledger::{DrainedChange, PendingChange, UnsavedChangeLedger};
pub use patch_builder::build_patch;
pub use save::{
    BookFetcher, BranchManager, BranchStatus, Completion, ContextLines, FetchedBook,
    RemoteFileEditor, ResourceDescriptor, ResourceError, ResourceHost, SaveEvent,
    SaveOrchestrator, SaveOutcome, SaveServices, SaveStage, SaveState, SaveTarget,
};
pub use types::{
    number_or_string::NumberOrString,
    verse_edit::{EditKind, VerseEdit},
    verse_object::{Milestone, VerseObject, Word, verse_text},
    verse_reference::{VerseLabel, VerseReference},
};
pub use usfm::{
    BasicUsfmCodec, BookIndex, BookObjects, UsfmCodec, extract_verse, merge_verse, merge_verses,
};
