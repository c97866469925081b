pub mod collaborators;
pub mod context_lines;
pub mod orchestrator;
pub mod state;

pub use collaborators::{
    BookFetcher, BranchManager, BranchStatus, FetchedBook, RemoteFileEditor, ResourceDescriptor,
    ResourceError, ResourceHost, SaveServices,
};
pub use context_lines::ContextLines;
pub use orchestrator::{SaveOrchestrator, SaveOutcome, SaveState, SaveTarget};
pub use state::{Completion, SaveEvent, SaveStage};
