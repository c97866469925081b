use std::{
    cell::{Cell, RefCell},
    error::Error as _,
    fmt::Debug,
};

use anyhow::anyhow;
use log::{debug, error, info, warn};
use tokio::time::sleep;

use super::{
    collaborators::{ResourceDescriptor, ResourceError, SaveServices},
    context_lines::ContextLines,
    state::{SaveEvent, SaveStage},
};
use crate::{
    alignment::{AlignmentEngine, AlignmentReconciler, MilestoneAlignmentEngine},
    config::SaveConfig,
    errors::SaveError,
    ledger::{DrainedChange, PendingChange, UnsavedChangeLedger},
    patch_builder::build_patch,
    types::{verse_edit::VerseEdit, verse_object::VerseObject, verse_reference::VerseReference},
    usfm::{BasicUsfmCodec, UsfmCodec, merge_verses},
    utils::normalize::normalize_string,
};

/// The book a save writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveTarget {
    pub resource: ResourceDescriptor,
    pub book_id: String,
    /// Name of the book's file in the repository, used in patch headers.
    pub file_name: String,
}

#[derive(Debug)]
pub enum SaveOutcome {
    Saved,
    /// Nothing differed from the server copy, nothing was uploaded.
    NoChanges,
    /// The book is not available on the edit branch yet; the save resumes on
    /// `on_ready`.
    Waiting,
    /// Another save was in flight.
    Dropped,
    Failed(SaveError),
}

/// Documents and upload parameters of one save cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveState {
    pub initial_document: String,
    pub edited_document: String,
    pub context_lines: usize,
    pub use_diff_patch: bool,
    pub branch_name: String,
    pub file_sha: String,
}

/// A verse ready to be written into the book.
#[derive(Debug, Clone)]
struct RenderedVerse {
    reference: VerseReference,
    usfm: String,
    objects: Vec<VerseObject>,
}

struct CurrentBook {
    usfm: String,
    sha: Option<String>,
}

/// Clears the in-flight flag when a save returns, however it returns.
struct InFlightGuard<'a>(&'a Cell<bool>);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) { self.0.set(false); }
}

/// Saves the unsaved verse edits of one book.
///
/// A save merges every pending edit into the latest server copy of the book
/// and uploads the result as a patch, or as a whole file when the edits could
/// only be applied by rebuilding the book. A rejected upload is retried once
/// against a fresh server copy with a wider patch context. Pending changes
/// are only cleared once the server holds them.
///
/// The orchestrator is meant for a single-threaded host: saves are driven by
/// `on_save_edit`, and a request arriving while another save is running is
/// dropped.
pub struct SaveOrchestrator<S, C = BasicUsfmCodec, A = MilestoneAlignmentEngine> {
    services: S,
    codec: C,
    reconciler: AlignmentReconciler<A>,
    config: SaveConfig,
    target: SaveTarget,
    ledger: RefCell<UnsavedChangeLedger>,
    in_flight: Cell<bool>,
    awaiting_ready: Cell<bool>,
    context_lines: Cell<ContextLines>,
    saved: Cell<bool>,
    stage: Cell<SaveStage>,
}

impl<S, C, A> Debug for SaveOrchestrator<S, C, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaveOrchestrator")
            .field("target", &self.target)
            .field("config", &self.config)
            .field("ledger", &self.ledger)
            .field("in_flight", &self.in_flight)
            .field("context_lines", &self.context_lines)
            .field("saved", &self.saved)
            .field("stage", &self.stage)
            .finish_non_exhaustive()
    }
}

impl<S, C, A> SaveOrchestrator<S, C, A>
where
    S: SaveServices,
    C: UsfmCodec,
    A: AlignmentEngine,
{
    pub fn new(services: S, target: SaveTarget, config: SaveConfig) -> Self
    where
        C: Default,
        A: Default,
    {
        Self::with_parts(
            services,
            C::default(),
            AlignmentReconciler::default(),
            target,
            config,
        )
    }

    pub fn with_parts(
        services: S,
        codec: C,
        reconciler: AlignmentReconciler<A>,
        target: SaveTarget,
        config: SaveConfig,
    ) -> Self {
        Self {
            services,
            codec,
            reconciler,
            context_lines: Cell::new(ContextLines::from_config(&config)),
            config,
            target,
            ledger: RefCell::new(UnsavedChangeLedger::new()),
            in_flight: Cell::new(false),
            awaiting_ready: Cell::new(false),
            saved: Cell::new(false),
            stage: Cell::new(SaveStage::Idle),
        }
    }

    pub fn services(&self) -> &S { &self.services }

    pub fn target(&self) -> &SaveTarget { &self.target }

    /// Whether the last save persisted everything it set out to.
    pub fn saved(&self) -> bool { self.saved.get() }

    pub fn stage(&self) -> SaveStage { self.stage.get() }

    pub fn context_lines(&self) -> ContextLines { self.context_lines.get() }

    pub fn is_in_flight(&self) -> bool { self.in_flight.get() }

    pub fn has_unsaved_changes(&self) -> bool { self.ledger.borrow().has_unsaved() }

    pub fn pending_edits(&self) -> Vec<VerseEdit> {
        self.ledger
            .borrow()
            .drain()
            .into_iter()
            .map(|change| change.edit)
            .collect()
    }

    pub fn on_unsaved_changed(&self, callback: impl FnMut(bool) + 'static) {
        self.ledger.borrow_mut().on_unsaved_changed(callback);
    }

    pub fn record_change(&self, index: usize, change: PendingChange) {
        self.ledger.borrow_mut().record(index, change);
        self.saved.set(false);
    }

    pub fn report_change(&self, index: usize, saved: bool, change: Option<PendingChange>) {
        self.ledger.borrow_mut().report(index, saved, change);
        if !saved {
            self.saved.set(false);
        }
    }

    /// Save every pending change of the book.
    pub async fn on_save_edit(&self) -> SaveOutcome {
        let Some(guard) = InFlightGuard::acquire(&self.in_flight) else {
            warn!(
                "A save of {} is already in progress, dropping this request",
                self.target.book_id
            );
            return SaveOutcome::Dropped;
        };

        self.transition(SaveEvent::SaveRequested);
        let outcome = match self.save().await {
            Ok(outcome) => outcome,
            Err(error) => {
                self.fail(&error);
                SaveOutcome::Failed(error)
            }
        };
        drop(guard);

        if matches!(outcome, SaveOutcome::Saved) {
            sleep(self.config.reload_delay()).await;
            debug!("Reloading {}", self.target.resource.resource_id);
            self.services.reload_resource();
        }

        outcome
    }

    /// Resume a save that was waiting for the book to become available on
    /// the edit branch. Returns `None` when no save was waiting.
    pub async fn on_ready(&self) -> Option<SaveOutcome> {
        if !self.awaiting_ready.get() {
            return None;
        }

        debug!("Edit branch is ready, resuming save of {}", self.target.book_id);
        Some(self.on_save_edit().await)
    }

    async fn save(&self) -> Result<SaveOutcome, SaveError> {
        self.awaiting_ready.set(false);

        let Some(branch) = self.ensure_branch().await? else {
            info!("Edit branch is not determined yet, waiting");
            self.awaiting_ready.set(true);
            return Ok(SaveOutcome::Waiting);
        };

        let book = self.get_current_book(&branch).await?;
        let Some(sha) = book.sha else {
            info!(
                "{} is not available on branch {branch} yet, waiting",
                self.target.book_id
            );
            self.awaiting_ready.set(true);
            return Ok(SaveOutcome::Waiting);
        };
        self.transition(SaveEvent::BranchReady);
        self.transition(SaveEvent::BookFetched);

        let drained = self.ledger.borrow().drain();
        let verses = self.render_verses(&drained);
        let (edited_document, merged_textually) = self.merge(&book.usfm, &verses)?;

        let mut state = SaveState {
            initial_document: book.usfm,
            edited_document,
            context_lines: self.context_lines.get().current(),
            use_diff_patch: self.config.use_diff_patch && merged_textually,
            branch_name: branch,
            file_sha: sha,
        };

        if state.edited_document == state.initial_document {
            info!("{} has no changes to save", self.target.book_id);
            self.ledger.borrow_mut().complete(&drained);
            self.saved.set(true);
            self.transition(SaveEvent::NoChanges);
            return Ok(SaveOutcome::NoChanges);
        }

        self.transition(SaveEvent::Merged);
        if self.upload(&state).await? {
            self.transition(SaveEvent::UploadSucceeded);
            return Ok(self.succeed(&drained).await);
        }

        self.transition(SaveEvent::UploadRejected);
        warn!(
            "Upload of {} was rejected, retrying in {:?}",
            self.target.file_name,
            self.config.retry_delay()
        );
        sleep(self.config.retry_delay()).await;

        let fresh = self.get_current_book(&state.branch_name).await?;
        let (edited_document, merged_textually) = self.merge(&fresh.usfm, &verses)?;
        if fresh.usfm == state.edited_document || fresh.usfm == edited_document {
            info!("Server copy of {} already holds the edits", self.target.book_id);
            self.transition(SaveEvent::ServerMatches);
            return Ok(self.succeed(&drained).await);
        }
        let fresh_sha = fresh.sha.ok_or_else(|| SaveError::FetchFailed {
            book_id: self.target.book_id.clone(),
            reason: "the book has no sha after a rejected upload".to_owned(),
        })?;

        let context_lines = self.context_lines.get().advance();
        self.context_lines.set(context_lines);

        // Edits are merged again so that concurrent changes to other verses survive
        state = SaveState {
            initial_document: fresh.usfm,
            edited_document,
            context_lines: context_lines.current(),
            use_diff_patch: self.config.use_diff_patch && merged_textually,
            file_sha: fresh_sha,
            ..state
        };
        self.transition(SaveEvent::ServerDiffers);

        if self.upload(&state).await? {
            self.transition(SaveEvent::UploadSucceeded);
            return Ok(self.succeed(&drained).await);
        }

        self.transition(SaveEvent::UploadRejected);
        Err(SaveError::UploadFailed {
            book_id: self.target.book_id.clone(),
            attempts: 2,
        })
    }

    /// The edit branch to write to, creating it if the user has none yet.
    /// `None` while the branch manager is still looking it up.
    async fn ensure_branch(&self) -> Result<Option<String>, SaveError> {
        let status = self.services.status();
        if !status.branch_determined {
            return Ok(None);
        }

        if let (true, Some(branch)) = (status.using_user_branch, status.working_resource_branch) {
            return Ok(Some(branch));
        }

        info!(
            "Creating an edit branch for {}",
            self.target.resource.resource_id
        );
        match self.services.start_edit_branch().await {
            Ok(Some(branch)) => Ok(Some(branch)),
            Ok(None) => Err(SaveError::BranchCreationFailed(anyhow!(
                "no branch was created"
            ))),
            Err(error) => Err(SaveError::BranchCreationFailed(error)),
        }
    }

    /// Fetch the book from the edit branch. Fails unless the fetched book is
    /// the one that is being edited.
    async fn get_current_book(&self, branch: &str) -> Result<CurrentBook, SaveError> {
        let resource = &self.target.resource;
        let book_id = &self.target.book_id;
        let failed = |reason: String| SaveError::FetchFailed {
            book_id: book_id.clone(),
            reason,
        };

        let book = self
            .services
            .fetch_bible_book(resource, book_id, branch)
            .await
            .map_err(|error| failed(format!("{error:#}")))?;

        if let Some(reason) = book.error {
            return Err(failed(reason));
        }

        if normalize_string(&book.book_id) != normalize_string(book_id)
            || normalize_string(&book.project_id) != normalize_string(&resource.project_id)
        {
            error!(
                "Fetched {} of {} while saving {book_id} of {}",
                book.book_id, book.project_id, resource.project_id
            );
            return Err(failed(format!(
                "fetched {} of project {} instead",
                book.book_id, book.project_id
            )));
        }

        let usfm = book
            .bible_usfm
            .ok_or_else(|| failed("the book has no content".to_owned()))?;

        Ok(CurrentBook {
            usfm,
            sha: book.sha,
        })
    }

    fn render_verses(&self, drained: &[DrainedChange]) -> Vec<RenderedVerse> {
        drained
            .iter()
            .map(|change| {
                let edit = &change.edit;
                let objects = match &edit.new_verse_text {
                    Some(new_text) if edit.needs_text_reconciliation() => {
                        let reconciled = self.reconciler.reconcile_on_text_change(
                            &edit.verse_objects,
                            new_text,
                            edit.source_words.as_deref(),
                        );
                        if !reconciled.alignment_complete {
                            debug!("{} is saved with an incomplete alignment", edit.reference);
                        }
                        reconciled.verse_objects
                    }
                    _ => edit.verse_objects.clone(),
                };

                RenderedVerse {
                    reference: edit.reference.clone(),
                    usfm: self.codec.verse_to_usfm(&objects),
                    objects,
                }
            })
            .collect()
    }

    /// Merge the verses into `base` textually, or rebuild the book from verse
    /// objects if any verse cannot be located. The flag tells whether the
    /// textual merge succeeded.
    fn merge(&self, base: &str, verses: &[RenderedVerse]) -> Result<(String, bool), SaveError> {
        let merged = merge_verses(
            base,
            verses
                .iter()
                .map(|verse| (&verse.reference, verse.usfm.as_str())),
        );

        match merged {
            Ok(document) => Ok((document, true)),
            Err(merge_error) => {
                warn!(
                    "{merge_error}, rebuilding {} from verse objects",
                    self.target.book_id
                );
                self.rebuild_book(base, verses)
                    .map(|document| (document, false))
                    .map_err(|source| SaveError::MergeFailed {
                        book_id: self.target.book_id.clone(),
                        source,
                    })
            }
        }
    }

    fn rebuild_book(&self, base: &str, verses: &[RenderedVerse]) -> anyhow::Result<String> {
        let mut book = self.codec.parse_book(base)?;
        for verse in verses {
            book.set_verse(&verse.reference, verse.objects.clone());
        }
        self.codec.book_to_usfm(&book)
    }

    async fn upload(&self, state: &SaveState) -> Result<bool, SaveError> {
        let file_name = &self.target.file_name;

        let uploaded = if state.use_diff_patch {
            let patch = build_patch(
                file_name,
                &state.initial_document,
                &state.edited_document,
                state.context_lines,
            );
            debug!(
                "Uploading patch of {file_name} with {} context lines",
                state.context_lines
            );
            self.services
                .save_edit_patch(&state.branch_name, &patch, &state.file_sha)
                .await
        } else {
            debug!("Uploading full content of {file_name}");
            self.services
                .save_edit(&state.branch_name, &state.edited_document, &state.file_sha)
                .await
        };

        match uploaded {
            Ok(true) => {
                info!("Uploaded {file_name} to {}", state.branch_name);
                Ok(true)
            }
            Ok(false) => Ok(false),
            Err(error) => Err(SaveError::Collaborator(
                error.context(format!("Failed to upload {file_name}")),
            )),
        }
    }

    async fn succeed(&self, drained: &[DrainedChange]) -> SaveOutcome {
        self.ledger.borrow_mut().complete(drained);
        self.saved.set(true);
        self.services.finish_edit().await;
        SaveOutcome::Saved
    }

    fn fail(&self, save_error: &SaveError) {
        if !self.stage.get().is_done() {
            self.transition(SaveEvent::Failed);
        }

        let resource = &self.target.resource;
        error!(
            "Saving {} of {} failed: {save_error}",
            self.target.book_id, resource.resource_id
        );

        self.services.on_resource_error(&ResourceError {
            message: format!(
                "Failed to save {} of {} ({}): {save_error}",
                self.target.book_id, resource.resource_id, resource.language_id
            ),
            is_access_error: save_error.is_access_error(),
            status_detail: save_error.source().map(ToString::to_string),
        });
    }

    fn transition(&self, event: SaveEvent) {
        let stage = self.stage.get();
        match stage.on(event) {
            Some(next) => {
                debug!("Save of {}: {stage:?} -> {next:?}", self.target.book_id);
                self.stage.set(next);
            }
            None => error!("Unexpected {event:?} while in {stage:?}"),
        }
    }
}
