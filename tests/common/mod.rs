#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    rc::Rc,
    time::Duration,
};

use anyhow::{Result, anyhow};
use usfm_save::{
    BookFetcher, BranchManager, BranchStatus, FetchedBook, PendingChange, RemoteFileEditor,
    ResourceDescriptor, ResourceError, ResourceHost, SaveConfig, SaveOrchestrator, SaveTarget,
    VerseEdit, VerseLabel, VerseObject, VerseReference,
};

pub const TITUS: &str = "\\id TIT\n\\c 1\n\\p\n\\v 1 Paul, a servant of God,\n\\v 2 in hope of \
                         eternal life\n\\v 3 at the right time\n\\c 2\n\\v 1 But you, speak\n";

pub const PROJECT_ID: &str = "en_ult";

pub const UPLOAD_LATENCY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upload {
    Patch { patch: String, sha: String },
    Full { content: String, sha: String },
}

/// In-memory stand-in for the branch manager, the file editor, the book
/// fetcher and the host.
#[derive(Debug)]
pub struct MockServices {
    pub status: RefCell<BranchStatus>,
    pub created_branch: RefCell<Option<Result<Option<String>>>>,
    pub books: RefCell<VecDeque<FetchedBook>>,
    pub upload_results: RefCell<VecDeque<Result<bool>>>,
    pub uploads: RefCell<Vec<Upload>>,
    pub fetches: Cell<usize>,
    pub errors: RefCell<Vec<ResourceError>>,
    pub reloads: Cell<usize>,
    pub finished_edits: Cell<usize>,
}

impl MockServices {
    pub fn new(books: Vec<FetchedBook>, upload_results: Vec<Result<bool>>) -> Self {
        Self {
            status: RefCell::new(BranchStatus {
                branch_determined: true,
                using_user_branch: true,
                working_resource_branch: Some("user-tit".to_owned()),
            }),
            created_branch: RefCell::new(None),
            books: RefCell::new(books.into()),
            upload_results: RefCell::new(upload_results.into()),
            uploads: RefCell::new(vec![]),
            fetches: Cell::new(0),
            errors: RefCell::new(vec![]),
            reloads: Cell::new(0),
            finished_edits: Cell::new(0),
        }
    }
}

impl BranchManager for MockServices {
    fn status(&self) -> BranchStatus { self.status.borrow().clone() }

    async fn start_edit_branch(&self) -> Result<Option<String>> {
        self.created_branch
            .borrow_mut()
            .take()
            .unwrap_or_else(|| Err(anyhow!("no branch configured")))
    }

    async fn finish_edit(&self) { self.finished_edits.set(self.finished_edits.get() + 1); }
}

impl RemoteFileEditor for MockServices {
    async fn save_edit(&self, _branch: &str, content: &str, sha: &str) -> Result<bool> {
        self.uploads.borrow_mut().push(Upload::Full {
            content: content.to_owned(),
            sha: sha.to_owned(),
        });
        tokio::time::sleep(UPLOAD_LATENCY).await;
        self.upload_results.borrow_mut().pop_front().unwrap_or(Ok(true))
    }

    async fn save_edit_patch(&self, _branch: &str, patch: &str, sha: &str) -> Result<bool> {
        self.uploads.borrow_mut().push(Upload::Patch {
            patch: patch.to_owned(),
            sha: sha.to_owned(),
        });
        tokio::time::sleep(UPLOAD_LATENCY).await;
        self.upload_results.borrow_mut().pop_front().unwrap_or(Ok(true))
    }
}

impl BookFetcher for MockServices {
    /// Returns the queued books in order, repeating the last one.
    async fn fetch_bible_book(
        &self,
        _resource: &ResourceDescriptor,
        _book_id: &str,
        _branch: &str,
    ) -> Result<FetchedBook> {
        tokio::task::yield_now().await;
        self.fetches.set(self.fetches.get() + 1);

        let mut books = self.books.borrow_mut();
        let book = if books.len() > 1 {
            books.pop_front()
        } else {
            books.front().cloned()
        };
        book.ok_or_else(|| anyhow!("404 Not Found"))
    }
}

impl ResourceHost for MockServices {
    fn on_resource_error(&self, error: &ResourceError) { self.errors.borrow_mut().push(error.clone()); }

    fn reload_resource(&self) { self.reloads.set(self.reloads.get() + 1); }
}

pub fn book(usfm: &str, sha: &str) -> FetchedBook {
    FetchedBook {
        bible_usfm: Some(usfm.to_owned()),
        sha: Some(sha.to_owned()),
        book_id: "tit".to_owned(),
        project_id: PROJECT_ID.to_owned(),
        error: None,
    }
}

pub fn orchestrator(services: MockServices) -> SaveOrchestrator<MockServices> {
    SaveOrchestrator::new(
        services,
        SaveTarget {
            resource: ResourceDescriptor {
                owner: "unfoldingWord".to_owned(),
                language_id: "en".to_owned(),
                resource_id: "ult".to_owned(),
                project_id: PROJECT_ID.to_owned(),
                reference: None,
            },
            book_id: "TIT".to_owned(),
            file_name: "57-TIT.usfm".to_owned(),
        },
        SaveConfig::default(),
    )
}

pub fn reference(chapter: u32, verse: u32) -> VerseReference {
    VerseReference::new("tit", chapter, VerseLabel::Number(verse))
}

/// An edit replacing the whole verse with plain text.
pub fn verse_edit(chapter: u32, verse: u32, text: &str) -> VerseEdit {
    VerseEdit::alignment(reference(chapter, verse), vec![VerseObject::text(text)])
}

/// A pending change that counts how often its pane was reset.
pub fn change(edit: VerseEdit, cleared: &Rc<Cell<usize>>) -> PendingChange {
    let cleared = Rc::clone(cleared);
    PendingChange::new(edit, move || cleared.set(cleared.get() + 1))
}
