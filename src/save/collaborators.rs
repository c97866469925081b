use anyhow::Result;
use serde::{Deserialize, Serialize};

/// The resource (a translation of the Bible in one language) being edited.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    pub owner: String,
    pub language_id: String,
    pub resource_id: String,
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BranchStatus {
    /// Whether the branch manager has finished looking up the user branch.
    pub branch_determined: bool,
    pub using_user_branch: bool,
    pub working_resource_branch: Option<String>,
}

/// A book as returned by the book fetcher. A book without a `sha` exists
/// but is not yet available for writing on the requested branch.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FetchedBook {
    #[serde(default)]
    pub bible_usfm: Option<String>,
    #[serde(default)]
    pub sha: Option<String>,
    pub book_id: String,
    pub project_id: String,
    #[serde(default)]
    pub error: Option<String>,
}

/// What the host is told when a save fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceError {
    pub message: String,
    pub is_access_error: bool,
    pub status_detail: Option<String>,
}

#[allow(async_fn_in_trait)]
pub trait BranchManager {
    fn status(&self) -> BranchStatus;

    /// Create (or look up) the user's edit branch, `None` if none could be made.
    async fn start_edit_branch(&self) -> Result<Option<String>>;

    async fn finish_edit(&self);
}

#[allow(async_fn_in_trait)]
pub trait RemoteFileEditor {
    /// Replace the whole file. `Ok(false)` means the server rejected the write.
    async fn save_edit(&self, branch: &str, content: &str, sha: &str) -> Result<bool>;

    /// Apply a unified diff to the file. `Ok(false)` means it did not apply.
    async fn save_edit_patch(&self, branch: &str, patch: &str, sha: &str) -> Result<bool>;
}

#[allow(async_fn_in_trait)]
pub trait BookFetcher {
    async fn fetch_bible_book(
        &self,
        resource: &ResourceDescriptor,
        book_id: &str,
        branch: &str,
    ) -> Result<FetchedBook>;
}

pub trait ResourceHost {
    fn on_resource_error(&self, error: &ResourceError);

    fn reload_resource(&self);
}

/// Everything a save needs from the outside world.
pub trait SaveServices: BranchManager + RemoteFileEditor + BookFetcher + ResourceHost {}

impl<T> SaveServices for T where T: BranchManager + RemoteFileEditor + BookFetcher + ResourceHost {}
