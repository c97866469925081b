/// How a save cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Completion {
    Success,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SaveStage {
    #[default]
    Idle,
    /// Waiting for an edit branch and for the book to be available on it.
    BranchPending,
    BranchReady,
    Merging,
    Uploading,
    RetryFetch,
    RetryUploading,
    Done(Completion),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaveEvent {
    SaveRequested,
    BranchReady,
    BookFetched,
    /// The merged book is identical to the one on the server.
    NoChanges,
    Merged,
    UploadSucceeded,
    UploadRejected,
    /// After a rejected upload the server copy already holds the edits.
    ServerMatches,
    ServerDiffers,
    /// A collaborator returned an error.
    Failed,
}

impl SaveStage {
    /// The stage following `event`, or `None` if the event cannot happen in
    /// this stage.
    pub fn on(self, event: SaveEvent) -> Option<SaveStage> {
        use SaveEvent as E;
        use SaveStage as S;

        let next = match (self, event) {
            (S::Idle | S::BranchPending | S::Done(_), E::SaveRequested) => S::BranchPending,
            (S::BranchPending, E::BranchReady) => S::BranchReady,
            (S::BranchReady, E::BookFetched) => S::Merging,
            (S::Merging, E::NoChanges) => S::Done(Completion::Success),
            (S::Merging, E::Merged) => S::Uploading,
            (S::Uploading | S::RetryUploading, E::UploadSucceeded) => {
                S::Done(Completion::Success)
            }
            (S::Uploading, E::UploadRejected) => S::RetryFetch,
            (S::RetryUploading, E::UploadRejected) => S::Done(Completion::Failure),
            (S::RetryFetch, E::ServerMatches) => S::Done(Completion::Success),
            (S::RetryFetch, E::ServerDiffers) => S::RetryUploading,
            (
                S::BranchPending
                | S::BranchReady
                | S::Merging
                | S::Uploading
                | S::RetryFetch
                | S::RetryUploading,
                E::Failed,
            ) => S::Done(Completion::Failure),
            _ => return None,
        };

        Some(next)
    }

    pub fn is_done(self) -> bool { matches!(self, SaveStage::Done(_)) }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;

    #[test]
    fn test_happy_path() {
        let stage = [
            SaveEvent::SaveRequested,
            SaveEvent::BranchReady,
            SaveEvent::BookFetched,
            SaveEvent::Merged,
            SaveEvent::UploadSucceeded,
        ]
        .into_iter()
        .try_fold(SaveStage::Idle, SaveStage::on);

        assert_eq!(stage, Some(SaveStage::Done(Completion::Success)));
    }

    #[test]
    fn test_single_retry() {
        let retrying = [
            SaveEvent::SaveRequested,
            SaveEvent::BranchReady,
            SaveEvent::BookFetched,
            SaveEvent::Merged,
            SaveEvent::UploadRejected,
            SaveEvent::ServerDiffers,
        ]
        .into_iter()
        .try_fold(SaveStage::Idle, SaveStage::on);

        assert_eq!(retrying, Some(SaveStage::RetryUploading));
        assert_eq!(
            SaveStage::RetryUploading.on(SaveEvent::UploadRejected),
            Some(SaveStage::Done(Completion::Failure))
        );
    }

    #[test_case(SaveStage::Idle, SaveEvent::Merged; "merge before save")]
    #[test_case(SaveStage::Idle, SaveEvent::Failed; "failure while idle")]
    #[test_case(SaveStage::BranchPending, SaveEvent::BookFetched; "book before branch")]
    #[test_case(SaveStage::Uploading, SaveEvent::ServerMatches; "server check without retry")]
    #[test_case(SaveStage::Merging, SaveEvent::SaveRequested; "re-entrant save")]
    #[test_case(SaveStage::Done(Completion::Failure), SaveEvent::Failed; "failing twice")]
    fn test_invalid_transitions(stage: SaveStage, event: SaveEvent) {
        assert_eq!(stage.on(event), None);
    }

    #[test_case(SaveStage::BranchPending)]
    #[test_case(SaveStage::BranchReady)]
    #[test_case(SaveStage::Merging)]
    #[test_case(SaveStage::Uploading)]
    #[test_case(SaveStage::RetryFetch)]
    #[test_case(SaveStage::RetryUploading)]
    fn test_failures_end_the_cycle(stage: SaveStage) {
        assert_eq!(
            stage.on(SaveEvent::Failed),
            Some(SaveStage::Done(Completion::Failure))
        );
    }

    #[test]
    fn test_new_cycle_after_done() {
        assert_eq!(
            SaveStage::Done(Completion::Success).on(SaveEvent::SaveRequested),
            Some(SaveStage::BranchPending)
        );
        assert!(SaveStage::Done(Completion::Failure).is_done());
        assert!(!SaveStage::RetryFetch.is_done());
    }
}
