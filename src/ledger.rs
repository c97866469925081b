use std::{collections::BTreeMap, fmt::Debug};

use log::debug;

use crate::types::verse_edit::VerseEdit;

/// An unsaved edit together with the callback that resets the pane which
/// produced it once the edit is persisted.
pub struct PendingChange {
    pub edit: VerseEdit,
    pub clear_changes: Box<dyn FnMut()>,
}

impl PendingChange {
    pub fn new(edit: VerseEdit, clear_changes: impl FnMut() + 'static) -> Self {
        Self {
            edit,
            clear_changes: Box::new(clear_changes),
        }
    }
}

impl Debug for PendingChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingChange")
            .field("edit", &self.edit)
            .finish_non_exhaustive()
    }
}

/// A snapshot of one pending change taken at the start of a save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainedChange {
    pub index: usize,
    pub generation: u64,
    pub edit: VerseEdit,
}

#[derive(Debug)]
struct Entry {
    generation: u64,
    change: PendingChange,
}

/// Unsaved changes of all verse panes, keyed by pane index.
///
/// Every write bumps a generation counter, so a save that finishes after the
/// pane was edited again only clears the entries it actually persisted.
#[derive(Default)]
pub struct UnsavedChangeLedger {
    entries: BTreeMap<usize, Entry>,
    next_generation: u64,
    on_unsaved_changed: Option<Box<dyn FnMut(bool)>>,
}

impl Debug for UnsavedChangeLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnsavedChangeLedger")
            .field("entries", &self.entries)
            .field("next_generation", &self.next_generation)
            .finish_non_exhaustive()
    }
}

impl UnsavedChangeLedger {
    pub fn new() -> Self { Self::default() }

    /// Called with the new value whenever `has_unsaved` flips.
    pub fn on_unsaved_changed(&mut self, callback: impl FnMut(bool) + 'static) {
        self.on_unsaved_changed = Some(Box::new(callback));
    }

    pub fn has_unsaved(&self) -> bool { !self.entries.is_empty() }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn record(&mut self, index: usize, change: PendingChange) {
        let had_unsaved = self.has_unsaved();

        self.next_generation += 1;
        debug!("Recording unsaved change of pane {index} ({})", change.edit.reference);
        self.entries.insert(index, Entry {
            generation: self.next_generation,
            change,
        });

        self.notify(had_unsaved);
    }

    pub fn clear(&mut self, index: usize) {
        let had_unsaved = self.has_unsaved();

        if self.entries.remove(&index).is_some() {
            debug!("Cleared unsaved change of pane {index}");
        }

        self.notify(had_unsaved);
    }

    /// Pane callback: a saved pane has nothing pending anymore, otherwise its
    /// latest change replaces whatever it reported before.
    pub fn report(&mut self, index: usize, saved: bool, change: Option<PendingChange>) {
        match (saved, change) {
            (false, Some(change)) => self.record(index, change),
            _ => self.clear(index),
        }
    }

    /// Snapshot of every pending change in ascending pane order. The ledger
    /// itself is left untouched until `complete` is called.
    pub fn drain(&self) -> Vec<DrainedChange> {
        self.entries
            .iter()
            .map(|(&index, entry)| DrainedChange {
                index,
                generation: entry.generation,
                edit: entry.change.edit.clone(),
            })
            .collect()
    }

    /// Mark drained changes as persisted. Entries recorded again after the
    /// drain are newer than what was saved and stay pending.
    pub fn complete(&mut self, drained: &[DrainedChange]) {
        let had_unsaved = self.has_unsaved();

        for change in drained {
            let is_current = self
                .entries
                .get(&change.index)
                .is_some_and(|entry| entry.generation == change.generation);

            if !is_current {
                debug!(
                    "Pane {} was edited during the save, keeping its change",
                    change.index
                );
                continue;
            }

            if let Some(mut entry) = self.entries.remove(&change.index) {
                (entry.change.clear_changes)();
            }
        }

        self.notify(had_unsaved);
    }

    fn notify(&mut self, had_unsaved: bool) {
        let has_unsaved = self.has_unsaved();
        if had_unsaved == has_unsaved {
            return;
        }

        if let Some(callback) = self.on_unsaved_changed.as_mut() {
            callback(has_unsaved);
        }
    }
}
