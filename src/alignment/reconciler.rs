use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use super::{
    AlignmentPair, SourceWord, TargetWord, VerseAlignments,
    engine::{AlignmentEngine, MilestoneAlignmentEngine},
    tokenize::target_words,
};
use crate::types::verse_object::{VerseObject, verse_text};

/// The verse content to save after its text or its source words changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledVerse {
    pub verse_objects: Vec<VerseObject>,
    pub alignment_complete: bool,
    pub alignment_changed: bool,
}

/// Carries the word alignment of a verse over to a new version of its text
/// or of its original language words.
#[derive(Debug, Clone, Default)]
pub struct AlignmentReconciler<A = MilestoneAlignmentEngine> {
    engine: A,
}

fn closing_quote_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\\q[a-z0-9-]*\*$").unwrap())
}

/// The whitespace appended to `old_text`, if that is the only change and the
/// old text ends with a closing quote tag such as `\qt*`.
fn insignificant_suffix<'a>(old_text: &str, new_text: &'a str) -> Option<&'a str> {
    let suffix = new_text.strip_prefix(old_text)?;

    (!suffix.is_empty()
        && suffix.chars().all(char::is_whitespace)
        && closing_quote_regex().is_match(old_text))
    .then_some(suffix)
}

/// Keep every pair whose source word is still present, narrowed down to the
/// target words still present; release everything else to the wordbank.
fn realign(
    previous: &[AlignmentPair],
    source_words: &[SourceWord],
    targets: &[TargetWord],
) -> VerseAlignments {
    let mut pairs: Vec<AlignmentPair> = previous
        .iter()
        .filter_map(|pair| {
            let sources: Vec<SourceWord> = pair
                .sources
                .iter()
                .filter_map(|source| source_words.iter().find(|w| w.is_same_token(source)))
                .cloned()
                .collect();
            if sources.is_empty() {
                return None;
            }

            let targets = pair
                .targets
                .iter()
                .filter_map(|target| targets.iter().find(|w| w.is_same_token(target)))
                .cloned()
                .collect();
            Some(AlignmentPair { sources, targets })
        })
        .collect();

    for source in source_words {
        let is_aligned = pairs
            .iter()
            .any(|pair| pair.sources.iter().any(|s| s.is_same_token(source)));
        if !is_aligned {
            pairs.push(AlignmentPair {
                sources: vec![source.clone()],
                targets: vec![],
            });
        }
    }

    let wordbank = targets
        .iter()
        .filter(|word| {
            !pairs
                .iter()
                .any(|pair| pair.targets.iter().any(|t| t.is_same_token(word)))
        })
        .cloned()
        .collect();

    VerseAlignments { pairs, wordbank }
}

fn aligned_pairs(pairs: &[AlignmentPair]) -> Vec<&AlignmentPair> {
    pairs.iter().filter(|pair| !pair.targets.is_empty()).collect()
}

impl<A: AlignmentEngine> AlignmentReconciler<A> {
    pub fn new(engine: A) -> Self { Self { engine } }

    pub fn engine(&self) -> &A { &self.engine }

    /// Re-apply the alignment of `verse_objects` to `new_text`. Without the
    /// original language words the alignment cannot be migrated and the verse
    /// is returned unaligned.
    pub fn reconcile_on_text_change(
        &self,
        verse_objects: &[VerseObject],
        new_text: &str,
        source_words: Option<&[SourceWord]>,
    ) -> ReconciledVerse {
        let old_text = verse_text(verse_objects);
        if old_text == new_text {
            return self.unchanged(verse_objects.to_vec());
        }

        if let Some(whitespace) = insignificant_suffix(&old_text, new_text) {
            debug!("Only whitespace was added after a closing quote, keeping the alignment");
            let mut verse_objects = verse_objects.to_vec();
            verse_objects.push(VerseObject::text(whitespace));
            return self.unchanged(verse_objects);
        }

        let Some(source_words) = source_words else {
            debug!("No original language words available, the verse is saved unaligned");
            return ReconciledVerse {
                verse_objects: self
                    .engine
                    .inject_alignments(new_text, &VerseAlignments::default()),
                alignment_complete: false,
                alignment_changed: true,
            };
        };

        let previous = self.engine.extract_alignments(verse_objects);
        let alignments = realign(&previous.pairs, source_words, &target_words(new_text));
        self.finish(new_text, &previous, &alignments)
    }

    /// Drop the pairs of source words that disappeared from the original
    /// language text; the translation words they held become unaligned.
    pub fn reconcile_on_source_change(
        &self,
        verse_objects: &[VerseObject],
        source_words: &[SourceWord],
    ) -> ReconciledVerse {
        let text = verse_text(verse_objects);
        let previous = self.engine.extract_alignments(verse_objects);
        let alignments = realign(&previous.pairs, source_words, &target_words(&text));
        self.finish(&text, &previous, &alignments)
    }

    fn unchanged(&self, verse_objects: Vec<VerseObject>) -> ReconciledVerse {
        let alignments = self.engine.extract_alignments(&verse_objects);
        ReconciledVerse {
            alignment_complete: self
                .engine
                .is_alignment_complete(&alignments.wordbank, &alignments.pairs),
            verse_objects,
            alignment_changed: false,
        }
    }

    fn finish(
        &self,
        text: &str,
        previous: &VerseAlignments,
        alignments: &VerseAlignments,
    ) -> ReconciledVerse {
        let alignment_changed = aligned_pairs(&previous.pairs) != aligned_pairs(&alignments.pairs);
        if alignment_changed {
            debug!(
                "Alignment changed, {} word(s) left unaligned",
                alignments.wordbank.len()
            );
        }

        ReconciledVerse {
            verse_objects: self.engine.inject_alignments(text, alignments),
            alignment_complete: self
                .engine
                .is_alignment_complete(&alignments.wordbank, &alignments.pairs),
            alignment_changed,
        }
    }
}
