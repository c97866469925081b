use super::{
    AlignmentPair, SourceWord, TargetWord, VerseAlignments,
    tokenize::{Token, tokenize},
};
use crate::types::verse_object::{Milestone, VerseObject, Word, words};

/// Milestone tag of word alignments.
pub const ALIGNMENT_TAG: &str = "zaln";

/// Moves word alignments between their in-verse representation and an
/// explicit list of pairs.
pub trait AlignmentEngine {
    fn extract_alignments(&self, verse_objects: &[VerseObject]) -> VerseAlignments;

    /// Rebuild the verse objects of `target_text`, wrapping aligned words in
    /// alignment milestones. The surface text of the result is `target_text`.
    fn inject_alignments(&self, target_text: &str, alignments: &VerseAlignments)
    -> Vec<VerseObject>;

    fn is_alignment_complete(&self, wordbank: &[TargetWord], pairs: &[AlignmentPair]) -> bool;
}

/// Reads and writes alignments as nested `\zaln-s` milestones: a pair with
/// several source words becomes one milestone per source word, each wrapping
/// the next, with the aligned words inside the innermost one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MilestoneAlignmentEngine;

fn source_word(milestone: &Milestone) -> SourceWord {
    SourceWord {
        text: milestone.content.clone(),
        strong: milestone.strong.clone(),
        lemma: milestone.lemma.clone(),
        morph: milestone.morph.clone(),
        occurrence: milestone.occurrence,
        occurrences: milestone.occurrences,
    }
}

fn target_word(word: &Word) -> TargetWord {
    TargetWord::new(word.text.clone(), word.occurrence, word.occurrences)
}

fn collect_pair(milestone: &Milestone, pair: &mut AlignmentPair) {
    pair.sources.push(source_word(milestone));

    for child in &milestone.children {
        match child {
            VerseObject::Milestone(inner) if inner.tag == ALIGNMENT_TAG => collect_pair(inner, pair),
            VerseObject::Word(word) => pair.targets.push(target_word(word)),
            VerseObject::Milestone(other) => pair
                .targets
                .extend(words(&other.children).into_iter().map(target_word)),
            VerseObject::Text { .. } | VerseObject::Paragraph { .. } => {}
        }
    }
}

fn wrap(sources: &[SourceWord], children: Vec<VerseObject>) -> Vec<VerseObject> {
    sources.iter().rev().fold(children, |children, source| {
        vec![VerseObject::Milestone(Milestone {
            tag: ALIGNMENT_TAG.to_owned(),
            content: source.text.clone(),
            strong: source.strong.clone(),
            lemma: source.lemma.clone(),
            morph: source.morph.clone(),
            occurrence: source.occurrence,
            occurrences: source.occurrences,
            children,
            next_char: None,
        })]
    })
}

impl AlignmentEngine for MilestoneAlignmentEngine {
    fn extract_alignments(&self, verse_objects: &[VerseObject]) -> VerseAlignments {
        let mut alignments = VerseAlignments::default();

        for object in verse_objects {
            match object {
                VerseObject::Milestone(milestone) if milestone.tag == ALIGNMENT_TAG => {
                    let mut pair = AlignmentPair::default();
                    collect_pair(milestone, &mut pair);

                    // A phrase split by unaligned words appears as several milestones
                    match alignments.pairs.iter_mut().find(|p| p.sources == pair.sources) {
                        Some(existing) => existing.targets.extend(pair.targets),
                        None => alignments.pairs.push(pair),
                    }
                }
                VerseObject::Word(word) => alignments.wordbank.push(target_word(word)),
                VerseObject::Milestone(other) => alignments
                    .wordbank
                    .extend(words(&other.children).into_iter().map(target_word)),
                VerseObject::Text { .. } | VerseObject::Paragraph { .. } => {}
            }
        }

        alignments
    }

    fn inject_alignments(
        &self,
        target_text: &str,
        alignments: &VerseAlignments,
    ) -> Vec<VerseObject> {
        let mut result = Vec::new();
        let mut group: Option<(usize, Vec<VerseObject>)> = None;
        let mut gap: Option<&str> = None;

        for token in tokenize(target_text) {
            let word = match token {
                Token::Other(text) => {
                    gap = Some(text);
                    continue;
                }
                Token::Word(word) => word,
            };

            let pair_index = alignments
                .pairs
                .iter()
                .position(|pair| pair.targets.iter().any(|target| target.is_same_token(&word)));
            let object = VerseObject::word(word.text, word.occurrence, word.occurrences);

            let joins_group = matches!(&group, Some((current, _)) if Some(*current) == pair_index);
            if joins_group {
                if let Some((_, children)) = group.as_mut() {
                    children.extend(gap.take().map(VerseObject::text));
                    children.push(object);
                }
                continue;
            }

            if let Some((index, children)) = group.take() {
                result.extend(wrap(&alignments.pairs[index].sources, children));
            }
            result.extend(gap.take().map(VerseObject::text));

            match pair_index {
                Some(index) => group = Some((index, vec![object])),
                None => result.push(object),
            }
        }

        if let Some((index, children)) = group {
            result.extend(wrap(&alignments.pairs[index].sources, children));
        }
        result.extend(gap.map(VerseObject::text));

        result
    }

    fn is_alignment_complete(&self, wordbank: &[TargetWord], pairs: &[AlignmentPair]) -> bool {
        wordbank.is_empty()
            && pairs
                .iter()
                .all(|pair| !pair.sources.is_empty() && !pair.targets.is_empty())
    }
}
