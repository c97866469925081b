use std::{collections::HashMap, ops::Range};

use super::TargetWord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Word(TargetWord),
    /// Whitespace, punctuation and USFM markers between words.
    Other(&'a str),
}

fn is_word_char(c: char) -> bool { c.is_alphanumeric() || c == '\'' || c == '’' }

/// Split verse text into words and the text between them, numbering the
/// occurrences of every word. USFM markers such as `\q1` or `\qt*` never
/// count as words.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut spans: Vec<(bool, Range<usize>)> = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        let mut end = start;
        let is_word = is_word_char(c);

        if c == '\\' {
            chars.next();
            end += c.len_utf8();
            while let Some(&(i, c)) = chars.peek() {
                if !(c.is_alphanumeric() || c == '-') {
                    break;
                }
                chars.next();
                end = i + c.len_utf8();
            }
            if let Some(&(i, '*')) = chars.peek() {
                chars.next();
                end = i + 1;
            }
        } else {
            while let Some(&(i, c)) = chars.peek() {
                if is_word_char(c) != is_word || c == '\\' {
                    break;
                }
                chars.next();
                end = i + c.len_utf8();
            }
        }

        match spans.last_mut() {
            Some((false, previous)) if !is_word => previous.end = end,
            _ => spans.push((is_word, start..end)),
        }
    }
    let spans: Vec<(bool, &str)> = spans
        .into_iter()
        .map(|(is_word, range)| (is_word, &text[range]))
        .collect();

    let mut totals: HashMap<&str, u32> = HashMap::new();
    for &(is_word, word) in &spans {
        if is_word {
            *totals.entry(word).or_default() += 1;
        }
    }

    let mut seen: HashMap<&str, u32> = HashMap::new();
    spans
        .into_iter()
        .map(|(is_word, span)| {
            if !is_word {
                return Token::Other(span);
            }
            let occurrence = seen.entry(span).or_default();
            *occurrence += 1;
            Token::Word(TargetWord::new(span, *occurrence, totals[span]))
        })
        .collect()
}

/// The words of `text` with their occurrence numbers.
pub fn target_words(text: &str) -> Vec<TargetWord> {
    tokenize(text)
        .into_iter()
        .filter_map(|token| match token {
            Token::Word(word) => Some(word),
            Token::Other(_) => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("Paul, a servant"), vec![
            Token::Word(TargetWord::new("Paul", 1, 1)),
            Token::Other(", "),
            Token::Word(TargetWord::new("a", 1, 1)),
            Token::Other(" "),
            Token::Word(TargetWord::new("servant", 1, 1)),
        ]);
    }

    #[test]
    fn test_occurrences() {
        let words = target_words("God and God's people and God");

        assert_eq!(words, vec![
            TargetWord::new("God", 1, 2),
            TargetWord::new("and", 1, 2),
            TargetWord::new("God's", 1, 1),
            TargetWord::new("people", 1, 1),
            TargetWord::new("and", 2, 2),
            TargetWord::new("God", 2, 2),
        ]);
    }

    #[test]
    fn test_markers_are_not_words() {
        assert_eq!(tokenize("\\q1 Grace\\qt*\n"), vec![
            Token::Other("\\q1 "),
            Token::Word(TargetWord::new("Grace", 1, 1)),
            Token::Other("\\qt*\n"),
        ]);
    }

    #[test]
    fn test_empty() {
        assert_eq!(tokenize(""), vec![]);
    }
}
