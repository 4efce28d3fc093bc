//! Sentence Segmentation
//!
//! Splits text into sentences carrying both byte ranges (for slicing) and
//! character ranges (the offset unit used everywhere else).
//!
//! Boundaries are `.`, `!`, `?` and `…` followed by whitespace, with closing
//! quotes and brackets absorbed into the sentence. Abbreviations, initials and
//! a lowercase continuation suppress a boundary. Blank lines always end a
//! sentence and start a new paragraph.

const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "st", "mt", "jr", "sr", "prof", "rev", "gen", "capt", "lt", "col",
    "sgt", "etc", "vs", "no", "vol", "ch", "fig",
];

/// One sentence of the source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence<'a> {
    pub text: &'a str,
    pub byte_start: usize,
    pub byte_end: usize,
    pub char_start: usize,
    pub char_end: usize,
    /// Zero-based paragraph index
    pub paragraph: usize,
}

impl Sentence<'_> {
    pub fn char_len(&self) -> usize {
        self.char_end - self.char_start
    }
}

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '…')
}

fn is_closing(c: char) -> bool {
    matches!(c, '"' | '\'' | '”' | '’' | '»' | ')' | ']')
}

/// Split `text` into sentences in source order
pub fn split_sentences(text: &str) -> Vec<Sentence<'_>> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let n = chars.len();

    let mut sentences = Vec::new();
    let mut paragraph = 0;
    let mut paragraph_has_content = false;
    let mut start: Option<usize> = None;

    let mut i = 0;
    while i < n {
        let c = chars[i].1;

        if c.is_whitespace() {
            let mut k = i;
            let mut newlines = 0;
            while k < n && chars[k].1.is_whitespace() {
                if chars[k].1 == '\n' {
                    newlines += 1;
                }
                k += 1;
            }
            if newlines >= 2 {
                if let Some(s) = start.take() {
                    sentences.extend(make_sentence(text, &chars, s, i, paragraph));
                    paragraph_has_content = true;
                }
                if paragraph_has_content {
                    paragraph += 1;
                    paragraph_has_content = false;
                }
            }
            i = k;
            continue;
        }

        let s = *start.get_or_insert(i);

        if is_terminal(c) {
            let mut end = i + 1;
            while end < n && (is_terminal(chars[end].1) || is_closing(chars[end].1)) {
                end += 1;
            }
            let at_break = end >= n || chars[end].1.is_whitespace();
            if at_break
                && !(c == '.' && is_abbreviation(&chars, s, i))
                && !continues_lowercase(&chars, end)
            {
                sentences.extend(make_sentence(text, &chars, s, end, paragraph));
                paragraph_has_content = true;
                start = None;
            }
            i = end;
            continue;
        }

        i += 1;
    }

    if let Some(s) = start {
        sentences.extend(make_sentence(text, &chars, s, n, paragraph));
    }

    sentences
}

fn make_sentence<'a>(
    text: &'a str,
    chars: &[(usize, char)],
    start: usize,
    mut end: usize,
    paragraph: usize,
) -> Option<Sentence<'a>> {
    while end > start && chars[end - 1].1.is_whitespace() {
        end -= 1;
    }
    if end == start {
        return None;
    }
    let byte_at = |i: usize| chars.get(i).map(|(b, _)| *b).unwrap_or(text.len());
    Some(Sentence {
        text: &text[byte_at(start)..byte_at(end)],
        byte_start: byte_at(start),
        byte_end: byte_at(end),
        char_start: start,
        char_end: end,
        paragraph,
    })
}

/// Word ending right before the period at `dot` is an abbreviation or initial
fn is_abbreviation(chars: &[(usize, char)], sentence_start: usize, dot: usize) -> bool {
    let mut w = dot;
    while w > sentence_start && chars[w - 1].1.is_alphabetic() {
        w -= 1;
    }
    if w == dot {
        return false;
    }
    let word: String = chars[w..dot].iter().map(|(_, c)| c).collect();
    if word.chars().count() == 1 && word.chars().all(char::is_uppercase) {
        return true;
    }
    ABBREVIATIONS.contains(&word.to_lowercase().as_str())
}

/// Next non-space character after `from` is a lowercase letter
fn continues_lowercase(chars: &[(usize, char)], from: usize) -> bool {
    chars[from.min(chars.len())..]
        .iter()
        .map(|(_, c)| *c)
        .find(|c| !c.is_whitespace())
        .is_some_and(char::is_lowercase)
}

/// Number of paragraphs (blank-line separated blocks with content)
pub fn paragraph_count(sentences: &[Sentence<'_>]) -> usize {
    sentences.last().map(|s| s.paragraph + 1).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_split() {
        let sentences = split_sentences("The hall was dark. A lamp burned low! Was anyone there?");
        let texts: Vec<_> = sentences.iter().map(|s| s.text).collect();
        assert_eq!(
            texts,
            vec!["The hall was dark.", "A lamp burned low!", "Was anyone there?"]
        );
    }

    #[test]
    fn test_abbreviations_and_initials() {
        let sentences = split_sentences("Mr. Holt met J. Smith at the gate. They left.");
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].text, "Mr. Holt met J. Smith at the gate.");
    }

    #[test]
    fn test_closing_quote_absorbed() {
        let sentences = split_sentences("\"Stop!\" he said. The road ended.");
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].text, "\"Stop!\" he said.");
    }

    #[test]
    fn test_paragraphs() {
        let text = "Chapter I\n\nThe valley lay still. Mist rose.\n\n\nNight came.";
        let sentences = split_sentences(text);
        assert_eq!(sentences.len(), 4);
        assert_eq!(sentences[0].text, "Chapter I");
        assert_eq!(sentences[0].paragraph, 0);
        assert_eq!(sentences[1].paragraph, 1);
        assert_eq!(sentences[2].paragraph, 1);
        assert_eq!(sentences[3].paragraph, 2);
        assert_eq!(paragraph_count(&sentences), 3);
    }

    #[test]
    fn test_char_offsets_with_multibyte_text() {
        let text = "Café walls glowed. Thé was cold.";
        let sentences = split_sentences(text);
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[1].char_start, 19);
        assert_eq!(sentences[1].char_end, text.chars().count());
        assert_eq!(&text[sentences[1].byte_start..sentences[1].byte_end], "Thé was cold.");
    }

    #[test]
    fn test_unterminated_tail() {
        let sentences = split_sentences("One line. And a tail without stop");
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[1].text, "And a tail without stop");
    }

    #[test]
    fn test_empty_input() {
        assert!(split_sentences("   \n\n ").is_empty());
    }
}
