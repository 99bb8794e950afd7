//! The per-genre line rewrites.
//!
//! Every rule works word by word on single-space separated tokens. Empty tokens
//! (leading, trailing or repeated spaces) are dropped and the surviving words are
//! joined back with exactly one space, so a blank line stays blank.

/// Position (1-based, within a line) of the word that `reverse_every_seventh` flips.
pub const REVERSE_PERIOD: usize = 7;

/// Applies `rewrite` to every non-empty word of `line` and re-joins the results.
///
/// The closure receives the word's index among the non-empty words of the line.
pub fn map_words<F>(line: &str, mut rewrite: F) -> String
where
    F: FnMut(usize, &str) -> String,
{
    line.split(' ')
        .filter(|word| !word.is_empty())
        .enumerate()
        .map(|(idx, word)| rewrite(idx, word))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn is_consonant(c: char) -> bool {
    c.is_ascii_alphabetic() && !matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u')
}

/// Horror: every consonant is followed by its lowercase copy ("Dark" -> "Ddarrkk").
pub fn double_consonants(line: &str) -> String {
    map_words(line, |_, word| {
        let mut out = String::with_capacity(word.len() * 2);
        for c in word.chars() {
            out.push(c);
            if is_consonant(c) {
                out.push(c.to_ascii_lowercase());
            }
        }
        out
    })
}

/// Comedy: characters at odd positions of each word are upper-cased ("hello" -> "hElLo").
pub fn alternate_case(line: &str) -> String {
    map_words(line, |_, word| {
        let mut out = String::with_capacity(word.len());
        for (pos, c) in word.chars().enumerate() {
            if pos % 2 == 1 {
                out.extend(c.to_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    })
}

/// Fantasy: the first character of each word is upper-cased.
pub fn title_case(line: &str) -> String {
    map_words(line, |_, word| {
        let mut chars = word.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    })
}

/// Science fiction: every seventh word of the line is reversed.
///
/// The counter restarts on each line.
pub fn reverse_every_seventh(line: &str) -> String {
    let mut counter = 0;
    map_words(line, |_, word| {
        counter += 1;
        if counter == REVERSE_PERIOD {
            counter = 0;
            word.chars().rev().collect()
        } else {
            word.to_string()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consonant_classification() {
        assert!(is_consonant('D'));
        assert!(is_consonant('k'));
        assert!(!is_consonant('a'));
        assert!(!is_consonant('U'));
        assert!(!is_consonant('7'));
        assert!(!is_consonant(','));
        assert!(!is_consonant('é'));
    }

    #[test]
    fn test_map_words_indexes_only_real_words() {
        let indexed = map_words("  a  b c ", |idx, word| format!("{}{}", idx, word));
        assert_eq!(indexed, "0a 1b 2c");
    }
}
