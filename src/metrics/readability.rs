//! Readability proxy (Flesch reading ease).

use super::tokenize;
use crate::models::Readability;

/// Word, sentence and syllable based readability of `text`.
pub fn readability(text: &str) -> Readability {
    let words = tokenize(text);
    if words.is_empty() {
        return Readability::default();
    }

    let sentences = count_sentences(text).max(1);
    let syllables: usize = words.iter().map(|w| count_syllables(w)).sum();

    let words_per_sentence = words.len() as f64 / sentences as f64;
    let syllables_per_word = syllables as f64 / words.len() as f64;
    let flesch = 206.835 - 1.015 * words_per_sentence - 84.6 * syllables_per_word;

    Readability {
        words: words.len(),
        sentences,
        avg_words_per_sentence: round2(words_per_sentence),
        flesch_reading_ease: round2(flesch),
    }
}

/// Runs of `.`, `!` or `?` each end one sentence; trailing text counts too.
fn count_sentences(text: &str) -> usize {
    let mut count = 0;
    let mut in_terminator = false;
    let mut pending_words = false;

    for c in text.chars() {
        if matches!(c, '.' | '!' | '?') {
            if !in_terminator && pending_words {
                count += 1;
                pending_words = false;
            }
            in_terminator = true;
        } else {
            in_terminator = false;
            if c.is_alphanumeric() {
                pending_words = true;
            }
        }
    }

    if pending_words {
        count += 1;
    }
    count
}

/// Vowel-group heuristic with a silent trailing `e`.
fn count_syllables(word: &str) -> usize {
    let chars: Vec<char> = word.chars().filter(|c| c.is_alphabetic()).collect();
    if chars.is_empty() {
        return 0;
    }

    let is_vowel = |c: char| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
    let mut groups = 0;
    let mut prev_vowel = false;
    for &c in &chars {
        let vowel = is_vowel(c);
        if vowel && !prev_vowel {
            groups += 1;
        }
        prev_vowel = vowel;
    }

    if chars.len() > 2 && chars[chars.len() - 1] == 'e' && !is_vowel(chars[chars.len() - 2]) {
        groups -= 1;
    }

    groups.max(1)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_sentences() {
        assert_eq!(count_sentences("One. Two! Three?"), 3);
        assert_eq!(count_sentences("Wait... what?!"), 2);
        assert_eq!(count_sentences("No terminator"), 1);
        assert_eq!(count_sentences(""), 0);
    }

    #[test]
    fn test_count_syllables() {
        assert_eq!(count_syllables("team"), 1);
        assert_eq!(count_syllables("deadline"), 2);
        assert_eq!(count_syllables("confirm"), 2);
        assert_eq!(count_syllables("the"), 1);
        assert_eq!(count_syllables("42"), 0);
    }

    #[test]
    fn test_readability_scores() {
        let simple = readability("Hi team. The deadline moved to Friday. Please confirm.");
        assert_eq!(simple.words, 9);
        assert_eq!(simple.sentences, 3);
        assert_eq!(simple.avg_words_per_sentence, 3.0);
        assert!(simple.flesch_reading_ease > 60.0);

        let dense = readability(
            "Notwithstanding organizational considerations, implementation \
             responsibilities necessitate comprehensive documentation.",
        );
        assert!(dense.flesch_reading_ease < simple.flesch_reading_ease);
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(readability("   "), Readability::default());
    }
}
