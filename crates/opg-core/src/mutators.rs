//! Stochastic post-processing applied to generated text.
//!
//! Both mutators split on whitespace and rejoin with single spaces, so runs of
//! whitespace and newlines in the input collapse even when no token changes.

use rand::seq::IndexedRandom;
use rand::Rng;

/// Clamp a caller-supplied probability into `[0, 1]`. NaN maps to 0.
pub fn clamp_probability(p: f64) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}

/// Reverse the characters of a single token, keeping its trailing punctuation
/// run in place: `"world!"` becomes `"dlrow!"`.
pub fn reverse_word(word: &str) -> String {
    let head_len = word.trim_end_matches(|c: char| !c.is_alphanumeric()).len();
    let (head, tail) = word.split_at(head_len);
    let mut out: String = head.chars().rev().collect();
    out.push_str(tail);
    out
}

/// Reverse each whitespace-delimited token with probability `probability`.
pub fn reverse_words<R: Rng + ?Sized>(text: &str, probability: f64, rng: &mut R) -> String {
    text.split_whitespace()
        .map(|word| {
            if rng.random::<f64>() < probability {
                reverse_word(word)
            } else {
                word.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Wrap each token in a `[code:token]` marker with probability `probability`,
/// picking `code` uniformly from `languages`.
///
/// Returns the input untouched when `languages` is empty or `probability <= 0`.
pub fn swap_languages<R, S>(text: &str, probability: f64, languages: &[S], rng: &mut R) -> String
where
    R: Rng + ?Sized,
    S: AsRef<str>,
{
    if languages.is_empty() || probability <= 0.0 {
        return text.to_string();
    }
    text.split_whitespace()
        .map(|word| {
            if rng.random::<f64>() < probability {
                match languages.choose(rng) {
                    Some(code) => format!("[{}:{}]", code.as_ref(), word),
                    None => word.to_string(),
                }
            } else {
                word.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn reverse_keeps_trailing_punctuation() {
        assert_eq!(reverse_words("Hello, world!", 1.0, &mut rng()), "olleH, dlrow!");
        assert_eq!(reverse_word("wait?!..."), "tiaw?!...");
        assert_eq!(reverse_word("abc"), "cba");
    }

    #[test]
    fn reverse_of_pure_punctuation_is_noop() {
        assert_eq!(reverse_word("?!"), "?!");
        assert_eq!(reverse_word("..."), "...");
        assert_eq!(reverse_words("-- ok --", 1.0, &mut rng()), "-- ko --");
    }

    #[test]
    fn reverse_handles_multibyte_characters() {
        assert_eq!(reverse_word("héllo."), "olléh.");
        assert_eq!(reverse_word("日本語!"), "語本日!");
    }

    #[test]
    fn zero_probability_only_collapses_whitespace() {
        let text = "I   hate\thiking\n  today.";
        assert_eq!(reverse_words(text, 0.0, &mut rng()), "I hate hiking today.");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(reverse_words("", 1.0, &mut rng()), "");
        assert_eq!(reverse_words("   ", 1.0, &mut rng()), "");
        assert_eq!(swap_languages("", 1.0, &["es"], &mut rng()), "");
    }

    #[test]
    fn reversing_twice_restores_tokens() {
        let text = "Water boils at 100C, obviously!";
        let once = reverse_words(text, 1.0, &mut rng());
        let twice = reverse_words(&once, 1.0, &mut rng());
        assert_eq!(twice, text);
    }

    #[test]
    fn partial_probability_changes_some_tokens_only() {
        let text = (0..200).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ");
        let out = reverse_words(&text, 0.5, &mut rng());
        let changed = text
            .split(' ')
            .zip(out.split(' '))
            .filter(|(a, b)| a != b)
            .count();
        assert!(changed > 50 && changed < 150, "changed {changed} of 200");
    }

    #[test]
    fn swap_is_noop_without_languages() {
        let empty: [&str; 0] = [];
        let text = "keep   this  spacing";
        assert_eq!(swap_languages(text, 1.0, &empty, &mut rng()), text);
        assert_eq!(swap_languages(text, 0.0, &["fr"], &mut rng()), text);
        assert_eq!(swap_languages(text, -0.5, &["fr"], &mut rng()), text);
    }

    #[test]
    fn swap_marks_every_token_at_full_probability() {
        let langs = vec!["es".to_string(), "fr".to_string(), "de".to_string()];
        let out = swap_languages("I hate hiking", 1.0, &langs, &mut rng());
        let tokens: Vec<&str> = out.split(' ').collect();
        assert_eq!(tokens.len(), 3);
        for (token, original) in tokens.iter().zip(["I", "hate", "hiking"]) {
            let inner = token
                .strip_prefix('[')
                .and_then(|t| t.strip_suffix(']'))
                .expect("bracketed marker");
            let (code, word) = inner.split_once(':').expect("code separator");
            assert!(langs.iter().any(|l| l == code), "unexpected code {code}");
            assert_eq!(word, original);
        }
    }

    #[test]
    fn swap_with_single_language_is_deterministic_in_code() {
        let out = swap_languages("a b", 1.0, &["it"], &mut rng());
        assert_eq!(out, "[it:a] [it:b]");
    }

    #[test]
    fn clamp_probability_bounds() {
        assert_eq!(clamp_probability(-1.0), 0.0);
        assert_eq!(clamp_probability(0.25), 0.25);
        assert_eq!(clamp_probability(7.0), 1.0);
        assert_eq!(clamp_probability(f64::NAN), 0.0);
    }
}
