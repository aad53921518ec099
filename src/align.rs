//! Global alignment of a spoken transcript against a target sentence.
//!
//! A Needleman-Wunsch style scorer finds the best correspondence between
//! target word tokens and recognized words, then a second pass re-validates
//! every diagonal step: the DP is only a candidate-path search, and a pair is
//! marked correct only if the match predicate accepts it on its own merits.

use crate::phonetics::{self, COMMON_WORD_THRESHOLD, PROPER_NOUN_THRESHOLD};
use crate::text::Token;

/// Why a target word was accepted as spoken correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchReason {
    /// Identical clean forms.
    Exact,
    /// Number word and digit string for the same value ("seven" vs "7").
    Numeral,
    /// The article "a" heard as one of its spoken variants.
    ArticleVariant,
    /// Leading-capital token matched on first letter and similar length.
    ProperNoun,
    /// Accepted by the phonetic similarity heuristics.
    Phonetic,
    /// One clean form is a prefix (>= 3 chars) of the other.
    Prefix,
}

/// Verdict for one target word token, in sentence order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordVerdict {
    /// Index into the full token sequence (including non-word tokens).
    pub token_index: usize,
    /// Clean form of the target word.
    pub word: String,
    pub matched: bool,
    pub reason: Option<MatchReason>,
}

/// Classification of an unmatched word. Only one kind exists today; the
/// struggle report keeps the tag so consumers can distinguish future kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StruggleKind {
    Wrong,
}

/// A target word the learner did not produce acceptably.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Struggle {
    pub word: String,
    pub kind: StruggleKind,
}

/// Full alignment outcome for one attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Alignment {
    /// One verdict per `is_word` token, in sentence order.
    pub verdicts: Vec<WordVerdict>,
    /// Unmatched words in sentence order.
    pub struggles: Vec<Struggle>,
}

impl Alignment {
    pub fn is_perfect(&self) -> bool {
        self.struggles.is_empty()
    }
}

// Scoring constants. Skipping a target word costs more than tolerating an
// extra spoken word: learners insert filler far more often than they swallow
// target words, so the gap penalties are asymmetric.
const SCORE_EXACT: i32 = 15;
const SCORE_ARTICLE: i32 = 12;
const SCORE_CLOSE: i32 = 8;
const SCORE_PREFIX: i32 = 5;
const SCORE_MISMATCH: i32 = -5;
const GAP_TARGET: i32 = -5;
const GAP_SPOKEN: i32 = -2;

/// Spoken variants of the article "a" that recognizers produce.
const ARTICLE_VARIANTS: &[&str] = &["a", "an", "one", "ei", "uh", "ah", "er"];

fn numeral_form(word: &str) -> &str {
    match word {
        "zero" => "0",
        "one" => "1",
        "two" => "2",
        "three" => "3",
        "four" => "4",
        "five" => "5",
        "six" => "6",
        "seven" => "7",
        "eight" => "8",
        "nine" => "9",
        "ten" => "10",
        other => other,
    }
}

/// Target word as the aligner sees it: alnum-only clean form plus the
/// proper-noun flag taken from the display form.
struct TargetWord {
    token_index: usize,
    clean: String,
    proper: bool,
}

fn alnum(word: &str) -> String {
    word.chars().filter(|c| c.is_alphanumeric()).collect()
}

/// Single authoritative predicate shared by DP scoring and backtrack
/// validation. Returns the rationale for an acceptable pair, or None.
fn word_match(target: &str, spoken: &str, proper: bool) -> Option<MatchReason> {
    if target == spoken {
        return Some(MatchReason::Exact);
    }
    if numeral_form(target) == numeral_form(spoken) {
        return Some(MatchReason::Numeral);
    }
    if target == "a" && ARTICLE_VARIANTS.contains(&spoken) {
        return Some(MatchReason::ArticleVariant);
    }
    let first_letters_match = match (target.chars().next(), spoken.chars().next()) {
        (Some(t), Some(s)) => t == s,
        _ => false,
    };
    if proper && first_letters_match && target.len().abs_diff(spoken.len()) <= 2 {
        return Some(MatchReason::ProperNoun);
    }
    let threshold = if proper {
        PROPER_NOUN_THRESHOLD
    } else {
        COMMON_WORD_THRESHOLD
    };
    if phonetics::similar(target, spoken, threshold) {
        return Some(MatchReason::Phonetic);
    }
    let shorter = target.len().min(spoken.len());
    if shorter >= 3 && (target.starts_with(spoken) || spoken.starts_with(target)) {
        return Some(MatchReason::Prefix);
    }
    None
}

fn match_score(reason: Option<MatchReason>) -> i32 {
    match reason {
        Some(MatchReason::Exact) | Some(MatchReason::Numeral) => SCORE_EXACT,
        Some(MatchReason::ArticleVariant) => SCORE_ARTICLE,
        Some(MatchReason::ProperNoun) | Some(MatchReason::Phonetic) => SCORE_CLOSE,
        Some(MatchReason::Prefix) => SCORE_PREFIX,
        None => SCORE_MISMATCH,
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Step {
    Diag,
    SkipTarget,
    SkipSpoken,
}

/// Align `transcript_words` against the word tokens of `target_tokens`.
///
/// Non-word tokens never participate; they are reported through neither
/// verdicts nor struggles. Spoken words must already be lowercase.
pub fn align(target_tokens: &[Token], transcript_words: &[String]) -> Alignment {
    let targets: Vec<TargetWord> = target_tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| t.is_word)
        .map(|(i, t)| TargetWord {
            token_index: i,
            clean: alnum(&t.clean),
            proper: t.looks_proper(),
        })
        .collect();
    let spoken: Vec<String> = transcript_words.iter().map(|w| alnum(w)).collect();

    let n = targets.len();
    let m = spoken.len();

    // Deletion/insertion ramps along the borders.
    let mut dp = vec![vec![0i32; m + 1]; n + 1];
    let mut ptr = vec![vec![Step::Diag; m + 1]; n + 1];
    for i in 0..=n {
        dp[i][0] = GAP_TARGET * i as i32;
    }
    for j in 0..=m {
        dp[0][j] = GAP_SPOKEN * j as i32;
    }

    for i in 1..=n {
        for j in 1..=m {
            let reason = word_match(&targets[i - 1].clean, &spoken[j - 1], targets[i - 1].proper);
            let diag = dp[i - 1][j - 1] + match_score(reason);
            let skip_target = dp[i - 1][j] + GAP_TARGET;
            let skip_spoken = dp[i][j - 1] + GAP_SPOKEN;

            let best = diag.max(skip_target).max(skip_spoken);
            dp[i][j] = best;
            ptr[i][j] = if best == diag {
                Step::Diag
            } else if best == skip_target {
                Step::SkipTarget
            } else {
                Step::SkipSpoken
            };
        }
    }

    // Backtrack. A diagonal step only proves the pairing was globally
    // optimal; the pair still has to pass the match predicate to count.
    let mut matched: Vec<Option<MatchReason>> = vec![None; n];
    let mut i = n;
    let mut j = m;
    while i > 0 || j > 0 {
        if i > 0 && j > 0 && ptr[i][j] == Step::Diag {
            matched[i - 1] =
                word_match(&targets[i - 1].clean, &spoken[j - 1], targets[i - 1].proper);
            i -= 1;
            j -= 1;
        } else if i > 0 && (j == 0 || ptr[i][j] == Step::SkipTarget) {
            i -= 1;
        } else {
            j -= 1;
        }
    }

    let mut verdicts = Vec::with_capacity(n);
    let mut struggles = Vec::new();
    for (k, target) in targets.iter().enumerate() {
        let reason = matched[k];
        if reason.is_none() {
            struggles.push(Struggle {
                word: target.clean.clone(),
                kind: StruggleKind::Wrong,
            });
        }
        verdicts.push(WordVerdict {
            token_index: target.token_index,
            word: target.clean.clone(),
            matched: reason.is_some(),
            reason,
        });
    }

    Alignment { verdicts, struggles }
}
