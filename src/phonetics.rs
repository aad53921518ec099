//! Phonetic similarity heuristics for spoken-word comparison.
//!
//! Recognizers mangle learner speech in predictable ways: vowels drift
//! ("letter" heard as "little"), consonant clusters survive. These checks
//! accept a pair of words when any one of several progressively looser
//! measures says they sound alike.

/// Edit-distance threshold for common words.
pub const COMMON_WORD_THRESHOLD: f64 = 0.6;

/// Looser threshold for proper nouns, which ASR transcribes less reliably.
pub const PROPER_NOUN_THRESHOLD: f64 = 0.45;

/// Returns true when `a` and `b` plausibly represent the same spoken word.
///
/// Both inputs must already be lowercase and stripped to alphanumerics.
/// Checks, in order: exact equality, consonant-skeleton equality, coarse
/// phonetic code equality, then normalized edit distance against `threshold`.
pub fn similar(a: &str, b: &str, threshold: f64) -> bool {
    if a == b {
        return true;
    }

    // Skeleton comparison only for words long enough that stripping vowels
    // leaves a meaningful signature, and only when the originals are close
    // in length.
    if a.len() > 3 && b.len() > 3 && consonant_skeleton(a) == consonant_skeleton(b) {
        let len_diff = a.len().abs_diff(b.len());
        if len_diff <= 2 {
            return true;
        }
    }

    let code_a = phonetic_code(a);
    let code_b = phonetic_code(b);
    if !code_a.is_empty() && code_a == code_b {
        return true;
    }

    edit_similarity(a, b) >= threshold
}

/// First character plus every subsequent non-vowel, lowercase.
///
/// "y" counts as a vowel after position 0 so that "happy"/"hippo"-style
/// endings collapse the same way.
pub fn consonant_skeleton(word: &str) -> String {
    let mut chars = word.chars();
    let mut skeleton = String::with_capacity(word.len());
    if let Some(first) = chars.next() {
        skeleton.extend(first.to_lowercase());
    }
    for ch in chars {
        if !matches!(ch.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u' | 'y') {
            skeleton.extend(ch.to_lowercase());
        }
    }
    skeleton
}

/// Soundex-style 4-character code: first letter plus up to three consonant
/// class digits, immediate repeats collapsed, right-padded with zeros.
pub fn phonetic_code(word: &str) -> String {
    let letters: Vec<char> = word
        .chars()
        .map(|c| c.to_ascii_uppercase())
        .filter(|c| c.is_ascii_uppercase())
        .collect();
    let Some(&first) = letters.first() else {
        return String::new();
    };

    let mut code = String::with_capacity(4);
    code.push(first);
    let mut prev_digit = None;
    for &ch in &letters[1..] {
        // Vowels and H/W/Y are skipped entirely: they neither emit a digit
        // nor break a run of repeated consonant classes.
        if let Some(d) = consonant_class(ch) {
            if prev_digit != Some(d) {
                code.push(d);
                prev_digit = Some(d);
            }
        }
        if code.len() == 4 {
            break;
        }
    }
    while code.len() < 4 {
        code.push('0');
    }
    code
}

fn consonant_class(ch: char) -> Option<char> {
    match ch {
        'B' | 'F' | 'P' | 'V' => Some('1'),
        'C' | 'G' | 'J' | 'K' | 'Q' | 'S' | 'X' | 'Z' => Some('2'),
        'D' | 'T' => Some('3'),
        'L' => Some('4'),
        'M' | 'N' => Some('5'),
        'R' => Some('6'),
        _ => None,
    }
}

/// Normalized similarity in [0, 1]: 1 − levenshtein / max_len.
pub fn edit_similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / max_len as f64
}

/// Classic two-row Levenshtein distance over chars.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
