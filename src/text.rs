//! Sentence splitting, tokenization, and transcript normalization.
//!
//! Targets are tokenized once per sentence into display/clean pairs so the
//! UI can render punctuation while the aligner only sees word tokens.
//! Recognizer output is flattened into lowercase words with discourse
//! fillers removed.

/// One segment of a target sentence.
///
/// `display` preserves the original text (including punctuation and
/// whitespace runs) for rendering. `clean` is the lowercase
/// alphanumeric-and-hyphen form used for matching; non-word tokens keep it
/// empty and never participate in alignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub display: String,
    pub clean: String,
    pub is_word: bool,
}

impl Token {
    fn word(display: &str) -> Self {
        Self {
            display: display.to_string(),
            clean: clean_form(display),
            is_word: true,
        }
    }

    fn filler(display: &str) -> Self {
        Self {
            display: display.to_string(),
            clean: String::new(),
            is_word: false,
        }
    }

    /// True when the display form starts with an uppercase letter, the
    /// heuristic the aligner uses to treat a token as a proper noun.
    pub fn looks_proper(&self) -> bool {
        self.display
            .chars()
            .next()
            .is_some_and(|c| c.is_uppercase())
    }
}

/// Lowercase, alphanumeric-and-hyphen only.
pub fn clean_form(word: &str) -> String {
    word.chars()
        .filter(|c| c.is_alphanumeric() || *c == '-')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Abbreviations whose trailing period must not end a sentence.
const PROTECTED_ABBREVIATIONS: &[&str] =
    &["Mr.", "Mrs.", "Ms.", "Dr.", "Prof.", "Sr.", "Jr.", "St."];

const ABBREVIATION_SENTINEL: &str = "\u{1}";

/// Split learning content into sentences.
///
/// Browser segmenters disagree on abbreviations, so this uses a
/// protect-split-restore pass: common title abbreviations are masked,
/// the text is split on terminal punctuation runs (keeping trailing
/// quotes/brackets with their sentence), and the masks are restored.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut masked = text.to_string();
    for abbr in PROTECTED_ABBREVIATIONS {
        let replacement = format!("{}{}", &abbr[..abbr.len() - 1], ABBREVIATION_SENTINEL);
        masked = masked.replace(abbr, &replacement);
    }

    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = masked.chars().peekable();
    while let Some(ch) = chars.next() {
        current.push(ch);
        if matches!(ch, '.' | '!' | '?') {
            // Absorb the rest of the punctuation run plus closing quotes.
            while let Some(&next) = chars.peek() {
                if matches!(next, '.' | '!' | '?' | '\'' | '"' | '\u{201d}' | '\u{2019}' | ')') {
                    current.push(next);
                    chars.next();
                } else {
                    break;
                }
            }
            sentences.push(std::mem::take(&mut current));
        }
    }
    if !current.trim().is_empty() {
        sentences.push(current);
    }

    sentences
        .into_iter()
        .map(|s| s.replace(ABBREVIATION_SENTINEL, ".").trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Segment one sentence into word / punctuation / whitespace tokens.
///
/// Apostrophes and hyphens bind to the surrounding word so contractions
/// stay whole. Whitespace runs collapse into single non-word tokens;
/// punctuation characters become individual non-word tokens.
pub fn tokenize(sentence: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = sentence.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        if is_word_char(ch) {
            let start = i;
            while i < chars.len() && is_word_char(chars[i]) {
                i += 1;
            }
            let display: String = chars[start..i].iter().collect();
            // A run of bare hyphens or apostrophes carries no letters and is
            // punctuation, not a word the learner could speak.
            if display.chars().any(|c| c.is_alphanumeric()) {
                tokens.push(Token::word(&display));
            } else {
                tokens.push(Token::filler(&display));
            }
        } else if ch.is_whitespace() {
            let start = i;
            while i < chars.len() && chars[i].is_whitespace() {
                i += 1;
            }
            let display: String = chars[start..i].iter().collect();
            tokens.push(Token::filler(&display));
        } else {
            tokens.push(Token::filler(&ch.to_string()));
            i += 1;
        }
    }
    tokens
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '\'' | '\u{2019}' | '-')
}

/// Discourse fillers dropped from transcripts before alignment.
const FILLER_WORDS: &[&str] = &["um", "uh", "ah", "hmm", "er", "so"];

/// Flatten raw recognizer text into lowercase words with fillers removed.
///
/// Punctuation and hyphens become spaces, the two-word filler "you know"
/// is dropped as a bigram, then single-word fillers are filtered by their
/// punctuation-stripped form.
pub fn normalize_transcript(raw: &str) -> Vec<String> {
    let spaced: String = raw
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '\'' { c } else { ' ' })
        .collect();

    let words: Vec<String> = spaced.split_whitespace().map(|w| w.to_string()).collect();

    let mut filtered = Vec::with_capacity(words.len());
    let mut i = 0;
    while i < words.len() {
        if strip_word(&words[i]) == "you"
            && i + 1 < words.len()
            && strip_word(&words[i + 1]) == "know"
        {
            i += 2;
            continue;
        }
        if FILLER_WORDS.contains(&strip_word(&words[i]).as_str()) {
            i += 1;
            continue;
        }
        filtered.push(words[i].clone());
        i += 1;
    }
    filtered
}

fn strip_word(word: &str) -> String {
    word.chars().filter(|c| c.is_alphanumeric()).collect()
}
