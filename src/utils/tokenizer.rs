//! Text normalization shared by the index builder and the query compiler.
//!
//! Both sides call [`normalize`] on every candidate token, so a term typed in a
//! query is reduced by exactly the same rules as the text it was indexed from.

/// Tokens shorter than this are dropped, before and after stemming.
pub const MIN_TOKEN_LENGTH: usize = 2;

/// Lazy tokenizer over raw text.
///
/// Tokens are runs of ASCII alphanumerics, lowercased, that may contain
/// hyphens and apostrophes in their interior (`don't`, `sea-level`). Any other
/// byte ends the current token.
pub struct Tokens<'a> {
    bytes: &'a [u8],
    pos: usize,
    current: String,
}

/// Tokenize `text` into lowercase candidate tokens of at least two characters.
pub fn tokenize(text: &str) -> Tokens<'_> {
    Tokens {
        bytes: text.as_bytes(),
        pos: 0,
        current: String::with_capacity(32),
    }
}

#[inline]
fn is_joiner(byte: u8) -> bool {
    byte == b'-' || byte == b'\''
}

impl Tokens<'_> {
    /// Close the current run. Returns the token if it survives trimming and the length check.
    fn flush(&mut self) -> Option<String> {
        while self.current.ends_with(['-', '\'']) {
            self.current.pop();
        }
        let token = std::mem::take(&mut self.current);
        (token.len() >= MIN_TOKEN_LENGTH).then_some(token)
    }
}

impl Iterator for Tokens<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while self.pos < self.bytes.len() {
            let byte = self.bytes[self.pos];
            self.pos += 1;

            if byte.is_ascii_alphanumeric() {
                self.current.push(byte.to_ascii_lowercase() as char);
            } else if is_joiner(byte) && !self.current.is_empty() {
                self.current.push(byte as char);
            } else if let Some(token) = self.flush() {
                return Some(token);
            }
        }
        self.flush()
    }
}

/// Suffix rules: (suffix, replacement, minimum stem length left after stripping).
const POSSESSIVE: (&str, &str, usize) = ("'s", "", 2);

const SSES: (&str, &str, usize) = ("sses", "ss", 3);
const IES: (&str, &str, usize) = ("ies", "y", 3);
const PLURAL_S: (&str, &str, usize) = ("s", "", 3);

const SUFFIX_RULES: [(&str, &str, usize); 4] = [
    ("ing", "", 4),
    ("ed", "", 4),
    ("ly", "", 5),
    ("ment", "", 5),
];

/// Words shorter than this are never stemmed.
const MIN_STEMMABLE_LENGTH: usize = 4;

fn strip_rule(word: &mut String, (suffix, replacement, min_stem): (&str, &str, usize)) -> bool {
    if !word.ends_with(suffix) || word.len() - suffix.len() < min_stem {
        return false;
    }
    word.truncate(word.len() - suffix.len());
    word.push_str(replacement);
    true
}

/// Suffix-stripping stemmer.
///
/// Order: possessive `'s`, then at most one plural rule, then at most one
/// derivational suffix. `sses` and `ies` are final; a bare trailing `s` may be
/// followed by a suffix rule (`walks` -> `walk`, `meetings` -> `meet`).
pub fn stem(token: &str) -> String {
    let mut word = token.to_string();
    if word.len() < MIN_STEMMABLE_LENGTH {
        return word;
    }

    strip_rule(&mut word, POSSESSIVE);

    if strip_rule(&mut word, SSES) || strip_rule(&mut word, IES) {
        return word;
    }
    if !word.ends_with("ss") {
        strip_rule(&mut word, PLURAL_S);
    }

    for rule in SUFFIX_RULES {
        if strip_rule(&mut word, rule) {
            break;
        }
    }
    word
}

/// Stem a token and keep it only if it is still a usable term.
pub fn normalize(token: &str) -> Option<String> {
    let term = stem(token);
    (term.len() >= MIN_TOKEN_LENGTH).then_some(term)
}

/// Tokenize and normalize in one pass; yields index/query terms.
pub fn terms(text: &str) -> impl Iterator<Item = String> + '_ {
    tokenize(text).filter_map(|token| normalize(&token))
}
