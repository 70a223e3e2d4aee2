use std::fmt;

/// Shortest word that still reads as text from both sides.
pub const MIN_WORD_LEN: usize = 2;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputValidationError {
    #[error("word {label} is empty")]
    EmptyWord { label: String },
    #[error("word {label} has {len} characters, at least {min} are required")]
    WordTooShort { label: String, len: usize, min: usize },
    #[error("words must have the same length (A has {a} characters, B has {b})")]
    LengthMismatch { a: usize, b: usize },
    #[error("invalid {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
}

/// Trim surrounding whitespace and uppercase. Applying it twice changes nothing.
#[must_use]
pub fn normalize_word(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// A validated, normalized word. Lengths are counted in `char`s.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WordSpec {
    text: String,
    len: usize,
}

impl WordSpec {
    /// Normalize `raw` and check it on its own; `label` names it in errors.
    pub fn parse(label: &str, raw: &str) -> Result<Self, InputValidationError> {
        let text = normalize_word(raw);
        let len = text.chars().count();
        if len == 0 {
            return Err(InputValidationError::EmptyWord {
                label: label.to_string(),
            });
        }
        if len < MIN_WORD_LEN {
            return Err(InputValidationError::WordTooShort {
                label: label.to_string(),
                len,
                min: MIN_WORD_LEN,
            });
        }
        Ok(Self { text, len })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn chars(&self) -> std::str::Chars<'_> {
        self.text.chars()
    }
}

impl fmt::Display for WordSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Gate in front of any geometry: both words non-empty, at least
/// [`MIN_WORD_LEN`] characters, and equally long.
pub fn validate_word_pair(a: &str, b: &str) -> Result<(WordSpec, WordSpec), InputValidationError> {
    let word_a = WordSpec::parse("A", a)?;
    let word_b = WordSpec::parse("B", b)?;
    if word_a.len() != word_b.len() {
        return Err(InputValidationError::LengthMismatch {
            a: word_a.len(),
            b: word_b.len(),
        });
    }
    Ok((word_a, word_b))
}
