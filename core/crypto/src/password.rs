//! Random password generation and policy checks.

use rand::seq::SliceRandom;
use rand::Rng;

use sealkit_common::{Error, Result};

/// ASCII uppercase letters.
pub const UPPERCASE_CHARS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
/// ASCII lowercase letters.
pub const LOWERCASE_CHARS: &str = "abcdefghijklmnopqrstuvwxyz";
/// ASCII digits.
pub const DIGIT_CHARS: &str = "0123456789";
/// Punctuation accepted as a special character.
pub const SPECIAL_CHARS: &str = "!@$*()-_=+[]{}|;:,.";

/// Character classes a password is built from or must contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterClasses {
    /// Draw from or require [`UPPERCASE_CHARS`].
    pub uppercase: bool,
    /// Draw from or require [`LOWERCASE_CHARS`].
    pub lowercase: bool,
    /// Draw from or require [`DIGIT_CHARS`].
    pub digits: bool,
    /// Draw from or require [`SPECIAL_CHARS`].
    pub special: bool,
}

impl Default for CharacterClasses {
    fn default() -> Self {
        Self {
            uppercase: true,
            lowercase: true,
            digits: true,
            special: true,
        }
    }
}

impl CharacterClasses {
    fn selected(&self) -> Vec<&'static [u8]> {
        [
            (self.uppercase, UPPERCASE_CHARS),
            (self.lowercase, LOWERCASE_CHARS),
            (self.digits, DIGIT_CHARS),
            (self.special, SPECIAL_CHARS),
        ]
        .into_iter()
        .filter(|(enabled, _)| *enabled)
        .map(|(_, set)| set.as_bytes())
        .collect()
    }
}

/// Generate a random password of `length` characters.
///
/// Every selected class appears at least once; the rest is drawn from the
/// union of the selected classes and the result is shuffled.
///
/// # Errors
/// - `InvalidInput` if no class is selected or `length` is smaller than the
///   number of selected classes
pub fn generate(length: usize, classes: &CharacterClasses) -> Result<String> {
    let sets = classes.selected();
    if sets.is_empty() {
        return Err(Error::InvalidInput(
            "At least one character set must be selected".to_string(),
        ));
    }
    if length < sets.len() {
        return Err(Error::InvalidInput(format!(
            "Password length must be at least {}",
            sets.len()
        )));
    }

    let mut rng = rand::thread_rng();
    let pool: Vec<u8> = sets.concat();

    let mut password: Vec<u8> = sets
        .iter()
        .map(|set| set[rng.gen_range(0..set.len())])
        .collect();
    password.extend((sets.len()..length).map(|_| pool[rng.gen_range(0..pool.len())]));
    password.shuffle(&mut rng);

    // every byte comes from the ASCII sets above
    Ok(password.into_iter().map(char::from).collect())
}

/// Check `password` against a minimum length and required classes.
pub fn validate(password: &str, min_length: usize, required: &CharacterClasses) -> bool {
    if password.chars().count() < min_length {
        return false;
    }

    let checks: [(bool, fn(char) -> bool); 4] = [
        (required.uppercase, |c: char| c.is_uppercase()),
        (required.lowercase, |c: char| c.is_lowercase()),
        (required.digits, |c: char| c.is_ascii_digit()),
        (required.special, |c: char| SPECIAL_CHARS.contains(c)),
    ];

    checks
        .iter()
        .filter(|(enabled, _)| *enabled)
        .all(|(_, check)| password.chars().any(*check))
}
