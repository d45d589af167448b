//! Password generation and strength check

use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::crypto::SecureString;

/// Length of generated passwords
pub const GENERATED_LENGTH: usize = 20;

/// Shortest password considered strong
pub const MIN_STRONG_LENGTH: usize = 12;

const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";
const SYMBOLS: &[u8] = b"!@#$%^&*()-_=+[]{};:,.<>?";

/// Generate a random password containing every character class
pub fn generate_password() -> SecureString {
    let mut rng = OsRng;
    let all: Vec<u8> = [UPPER, LOWER, DIGITS, SYMBOLS].concat();

    let mut chars: Vec<u8> = [UPPER, LOWER, DIGITS, SYMBOLS]
        .iter()
        .map(|class| pick(&mut rng, class))
        .collect();
    while chars.len() < GENERATED_LENGTH {
        chars.push(pick(&mut rng, &all));
    }
    chars.shuffle(&mut rng);

    chars.into_iter().map(char::from).collect::<String>().into()
}

/// Check length and character class requirements
pub fn is_password_strong(password: &str) -> bool {
    password.chars().count() >= MIN_STRONG_LENGTH
        && password.chars().any(|c| c.is_uppercase())
        && password.chars().any(|c| c.is_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password
            .chars()
            .any(|c| !c.is_alphanumeric() && !c.is_whitespace())
}

fn pick<R: Rng>(rng: &mut R, pool: &[u8]) -> u8 {
    pool[rng.gen_range(0..pool.len())]
}
