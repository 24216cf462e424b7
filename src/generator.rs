//! Random password generation.
//!
//! Independent of the vault: a pure utility the presentation layer calls
//! to prefill the password field.

use rand::Rng;

/// The 70-character alphabet passwords are drawn from:
/// `A-Z a-z 0-9 !@#$%&*`.
const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%&*";

/// Default generated password length.
pub const DEFAULT_PASSWORD_LENGTH: usize = 16;

/// Generate a random password of `length` characters, drawn uniformly
/// with replacement from the alphabet above.
pub fn generate_password(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}
