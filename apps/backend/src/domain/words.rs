//! Prompt words and invite codes.

use lazy_regex::regex_is_match;
use rand::seq::IndexedRandom;
use rand::Rng;

/// Things that are quick to sketch and that an image classifier names
/// with a single common word.
pub const WORD_BANK: &[&str] = &[
    "apple", "banana", "bicycle", "bird", "boat", "book", "bridge", "butterfly", "cake", "camera",
    "car", "cat", "chair", "clock", "cloud", "cup", "dog", "door", "elephant", "fish", "flower",
    "guitar", "hat", "house", "key", "ladder", "lamp", "leaf", "moon", "mountain", "mushroom",
    "pencil", "pizza", "rabbit", "rainbow", "snake", "star", "sun", "table", "tree", "umbrella",
    "whale",
];

const INVITE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const INVITE_CODE_LEN: usize = 6;

/// `count` distinct words in random order.
pub fn pick_words<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<String> {
    WORD_BANK
        .choose_multiple(rng, count)
        .map(|w| (*w).to_string())
        .collect()
}

pub fn generate_invite_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..INVITE_CODE_LEN)
        .map(|_| INVITE_ALPHABET[rng.random_range(0..INVITE_ALPHABET.len())] as char)
        .collect()
}

pub fn is_valid_invite_code(code: &str) -> bool {
    regex_is_match!(r"^[A-Z0-9]{6}$", code)
}
