//! Five-word invites.
//!
//! Word choice carries 9 bits per word. The dictionary id and three port
//! bits do not fit there, so the port-carrying variant stores them in the
//! capitalization of selected letters instead.

pub mod interleaved;
pub mod iponly;

use crate::error::InviteError;

pub const WORDS_PER_INVITE: usize = 5;
pub const SEPARATOR: char = '-';

/// Upper-cases the ASCII letter at char position `bit_index`.
pub fn apply_case(word: &str, bit_index: usize) -> String {
    word.chars()
        .enumerate()
        .map(|(idx, c)| {
            if idx == bit_index {
                c.to_ascii_uppercase()
            } else {
                c
            }
        })
        .collect()
}

/// Whether the char at position `bit_index` is an upper-case ASCII letter.
pub fn read_case(word: &str, bit_index: usize) -> bool {
    word.chars()
        .nth(bit_index)
        .map(|c| c.is_ascii_uppercase())
        .unwrap_or(false)
}

fn split_words(code: &str) -> Result<Vec<&str>, InviteError> {
    let words: Vec<&str> = code.split(SEPARATOR).collect();
    if words.len() != WORDS_PER_INVITE {
        return Err(InviteError::MalformedInvite {
            expected: WORDS_PER_INVITE,
            found: words.len(),
        });
    }
    Ok(words)
}

fn join_words(words: &[String]) -> String {
    let mut retvl = String::new();
    for (idx, word) in words.iter().enumerate() {
        if idx > 0 {
            retvl.push(SEPARATOR);
        }
        retvl.push_str(word);
    }
    retvl
}
