//! Address-only invites: four octet words plus one word naming the dictionary.
//!
//! Nothing is carried in letter case here. The decoder cannot tell which
//! dictionary was used without trying them all, so it accepts the first one
//! whose id word points back at itself.

use super::{join_words, split_words, WORDS_PER_INVITE};
use crate::dictionary::{Dictionary, DictionarySet};
use crate::error::InviteError;
use std::convert::TryFrom;
use std::net::Ipv4Addr;

const OCTET_WORDS: usize = WORDS_PER_INVITE - 1;

pub fn encode(dicts: &DictionarySet, ip: Ipv4Addr, dictionary_id: usize) -> Result<String, InviteError> {
    let dict = dicts.get(dictionary_id)?;
    let out_of_range = || InviteError::UnknownDictionary {
        id: dictionary_id,
        loaded: dicts.len(),
    };
    let mut words = Vec::with_capacity(WORDS_PER_INVITE);
    for octet in ip.octets().iter() {
        let word = dict.word(usize::from(*octet)).ok_or_else(out_of_range)?;
        words.push(word.to_owned());
    }
    words.push(dict.word(dictionary_id).ok_or_else(out_of_range)?.to_owned());
    Ok(join_words(&words))
}

fn try_dictionary(dict: &Dictionary, words: &[&str]) -> Option<Ipv4Addr> {
    if dict.index_of(words[OCTET_WORDS])? != dict.id() {
        return None;
    }
    let mut octets = [0u8; OCTET_WORDS];
    for (octet, word) in octets.iter_mut().zip(words.iter()) {
        let index = dict.index_of(word)?;
        *octet = u8::try_from(index).ok()?;
    }
    Some(Ipv4Addr::from(octets))
}

/// Returns the address and the id of the first dictionary that reads the
/// invite consistently.
pub fn decode(dicts: &DictionarySet, code: &str) -> Result<(Ipv4Addr, usize), InviteError> {
    let words = split_words(code)?;
    dicts
        .iter()
        .find_map(|dict| try_dictionary(dict, &words).map(|ip| (ip, dict.id())))
        .ok_or_else(|| InviteError::AmbiguousOrUnknown(code.to_owned()))
}
