//! Address and port in five words.
//!
//! Port layout (MSB first): `meta:3 | high:8 | low:5`. Word `i < 4` is
//! `low[i] ++ octet[i]`, word 4 is `low[4] ++ high`. The dictionary id sets
//! the case of the first letter of words 0..4 (bit `i` on word `i`), and the
//! reversed meta bits set the case of the first three letters of word 4.

use super::{apply_case, join_words, read_case, split_words, WORDS_PER_INVITE};
use crate::bits::BitVector;
use crate::dictionary::{DictionarySet, CHUNK_BITS, ID_BITS, MAX_DICTIONARIES};
use crate::error::InviteError;
use std::net::Ipv4Addr;

pub const PORT_BITS: usize = 16;
pub const PORT_META_BITS: usize = 3;
pub const PORT_DATA_BITS: usize = PORT_BITS - PORT_META_BITS;
pub const PORT_HIGH_BITS: usize = 8;
pub const PORT_LOW_BITS: usize = PORT_DATA_BITS - PORT_HIGH_BITS;

const IP_BYTE_COUNT: usize = 4;
const BITS_PER_BYTE: usize = 8;

struct PortParts {
    meta: BitVector,
    high: BitVector,
    low: BitVector,
}

fn split_port(port: u16) -> Result<PortParts, InviteError> {
    let bits = BitVector::from_uint(u32::from(port), PORT_BITS)?;
    Ok(PortParts {
        meta: bits.slice(0, PORT_META_BITS)?,
        high: bits.slice(PORT_META_BITS, PORT_HIGH_BITS)?,
        low: bits.slice(PORT_META_BITS + PORT_HIGH_BITS, PORT_LOW_BITS)?,
    })
}

fn interleave(ip: Ipv4Addr, port: &PortParts) -> Result<Vec<BitVector>, InviteError> {
    let ip_chunks = BitVector::from_be_bytes(&ip.octets()).split(BITS_PER_BYTE)?;
    let mut retvl = Vec::with_capacity(WORDS_PER_INVITE);
    for (idx, octet) in ip_chunks.iter().enumerate() {
        let low_bit = port.low.slice(idx, 1)?;
        retvl.push(BitVector::concat(&[low_bit, octet.clone()]));
    }
    let last_low = port.low.slice(IP_BYTE_COUNT, 1)?;
    retvl.push(BitVector::concat(&[last_low, port.high.clone()]));
    Ok(retvl)
}

fn deinterleave(chunks: &[BitVector], meta: &BitVector) -> Result<(Ipv4Addr, u16), InviteError> {
    let mut low = Vec::with_capacity(PORT_LOW_BITS);
    let mut octets = Vec::with_capacity(IP_BYTE_COUNT);
    for chunk in &chunks[..IP_BYTE_COUNT] {
        low.push(chunk.slice(0, 1)?);
        octets.push(chunk.slice(1, BITS_PER_BYTE)?);
    }
    let last = &chunks[IP_BYTE_COUNT];
    low.push(last.slice(0, 1)?);
    let high = last.slice(1, PORT_HIGH_BITS)?;

    let ip_bytes = BitVector::concat(&octets).to_be_bytes()?;
    let ip = Ipv4Addr::new(ip_bytes[0], ip_bytes[1], ip_bytes[2], ip_bytes[3]);
    let low = BitVector::concat(&low);
    let port = BitVector::concat(&[meta.clone(), high, low]).to_uint()?;
    Ok((ip, port as u16))
}

pub fn encode(
    dicts: &DictionarySet,
    ip: Ipv4Addr,
    port: u16,
    dictionary_id: usize,
) -> Result<String, InviteError> {
    if dictionary_id >= MAX_DICTIONARIES {
        return Err(InviteError::UnknownDictionary {
            id: dictionary_id,
            loaded: dicts.len(),
        });
    }
    let dict = dicts.get(dictionary_id)?;
    let parts = split_port(port)?;
    let chunks = interleave(ip, &parts)?;

    let mut words = Vec::with_capacity(WORDS_PER_INVITE);
    for chunk in &chunks {
        let index = chunk.to_uint()? as usize;
        let word = dict.word(index).ok_or(InviteError::UnknownDictionary {
            id: dictionary_id,
            loaded: dicts.len(),
        })?;
        words.push(word.to_owned());
    }

    for (idx, word) in words.iter_mut().enumerate().take(ID_BITS) {
        if (dictionary_id >> idx) & 1 == 1 {
            *word = apply_case(word, 0);
        }
    }

    let reversed_meta = parts.meta.reversed();
    let last = &mut words[WORDS_PER_INVITE - 1];
    for idx in 0..reversed_meta.len() {
        if reversed_meta.get(idx) == Some(true) {
            *last = apply_case(last, idx);
        }
    }

    Ok(join_words(&words))
}

/// Returns the address, port, and the dictionary id the invite was written with.
pub fn decode(dicts: &DictionarySet, code: &str) -> Result<(Ipv4Addr, u16, usize), InviteError> {
    let words = split_words(code)?;

    let dictionary_id = words
        .iter()
        .take(ID_BITS)
        .enumerate()
        .filter(|(_, word)| read_case(word, 0))
        .fold(0usize, |acc, (idx, _)| acc | (1 << idx));
    let dict = dicts.get(dictionary_id)?;

    let last = words[WORDS_PER_INVITE - 1];
    let pattern = BitVector::from_bits((0..PORT_META_BITS).map(|idx| read_case(last, idx)));
    let meta = pattern.reversed();

    let mut chunks = Vec::with_capacity(WORDS_PER_INVITE);
    for word in &words {
        let index = dict
            .index_of(word)
            .ok_or_else(|| InviteError::WordNotFound(word.to_lowercase()))?;
        chunks.push(BitVector::from_uint(index as u32, CHUNK_BITS)?);
    }

    let (ip, port) = deinterleave(&chunks, &meta)?;
    Ok((ip, port, dictionary_id))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dictionary::{self, test::synthetic_set};

    const TRIALS: usize = 200;

    #[test]
    fn test_port_split() {
        let parts = split_port(0b101_11001100_10011).unwrap();
        assert_eq!(parts.meta.to_string(), "101");
        assert_eq!(parts.high.to_string(), "11001100");
        assert_eq!(parts.low.to_string(), "10011");
    }

    #[test]
    fn test_known_layout() {
        // Synthetic dictionary 0 spells index `n` as 'a' + base-26 digits of n.
        let dicts = synthetic_set(1);
        let dict = dicts.get(0).unwrap();
        // port = meta 000, high 00000001, low 10000
        let code = encode(&dicts, Ipv4Addr::new(1, 2, 3, 4), 0b000_00000001_10000, 0).unwrap();
        let words: Vec<&str> = code.split('-').collect();
        assert_eq!(dict.index_of(words[0]), Some(256 + 1));
        assert_eq!(dict.index_of(words[1]), Some(2));
        assert_eq!(dict.index_of(words[2]), Some(3));
        assert_eq!(dict.index_of(words[3]), Some(4));
        assert_eq!(dict.index_of(words[4]), Some(1));
        assert_eq!(code, code.to_lowercase());
    }

    #[test]
    fn test_meta_capitalization() {
        let dicts = synthetic_set(1);
        let ip = Ipv4Addr::new(10, 0, 0, 1);
        let last_word = |port: u16| {
            let code = encode(&dicts, ip, port, 0).unwrap();
            code.rsplit('-').next().unwrap().to_owned()
        };
        // Top port bit lands on the third letter, bit 13 on the first.
        assert_eq!(&last_word(0x2000)[..3], "Aaa");
        assert_eq!(&last_word(0x4000)[..3], "aAa");
        assert_eq!(&last_word(0x8000)[..3], "aaA");
        assert_eq!(&last_word(0xE000)[..3], "AAA");
    }

    #[test]
    fn test_dictionary_id_capitalization() {
        let dicts = dictionary::bundled().unwrap();
        let ip = Ipv4Addr::new(203, 0, 113, 9);
        let port = 50000;
        for &(id, mask) in &[(3usize, [true, true, false, false]), (12, [false, false, true, true])] {
            let code = encode(&dicts, ip, port, id).unwrap();
            let words: Vec<&str> = code.split('-').collect();
            for (word, &upper) in words.iter().zip(mask.iter()) {
                assert_eq!(read_case(word, 0), upper, "{} in {}", word, code);
            }
            assert_eq!(decode(&dicts, &code).unwrap(), (ip, port, id));
        }
    }

    #[test]
    fn test_random_round_trip() {
        let dicts = dictionary::bundled().unwrap();
        for _ in 0..TRIALS {
            let ip: u32 = rand::random();
            let ip = Ipv4Addr::from(ip);
            let port: u16 = rand::random();
            let id = rand::random::<usize>() % MAX_DICTIONARIES;
            let code = encode(&dicts, ip, port, id).unwrap();
            assert_eq!(decode(&dicts, &code).unwrap(), (ip, port, id));
        }
    }

    #[test]
    fn test_boundaries() {
        let dicts = dictionary::bundled().unwrap();
        for &(ip, port) in &[(Ipv4Addr::UNSPECIFIED, 0u16), (Ipv4Addr::BROADCAST, 65535)] {
            for id in 0..MAX_DICTIONARIES {
                let code = encode(&dicts, ip, port, id).unwrap();
                assert_eq!(decode(&dicts, &code).unwrap(), (ip, port, id));
            }
        }
    }

    #[test]
    fn test_decode_ignores_case_of_inner_letters() {
        let dicts = dictionary::bundled().unwrap();
        let ip = Ipv4Addr::new(192, 168, 1, 32);
        let code = encode(&dicts, ip, 41234, 5).unwrap();
        let words: Vec<&str> = code.split('-').collect();
        let mut shouted: Vec<String> = words[..4]
            .iter()
            .map(|word| keep_prefix_shout_rest(word, 1))
            .collect();
        shouted.push(keep_prefix_shout_rest(words[4], PORT_META_BITS));
        assert_eq!(decode(&dicts, &shouted.join("-")).unwrap(), (ip, 41234, 5));
    }

    fn keep_prefix_shout_rest(word: &str, prefix: usize) -> String {
        let head: String = word.chars().take(prefix).collect();
        let tail: String = word.chars().skip(prefix).collect();
        format!("{}{}", head, tail.to_uppercase())
    }

    #[test]
    fn test_errors() {
        let dicts = dictionary::bundled().unwrap();
        assert_eq!(
            decode(&dicts, "a-b-c-d"),
            Err(InviteError::MalformedInvite {
                expected: 5,
                found: 4
            })
        );

        let code = encode(&dicts, Ipv4Addr::new(8, 8, 8, 8), 53, 0).unwrap();
        let mut words: Vec<String> = code.split('-').map(str::to_owned).collect();
        words[2] = "qwzxv".to_owned();
        assert_eq!(
            decode(&dicts, &words.join("-")),
            Err(InviteError::WordNotFound("qwzxv".to_owned()))
        );

        let small = synthetic_set(2);
        assert_eq!(
            encode(&small, Ipv4Addr::LOCALHOST, 80, 2),
            Err(InviteError::UnknownDictionary { id: 2, loaded: 2 })
        );
        // Capitalizing word 2 selects dictionary 4, which is not loaded.
        let code = encode(&small, Ipv4Addr::LOCALHOST, 80, 0).unwrap();
        let mut words: Vec<String> = code.split('-').map(str::to_owned).collect();
        words[2] = apply_case(&words[2], 0);
        assert_eq!(
            decode(&small, &words.join("-")),
            Err(InviteError::UnknownDictionary { id: 4, loaded: 2 })
        );
    }
}
