use crate::canonical::Endpoint;
use crate::dictionary::DictionarySet;
use crate::error::InviteError;
use crate::mnemonic::{self, interleaved, iponly};
use std::net::Ipv4Addr;
use std::sync::Arc;

/// Five dictionary words joined by `-`.
#[derive(Clone, Debug)]
pub struct WordsConverter {
    dicts: Arc<DictionarySet>,
}

impl WordsConverter {
    pub fn new(dicts: Arc<DictionarySet>) -> Self {
        Self { dicts }
    }

    pub fn dictionaries(&self) -> &DictionarySet {
        &self.dicts
    }

    pub fn is_format(&self, text: &str) -> bool {
        text.split(mnemonic::SEPARATOR).count() == mnemonic::WORDS_PER_INVITE
    }

    pub fn encode(&self, endpoint: Endpoint, dictionary_id: usize) -> Result<String, InviteError> {
        interleaved::encode(&self.dicts, endpoint.ip(), endpoint.port(), dictionary_id)
    }

    pub fn decode(&self, text: &str) -> Result<Endpoint, InviteError> {
        self.decode_with_dictionary(text).map(|(endpoint, _)| endpoint)
    }

    /// Like [`decode`](Self::decode), also returning the id of the dictionary
    /// the invite was written with.
    pub fn decode_with_dictionary(&self, text: &str) -> Result<(Endpoint, usize), InviteError> {
        let (ip, port, id) = interleaved::decode(&self.dicts, text)?;
        Ok((Endpoint::new(ip, port), id))
    }

    pub fn encode_ip_only(&self, ip: Ipv4Addr, dictionary_id: usize) -> Result<String, InviteError> {
        iponly::encode(&self.dicts, ip, dictionary_id)
    }

    pub fn decode_ip_only(&self, text: &str) -> Result<(Ipv4Addr, usize), InviteError> {
        iponly::decode(&self.dicts, text)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dictionary;

    fn converter() -> WordsConverter {
        WordsConverter::new(dictionary::bundled().unwrap())
    }

    #[test]
    fn test_round_trip() {
        let words = converter();
        let endpoint = Endpoint::new(Ipv4Addr::new(81, 2, 69, 160), 27015);
        for id in 0..words.dictionaries().len() {
            let text = words.encode(endpoint, id).unwrap();
            assert!(words.is_format(&text));
            assert_eq!(words.decode_with_dictionary(&text).unwrap(), (endpoint, id));
        }
    }

    #[test]
    fn test_ip_only() {
        let words = converter();
        let ip = Ipv4Addr::new(100, 64, 0, 1);
        let text = words.encode_ip_only(ip, 0).unwrap();
        assert!(words.is_format(&text));
        assert_eq!(words.decode_ip_only(&text).unwrap().0, ip);
    }

    #[test]
    fn test_recognize() {
        let words = converter();
        assert!(words.is_format("a-b-c-d-e"));
        assert!(!words.is_format("a-b-c-d"));
        assert!(!words.is_format("a-b-c-d-e-f"));
        assert!(!words.is_format("abcde"));
    }
}
