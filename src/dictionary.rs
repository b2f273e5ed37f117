//! Word lists used by the mnemonic invite format.
//!
//! A dictionary maps every 9-bit chunk to one word. Up to 16 of them can be
//! loaded at once; which one an invite used is itself encoded in the invite.

use crate::error::InviteError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const CHUNK_BITS: usize = 9;
pub const ID_BITS: usize = 4;
pub const WORD_COUNT: usize = 1 << CHUNK_BITS;
pub const MAX_DICTIONARIES: usize = 1 << ID_BITS;

/// Leading characters of a word that may carry metadata through their case.
pub const CASED_PREFIX_LEN: usize = 3;

const SEPARATOR: char = '-';

static EMBEDDED_WORD_LISTS: [&str; MAX_DICTIONARIES] = [
    include_str!("../words/words_0.txt"),
    include_str!("../words/words_1.txt"),
    include_str!("../words/words_2.txt"),
    include_str!("../words/words_3.txt"),
    include_str!("../words/words_4.txt"),
    include_str!("../words/words_5.txt"),
    include_str!("../words/words_6.txt"),
    include_str!("../words/words_7.txt"),
    include_str!("../words/words_8.txt"),
    include_str!("../words/words_9.txt"),
    include_str!("../words/words_10.txt"),
    include_str!("../words/words_11.txt"),
    include_str!("../words/words_12.txt"),
    include_str!("../words/words_13.txt"),
    include_str!("../words/words_14.txt"),
    include_str!("../words/words_15.txt"),
];

lazy_static::lazy_static! {
    static ref BUNDLED: Result<Arc<DictionarySet>, InviteError> =
        DictionarySet::load(None, &EMBEDDED_WORD_LISTS, WORD_COUNT, ID_BITS).map(Arc::new);
}

/// The dictionaries compiled into the crate, loaded once per process.
pub fn bundled() -> Result<Arc<DictionarySet>, InviteError> {
    BUNDLED.clone()
}

pub fn embedded_word_lists() -> &'static [&'static str] {
    &EMBEDDED_WORD_LISTS
}

pub fn word_list_file(dir: &Path, id: usize) -> PathBuf {
    dir.join(format!("words_{}.txt", id))
}

fn check_word(idx: usize, word: &str) -> Result<(), InviteError> {
    let cased_prefix_ok = word.chars().count() >= CASED_PREFIX_LEN
        && word
            .chars()
            .take(CASED_PREFIX_LEN)
            .all(|c| c.is_ascii_alphabetic());
    if !cased_prefix_ok {
        return Err(InviteError::InvalidDictionary {
            reason: format!(
                "word {} ('{}') must start with {} ASCII letters",
                idx, word, CASED_PREFIX_LEN
            ),
        });
    }
    if word.contains(SEPARATOR) || word.contains(char::is_whitespace) {
        return Err(InviteError::InvalidDictionary {
            reason: format!("word {} ('{}') contains a separator or whitespace", idx, word),
        });
    }
    Ok(())
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Dictionary {
    id: usize,
    words: Vec<String>,
    index: HashMap<String, usize>,
}

impl Dictionary {
    /// Builds a dictionary from newline-separated text.
    ///
    /// Lines are trimmed and lower-cased, blank lines skipped, and the result
    /// truncated to `required` words. The list is rejected unless exactly
    /// `required` distinct, usable words remain.
    pub fn from_lines(id: usize, text: &str, required: usize) -> Result<Self, InviteError> {
        let words: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_lowercase)
            .take(required)
            .collect();
        Self::from_words(id, words, required)
    }

    pub fn from_words(id: usize, words: Vec<String>, required: usize) -> Result<Self, InviteError> {
        if words.len() != required {
            return Err(InviteError::InvalidDictionary {
                reason: format!("expected {} words but found {}", required, words.len()),
            });
        }
        let mut index = HashMap::with_capacity(words.len());
        for (idx, word) in words.iter().enumerate() {
            check_word(idx, word)?;
            if let Some(first) = index.insert(word.to_lowercase(), idx) {
                return Err(InviteError::InvalidDictionary {
                    reason: format!("word {} ('{}') repeats word {}", idx, word, first),
                });
            }
        }
        let words = words.into_iter().map(|w| w.to_lowercase()).collect();
        Ok(Self { id, words, index })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn word(&self, index: usize) -> Option<&str> {
        self.words.get(index).map(String::as_str)
    }

    /// Case-insensitive reverse lookup.
    pub fn index_of(&self, word: &str) -> Option<usize> {
        self.index.get(&word.to_lowercase()).copied()
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct DictionarySet {
    lists: Vec<Dictionary>,
}

impl DictionarySet {
    pub fn from_dictionaries(lists: Vec<Dictionary>) -> Result<Self, InviteError> {
        if lists.is_empty() {
            return Err(InviteError::NoDictionary);
        }
        Ok(Self { lists })
    }

    /// Loads up to `2^id_bits` word lists.
    ///
    /// For each id the embedded text (if any) is tried first, then
    /// `dir/words_{id}.txt`. Invalid lists are skipped with a warning; a
    /// missing list ends the scan. Accepted lists are numbered in load order.
    pub fn load(
        dir: Option<&Path>,
        embedded: &[&str],
        required: usize,
        id_bits: usize,
    ) -> Result<Self, InviteError> {
        let max_id = 1usize << id_bits;
        let mut lists: Vec<Dictionary> = Vec::new();
        for id in 0..max_id {
            if let Some(text) = embedded.get(id) {
                match Dictionary::from_lines(lists.len(), text, required) {
                    Ok(dict) => {
                        lists.push(dict);
                        continue;
                    }
                    Err(e) => {
                        log::warn!("Bundled word list {} was rejected: {}", id, e);
                    }
                }
            }
            let path = match dir {
                Some(dir) => word_list_file(dir, id),
                None => {
                    log::debug!("No word list available for id {}; stopping.", id);
                    break;
                }
            };
            if !path.is_file() {
                if id > 0 {
                    log::warn!(
                        "Word list file {} not found; stopping the search.",
                        path.display()
                    );
                }
                break;
            }
            let text = match std::fs::read_to_string(&path) {
                Ok(t) => t,
                Err(e) => {
                    log::warn!("Error reading word list {}: {}", path.display(), e);
                    continue;
                }
            };
            match Dictionary::from_lines(lists.len(), &text, required) {
                Ok(dict) => lists.push(dict),
                Err(e) => log::warn!("Word list {} was ignored: {}", path.display(), e),
            }
        }
        log::debug!("Loaded {} word lists.", lists.len());
        Self::from_dictionaries(lists)
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    pub fn get(&self, id: usize) -> Result<&Dictionary, InviteError> {
        self.lists.get(id).ok_or(InviteError::UnknownDictionary {
            id,
            loaded: self.lists.len(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dictionary> {
        self.lists.iter()
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use std::fs;

    /// Builds `count` distinct words whose letters spell `idx` in base 26,
    /// prefixed by a per-dictionary tag letter.
    pub(crate) fn synthetic_words(tag: char, count: usize) -> Vec<String> {
        (0..count)
            .map(|idx| {
                let mut word = String::new();
                word.push(tag);
                let mut left = idx;
                for _ in 0..3 {
                    word.push((b'a' + (left % 26) as u8) as char);
                    left /= 26;
                }
                word
            })
            .collect()
    }

    pub(crate) fn synthetic_set(count: usize) -> DictionarySet {
        let lists = (0..count)
            .map(|id| {
                let tag = (b'a' + id as u8) as char;
                Dictionary::from_words(id, synthetic_words(tag, WORD_COUNT), WORD_COUNT).unwrap()
            })
            .collect();
        DictionarySet::from_dictionaries(lists).unwrap()
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "ipinvite-{}-{}-{}",
            name,
            std::process::id(),
            rand::random::<u32>()
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_bundled_lists() {
        let set = bundled().unwrap();
        assert_eq!(set.len(), MAX_DICTIONARIES);
        for (id, dict) in set.iter().enumerate() {
            assert_eq!(dict.id(), id);
            assert_eq!(dict.len(), WORD_COUNT);
        }
        assert!(Arc::ptr_eq(&bundled().unwrap(), &set));
    }

    #[test]
    fn test_from_lines_normalizes() {
        let mut text = String::from("\n  Alpha \n\nBRAVO\n");
        for word in synthetic_words('x', 10) {
            text.push_str(&word);
            text.push('\n');
        }
        let dict = Dictionary::from_lines(0, &text, 5).unwrap();
        assert_eq!(dict.word(0), Some("alpha"));
        assert_eq!(dict.word(1), Some("bravo"));
        assert_eq!(dict.index_of("BrAvO"), Some(1));
        assert_eq!(dict.index_of("charlie"), None);
        assert_eq!(dict.len(), 5);
    }

    #[test]
    fn test_rejects_bad_lists() {
        let short = synthetic_words('a', 10).join("\n");
        assert!(Dictionary::from_lines(0, &short, 11).is_err());

        let mut dupes = synthetic_words('a', 10);
        dupes[3] = dupes[7].to_uppercase();
        assert!(Dictionary::from_lines(0, &dupes.join("\n"), 10).is_err());

        let mut tiny = synthetic_words('a', 10);
        tiny[0] = "ox".to_owned();
        assert!(Dictionary::from_words(0, tiny, 10).is_err());

        let mut dashed = synthetic_words('a', 10);
        dashed[0] = "well-known".to_owned();
        assert!(Dictionary::from_words(0, dashed, 10).is_err());
    }

    fn rejection_reason(res: Result<Dictionary, InviteError>) -> String {
        match res {
            Err(InviteError::InvalidDictionary { reason }) => reason,
            other => panic!("expected a rejected list, got {:?}", other),
        }
    }

    #[test]
    fn test_rejection_names_the_word() {
        let mut words = synthetic_words('a', 10);
        words[6] = "a1".to_owned();
        let reason = rejection_reason(Dictionary::from_words(0, words, 10));
        assert!(reason.starts_with("word 6 ('a1')"), "{}", reason);

        let mut words = synthetic_words('a', 10);
        words[8] = "tab bed".to_owned();
        let reason = rejection_reason(Dictionary::from_words(0, words, 10));
        assert!(reason.starts_with("word 8 "), "{}", reason);

        let mut words = synthetic_words('a', 10);
        words[9] = words[2].clone();
        let reason = rejection_reason(Dictionary::from_words(0, words, 10));
        assert!(reason.contains("word 9") && reason.ends_with("repeats word 2"), "{}", reason);
    }

    #[test]
    fn test_unknown_id() {
        let set = synthetic_set(2);
        assert!(set.get(1).is_ok());
        assert_eq!(
            set.get(2).unwrap_err(),
            InviteError::UnknownDictionary { id: 2, loaded: 2 }
        );
    }

    #[test]
    fn test_load_embedded_then_directory() {
        let dir = scratch_dir("load");
        let embedded_text = synthetic_words('e', 8).join("\n");
        fs::write(word_list_file(&dir, 1), synthetic_words('f', 8).join("\n")).unwrap();
        fs::write(word_list_file(&dir, 2), synthetic_words('g', 8).join("\n")).unwrap();
        // A gap at id 3 stops the scan even though id 4 exists.
        fs::write(word_list_file(&dir, 4), synthetic_words('h', 8).join("\n")).unwrap();

        let set = DictionarySet::load(Some(dir.as_path()), &[embedded_text.as_str()], 8, ID_BITS).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.get(0).unwrap().word(0), Some("eaaa"));
        assert_eq!(set.get(1).unwrap().word(0), Some("faaa"));
        assert_eq!(set.get(2).unwrap().word(0), Some("gaaa"));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_skips_invalid_list() {
        let dir = scratch_dir("skip");
        fs::write(word_list_file(&dir, 0), synthetic_words('a', 8).join("\n")).unwrap();
        fs::write(word_list_file(&dir, 1), "too\nfew\nwords").unwrap();
        fs::write(word_list_file(&dir, 2), synthetic_words('c', 8).join("\n")).unwrap();

        let set = DictionarySet::load(Some(dir.as_path()), &[], 8, ID_BITS).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(1).unwrap().word(0), Some("caaa"));
        assert_eq!(set.get(1).unwrap().id(), 1);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_nothing() {
        let dir = scratch_dir("empty");
        assert_eq!(
            DictionarySet::load(Some(dir.as_path()), &[], 8, ID_BITS),
            Err(InviteError::NoDictionary)
        );
        assert_eq!(
            DictionarySet::load(None, &[], 8, ID_BITS),
            Err(InviteError::NoDictionary)
        );
        fs::remove_dir_all(&dir).unwrap();
    }
}
