use crate::dictionary::{self, DictionarySet, ID_BITS, WORD_COUNT};
use crate::error::InviteError;
use crate::formats::InviteFormat;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 60000;
pub const DEFAULT_GREETING: &str = "Hello from ipinvite!";

#[derive(Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "jsonconfig", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "jsonconfig", serde(default))]
pub struct InviteConfig {
    /// Directory searched for `words_{id}.txt` for ids with no bundled list.
    /// Every id has a bundled list, so it is only read with
    /// `use_bundled_words` off.
    pub words_dir: Option<PathBuf>,
    pub use_bundled_words: bool,
    pub dictionary_id: usize,
    pub port: u16,
    pub connect_timeout_ms: u64,
    pub stun_timeout_ms: u64,
    pub greeting: String,
    /// Formats `generate` prints; empty means every registered one.
    pub formats: Vec<InviteFormat>,
    pub verbosity: u8,
}

impl InviteConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(feature = "jsonconfig")]
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> crate::DynResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let retvl = serde_json::from_str(&text)?;
        Ok(retvl)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn stun_timeout(&self) -> Duration {
        Duration::from_millis(self.stun_timeout_ms)
    }

    /// The shared bundled set when nothing was customised, otherwise a fresh load.
    pub fn load_dictionaries(&self) -> Result<Arc<DictionarySet>, InviteError> {
        if self.use_bundled_words && self.words_dir.is_none() {
            return dictionary::bundled();
        }
        let embedded: &[&str] = if self.use_bundled_words {
            dictionary::embedded_word_lists()
        } else {
            &[]
        };
        DictionarySet::load(self.words_dir.as_deref(), embedded, WORD_COUNT, ID_BITS).map(Arc::new)
    }
}

impl Default for InviteConfig {
    fn default() -> Self {
        Self {
            words_dir: None,
            use_bundled_words: true,
            dictionary_id: 0,
            port: DEFAULT_PORT,
            connect_timeout_ms: 5000,
            stun_timeout_ms: 5000,
            greeting: DEFAULT_GREETING.to_owned(),
            formats: Vec::new(),
            verbosity: 0,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dictionary::test::synthetic_words;

    #[test]
    fn test_defaults() {
        let conf = InviteConfig::new();
        assert_eq!(conf.port, 60000);
        assert_eq!(conf.connect_timeout(), Duration::from_secs(5));
        let dicts = conf.load_dictionaries().unwrap();
        assert!(Arc::ptr_eq(&dicts, &dictionary::bundled().unwrap()));
    }

    #[test]
    fn test_no_words_anywhere() {
        let conf = InviteConfig {
            use_bundled_words: false,
            ..InviteConfig::default()
        };
        assert_eq!(conf.load_dictionaries(), Err(InviteError::NoDictionary));
    }

    #[test]
    fn test_words_dir_behind_bundled_lists() {
        let dir = std::env::temp_dir().join(format!(
            "ipinvite-words-{}-{}",
            std::process::id(),
            rand::random::<u32>()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let custom = synthetic_words('q', WORD_COUNT).join("\n");
        std::fs::write(dictionary::word_list_file(&dir, 0), custom).unwrap();

        let with_bundled = InviteConfig {
            words_dir: Some(dir.clone()),
            ..InviteConfig::default()
        };
        let dicts = with_bundled.load_dictionaries().unwrap();
        let bundled = dictionary::bundled().unwrap();
        assert_eq!(dicts.len(), bundled.len());
        assert_eq!(dicts.get(0).unwrap().word(0), bundled.get(0).unwrap().word(0));

        let dir_only = InviteConfig {
            use_bundled_words: false,
            ..with_bundled
        };
        let dicts = dir_only.load_dictionaries().unwrap();
        std::fs::remove_dir_all(&dir).unwrap();
        assert_eq!(dicts.len(), 1);
        assert_eq!(dicts.get(0).unwrap().word(0), Some("qaaa"));
    }

    #[cfg(feature = "jsonconfig")]
    #[test]
    fn test_json_file() {
        let path = std::env::temp_dir().join(format!(
            "ipinvite-config-{}-{}.json",
            std::process::id(),
            rand::random::<u32>()
        ));
        std::fs::write(
            &path,
            r#"{ "port": 4242, "dictionary_id": 3, "formats": ["words", "hex"] }"#,
        )
        .unwrap();
        let parsed = InviteConfig::from_json_file(&path);
        std::fs::remove_file(&path).unwrap();
        // "hex" is only a command-line alias.
        assert!(parsed.is_err());

        std::fs::write(
            &path,
            r#"{ "port": 4242, "dictionary_id": 3, "formats": ["words", "base16"] }"#,
        )
        .unwrap();
        let conf = InviteConfig::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(conf.port, 4242);
        assert_eq!(conf.dictionary_id, 3);
        assert_eq!(conf.formats, vec![InviteFormat::Words, InviteFormat::Base16]);
        assert_eq!(conf.greeting, DEFAULT_GREETING);
        assert!(conf.use_bundled_words);
    }
}
