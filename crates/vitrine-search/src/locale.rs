//! Locale to language mapping.
//!
//! Many locales map to the same two-letter language code (`en_US` and `en_GB`
//! are both `en`). The language code suffixes text field names and selects a
//! stemming analyzer, when the index service ships a stemmer for it.

use std::collections::{BTreeMap, HashMap};

use vitrine_core::EngineConfig;

/// Stemmer languages available to the `snowball` token filter.
pub const SNOWBALL_LANGUAGES: &[&str] = &[
    "Armenian",
    "Basque",
    "Catalan",
    "Danish",
    "Dutch",
    "English",
    "Finnish",
    "French",
    "German",
    "Hungarian",
    "Italian",
    "Kp",
    "Lovins",
    "Norwegian",
    "Porter",
    "Portuguese",
    "Romanian",
    "Russian",
    "Spanish",
    "Swedish",
    "Turkish",
];

/// English display names of the built-in language codes.
const LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("cs", "Czech"),
    ("da", "Danish"),
    ("de", "German"),
    ("el", "Greek"),
    ("en", "English"),
    ("es", "Spanish"),
    ("fi", "Finnish"),
    ("fr", "French"),
    ("hu", "Hungarian"),
    ("it", "Italian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("nb", "Norwegian Bokmål"),
    ("nl", "Dutch"),
    ("pt", "Portuguese"),
    ("ro", "Romanian"),
    ("ru", "Russian"),
    ("sv", "Swedish"),
    ("th", "Thai"),
    ("tr", "Turkish"),
    ("zh", "Chinese"),
];

const DEFAULT_LANGUAGES: &[(&str, &[&str])] = &[
    ("cs", &["cs_CZ"]),
    ("da", &["da_DK"]),
    ("de", &["de_DE", "de_AT"]),
    ("el", &["el_GR"]),
    ("en", &["en_AU", "en_CA", "en_NZ", "en_GB", "en_US"]),
    (
        "es",
        &[
            "es_AR", "es_CL", "es_CO", "es_CR", "es_ES", "es_MX", "es_PA", "es_PE", "es_VE",
        ],
    ),
    ("fi", &["fi_FI"]),
    ("fr", &["fr_CA", "fr_FR"]),
    ("hu", &["hu_HU"]),
    ("it", &["it_IT", "it_CH"]),
    ("ja", &["ja_JP"]),
    ("ko", &["ko_KR"]),
    ("nb", &["nb_NO", "nn_NO"]),
    ("nl", &["nl_NL"]),
    ("pt", &["pt_BR", "pt_PT"]),
    ("ro", &["ro_RO"]),
    ("ru", &["ru_RU"]),
    ("sv", &["sv_SE"]),
    ("th", &["th_TH"]),
    ("tr", &["tr_TR"]),
    ("zh", &["zh_CN", "zh_HK", "zh_TW"]),
];

/// Locale → language lookup table.
#[derive(Debug, Clone)]
pub struct LanguageTable {
    languages: BTreeMap<String, Vec<String>>,
    by_locale: HashMap<String, String>,
}

impl Default for LanguageTable {
    fn default() -> Self {
        Self::new(
            DEFAULT_LANGUAGES
                .iter()
                .map(|(code, locales)| {
                    (
                        code.to_string(),
                        locales.iter().map(|l| l.to_string()).collect(),
                    )
                })
                .collect(),
        )
    }
}

impl LanguageTable {
    /// Build a table from language code → locales.
    pub fn new(languages: BTreeMap<String, Vec<String>>) -> Self {
        let by_locale = languages
            .iter()
            .flat_map(|(code, locales)| locales.iter().map(move |l| (l.clone(), code.clone())))
            .collect();
        Self {
            languages,
            by_locale,
        }
    }

    /// Configured table, or the built-in one when the config has none.
    pub fn from_config(config: &EngineConfig) -> Self {
        if config.languages.is_empty() {
            Self::default()
        } else {
            Self::new(config.languages.clone())
        }
    }

    /// Language code of `locale`, if the locale is mapped.
    pub fn language_of(&self, locale: &str) -> Option<&str> {
        self.by_locale.get(locale).map(String::as_str)
    }

    /// All language codes.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.languages.keys().map(String::as_str)
    }

    /// Stemmer language for a language code, when one exists.
    ///
    /// ```
    /// use vitrine_search::locale::LanguageTable;
    ///
    /// assert_eq!(LanguageTable::stemmer_language("fr"), Some("French"));
    /// assert_eq!(LanguageTable::stemmer_language("ja"), None);
    /// ```
    pub fn stemmer_language(code: &str) -> Option<&'static str> {
        LANGUAGE_NAMES
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, name)| *name)
            .filter(|name| SNOWBALL_LANGUAGES.contains(name))
    }
}

// ============================================================================
// Tests
// ============================================================================
