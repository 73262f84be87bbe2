//! Raw language label normalization.
//!
//! Stored copy accumulated language values from several sources: bare codes,
//! locale-qualified codes ("en-US", "pt_BR"), ISO 639-2 codes ("spa", "ger")
//! and spelled-out names in a handful of languages ("Spanish", "Español",
//! "espagnol"). [`normalize`] folds all of these into a canonical [`Language`].

use super::{Language, LanguageRegistry};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Labels longer than this are never treated as codes without a table lookup.
const MAX_CODE_LEN: usize = 3;

/// Lower-cased label -> canonical code.
const ALIASES: &[(&str, &str)] = &[
    // English
    ("eng", "en"),
    ("en-us", "en"),
    ("en_us", "en"),
    ("en-gb", "en"),
    ("en_gb", "en"),
    ("en-au", "en"),
    ("en_au", "en"),
    ("en-ca", "en"),
    ("en_ca", "en"),
    ("english", "en"),
    ("inglés", "en"),
    ("ingles", "en"),
    ("anglais", "en"),
    ("englisch", "en"),
    // Spanish
    ("spa", "es"),
    ("es-es", "es"),
    ("es_es", "es"),
    ("es-mx", "es"),
    ("es_mx", "es"),
    ("es-ar", "es"),
    ("es_ar", "es"),
    ("es-419", "es"),
    ("es_419", "es"),
    ("spanish", "es"),
    ("español", "es"),
    ("espanol", "es"),
    ("castellano", "es"),
    ("espagnol", "es"),
    ("spanisch", "es"),
    // French
    ("fra", "fr"),
    ("fre", "fr"),
    ("fr-fr", "fr"),
    ("fr_fr", "fr"),
    ("fr-ca", "fr"),
    ("fr_ca", "fr"),
    ("fr-be", "fr"),
    ("fr_be", "fr"),
    ("french", "fr"),
    ("français", "fr"),
    ("francais", "fr"),
    ("francés", "fr"),
    ("frances", "fr"),
    ("französisch", "fr"),
    ("franzosisch", "fr"),
    // German
    ("deu", "de"),
    ("ger", "de"),
    ("de-de", "de"),
    ("de_de", "de"),
    ("de-at", "de"),
    ("de_at", "de"),
    ("de-ch", "de"),
    ("de_ch", "de"),
    ("german", "de"),
    ("deutsch", "de"),
    ("alemán", "de"),
    ("aleman", "de"),
    ("allemand", "de"),
    // Italian
    ("ita", "it"),
    ("it-it", "it"),
    ("it_it", "it"),
    ("italian", "it"),
    ("italiano", "it"),
    ("italien", "it"),
    ("italienisch", "it"),
    // Portuguese
    ("por", "pt"),
    ("pt-pt", "pt"),
    ("pt_pt", "pt"),
    ("pt-br", "pt"),
    ("pt_br", "pt"),
    ("portuguese", "pt"),
    ("português", "pt"),
    ("portugues", "pt"),
    ("portugais", "pt"),
    ("portugiesisch", "pt"),
    // Dutch
    ("nld", "nl"),
    ("dut", "nl"),
    ("nl-nl", "nl"),
    ("nl_nl", "nl"),
    ("nl-be", "nl"),
    ("nl_be", "nl"),
    ("dutch", "nl"),
    ("nederlands", "nl"),
    ("holandés", "nl"),
    ("holandes", "nl"),
    ("néerlandais", "nl"),
    ("neerlandais", "nl"),
    ("niederländisch", "nl"),
    // Catalan
    ("cat", "ca"),
    ("ca-es", "ca"),
    ("ca_es", "ca"),
    ("catalan", "ca"),
    ("català", "ca"),
    ("catala", "ca"),
    ("catalán", "ca"),
    ("katalanisch", "ca"),
    // Japanese
    ("jpn", "ja"),
    ("ja-jp", "ja"),
    ("ja_jp", "ja"),
    ("jp", "ja"),
    ("japanese", "ja"),
    ("日本語", "ja"),
    ("japonés", "ja"),
    ("japones", "ja"),
    ("japonais", "ja"),
    ("japanisch", "ja"),
    // Chinese
    ("zho", "zh"),
    ("chi", "zh"),
    ("zh-cn", "zh"),
    ("zh_cn", "zh"),
    ("zh-tw", "zh"),
    ("zh_tw", "zh"),
    ("zh-hans", "zh"),
    ("zh_hans", "zh"),
    ("zh-hant", "zh"),
    ("zh_hant", "zh"),
    ("chinese", "zh"),
    ("中文", "zh"),
    ("chino", "zh"),
    ("chinois", "zh"),
    ("chinesisch", "zh"),
    // Korean
    ("kor", "ko"),
    ("ko-kr", "ko"),
    ("ko_kr", "ko"),
    ("kr", "ko"),
    ("korean", "ko"),
    ("한국어", "ko"),
    ("coreano", "ko"),
    ("coréen", "ko"),
    ("coreen", "ko"),
    ("koreanisch", "ko"),
    // Russian
    ("rus", "ru"),
    ("ru-ru", "ru"),
    ("ru_ru", "ru"),
    ("russian", "ru"),
    ("русский", "ru"),
    ("ruso", "ru"),
    ("russe", "ru"),
    ("russisch", "ru"),
    // Arabic
    ("ara", "ar"),
    ("ar-sa", "ar"),
    ("ar_sa", "ar"),
    ("ar-eg", "ar"),
    ("ar_eg", "ar"),
    ("arabic", "ar"),
    ("العربية", "ar"),
    ("árabe", "ar"),
    ("arabe", "ar"),
    ("arabisch", "ar"),
];

static ALIAS_TABLE: OnceLock<HashMap<&'static str, Language>> = OnceLock::new();

fn alias_table() -> &'static HashMap<&'static str, Language> {
    ALIAS_TABLE.get_or_init(|| {
        ALIASES
            .iter()
            .filter_map(|(alias, code)| Language::from_code(code).map(|lang| (*alias, lang)))
            .collect()
    })
}

/// Map a raw language label to its canonical language.
///
/// The label is trimmed and lower-cased first. Short labels that already are a
/// registry code come back unchanged; everything else goes through the alias
/// table. Returns `None` when the label cannot be mapped.
pub fn normalize(raw: &str) -> Option<Language> {
    let label = raw.trim().to_lowercase();

    if label.chars().count() <= MAX_CODE_LEN {
        if let Some(lang) = Language::from_code(&label) {
            return Some(lang);
        }
    }

    alias_table().get(label.as_str()).copied()
}

/// Whether a stored value is exactly a canonical code.
///
/// Values failing this check need a rewrite even when [`normalize`] would
/// accept them (e.g. `"EN"`).
pub fn is_canonical(stored: &str) -> bool {
    LanguageRegistry::get().contains(stored)
}
