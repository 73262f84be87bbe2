//! Language type: a canonical language code validated against the registry.

use crate::i18n::{LanguageConfig, LanguageRegistry};
use std::fmt;

/// A canonical language.
///
/// Only codes present in the [`LanguageRegistry`] can be turned into a
/// `Language`, so holding one guarantees the code is canonical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Language {
    /// ISO 639-1 language code (e.g., "en", "es")
    code: &'static str,
}

impl Language {
    pub const ENGLISH: Language = Language { code: "en" };

    pub const SPANISH: Language = Language { code: "es" };

    pub const FRENCH: Language = Language { code: "fr" };

    /// Create a Language from an exact canonical code.
    ///
    /// Returns `None` when the code is not in the registry. No case folding
    /// or alias resolution happens here; see [`crate::i18n::normalize`].
    pub fn from_code(code: &str) -> Option<Language> {
        LanguageRegistry::get()
            .get_by_code(code)
            .map(|config| Language { code: config.code })
    }

    /// The ISO 639-1 code as a static string.
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Registry entry for this language, if the code is registered.
    ///
    /// Every constructor goes through the registry, so this is only `None`
    /// if a constant above drifts from the registry table.
    pub fn config(&self) -> Option<&'static LanguageConfig> {
        LanguageRegistry::get().get_by_code(self.code)
    }

    /// English name of the language.
    pub fn name(&self) -> &'static str {
        self.config().map(|config| config.name).unwrap_or(self.code)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code)
    }
}
