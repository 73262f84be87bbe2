//! Language handling for stored copy.
//!
//! - `registry`: the canonical language codes and their metadata
//! - `language`: `Language`, a code validated against the registry
//! - `normalizer`: maps raw labels ("ES_ES", "Español", "spa") to a `Language`
//!
//! # Example
//!
//! ```rust
//! use copydesk::i18n::{normalize, Language};
//!
//! assert_eq!(normalize("ES_ES"), Some(Language::SPANISH));
//! assert_eq!(normalize("klingon"), None);
//! ```

mod language;
mod normalizer;
mod registry;

pub use language::Language;
pub use normalizer::{is_canonical, normalize};
pub use registry::{LanguageConfig, LanguageRegistry};
