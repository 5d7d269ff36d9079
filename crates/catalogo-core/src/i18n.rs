//! Multilingual text fields.
//!
//! A few registry portals return titles and descriptions as language-keyed
//! objects (`{"es": "...", "en": "..."}`) instead of plain strings, sometimes
//! with `null` for missing translations.

use serde::Deserialize;
use std::collections::BTreeMap;

/// A text value that may be plain or keyed by language code.
///
/// # Examples
///
/// ```
/// use catalogo_core::LocalizedText;
///
/// let plain: LocalizedText = serde_json::from_str(r#""Presupuesto""#).unwrap();
/// assert_eq!(plain.resolve("en"), "Presupuesto");
///
/// let multi: LocalizedText =
///     serde_json::from_str(r#"{"es": "Presupuesto", "en": "Budget", "pt": null}"#).unwrap();
/// assert_eq!(multi.resolve("es"), "Presupuesto");
/// assert_eq!(multi.resolve("pt"), "Budget");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LocalizedText {
    Plain(String),
    Multilingual(BTreeMap<String, Option<String>>),
}

impl LocalizedText {
    /// Picks one string for `language`.
    ///
    /// Order: plain value; requested language; `"en"`; first non-empty
    /// translation in key order; empty string.
    pub fn resolve(&self, language: &str) -> String {
        match self {
            LocalizedText::Plain(s) => s.clone(),
            LocalizedText::Multilingual(map) => {
                let pick = |lang: &str| {
                    map.get(lang)
                        .and_then(|v| v.as_deref())
                        .filter(|s| !s.is_empty())
                };
                pick(language)
                    .or_else(|| pick("en"))
                    .or_else(|| {
                        map.values()
                            .filter_map(|v| v.as_deref())
                            .find(|s| !s.is_empty())
                    })
                    .unwrap_or_default()
                    .to_string()
            }
        }
    }
}

impl From<&str> for LocalizedText {
    fn from(s: &str) -> Self {
        LocalizedText::Plain(s.to_string())
    }
}
