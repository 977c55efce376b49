use std::collections::HashMap;
use std::path::Path;

/// Supported interface languages (ISO 639-1 code, native display name).
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("ru", "Русский"),
    ("de", "Deutsch"),
    ("zh", "中文"),
    ("be", "Беларуская"),
];

pub const DEFAULT_LANGUAGE: &str = "en";

pub fn is_supported(code: &str) -> bool {
    SUPPORTED_LANGUAGES.iter().any(|(c, _)| *c == code)
}

/// Picks the interface language from an ordered priority chain:
/// stored preference, then the client-reported locale, then the default.
pub fn resolve_language(stored: Option<&str>, client_reported: Option<&str>) -> String {
    [stored, client_reported]
        .into_iter()
        .flatten()
        .find(|code| is_supported(code))
        .unwrap_or(DEFAULT_LANGUAGE)
        .to_owned()
}

/// Translation tables keyed by language code.
///
/// Lookups never fail: a missing key renders as a visible `{key}`
/// placeholder and a missing or corrupt locale file degrades to an empty
/// table for that language.
pub struct Locales {
    languages: HashMap<String, HashMap<String, String>>,
}

impl Locales {
    pub fn empty() -> Self {
        Self {
            languages: HashMap::new(),
        }
    }

    /// Loads `<code>.json` for every supported language from `dir`.
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let mut languages = HashMap::new();

        for (code, _) in SUPPORTED_LANGUAGES {
            let path = dir.join(format!("{code}.json"));
            let table = match std::fs::read_to_string(&path) {
                Ok(raw) => match serde_json::from_str::<HashMap<String, String>>(&raw) {
                    Ok(table) => table,
                    Err(e) => {
                        log::error!("Invalid JSON in locale file {}: {e}", path.display());
                        HashMap::new()
                    }
                },
                Err(e) => {
                    log::warn!("Could not read locale file {}: {e}", path.display());
                    HashMap::new()
                }
            };
            languages.insert((*code).to_owned(), table);
        }

        Self { languages }
    }

    pub fn text(&self, key: &str, lang: &str) -> String {
        self.languages
            .get(lang)
            .and_then(|table| table.get(key))
            .cloned()
            .unwrap_or_else(|| format!("{{{key}}}"))
    }

    /// Looks up `key` and substitutes `{name}` placeholders.
    pub fn text_with(&self, key: &str, lang: &str, params: &[(&str, String)]) -> String {
        let mut out = self.text(key, lang);
        for (name, value) in params {
            out = out.replace(&format!("{{{name}}}"), value);
        }
        out
    }

    /// A comma-separated translation split into entries, e.g. weekday names.
    pub fn list(&self, key: &str, lang: &str) -> Vec<String> {
        self.text(key, lang)
            .split(',')
            .map(|entry| entry.trim().to_owned())
            .collect()
    }

    #[cfg(test)]
    pub fn insert(&mut self, lang: &str, key: &str, text: &str) {
        self.languages
            .entry(lang.to_owned())
            .or_default()
            .insert(key.to_owned(), text.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_language_wins_over_client_locale() {
        assert_eq!(resolve_language(Some("ru"), Some("de")), "ru");
    }

    #[test]
    fn client_locale_used_when_nothing_stored() {
        assert_eq!(resolve_language(None, Some("de")), "de");
    }

    #[test]
    fn unsupported_codes_fall_through_to_default() {
        assert_eq!(resolve_language(Some("fr"), Some("xx")), DEFAULT_LANGUAGE);
        assert_eq!(resolve_language(None, None), DEFAULT_LANGUAGE);
    }

    #[test]
    fn missing_key_renders_placeholder() {
        let locales = Locales::empty();
        assert_eq!(locales.text("drink.added", "en"), "{drink.added}");
    }

    #[test]
    fn params_are_substituted() {
        let mut locales = Locales::empty();
        locales.insert("en", "drink.added", "Added {amount} ml ({percent}%)");
        assert_eq!(
            locales.text_with(
                "drink.added",
                "en",
                &[("amount", "250".to_owned()), ("percent", "40".to_owned())]
            ),
            "Added 250 ml (40%)"
        );
    }

    #[test]
    fn list_splits_and_trims() {
        let mut locales = Locales::empty();
        locales.insert("en", "weekday", "Mon, Tue,Wed");
        assert_eq!(locales.list("weekday", "en"), vec!["Mon", "Tue", "Wed"]);
    }

    #[test]
    fn corrupt_locale_file_degrades_to_empty_table() {
        let dir = std::env::temp_dir().join(format!("aquatrack-i18n-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("en.json"), "{ not json").unwrap();
        std::fs::write(dir.join("ru.json"), r#"{"lang.changed": "Язык изменён"}"#).unwrap();

        let locales = Locales::load_from_dir(&dir);
        assert_eq!(locales.text("lang.changed", "en"), "{lang.changed}");
        assert_eq!(locales.text("lang.changed", "ru"), "Язык изменён");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
