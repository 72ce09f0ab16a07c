//! Locales the card renderer has translations for.

const SUPPORTED_LOCALES: &[&str] = &[
    "ar", "bn", "cn", "cs", "de", "el", "en", "es", "fr", "hi", "hu", "id", "it", "ja", "kr",
    "ml", "my", "nl", "np", "pl", "pt-br", "pt-pt", "ru", "se", "sk", "tr", "uk-ua", "uz", "vi",
];

/// Case-insensitive membership test.
pub fn is_locale_available(locale: &str) -> bool {
    let lowered = locale.to_lowercase();
    SUPPORTED_LOCALES.contains(&lowered.as_str())
}
