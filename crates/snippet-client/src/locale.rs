//! Locale format conversion between the frontend (`en-GB`) and the
//! execution service (`en_GB`).

/// Locale sent when the request carries none.
pub const DEFAULT_BACKEND_LOCALE: &str = "en_GB";

/// Replace the first `-` with `_`.
pub fn to_backend_format(locale: &str) -> String {
    locale.replacen('-', "_", 1)
}

/// Replace the first `_` with `-`.
pub fn to_frontend_format(locale: &str) -> String {
    locale.replacen('_', "-", 1)
}

/// Locale as the execution service expects it. Empty input yields
/// [`DEFAULT_BACKEND_LOCALE`]; values without `-` pass through.
pub fn normalize_to_backend(locale: &str) -> String {
    if locale.is_empty() {
        DEFAULT_BACKEND_LOCALE.to_string()
    } else if locale.contains('-') {
        to_backend_format(locale)
    } else {
        locale.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_first_separator_only() {
        assert_eq!(to_backend_format("en-GB"), "en_GB");
        assert_eq!(to_backend_format("zh-Hant-TW"), "zh_Hant-TW");
        assert_eq!(to_frontend_format("pt_BR"), "pt-BR");
        assert_eq!(to_frontend_format("en-GB"), "en-GB");
    }

    #[test]
    fn normalization() {
        assert_eq!(normalize_to_backend(""), "en_GB");
        assert_eq!(normalize_to_backend("de-DE"), "de_DE");
        assert_eq!(normalize_to_backend("fr_FR"), "fr_FR");
        assert_eq!(normalize_to_backend("es"), "es");
    }
}
