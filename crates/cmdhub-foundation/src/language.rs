//! Language code validation, POSIX locale parsing and language detection

use crate::error::{CmdhubError, Result};
use tracing::debug;

/// Language used when no source yields a valid code
pub const FALLBACK_LANGUAGE: &str = "en";

/// Check for exactly 2-3 lowercase ASCII letters
pub fn is_valid_language_code(code: &str) -> bool {
    (2..=3).contains(&code.len()) && code.bytes().all(|b| b.is_ascii_lowercase())
}

/// Trim and lowercase a language code, returning `None` if it is not 2-3 letters
pub fn sanitize_language_code(code: &str) -> Option<String> {
    let candidate = code.trim().to_ascii_lowercase();
    if is_valid_language_code(&candidate) {
        Some(candidate)
    } else {
        None
    }
}

/// Extract the language part of a POSIX locale string
///
/// `en_US.UTF-8@euro` becomes `en`. The `C` and `POSIX` locales carry no
/// language and are rejected.
pub fn parse_locale(locale: &str) -> Result<String> {
    let trimmed = locale.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("C")
        || trimmed.eq_ignore_ascii_case("POSIX")
    {
        return Err(CmdhubError::InvalidLocale {
            locale: locale.to_string(),
        });
    }

    let without_modifier = trimmed.split('@').next().unwrap_or_default();
    let without_encoding = without_modifier.split('.').next().unwrap_or_default();
    let language = without_encoding
        .split(['_', '-'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();

    if !is_valid_language_code(&language) {
        return Err(CmdhubError::InvalidLanguageCode { code: language });
    }

    Ok(language)
}

/// Candidate language sources, highest precedence first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectionContext {
    pub cli_flag: Option<String>,
    pub env_var: Option<String>,
    pub project_config: Option<String>,
    pub user_config: Option<String>,
    pub posix_locale: Option<String>,
}

impl DetectionContext {
    fn string_sources(&self) -> [(&'static str, Option<&str>); 4] {
        [
            ("cli", self.cli_flag.as_deref()),
            ("env", self.env_var.as_deref()),
            ("project", self.project_config.as_deref()),
            ("user", self.user_config.as_deref()),
        ]
    }
}

/// Pick the effective language. Never fails; falls back to `"en"`.
///
/// Invalid values at one level are skipped and lower levels are consulted.
pub fn detect(context: &DetectionContext) -> String {
    for (source, value) in context.string_sources() {
        let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
            continue;
        };
        match sanitize_language_code(value) {
            Some(code) => {
                debug!(source, language = %code, "Language resolved");
                return code;
            }
            None => debug!(source, value, "Skipping invalid language value"),
        }
    }

    if let Some(locale) = context.posix_locale.as_deref() {
        match parse_locale(locale) {
            Ok(code) => {
                debug!(source = "locale", language = %code, "Language resolved");
                return code;
            }
            Err(e) => debug!(locale, error = %e, "Ignoring unusable locale"),
        }
    }

    FALLBACK_LANGUAGE.to_string()
}

/// English display name for a language code, upper-cased code when unknown
pub fn language_display_name(code: &str) -> String {
    let name = match code {
        "en" => "English",
        "ja" => "Japanese",
        "zh" => "Chinese",
        "ko" => "Korean",
        "fr" => "French",
        "de" => "German",
        "es" => "Spanish",
        "it" => "Italian",
        "pt" => "Portuguese",
        "ru" => "Russian",
        "nl" => "Dutch",
        "pl" => "Polish",
        "tr" => "Turkish",
        "vi" => "Vietnamese",
        "ar" => "Arabic",
        "hi" => "Hindi",
        _ => return code.to_ascii_uppercase(),
    };
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_context() -> DetectionContext {
        DetectionContext {
            cli_flag: Some("ja".into()),
            env_var: Some("fr".into()),
            project_config: Some("es".into()),
            user_config: Some("de".into()),
            posix_locale: Some("it_IT.UTF-8".into()),
        }
    }

    #[test]
    fn test_sanitize_output_is_empty_or_valid() {
        let inputs = [
            "", " ", "EN", " fr ", "e", "engl", "e1", "日本", "zh-CN", "abc", "ABCD", "../",
        ];
        for input in inputs {
            if let Some(code) = sanitize_language_code(input) {
                assert!(is_valid_language_code(&code), "{input:?} -> {code:?}");
            }
        }
        assert_eq!(sanitize_language_code(" EN ").as_deref(), Some("en"));
        assert_eq!(sanitize_language_code("zh-CN"), None);
    }

    #[test]
    fn test_parse_locale() {
        assert_eq!(parse_locale("en_US.UTF-8@euro").unwrap(), "en");
        assert_eq!(parse_locale("pt-BR").unwrap(), "pt");
        assert_eq!(parse_locale("DE").unwrap(), "de");
        assert!(matches!(
            parse_locale("C"),
            Err(CmdhubError::InvalidLocale { .. })
        ));
        assert!(parse_locale("posix").is_err());
        assert!(parse_locale("").is_err());
        assert!(parse_locale("   ").is_err());
        assert!(matches!(
            parse_locale("english_US"),
            Err(CmdhubError::InvalidLanguageCode { .. })
        ));
    }

    #[test]
    fn test_precedence_chain() {
        let mut ctx = full_context();
        assert_eq!(detect(&ctx), "ja");
        ctx.cli_flag = None;
        assert_eq!(detect(&ctx), "fr");
        ctx.env_var = None;
        assert_eq!(detect(&ctx), "es");
        ctx.project_config = None;
        assert_eq!(detect(&ctx), "de");
        ctx.user_config = None;
        assert_eq!(detect(&ctx), "it");
        ctx.posix_locale = None;
        assert_eq!(detect(&ctx), "en");
    }

    #[test]
    fn test_invalid_level_is_skipped() {
        let ctx = DetectionContext {
            cli_flag: Some("klingon".into()),
            env_var: Some("".into()),
            project_config: Some("ES".into()),
            ..Default::default()
        };
        assert_eq!(detect(&ctx), "es");
    }

    #[test]
    fn test_detect_is_total() {
        let junk = [None, Some(""), Some("x"), Some("C"), Some("1234"), Some("@.")];
        for a in junk {
            for b in junk {
                let ctx = DetectionContext {
                    cli_flag: a.map(String::from),
                    env_var: b.map(String::from),
                    project_config: a.map(String::from),
                    user_config: b.map(String::from),
                    posix_locale: a.map(String::from),
                };
                assert_eq!(detect(&ctx), "en");
            }
        }
    }

    #[test]
    fn test_display_names() {
        assert_eq!(language_display_name("ja"), "Japanese");
        assert_eq!(language_display_name("xx"), "XX");
    }
}
