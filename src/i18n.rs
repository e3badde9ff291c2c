use std::fmt;

use actix_web::HttpRequest;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const SUPPORTED_LOCALES: [&str; 3] = ["en", "es", "pt"];
pub const DEFAULT_LOCALE: &str = "en";
pub const LOCALE_COOKIE: &str = "NEXT_LOCALE";

static ACCEPT_LANGUAGE_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z]{1,8}(?:[-_][A-Za-z0-9]{1,8})*|\*)\s*(?:;\s*q\s*=\s*([0-9](?:\.[0-9]{0,3})?))?\s*$")
        .expect("valid Accept-Language regex")
});

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Es,
    Pt,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Es => "es",
            Locale::Pt => "pt",
        }
    }

    /// Matches a language tag on its primary subtag: `pt-BR` is `pt`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let primary = tag
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        match primary.as_str() {
            "en" => Some(Locale::En),
            "es" => Some(Locale::Es),
            "pt" => Some(Locale::Pt),
            _ => None,
        }
    }

    /// English name of the language, as given to the analysis model.
    pub fn language_name(&self) -> &'static str {
        match self {
            Locale::En => "English",
            Locale::Es => "Spanish",
            Locale::Pt => "Portuguese",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn is_supported(code: &str) -> bool {
    SUPPORTED_LOCALES.contains(&code)
}

/// Locale named by the first path segment, only on an exact match.
pub fn locale_from_path(path: &str) -> Option<Locale> {
    let segment = path.trim_start_matches('/').split('/').next()?;
    if is_supported(segment) {
        Locale::from_tag(segment)
    } else {
        None
    }
}

/// Path with its locale prefix removed; `/` when nothing is left.
pub fn strip_locale(path: &str) -> &str {
    match locale_from_path(path) {
        Some(locale) => {
            let rest = &path.trim_start_matches('/')[locale.as_str().len()..];
            if rest.is_empty() {
                "/"
            } else {
                rest
            }
        }
        None => path,
    }
}

/// Highest-weighted supported language in an `Accept-Language` header.
/// Equal weights keep header order; `q=0` entries are refused.
pub fn parse_accept_language(header: &str) -> Option<Locale> {
    let mut entries: Vec<(Locale, f32)> = header
        .split(',')
        .filter_map(|entry| {
            let captures = ACCEPT_LANGUAGE_ENTRY.captures(entry)?;
            let locale = Locale::from_tag(captures.get(1)?.as_str())?;
            let quality = captures
                .get(2)
                .and_then(|q| q.as_str().parse::<f32>().ok())
                .unwrap_or(1.0);
            Some((locale, quality))
        })
        .filter(|(_, quality)| *quality > 0.0)
        .collect();

    entries.sort_by(|a, b| b.1.total_cmp(&a.1));
    entries.first().map(|(locale, _)| *locale)
}

/// Path prefix, then the locale cookie, then `Accept-Language`, then the
/// default.
pub fn resolve_locale(path: &str, cookie: Option<&str>, accept_language: Option<&str>) -> Locale {
    locale_from_path(path)
        .or_else(|| cookie.and_then(Locale::from_tag))
        .or_else(|| accept_language.and_then(parse_accept_language))
        .unwrap_or_default()
}

pub fn request_locale(req: &HttpRequest) -> Locale {
    let cookie = req.cookie(LOCALE_COOKIE);
    let accept = req
        .headers()
        .get(actix_web::http::header::ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok());

    resolve_locale(req.path(), cookie.as_ref().map(|c| c.value()), accept)
}
