//! Supported content languages and the complete per-locale string mapping
//! used by every domain entity.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    Fr,
    En,
    Ru,
}

impl Locale {
    pub const ALL: [Locale; 3] = [Locale::Fr, Locale::En, Locale::Ru];

    /// Locale that legacy single-language records were authored in.
    pub const ORIGIN: Locale = Locale::Fr;

    pub const fn code(self) -> &'static str {
        match self {
            Locale::Fr => "fr",
            Locale::En => "en",
            Locale::Ru => "ru",
        }
    }

    /// Suffix used by backends that store one sibling field per locale,
    /// e.g. `nameFr`.
    pub const fn camel_suffix(self) -> &'static str {
        match self {
            Locale::Fr => "Fr",
            Locale::En => "En",
            Locale::Ru => "Ru",
        }
    }

    /// Parse a locale code, ignoring case and any region tag (`en-US`, `fr_CA`).
    pub fn parse(value: &str) -> Option<Self> {
        let language = value
            .trim()
            .split(|c| c == '-' || c == '_')
            .next()?
            .to_ascii_lowercase();

        match language.as_str() {
            "fr" => Some(Locale::Fr),
            "en" => Some(Locale::En),
            "ru" => Some(Locale::Ru),
            _ => None,
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale::ORIGIN
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Locale::parse(s).ok_or_else(|| Error::Config(format!("Unsupported locale: {}", s)))
    }
}

/// One string per supported locale. Every locale is always present; a
/// missing translation is the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalizedContent {
    pub fr: String,
    pub en: String,
    pub ru: String,
}

impl LocalizedContent {
    pub fn new(fr: impl Into<String>, en: impl Into<String>, ru: impl Into<String>) -> Self {
        Self {
            fr: fr.into(),
            en: en.into(),
            ru: ru.into(),
        }
    }

    /// Content with only `locale` filled in.
    pub fn single(locale: Locale, value: impl Into<String>) -> Self {
        let mut content = Self::default();
        content.set(locale, value);
        content
    }

    pub fn get(&self, locale: Locale) -> &str {
        match locale {
            Locale::Fr => &self.fr,
            Locale::En => &self.en,
            Locale::Ru => &self.ru,
        }
    }

    /// Translation for `locale`, or the origin locale's text when it is empty.
    pub fn get_or_fallback(&self, locale: Locale) -> &str {
        let value = self.get(locale);
        if value.is_empty() {
            self.get(Locale::ORIGIN)
        } else {
            value
        }
    }

    pub fn set(&mut self, locale: Locale, value: impl Into<String>) {
        let slot = match locale {
            Locale::Fr => &mut self.fr,
            Locale::En => &mut self.en,
            Locale::Ru => &mut self.ru,
        };
        *slot = value.into();
    }

    pub fn is_empty(&self) -> bool {
        Locale::ALL.iter().all(|locale| self.get(*locale).is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Locale, &str)> + '_ {
        Locale::ALL.into_iter().map(move |locale| (locale, self.get(locale)))
    }
}

/// How a backend record happens to store one localized field.
#[derive(Debug, Clone, PartialEq)]
pub enum LocaleShape<'a> {
    /// `{"name": {"fr": "...", "en": "..."}}`
    Keyed(&'a Map<String, Value>),
    /// `{"nameFr": "...", "nameEn": "..."}` or `{"name_fr": ...}`
    Suffixed(Vec<(Locale, &'a str)>),
    /// Legacy single-language record: `{"name": "..."}`
    Bare(&'a str),
    Missing,
}

/// Naming convention for per-locale sibling fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuffixStyle {
    /// `nameFr`
    Camel,
    /// `name_fr`
    Snake,
}

impl SuffixStyle {
    pub fn field_name(self, field: &str, locale: Locale) -> String {
        match self {
            SuffixStyle::Camel => format!("{}{}", field, locale.camel_suffix()),
            SuffixStyle::Snake => format!("{}_{}", field, locale.code()),
        }
    }
}

impl<'a> LocaleShape<'a> {
    /// Inspect `doc` and report how `field` is stored.
    pub fn detect(doc: &'a Map<String, Value>, field: &str, style: SuffixStyle) -> Self {
        match doc.get(field) {
            Some(Value::Object(keyed)) => return LocaleShape::Keyed(keyed),
            Some(Value::String(bare)) => return LocaleShape::Bare(bare),
            _ => {}
        }

        let suffixed: Vec<(Locale, &str)> = Locale::ALL
            .iter()
            .filter_map(|locale| {
                doc.get(&style.field_name(field, *locale))
                    .and_then(Value::as_str)
                    .map(|value| (*locale, value))
            })
            .collect();

        if suffixed.is_empty() {
            LocaleShape::Missing
        } else {
            LocaleShape::Suffixed(suffixed)
        }
    }

    pub fn into_content(self) -> LocalizedContent {
        match self {
            LocaleShape::Keyed(keyed) => {
                let mut content = LocalizedContent::default();
                for (key, value) in keyed {
                    if let (Some(locale), Some(text)) = (Locale::parse(key), value.as_str()) {
                        content.set(locale, text);
                    }
                }
                content
            }
            LocaleShape::Suffixed(pairs) => {
                let mut content = LocalizedContent::default();
                for (locale, text) in pairs {
                    content.set(locale, text);
                }
                content
            }
            LocaleShape::Bare(text) => LocalizedContent::single(Locale::ORIGIN, text),
            LocaleShape::Missing => LocalizedContent::default(),
        }
    }
}

/// Read `field` from `doc` as a complete [`LocalizedContent`], whatever shape it is stored in.
pub fn localized(doc: &Map<String, Value>, field: &str, style: SuffixStyle) -> LocalizedContent {
    LocaleShape::detect(doc, field, style).into_content()
}

/// Structured per-locale values (rich text bodies), in the same three
/// shapes as [`localized`]. A bare value belongs to [`Locale::ORIGIN`].
pub fn localized_values(
    doc: &Map<String, Value>,
    field: &str,
    style: SuffixStyle,
) -> BTreeMap<Locale, Value> {
    let mut values = BTreeMap::new();

    match doc.get(field) {
        Some(Value::Object(keyed)) => {
            for (key, value) in keyed {
                if let Some(locale) = Locale::parse(key) {
                    if !value.is_null() {
                        values.insert(locale, value.clone());
                    }
                }
            }
        }
        Some(bare) if !bare.is_null() => {
            values.insert(Locale::ORIGIN, bare.clone());
        }
        _ => {
            for locale in Locale::ALL {
                if let Some(value) = doc.get(&style.field_name(field, locale)) {
                    if !value.is_null() {
                        values.insert(locale, value.clone());
                    }
                }
            }
        }
    }

    values
}
