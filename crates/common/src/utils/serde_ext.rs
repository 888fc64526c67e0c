//! Serde helpers for query strings.
//!
//! Browsers and HTML forms send `?start_date=` for an untouched field; these helpers treat
//! such empty values as absent instead of failing the whole extraction.

use std::{fmt, str::FromStr};

use serde::{de, Deserialize, Deserializer};

/// Deserialize an optional value, mapping a missing or empty string to `None`.
pub fn empty_string_as_none<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let opt = Option::<String>::deserialize(de)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => FromStr::from_str(s).map_err(de::Error::custom).map(Some),
    }
}
