//! Validated string identifiers: usernames, SKUs and URL slugs.
//!
//! Each of these is unique in the database, so they are parsed once at the
//! edge and carried around as newtypes.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Username`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UsernameError {
    #[error("username must be between {min} and {max} characters")]
    Length { min: usize, max: usize },
    #[error("username may only contain letters, digits, '_', '-' and '.'")]
    InvalidCharacter,
}

/// A customer or admin login name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    pub const MIN_LENGTH: usize = 3;
    pub const MAX_LENGTH: usize = 32;

    /// Parse a `Username`, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error for out-of-range lengths or disallowed characters.
    pub fn parse(s: &str) -> Result<Self, UsernameError> {
        let s = s.trim();
        if !(Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&s.len()) {
            return Err(UsernameError::Length {
                min: Self::MIN_LENGTH,
                max: Self::MAX_LENGTH,
            });
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        {
            return Err(UsernameError::InvalidCharacter);
        }
        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Errors that can occur when parsing a [`Sku`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SkuError {
    #[error("sku must be between {min} and {max} characters")]
    Length { min: usize, max: usize },
    #[error("sku may only contain letters, digits and '-'")]
    InvalidCharacter,
}

/// A stock keeping unit, stored uppercase.
///
/// ```
/// use aurelia_core::Sku;
///
/// assert_eq!(Sku::parse("rng-gold-07").unwrap().as_str(), "RNG-GOLD-07");
/// assert!(Sku::parse("r g").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Sku(String);

impl Sku {
    pub const MIN_LENGTH: usize = 3;
    pub const MAX_LENGTH: usize = 64;

    /// Parse a `Sku`, uppercasing it.
    ///
    /// # Errors
    ///
    /// Returns an error for out-of-range lengths or disallowed characters.
    pub fn parse(s: &str) -> Result<Self, SkuError> {
        let s = s.trim();
        if !(Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&s.len()) {
            return Err(SkuError::Length {
                min: Self::MIN_LENGTH,
                max: Self::MAX_LENGTH,
            });
        }
        if !s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(SkuError::InvalidCharacter);
        }
        Ok(Self(s.to_ascii_uppercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Errors that can occur when parsing a [`Slug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug must be between 1 and {max} characters")]
    Length { max: usize },
    #[error("slug may only contain lowercase letters, digits and single '-' separators")]
    InvalidFormat,
}

/// A URL-safe identifier for products and categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    pub const MAX_LENGTH: usize = 128;

    /// Parse an existing slug without altering it.
    ///
    /// # Errors
    ///
    /// Returns an error if the slug is empty, too long, or not in
    /// `lowercase-words-with-dashes` form.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        if s.is_empty() || s.len() > Self::MAX_LENGTH {
            return Err(SlugError::Length {
                max: Self::MAX_LENGTH,
            });
        }
        let well_formed = s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            && !s.starts_with('-')
            && !s.ends_with('-')
            && !s.contains("--");
        if !well_formed {
            return Err(SlugError::InvalidFormat);
        }
        Ok(Self(s.to_owned()))
    }

    /// Derive a slug from a display name ("Rose Gold Ring" -> "rose-gold-ring").
    ///
    /// # Errors
    ///
    /// Returns an error if the name has no ASCII letters or digits.
    pub fn from_name(name: &str) -> Result<Self, SlugError> {
        let mut slug = String::with_capacity(name.len());
        for c in name.chars() {
            if c.is_ascii_alphanumeric() {
                slug.push(c.to_ascii_lowercase());
            } else if !slug.is_empty() && !slug.ends_with('-') {
                slug.push('-');
            }
        }
        while slug.ends_with('-') {
            slug.pop();
        }
        slug.truncate(Self::MAX_LENGTH);
        while slug.ends_with('-') {
            slug.pop();
        }
        Self::parse(&slug)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! impl_string_conversions {
    ($name:ident, $err:ty) => {
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = $err;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        super::impl_pg_text!($name);
    };
}

impl_string_conversions!(Username, UsernameError);
impl_string_conversions!(Sku, SkuError);
impl_string_conversions!(Slug, SlugError);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_username_rules() {
        assert!(Username::parse("ada_lovelace").is_ok());
        assert!(Username::parse("j.doe-2").is_ok());
        assert_eq!(
            Username::parse("ab"),
            Err(UsernameError::Length { min: 3, max: 32 })
        );
        assert_eq!(
            Username::parse("has space"),
            Err(UsernameError::InvalidCharacter)
        );
        assert_eq!(Username::parse("  trimmed  ").unwrap().as_str(), "trimmed");
    }

    #[test]
    fn test_sku_uppercases() {
        assert_eq!(Sku::parse("neck-001").unwrap().as_str(), "NECK-001");
        assert_eq!(Sku::parse("ab"), Err(SkuError::Length { min: 3, max: 64 }));
        assert_eq!(Sku::parse("NECK_001"), Err(SkuError::InvalidCharacter));
    }

    #[test]
    fn test_slug_parse() {
        assert!(Slug::parse("rose-gold-ring").is_ok());
        assert!(Slug::parse("ring-2").is_ok());
        assert_eq!(Slug::parse(""), Err(SlugError::Length { max: 128 }));
        assert_eq!(Slug::parse("Rose"), Err(SlugError::InvalidFormat));
        assert_eq!(Slug::parse("-ring"), Err(SlugError::InvalidFormat));
        assert_eq!(Slug::parse("ring-"), Err(SlugError::InvalidFormat));
        assert_eq!(Slug::parse("rose--ring"), Err(SlugError::InvalidFormat));
    }

    #[test]
    fn test_slug_from_name() {
        assert_eq!(
            Slug::from_name("Rose Gold Ring").unwrap().as_str(),
            "rose-gold-ring"
        );
        assert_eq!(
            Slug::from_name("  Pearl & Diamond -- Earrings! ").unwrap().as_str(),
            "pearl-diamond-earrings"
        );
        assert!(Slug::from_name("***").is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let bad: Result<Sku, _> = serde_json::from_str("\"x\"");
        assert!(bad.is_err());
        let good: Sku = serde_json::from_str("\"brc-10\"").unwrap();
        assert_eq!(good.as_str(), "BRC-10");
    }
}
