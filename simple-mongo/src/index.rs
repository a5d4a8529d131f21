//! Index declarations
//!
//! Models declare their indexes explicitly through
//! [`Model::indexes`](crate::Model::indexes). The compact tag grammar (`"1,unique"`,
//! `"ttl"`, `"2dsphere"`, ...) is still accepted through
//! [`IndexSpec::parse`] for declarations kept as strings:
//!
//! | attribute  | effect                                   |
//! |------------|------------------------------------------|
//! | `1` / `-1` | ascending / descending key               |
//! | `text`     | text index                               |
//! | `hashed`   | hashed index                             |
//! | `2dsphere` | spherical geo index                      |
//! | `2d`       | flat geo index                           |
//! | `ttl`      | ascending key expiring after N seconds   |
//! | `unique`   | unique constraint                        |
//! | `sparse`   | skip documents missing the field         |
//!
//! Unknown attributes are ignored and the last key attribute wins.

use std::time::Duration;

use bson::{Bson, Document};
use mongodb::options::IndexOptions;
use mongodb::IndexModel;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("TTL index on '{field}' needs an expiry in seconds")]
    MissingTtlSeconds { field: String },

    #[error("TTL seconds for '{field}' must be an integer, got '{value}'")]
    InvalidTtlSeconds { field: String, value: String },
}

/// Key type of a single-field index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Ascending,
    Descending,
    Text,
    Hashed,
    Sphere2d,
    Flat2d,
}

impl IndexKind {
    /// Value stored against the field in the index key document.
    pub fn key_value(self) -> Bson {
        match self {
            Self::Ascending => Bson::Int32(1),
            Self::Descending => Bson::Int32(-1),
            Self::Text => Bson::String("text".into()),
            Self::Hashed => Bson::String("hashed".into()),
            Self::Sphere2d => Bson::String("2dsphere".into()),
            Self::Flat2d => Bson::String("2d".into()),
        }
    }
}

/// Single-field index declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub field: String,
    pub kind: IndexKind,
    pub unique: bool,
    pub sparse: bool,
    pub expire_after: Option<Duration>,
}

impl IndexSpec {
    pub fn new(field: impl Into<String>, kind: IndexKind) -> Self {
        Self {
            field: field.into(),
            kind,
            unique: false,
            sparse: false,
            expire_after: None,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, IndexKind::Ascending)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, IndexKind::Descending)
    }

    /// Ascending index whose documents expire `seconds` after the field's time.
    pub fn ttl(field: impl Into<String>, seconds: u64) -> Self {
        Self::asc(field).expire_after(Duration::from_secs(seconds))
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn sparse(mut self) -> Self {
        self.sparse = true;
        self
    }

    pub fn expire_after(mut self, ttl: Duration) -> Self {
        self.expire_after = Some(ttl);
        self
    }

    /// Parse a tag such as `"1,unique"` for `field`.
    ///
    /// Returns `Ok(None)` when the field name is blank or the tag carries no
    /// key attribute. `ttl_seconds` is the companion expiry required by `ttl`.
    pub fn parse(
        field: &str,
        tag: &str,
        ttl_seconds: Option<&str>,
    ) -> Result<Option<Self>, IndexError> {
        let field = field.trim();
        if field.is_empty() || field == "-" {
            return Ok(None);
        }

        let mut kind = None;
        let mut unique = false;
        let mut sparse = false;
        let mut expire_after = None;

        for attr in tag.split(',').map(str::trim) {
            match attr {
                "1" => kind = Some(IndexKind::Ascending),
                "-1" => kind = Some(IndexKind::Descending),
                "text" => kind = Some(IndexKind::Text),
                "hashed" => kind = Some(IndexKind::Hashed),
                "2dsphere" => kind = Some(IndexKind::Sphere2d),
                "2d" => kind = Some(IndexKind::Flat2d),
                "unique" => unique = true,
                "sparse" => sparse = true,
                "ttl" => {
                    kind = Some(IndexKind::Ascending);
                    let raw = ttl_seconds
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .ok_or_else(|| IndexError::MissingTtlSeconds {
                            field: field.to_owned(),
                        })?;
                    let seconds: u64 =
                        raw.parse().map_err(|_| IndexError::InvalidTtlSeconds {
                            field: field.to_owned(),
                            value: raw.to_owned(),
                        })?;
                    expire_after = Some(Duration::from_secs(seconds));
                }
                _ => continue,
            }
        }

        Ok(kind.map(|kind| Self {
            field: field.to_owned(),
            kind,
            unique,
            sparse,
            expire_after,
        }))
    }

    pub fn keys(&self) -> Document {
        let mut keys = Document::new();
        keys.insert(self.field.clone(), self.kind.key_value());
        keys
    }

    pub fn options(&self) -> IndexOptions {
        let mut opts = IndexOptions::default();
        if self.unique {
            opts.unique = Some(true);
        }
        if self.sparse {
            opts.sparse = Some(true);
        }
        opts.expire_after = self.expire_after;
        opts
    }

    pub fn to_model(&self) -> IndexModel {
        IndexModel::builder()
            .keys(self.keys())
            .options(self.options())
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn ascending_unique() {
        let spec = IndexSpec::parse("email", "1,unique", None).unwrap().unwrap();
        assert_eq!(spec, IndexSpec::asc("email").unique());
        assert_eq!(spec.keys(), doc! { "email": 1 });
        assert_eq!(spec.options().unique, Some(true));
        assert_eq!(spec.options().sparse, None);
    }

    #[test]
    fn attributes_are_trimmed() {
        let spec = IndexSpec::parse("score", " -1 , sparse ", None).unwrap().unwrap();
        assert_eq!(spec.kind, IndexKind::Descending);
        assert!(spec.sparse);
    }

    #[test]
    fn special_kinds() {
        for (tag, value) in [
            ("text", Bson::String("text".into())),
            ("hashed", Bson::String("hashed".into())),
            ("2dsphere", Bson::String("2dsphere".into())),
            ("2d", Bson::String("2d".into())),
        ] {
            let spec = IndexSpec::parse("loc", tag, None).unwrap().unwrap();
            assert_eq!(spec.keys().get("loc"), Some(&value), "tag {}", tag);
        }
    }

    #[test]
    fn ttl_requires_seconds() {
        let err = IndexSpec::parse("expires_at", "ttl", None).unwrap_err();
        assert_eq!(
            err,
            IndexError::MissingTtlSeconds {
                field: "expires_at".into()
            }
        );

        let err = IndexSpec::parse("expires_at", "ttl", Some("soon")).unwrap_err();
        assert!(matches!(err, IndexError::InvalidTtlSeconds { .. }));
    }

    #[test]
    fn ttl_with_seconds() {
        let spec = IndexSpec::parse("expires_at", "ttl", Some("3600"))
            .unwrap()
            .unwrap();
        assert_eq!(spec, IndexSpec::ttl("expires_at", 3600));
        assert_eq!(spec.options().expire_after, Some(Duration::from_secs(3600)));
        assert_eq!(spec.keys(), doc! { "expires_at": 1 });
    }

    #[test]
    fn no_key_attribute_means_no_index() {
        assert_eq!(IndexSpec::parse("name", "unique", None).unwrap(), None);
        assert_eq!(IndexSpec::parse("name", "bogus", None).unwrap(), None);
    }

    #[test]
    fn blank_field_is_skipped() {
        assert_eq!(IndexSpec::parse("", "1", None).unwrap(), None);
        assert_eq!(IndexSpec::parse("-", "1", None).unwrap(), None);
    }

    #[test]
    fn last_key_attribute_wins() {
        let spec = IndexSpec::parse("f", "1,hashed", None).unwrap().unwrap();
        assert_eq!(spec.kind, IndexKind::Hashed);
    }
}
