//! Listing payload shared by both backends.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which marketplace side a listing belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Customer-to-customer listing, eligible for the remote path.
    C2c,
    /// Storefront product, always served locally.
    B2c,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::C2c => "c2c",
            SourceType::B2c => "b2c",
        }
    }

    /// Whether operations on this source type may be routed remotely.
    pub fn is_migrating(&self) -> bool {
        matches!(self, SourceType::C2c)
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognised source type string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid source_type '{0}' (must be 'c2c' or 'b2c')")]
pub struct InvalidSourceType(pub String);

impl FromStr for SourceType {
    type Err = InvalidSourceType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "c2c" => Ok(SourceType::C2c),
            "b2c" => Ok(SourceType::B2c),
            _ => Err(InvalidSourceType(s.to_string())),
        }
    }
}

/// A marketplace listing. The router treats it as opaque payload apart
/// from `id`, `source_type` and `user_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    #[serde(default)]
    pub id: i64,
    pub source_type: SourceType,
    /// Owner of the listing.
    pub user_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub category_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storefront_id: Option<i64>,
}

impl Listing {
    /// A new, not yet persisted listing (id 0).
    pub fn new(source_type: SourceType, user_id: i64, title: impl Into<String>, price: f64) -> Self {
        Self {
            id: 0,
            source_type,
            user_id,
            title: title.into(),
            description: String::new(),
            price,
            category_id: 0,
            condition: None,
            storefront_id: None,
        }
    }

    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = category_id;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_storefront(mut self, storefront_id: i64) -> Self {
        self.storefront_id = Some(storefront_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_type_parsing() {
        assert_eq!("c2c".parse::<SourceType>().unwrap(), SourceType::C2c);
        assert_eq!(" B2C ".parse::<SourceType>().unwrap(), SourceType::B2c);
        let err = "p2p".parse::<SourceType>().unwrap_err();
        assert!(err.to_string().contains("p2p"));
    }

    #[test]
    fn test_wire_shape() {
        let listing = Listing::new(SourceType::C2c, 9, "Bike", 120.0).with_category(3);
        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["source_type"], "c2c");
        assert!(json.get("storefront_id").is_none());

        let back: Listing = serde_json::from_str(
            r#"{"source_type":"b2c","user_id":1,"title":"Lamp","price":10.5,"storefront_id":4}"#,
        )
        .unwrap();
        assert_eq!(back.id, 0);
        assert_eq!(back.storefront_id, Some(4));
    }
}
