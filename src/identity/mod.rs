//! Player identity resolution
//!
//! Resolves player ids to display names and back, coalescing concurrent
//! lookups and mirroring every discovered pair into both directions.

pub mod cache;
pub mod projection;
pub mod resolver;

pub use cache::IdentityCache;
pub use projection::ObservableName;
pub use resolver::TieredResolver;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Stable unique player identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(Uuid);

impl PlayerId {
    /// 32 hex digits without hyphens, as used in profile API paths and bodies
    pub fn dashless(&self) -> String {
        self.0.simple().to_string()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl FromStr for PlayerId {
    type Err = uuid::Error;

    /// Accepts both the dashless and the hyphenated form
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Serialize for PlayerId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0.simple())
    }
}

impl<'de> Deserialize<'de> for PlayerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Display name of a player, case preserved
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerName(String);

impl PlayerName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-folded lookup key for this name
    pub fn key(&self) -> NameKey {
        NameKey::new(&self.0)
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for PlayerName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Normalized (lower-cased) name used as the name->id map key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameKey(String);

impl NameKey {
    pub fn new(name: &str) -> Self {
        Self(name.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEVE: &str = "8667ba71b85a4004af54457a9734eed7";

    #[test]
    fn test_player_id_parses_both_forms() {
        let dashless: PlayerId = STEVE.parse().unwrap();
        let hyphenated: PlayerId = "8667ba71-b85a-4004-af54-457a9734eed7".parse().unwrap();
        assert_eq!(dashless, hyphenated);
        assert_eq!(dashless.dashless(), STEVE);
        assert_eq!(dashless.to_string(), "8667ba71-b85a-4004-af54-457a9734eed7");
    }

    #[test]
    fn test_player_id_serializes_dashless() {
        let id: PlayerId = STEVE.parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", STEVE));

        let back: PlayerId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_player_id_rejects_garbage() {
        assert!("not-a-uuid".parse::<PlayerId>().is_err());
        assert!(serde_json::from_str::<PlayerId>("\"zz\"").is_err());
    }

    #[test]
    fn test_name_key_folds_case_but_name_preserves_it() {
        let name = PlayerName::from("Notch");
        assert_eq!(name.as_str(), "Notch");
        assert_eq!(name.key(), NameKey::new("NOTCH"));
        assert_eq!(name.key().as_str(), "notch");
    }
}
