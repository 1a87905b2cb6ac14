//! Identifier management using string interning.
//!
//! Node, edge and combo identities travel through every layout run: the
//! projector copies them into a snapshot, strategies key their state by them
//! and the render bridge matches computed positions back to visual elements
//! with them. [`Id`] keeps that cheap by interning the underlying string once.

use std::{
    fmt,
    sync::{Mutex, MutexGuard, OnceLock},
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use string_interner::{DefaultStringInterner, DefaultSymbol};

static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn interner() -> MutexGuard<'static, DefaultStringInterner> {
    INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Interned identifier of a graph element.
///
/// # Examples
///
/// ```
/// use stagehand_core::identifier::Id;
///
/// let a = Id::new("node-a");
/// let b: Id = "node-a".into();
/// assert_eq!(a, b);
/// assert_eq!(a, "node-a");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Creates an `Id` from its string form, interning it on first use.
    pub fn new(name: &str) -> Self {
        Self(interner().get_or_intern(name))
    }

    /// Returns the string form of this identifier.
    pub fn as_string(&self) -> String {
        interner()
            .resolve(self.0)
            .map(str::to_string)
            .unwrap_or_default()
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

impl From<&str> for Id {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Id {
    fn from(name: String) -> Self {
        Self::new(&name)
    }
}

impl PartialEq<str> for Id {
    fn eq(&self, other: &str) -> bool {
        interner().resolve(self.0) == Some(other)
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_string())
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::new(&name))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_same_name_same_id() {
        let a = Id::new("alpha");
        let b = Id::new("alpha");
        let c = Id::new("beta");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_display_round_trips_name() {
        let id = Id::new("display_me");
        assert_eq!(id.to_string(), "display_me");
        assert_eq!(format!("{id}"), "display_me");
    }

    #[test]
    fn test_compare_with_str() {
        let id = Id::new("combo-1");
        assert!(id == "combo-1");
        assert!(id != "combo-2");

        let owned = String::from("combo-1");
        assert!(id == owned.as_str());
    }

    #[test]
    fn test_usable_as_map_key() {
        let mut map = HashMap::new();
        map.insert(Id::new("k1"), 1);
        map.insert(Id::new("k2"), 2);

        assert_eq!(map.get(&Id::new("k1")), Some(&1));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_deserialize_from_toml_string() {
        #[derive(Deserialize)]
        struct Holder {
            id: Id,
        }

        let holder: Holder = toml::from_str(r#"id = "from-toml""#).unwrap();
        assert_eq!(holder.id, "from-toml");
    }
}
