//! Component keys
//!
//! A [`Key`] is a dot-separated, hierarchical identifier such as
//! `emails.welcome.operations.send`. The final segment doubles as the
//! default local name when the key is injected without a rename.

use std::borrow::Borrow;
use std::fmt;
use std::path::{Component, Path};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{DIError, DIResult};

/// Segment separator
pub const SEPARATOR: char = '.';

/// Immutable, cheaply clonable component key
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(Arc<str>);

impl Key {
    /// Parse and validate a key
    pub fn parse(raw: &str) -> DIResult<Self> {
        validate(raw)?;
        Ok(Self(Arc::from(raw)))
    }

    /// Derive a key from a path relative to a component root.
    ///
    /// `emails/welcome/operations/send.rs` becomes
    /// `emails.welcome.operations.send`. Only the final component loses its
    /// extension.
    pub fn from_relative_path(path: impl AsRef<Path>) -> DIResult<Self> {
        let path = path.as_ref();
        let invalid = |reason: &str| DIError::InvalidKey {
            key: path.display().to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => {
                    let part = part.to_str().ok_or_else(|| invalid("path is not valid UTF-8"))?;
                    segments.push(part.to_string());
                }
                Component::CurDir => {}
                _ => return Err(invalid("path must be relative and must not contain '..'")),
            }
        }

        let last = segments.pop().ok_or_else(|| invalid("path is empty"))?;
        let stem = match last.rsplit_once('.') {
            Some((stem, _ext)) if !stem.is_empty() => stem.to_string(),
            _ => last,
        };
        segments.push(stem);

        Self::parse(&segments.join("."))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate over the segments in order
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR)
    }

    /// Final segment, used as the default local name
    pub fn last_segment(&self) -> &str {
        self.0.rsplit(SEPARATOR).next().unwrap_or(&self.0)
    }

    /// Everything before the final segment, `None` for single-segment keys
    pub fn namespace(&self) -> Option<&str> {
        self.0.rsplit_once(SEPARATOR).map(|(ns, _)| ns)
    }

    /// Append a segment
    pub fn child(&self, segment: &str) -> DIResult<Self> {
        Self::parse(&format!("{}{}{}", self.0, SEPARATOR, segment))
    }

    /// True if `self` lives under the `namespace` prefix
    pub fn is_within(&self, namespace: &str) -> bool {
        self.0
            .strip_prefix(namespace)
            .map(|rest| rest.starts_with(SEPARATOR))
            .unwrap_or(false)
    }
}

/// A segment is a non-empty run of ASCII alphanumerics and underscores
pub(crate) fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn validate(raw: &str) -> DIResult<()> {
    let invalid = |reason: String| DIError::InvalidKey {
        key: raw.to_string(),
        reason,
    };

    if raw.is_empty() {
        return Err(invalid("key is empty".to_string()));
    }
    for (index, segment) in raw.split(SEPARATOR).enumerate() {
        if segment.is_empty() {
            return Err(invalid(format!("segment {} is empty", index)));
        }
        if !is_valid_segment(segment) {
            return Err(invalid(format!(
                "segment '{}' may only contain ASCII letters, digits and '_'",
                segment
            )));
        }
    }
    Ok(())
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({:?})", &*self.0)
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl FromStr for Key {
    type Err = DIError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for Key {
    type Error = DIError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<String> for Key {
    type Error = DIError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Key::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Anything that can be turned into a [`Key`]
///
/// Implemented for string types (validated on conversion) and for keys.
pub trait IntoKey {
    fn into_key(self) -> DIResult<Key>;
}

impl IntoKey for Key {
    fn into_key(self) -> DIResult<Key> {
        Ok(self)
    }
}

impl IntoKey for &Key {
    fn into_key(self) -> DIResult<Key> {
        Ok(self.clone())
    }
}

impl IntoKey for &str {
    fn into_key(self) -> DIResult<Key> {
        Key::parse(self)
    }
}

impl IntoKey for String {
    fn into_key(self) -> DIResult<Key> {
        Key::parse(&self)
    }
}

impl IntoKey for &String {
    fn into_key(self) -> DIResult<Key> {
        Key::parse(self)
    }
}
