use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Identifier of an externally supplied annotation.
///
/// Wraps `Arc<str>`: the same id is held by the annotation snapshot, the
/// overlay registry key and every control callback, so clones must be cheap.
///
/// Implements `Borrow<str>` so maps keyed by `AnnotationId` can be queried
/// with a plain `&str`.
#[derive(Debug, Clone, Eq)]
pub struct AnnotationId(Arc<str>);

impl AnnotationId {
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Viewer element id of the overlay that represents this annotation.
    pub fn element_id(&self) -> String {
        format!("overlay-{}", self.0)
    }
}

// --- Equality ---

impl PartialEq for AnnotationId {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || *self.0 == *other.0
    }
}

impl PartialEq<str> for AnnotationId {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for AnnotationId {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

// --- Ordering ---

impl Ord for AnnotationId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for AnnotationId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

// --- Hashing ---

impl std::hash::Hash for AnnotationId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        (*self.0).hash(state);
    }
}

// --- Deref / Borrow ---

impl std::ops::Deref for AnnotationId {
    type Target = str;

    #[inline]
    fn deref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for AnnotationId {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

// --- Conversions ---

impl From<&str> for AnnotationId {
    #[inline]
    fn from(s: &str) -> Self {
        AnnotationId(Arc::from(s))
    }
}

impl From<String> for AnnotationId {
    #[inline]
    fn from(s: String) -> Self {
        AnnotationId(Arc::from(s))
    }
}

// --- Display ---

impl std::fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// --- Serde (hand-rolled so the `rc` feature is not needed) ---

impl Serialize for AnnotationId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for AnnotationId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(AnnotationId::from(s))
    }
}
