//! Types every parley crate agrees on: conversation ids, generation knobs and the
//! name-keyed tables that back provider and tool snapshots.
//!
//! ```rust
//! use pcommon::{GenerationOptions, SessionId};
//!
//! let session = SessionId::generate();
//! let options = GenerationOptions::default().with_temperature(0.3).enable_streaming();
//!
//! assert_eq!(session.as_str().len(), 36);
//! assert!(options.check().is_ok());
//! ```

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Free-form request annotations forwarded to providers untouched.
pub type MetadataMap = HashMap<String, String>;

/// Names one conversation in logs and hook callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Highest sampling temperature any supported vendor accepts.
pub const MAX_TEMPERATURE: f32 = 2.0;

/// Sampling and delivery settings for one model call.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GenerationOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Deliver text incrementally instead of in one reply.
    pub stream: bool,
}

impl GenerationOptions {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn enable_streaming(self) -> Self {
        self.with_streaming(true)
    }

    /// Rejects values no vendor would accept.
    pub fn check(&self) -> Result<(), &'static str> {
        if self.max_tokens == Some(0) {
            return Err("max_tokens must be greater than zero");
        }
        match self.temperature {
            Some(temperature) if !(0.0..=MAX_TEMPERATURE).contains(&temperature) => {
                Err("temperature must be in the inclusive range 0.0..=2.0")
            }
            _ => Ok(()),
        }
    }
}

/// A snapshot table keyed by name, iterated in key order.
///
/// Collecting into a table keeps the last value seen for each key, which is how
/// rebuilt tool sets and provider sets resolve duplicates.
///
/// ```rust
/// use pcommon::Registry;
///
/// let tools: Registry<&str, u32> = [("sum", 1), ("clock", 2), ("sum", 3)].into_iter().collect();
///
/// assert_eq!(tools.keys().copied().collect::<Vec<_>>(), vec!["clock", "sum"]);
/// assert_eq!(tools.get("sum"), Some(&3));
/// ```
#[derive(Debug, Clone)]
pub struct Registry<K, V> {
    entries: BTreeMap<K, V>,
}

impl<K: Ord, V> Default for Registry<K, V> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<K: Ord, V> Registry<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value it replaced, if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.entries.insert(key, value)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.entries.get(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for Registry<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
