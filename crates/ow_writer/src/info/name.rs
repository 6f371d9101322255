use core::fmt;
use std::sync::OnceLock;

use crate::MetaError;

/// A property name together with its wire form.
///
/// The wire form is the JSON string literal of the name (quotes included),
/// computed once so that writing a name is a plain byte copy.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct EncodedName {
    text: Box<str>,
    encoded: Box<[u8]>,
}

impl EncodedName {
    /// Encodes `text`, rejecting empty names.
    pub fn new(text: &str) -> Result<Self, MetaError> {
        if text.is_empty() {
            return Err(MetaError::EmptyName);
        }
        let encoded = serde_json::to_vec(text).map_err(|err| MetaError::InvalidName {
            name: text.into(),
            reason: err.to_string().into_boxed_str(),
        })?;
        Ok(Self {
            text: text.into(),
            encoded: encoded.into_boxed_slice(),
        })
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The quoted, escaped JSON form of the name.
    #[inline]
    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }
}

impl fmt::Debug for EncodedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.text, f)
    }
}

impl fmt::Display for EncodedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A set-once property name.
///
/// A name may be assigned after construction, but once the encoded form
/// exists it can never change: the second [`set`](Self::set) fails with
/// [`MetaError::NameAlreadyEncoded`].
#[derive(Default)]
pub struct PropertyName(OnceLock<EncodedName>);

impl PropertyName {
    /// Creates a name that has not been assigned yet.
    #[inline]
    pub const fn unset() -> Self {
        Self(OnceLock::new())
    }

    pub fn new(text: &str) -> Result<Self, MetaError> {
        let name = Self::unset();
        name.set(text)?;
        Ok(name)
    }

    pub fn set(&self, text: &str) -> Result<(), MetaError> {
        if let Some(current) = self.0.get() {
            return Err(already_encoded(current, text));
        }
        let encoded = EncodedName::new(text)?;
        // Another thread may have won the race between `get` and `set`.
        self.0.set(encoded).map_err(|_| match self.0.get() {
            Some(current) => already_encoded(current, text),
            None => MetaError::EmptyName,
        })
    }

    #[inline]
    pub fn get(&self) -> Option<&EncodedName> {
        self.0.get()
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.0.get().is_some()
    }
}

fn already_encoded(current: &EncodedName, requested: &str) -> MetaError {
    MetaError::NameAlreadyEncoded {
        current: current.as_str().into(),
        requested: requested.into(),
    }
}

impl fmt::Debug for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.get() {
            Some(name) => fmt::Debug::fmt(name, f),
            None => f.write_str("<unset>"),
        }
    }
}
