//! Explicit "is-set" wrapper for partial updates
//!
//! A field wrapped in [`Patch`] is either left alone ([`Patch::Unchanged`]) or
//! replaced ([`Patch::Set`]). Nullable columns use `Patch<Option<T>>`, so
//! `Set(None)` clears the value while `Unchanged` keeps it.
//!
//! With `#[serde(default)]` on the field, a key missing from the JSON body
//! deserializes to `Unchanged`; an explicit `null` for a `Patch<Option<T>>`
//! becomes `Set(None)`.

use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    /// Leave the stored value untouched
    #[default]
    Unchanged,

    /// Replace the stored value
    Set(T),
}

impl<T> Patch<T> {
    /// Borrows the new value, if any
    pub fn as_set(&self) -> Option<&T> {
        match self {
            Patch::Set(value) => Some(value),
            Patch::Unchanged => None,
        }
    }

    /// Writes the new value into `target` when set
    pub fn apply_to(self, target: &mut T) {
        if let Patch::Set(value) = self {
            *target = value;
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Patch<U> {
        match self {
            Patch::Set(value) => Patch::Set(f(value)),
            Patch::Unchanged => Patch::Unchanged,
        }
    }
}

impl<T> From<T> for Patch<T> {
    fn from(value: T) -> Self {
        Patch::Set(value)
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Patch::Set)
    }
}
