use std::borrow::Borrow;
use std::ops::Deref;
use std::sync::Arc;
use std::{fmt::Display, hash::Hash};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SharedStr(Arc<str>);

impl Display for SharedStr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl Default for SharedStr {
    fn default() -> Self {
        Self(Arc::from(""))
    }
}

impl AsRef<str> for SharedStr {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SharedStr {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SharedStr {
    fn from(value: &str) -> Self {
        SharedStr(Arc::from(value))
    }
}

impl From<String> for SharedStr {
    fn from(value: String) -> Self {
        SharedStr(Arc::from(value))
    }
}

impl Deref for SharedStr {
    type Target = Arc<str>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// The stable numeric id of an item.
///
/// Ids are part of the item definitions themselves, never assigned at load
/// time, so they stay valid across processes and catalog reloads. Id 0 is
/// reserved for the unknown-item placeholder; every cataloged item has a
/// positive id.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(u32);

impl ItemId {
    /// The reserved id of the unknown-item placeholder.
    pub const UNKNOWN: ItemId = ItemId(0);

    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One item reference as call sites hand them in: either the stable id, or
/// a catalog name that still needs resolving.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum ItemKey {
    Id(ItemId),
    Name(SharedStr),
}

impl Display for ItemKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemKey::Id(id) => id.fmt(f),
            ItemKey::Name(name) => name.fmt(f),
        }
    }
}

impl From<ItemId> for ItemKey {
    fn from(value: ItemId) -> Self {
        ItemKey::Id(value)
    }
}

impl From<SharedStr> for ItemKey {
    fn from(value: SharedStr) -> Self {
        ItemKey::Name(value)
    }
}

impl From<&str> for ItemKey {
    fn from(value: &str) -> Self {
        ItemKey::Name(SharedStr::from(value))
    }
}

impl From<String> for ItemKey {
    fn from(value: String) -> Self {
        ItemKey::Name(SharedStr::from(value))
    }
}
