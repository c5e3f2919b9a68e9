//! Per-declaration side-channel facts.
//!
//! Passes attach capabilities here instead of widening the declaration
//! schema. The key space is closed (`MetadataKind`) so every reader and
//! writer names the capability it depends on.

use std::sync::Arc;

use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKind {
    SetLastError,
    OriginalName,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MetadataItem {
    /// The platform error code must be captured right after a call.
    SetLastError,
    /// Name the declaration had before a pass renamed it.
    OriginalName(String),
}

impl MetadataItem {
    pub fn kind(&self) -> MetadataKind {
        match self {
            MetadataItem::SetLastError => MetadataKind::SetLastError,
            MetadataItem::OriginalName(_) => MetadataKind::OriginalName,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata(Arc<IndexMap<MetadataKind, MetadataItem>>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, kind: MetadataKind) -> bool {
        self.0.contains_key(&kind)
    }

    pub fn get(&self, kind: MetadataKind) -> Option<&MetadataItem> {
        self.0.get(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetadataItem> {
        self.0.values()
    }

    /// Returns a bag with `item` set, replacing any item of the same kind.
    pub fn with(&self, item: MetadataItem) -> Self {
        let mut items = (*self.0).clone();
        items.insert(item.kind(), item);
        Self(Arc::new(items))
    }

    pub fn without(&self, kind: MetadataKind) -> Self {
        if !self.has(kind) {
            return self.clone();
        }
        let mut items = (*self.0).clone();
        items.shift_remove(&kind);
        Self(Arc::new(items))
    }
}
