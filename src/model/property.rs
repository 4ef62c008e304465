//! Property records. The registry only knows what the class model needs:
//! kind and global functionality.

use serde::{Deserialize, Serialize};

use super::{NamespaceId, PropertyId, StoreId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyKind {
    Object,
    Data,
    /// Free-text metadata. Never inherited, never reasoned over.
    Annotation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub id: PropertyId,
    pub store_id: StoreId,
    pub name: String,
    pub namespace: NamespaceId,
    pub kind: PropertyKind,
    /// Declared `owl:FunctionalProperty`.
    pub functional: bool,
}

impl Property {
    pub fn is_annotation(&self) -> bool {
        self.kind == PropertyKind::Annotation
    }
}
