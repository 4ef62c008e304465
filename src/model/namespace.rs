//! Ontologies (store contexts) and the namespaces they own.

use super::ContextId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ontology {
    pub context: ContextId,
    pub base_iri: String,
}

/// Base IRI used to build identifiers, owned by one ontology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    pub base_iri: String,
    pub ontology: ContextId,
}

impl Namespace {
    pub fn iri_for(&self, name: &str) -> String {
        format!("{}{}", self.base_iri, name)
    }
}

/// Split an IRI into `(base, name)` at the last `#`, else the last `/`.
pub fn split_iri(iri: &str) -> Option<(&str, &str)> {
    let cut = iri.rfind('#').or_else(|| iri.rfind('/'))?;
    let (base, name) = iri.split_at(cut + 1);
    if name.is_empty() { None } else { Some((base, name)) }
}
