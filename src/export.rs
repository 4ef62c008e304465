//! Export: N-Triples dump of the store and a JSON snapshot of the loaded
//! class hierarchy.
//!
//! ```text
//! World → export_ntriples()         → one line per distinct triple, sorted
//!       → export_hierarchy_json()   → [{ iri, name, bases, mro }, ...]
//! ```

use std::io::Write;

use serde::Serialize;

use crate::model::{StoreId, Value};
use crate::storage::TripleStore;
use crate::world::World;
use crate::Result;

const XSD: &str = "http://www.w3.org/2001/XMLSchema#";

/// Dump every triple in the store as N-Triples. Triples present in
/// several contexts are written once. Returns the number of lines.
pub fn export_ntriples<S: TripleStore>(world: &World<S>, writer: &mut dyn Write) -> Result<usize> {
    let store = world.store();
    let mut lines: Vec<String> = Vec::new();
    for q in store.get_quads(None, None, None, None)? {
        let line = format!(
            "{} {} {} .",
            format_resource(store, &q.s)?,
            format_resource(store, &q.p)?,
            format_object(store, &q.o)?,
        );
        lines.push(line);
    }
    lines.sort();
    lines.dedup();

    for line in &lines {
        writeln!(writer, "{line}")?;
    }
    Ok(lines.len())
}

fn format_resource<S: TripleStore>(store: &S, id: &StoreId) -> Result<String> {
    if id.is_internal() {
        return Ok(format!("_:b{}", id.as_str().trim_start_matches('_')));
    }
    Ok(match store.unabbreviate(id)? {
        Some(iri) => format!("<{iri}>"),
        None => format!("_:n{id}"),
    })
}

fn format_object<S: TripleStore>(store: &S, value: &Value) -> Result<String> {
    Ok(match value {
        Value::Resource(id) => format_resource(store, id)?,
        Value::Bool(b) => format!("\"{b}\"^^<{XSD}boolean>"),
        Value::Int(i) => format!("\"{i}\"^^<{XSD}integer>"),
        Value::Float(f) => format!("\"{}\"^^<{XSD}double>", double_lexical(*f)),
        Value::String(s) => format!("\"{}\"", escape(s)),
        Value::LangString { text, lang } => format!("\"{}\"@{lang}", escape(text)),
    })
}

/// `xsd:double` spells the non-finite values `INF`, `-INF` and `NaN`.
fn double_lexical(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_owned()
    } else if f == f64::INFINITY {
        "INF".to_owned()
    } else if f == f64::NEG_INFINITY {
        "-INF".to_owned()
    } else {
        f.to_string()
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(ch),
        }
    }
    out
}

// ============================================================================
// Hierarchy snapshot
// ============================================================================

/// One loaded class, by IRI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassSnapshot {
    pub iri: String,
    pub name: String,
    pub bases: Vec<String>,
    pub mro: Vec<String>,
}

/// Loaded classes in registration order.
pub fn hierarchy_snapshot<S: TripleStore>(world: &World<S>) -> Vec<ClassSnapshot> {
    world.loaded_classes()
        .into_iter()
        .map(|c| ClassSnapshot {
            iri: world.iri(c),
            name: world.name(c),
            bases: world.bases(c).iter().map(|b| world.iri(*b)).collect(),
            mro: world.mro(c).iter().map(|m| world.iri(*m)).collect(),
        })
        .collect()
}

/// Write [`hierarchy_snapshot`] as pretty-printed JSON.
pub fn export_hierarchy_json<S: TripleStore>(world: &World<S>, writer: &mut dyn Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, &hierarchy_snapshot(world))?;
    writeln!(writer)?;
    Ok(())
}
