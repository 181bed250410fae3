//! Closed symbol table: the only universe of names a snippet can resolve.

mod catalog;
pub mod types;

use std::collections::HashMap;
use std::sync::OnceLock;

pub use catalog::HostCatalog;
pub use types::{MemberKind, MemberSig, TypeDescriptor, ValueType};

/// Qualified names granted to snippets. A granted type grants all of its members.
pub(crate) const GRANTED: &[&str] = &[
    // builder API
    types::MODEL_BUILDER,
    types::MODEL,
    types::NODE,
    types::MATERIAL,
    // color / vector math
    types::COLOR,
    types::COLOR_ATTRIBUTE,
    types::VECTOR3,
    types::ARRAY,
    // primitive wrappers
    types::STRING,
    types::INTEGER,
    types::FLOAT,
    types::DOUBLE,
    types::BOOLEAN,
    types::OBJECT,
];

/// Immutable `qualified-name -> type descriptor` table.
///
/// Built once; there is no way to add entries afterwards.
#[derive(Debug)]
pub struct SymbolTable {
    entries: HashMap<&'static str, &'static TypeDescriptor>,
}

impl SymbolTable {
    /// The process-wide table built from the granted list
    pub fn global() -> &'static SymbolTable {
        static TABLE: OnceLock<SymbolTable> = OnceLock::new();
        TABLE.get_or_init(|| SymbolTable::from_names(GRANTED))
    }

    /// Build a table granting `names` out of the host catalog.
    /// Names unknown to the catalog are skipped.
    pub(crate) fn from_names(names: &[&str]) -> Self {
        let mut entries = HashMap::with_capacity(names.len());
        for name in names {
            match HostCatalog::lookup(name) {
                Some(desc) => {
                    entries.insert(desc.name, desc);
                }
                None => tracing::warn!("granted symbol {name} is not in the host catalog"),
            }
        }
        Self { entries }
    }

    /// Resolve a fully qualified name
    pub fn resolve(&self, name: &str) -> Option<&'static TypeDescriptor> {
        self.entries.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Granted names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.keys().copied().collect();
        names.sort_unstable();
        names
    }
}
