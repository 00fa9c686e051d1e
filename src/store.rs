//! Ordered object store backing the simulated agent.
//!
//! A sorted flat vector is all GETNEXT/GETBULK need: traversal is
//! "successor in sorted order", which binary search over a sorted
//! `Vec<(Oid, Value)>` answers directly.

use crate::oid::Oid;
use crate::value::{Value, ValueKind};

/// Why a SET was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetError {
    /// The OID is not present and row creation is disabled.
    NoSuchObject,
    /// The replacement value's type differs from the stored value's type.
    WrongType {
        expected: ValueKind,
        actual: ValueKind,
    },
}

/// In-memory, ordered OID-to-value store.
///
/// Invariants: entries are unique by OID and sorted by SNMP lexicographic
/// order at all times. Populated once from a walkfile; afterwards only
/// [`ObjectStore::set`] mutates it.
#[derive(Debug, Clone, Default)]
pub struct ObjectStore {
    entries: Vec<(Oid, Value)>,
    /// Allow SET to create rows for previously-absent OIDs.
    allow_create: bool,
    /// Require a SET replacement value to match the stored value's type.
    require_type_match: bool,
}

impl ObjectStore {
    /// Create an empty store with strict SET semantics (no row creation,
    /// replacement type must match).
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            allow_create: false,
            require_type_match: true,
        }
    }

    /// Create an empty store with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            ..Self::new()
        }
    }

    /// Configure whether SET may create previously-absent OIDs.
    pub fn set_allow_create(&mut self, allow: bool) {
        self.allow_create = allow;
    }

    /// Configure whether SET replacements must keep the stored type.
    pub fn set_require_type_match(&mut self, require: bool) {
        self.require_type_match = require;
    }

    fn position(&self, oid: &Oid) -> std::result::Result<usize, usize> {
        self.entries.binary_search_by(|(o, _)| o.cmp(oid))
    }

    /// Insert an entry, maintaining sorted order. An existing OID has its
    /// value replaced. Used during walkfile loading.
    pub fn insert(&mut self, oid: Oid, value: Value) {
        match self.position(&oid) {
            Ok(idx) => self.entries[idx].1 = value,
            Err(idx) => self.entries.insert(idx, (oid, value)),
        }
    }

    /// Whether the store holds an entry for `oid`.
    pub fn contains(&self, oid: &Oid) -> bool {
        self.position(oid).is_ok()
    }

    /// Exact-match lookup.
    pub fn get(&self, oid: &Oid) -> Option<&Value> {
        match self.position(oid) {
            Ok(idx) => Some(&self.entries[idx].1),
            Err(_) => None,
        }
    }

    /// The smallest stored OID strictly greater than `oid`.
    ///
    /// `None` signals end of tree (endOfMibView in the dispatcher).
    pub fn get_next(&self, oid: &Oid) -> Option<(&Oid, &Value)> {
        let idx = match self.position(oid) {
            Ok(idx) => idx + 1,  // exact match: successor
            Err(idx) => idx,     // no match: insertion point is the successor
        };
        self.entries.get(idx).map(|(o, v)| (o, v))
    }

    /// Up to `max_repetitions` successive entries after `oid`, in order.
    /// Stops early at end of tree.
    pub fn get_bulk(&self, oid: &Oid, max_repetitions: usize) -> Vec<(&Oid, &Value)> {
        let start = match self.position(oid) {
            Ok(idx) => idx + 1,
            Err(idx) => idx,
        };
        let end = start.saturating_add(max_repetitions).min(self.entries.len());
        self.entries[start..end].iter().map(|(o, v)| (o, v)).collect()
    }

    /// Check whether a SET of `value` at `oid` would succeed, without
    /// mutating anything. Used for the validate pass of the all-or-nothing
    /// SET protocol.
    pub fn check_set(&self, oid: &Oid, value: &Value) -> std::result::Result<(), SetError> {
        match self.get(oid) {
            Some(existing) => {
                if self.require_type_match && existing.kind() != value.kind() {
                    return Err(SetError::WrongType {
                        expected: existing.kind(),
                        actual: value.kind(),
                    });
                }
                Ok(())
            }
            None if self.allow_create => Ok(()),
            None => Err(SetError::NoSuchObject),
        }
    }

    /// Replace the value at `oid` wholesale.
    ///
    /// Fails for absent OIDs unless row creation is enabled, and for type
    /// changes when type matching is required. The tree shape never changes
    /// except through explicitly-enabled row creation.
    pub fn set(&mut self, oid: &Oid, value: Value) -> std::result::Result<(), SetError> {
        self.check_set(oid, &value)?;
        match self.position(oid) {
            Ok(idx) => self.entries[idx].1 = value,
            Err(idx) => self.entries.insert(idx, (oid.clone(), value)),
        }
        Ok(())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all entries in OID order.
    pub fn iter(&self) -> impl Iterator<Item = (&Oid, &Value)> {
        self.entries.iter().map(|(o, v)| (o, v))
    }
}
