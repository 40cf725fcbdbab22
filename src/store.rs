//! Arena-backed domain object store
//!
//! Events and cross-references hold small opaque handles into this store,
//! never pointers, so reverting an event can never touch a freed object.
//! The scalar fields cached here (`count`, `success_rate`, `alive`) are the
//! only object state the replay snapshot/restore protocol mutates.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Opaque, stable identifier for a domain object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DomainHandle(u32);

impl DomainHandle {
    /// Arena index of the object behind this handle.
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    #[cfg(test)]
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }
}

/// One domain object plus the scalar fields replay needs for undo.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainObject {
    /// Object identifier as it appears in the trace (e.g. `"53"`).
    pub name: String,
    /// Controller debug id from the `Ctrl(<n>)` operand, when the trace carried one.
    pub debug_id: Option<u64>,
    /// Evidence count. New objects start at 1.
    pub count: i64,
    /// Success rate. New objects start at 1.0.
    pub success_rate: f64,
    /// Cleared when the object's delete event is applied, restored on unstep.
    pub alive: bool,
}

/// Name-to-handle resolution as seen by the event resolver.
///
/// `lookup` is the read path for referenced identifiers. `register` is the
/// loader path for identifiers a creation-kind record introduces; registering
/// a known name returns the existing handle.
pub trait HandleLookup {
    fn lookup(&self, name: &str) -> Option<DomainHandle>;

    fn register(&mut self, name: &str, debug_id: Option<u64>) -> DomainHandle;

    /// Overwrite an object's counters with values seeded by a startup record.
    fn seed_counters(&mut self, _handle: DomainHandle, _count: i64, _success_rate: f64) {}
}

/// Owns all domain objects for one scan/replay session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectStore {
    objects: Vec<DomainObject>,
    by_name: HashMap<String, DomainHandle>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, handle: DomainHandle) -> Option<&DomainObject> {
        self.objects.get(handle.index())
    }

    pub fn get_mut(&mut self, handle: DomainHandle) -> Option<&mut DomainObject> {
        self.objects.get_mut(handle.index())
    }

    pub fn name(&self, handle: DomainHandle) -> Option<&str> {
        self.get(handle).map(|obj| obj.name.as_str())
    }

    /// All objects in handle-index order.
    pub fn objects(&self) -> &[DomainObject] {
        &self.objects
    }
}

impl HandleLookup for ObjectStore {
    fn lookup(&self, name: &str) -> Option<DomainHandle> {
        self.by_name.get(name).copied()
    }

    fn register(&mut self, name: &str, debug_id: Option<u64>) -> DomainHandle {
        if let Some(handle) = self.by_name.get(name) {
            return *handle;
        }
        let handle = DomainHandle(self.objects.len() as u32);
        self.objects.push(DomainObject {
            name: name.to_string(),
            debug_id,
            count: 1,
            success_rate: 1.0,
            alive: true,
        });
        self.by_name.insert(name.to_string(), handle);
        handle
    }

    fn seed_counters(&mut self, handle: DomainHandle, count: i64, success_rate: f64) {
        if let Some(obj) = self.get_mut(handle) {
            obj.count = count;
            obj.success_rate = success_rate;
        }
    }
}
