//! Resource tracking state for the linearity analysis.
//!
//! The checker maintains a map from tracked locations (variables, `self`
//! fields, container slots) to handles recording each resource value's
//! state. At branch points the map is snapshotted; at merge points the
//! branch results are joined: a location valid on some arms and
//! invalidated on others becomes *potentially lost*, and any read of such
//! a location is a use-after-invalidation.

use cairn_common::span::Span;
use rustc_hash::FxHashMap;

/// The lifecycle state of a tracked resource value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceState {
    Valid,
    /// Invalidated by a move (`<-`).
    MovedOut,
    /// Invalidated by `destroy`.
    Destroyed,
    /// Lost on every path.
    DefinitelyLost,
    /// Valid on some paths, invalidated on others.
    PotentiallyLost,
}

impl ResourceState {
    #[must_use]
    pub const fn is_invalidated(self) -> bool {
        !matches!(self, ResourceState::Valid)
    }
}

/// A tracked resource location.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TrackedLocation {
    /// A local variable or parameter, by its unique variable id.
    Variable(u32),
    /// A field reached through `self`.
    SelfField(String),
    /// A container slot at a compile-time-constant index.
    Element(u32, u64),
}

/// Tracking handle for one resource location.
#[derive(Clone, Debug)]
pub struct ResourceHandle {
    pub state: ResourceState,
    /// Display name for diagnostics.
    pub name: String,
    /// Originating declaration.
    pub origin: Span,
    /// Position of the last state transition.
    pub transition: Option<Span>,
    /// A container becomes indeterminate after a move out of a
    /// non-constant index; no slot may be read until fully replaced.
    pub indeterminate: bool,
}

impl ResourceHandle {
    #[must_use]
    pub fn valid(name: impl Into<String>, origin: Span) -> Self {
        Self {
            state: ResourceState::Valid,
            name: name.into(),
            origin,
            transition: None,
            indeterminate: false,
        }
    }

    pub fn transition(&mut self, state: ResourceState, at: Span) {
        self.state = state;
        self.transition = Some(at);
    }
}

/// The per-scope map from tracked locations to handles.
#[derive(Clone, Debug, Default)]
pub struct ResourceMap {
    entries: FxHashMap<TrackedLocation, ResourceHandle>,
}

impl ResourceMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, location: TrackedLocation, handle: ResourceHandle) {
        self.entries.insert(location, handle);
    }

    #[must_use]
    pub fn get(&self, location: &TrackedLocation) -> Option<&ResourceHandle> {
        self.entries.get(location)
    }

    pub fn get_mut(&mut self, location: &TrackedLocation) -> Option<&mut ResourceHandle> {
        self.entries.get_mut(location)
    }

    pub fn remove(&mut self, location: &TrackedLocation) -> Option<ResourceHandle> {
        self.entries.remove(location)
    }

    /// Remove all slot entries belonging to a container variable.
    pub fn remove_elements_of(&mut self, variable_id: u32) {
        self.entries
            .retain(|location, _| !matches!(location, TrackedLocation::Element(id, _) if *id == variable_id));
    }

    /// Join two branch results. A branch that definitely exited
    /// contributes nothing; its arm's states are ignored.
    #[must_use]
    pub fn merge_branches(
        then_map: ResourceMap,
        else_map: ResourceMap,
        then_exits: bool,
        else_exits: bool,
    ) -> ResourceMap {
        if then_exits && else_exits {
            return then_map;
        }
        if then_exits {
            return else_map;
        }
        if else_exits {
            return then_map;
        }

        let mut merged = FxHashMap::default();
        let ResourceMap { entries: then_entries } = then_map;
        let ResourceMap { entries: mut else_entries } = else_map;

        for (location, then_handle) in then_entries {
            let merged_handle = match else_entries.remove(&location) {
                Some(else_handle) => Self::join_handles(then_handle, else_handle),
                None => then_handle,
            };
            merged.insert(location, merged_handle);
        }
        for (location, else_handle) in else_entries {
            merged.insert(location, else_handle);
        }

        ResourceMap { entries: merged }
    }

    fn join_handles(then_handle: ResourceHandle, else_handle: ResourceHandle) -> ResourceHandle {
        let mut joined = then_handle;
        joined.indeterminate |= else_handle.indeterminate;
        if joined.state == else_handle.state {
            return joined;
        }
        match (joined.state, else_handle.state) {
            (ResourceState::Valid, _) => {
                joined.state = ResourceState::PotentiallyLost;
                joined.transition = else_handle.transition;
            }
            (_, ResourceState::Valid) => {
                joined.state = ResourceState::PotentiallyLost;
            }
            // Both invalidated, differently: keep the then-branch state.
            _ => {}
        }
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(state: ResourceState) -> ResourceHandle {
        let mut h = ResourceHandle::valid("r", Span::dummy());
        h.state = state;
        h
    }

    #[test]
    fn test_valid_and_moved_merge_to_potentially_lost() {
        let mut then_map = ResourceMap::new();
        let mut else_map = ResourceMap::new();
        let location = TrackedLocation::Variable(0);
        then_map.insert(location.clone(), handle(ResourceState::MovedOut));
        else_map.insert(location.clone(), handle(ResourceState::Valid));

        let merged = ResourceMap::merge_branches(then_map, else_map, false, false);
        assert_eq!(
            merged.get(&location).unwrap().state,
            ResourceState::PotentiallyLost
        );
    }

    #[test]
    fn test_exiting_branch_is_ignored() {
        let mut then_map = ResourceMap::new();
        let mut else_map = ResourceMap::new();
        let location = TrackedLocation::Variable(0);
        then_map.insert(location.clone(), handle(ResourceState::MovedOut));
        else_map.insert(location.clone(), handle(ResourceState::Valid));

        // The then branch returned; only the else state survives.
        let merged = ResourceMap::merge_branches(then_map, else_map, true, false);
        assert_eq!(merged.get(&location).unwrap().state, ResourceState::Valid);
    }

    #[test]
    fn test_same_state_preserved() {
        let mut then_map = ResourceMap::new();
        let mut else_map = ResourceMap::new();
        let location = TrackedLocation::Variable(3);
        then_map.insert(location.clone(), handle(ResourceState::Destroyed));
        else_map.insert(location.clone(), handle(ResourceState::Destroyed));

        let merged = ResourceMap::merge_branches(then_map, else_map, false, false);
        assert_eq!(merged.get(&location).unwrap().state, ResourceState::Destroyed);
    }
}
