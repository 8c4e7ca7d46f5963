//! Generational storage for tile nodes.
//!
//! Nodes live in a [`Slab`]. Every insertion stamps the node with a fresh
//! generation, so a [`TileId`] kept after its tile was disposed never resolves
//! to whatever node later reuses the slot.

use slab::Slab;

use crate::tile::TileNode;

/// Handle to a tile node.
///
/// Valid only while the tile is alive; lookups with a stale handle return
/// `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId {
    key: usize,
    generation: u64,
}

#[derive(Debug)]
struct Slot {
    generation: u64,
    node: TileNode,
}

/// Owner of every live tile node.
#[derive(Debug, Default)]
pub struct TileArena {
    slots: Slab<Slot>,
    next_generation: u64,
}

impl TileArena {
    /// Create an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, node: TileNode) -> TileId {
        let generation = self.next_generation;
        self.next_generation += 1;
        let key = self.slots.insert(Slot { generation, node });
        TileId { key, generation }
    }

    pub(crate) fn remove(&mut self, id: TileId) -> Option<TileNode> {
        if !self.contains(id) {
            return None;
        }
        Some(self.slots.remove(id.key).node)
    }

    /// Look up a live node.
    #[must_use]
    pub fn get(&self, id: TileId) -> Option<&TileNode> {
        self.slots
            .get(id.key)
            .filter(|slot| slot.generation == id.generation)
            .map(|slot| &slot.node)
    }

    pub(crate) fn get_mut(&mut self, id: TileId) -> Option<&mut TileNode> {
        self.slots
            .get_mut(id.key)
            .filter(|slot| slot.generation == id.generation)
            .map(|slot| &mut slot.node)
    }

    /// Whether the handle refers to a live node.
    #[must_use]
    pub fn contains(&self, id: TileId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the arena holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterate over live nodes in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (TileId, &TileNode)> {
        self.slots.iter().map(|(key, slot)| {
            (
                TileId {
                    key,
                    generation: slot.generation,
                },
                &slot.node,
            )
        })
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut TileNode> {
        self.slots.iter_mut().map(|(_, slot)| &mut slot.node)
    }
}

/// Per-tile data kept outside the nodes, indexed by slot.
///
/// Entries are tagged with the owning tile's generation. An entry left behind
/// by a disposed tile is invisible to the tile that reuses its slot.
#[derive(Debug)]
pub(crate) struct SideTable<T> {
    entries: Vec<Option<(u64, T)>>,
}

impl<T> Default for SideTable<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: Default> SideTable<T> {
    pub(crate) fn get(&self, id: TileId) -> Option<&T> {
        match self.entries.get(id.key)? {
            Some((generation, value)) if *generation == id.generation => Some(value),
            _ => None,
        }
    }

    /// The entry for `id`, created empty if missing or left by another tile.
    pub(crate) fn entry(&mut self, id: TileId) -> &mut T {
        if self.entries.len() <= id.key {
            self.entries.resize_with(id.key + 1, || None);
        }

        let slot = &mut self.entries[id.key];
        if !matches!(slot, Some((generation, _)) if *generation == id.generation) {
            *slot = None;
        }
        &mut slot.get_or_insert_with(|| (id.generation, T::default())).1
    }

    pub(crate) fn remove(&mut self, id: TileId) -> Option<T> {
        let slot = self.entries.get_mut(id.key)?;
        if matches!(slot, Some((generation, _)) if *generation == id.generation) {
            slot.take().map(|(_, value)| value)
        } else {
            None
        }
    }
}
