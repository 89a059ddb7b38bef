//! Feed reconciliation: maps per-unit status updates onto stable slots.
//!
//! A unit id owns exactly one slot for the lifetime of the feed. New ids are
//! shown first; existing slots are updated in place and never move.

use std::collections::BTreeMap;

use crate::{ProgressRecord, UnitId, UnitKind, UnitStatus};

/// Stable identity of a slot, allocated in first-appearance order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotTone {
    Pending,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub id: SlotId,
    pub unit: UnitId,
    pub kind: UnitKind,
    /// Last status applied to this slot, verbatim.
    pub status: UnitStatus,
    /// Sticky: set by the first `done = true` and never reset.
    pub completed: bool,
}

impl Slot {
    pub fn tone(&self) -> SlotTone {
        if self.kind == UnitKind::Alert || self.status.has_failure_marker() {
            SlotTone::Error
        } else if self.completed {
            SlotTone::Success
        } else {
            SlotTone::Pending
        }
    }
}

/// Minimal redraw instruction produced by one `apply`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderEffect {
    /// A new slot was placed at the head of the feed.
    Inserted { slot: SlotId, unit: UnitId },
    /// An existing slot changed content in place.
    Updated { slot: SlotId },
    /// The update matched what the slot already shows.
    Unchanged { slot: SlotId },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Feed {
    slots: Vec<Slot>,
    index: BTreeMap<UnitId, SlotId>,
}

impl Feed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, unit: UnitId, status: UnitStatus) -> RenderEffect {
        if let Some(&slot_id) = self.index.get(&unit) {
            let slot = &mut self.slots[slot_id.0 as usize];
            let completed = slot.completed || status.done;
            if slot.status == status && slot.completed == completed {
                return RenderEffect::Unchanged { slot: slot_id };
            }
            slot.status = status;
            slot.completed = completed;
            return RenderEffect::Updated { slot: slot_id };
        }

        let slot_id = SlotId(self.slots.len() as u32);
        self.slots.push(Slot {
            id: slot_id,
            kind: unit.kind(),
            unit: unit.clone(),
            completed: status.done,
            status,
        });
        self.index.insert(unit.clone(), slot_id);
        RenderEffect::Inserted {
            slot: slot_id,
            unit,
        }
    }

    /// Applies every unit of `record`, numeric ids first in ascending order.
    pub fn apply_record(&mut self, record: &ProgressRecord) -> Vec<RenderEffect> {
        record
            .units
            .iter()
            .map(|(unit, status)| self.apply(unit.clone(), status.clone()))
            .collect()
    }

    pub fn slot_for(&self, unit: &UnitId) -> Option<&Slot> {
        self.index
            .get(unit)
            .map(|slot_id| &self.slots[slot_id.0 as usize])
    }

    pub fn slot(&self, slot_id: SlotId) -> Option<&Slot> {
        self.slots.get(slot_id.0 as usize)
    }

    /// Slots in display order: most recently introduced first.
    pub fn newest_first(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
