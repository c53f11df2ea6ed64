//! Fan layout for the face-down deck and the row that selected cards drop
//! into.
//!
//! Coordinates are logical pixels relative to the fan anchor with y growing
//! downward. A placement describes the card centre; rotation is in radians,
//! positive meaning clockwise on screen.

use std::collections::HashMap;

use shared::domain::CardId;

use crate::selection::SelectionState;

const SELECTED_Z_BASE: i32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FanGeometry {
    pub fan_width: f32,
    pub radius: f32,
    /// Flattening factor applied to the radius (the curve's `k`).
    pub curvature: f32,
    pub offset_y: f32,
}

impl Default for FanGeometry {
    fn default() -> Self {
        Self {
            fan_width: 900.0,
            radius: 250.0,
            curvature: 0.3,
            offset_y: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionRow {
    pub spacing: f32,
    pub drop_y: f32,
    pub scale: f32,
}

impl Default for SelectionRow {
    fn default() -> Self {
        Self {
            spacing: 140.0,
            drop_y: 200.0,
            scale: 1.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardPlacement {
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub scale: f32,
    pub z_index: i32,
}

impl CardPlacement {
    pub fn rotation_degrees(&self) -> f32 {
        self.rotation.to_degrees()
    }

    /// Whether `(px, py)` falls on a `width` x `height` card drawn here.
    pub fn contains(&self, px: f32, py: f32, width: f32, height: f32) -> bool {
        let (dx, dy) = (px - self.x, py - self.y);
        let (sin, cos) = self.rotation.sin_cos();
        // Undo the card rotation to test against the axis-aligned card.
        let local_x = dx * cos + dy * sin;
        let local_y = -dx * sin + dy * cos;
        local_x.abs() <= width * self.scale / 2.0 && local_y.abs() <= height * self.scale / 2.0
    }
}

/// Position along the fan normalised to `[-1, 1]`. A single card sits at 0.
pub fn fan_parameter(index: usize, count: usize) -> f32 {
    if count <= 1 {
        return 0.0;
    }
    2.0 * index as f32 / (count - 1) as f32 - 1.0
}

/// Stacking order: `count - |index - centre|`, kept integral by doubling.
pub fn fan_z_index(index: usize, count: usize) -> i32 {
    let doubled_offset = (2 * index as i64 - (count as i64 - 1)).abs();
    (count as i64 - doubled_offset / 2) as i32
}

impl FanGeometry {
    pub fn place(&self, index: usize, count: usize) -> CardPlacement {
        let t = fan_parameter(index, count);
        let half_width = self.fan_width / 2.0;
        let depth = self.radius * self.curvature;

        let x = t * half_width;
        let y = self.offset_y - t * t * depth;
        let dx_dt = half_width;
        let dy_dt = -2.0 * t * depth;

        CardPlacement {
            x,
            y,
            rotation: dy_dt.atan2(dx_dt),
            scale: 1.0,
            z_index: fan_z_index(index, count),
        }
    }
}

impl SelectionRow {
    /// Resting place of reveal slot `slot` when `required` slots are shown.
    pub fn place(&self, slot: usize, required: usize) -> CardPlacement {
        let centre = required.saturating_sub(1) as f32 / 2.0;
        CardPlacement {
            x: (slot as f32 - centre) * self.spacing,
            y: self.drop_y,
            rotation: 0.0,
            scale: self.scale,
            z_index: SELECTED_Z_BASE + slot as i32,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeckLayout {
    geometry: FanGeometry,
    row: SelectionRow,
    order: Vec<CardId>,
    fan_positions: HashMap<CardId, usize>,
    fan_slots: Vec<CardPlacement>,
}

impl DeckLayout {
    pub fn new(order: &[CardId], geometry: FanGeometry, row: SelectionRow) -> Self {
        let count = order.len();
        let fan_positions = order
            .iter()
            .enumerate()
            .map(|(position, id)| (*id, position))
            .collect();
        let fan_slots = (0..count)
            .map(|position| geometry.place(position, count))
            .collect();
        Self {
            geometry,
            row,
            order: order.to_vec(),
            fan_positions,
            fan_slots,
        }
    }

    pub fn with_defaults(order: &[CardId]) -> Self {
        Self::new(order, FanGeometry::default(), SelectionRow::default())
    }

    /// Same geometry, new deck order.
    pub fn relayout(&self, order: &[CardId]) -> Self {
        Self::new(order, self.geometry, self.row)
    }

    pub fn geometry(&self) -> FanGeometry {
        self.geometry
    }

    pub fn row(&self) -> SelectionRow {
        self.row
    }

    pub fn order(&self) -> &[CardId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn fan_position(&self, id: CardId) -> Option<usize> {
        self.fan_positions.get(&id).copied()
    }

    /// The card's home in the fan, independent of any selection.
    pub fn fan_slot(&self, id: CardId) -> Option<CardPlacement> {
        self.fan_position(id)
            .and_then(|position| self.fan_slots.get(position).copied())
    }

    pub fn selected_slot(&self, slot: usize, required: usize) -> CardPlacement {
        self.row.place(slot, required)
    }

    /// Where the card currently rests: its reveal slot when selected,
    /// otherwise its fan slot.
    pub fn placement(&self, id: CardId, selection: &SelectionState) -> Option<CardPlacement> {
        match selection.slot_of(id) {
            Some(slot) if self.fan_positions.contains_key(&id) => {
                Some(self.selected_slot(slot, selection.required()))
            }
            _ => self.fan_slot(id),
        }
    }

    /// Every card with its current placement, back to front.
    pub fn placements(&self, selection: &SelectionState) -> Vec<(CardId, CardPlacement)> {
        let mut placed: Vec<(CardId, CardPlacement)> = self
            .order
            .iter()
            .filter_map(|id| self.placement(*id, selection).map(|placement| (*id, placement)))
            .collect();
        placed.sort_by_key(|(_, placement)| placement.z_index);
        placed
    }

    /// Front-most card under the point, if any.
    pub fn hit_test(
        &self,
        px: f32,
        py: f32,
        card_width: f32,
        card_height: f32,
        selection: &SelectionState,
    ) -> Option<CardId> {
        self.placements(selection)
            .into_iter()
            .rev()
            .find(|(_, placement)| placement.contains(px, py, card_width, card_height))
            .map(|(id, _)| id)
    }
}

#[cfg(test)]
#[path = "tests/layout_tests.rs"]
mod tests;
