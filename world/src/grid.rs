//! Fixed-size hexagonal board and its geometric queries.

use std::collections::BTreeMap;

use circles_core::{HexCoord, Occupancy, RenderCommand, Slot};
use thiserror::Error;

/// Errors raised by board construction and mutation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    /// Boards need at least the centre hex.
    #[error("board radius must be at least 1")]
    InvalidRadius,
    /// The coordinate lies outside the board.
    #[error("hex {0} lies outside the board")]
    OutOfBounds(HexCoord),
}

/// A single board cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hex {
    coord: HexCoord,
    occupancy: Occupancy,
}

impl Hex {
    /// Axial coordinate of the cell.
    #[must_use]
    pub const fn coord(&self) -> HexCoord {
        self.coord
    }

    /// What currently sits on the cell.
    #[must_use]
    pub const fn occupancy(&self) -> Occupancy {
        self.occupancy
    }
}

/// Hexagonal board of a fixed radius.
///
/// A coordinate belongs to the board when `max(|q|, |r|, |q + r|)` does not
/// exceed `radius - 1`. Every such coordinate owns exactly one [`Hex`] for the
/// lifetime of the board, so a radius `R` board holds `3R² - 3R + 1` cells.
#[derive(Clone, Debug)]
pub struct HexGrid {
    radius: u32,
    hexes: BTreeMap<HexCoord, Hex>,
}

impl HexGrid {
    /// Creates a board of the provided radius with every hex empty.
    pub fn new(radius: u32) -> Result<Self, GridError> {
        if radius == 0 {
            return Err(GridError::InvalidRadius);
        }

        let extent = i32::try_from(radius - 1).map_err(|_| GridError::InvalidRadius)?;
        let mut hexes = BTreeMap::new();
        for q in -extent..=extent {
            for r in (-extent).max(-q - extent)..=extent.min(-q + extent) {
                let coord = HexCoord::new(q, r);
                let _ = hexes.insert(
                    coord,
                    Hex {
                        coord,
                        occupancy: Occupancy::Empty,
                    },
                );
            }
        }

        Ok(Self { radius, hexes })
    }

    /// Radius the board was created with.
    #[must_use]
    pub const fn radius(&self) -> u32 {
        self.radius
    }

    /// Number of cells on the board.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hexes.len()
    }

    /// Reports whether the board has no cells. Never true for a valid board.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hexes.is_empty()
    }

    /// Reports whether the coordinate belongs to the board.
    #[must_use]
    pub fn contains(&self, coord: HexCoord) -> bool {
        self.hexes.contains_key(&coord)
    }

    /// Cell stored at the coordinate.
    #[must_use]
    pub fn hex(&self, coord: HexCoord) -> Option<&Hex> {
        self.hexes.get(&coord)
    }

    /// Occupancy of the cell at the coordinate.
    #[must_use]
    pub fn occupancy(&self, coord: HexCoord) -> Option<Occupancy> {
        self.hexes.get(&coord).map(Hex::occupancy)
    }

    /// Iterator over every cell ordered by `(q, r)`.
    pub fn iter(&self) -> impl Iterator<Item = &Hex> {
        self.hexes.values()
    }

    /// Iterator over every coordinate ordered by `(q, r)`.
    pub fn coords(&self) -> impl Iterator<Item = HexCoord> + '_ {
        self.hexes.keys().copied()
    }

    /// Adjacent cells in the fixed direction order, omitting off-board ones.
    pub fn neighbors(&self, coord: HexCoord) -> impl Iterator<Item = HexCoord> + '_ {
        coord
            .adjacent()
            .filter(move |candidate| self.contains(*candidate))
    }

    /// Hex distance between two coordinates.
    #[must_use]
    pub fn distance(&self, a: HexCoord, b: HexCoord) -> u32 {
        a.distance(b)
    }

    /// Cells within `range` of `center`, optionally restricted to slots.
    ///
    /// The centre is part of the disk and is subject to the same filter.
    #[must_use]
    pub fn hexes_in_range(
        &self,
        center: HexCoord,
        range: u32,
        allowed: Option<&[Slot]>,
    ) -> Vec<HexCoord> {
        // Nothing lies further than the board diameter.
        let range = range.min(self.radius.saturating_mul(2));
        let Ok(range) = i32::try_from(range) else {
            return Vec::new();
        };

        let mut found = Vec::new();
        for dq in -range..=range {
            for dr in (-range).max(-dq - range)..=range.min(-dq + range) {
                let coord = center.offset(dq, dr);
                let Some(hex) = self.hexes.get(&coord) else {
                    continue;
                };
                if allowed.map_or(true, |slots| slots.contains(&hex.occupancy.slot())) {
                    found.push(coord);
                }
            }
        }
        found
    }

    /// Cells at exactly `range` from `center`, optionally restricted to slots.
    #[must_use]
    pub fn hexes_at_distance(
        &self,
        center: HexCoord,
        range: u32,
        allowed: Option<&[Slot]>,
    ) -> Vec<HexCoord> {
        self.hexes_in_range(center, range, allowed)
            .into_iter()
            .filter(|coord| coord.distance(center) == range)
            .collect()
    }

    /// Sole mutation point for occupancy.
    ///
    /// Emits a tile-state directive only when the stored value changes, so
    /// replaying an identical diff leaves the board and its tile classes
    /// untouched. Returns whether the cell changed.
    pub fn set_occupancy(
        &mut self,
        coord: HexCoord,
        occupancy: Occupancy,
        out: &mut Vec<RenderCommand>,
    ) -> Result<bool, GridError> {
        let hex = self
            .hexes
            .get_mut(&coord)
            .ok_or(GridError::OutOfBounds(coord))?;
        if hex.occupancy == occupancy {
            return Ok(false);
        }

        let previous_state = hex.occupancy.tile_state();
        hex.occupancy = occupancy;
        if previous_state != occupancy.tile_state() {
            out.push(RenderCommand::SetTileState {
                hex: coord,
                state: occupancy.tile_state(),
            });
        }
        Ok(true)
    }
}
