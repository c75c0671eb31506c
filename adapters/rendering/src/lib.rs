#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Circles of Hell adapters.
//!
//! The engine never draws. It emits [`RenderCommand`]s which adapters fold
//! into a [`BoardPresentation`] and hand to a [`RenderingBackend`] together
//! with the [`HexLayout`] that maps axial coordinates to pixels.

use std::{
    collections::{BTreeMap, BTreeSet},
    error::Error,
    fmt,
};

use anyhow::Result as AnyResult;
use circles_core::{
    ActionKind, EffectPayload, EntityId, HexCoord, Overlay, RenderCommand, TileState,
};
use glam::Vec2;

const SQRT_3: f32 = 1.732_050_8;

/// Default radius of a drawn hex in pixels.
pub const DEFAULT_HEX_SIZE: f32 = 30.0;

/// Default spacing between neighbouring hexes in pixels.
pub const DEFAULT_HEX_GAP: f32 = 1.0;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }
}

/// Colors for every tile class and overlay layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TilePalette {
    /// Walkable tile.
    pub open: Color,
    /// Impassable tile.
    pub obstacle: Color,
    /// Tile holding an entity.
    pub occupied: Color,
    /// Legal spell target.
    pub spell_target: Color,
    /// Attackable unit.
    pub attack_target: Color,
    /// Attackable unit under the pointer.
    pub focused_attack_target: Color,
    /// Previewed path.
    pub path: Color,
    /// Hover preview of a spell.
    pub secondary: Color,
}

impl Default for TilePalette {
    fn default() -> Self {
        Self {
            open: Color::from_rgb_u8(0x4a, 0x3b, 0x36),
            obstacle: Color::from_rgb_u8(0x1c, 0x14, 0x12),
            occupied: Color::from_rgb_u8(0x6e, 0x55, 0x4d),
            spell_target: Color::from_rgb_u8(0x5b, 0x4f, 0xa8),
            attack_target: Color::from_rgb_u8(0xa8, 0x3a, 0x32),
            focused_attack_target: Color::from_rgb_u8(0xe0, 0x4f, 0x3f),
            path: Color::from_rgb_u8(0xc9, 0xa2, 0x27),
            secondary: Color::from_rgb_u8(0xf0, 0x8a, 0x24),
        }
    }
}

impl TilePalette {
    /// Color of an overlay layer.
    #[must_use]
    pub const fn overlay(&self, overlay: Overlay) -> Color {
        match overlay {
            Overlay::SpellTarget => self.spell_target,
            Overlay::AttackTarget => self.attack_target,
            Overlay::FocusedAttackTarget => self.focused_attack_target,
            Overlay::Path => self.path,
            Overlay::Secondary => self.secondary,
        }
    }

    /// Color of a base tile class.
    #[must_use]
    pub const fn tile(&self, state: TileState) -> Color {
        match state {
            TileState::Open => self.open,
            TileState::Obstacle => self.obstacle,
            TileState::Occupied => self.occupied,
        }
    }
}

/// Maps axial coordinates of a flat-top board to pixel space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HexLayout {
    hex_size: f32,
    gap: f32,
    origin: Vec2,
}

impl HexLayout {
    /// Creates a layout with the board centre at `origin`.
    pub fn new(hex_size: f32, gap: f32, origin: Vec2) -> Result<Self, RenderingError> {
        if !(hex_size.is_finite() && hex_size > 0.0) {
            return Err(RenderingError::InvalidHexSize { hex_size });
        }
        if !(gap.is_finite() && gap >= 0.0) {
            return Err(RenderingError::InvalidGap { gap });
        }
        Ok(Self {
            hex_size,
            gap,
            origin,
        })
    }

    /// Layout whose origin places a radius `radius` board in the positive
    /// quadrant, touching both axes.
    pub fn for_board(radius: u32, hex_size: f32, gap: f32) -> Result<Self, RenderingError> {
        let layout = Self::new(hex_size, gap, Vec2::ZERO)?;
        let extent = radius.saturating_sub(1) as f32;
        let spacing = layout.spacing();
        let origin = Vec2::new(
            spacing * 1.5 * extent + hex_size,
            spacing * SQRT_3 * extent + hex_size * SQRT_3 / 2.0,
        );
        Ok(Self { origin, ..layout })
    }

    /// Radius of a drawn hex.
    #[must_use]
    pub const fn hex_size(&self) -> f32 {
        self.hex_size
    }

    /// Pixel position of the board centre.
    #[must_use]
    pub const fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Distance unit between neighbouring centres, gap included.
    #[must_use]
    pub fn spacing(&self) -> f32 {
        self.hex_size + self.gap
    }

    /// Centre of the hex in pixel space.
    #[must_use]
    pub fn hex_to_point(&self, hex: HexCoord) -> Vec2 {
        let q = hex.q() as f32;
        let r = hex.r() as f32;
        let spacing = self.spacing();
        self.origin
            + Vec2::new(
                spacing * 1.5 * q,
                spacing * (SQRT_3 / 2.0 * q + SQRT_3 * r),
            )
    }

    /// Hex containing the pixel, used to pick pointer targets.
    #[must_use]
    pub fn point_to_hex(&self, point: Vec2) -> HexCoord {
        let local = (point - self.origin) / self.spacing();
        let q = local.x * 2.0 / 3.0;
        let r = -local.x / 3.0 + SQRT_3 / 3.0 * local.y;
        round_axial(q, r)
    }

    /// Corners of the drawn hex, clockwise from the right-hand vertex.
    #[must_use]
    pub fn corners(&self, hex: HexCoord) -> [Vec2; 6] {
        let center = self.hex_to_point(hex);
        let mut corners = [Vec2::ZERO; 6];
        for (index, corner) in corners.iter_mut().enumerate() {
            let angle = (60.0 * index as f32).to_radians();
            *corner = center + Vec2::new(angle.cos(), angle.sin()) * self.hex_size;
        }
        corners
    }
}

impl Default for HexLayout {
    fn default() -> Self {
        Self {
            hex_size: DEFAULT_HEX_SIZE,
            gap: DEFAULT_HEX_GAP,
            origin: Vec2::ZERO,
        }
    }
}

fn round_axial(q: f32, r: f32) -> HexCoord {
    let s = -q - r;
    let (mut rq, mut rr, rs) = (q.round(), r.round(), s.round());
    let (dq, dr, ds) = ((rq - q).abs(), (rr - r).abs(), (rs - s).abs());
    if dq > dr && dq > ds {
        rq = -rr - rs;
    } else if dr > ds {
        rr = -rq - rs;
    }
    HexCoord::new(rq as i32, rr as i32)
}

/// Effect queued for playback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayedEffect {
    /// Entity performing the action.
    pub actor: EntityId,
    /// Action the effect belongs to.
    pub action: ActionKind,
    /// Hex the effect lands on.
    pub target: HexCoord,
    /// Effect parameters.
    pub payload: EffectPayload,
}

/// Desired presentation state accumulated from render directives.
///
/// State directives use set semantics, so folding the same directive twice
/// leaves the presentation unchanged. Effects are queued in arrival order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BoardPresentation {
    tiles: BTreeMap<HexCoord, TileState>,
    overlays: BTreeMap<Overlay, BTreeSet<HexCoord>>,
    entities: BTreeMap<EntityId, HexCoord>,
    effects: Vec<PlayedEffect>,
}

impl BoardPresentation {
    /// Creates an empty presentation where every tile is open.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one directive into the presentation.
    pub fn apply(&mut self, command: &RenderCommand) {
        match command {
            RenderCommand::SetTileState { hex, state } => {
                let _ = self.tiles.insert(*hex, *state);
            }
            RenderCommand::ShowOverlay { overlay, hexes } => {
                self.overlays
                    .entry(*overlay)
                    .or_default()
                    .extend(hexes.iter().copied());
            }
            RenderCommand::HideOverlay { overlay, hexes } => {
                if let Some(marked) = self.overlays.get_mut(overlay) {
                    for hex in hexes {
                        let _ = marked.remove(hex);
                    }
                }
            }
            RenderCommand::PlayEffect {
                actor,
                action,
                target,
                payload,
            } => self.effects.push(PlayedEffect {
                actor: *actor,
                action: *action,
                target: *target,
                payload: *payload,
            }),
            RenderCommand::SpawnEntity { entity, hex } => {
                let _ = self.entities.insert(*entity, *hex);
            }
            RenderCommand::MoveEntity { entity, to } => {
                let _ = self.entities.insert(*entity, *to);
            }
            RenderCommand::RemoveEntity { entity } => {
                let _ = self.entities.remove(entity);
            }
        }
    }

    /// Folds every directive in order.
    pub fn apply_all<'a>(&mut self, commands: impl IntoIterator<Item = &'a RenderCommand>) {
        for command in commands {
            self.apply(command);
        }
    }

    /// Base class of the tile.
    #[must_use]
    pub fn tile_state(&self, hex: HexCoord) -> TileState {
        self.tiles.get(&hex).copied().unwrap_or(TileState::Open)
    }

    /// Reports whether the overlay is drawn on the hex.
    #[must_use]
    pub fn has_overlay(&self, hex: HexCoord, overlay: Overlay) -> bool {
        self.overlays
            .get(&overlay)
            .is_some_and(|marked| marked.contains(&hex))
    }

    /// Overlays drawn on the hex, lowest layer first.
    #[must_use]
    pub fn overlays_at(&self, hex: HexCoord) -> Vec<Overlay> {
        self.overlays
            .iter()
            .filter(|(_, marked)| marked.contains(&hex))
            .map(|(overlay, _)| *overlay)
            .collect()
    }

    /// Hexes carrying the overlay.
    pub fn overlay_hexes(&self, overlay: Overlay) -> impl Iterator<Item = HexCoord> + '_ {
        self.overlays.get(&overlay).into_iter().flatten().copied()
    }

    /// Hex the entity sprite stands on.
    #[must_use]
    pub fn entity_position(&self, entity: EntityId) -> Option<HexCoord> {
        self.entities.get(&entity).copied()
    }

    /// Entities with a sprite, ordered by id.
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, HexCoord)> + '_ {
        self.entities.iter().map(|(entity, hex)| (*entity, *hex))
    }

    /// Effects queued so far, in playback order.
    #[must_use]
    pub fn effects(&self) -> &[PlayedEffect] {
        &self.effects
    }

    /// Removes and returns the queued effects.
    pub fn drain_effects(&mut self) -> Vec<PlayedEffect> {
        std::mem::take(&mut self.effects)
    }

    /// Fill color of the hex: the topmost overlay, or the tile class.
    #[must_use]
    pub fn fill(&self, hex: HexCoord, palette: &TilePalette) -> Color {
        self.overlays_at(hex)
            .last()
            .map_or_else(|| palette.tile(self.tile_state(hex)), |top| palette.overlay(*top))
    }
}

/// Rendering backend capable of presenting board states.
pub trait RenderingBackend {
    /// Presents the board drawn with the provided layout.
    fn present(&mut self, board: &BoardPresentation, layout: &HexLayout) -> AnyResult<()>;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// Hexes must have a positive, finite size.
    InvalidHexSize {
        /// Provided size that failed validation.
        hex_size: f32,
    },
    /// Gaps must be finite and not negative.
    InvalidGap {
        /// Provided gap that failed validation.
        gap: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidHexSize { hex_size } => {
                write!(f, "hex size must be positive (received {hex_size})")
            }
            Self::InvalidGap { gap } => {
                write!(f, "hex gap must not be negative (received {gap})")
            }
        }
    }
}

impl Error for RenderingError {}
