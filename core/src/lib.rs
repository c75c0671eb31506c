#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Circles of Hell client engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative [`world`](../circles_world/index.html) state, and the pure
//! action systems. Adapters forward pointer input to the action controller,
//! which answers with [`ActionRequest`] values for the network and
//! [`RenderCommand`] values for the presentation layer. Server responses are
//! described by the [`wire`] schema and replayed as ordered [`ActionStep`]s.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod wire;

/// Axial offsets of the six hex neighbours, in the canonical probing order.
pub const HEX_DIRECTIONS: [(i32, i32); 6] = [(1, 0), (1, -1), (0, -1), (-1, 0), (-1, 1), (0, 1)];

/// Separator between the two axial components of a hex key.
const KEY_SEPARATOR: char = ';';

/// Location of a single board hex expressed in axial coordinates.
///
/// The identity key of a hex is the string `"q;r"`; this is also its wire
/// representation. Cube coordinates are derived as `x = q`, `z = r` and
/// `y = -q - r`, so `x + y + z = 0` always holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexCoord {
    q: i32,
    r: i32,
}

impl HexCoord {
    /// Creates a new axial coordinate.
    #[must_use]
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Axial column component.
    #[must_use]
    pub const fn q(&self) -> i32 {
        self.q
    }

    /// Axial row component.
    #[must_use]
    pub const fn r(&self) -> i32 {
        self.r
    }

    /// Cube coordinates `(x, y, z)` derived from the axial pair.
    #[must_use]
    pub const fn cube(&self) -> (i32, i32, i32) {
        (self.q, -self.q - self.r, self.r)
    }

    /// Returns the coordinate displaced by the provided axial offset.
    #[must_use]
    pub const fn offset(self, dq: i32, dr: i32) -> Self {
        Self::new(self.q + dq, self.r + dr)
    }

    /// Hex distance: the largest absolute difference between cube components.
    #[must_use]
    pub fn distance(self, other: HexCoord) -> u32 {
        let (ax, ay, az) = self.cube();
        let (bx, by, bz) = other.cube();
        ax.abs_diff(bx).max(ay.abs_diff(by)).max(az.abs_diff(bz))
    }

    /// Distance from the board centre `(0, 0)`.
    #[must_use]
    pub fn distance_from_center(self) -> u32 {
        self.distance(Self::new(0, 0))
    }

    /// Iterator over the six adjacent coordinates in [`HEX_DIRECTIONS`] order.
    ///
    /// Coordinates are produced regardless of any board bounds.
    pub fn adjacent(self) -> impl Iterator<Item = HexCoord> {
        HEX_DIRECTIONS
            .into_iter()
            .map(move |(dq, dr)| self.offset(dq, dr))
    }
}

impl fmt::Display for HexCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{KEY_SEPARATOR}{}", self.q, self.r)
    }
}

impl FromStr for HexCoord {
    type Err = ParseHexKeyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (q, r) = value
            .split_once(KEY_SEPARATOR)
            .ok_or_else(|| ParseHexKeyError::MissingSeparator(value.to_owned()))?;
        let q = q
            .trim()
            .parse()
            .map_err(|_| ParseHexKeyError::InvalidComponent(value.to_owned()))?;
        let r = r
            .trim()
            .parse()
            .map_err(|_| ParseHexKeyError::InvalidComponent(value.to_owned()))?;
        Ok(Self::new(q, r))
    }
}

impl TryFrom<String> for HexCoord {
    type Error = ParseHexKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HexCoord> for String {
    fn from(value: HexCoord) -> Self {
        value.to_string()
    }
}

/// Reasons a hex key string could not be parsed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseHexKeyError {
    /// The key did not contain the `;` separator.
    #[error("hex key `{0}` is missing the `;` separator")]
    MissingSeparator(String),
    /// One of the components was not an integer.
    #[error("hex key `{0}` has a non-integer component")]
    InvalidComponent(String),
}

/// Stable external identifier of a hostile unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a non-combat structure bound to a hex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructureId(u32);

impl StructureId {
    /// Creates a new structure identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for StructureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Any positioned actor or object the engine tracks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityId {
    /// The singleton player hero.
    Hero,
    /// A hostile unit.
    Unit(UnitId),
    /// A clickable structure.
    Structure(StructureId),
}

/// Kind of content sitting on a hex, without entity identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    /// Nothing occupies the hex.
    Empty,
    /// Impassable terrain.
    Obstacle,
    /// The hero stands on the hex.
    Hero,
    /// A unit stands on the hex.
    Unit,
    /// A structure is bound to the hex.
    Structure,
}

/// Occupancy tag stored on every hex.
///
/// Serialized as `"empty"`, `"obstacle"`, `"hero"`, `"unit:<pk>"` or
/// `"structure:<id>"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Occupancy {
    /// Nothing occupies the hex.
    #[default]
    Empty,
    /// Impassable terrain.
    Obstacle,
    /// The hero stands on the hex.
    Hero,
    /// The identified unit stands on the hex.
    Unit(UnitId),
    /// The identified structure is bound to the hex.
    Structure(StructureId),
}

impl Occupancy {
    /// Kind of content, discarding identity.
    #[must_use]
    pub const fn slot(&self) -> Slot {
        match self {
            Self::Empty => Slot::Empty,
            Self::Obstacle => Slot::Obstacle,
            Self::Hero => Slot::Hero,
            Self::Unit(_) => Slot::Unit,
            Self::Structure(_) => Slot::Structure,
        }
    }

    /// Reports whether the hex is free for traversal.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Reports whether the hex holds something the hero can interact with.
    #[must_use]
    pub const fn is_interactive(&self) -> bool {
        matches!(self, Self::Unit(_) | Self::Structure(_))
    }

    /// Entity bound to the hex, if any.
    #[must_use]
    pub const fn entity(&self) -> Option<EntityId> {
        match self {
            Self::Hero => Some(EntityId::Hero),
            Self::Unit(id) => Some(EntityId::Unit(*id)),
            Self::Structure(id) => Some(EntityId::Structure(*id)),
            Self::Empty | Self::Obstacle => None,
        }
    }

    /// Tile class the renderer should display for this occupancy.
    #[must_use]
    pub const fn tile_state(&self) -> TileState {
        match self {
            Self::Empty => TileState::Open,
            Self::Obstacle => TileState::Obstacle,
            Self::Hero | Self::Unit(_) | Self::Structure(_) => TileState::Occupied,
        }
    }
}

impl fmt::Display for Occupancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("empty"),
            Self::Obstacle => f.write_str("obstacle"),
            Self::Hero => f.write_str("hero"),
            Self::Unit(id) => write!(f, "unit:{id}"),
            Self::Structure(id) => write!(f, "structure:{id}"),
        }
    }
}

impl FromStr for Occupancy {
    type Err = ParseSlotError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "empty" => return Ok(Self::Empty),
            "obstacle" => return Ok(Self::Obstacle),
            "hero" => return Ok(Self::Hero),
            _ => {}
        }

        let Some((kind, id)) = value.split_once(':') else {
            return Err(ParseSlotError::Unknown(value.to_owned()));
        };
        let id: u32 = id
            .parse()
            .map_err(|_| ParseSlotError::InvalidId(value.to_owned()))?;
        match kind {
            "unit" => Ok(Self::Unit(UnitId::new(id))),
            "structure" => Ok(Self::Structure(StructureId::new(id))),
            _ => Err(ParseSlotError::Unknown(value.to_owned())),
        }
    }
}

impl TryFrom<String> for Occupancy {
    type Error = ParseSlotError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Occupancy> for String {
    fn from(value: Occupancy) -> Self {
        value.to_string()
    }
}

/// Reasons a slot string could not be parsed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseSlotError {
    /// The slot kind is not one of the recognised tags.
    #[error("unknown slot `{0}`")]
    Unknown(String),
    /// The entity id attached to the slot is not an integer.
    #[error("slot `{0}` carries a non-integer id")]
    InvalidId(String),
}

/// Tile class derived from a hex's occupancy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileState {
    /// Walkable tile.
    Open,
    /// Impassable terrain tile.
    Obstacle,
    /// Tile holding an entity.
    Occupied,
}

/// Catalog of player intents known to the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Walk to a hex; the default resting action.
    Move,
    /// Melee strike against an adjacent unit.
    Attack,
    /// Ranged strike one band beyond melee reach.
    RangeAttack,
    /// Directional fire ray spell.
    PathOfFire,
    /// Short-range bash that pushes struck units.
    ShieldBash,
    /// Teleport spell.
    Blink,
}

impl ActionKind {
    /// Every action in catalog order.
    pub const ALL: [ActionKind; 6] = [
        Self::Move,
        Self::Attack,
        Self::RangeAttack,
        Self::PathOfFire,
        Self::ShieldBash,
        Self::Blink,
    ];

    /// Wire name of the action.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Attack => "attack",
            Self::RangeAttack => "range_attack",
            Self::PathOfFire => "path_of_fire",
            Self::ShieldBash => "shield_bash",
            Self::Blink => "blink",
        }
    }

    /// Reports whether the action is a spell the hero must know to arm.
    #[must_use]
    pub const fn is_spell(&self) -> bool {
        matches!(self, Self::PathOfFire | Self::ShieldBash | Self::Blink)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = ParseActionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| ParseActionError(value.to_owned()))
    }
}

/// Raised when an action name is not part of the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown action `{0}`")]
pub struct ParseActionError(pub String);

/// Anything that can be routed pointer input: a hex or an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetId {
    /// A board hex addressed by its key.
    Hex(HexCoord),
    /// A positioned entity.
    Entity(EntityId),
}

/// Target carried by an [`ActionRequest`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestTarget {
    /// Hex key, serialized as `"q;r"`.
    Hex(HexCoord),
    /// Unit primary key, serialized as a number.
    Unit(UnitId),
}

/// Request submitted to the network client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Requested action.
    pub action: ActionKind,
    /// Hex or unit the action is aimed at.
    pub target: RequestTarget,
}

impl ActionRequest {
    /// Request aimed at a hex.
    #[must_use]
    pub const fn at_hex(action: ActionKind, hex: HexCoord) -> Self {
        Self {
            action,
            target: RequestTarget::Hex(hex),
        }
    }

    /// Request aimed at a unit.
    #[must_use]
    pub const fn against_unit(action: ActionKind, unit: UnitId) -> Self {
        Self {
            action,
            target: RequestTarget::Unit(unit),
        }
    }
}

/// One ordered, server-declared atomic effect of a resolved action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionStep {
    /// Hex the effect lands on.
    pub target_hex: HexCoord,
    /// Damage dealt to whatever stands on `target_hex`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage: Option<i32>,
    /// Hex the struck entity is pushed to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pushed_to: Option<HexCoord>,
    /// Marks the hex the player aimed at when an effect spans several hexes.
    #[serde(default, skip_serializing_if = "is_false")]
    pub main_target: bool,
}

impl ActionStep {
    /// Step that only names its target hex.
    #[must_use]
    pub const fn at(target_hex: HexCoord) -> Self {
        Self {
            target_hex,
            damage: None,
            pushed_to: None,
            main_target: false,
        }
    }

    /// Returns the step with the provided damage attached.
    #[must_use]
    pub const fn with_damage(mut self, damage: i32) -> Self {
        self.damage = Some(damage);
        self
    }

    /// Returns the step with a push destination attached.
    #[must_use]
    pub const fn with_push(mut self, pushed_to: HexCoord) -> Self {
        self.pushed_to = Some(pushed_to);
        self
    }

    /// Returns the step flagged as the main target.
    #[must_use]
    pub const fn as_main_target(mut self) -> Self {
        self.main_target = true;
        self
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Whether an actor's named action produced any effect in a response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The action was listed without effects.
    NoOp,
    /// The action resolved into the provided ordered steps.
    Resolved(Vec<ActionStep>),
}

impl ActionOutcome {
    /// Classifies a step list received from the server.
    #[must_use]
    pub fn from_steps(steps: Vec<ActionStep>) -> Self {
        if steps.is_empty() {
            Self::NoOp
        } else {
            Self::Resolved(steps)
        }
    }
}

/// Highlight layers the presentation layer draws on top of tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Overlay {
    /// Generic legal-target marker installed for spells.
    SpellTarget,
    /// Unit that can be struck by the armed attack.
    AttackTarget,
    /// Attack target currently under the pointer.
    FocusedAttackTarget,
    /// Previewed movement path.
    Path,
    /// Secondary preview computed on hover (ray, ring, landing hex).
    Secondary,
}

/// Parameters attached to an effect the renderer should play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectPayload {
    /// Damage number to display, if any.
    pub damage: Option<i32>,
    /// Destination of a push, if any.
    pub pushed_to: Option<HexCoord>,
    /// Whether the hex was the aimed-at hex.
    pub main_target: bool,
    /// Position of the step within its action, starting at zero.
    pub sequence: usize,
}

/// Declarative directives emitted for the presentation layer.
///
/// The engine never draws; it only describes the desired presentation state
/// and the effects to play, in the order they must be played.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum RenderCommand {
    /// Sets the base tile class of a hex.
    SetTileState {
        /// Hex whose tile changes.
        hex: HexCoord,
        /// Class to display.
        state: TileState,
    },
    /// Adds an overlay to every listed hex.
    ShowOverlay {
        /// Overlay layer to add.
        overlay: Overlay,
        /// Hexes receiving the overlay.
        hexes: Vec<HexCoord>,
    },
    /// Removes an overlay from every listed hex.
    HideOverlay {
        /// Overlay layer to remove.
        overlay: Overlay,
        /// Hexes losing the overlay.
        hexes: Vec<HexCoord>,
    },
    /// Plays the visual effect of one resolved action step.
    PlayEffect {
        /// Entity performing the action.
        actor: EntityId,
        /// Action the step belongs to.
        action: ActionKind,
        /// Hex the effect lands on.
        target: HexCoord,
        /// Effect parameters.
        payload: EffectPayload,
    },
    /// Introduces a newly observed entity.
    SpawnEntity {
        /// Entity that appeared.
        entity: EntityId,
        /// Hex the entity stands on.
        hex: HexCoord,
    },
    /// Moves an entity sprite to a new hex.
    MoveEntity {
        /// Entity that moved.
        entity: EntityId,
        /// Destination hex.
        to: HexCoord,
    },
    /// Removes an entity that is no longer present.
    RemoveEntity {
        /// Entity that disappeared.
        entity: EntityId,
    },
}
