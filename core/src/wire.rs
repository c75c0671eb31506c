//! Wire schema exchanged with the game server.
//!
//! The initial [`GameSnapshot`] seeds the world; every submitted
//! [`ActionRequest`](crate::ActionRequest) is answered by an
//! [`ActionResponse`]. Object-typed maps whose order carries meaning (turn
//! order of units, order of named actions) are read into [`OrderedEntries`].

use std::{collections::BTreeMap, fmt, marker::PhantomData};

use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::{ActionStep, HexCoord, Occupancy, StructureId, UnitId};

/// Map that keeps its entries in document order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderedEntries<K, V>(Vec<(K, V)>);

impl<K, V> OrderedEntries<K, V> {
    /// Creates an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Iterator over the entries in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.0.iter().map(|(key, value)| (key, value))
    }

    /// Iterator over the keys in document order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.0.iter().map(|(key, _)| key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Reports whether the collection holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Appends an entry after every existing one.
    pub fn push(&mut self, key: K, value: V) {
        self.0.push((key, value));
    }
}

impl<K: PartialEq, V> OrderedEntries<K, V> {
    /// Value stored under the first occurrence of `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.0
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, value)| value)
    }
}

impl<K, V> Default for OrderedEntries<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> FromIterator<(K, V)> for OrderedEntries<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<K, V> IntoIterator for OrderedEntries<K, V> {
    type Item = (K, V);
    type IntoIter = std::vec::IntoIter<(K, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<K: Serialize, V: Serialize> Serialize for OrderedEntries<K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de, K, V> Deserialize<'de> for OrderedEntries<K, V>
where
    K: Deserialize<'de>,
    V: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(OrderedEntriesVisitor(PhantomData))
    }
}

struct OrderedEntriesVisitor<K, V>(PhantomData<fn() -> (K, V)>);

impl<'de, K, V> Visitor<'de> for OrderedEntriesVisitor<K, V>
where
    K: Deserialize<'de>,
    V: Deserialize<'de>,
{
    type Value = OrderedEntries<K, V>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry()? {
            entries.push((key, value));
        }
        Ok(OrderedEntries(entries))
    }
}

/// Combat statistics shared by the hero and units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CombatStats {
    /// Remaining hit points.
    pub health: i32,
    /// Flat damage reduction.
    #[serde(default)]
    pub armor: i32,
    /// Damage dealt by a basic attack.
    #[serde(default)]
    pub damage: i32,
    /// Melee reach in hexes.
    #[serde(default = "default_range")]
    pub attack_range: u32,
    /// Hexes the actor may walk per turn.
    #[serde(default = "default_range")]
    pub move_range: u32,
}

const fn default_range() -> u32 {
    1
}

/// Effect parameters of a spell the hero knows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpellParams {
    /// Targeting radius around the hero.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<u32>,
    /// Length of a directional ray.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_length: Option<u32>,
}

/// Occupancy of a single hex as listed by the server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardHex {
    /// Axial column.
    pub q: i32,
    /// Axial row.
    pub r: i32,
    /// Occupancy tag.
    pub slot: Occupancy,
}

impl BoardHex {
    /// Coordinate of the listed hex.
    #[must_use]
    pub const fn coord(&self) -> HexCoord {
        HexCoord::new(self.q, self.r)
    }
}

/// Board portion of a snapshot or response.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoardData {
    /// Board radius; required in snapshots, ignored in responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<u32>,
    /// Hexes whose occupancy the server reports.
    #[serde(default)]
    pub hexes: Vec<BoardHex>,
}

/// Hero payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroData {
    /// Hex the hero stands on.
    pub position: HexCoord,
    /// Combat statistics.
    #[serde(flatten)]
    pub stats: CombatStats,
    /// Hexes reachable this turn; derived locally when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moves: Option<Vec<HexCoord>>,
    /// Hexes the hero threatens in melee; derived locally when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attack_hexes: Option<Vec<HexCoord>>,
    /// Hexes one band beyond melee reach; derived locally when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_attack_hexes: Option<Vec<HexCoord>>,
    /// Known spells keyed by code name.
    #[serde(default)]
    pub spells: BTreeMap<String, SpellParams>,
}

/// Unit payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitData {
    /// Stable external id.
    pub pk: UnitId,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Hex the unit stands on.
    pub position: HexCoord,
    /// Combat statistics.
    #[serde(flatten)]
    pub stats: CombatStats,
    /// Hexes reachable this turn; derived locally when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moves: Option<Vec<HexCoord>>,
    /// Hexes the unit threatens; derived locally when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attack_hexes: Option<Vec<HexCoord>>,
}

/// Structure payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureData {
    /// Hex the structure is bound to.
    pub position: HexCoord,
    /// Kind of structure, such as `exit` or `shop`.
    pub code_name: String,
}

/// Initial game state handed to the client when a session starts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Board radius and initial occupancy.
    pub board: BoardData,
    /// The hero.
    pub hero: HeroData,
    /// Units keyed by id.
    #[serde(default)]
    pub units: OrderedEntries<UnitId, UnitData>,
    /// Structures keyed by id.
    #[serde(default)]
    pub structures: OrderedEntries<StructureId, StructureData>,
}

/// Outcome reported by the server for a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseState {
    /// The request was accepted and resolved.
    Success,
    /// Anything other than success.
    #[serde(other)]
    Failure,
}

/// Status envelope of a response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionData {
    /// Whether the request succeeded.
    pub state: ResponseState,
}

/// Named step lists of one actor, in document order.
pub type ActorActions = OrderedEntries<String, Vec<ActionStep>>;

/// Authoritative answer to an [`ActionRequest`](crate::ActionRequest).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    /// Success or failure envelope.
    pub action_data: ActionData,
    /// Occupancy diff.
    #[serde(default)]
    pub board: BoardData,
    /// Updated hero, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero: Option<HeroData>,
    /// Complete set of surviving units, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<OrderedEntries<UnitId, UnitData>>,
    /// Complete set of structures, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structures: Option<OrderedEntries<StructureId, StructureData>>,
    /// Hero actions resolved by this response.
    #[serde(default)]
    pub hero_actions: ActorActions,
    /// Unit actions in turn order.
    #[serde(default)]
    pub units_actions: OrderedEntries<UnitId, ActorActions>,
}

impl ActionResponse {
    /// Reports whether the server accepted the request.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.action_data.state == ResponseState::Success
    }

    /// Minimal failure response.
    #[must_use]
    pub fn failure() -> Self {
        Self {
            action_data: ActionData {
                state: ResponseState::Failure,
            },
            board: BoardData::default(),
            hero: None,
            units: None,
            structures: None,
            hero_actions: OrderedEntries::new(),
            units_actions: OrderedEntries::new(),
        }
    }
}
