use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameBar {
    pub wealth: f64,
    pub reputation: f64,
    pub day: f64,
    pub year: f64,
    pub version: Option<String>,
    pub character_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSummary {
    /// Position in `npcs`; the handle every character edit takes.
    pub index: usize,
    pub id: i64,
    pub name: String,
    pub level: f64,
    pub career: String,
    pub power: f64,
    pub in_party: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSearch {
    /// Matches before the limit was applied.
    pub total: usize,
    pub characters: Vec<CharacterSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatEntry {
    pub index: usize,
    pub key: String,
    pub label: String,
    pub base: f64,
    pub current: f64,
    pub exp: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponMasteryEntry {
    pub index: usize,
    pub label: String,
    pub level: f64,
    pub exp: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaugeEntry {
    pub key: String,
    pub label: String,
    pub value: f64,
    /// Fill level in 0..=100.
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterEntry {
    pub key: String,
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeveledEntry {
    pub index: usize,
    pub id: Option<i64>,
    pub level: f64,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitEntry {
    pub index: usize,
    pub id: Option<i64>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddonEntry {
    pub id: Option<i64>,
    pub name: String,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemEntry {
    pub index: usize,
    pub id: Option<i64>,
    pub name: String,
    pub slot_index: f64,
    pub stack_num: f64,
    pub quality: f64,
    pub durability: f64,
    pub addons: Vec<AddonEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSheet {
    pub summary: CharacterSummary,
    pub gender: String,
    pub race: String,
    pub exp: f64,
    pub money: f64,
    pub potential: f64,
    pub goodness: f64,
    pub lawfulness: f64,
    pub attributes: Vec<StatEntry>,
    pub skills: Vec<StatEntry>,
    pub weapon_mastery: Vec<WeaponMasteryEntry>,
    pub status: Vec<GaugeEntry>,
    pub resources: Vec<GaugeEntry>,
    pub combat_record: Vec<CounterEntry>,
    pub spells: Vec<LeveledEntry>,
    pub talents: Vec<LeveledEntry>,
    pub traits: Vec<TraitEntry>,
    pub items: Vec<ItemEntry>,
}
