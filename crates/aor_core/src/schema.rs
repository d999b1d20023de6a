//! Known field layout of character records and the label tables the editor
//! shows next to raw ids.

use serde::{Deserialize, Serialize};

pub struct StatDef {
    /// Current value, stored directly on the character record.
    pub key: &'static str,
    /// Base value, stored inside the owning nested object.
    pub base_key: &'static str,
    pub label: &'static str,
}

#[rustfmt::skip]
pub const ATTRIBUTES: [StatDef; 6] = [
    StatDef { key: "strength",     base_key: "BSstrength",     label: "Strength" },
    StatDef { key: "endurance",    base_key: "BSendurance",    label: "Endurance" },
    StatDef { key: "agility",      base_key: "BSagility",      label: "Agility" },
    StatDef { key: "precision",    base_key: "BSprecision",    label: "Precision" },
    StatDef { key: "intelligence", base_key: "BSintelligence", label: "Intelligence" },
    StatDef { key: "willpower",    base_key: "BSwillpower",    label: "Willpower" },
];

#[rustfmt::skip]
pub const SKILLS: [StatDef; 15] = [
    StatDef { key: "persuade",   base_key: "BSPersuade",   label: "Persuade" },
    StatDef { key: "bargain",    base_key: "BSBargain",    label: "Bargain" },
    StatDef { key: "intimidate", base_key: "BSIntimidate", label: "Intimidate" },
    StatDef { key: "pathfind",   base_key: "BSPathfind",   label: "Pathfinding" },
    StatDef { key: "insight",    base_key: "BSInsight",    label: "Insight" },
    StatDef { key: "sneak",      base_key: "BSSneak",      label: "Sneak" },
    StatDef { key: "mechanics",  base_key: "BSMechanics",  label: "Mechanics" },
    StatDef { key: "theft",      base_key: "BSTheft",      label: "Theft" },
    StatDef { key: "scholarly",  base_key: "BSScholarly",  label: "Scholarly" },
    StatDef { key: "smithing",   base_key: "BSSmithing",   label: "Smithing" },
    StatDef { key: "alchemy",    base_key: "BSAlchemy",    label: "Alchemy" },
    StatDef { key: "cooking",    base_key: "BSCooking",    label: "Cooking" },
    StatDef { key: "medical",    base_key: "BSMedical",    label: "Medical" },
    StatDef { key: "training",   base_key: "BSTraining",   label: "Training" },
    StatDef { key: "torture",    base_key: "BSTorture",    label: "Torture" },
];

pub const WEAPON_TYPES: [&str; 7] = [
    "One-Handed",
    "Two-Handed",
    "Polearm",
    "Blunt",
    "Ranged",
    "Short Blade",
    "Staff",
];

pub struct GaugeDef {
    pub key: &'static str,
    pub label: &'static str,
}

pub const STATUS_MAX: f64 = 100.0;

#[rustfmt::skip]
pub const STATUS_FIELDS: [GaugeDef; 4] = [
    GaugeDef { key: "health",  label: "Health" },
    GaugeDef { key: "morale",  label: "Morale" },
    GaugeDef { key: "vigor",   label: "Vigor" },
    GaugeDef { key: "satiety", label: "Satiety" },
];

/// Resource gauges; the fill ratio lives under `<key>PCT`.
#[rustfmt::skip]
pub const RESOURCE_FIELDS: [GaugeDef; 3] = [
    GaugeDef { key: "currenthp", label: "HP" },
    GaugeDef { key: "currentsp", label: "SP" },
    GaugeDef { key: "currentmp", label: "MP" },
];

#[rustfmt::skip]
pub const COMBAT_RECORD: [GaugeDef; 6] = [
    GaugeDef { key: "totalDamageDealt", label: "Total Damage Dealt" },
    GaugeDef { key: "totalDamageTaken", label: "Total Damage Taken" },
    GaugeDef { key: "killCount",        label: "Kill Count" },
    GaugeDef { key: "killHumanoid",     label: "Humanoid Kills" },
    GaugeDef { key: "killBeasts",       label: "Beast Kills" },
    GaugeDef { key: "fallCount",        label: "Fall Count" },
];

pub const NAME_KEY: &str = "unitname";

pub fn career_name(id: i64) -> String {
    let known = match id {
        0 => "Fighter",
        1 => "Guard",
        2 => "Merchant",
        3 => "Blacksmith",
        4 => "Doctor",
        5 => "Adventurer",
        6 => "Innkeeper",
        7 => "Noble",
        8 => "Beast Handler",
        9 => "Attendant",
        10 => "Bandit",
        15 => "Villager",
        _ => return format!("Career {id}"),
    };
    known.to_string()
}

pub fn gender_name(id: i64) -> String {
    match id {
        1 => "Male".to_string(),
        2 => "Female".to_string(),
        _ => format!("Gender {id}"),
    }
}

pub fn race_name(id: i64) -> String {
    match id {
        1 => "Human".to_string(),
        2 => "Elf".to_string(),
        3 => "Dwarf".to_string(),
        11 => "Animal".to_string(),
        _ => format!("Race {id}"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NestedObject {
    HumanAttribute,
    HumanTalent,
    HeroCareer,
}

impl NestedObject {
    pub const ALL: [NestedObject; 3] = [Self::HumanAttribute, Self::HumanTalent, Self::HeroCareer];

    pub fn key(self) -> &'static str {
        match self {
            Self::HumanAttribute => "humanAttribute",
            Self::HumanTalent => "humanTalent",
            Self::HeroCareer => "heroCareer",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|n| n.key() == key)
    }
}

/// Longest a positional array may grow through a single write.
pub const MAX_POSITIONAL_LEN: usize = 64;

/// Arrays indexed in parallel with one of the fixed lists above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PositionalArray {
    AttExp,
    SkillExp,
    WeaponMastery,
    WeaponMasteryExp,
}

impl PositionalArray {
    pub const ALL: [PositionalArray; 4] = [
        Self::AttExp,
        Self::SkillExp,
        Self::WeaponMastery,
        Self::WeaponMasteryExp,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::AttExp => "attEXP",
            Self::SkillExp => "skillEXP",
            Self::WeaponMastery => "weaponMastery",
            Self::WeaponMasteryExp => "weaponMasteryEXP",
        }
    }

    /// Nested object holding the array, or `None` when it sits on the record.
    pub fn parent(self) -> Option<NestedObject> {
        match self {
            Self::AttExp => Some(NestedObject::HumanAttribute),
            Self::SkillExp => Some(NestedObject::HumanTalent),
            Self::WeaponMastery | Self::WeaponMasteryExp => None,
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.key() == key)
    }
}

/// Variable-length lists on a character record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CharacterList {
    Spells,
    Talents,
    Traits,
    Items,
}

impl CharacterList {
    pub const ALL: [CharacterList; 4] = [Self::Spells, Self::Talents, Self::Traits, Self::Items];

    pub fn key(self) -> &'static str {
        match self {
            Self::Spells => "spells",
            Self::Talents => "talents",
            Self::Traits => "traits",
            Self::Items => "items",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.key() == key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Number,
    Text,
    Flag,
}

pub fn field_kind(key: &str) -> FieldKind {
    match key {
        NAME_KEY => FieldKind::Text,
        "isActivated" => FieldKind::Flag,
        _ => FieldKind::Number,
    }
}

/// Numeric coercion of raw form input, following the scripting runtime's
/// `Number(text)`: surrounding whitespace is ignored, blank input is zero and
/// anything unparseable is NaN.
pub fn coerce_number(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        return u64::from_str_radix(hex, 16).map_or(f64::NAN, |v| v as f64);
    }
    // Rust's float parser also accepts "inf" and "nan"; the runtime does not.
    let numeric_chars = trimmed
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if !numeric_chars {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

pub fn coerce_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "on" | "yes"
    )
}
