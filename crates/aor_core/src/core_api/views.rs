use crate::schema::{
    self, ATTRIBUTES, COMBAT_RECORD, CharacterList, NestedObject, PositionalArray,
    RESOURCE_FIELDS, SKILLS, STATUS_FIELDS, STATUS_MAX, StatDef, WEAPON_TYPES,
};
use crate::value::{SaveValue, number_at};

use super::engine::Session;
use super::lookup::{LookupKind, LookupTables};
use super::types::{
    AddonEntry, CharacterSearch, CharacterSheet, CharacterSummary, CounterEntry, GameBar,
    GaugeEntry, ItemEntry, LeveledEntry, StatEntry, TraitEntry, WeaponMasteryEntry,
};

impl Session {
    pub fn game_bar(&self) -> GameBar {
        let doc = self.document();
        let game_time = doc.get("gameTime");
        GameBar {
            wealth: number_at(doc, "wealth"),
            reputation: number_at(doc, "reputation"),
            day: game_time.map_or(0.0, |gt| number_at(gt, "day")),
            year: game_time.map_or(0.0, |gt| number_at(gt, "year")),
            version: doc.get("currentVersion").and_then(|v| match v {
                SaveValue::Null => None,
                other => Some(other.to_string()),
            }),
            character_count: self.npcs().len(),
        }
    }

    pub fn party_ids(&self) -> Vec<i64> {
        self.document()
            .get("party")
            .and_then(|party| party.get("membersID"))
            .and_then(SaveValue::as_array)
            .map(|ids| ids.iter().filter_map(SaveValue::as_i64).collect())
            .unwrap_or_default()
    }

    pub fn character_index(&self, id: i64) -> Option<usize> {
        self.npcs()
            .iter()
            .position(|npc| npc.get("id").and_then(SaveValue::as_i64) == Some(id))
    }

    /// The character an editor opens on: the first party member, else the
    /// first character in the save.
    pub fn default_character_id(&self) -> Option<i64> {
        self.party_ids().into_iter().next().or_else(|| {
            self.npcs()
                .first()
                .and_then(|npc| npc.get("id"))
                .and_then(SaveValue::as_i64)
        })
    }

    pub fn characters(&self) -> Vec<CharacterSummary> {
        let party = self.party_ids();
        self.npcs()
            .iter()
            .enumerate()
            .filter_map(|(index, npc)| summarize(index, npc, &party))
            .collect()
    }

    /// Party members in party order; ids without a record are dropped.
    pub fn party_members(&self) -> Vec<CharacterSummary> {
        let party = self.party_ids();
        party
            .iter()
            .filter_map(|&id| {
                let index = self.character_index(id)?;
                summarize(index, &self.npcs()[index], &party)
            })
            .collect()
    }

    /// Non-party characters whose name or id contains `query`
    /// (case-insensitive), at most `limit` of them.
    pub fn search_characters(&self, query: &str, limit: usize) -> CharacterSearch {
        let needle = query.trim().to_lowercase();
        let matches: Vec<CharacterSummary> = self
            .characters()
            .into_iter()
            .filter(|c| !c.in_party)
            .filter(|c| {
                needle.is_empty()
                    || c.name.to_lowercase().contains(&needle)
                    || c.id.to_string().contains(&needle)
            })
            .collect();
        let total = matches.len();
        CharacterSearch {
            total,
            characters: matches.into_iter().take(limit).collect(),
        }
    }

    pub fn character_sheet(&self, index: usize, lookups: &LookupTables) -> Option<CharacterSheet> {
        let npc = self.npcs().get(index)?;
        let summary = summarize(index, npc, &self.party_ids())?;
        let attribute = npc.get(NestedObject::HumanAttribute.key());
        let talent = npc.get(NestedObject::HumanTalent.key());
        let career = npc.get(NestedObject::HeroCareer.key());

        Some(CharacterSheet {
            summary,
            gender: schema::gender_name(id_at(npc, "gender")),
            race: schema::race_name(id_at(npc, "race")),
            exp: number_at(npc, "exp"),
            money: number_at(npc, "money"),
            potential: attribute.map_or(0.0, |a| number_at(a, "potential")),
            goodness: number_at(npc, "goodness"),
            lawfulness: number_at(npc, "lawfulness"),
            attributes: stat_entries(npc, attribute, &ATTRIBUTES, PositionalArray::AttExp),
            skills: stat_entries(npc, talent, &SKILLS, PositionalArray::SkillExp),
            weapon_mastery: weapon_mastery(npc),
            status: STATUS_FIELDS
                .iter()
                .map(|def| {
                    let value = number_at(npc, def.key);
                    GaugeEntry {
                        key: def.key.to_string(),
                        label: def.label.to_string(),
                        value,
                        percent: (value / STATUS_MAX * 100.0).clamp(0.0, 100.0),
                    }
                })
                .collect(),
            resources: RESOURCE_FIELDS
                .iter()
                .map(|def| GaugeEntry {
                    key: def.key.to_string(),
                    label: def.label.to_string(),
                    value: number_at(npc, def.key),
                    percent: number_at(npc, &format!("{}PCT", def.key)) * 100.0,
                })
                .collect(),
            combat_record: COMBAT_RECORD
                .iter()
                .map(|def| CounterEntry {
                    key: def.key.to_string(),
                    label: def.label.to_string(),
                    value: career.map_or(0.0, |c| number_at(c, def.key)),
                })
                .collect(),
            spells: leveled_entries(npc, CharacterList::Spells),
            talents: leveled_entries(npc, CharacterList::Talents),
            traits: list(npc, CharacterList::Traits)
                .iter()
                .enumerate()
                .map(|(index, entry)| {
                    let id = entry.as_i64();
                    TraitEntry {
                        index,
                        id,
                        name: resolve(lookups, LookupKind::Traits, id),
                    }
                })
                .collect(),
            items: list(npc, CharacterList::Items)
                .iter()
                .enumerate()
                .map(|(index, entry)| item_entry(index, entry, lookups))
                .collect(),
        })
    }

    fn npcs(&self) -> &[SaveValue] {
        self.document()
            .get("npcs")
            .and_then(SaveValue::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn summarize(index: usize, npc: &SaveValue, party: &[i64]) -> Option<CharacterSummary> {
    let id = npc.get("id").and_then(SaveValue::as_i64)?;
    Some(CharacterSummary {
        index,
        id,
        name: npc
            .get(schema::NAME_KEY)
            .map(ToString::to_string)
            .unwrap_or_default(),
        level: number_at(npc, "level"),
        career: schema::career_name(id_at(npc, "career")),
        power: number_at(npc, "power"),
        in_party: party.contains(&id),
    })
}

fn id_at(value: &SaveValue, key: &str) -> i64 {
    value.get(key).and_then(SaveValue::as_i64).unwrap_or_default()
}

fn list(npc: &SaveValue, list: CharacterList) -> &[SaveValue] {
    npc.get(list.key())
        .and_then(SaveValue::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn positional(container: Option<&SaveValue>, array: PositionalArray, index: usize) -> f64 {
    container
        .and_then(|c| c.get(array.key()))
        .and_then(SaveValue::as_array)
        .and_then(|values| values.get(index))
        .map_or(0.0, SaveValue::number_or_zero)
}

fn stat_entries(
    npc: &SaveValue,
    nested: Option<&SaveValue>,
    defs: &[StatDef],
    exp_array: PositionalArray,
) -> Vec<StatEntry> {
    defs.iter()
        .enumerate()
        .map(|(index, def)| StatEntry {
            index,
            key: def.key.to_string(),
            label: def.label.to_string(),
            base: nested.map_or(0.0, |n| number_at(n, def.base_key)),
            current: number_at(npc, def.key),
            exp: positional(nested, exp_array, index),
        })
        .collect()
}

fn weapon_mastery(npc: &SaveValue) -> Vec<WeaponMasteryEntry> {
    WEAPON_TYPES
        .iter()
        .enumerate()
        .map(|(index, label)| WeaponMasteryEntry {
            index,
            label: (*label).to_string(),
            level: positional(Some(npc), PositionalArray::WeaponMastery, index),
            exp: positional(Some(npc), PositionalArray::WeaponMasteryExp, index),
        })
        .collect()
}

fn leveled_entries(npc: &SaveValue, kind: CharacterList) -> Vec<LeveledEntry> {
    list(npc, kind)
        .iter()
        .enumerate()
        .map(|(index, entry)| LeveledEntry {
            index,
            id: entry.get("id").and_then(SaveValue::as_i64),
            level: number_at(entry, "lv"),
            active: entry.get("isActivated").and_then(SaveValue::as_bool),
        })
        .collect()
}

fn item_entry(index: usize, entry: &SaveValue, lookups: &LookupTables) -> ItemEntry {
    let id = entry.get("id").and_then(SaveValue::as_i64);
    let addons = entry
        .get("addAttrs")
        .and_then(SaveValue::as_array)
        .map(|attrs| {
            attrs
                .iter()
                .map(|attr| {
                    let (id, value) = match attr {
                        SaveValue::Number(_) => (attr.as_i64(), None),
                        _ => (
                            attr.get("id").and_then(SaveValue::as_i64),
                            attr.get("value").and_then(SaveValue::as_f64),
                        ),
                    };
                    AddonEntry {
                        id,
                        name: resolve(lookups, LookupKind::AddonAttributes, id),
                        value,
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    ItemEntry {
        index,
        id,
        name: resolve(lookups, LookupKind::Items, id),
        slot_index: number_at(entry, "slotIndex"),
        stack_num: number_at(entry, "stackNum"),
        quality: number_at(entry, "quality"),
        durability: number_at(entry, "durability"),
        addons,
    }
}

fn resolve(lookups: &LookupTables, kind: LookupKind, id: Option<i64>) -> String {
    match id {
        Some(id) => lookups.resolve(kind, id),
        None => "#?".to_string(),
    }
}
