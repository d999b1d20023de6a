use std::fmt::Write as _;

use aor_core::core_api::{
    CharacterSheet, CharacterSummary, GameBar, GaugeEntry, ItemEntry, LeveledEntry, LookupTables,
    Session, StatEntry,
};
use aor_core::value::format_number;
use serde_json::{Map as JsonMap, Value as JsonValue};

/// Most characters a search lists.
pub const SEARCH_LIMIT: usize = 100;

const SHEET_WIDTH: usize = 76;
const TWO_COL_WIDTH_LEFT: usize = 38;
const TWO_COL_WIDTH_RIGHT: usize = 38;
const THREE_COL_WIDTH: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonStyle {
    #[default]
    CanonicalV1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextRenderOptions {
    /// Also list zero counters and every pending path.
    pub verbose: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FieldSelection {
    pub wealth: bool,
    pub reputation: bool,
    pub game_date: bool,
    pub party: bool,
    pub characters: bool,
    pub search: Option<String>,
    pub pending: bool,
}

impl FieldSelection {
    pub fn is_any_selected(&self) -> bool {
        self.wealth
            || self.reputation
            || self.game_date
            || self.party
            || self.characters
            || self.search.is_some()
            || self.pending
    }
}

pub fn render_json_full(
    session: &Session,
    lookups: &LookupTables,
    character: Option<usize>,
    style: JsonStyle,
) -> JsonValue {
    match style {
        JsonStyle::CanonicalV1 => JsonValue::Object(default_json(session, lookups, character)),
    }
}

pub fn render_json_selected(
    session: &Session,
    fields: &FieldSelection,
    style: JsonStyle,
) -> JsonValue {
    match style {
        JsonStyle::CanonicalV1 => JsonValue::Object(selected_json(fields, session)),
    }
}

/// `key=value` lines for the selected fields, in canonical order.
pub fn render_field_lines(session: &Session, fields: &FieldSelection) -> Vec<String> {
    let bar = session.game_bar();
    let mut out = Vec::new();

    if fields.wealth {
        out.push(format!("wealth={}", format_number(bar.wealth)));
    }
    if fields.reputation {
        out.push(format!("reputation={}", format_number(bar.reputation)));
    }
    if fields.game_date {
        out.push(format!("game_date={}", format_game_date(&bar)));
    }
    if fields.party {
        for member in session.party_members() {
            out.push(format!("party={}", summary_line(&member)));
        }
    }
    if fields.characters {
        for character in session.characters() {
            out.push(format!("character={}", summary_line(&character)));
        }
    }
    if let Some(query) = &fields.search {
        let search = session.search_characters(query, SEARCH_LIMIT);
        out.push(format!("search_total={}", search.total));
        for character in &search.characters {
            out.push(format!("search={}", summary_line(character)));
        }
    }
    if fields.pending {
        out.push(format!("pending={}", session.pending_count()));
        for path in session.pending_paths() {
            out.push(format!("pending_path={path}"));
        }
    }

    out
}

/// The change-bar text: `1 change pending`, `3 changes pending`.
pub fn pending_summary(count: usize) -> String {
    match count {
        0 => "no changes pending".to_string(),
        1 => "1 change pending".to_string(),
        n => format!("{n} changes pending"),
    }
}

pub fn render_character_sheet(
    session: &Session,
    lookups: &LookupTables,
    character: Option<usize>,
) -> String {
    render_character_sheet_with_options(session, lookups, character, TextRenderOptions::default())
}

pub fn render_character_sheet_with_options(
    session: &Session,
    lookups: &LookupTables,
    character: Option<usize>,
    options: TextRenderOptions,
) -> String {
    let bar = session.game_bar();
    let mut out = String::new();

    writeln!(&mut out).expect("writing to String cannot fail");
    writeln!(&mut out, "{}", centered_no_trailing("SAVE RECORD", SHEET_WIDTH))
        .expect("writing to String cannot fail");
    let version = bar.version.as_deref().unwrap_or("?");
    let info = format!(
        "{}  |  {} characters  |  v{version}",
        format_game_date(&bar),
        bar.character_count
    );
    writeln!(&mut out, "{}", centered_no_trailing(&info, SHEET_WIDTH))
        .expect("writing to String cannot fail");
    writeln!(&mut out).expect("writing to String cannot fail");
    writeln!(
        &mut out,
        "  Gold: {:<18}Reputation: {}",
        format_number(bar.wealth),
        format_number(bar.reputation)
    )
    .expect("writing to String cannot fail");
    writeln!(&mut out).expect("writing to String cannot fail");

    let party = session.party_members();
    let party_line = if party.is_empty() {
        "none".to_string()
    } else {
        party
            .iter()
            .map(|member| member.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };
    writeln!(&mut out, " ::: Party ::: {party_line}").expect("writing to String cannot fail");
    writeln!(&mut out).expect("writing to String cannot fail");

    match character.and_then(|index| session.character_sheet(index, lookups)) {
        Some(sheet) => write_sheet(&mut out, &sheet, options),
        None => {
            writeln!(&mut out, "  No character selected").expect("writing to String cannot fail");
        }
    }

    writeln!(&mut out).expect("writing to String cannot fail");
    writeln!(&mut out, "  {}", pending_summary(session.pending_count()))
        .expect("writing to String cannot fail");
    if options.verbose {
        for path in session.pending_paths() {
            writeln!(&mut out, "    {path}").expect("writing to String cannot fail");
        }
    }

    out
}

fn default_json(
    session: &Session,
    lookups: &LookupTables,
    character: Option<usize>,
) -> JsonMap<String, JsonValue> {
    let bar = session.game_bar();
    let mut out = JsonMap::new();

    out.insert("game".to_string(), game_bar_to_json(&bar));
    out.insert(
        "party".to_string(),
        summaries_to_json(&session.party_members()),
    );
    out.insert(
        "character".to_string(),
        character
            .and_then(|index| session.character_sheet(index, lookups))
            .map_or(JsonValue::Null, |sheet| sheet_to_json(&sheet)),
    );
    out.insert(
        "pending_count".to_string(),
        JsonValue::from(session.pending_count()),
    );
    out.insert("pending".to_string(), pending_to_json(session));

    out
}

fn selected_json(fields: &FieldSelection, session: &Session) -> JsonMap<String, JsonValue> {
    let bar = session.game_bar();
    let mut out = JsonMap::new();

    if fields.wealth {
        out.insert("wealth".to_string(), number_to_json(bar.wealth));
    }
    if fields.reputation {
        out.insert("reputation".to_string(), number_to_json(bar.reputation));
    }
    if fields.game_date {
        let mut date = JsonMap::new();
        date.insert("day".to_string(), number_to_json(bar.day));
        date.insert("year".to_string(), number_to_json(bar.year));
        out.insert("game_date".to_string(), JsonValue::Object(date));
    }
    if fields.party {
        out.insert(
            "party".to_string(),
            summaries_to_json(&session.party_members()),
        );
    }
    if fields.characters {
        out.insert(
            "characters".to_string(),
            summaries_to_json(&session.characters()),
        );
    }
    if let Some(query) = &fields.search {
        let search = session.search_characters(query, SEARCH_LIMIT);
        let mut m = JsonMap::new();
        m.insert("query".to_string(), JsonValue::String(query.clone()));
        m.insert("total".to_string(), JsonValue::from(search.total));
        m.insert(
            "characters".to_string(),
            summaries_to_json(&search.characters),
        );
        out.insert("search".to_string(), JsonValue::Object(m));
    }
    if fields.pending {
        out.insert(
            "pending_count".to_string(),
            JsonValue::from(session.pending_count()),
        );
        out.insert("pending".to_string(), pending_to_json(session));
    }

    out
}

/// Whole numbers render without a fraction; NaN and infinities as `null`.
fn number_to_json(n: f64) -> JsonValue {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9.0e15 {
        JsonValue::from(n as i64)
    } else {
        JsonValue::from(n)
    }
}

fn game_bar_to_json(bar: &GameBar) -> JsonValue {
    let mut m = JsonMap::new();
    m.insert("wealth".to_string(), number_to_json(bar.wealth));
    m.insert("reputation".to_string(), number_to_json(bar.reputation));
    m.insert("day".to_string(), number_to_json(bar.day));
    m.insert("year".to_string(), number_to_json(bar.year));
    m.insert(
        "version".to_string(),
        bar.version
            .as_ref()
            .map_or(JsonValue::Null, |v| JsonValue::String(v.clone())),
    );
    m.insert(
        "character_count".to_string(),
        JsonValue::from(bar.character_count),
    );
    JsonValue::Object(m)
}

fn summaries_to_json(summaries: &[CharacterSummary]) -> JsonValue {
    JsonValue::Array(summaries.iter().map(summary_to_json).collect())
}

fn summary_to_json(c: &CharacterSummary) -> JsonValue {
    let mut m = JsonMap::new();
    m.insert("index".to_string(), JsonValue::from(c.index));
    m.insert("id".to_string(), JsonValue::from(c.id));
    m.insert("name".to_string(), JsonValue::String(c.name.clone()));
    m.insert("level".to_string(), number_to_json(c.level));
    m.insert("career".to_string(), JsonValue::String(c.career.clone()));
    m.insert("power".to_string(), number_to_json(c.power));
    m.insert("in_party".to_string(), JsonValue::Bool(c.in_party));
    JsonValue::Object(m)
}

fn sheet_to_json(sheet: &CharacterSheet) -> JsonValue {
    let mut m = JsonMap::new();
    let summary = &sheet.summary;
    m.insert("id".to_string(), JsonValue::from(summary.id));
    m.insert("index".to_string(), JsonValue::from(summary.index));
    m.insert("name".to_string(), JsonValue::String(summary.name.clone()));
    m.insert("gender".to_string(), JsonValue::String(sheet.gender.clone()));
    m.insert("race".to_string(), JsonValue::String(sheet.race.clone()));
    m.insert(
        "career".to_string(),
        JsonValue::String(summary.career.clone()),
    );
    m.insert("in_party".to_string(), JsonValue::Bool(summary.in_party));
    m.insert("level".to_string(), number_to_json(summary.level));
    m.insert("exp".to_string(), number_to_json(sheet.exp));
    m.insert("power".to_string(), number_to_json(summary.power));
    m.insert("money".to_string(), number_to_json(sheet.money));
    m.insert("potential".to_string(), number_to_json(sheet.potential));
    m.insert("attributes".to_string(), stats_to_json(&sheet.attributes));
    m.insert("skills".to_string(), stats_to_json(&sheet.skills));
    m.insert(
        "weapon_mastery".to_string(),
        JsonValue::Array(
            sheet
                .weapon_mastery
                .iter()
                .map(|w| {
                    let mut e = JsonMap::new();
                    e.insert("label".to_string(), JsonValue::String(w.label.clone()));
                    e.insert("level".to_string(), number_to_json(w.level));
                    e.insert("exp".to_string(), number_to_json(w.exp));
                    JsonValue::Object(e)
                })
                .collect(),
        ),
    );
    m.insert("status".to_string(), gauges_to_json(&sheet.status));
    m.insert("resources".to_string(), gauges_to_json(&sheet.resources));
    m.insert("goodness".to_string(), number_to_json(sheet.goodness));
    m.insert("lawfulness".to_string(), number_to_json(sheet.lawfulness));
    let mut record = JsonMap::new();
    for counter in &sheet.combat_record {
        record.insert(counter.key.clone(), number_to_json(counter.value));
    }
    m.insert("combat_record".to_string(), JsonValue::Object(record));
    m.insert("spells".to_string(), leveled_to_json(&sheet.spells));
    m.insert("talents".to_string(), leveled_to_json(&sheet.talents));
    m.insert(
        "traits".to_string(),
        JsonValue::Array(
            sheet
                .traits
                .iter()
                .map(|t| {
                    let mut e = JsonMap::new();
                    e.insert("id".to_string(), optional_id(t.id));
                    e.insert("name".to_string(), JsonValue::String(t.name.clone()));
                    JsonValue::Object(e)
                })
                .collect(),
        ),
    );
    m.insert(
        "items".to_string(),
        JsonValue::Array(sheet.items.iter().map(item_to_json).collect()),
    );
    JsonValue::Object(m)
}

fn stats_to_json(stats: &[StatEntry]) -> JsonValue {
    JsonValue::Array(
        stats
            .iter()
            .map(|s| {
                let mut m = JsonMap::new();
                m.insert("key".to_string(), JsonValue::String(s.key.clone()));
                m.insert("label".to_string(), JsonValue::String(s.label.clone()));
                m.insert("base".to_string(), number_to_json(s.base));
                m.insert("current".to_string(), number_to_json(s.current));
                m.insert("exp".to_string(), number_to_json(s.exp));
                JsonValue::Object(m)
            })
            .collect(),
    )
}

fn gauges_to_json(gauges: &[GaugeEntry]) -> JsonValue {
    JsonValue::Array(
        gauges
            .iter()
            .map(|g| {
                let mut m = JsonMap::new();
                m.insert("key".to_string(), JsonValue::String(g.key.clone()));
                m.insert("value".to_string(), number_to_json(g.value));
                m.insert("percent".to_string(), number_to_json(g.percent));
                JsonValue::Object(m)
            })
            .collect(),
    )
}

fn leveled_to_json(entries: &[LeveledEntry]) -> JsonValue {
    JsonValue::Array(
        entries
            .iter()
            .map(|entry| {
                let mut m = JsonMap::new();
                m.insert("id".to_string(), optional_id(entry.id));
                m.insert("lv".to_string(), number_to_json(entry.level));
                if let Some(active) = entry.active {
                    m.insert("active".to_string(), JsonValue::Bool(active));
                }
                JsonValue::Object(m)
            })
            .collect(),
    )
}

fn item_to_json(item: &ItemEntry) -> JsonValue {
    let mut m = JsonMap::new();
    m.insert("id".to_string(), optional_id(item.id));
    m.insert("name".to_string(), JsonValue::String(item.name.clone()));
    m.insert("slot_index".to_string(), number_to_json(item.slot_index));
    m.insert("stack_num".to_string(), number_to_json(item.stack_num));
    m.insert("quality".to_string(), number_to_json(item.quality));
    m.insert("durability".to_string(), number_to_json(item.durability));
    m.insert(
        "addons".to_string(),
        JsonValue::Array(
            item.addons
                .iter()
                .map(|addon| {
                    let mut e = JsonMap::new();
                    e.insert("id".to_string(), optional_id(addon.id));
                    e.insert("name".to_string(), JsonValue::String(addon.name.clone()));
                    if let Some(value) = addon.value {
                        e.insert("value".to_string(), number_to_json(value));
                    }
                    JsonValue::Object(e)
                })
                .collect(),
        ),
    );
    JsonValue::Object(m)
}

fn optional_id(id: Option<i64>) -> JsonValue {
    id.map_or(JsonValue::Null, JsonValue::from)
}

fn pending_to_json(session: &Session) -> JsonValue {
    JsonValue::Array(
        session
            .pending_paths()
            .into_iter()
            .map(JsonValue::String)
            .collect(),
    )
}

fn write_sheet(out: &mut String, sheet: &CharacterSheet, options: TextRenderOptions) {
    let summary = &sheet.summary;
    let party_mark = if summary.in_party { "  * Party Member" } else { "" };
    writeln!(
        out,
        "  {}  (ID {})  {} {} {}{party_mark}",
        summary.name, summary.id, sheet.gender, sheet.race, summary.career
    )
    .expect("writing to String cannot fail");
    writeln!(out).expect("writing to String cannot fail");

    let identity = vec![
        format!("Level: {}", format_number(summary.level)),
        format!("Experience: {}", format_number(sheet.exp)),
        format!("Power: {}", format_number(summary.power)),
        format!("Money: {}", format_number(sheet.money)),
        format!("Potential: {}", format_number(sheet.potential)),
    ];
    let alignment = vec![
        format!("Goodness: {}", format_number(sheet.goodness)),
        format!("Lawfulness: {}", format_number(sheet.lawfulness)),
    ];
    write_two_column_grid(
        out,
        ("Identity", identity.as_slice()),
        ("Alignment & Social", alignment.as_slice()),
    );
    writeln!(out).expect("writing to String cannot fail");

    let attributes: Vec<String> = sheet.attributes.iter().map(stat_line).collect();
    let condition: Vec<String> = sheet
        .status
        .iter()
        .chain(&sheet.resources)
        .map(gauge_line)
        .collect();
    write_two_column_grid(
        out,
        ("Attributes", attributes.as_slice()),
        ("Condition & Resources", condition.as_slice()),
    );
    writeln!(out).expect("writing to String cannot fail");

    let skills: Vec<String> = sheet.skills.iter().map(stat_line).collect();
    let mastery: Vec<String> = sheet
        .weapon_mastery
        .iter()
        .map(|w| {
            format!(
                "{}: {} ({})",
                w.label,
                format_number(w.level),
                format_number(w.exp)
            )
        })
        .collect();
    write_two_column_grid(
        out,
        ("Skills", skills.as_slice()),
        ("Weapon Mastery", mastery.as_slice()),
    );
    writeln!(out).expect("writing to String cannot fail");

    let record: Vec<String> = sheet
        .combat_record
        .iter()
        .filter(|c| options.verbose || c.value != 0.0)
        .map(|c| format!("{}: {}", c.label, format_number(c.value)))
        .collect();
    let traits: Vec<String> = sheet.traits.iter().map(|t| t.name.clone()).collect();
    write_two_column_grid(
        out,
        ("Combat Record", record.as_slice()),
        ("Traits", traits.as_slice()),
    );
    writeln!(out).expect("writing to String cannot fail");

    let spells: Vec<String> = sheet.spells.iter().map(leveled_line).collect();
    let talents: Vec<String> = sheet.talents.iter().map(leveled_line).collect();
    write_two_column_grid(
        out,
        ("Spells", spells.as_slice()),
        ("Talents", talents.as_slice()),
    );
    writeln!(out).expect("writing to String cannot fail");

    write_items_section(out, &sheet.items);
}

fn write_two_column_grid(out: &mut String, left: (&str, &[String]), right: (&str, &[String])) {
    let left_header = format!("::: {} :::", left.0);
    writeln!(
        out,
        " {:<a$}::: {} :::",
        left_header,
        right.0,
        a = TWO_COL_WIDTH_LEFT
    )
    .expect("writing to String cannot fail");

    let left_lines = or_none(left.1);
    let right_lines = or_none(right.1);
    let row_count = left_lines.len().max(right_lines.len());
    for row in 0..row_count {
        let l = left_lines.get(row).map(String::as_str).unwrap_or("");
        let r = right_lines.get(row).map(String::as_str).unwrap_or("");
        let line = format!(
            " {:<a$}{:<b$}",
            fit_column(l, TWO_COL_WIDTH_LEFT),
            fit_column(r, TWO_COL_WIDTH_RIGHT),
            a = TWO_COL_WIDTH_LEFT,
            b = TWO_COL_WIDTH_RIGHT
        );
        writeln!(out, "{}", line.trim_end()).expect("writing to String cannot fail");
    }
}

fn write_items_section(out: &mut String, items: &[ItemEntry]) {
    writeln!(out, " ::: Items :::").expect("writing to String cannot fail");
    if items.is_empty() {
        writeln!(out, "  none").expect("writing to String cannot fail");
        return;
    }

    let rows: Vec<String> = items
        .iter()
        .map(|item| {
            let mut row = format!("{}x {}", format_number(item.stack_num), item.name);
            if item.quality != 0.0 {
                write!(row, " Q{}", format_number(item.quality))
                    .expect("writing to String cannot fail");
            }
            row
        })
        .collect();
    for chunk in rows.chunks(3) {
        let col1 = chunk.first().map(String::as_str).unwrap_or("");
        let col2 = chunk.get(1).map(String::as_str).unwrap_or("");
        let col3 = chunk.get(2).map(String::as_str).unwrap_or("");
        let line = format!(
            "  {:<w$}{:<w$}{:<w$}",
            fit_column(col1, THREE_COL_WIDTH),
            fit_column(col2, THREE_COL_WIDTH),
            fit_column(col3, THREE_COL_WIDTH),
            w = THREE_COL_WIDTH
        );
        writeln!(out, "{}", line.trim_end()).expect("writing to String cannot fail");
    }
}

fn stat_line(stat: &StatEntry) -> String {
    format!(
        "{}: {} / {} ({})",
        stat.label,
        format_number(stat.current),
        format_number(stat.base),
        format_number(stat.exp)
    )
}

fn gauge_line(gauge: &GaugeEntry) -> String {
    format!(
        "{}: {} ({}%)",
        gauge.label,
        format_number(gauge.value),
        format_number(gauge.percent.round())
    )
}

fn leveled_line(entry: &LeveledEntry) -> String {
    let id = entry.id.map_or_else(|| "?".to_string(), |id| id.to_string());
    let mut line = format!("#{id} Lv {}", format_number(entry.level));
    if entry.active == Some(true) {
        line.push_str(" *");
    }
    line
}

fn summary_line(c: &CharacterSummary) -> String {
    format!(
        "{}:{} (Lv {} {})",
        c.id,
        c.name,
        format_number(c.level),
        c.career
    )
}

fn format_game_date(bar: &GameBar) -> String {
    format!(
        "Year {}, Day {}",
        format_number(bar.year),
        format_number(bar.day)
    )
}

fn or_none(lines: &[String]) -> Vec<String> {
    if lines.is_empty() {
        vec!["none".to_string()]
    } else {
        lines.to_vec()
    }
}

fn fit_column(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    if width <= 3 {
        return value.chars().take(width).collect();
    }

    let mut out = String::with_capacity(width);
    for ch in value.chars().take(width - 3) {
        out.push(ch);
    }
    out.push_str("...");
    out
}

fn centered_no_trailing(value: &str, width: usize) -> String {
    let len = value.chars().count();
    if len >= width {
        return value.to_string();
    }

    let left_padding = (width - len) / 2;
    format!("{}{}", " ".repeat(left_padding), value)
}
