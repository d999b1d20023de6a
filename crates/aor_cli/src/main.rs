use std::fs;
use std::path::PathBuf;
use std::process;

use aor_core::core_api::{CoreError, Engine, LookupTables, Session};
use aor_core::mutator::{EditOutcome, FieldTarget, NewItem};
use aor_core::schema::CharacterList;
use aor_render::{
    FieldSelection, JsonStyle, TextRenderOptions, pending_summary,
    render_character_sheet_with_options, render_field_lines, render_json_full,
    render_json_selected,
};
use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(value_name = "SAVE.DAT")]
    path: PathBuf,
    /// Character record to show and edit; defaults to the first party member.
    #[arg(long, value_name = "ID", allow_hyphen_values = true)]
    character: Option<i64>,
    #[arg(long)]
    wealth: bool,
    #[arg(long)]
    reputation: bool,
    #[arg(long = "game-date")]
    game_date: bool,
    #[arg(long)]
    party: bool,
    #[arg(long)]
    characters: bool,
    /// Non-party characters whose name or id contains QUERY.
    #[arg(long, value_name = "QUERY")]
    search: Option<String>,
    #[arg(long)]
    pending: bool,
    #[arg(long)]
    verbose: bool,
    #[arg(long)]
    json: bool,
    /// Field edit such as `level=6`, `gameTime.day=3` or `weaponMastery.2=10`.
    #[arg(long = "set", value_name = "FIELD=VALUE", allow_hyphen_values = true)]
    set: Vec<String>,
    #[arg(long = "add-trait", value_name = "ID")]
    add_trait: Vec<i64>,
    #[arg(long = "add-spell", value_name = "ID")]
    add_spell: Vec<i64>,
    #[arg(long = "add-talent", value_name = "ID")]
    add_talent: Vec<i64>,
    #[arg(long = "add-item", value_name = "ID")]
    add_item: Vec<i64>,
    #[arg(long = "remove-trait", value_name = "INDEX")]
    remove_trait: Vec<usize>,
    #[arg(long = "remove-spell", value_name = "INDEX")]
    remove_spell: Vec<usize>,
    #[arg(long = "remove-talent", value_name = "INDEX")]
    remove_talent: Vec<usize>,
    #[arg(long = "remove-item", value_name = "INDEX")]
    remove_item: Vec<usize>,
    #[arg(long = "add-party", value_name = "ID")]
    add_party: Vec<i64>,
    #[arg(long = "remove-party", value_name = "ID")]
    remove_party: Vec<i64>,
    #[arg(long)]
    output: Option<PathBuf>,
    /// Allows --output to replace an existing file.
    #[arg(long = "force-overwrite")]
    force_overwrite: bool,
    /// Writes the input file unchanged to PATH.
    #[arg(long)]
    backup: Option<PathBuf>,
    /// Directory holding items.json, traits.json and addon_attributes.json.
    #[arg(long = "data-dir", env = "AOR_SE_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

impl Cli {
    fn field_selection(&self) -> FieldSelection {
        FieldSelection {
            wealth: self.wealth,
            reputation: self.reputation,
            game_date: self.game_date,
            party: self.party,
            characters: self.characters,
            search: self.search.clone(),
            pending: self.pending,
        }
    }

    fn has_list_edits(&self) -> bool {
        !self.add_trait.is_empty()
            || !self.add_spell.is_empty()
            || !self.add_talent.is_empty()
            || !self.add_item.is_empty()
            || !self.remove_trait.is_empty()
            || !self.remove_spell.is_empty()
            || !self.remove_talent.is_empty()
            || !self.remove_item.is_empty()
    }

    fn has_edits(&self) -> bool {
        !self.set.is_empty()
            || self.has_list_edits()
            || !self.add_party.is_empty()
            || !self.remove_party.is_empty()
    }

    fn removals(&self) -> [(CharacterList, &[usize]); 4] {
        [
            (CharacterList::Traits, self.remove_trait.as_slice()),
            (CharacterList::Spells, self.remove_spell.as_slice()),
            (CharacterList::Talents, self.remove_talent.as_slice()),
            (CharacterList::Items, self.remove_item.as_slice()),
        ]
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let fields = cli.field_selection();
    let has_edits = cli.has_edits();

    if has_edits && cli.output.is_none() {
        eprintln!("edit flags require --output <PATH>");
        process::exit(2);
    }
    if !has_edits && cli.output.is_some() {
        eprintln!("--output requires at least one edit flag");
        process::exit(2);
    }
    if let Some(out_path) = &cli.output
        && out_path.exists()
        && !cli.force_overwrite
    {
        eprintln!(
            "refusing to overwrite existing file {} (pass --force-overwrite)",
            out_path.display()
        );
        process::exit(1);
    }

    let field_edits: Vec<(&str, &str)> = cli
        .set
        .iter()
        .map(|spec| {
            spec.split_once('=').unwrap_or_else(|| {
                eprintln!("--set expects FIELD=VALUE, got '{spec}'");
                process::exit(2);
            })
        })
        .collect();

    let lookups = match &cli.data_dir {
        Some(dir) => LookupTables::load_from_dir(dir).unwrap_or_else(|e| {
            eprintln!("Error loading lookup tables from {}: {e}", dir.display());
            process::exit(1);
        }),
        None => LookupTables::new(),
    };

    let bytes = fs::read(&cli.path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {e}", cli.path.display());
        process::exit(1);
    });

    let engine = Engine::new();
    let mut session = engine.open_bytes(&bytes).unwrap_or_else(|e| {
        eprintln!("Error parsing save file: {}", cli.path.display());
        eprintln!("  {}", e);
        process::exit(1);
    });

    if let Some(backup_path) = &cli.backup {
        fs::write(backup_path, session.to_bytes_unmodified()).unwrap_or_else(|e| {
            eprintln!("Error writing {}: {e}", backup_path.display());
            process::exit(1);
        });
        debug!(path = %backup_path.display(), "backup written");
    }

    let character = select_character(&session, cli.character);
    if cli.has_list_edits() && character.is_none() {
        eprintln!("Error applying edits: the save has no character to edit");
        process::exit(1);
    }

    for (spec, raw) in &field_edits {
        let target = FieldTarget::parse_spec(spec, character).unwrap_or_else(|e| {
            eprintln!("Error in --set {spec}: {}", e.message);
            process::exit(2);
        });
        let outcome = session.set_field_text(&target, raw);
        report(outcome, &format!("--set {spec}"));
    }

    if let Some(index) = character {
        // Highest index first so every INDEX refers to the list as loaded.
        for (list, positions) in cli.removals() {
            let mut positions = positions.to_vec();
            positions.sort_unstable_by(|a, b| b.cmp(a));
            positions.dedup();
            for position in positions {
                let outcome = session.remove_from_list(index, list, position);
                report(outcome, &format!("remove {} {position}", list.key()));
            }
        }
        for &id in &cli.add_trait {
            report(session.add_trait(index, id), &format!("add trait {id}"));
        }
        for &id in &cli.add_spell {
            report(session.add_spell(index, id), &format!("add spell {id}"));
        }
        for &id in &cli.add_talent {
            report(session.add_talent(index, id), &format!("add talent {id}"));
        }
        for &id in &cli.add_item {
            report(
                session.add_item(index, NewItem::new(id)),
                &format!("add item {id}"),
            );
        }
    }

    for &id in &cli.add_party {
        report(session.add_party_member(id), &format!("add party member {id}"));
    }
    for &id in &cli.remove_party {
        report(
            session.remove_party_member(id),
            &format!("remove party member {id}"),
        );
    }

    if let Some(out_path) = &cli.output {
        let edited_bytes = session.to_bytes_modified().unwrap_or_else(|e| {
            eprintln!("Error creating modified save bytes: {e}");
            process::exit(1);
        });
        fs::write(out_path, edited_bytes).unwrap_or_else(|e| {
            eprintln!("Error writing {}: {e}", out_path.display());
            process::exit(1);
        });
    }

    if cli.json {
        let json = if fields.is_any_selected() {
            render_json_selected(&session, &fields, JsonStyle::CanonicalV1)
        } else {
            render_json_full(&session, &lookups, character, JsonStyle::CanonicalV1)
        };
        let rendered = serde_json::to_string_pretty(&json).unwrap_or_else(|e| {
            eprintln!("Error rendering JSON output: {e}");
            process::exit(1);
        });
        println!("{rendered}");
        return;
    }

    if fields.is_any_selected() {
        for line in render_field_lines(&session, &fields) {
            println!("{line}");
        }
        return;
    }

    if let Some(out_path) = &cli.output {
        println!("Wrote edited save to {}", out_path.display());
        println!("{}", pending_summary(session.pending_count()));
        return;
    }

    print!(
        "{}",
        render_character_sheet_with_options(
            &session,
            &lookups,
            character,
            TextRenderOptions {
                verbose: cli.verbose,
            },
        )
    );
}

/// Resolves `--character` to a record index, or the default character.
fn select_character(session: &Session, requested: Option<i64>) -> Option<usize> {
    match requested {
        Some(id) => {
            let index = session.character_index(id);
            if index.is_none() {
                eprintln!("Error: no character with id {id}");
                process::exit(1);
            }
            index
        }
        None => session
            .default_character_id()
            .and_then(|id| session.character_index(id)),
    }
}

fn report(outcome: Result<EditOutcome, CoreError>, what: &str) {
    match outcome {
        Ok(EditOutcome::Skipped) => {
            warn!(edit = what, "edit skipped, location not present in this save");
        }
        Ok(outcome) => {
            if let Some(path) = outcome.path() {
                debug!(edit = what, path = %path, "edit applied");
            }
        }
        Err(e) => {
            eprintln!("Error applying {what}: {e}");
            process::exit(1);
        }
    }
}
