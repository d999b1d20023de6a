use std::fs;
use std::path::PathBuf;

use aor_core::core_api::{CoreErrorCode, Engine, Session};
use aor_core::mutator::{EditOutcome, FieldTarget, NewItem};
use aor_core::schema::{CharacterList, MAX_POSITIONAL_LEN, NestedObject, PositionalArray};
use aor_core::value::SaveValue;

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..")
}

fn fixture_path() -> PathBuf {
    workspace_root().join("tests/fixtures/SAVE.dat")
}

fn open_fixture() -> Session {
    let bytes = fs::read(fixture_path()).expect("failed to read save fixture");
    Engine::new()
        .open_bytes(&bytes)
        .expect("failed to open save fixture")
}

fn reload(session: &Session) -> SaveValue {
    let bytes = session
        .to_bytes_modified()
        .expect("failed to serialize modified save");
    let reopened = Engine::new()
        .open_bytes(&bytes)
        .expect("modified save should parse again");
    reopened.document().clone()
}

#[test]
fn opening_fixture_starts_clean() {
    let session = open_fixture();
    assert_eq!(session.pending_count(), 0);
    assert!(session.pending_paths().is_empty());

    let bar = session.game_bar();
    assert_eq!(bar.wealth, 1250.0);
    assert_eq!(bar.reputation, 35.0);
    assert_eq!(bar.day, 14.0);
    assert_eq!(bar.year, 2.0);
    assert_eq!(bar.version.as_deref(), Some("0.9.12"));
    assert_eq!(bar.character_count, 4);
}

#[test]
fn backup_bytes_are_identical_to_input() {
    let bytes = fs::read(fixture_path()).expect("failed to read save fixture");
    let mut session = Engine::new().open_bytes(&bytes).expect("open");

    session.set_wealth(99_999.0).expect("set wealth");
    session.add_trait(0, 42).expect("add trait");

    assert_eq!(session.to_bytes_unmodified(), bytes);
}

#[test]
fn empty_and_invalid_files_are_parse_errors() {
    let engine = Engine::new();
    let empty = engine.open_bytes(b"").expect_err("empty file must fail");
    assert_eq!(empty.code, CoreErrorCode::Parse);

    let garbage = engine
        .open_bytes(b"{\"wealth\": 1,")
        .expect_err("truncated json must fail");
    assert_eq!(garbage.code, CoreErrorCode::Parse);
    assert!(garbage.message.starts_with("failed to parse save document"));

    let binary = engine
        .open_bytes([0xff, 0xfe, 0x00])
        .expect_err("non-utf8 must fail");
    assert_eq!(binary.code, CoreErrorCode::Parse);
}

#[test]
fn failed_load_keeps_previous_session_state() {
    let mut session = open_fixture();
    session.set_wealth(10.0).expect("set wealth");

    let err = session
        .load_bytes(b"not json")
        .expect_err("invalid save must be rejected");
    assert_eq!(err.code, CoreErrorCode::Parse);
    assert_eq!(session.pending_count(), 1);
    assert_eq!(session.game_bar().wealth, 10.0);
}

#[test]
fn successful_load_replaces_document_and_clears_pending() {
    let mut session = open_fixture();
    session.set_wealth(10.0).expect("set wealth");

    session
        .load_bytes(br#"{"wealth": 3, "npcs": []}"#)
        .expect("load second save");
    assert_eq!(session.pending_count(), 0);
    assert_eq!(session.game_bar().wealth, 3.0);
    assert_eq!(session.original_text(), r#"{"wealth": 3, "npcs": []}"#);
}

#[test]
fn wealth_edit_is_tracked_and_reconciled() {
    let mut session = open_fixture();

    let outcome = session.set_wealth(2000.0).expect("set wealth");
    let EditOutcome::Applied(edit) = outcome else {
        panic!("wealth write should apply");
    };
    assert_eq!(edit.path.to_string(), "game.wealth");
    assert_eq!(edit.old, SaveValue::Number(1250.0));
    assert!(edit.dirty);
    assert_eq!(session.pending_count(), 1);

    session.set_wealth(3000.0).expect("set wealth again");
    assert_eq!(session.pending_count(), 1);

    session.set_wealth(1250.0).expect("restore wealth");
    assert_eq!(session.pending_count(), 0);
}

#[test]
fn rewriting_the_loaded_value_stays_clean() {
    let mut session = open_fixture();
    let outcome = session
        .set_field_text(&FieldTarget::scalar(0, "level"), "5")
        .expect("set level");
    assert!(matches!(outcome, EditOutcome::Applied(ref edit) if !edit.dirty));
    assert_eq!(session.pending_count(), 0);
}

#[test]
fn text_input_is_coerced_by_field_kind() {
    let mut session = open_fixture();

    session
        .set_field_text(&FieldTarget::scalar(0, "unitname"), "Aria Dawnblade")
        .expect("rename");
    session
        .set_field_text(&FieldTarget::scalar(0, "level"), "")
        .expect("empty level");
    session
        .set_field_text(
            &FieldTarget::record(0, CharacterList::Spells, 0, "isActivated"),
            "false",
        )
        .expect("toggle spell");

    let npc = &session.document()["npcs"][0];
    assert_eq!(npc["unitname"], SaveValue::from("Aria Dawnblade"));
    assert_eq!(npc["level"], SaveValue::Number(0.0));
    assert_eq!(npc["spells"][0]["isActivated"], SaveValue::Bool(false));
    assert_eq!(session.pending_count(), 3);
}

#[test]
fn character_paths_use_the_record_id() {
    let mut session = open_fixture();
    session
        .set_field(
            &FieldTarget::nested(1, NestedObject::HumanAttribute, "BSstrength"),
            SaveValue::Number(18.0),
        )
        .expect("set base strength");
    session
        .set_field(
            &FieldTarget::record(0, CharacterList::Items, 1, "stackNum"),
            SaveValue::Number(20.0),
        )
        .expect("set stack");

    assert_eq!(
        session.pending_paths(),
        vec![
            "npc.101.items.1.stackNum".to_string(),
            "npc.102.humanAttribute.BSstrength".to_string(),
        ]
    );
}

#[test]
fn weapon_mastery_grows_with_zeros() {
    let mut session = open_fixture();

    let outcome = session
        .set_field(
            &FieldTarget::positional(1, PositionalArray::WeaponMastery, 2),
            SaveValue::Number(10.0),
        )
        .expect("set mastery on a record without the array");
    let EditOutcome::Applied(edit) = outcome else {
        panic!("positional write should apply");
    };
    assert_eq!(edit.old, SaveValue::Number(0.0));
    assert_eq!(
        session.document()["npcs"][1]["weaponMastery"],
        SaveValue::from(vec![
            SaveValue::Number(0.0),
            SaveValue::Number(0.0),
            SaveValue::Number(10.0),
        ])
    );

    session
        .set_field(
            &FieldTarget::positional(0, PositionalArray::WeaponMastery, 7),
            SaveValue::Number(4.0),
        )
        .expect("write past the end");
    let mastery = session.document()["npcs"][0]["weaponMastery"]
        .as_array()
        .expect("mastery array");
    assert_eq!(mastery.len(), 8);
    assert_eq!(mastery[3], SaveValue::Number(0.0));
    assert_eq!(mastery[7], SaveValue::Number(4.0));
}

#[test]
fn exp_arrays_need_their_parent_object() {
    let mut session = open_fixture();

    let skipped = session
        .set_field(
            &FieldTarget::positional(2, PositionalArray::AttExp, 0),
            SaveValue::Number(0.5),
        )
        .expect("write to character without humanAttribute");
    assert!(skipped.is_skipped());

    let applied = session
        .set_field(
            &FieldTarget::positional(1, PositionalArray::AttExp, 1),
            SaveValue::Number(0.5),
        )
        .expect("write to humanAttribute without attEXP");
    assert!(!applied.is_skipped());
    assert_eq!(
        session.document()["npcs"][1]["humanAttribute"]["attEXP"],
        SaveValue::from(vec![SaveValue::Number(0.0), SaveValue::Number(0.5)])
    );
    assert_eq!(session.pending_count(), 1);
}

#[test]
fn missing_nested_object_skips_write() {
    let mut session = open_fixture();
    let outcome = session
        .set_field(
            &FieldTarget::nested(2, NestedObject::HeroCareer, "killCount"),
            SaveValue::Number(3.0),
        )
        .expect("write to missing heroCareer");
    assert!(outcome.is_skipped());
    assert_eq!(session.pending_count(), 0);
    assert!(session.document()["npcs"][2].get("heroCareer").is_none());
}

#[test]
fn game_time_write_without_game_time_is_skipped() {
    let mut session = Engine::new()
        .open_str(r#"{"wealth": 1, "npcs": []}"#)
        .expect("open minimal save");
    let outcome = session
        .set_field_text(&FieldTarget::game_time("day"), "3")
        .expect("write game time");
    assert!(outcome.is_skipped());
    assert!(session.document().get("gameTime").is_none());
}

#[test]
fn unknown_character_index_is_not_found() {
    let mut session = open_fixture();
    let err = session
        .set_field(&FieldTarget::scalar(42, "level"), SaveValue::Number(1.0))
        .expect_err("index past npcs");
    assert_eq!(err.code, CoreErrorCode::NotFound);

    let err = session.add_trait(42, 1).expect_err("add on missing character");
    assert_eq!(err.code, CoreErrorCode::NotFound);
}

#[test]
fn positional_index_past_limit_is_rejected() {
    let mut session = open_fixture();

    for spec in ["weaponMastery.18446744073709551615", "weaponMastery.4000000000"] {
        let target = FieldTarget::parse_spec(spec, Some(1)).expect(spec);
        let err = session
            .set_field_text(&target, "1")
            .expect_err("huge index should be rejected");
        assert_eq!(err.code, CoreErrorCode::UnsupportedOperation, "{spec}");
    }
    assert!(session.document()["npcs"][1].get("weaponMastery").is_none());
    assert_eq!(session.pending_count(), 0);

    session
        .set_field(
            &FieldTarget::positional(1, PositionalArray::WeaponMastery, MAX_POSITIONAL_LEN - 1),
            SaveValue::Number(1.0),
        )
        .expect("last allowed index");
    let mastery = session.document()["npcs"][1]["weaponMastery"]
        .as_array()
        .expect("mastery array");
    assert_eq!(mastery.len(), MAX_POSITIONAL_LEN);
}

#[test]
fn scalar_writes_never_replace_containers() {
    let text = r#"{"wealth":1,"party":{"membersID":[1]},"npcs":[{"id":1,"items":[{"id":5,"addAttrs":[]}],"humanAttribute":{"BSstrength":4}}]}"#;
    let mut session = Engine::new().open_str(text).expect("open inline save");

    for (spec, raw) in [
        ("game.npcs", "0"),
        ("game.party", "1"),
        ("items", "abc"),
        ("humanAttribute", "3"),
        ("items.0.addAttrs", "2"),
    ] {
        let target = FieldTarget::parse_spec(spec, Some(0)).expect(spec);
        let err = session
            .set_field_text(&target, raw)
            .expect_err("container should not be overwritten");
        assert_eq!(err.code, CoreErrorCode::UnsupportedOperation, "{spec}");
    }

    assert_eq!(session.pending_count(), 0);
    assert_eq!(session.serialize().expect("serialize"), text);
}

#[test]
fn trait_add_then_remove_stays_pending() {
    let mut session = open_fixture();
    assert!(session.document()["npcs"][2].get("traits").is_none());

    session.add_trait(2, 42).expect("add trait");
    assert_eq!(
        session.document()["npcs"][2]["traits"],
        SaveValue::from(vec![SaveValue::from(42_i64)])
    );
    assert_eq!(session.pending_count(), 1);

    let outcome = session
        .remove_from_list(2, CharacterList::Traits, 0)
        .expect("remove trait");
    assert!(!outcome.is_skipped());
    assert_eq!(
        session.document()["npcs"][2]["traits"],
        SaveValue::from(Vec::new())
    );
    assert_eq!(session.pending_count(), 2);
}

#[test]
fn added_trait_is_exported_and_counted_once() {
    let mut session = open_fixture();

    let outcome = session.add_trait(0, 42).expect("add trait");
    let path = outcome.path().expect("structural path").to_string();
    assert!(path.starts_with("npc.101.traits.add.42."), "{path}");
    assert_eq!(session.pending_count(), 1);

    let exported = reload(&session);
    assert_eq!(
        exported["npcs"][0]["traits"],
        SaveValue::from(vec![
            SaveValue::from(12_i64),
            SaveValue::from(40_i64),
            SaveValue::from(42_i64),
        ])
    );
}

#[test]
fn repeated_adds_are_separate_pending_changes() {
    let mut session = open_fixture();
    session.add_spell(0, 9).expect("first add");
    session.add_spell(0, 9).expect("second add");
    assert_eq!(session.pending_count(), 2);

    let spells = session.document()["npcs"][0]["spells"]
        .as_array()
        .expect("spells");
    assert_eq!(spells.len(), 3);
    assert_eq!(spells[2]["id"], SaveValue::from(9_i64));
    assert_eq!(spells[2]["lv"], SaveValue::Number(1.0));
}

#[test]
fn removal_shifts_later_entries() {
    let mut session = open_fixture();
    session
        .remove_from_list(0, CharacterList::Talents, 0)
        .expect("remove first talent");

    let talents = session.document()["npcs"][0]["talents"]
        .as_array()
        .expect("talents");
    assert_eq!(talents.len(), 1);
    assert_eq!(talents[0]["id"], SaveValue::from(301_i64));

    let out_of_range = session
        .remove_from_list(0, CharacterList::Talents, 5)
        .expect("remove past the end");
    assert!(out_of_range.is_skipped());
    assert_eq!(session.pending_count(), 1);
}

#[test]
fn added_item_takes_next_slot() {
    let mut session = open_fixture();
    session.add_item(0, NewItem::new(7777)).expect("add item");
    session.add_item(2, NewItem::new(8888)).expect("add first item");

    let items = session.document()["npcs"][0]["items"]
        .as_array()
        .expect("items");
    let added = &items[2];
    assert_eq!(added["id"], SaveValue::from(7777_i64));
    assert_eq!(added["slotIndex"], SaveValue::from(4_i64));
    assert_eq!(added["stackNum"], SaveValue::Number(1.0));
    assert_eq!(added["durability"], SaveValue::Number(100.0));
    assert_eq!(added["addAttrs"], SaveValue::from(Vec::new()));

    let first = &session.document()["npcs"][2]["items"][0];
    assert_eq!(first["slotIndex"], SaveValue::from(0_i64));
}

#[test]
fn party_membership_changes() {
    let mut session = open_fixture();

    assert!(session.add_party_member(101).expect("dedupe").is_skipped());
    session.add_party_member(205).expect("add member");
    assert_eq!(session.party_ids(), vec![101, 102, 205]);

    session.remove_party_member(101).expect("remove member");
    assert_eq!(session.party_ids(), vec![102, 205]);
    assert!(session.remove_party_member(999).expect("absent").is_skipped());
    assert_eq!(session.pending_count(), 2);

    let paths = session.pending_paths();
    assert!(paths.iter().any(|p| p.starts_with("party.add.205.")));
    assert!(paths.iter().any(|p| p.starts_with("party.remove.101.")));
}

#[test]
fn reset_restores_original_and_clears_pending() {
    let mut session = open_fixture();
    let before = session.document().clone();

    session.set_wealth(1.0).expect("set wealth");
    session.add_trait(0, 42).expect("add trait");
    session.remove_party_member(101).expect("remove party member");
    assert_eq!(session.pending_count(), 3);

    session.reset().expect("reset");
    assert_eq!(session.pending_count(), 0);
    assert_eq!(session.document(), &before);
}

#[test]
fn non_finite_numbers_export_as_null() {
    let mut session = open_fixture();
    session
        .set_field_text(&FieldTarget::scalar(0, "level"), "abc")
        .expect("non-numeric level");
    assert_eq!(session.pending_count(), 1);

    let exported = reload(&session);
    assert_eq!(exported["npcs"][0]["level"], SaveValue::Null);
}

#[test]
fn modified_export_keeps_key_order() {
    let session = Engine::new()
        .open_str(r#"{"zeta": 1, "alpha": {"b": 2, "a": 1}, "npcs": []}"#)
        .expect("open");
    let text = String::from_utf8(session.to_bytes_modified().expect("serialize")).expect("utf8");
    assert_eq!(text, r#"{"zeta":1,"alpha":{"b":2,"a":1},"npcs":[]}"#);
}
