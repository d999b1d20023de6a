use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..")
}

fn fixture_path() -> String {
    workspace_root()
        .join("tests/fixtures/SAVE.dat")
        .to_string_lossy()
        .to_string()
}

fn data_dir() -> String {
    workspace_root()
        .join("tests/fixtures/data")
        .to_string_lossy()
        .to_string()
}

fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_aor-se"))
        .args(args)
        .env_remove("AOR_SE_DATA_DIR")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run aor-se CLI")
}

fn temp_output_path(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("{prefix}_{}_{}.dat", std::process::id(), nanos))
}

fn read_json(path: &PathBuf) -> Value {
    let bytes = std::fs::read(path).expect("expected output file to be created");
    serde_json::from_slice(&bytes).expect("output file should be JSON")
}

#[test]
fn cli_prints_single_wealth_field() {
    let output = run_cli(&["--wealth", &fixture_path()]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), "wealth=1250");
}

#[test]
fn cli_prints_multiple_requested_fields_in_fixed_order() {
    let output = run_cli(&["--game-date", "--reputation", "--wealth", &fixture_path()]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec!["wealth=1250", "reputation=35", "game_date=Year 2, Day 14"]
    );
}

#[test]
fn cli_lists_party_and_searches_others() {
    let output = run_cli(&["--party", "--search", "inn", &fixture_path()]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "party=101:Aria (Lv 5 Adventurer)",
            "party=102:Borin (Lv 7 Blacksmith)",
            "search_total=1",
            "search=205:Marta the Innkeeper (Lv 2 Innkeeper)",
        ]
    );
}

#[test]
fn cli_without_field_flags_prints_character_sheet() {
    let output = run_cli(&["--data-dir", &data_dir(), &fixture_path()]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("SAVE RECORD"));
    assert!(stdout.contains("Aria  (ID 101)"));
    assert!(stdout.contains("Night Owl"));
    assert!(stdout.contains("Iron Longsword"));
}

#[test]
fn cli_selects_character_by_id() {
    let output = run_cli(&["--character", "310", &fixture_path()]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Grey Wolf  (ID 310)"));
    assert!(stdout.contains(" ::: Items :::\n  none"));
}

#[test]
fn cli_rejects_unknown_character() {
    let output = run_cli(&["--character", "4242", &fixture_path()]);
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no character with id 4242"));
}

#[test]
fn cli_rejects_invalid_save() {
    let bad = temp_output_path("aor_se_invalid_input");
    std::fs::write(&bad, b"{ not json").expect("should write bad input");
    let bad_s = bad.to_string_lossy().to_string();

    let output = run_cli(&["--wealth", &bad_s]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error parsing save file"));

    let _ = std::fs::remove_file(&bad);
}

#[test]
fn cli_outputs_selected_fields_as_json() {
    let output = run_cli(&["--json", "--wealth", "--pending", &fixture_path()]);
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(json["wealth"], 1250);
    assert_eq!(json["pending_count"], 0);
    assert_eq!(json["pending"], Value::Array(Vec::new()));
}

#[test]
fn cli_outputs_default_json_in_expected_order() {
    let output = run_cli(&["--json", &fixture_path()]);
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    let keys: Vec<&str> = json
        .as_object()
        .expect("json should be an object")
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(
        keys,
        vec!["game", "party", "character", "pending_count", "pending"]
    );
    assert_eq!(json["character"]["id"], 101);
}

#[test]
fn cli_set_requires_output_path() {
    let output = run_cli(&["--set", "wealth=5", &fixture_path()]);
    assert_eq!(output.status.code(), Some(2));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("edit flags require --output"));
}

#[test]
fn cli_output_requires_edit_flag() {
    let out_path = temp_output_path("aor_se_output_without_set");
    let out_path_s = out_path.to_string_lossy().to_string();
    let output = run_cli(&["--output", &out_path_s, &fixture_path()]);
    assert_eq!(output.status.code(), Some(2));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--output requires at least one edit flag"));
}

#[test]
fn cli_rejects_malformed_set() {
    let out_path = temp_output_path("aor_se_malformed_set");
    let out_path_s = out_path.to_string_lossy().to_string();

    let no_equals = run_cli(&["--set", "wealth", "--output", &out_path_s, &fixture_path()]);
    assert_eq!(no_equals.status.code(), Some(2));

    let bad_field = run_cli(&[
        "--set",
        "traits.0.lv=3",
        "--output",
        &out_path_s,
        &fixture_path(),
    ]);
    assert_eq!(bad_field.status.code(), Some(2));
    assert!(!out_path.exists());
}

#[test]
fn cli_rejects_out_of_range_positional_index() {
    let out_path = temp_output_path("aor_se_huge_index");
    let out_path_s = out_path.to_string_lossy().to_string();

    let output = run_cli(&[
        "--set",
        "weaponMastery.4000000000=1",
        "--output",
        &out_path_s,
        &fixture_path(),
    ]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("out of range"));
    assert!(!out_path.exists());
}

#[test]
fn cli_can_set_fields_and_write_output_file() {
    let out_path = temp_output_path("aor_se_set_fields");
    let out_path_s = out_path.to_string_lossy().to_string();

    let output = run_cli(&[
        "--character",
        "102",
        "--set",
        "wealth=99999",
        "--set",
        "gameTime.day=3",
        "--set",
        "level=8",
        "--set",
        "unitname=Borin Stonefist",
        "--set",
        "weaponMastery.2=10",
        "--output",
        &out_path_s,
        "--pending",
        &fixture_path(),
    ]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("pending=5"));
    assert!(stdout.contains("pending_path=npc.102.weaponMastery.2"));

    let json = read_json(&out_path);
    assert_eq!(json["wealth"], 99999);
    assert_eq!(json["gameTime"]["day"], 3);
    let borin = &json["npcs"][1];
    assert_eq!(borin["level"], 8);
    assert_eq!(borin["unitname"], "Borin Stonefist");
    assert_eq!(borin["weaponMastery"], serde_json::json!([0, 0, 10]));
    assert_eq!(json["npcs"][0]["level"], 5);

    let _ = std::fs::remove_file(&out_path);
}

#[test]
fn cli_can_edit_lists_and_party() {
    let out_path = temp_output_path("aor_se_lists_party");
    let out_path_s = out_path.to_string_lossy().to_string();

    let output = run_cli(&[
        "--add-trait",
        "42",
        "--remove-talent",
        "0",
        "--add-spell",
        "9",
        "--add-item",
        "7777",
        "--remove-trait",
        "1",
        "--add-party",
        "205",
        "--remove-party",
        "102",
        "--output",
        &out_path_s,
        &fixture_path(),
    ]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Wrote edited save to"));
    assert!(stdout.contains("7 changes pending"));

    let json = read_json(&out_path);
    let aria = &json["npcs"][0];
    assert_eq!(aria["traits"], serde_json::json!([12, 42]));
    assert_eq!(aria["talents"][0]["id"], 301);
    assert_eq!(aria["spells"][1], serde_json::json!({"id": 9, "lv": 1}));
    assert_eq!(aria["items"][2]["id"], 7777);
    assert_eq!(aria["items"][2]["slotIndex"], 4);
    assert_eq!(json["party"]["membersID"], serde_json::json!([101, 205]));

    let _ = std::fs::remove_file(&out_path);
}

#[test]
fn cli_backup_is_byte_identical() {
    let backup_path = temp_output_path("aor_se_backup");
    let backup_path_s = backup_path.to_string_lossy().to_string();
    let out_path = temp_output_path("aor_se_backup_output");
    let out_path_s = out_path.to_string_lossy().to_string();

    let output = run_cli(&[
        "--set",
        "wealth=1",
        "--output",
        &out_path_s,
        "--backup",
        &backup_path_s,
        &fixture_path(),
    ]);
    assert!(output.status.success());

    let original = std::fs::read(fixture_path()).expect("fixture should read");
    let backup = std::fs::read(&backup_path).expect("backup should exist");
    assert_eq!(backup, original);

    let _ = std::fs::remove_file(&out_path);
    let _ = std::fs::remove_file(&backup_path);
}

#[test]
fn cli_refuses_to_overwrite_output_without_force_flag() {
    let out_path = temp_output_path("aor_se_overwrite_block");
    let out_path_s = out_path.to_string_lossy().to_string();
    std::fs::write(&out_path, b"placeholder").expect("should create placeholder output");

    let output = run_cli(&["--set", "wealth=5", "--output", &out_path_s, &fixture_path()]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("refusing to overwrite existing file"));
    assert_eq!(
        std::fs::read(&out_path).expect("output should still exist"),
        b"placeholder"
    );

    let forced = run_cli(&[
        "--set",
        "wealth=5",
        "--force-overwrite",
        "--output",
        &out_path_s,
        &fixture_path(),
    ]);
    assert!(forced.status.success());
    assert_eq!(read_json(&out_path)["wealth"], 5);

    let _ = std::fs::remove_file(&out_path);
}

#[test]
fn cli_warns_when_edit_is_skipped() {
    let out_path = temp_output_path("aor_se_skipped");
    let out_path_s = out_path.to_string_lossy().to_string();

    let output = run_cli(&[
        "--character",
        "205",
        "--set",
        "heroCareer.killCount=3",
        "--output",
        &out_path_s,
        &fixture_path(),
    ]);
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("edit skipped"));
    assert!(String::from_utf8_lossy(&output.stdout).contains("no changes pending"));

    let _ = std::fs::remove_file(&out_path);
}
