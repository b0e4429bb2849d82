use std::fs;

use super::helpers::{install_dir, open_store, write_unit};
use crate::commands::export;
use crate::error::CabinetError;

#[test]
fn archive_round_trip_preserves_manifest_bytes() {
    let src = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_unit(src.path(), "Quest", Some("Ann"), Some("1.0"), "python");
    fs::write(
        src.path().join("game.json"),
        r#"{"name":"Quest","author":"Ann","version":"1.0","lang":"python","llm":"m","x-rating":5}"#,
    )
    .unwrap();

    let mut store = open_store(root.path());
    install_dir(&mut store, src.path());
    let original = fs::read(store.unit_dir("quest-ann").join("game.json")).unwrap();

    let archive = export::run(&store, "quest-ann", Some(out.path()), true).unwrap();
    assert_eq!(archive, out.path().join("quest-ann.tar.gz"));

    install_dir(&mut store, &archive);
    let ids: Vec<&str> = store.units().iter().map(|u| u.identifier.as_str()).collect();
    assert_eq!(ids, ["quest-ann", "quest-ann-1-0"]);
    let copy = fs::read(store.unit_dir("quest-ann-1-0").join("game.json")).unwrap();
    assert_eq!(copy, original);
}

#[test]
fn export_to_explicit_file_path() {
    let src = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_unit(src.path(), "Quest", None, None, "php");
    let mut store = open_store(root.path());
    install_dir(&mut store, src.path());

    let target = out.path().join("nested/dir/q.tar.gz");
    let written = export::run(&store, "1", Some(target.as_path()), true).unwrap();
    assert_eq!(written, target);
    assert!(target.is_file());
}

#[test]
fn directory_export_refuses_overwrite() {
    let src = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_unit(src.path(), "Quest", None, None, "php");
    let mut store = open_store(root.path());
    install_dir(&mut store, src.path());

    let first = export::run(&store, "quest", Some(out.path()), false).unwrap();
    assert_eq!(first, out.path().join("quest"));
    assert!(first.join("main.php").is_file());

    let err = export::run(&store, "quest", Some(out.path()), false).unwrap_err();
    assert!(matches!(err, CabinetError::Conflict(_)), "{err}");
}

#[test]
fn export_does_not_touch_store() {
    let src = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_unit(src.path(), "Quest", None, None, "php");
    let mut store = open_store(root.path());
    install_dir(&mut store, src.path());
    let index_before = fs::read(store.index_path()).unwrap();

    export::run(&store, "quest", Some(out.path()), true).unwrap();
    assert_eq!(fs::read(store.index_path()).unwrap(), index_before);
    assert_eq!(store.backup_identifiers().unwrap(), ["quest"]);
}

#[test]
fn batch_export_writes_every_unit() {
    let src = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let mut store = open_store(root.path());
    for name in ["One", "Two", "Three"] {
        let dir = src.path().join(name);
        write_unit(&dir, name, None, None, "bash");
        install_dir(&mut store, &dir);
    }

    let dest = out.path().join("exports");
    let written = export::run_batch(&store, &dest, true).unwrap();
    assert_eq!(written.len(), 3);
    for id in ["one", "two", "three"] {
        assert!(dest.join(format!("{id}.tar.gz")).is_file());
    }

    let dirs = export::run_batch(&store, &out.path().join("dirs"), false).unwrap();
    assert!(dirs.iter().all(|d| d.join("game.json").is_file()));
}

#[test]
fn unknown_unit_is_not_found() {
    let root = tempfile::tempdir().unwrap();
    let store = open_store(root.path());
    let out = tempfile::tempdir().unwrap();
    assert!(matches!(
        export::run(&store, "nothing", Some(out.path()), true),
        Err(CabinetError::NotFound(_))
    ));
}
