//! Artifact format tests.

use std::collections::HashSet;

use kafka_offset_migrate_core::migrate::artifact::{parse, read, render, write};
use kafka_offset_migrate_core::migrate::{prune, IntermediateArtifact};
use kafka_offset_migrate_core::{ExclusionList, OffsetEntry};

use super::helpers::snapshot;

#[test]
fn written_artifact_reads_back_the_same_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("offsets.csv");
    let original = snapshot(&[
        ("payments", 2, 0),
        ("orders", 0, 100),
        ("orders.v2-eu", 11, 4_294_967_296),
    ]);

    write(&original, &path).unwrap();
    let restored = read(&path).unwrap();

    let expected: HashSet<OffsetEntry> = original.entries().collect();
    let actual: HashSet<OffsetEntry> = restored.entries().collect();
    assert_eq!(actual, expected);
}

#[test]
fn topic_names_containing_commas_survive_parsing() {
    let parsed = parse("weird,topic,3,42\n").unwrap();
    assert_eq!(parsed.get("weird,topic", 3), Some(42));
}

#[test]
fn pruned_scenario_writes_single_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("offsets.csv");
    let pruned = prune(
        snapshot(&[("t1", 0, 100), ("t2", 0, 50)]),
        &ExclusionList::parse("t2"),
    );

    write(&pruned, &path).unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "t1,0,100\n");
}

#[test]
fn empty_snapshot_writes_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("offsets.csv");

    let artifact = IntermediateArtifact::create(&snapshot(&[]), &path).unwrap();

    assert_eq!(std::fs::read_to_string(artifact.path()).unwrap(), "");
    artifact.remove().unwrap();
    assert!(!path.exists());
}

#[test]
fn write_overwrites_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("offsets.csv");
    std::fs::write(&path, "stale,0,1\nstale,1,2\n").unwrap();

    write(&snapshot(&[("fresh", 0, 9)]), &path).unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "fresh,0,9\n");
}

#[test]
fn render_matches_file_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("offsets.csv");
    let snap = snapshot(&[("a", 0, 1), ("b", 1, 2)]);

    write(&snap, &path).unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), render(&snap));
}

#[test]
fn remove_tolerates_already_deleted_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("offsets.csv");
    let artifact = IntermediateArtifact::create(&snapshot(&[("a", 0, 1)]), &path).unwrap();

    std::fs::remove_file(&path).unwrap();

    artifact.remove().unwrap();
}
