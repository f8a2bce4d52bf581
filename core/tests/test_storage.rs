use chrono::{Duration, TimeZone, Utc};
use gpxsplit_core::{
    list_recordings, load_config, load_recording, parse_recording_text, save_config, save_recording, DirStore,
    Recorder, RecordingStore, SplitConfig, State,
};

#[test]
fn recorder_output_survives_dir_store() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = DirStore::open(dir.path()).expect("open store");

    let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
    let mut rec = Recorder::new();
    rec.start(State::Good, t0).unwrap();
    rec.toggle(t0 + Duration::minutes(10)).unwrap();
    let text = rec.end(t0 + Duration::minutes(25)).unwrap();

    let key = save_recording(&mut store, &text, t0 + Duration::minutes(25)).expect("save");
    assert_eq!(key, "recording-2024-05-01T08-55-00.000Z.txt");

    // Fremmede filer i katalogen skal ikke listes
    store.set("notes.md", "hei").unwrap();

    let list = list_recordings(&store).expect("list");
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].recorded_at, t0 + Duration::minutes(25));

    let loaded = load_recording(&store, &key).expect("load");
    let intervals = parse_recording_text(&loaded);
    assert_eq!(intervals.len(), 2);
    assert_eq!(intervals[1].state, State::Avoid);
}

#[test]
fn dir_store_rejects_path_like_keys() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = DirStore::open(dir.path()).expect("open store");
    assert!(store.set("../escape.txt", "x").is_err());
    assert!(load_recording(&store, "../escape.txt").is_err());
}

#[test]
fn config_roundtrip_and_missing_file_default() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.json");

    let missing = load_config(&path).expect("default");
    assert_eq!(missing, SplitConfig::default());
    assert_eq!(missing.max_gap_secs, 300);

    let cfg = SplitConfig { max_gap_secs: 120, creator: "Test".into(), ..SplitConfig::default() };
    save_config(&cfg, &path).expect("save");
    let loaded = load_config(&path).expect("load");
    assert_eq!(loaded, cfg);
}

#[test]
fn partial_config_uses_defaults_and_bad_field_reports_path() {
    let cfg = SplitConfig::from_json(r#"{"max_gap_secs": 60}"#).unwrap();
    assert_eq!(cfg.max_gap_secs, 60);
    assert_eq!(cfg.creator, "SegmentApp");

    let err = SplitConfig::from_json(r#"{"max_gap_secs": "lang"}"#).unwrap_err();
    assert!(err.to_string().contains("max_gap_secs"), "got: {err}");
}
