// tests/merge_snapshot.rs
use chrono::{TimeZone, Utc};
use quake_feed_sync::{merge_events, merge_records, normalize_feed_str, MergeKey, Record};
use serde_json::{json, Value};

const FEED: &str = include_str!("fixtures/gempadirasakan.json");

fn rec(v: Value) -> Record {
    match v {
        Value::Object(m) => m,
        other => panic!("not an object: {other}"),
    }
}

fn recs(v: Value) -> Vec<Record> {
    match v {
        Value::Array(items) => items.into_iter().map(rec).collect(),
        other => panic!("not an array: {other}"),
    }
}

#[test]
fn same_id_replaces_location() {
    let stale = recs(json!([{"id": "X", "location": "Old"}]));
    let fresh = recs(json!([{"id": "X", "location": "New"}]));
    let out = merge_records(stale, fresh, MergeKey::Id).unwrap();
    assert_eq!(out.records, recs(json!([{"id": "X", "location": "New"}])));
}

#[test]
fn empty_fresh_returns_stale_unchanged() {
    let stale = recs(json!([{"id": "A", "v": 1}, {"id": "B", "v": 2}]));
    let out = merge_records(stale.clone(), vec![], MergeKey::Id).unwrap();
    assert_eq!(out.records, stale);
    assert_eq!((out.inserted, out.matched), (0, 0));
}

#[test]
fn empty_stale_returns_fresh() {
    let fresh = recs(json!([{"id": "A"}, {"id": "B"}, {"id": "C"}]));
    let out = merge_records(vec![], fresh.clone(), MergeKey::Id).unwrap();
    assert_eq!(out.records, fresh);
    assert_eq!(out.inserted, 3);
}

#[test]
fn one_new_one_matching_adds_one() {
    let stale = recs(json!([{"id": "A"}, {"id": "B"}]));
    let fresh = recs(json!([{"id": "B", "x": 1}, {"id": "C"}]));
    let out = merge_records(stale, fresh, MergeKey::Id).unwrap();
    assert_eq!(out.records.len(), 3);
    let ids: Vec<&str> = out.records.iter().map(|r| r["id"].as_str().unwrap()).collect();
    assert_eq!(ids, ["A", "B", "C"]);
}

#[test]
fn absence_from_fresh_never_deletes() {
    let stale = recs(json!([{"id": "A"}, {"id": "B"}, {"id": "C"}]));
    let fresh = recs(json!([{"id": "B"}]));
    let out = merge_records(stale, fresh, MergeKey::Id).unwrap();
    assert_eq!(out.records.len(), 3);
}

#[test]
fn second_merge_is_byte_identical() {
    let now = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
    let fresh = normalize_feed_str(FEED, now).unwrap();
    let stale = recs(json!([
        {"id": "20221219055014", "fingerprint": "legacy", "feltStationsText": "II Ternate", "source": "backfill"},
        {"id": "20210101000000", "locationText": "older quake"}
    ]));

    let once = merge_events(stale, &fresh, MergeKey::Id).unwrap();
    let twice = merge_events(once.records.clone(), &fresh, MergeKey::Id).unwrap();
    assert_eq!(
        serde_json::to_string_pretty(&once.records).unwrap(),
        serde_json::to_string_pretty(&twice.records).unwrap()
    );
    assert_eq!(twice.inserted, 0);
    assert_eq!(twice.changed, 0);

    assert_eq!(once.records.len(), 4);
    assert_eq!(once.records[0]["source"], "backfill");
    assert_eq!(once.records[0]["feltStationsText"], "III Ternate, II Tidore");
    assert_eq!(once.records[0]["fingerprint"], fresh[0].fingerprint.as_str());
}

#[test]
fn persisted_anomaly_flag_is_kept() {
    let stale = recs(json!([{"id": "A", "anomaly": "FUTURE_EVENT"}]));
    let fresh = recs(json!([{"id": "A", "magnitude": 4.0}]));
    let out = merge_records(stale, fresh, MergeKey::Id).unwrap();
    assert_eq!(out.records[0]["anomaly"], "FUTURE_EVENT");
}

#[test]
fn legacy_fingerprint_key_still_works() {
    let now = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
    let fresh = normalize_feed_str(FEED, now).unwrap();
    let stale = recs(json!([{"fingerprint": fresh[2].fingerprint.clone(), "note": "pre-id era"}]));
    let out = merge_events(stale, &fresh, MergeKey::Fingerprint).unwrap();
    assert_eq!(out.records.len(), 3);
    assert_eq!(out.records[0]["note"], "pre-id era");
    assert_eq!(out.records[0]["id"], "20220109090305");
}
