use super::*;

const PROJECT: &str = r#"{
  "libraryItems": [
    { "id": "imgA", "type": "image", "url": "a.png", "fileName": "a.png" },
    { "id": "imgB", "type": "image", "url": "b.png" }
  ],
  "timelineItems": [
    { "id": "c1", "libraryItemId": "imgA", "duration": 3, "startTime": 42,
      "transition": "fade", "transitionDuration": 1 },
    { "id": "c2", "libraryItemId": "ghost", "duration": 3, "startTime": 3 },
    { "id": "c3", "libraryItemId": "imgB", "duration": 30, "startTime": 3,
      "transition": "wipe", "transitionDuration": 9 }
  ]
}"#;

#[test]
fn hydration_recomputes_start_times_and_drops_dangling_clips() {
    let snapshot: ProjectSnapshot = serde_json::from_str(PROJECT).unwrap();
    let mut res = ResourceRegistry::new();
    let h = hydrate(&snapshot, Path::new("/proj"), &mut res).unwrap();

    assert_eq!(h.library.len(), 2);
    assert_eq!(res.live_count(), 2);
    assert_eq!(h.timeline.len(), 2);

    let clips = h.timeline.clips();
    assert_eq!(clips[0].start_time(), 0.0);
    assert_eq!(clips[1].start_time(), 3.0);
    assert_eq!(clips[1].duration(), 10.0);
    assert_eq!(clips[1].transition().secs, Some(2.0));
    assert_eq!(h.warnings.len(), 2);
    assert!(h.warnings[0].contains("ghost"));
}

#[test]
fn capture_emits_camel_case_projection() {
    let snapshot: ProjectSnapshot = serde_json::from_str(PROJECT).unwrap();
    let mut res = ResourceRegistry::new();
    let h = hydrate(&snapshot, Path::new("/proj"), &mut res).unwrap();

    let out = ProjectSnapshot::capture(&h.library, &h.timeline);
    let text = out.to_json_pretty().unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["libraryItems"][0]["type"], "image");
    assert_eq!(json["libraryItems"][0]["fileName"], "a.png");
    assert!(json["libraryItems"][1].get("fileName").is_none());
    assert_eq!(json["timelineItems"][0]["libraryItemId"], "imgA");
    assert_eq!(json["timelineItems"][0]["transition"], "fade");
    assert_eq!(json["timelineItems"][0]["transitionDuration"], 1.0);
    assert_eq!(json["timelineItems"][1]["startTime"], 3.0);
}

#[test]
fn duplicate_library_ids_fail_hydration() {
    let snapshot = ProjectSnapshot {
        library_items: vec![
            SerializedLibraryItem {
                id: "x".into(),
                kind: MediaKind::Image,
                url: "x.png".into(),
                duration: None,
                file_name: None,
            };
            2
        ],
        timeline_items: vec![],
    };
    let mut res = ResourceRegistry::new();
    assert!(hydrate(&snapshot, Path::new("."), &mut res).is_err());
}

#[test]
fn missing_transition_hydrates_as_cut() {
    let snapshot: ProjectSnapshot = serde_json::from_str(
        r#"{ "libraryItems": [{ "id": "a", "type": "image", "url": "a.png" }],
             "timelineItems": [{ "id": "c", "libraryItemId": "a", "duration": 2, "startTime": 0 }] }"#,
    )
    .unwrap();
    let mut res = ResourceRegistry::new();
    let h = hydrate(&snapshot, Path::new("."), &mut res).unwrap();
    assert_eq!(h.timeline.clips()[0].transition(), ClipTransition::none());
}
