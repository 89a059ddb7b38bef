use reelwatch_core::{JobOptions, JobRequest, ProgressRecord, TaskId, TaskStatus, UnitId};

#[test]
fn server_snapshot_decodes_with_extra_fields() {
    let record: ProgressRecord = serde_json::from_str(
        r#"{
            "status": "running",
            "progress": 45,
            "scenes_status": {
                "0": {"text": "系统信息", "step": "🏭 running", "done": false},
                "1": {"text": "第一句", "step": "已完成", "done": true}
            },
            "video_path": null,
            "error": null,
            "last_update": 1718000000.25
        }"#,
    )
    .unwrap();

    assert_eq!(record.status, Some(TaskStatus::Running));
    assert_eq!(record.progress, Some(45));
    assert_eq!(record.error, None);
    assert_eq!(record.units.len(), 2);
    assert!(record.units[&UnitId::new("1")].done);
    assert!(!record.is_terminal());
}

#[test]
fn progress_is_clamped_and_may_be_fractional() {
    let high: ProgressRecord = serde_json::from_str(r#"{"progress": 140}"#).unwrap();
    let low: ProgressRecord = serde_json::from_str(r#"{"progress": -3}"#).unwrap();
    let frac: ProgressRecord = serde_json::from_str(r#"{"progress": 33.6}"#).unwrap();
    let none: ProgressRecord = serde_json::from_str(r#"{"progress": null}"#).unwrap();

    assert_eq!(high.progress, Some(100));
    assert_eq!(low.progress, Some(0));
    assert_eq!(frac.progress, Some(34));
    assert_eq!(none.progress, None);
}

#[test]
fn unknown_status_and_null_units_are_tolerated() {
    let record: ProgressRecord =
        serde_json::from_str(r#"{"status": "queued", "scenes_status": null}"#).unwrap();
    assert_eq!(record.status, Some(TaskStatus::Unknown));
    assert!(record.units.is_empty());
    assert!(!record.is_terminal());
}

#[test]
fn blank_error_is_not_an_error() {
    let record: ProgressRecord = serde_json::from_str(r#"{"error": "  "}"#).unwrap();
    assert_eq!(record.error, None);

    let failed: ProgressRecord = serde_json::from_str(r#"{"error": "boom"}"#).unwrap();
    assert!(failed.is_terminal());
}

#[test]
fn task_ids_must_not_be_blank() {
    assert!(TaskId::new("   ").is_none());
    assert_eq!(TaskId::new(" ab12 ").unwrap().as_str(), "ab12");
    assert!(serde_json::from_str::<TaskId>(r#""""#).is_err());
}

#[test]
fn job_request_flattens_options() {
    let request = JobRequest {
        text: "你好".to_string(),
        options: JobOptions::default(),
    };
    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(json["text"], "你好");
    assert_eq!(json["voice"], "zh-CN-XiaoxiaoNeural");
    assert_eq!(json["resolution"], "9:16");
    assert_eq!(json["bgm"], "none");
    assert_eq!(json["subtitle_style"], "classic_yellow");
    assert!(json.get("image_config").is_none());
}
