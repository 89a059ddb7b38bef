use std::collections::BTreeMap;

use proptest::prelude::*;
use reelwatch_core::{
    Feed, ProgressRecord, RenderEffect, SlotId, SlotTone, UnitId, UnitKind, UnitStatus,
};

fn status_strategy() -> impl Strategy<Value = UnitStatus> {
    (
        proptest::option::of(prop_oneof![Just("intro"), Just("outro"), Just("")]),
        proptest::option::of(prop_oneof![
            Just("🎙️ voicing"),
            Just("🎬 rendering"),
            Just("❌ failed: timeout"),
            Just("done"),
        ]),
        any::<bool>(),
    )
        .prop_map(|(text, step, done)| UnitStatus {
            text: text.map(str::to_string),
            step: step.map(str::to_string),
            done,
        })
}

fn unit_strategy() -> impl Strategy<Value = UnitId> {
    prop_oneof![Just("0"), Just("1"), Just("2"), Just("10"), Just("err")].prop_map(UnitId::new)
}

proptest! {
    #[test]
    fn each_unit_owns_one_slot_holding_its_last_update(
        updates in proptest::collection::vec((unit_strategy(), status_strategy()), 1..60)
    ) {
        let mut feed = Feed::new();
        let mut last: BTreeMap<UnitId, UnitStatus> = BTreeMap::new();
        let mut ever_done: BTreeMap<UnitId, bool> = BTreeMap::new();
        for (unit, status) in &updates {
            feed.apply(unit.clone(), status.clone());
            last.insert(unit.clone(), status.clone());
            *ever_done.entry(unit.clone()).or_default() |= status.done;
        }

        prop_assert_eq!(feed.len(), last.len());
        for (unit, status) in &last {
            let slot = feed.slot_for(unit).expect("slot for applied unit");
            prop_assert_eq!(&slot.status, status);
            prop_assert_eq!(slot.completed, ever_done[unit]);
        }
    }

    #[test]
    fn applying_a_record_twice_equals_applying_it_once(
        units in proptest::collection::btree_map(unit_strategy(), status_strategy(), 0..5),
        seed in proptest::collection::vec((unit_strategy(), status_strategy()), 0..10),
    ) {
        let mut base = Feed::new();
        for (unit, status) in seed {
            base.apply(unit, status);
        }
        let record = ProgressRecord { units, ..ProgressRecord::default() };

        let mut once = base.clone();
        once.apply_record(&record);
        let mut twice = once.clone();
        let second = twice.apply_record(&record);

        prop_assert_eq!(&once, &twice);
        let all_unchanged = second
            .iter()
            .all(|effect| matches!(effect, RenderEffect::Unchanged { .. }));
        prop_assert!(all_unchanged);
    }

    #[test]
    fn completion_is_sticky(later in proptest::collection::vec(status_strategy(), 0..20)) {
        let unit = UnitId::new("3");
        let mut feed = Feed::new();
        feed.apply(unit.clone(), UnitStatus::new("t3", "done", true));
        for status in later {
            feed.apply(unit.clone(), status);
            prop_assert!(feed.slot_for(&unit).unwrap().completed);
        }
    }
}

#[test]
fn new_units_are_shown_first_and_never_move() {
    let mut feed = Feed::new();
    feed.apply(UnitId::new("0"), UnitStatus::new("system", "warming up", false));
    feed.apply(UnitId::new("1"), UnitStatus::new("t1", "voicing", false));
    feed.apply(UnitId::new("2"), UnitStatus::new("t2", "voicing", false));
    feed.apply(UnitId::new("1"), UnitStatus::new("t1", "rendering", false));

    let order: Vec<_> = feed.newest_first().map(|slot| slot.unit.as_str()).collect();
    assert_eq!(order, vec!["2", "1", "0"]);
}

#[test]
fn apply_reports_minimal_redraws() {
    let mut feed = Feed::new();
    let unit = UnitId::new("1");

    assert_eq!(
        feed.apply(unit.clone(), UnitStatus::new("t1", "voicing", false)),
        RenderEffect::Inserted {
            slot: SlotId(0),
            unit: unit.clone()
        }
    );
    assert_eq!(
        feed.apply(unit.clone(), UnitStatus::new("t1", "voicing", false)),
        RenderEffect::Unchanged { slot: SlotId(0) }
    );
    assert_eq!(
        feed.apply(unit, UnitStatus::new("t1", "rendering", false)),
        RenderEffect::Updated { slot: SlotId(0) }
    );
}

#[test]
fn record_units_apply_in_numeric_order() {
    let record: ProgressRecord = serde_json::from_str(
        r#"{"progress": 40, "scenes_status": {
            "10": {"text": "t10", "step": "voicing", "done": false},
            "2": {"text": "t2", "step": "voicing", "done": false},
            "0": {"text": "system", "step": "running", "done": false}
        }}"#,
    )
    .unwrap();

    let mut feed = Feed::new();
    feed.apply_record(&record);

    let order: Vec<_> = feed.newest_first().map(|slot| slot.unit.as_str()).collect();
    assert_eq!(order, vec!["10", "2", "0"]);
}

#[test]
fn failure_marker_wins_over_done() {
    let mut feed = Feed::new();
    let unit = UnitId::new("4");
    feed.apply(unit.clone(), UnitStatus::new("t4", "done", true));
    assert_eq!(feed.slot_for(&unit).unwrap().tone(), SlotTone::Success);

    feed.apply(unit.clone(), UnitStatus::new("t4", "❌ failed: ffmpeg", false));
    let slot = feed.slot_for(&unit).unwrap();
    assert_eq!(slot.tone(), SlotTone::Error);
    assert!(slot.completed);
}

#[test]
fn reserved_units_are_distinguished() {
    let mut feed = Feed::new();
    feed.apply(UnitId::new("0"), UnitStatus::new("system", "ready", false));
    feed.apply(UnitId::notice(), UnitStatus::new("notice", "aborted", false));
    feed.apply(UnitId::alert(), UnitStatus::new("alert", "boom", false));
    feed.apply(UnitId::new("7"), UnitStatus::new("t7", "voicing", false));

    let kinds: Vec<_> = feed.newest_first().map(|slot| slot.kind).collect();
    assert_eq!(
        kinds,
        vec![
            UnitKind::Scene,
            UnitKind::Alert,
            UnitKind::Notice,
            UnitKind::System
        ]
    );
    let pending = feed
        .newest_first()
        .filter(|slot| slot.tone() == SlotTone::Pending)
        .count();
    assert_eq!(pending, 3);
}
