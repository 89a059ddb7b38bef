use reelwatch_core::{
    AppViewModel, ConnectionIndicator, RunPhase, SlotTone, SlotView, TaskOutcome,
};

/// Lines to print when the view moves from `prev` to `next`: one status line
/// if the header changed, then one line per new or changed slot, oldest first.
pub fn diff_lines(prev: &AppViewModel, next: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();

    if status_changed(prev, next) {
        lines.push(render_status(next));
    }

    for slot in next.slots.iter().rev() {
        if !prev.slots.contains(slot) {
            lines.push(render_slot(slot));
        }
    }

    if next.artifact != prev.artifact {
        if let Some(path) = &next.artifact {
            lines.push(format!("saved video to {path}"));
        }
    }
    if next.outcome != prev.outcome {
        if let Some(outcome) = &next.outcome {
            lines.push(render_outcome(outcome));
        }
    }

    lines
}

fn status_changed(prev: &AppViewModel, next: &AppViewModel) -> bool {
    prev.phase != next.phase
        || prev.connection != next.connection
        || prev.progress != next.progress
        || prev.notice != next.notice
        || prev.task_id != next.task_id
}

pub fn render_status(view: &AppViewModel) -> String {
    let phase = match view.phase {
        RunPhase::Idle => "idle",
        RunPhase::Running => "running",
    };
    let connection = match view.connection {
        ConnectionIndicator::Ready => "ready",
        ConnectionIndicator::Connecting => "connecting",
        ConnectionIndicator::Live => "live",
        ConnectionIndicator::Degraded => "connection lost",
    };

    let mut line = format!("[{phase}] {:>3}% {connection}", view.progress);
    if let Some(task_id) = &view.task_id {
        line.push_str(&format!(" task={task_id}"));
    }
    if let Some(notice) = &view.notice {
        line.push_str(&format!(" | {notice}"));
    }
    line
}

pub fn render_slot(slot: &SlotView) -> String {
    let marker = match slot.tone {
        SlotTone::Pending => "…",
        SlotTone::Success => "✔",
        SlotTone::Error => "✖",
    };
    match &slot.step {
        Some(step) => format!("{marker} {}: {} [{step}]", slot.label, slot.text),
        None => format!("{marker} {}: {}", slot.label, slot.text),
    }
}

fn render_outcome(outcome: &TaskOutcome) -> String {
    match outcome {
        TaskOutcome::Completed => "generation completed".to_string(),
        TaskOutcome::Failed(reason) => format!("generation failed: {reason}"),
        TaskOutcome::Aborted => "task aborted".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use reelwatch_core::{SlotId, TaskId, UnitId, UnitKind};

    fn scene(id: u32, unit: &str, text: &str, tone: SlotTone) -> SlotView {
        SlotView {
            id: SlotId(id),
            unit: UnitId::new(unit),
            kind: UnitKind::Scene,
            label: format!("scene {unit}"),
            text: text.to_string(),
            step: Some("rendering".to_string()),
            tone,
        }
    }

    fn running(progress: u8, slots: Vec<SlotView>) -> AppViewModel {
        AppViewModel {
            phase: RunPhase::Running,
            connection: ConnectionIndicator::Live,
            task_id: TaskId::new("t-1"),
            progress,
            slots,
            ..AppViewModel::default()
        }
    }

    #[test]
    fn identical_views_print_nothing() {
        let view = running(30, vec![scene(0, "1", "t1", SlotTone::Pending)]);
        assert!(diff_lines(&view, &view).is_empty());
    }

    #[test]
    fn only_changed_slots_are_printed_oldest_first() {
        let prev = running(
            30,
            vec![
                scene(1, "2", "t2", SlotTone::Pending),
                scene(0, "1", "t1", SlotTone::Pending),
            ],
        );
        let next = running(
            30,
            vec![
                scene(2, "3", "t3", SlotTone::Pending),
                scene(1, "2", "t2", SlotTone::Pending),
                scene(0, "1", "t1", SlotTone::Success),
            ],
        );
        assert_eq!(
            diff_lines(&prev, &next),
            vec![
                "✔ scene 1: t1 [rendering]".to_string(),
                "… scene 3: t3 [rendering]".to_string(),
            ]
        );
    }

    #[test]
    fn progress_change_prints_a_status_line() {
        let prev = running(30, Vec::new());
        let next = running(55, Vec::new());
        assert_eq!(
            diff_lines(&prev, &next),
            vec!["[running]  55% live task=t-1".to_string()]
        );
    }

    #[test]
    fn disconnect_shows_only_the_indicator() {
        let prev = running(40, vec![scene(0, "1", "t1", SlotTone::Pending)]);
        let next = AppViewModel {
            connection: ConnectionIndicator::Degraded,
            ..prev.clone()
        };
        assert_eq!(
            diff_lines(&prev, &next),
            vec!["[running]  40% connection lost task=t-1".to_string()]
        );
    }

    #[test]
    fn outcome_and_artifact_are_announced_once() {
        let prev = running(100, Vec::new());
        let next = AppViewModel {
            phase: RunPhase::Idle,
            connection: ConnectionIndicator::Ready,
            outcome: Some(TaskOutcome::Completed),
            artifact: Some("out/ai_video_t-1.mp4".to_string()),
            ..prev.clone()
        };
        let lines = diff_lines(&prev, &next);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "saved video to out/ai_video_t-1.mp4");
        assert_eq!(lines[2], "generation completed");
        assert!(diff_lines(&next, &next).is_empty());
    }

    #[test]
    fn slots_without_step_omit_the_brackets() {
        let slot = SlotView {
            step: None,
            kind: UnitKind::Alert,
            label: "system alert".to_string(),
            ..scene(0, "err", "❌ quota exceeded", SlotTone::Error)
        };
        assert_eq!(render_slot(&slot), "✖ system alert: ❌ quota exceeded");
    }
}
