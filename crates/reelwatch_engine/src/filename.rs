use reelwatch_core::TaskId;

/// Name the finished video is saved under: `ai_video_{task_id}.mp4`, with
/// characters that are unsafe in file names replaced.
pub fn artifact_filename(task_id: &TaskId) -> String {
    format!("ai_video_{}.mp4", sanitize_component(task_id.as_str()))
}

fn sanitize_component(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let mut cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]).to_string();
    if cleaned.is_empty() {
        cleaned = "task".to_string();
    }
    if cleaned.len() > 80 {
        let mut cut = 80;
        while !cleaned.is_char_boundary(cut) {
            cut -= 1;
        }
        cleaned.truncate(cut);
    }
    cleaned
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}
