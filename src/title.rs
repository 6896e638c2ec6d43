//! Session titles derived from the first user message

const MAX_TITLE_LENGTH: usize = 60;

/// Build a display title from a message.
///
/// Whitespace runs collapse to single spaces and long titles are cut at a
/// word boundary. Returns None when nothing printable remains.
pub fn title_from_message(text: &str) -> Option<String> {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }

    if collapsed.chars().count() <= MAX_TITLE_LENGTH {
        return Some(collapsed);
    }

    let truncated: String = collapsed.chars().take(MAX_TITLE_LENGTH).collect();
    let cut = match truncated.rfind(' ') {
        Some(last_space) if last_space > 0 => truncated.split_at(last_space).0.to_string(),
        _ => truncated,
    };
    Some(format!("{cut}…"))
}
