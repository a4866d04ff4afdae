const EXIT_COMMANDS: [&str; 2] = ["exit", "quit"];

/// `exit` / `quit` in any letter case, ignoring surrounding whitespace.
pub fn is_exit_command(input: &str) -> bool {
    let input = input.trim();
    EXIT_COMMANDS
        .iter()
        .any(|cmd| input.eq_ignore_ascii_case(cmd))
}

/// Shorten `text` to at most `max_chars` characters for log lines.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}
