/// Carriage return, the only line terminator the controller understands.
pub const LINE_TERMINATOR: char = '\r';

/// Rewrite `program` so that every non-blank line is separated by a single
/// carriage return.
///
/// `\r\n` and lone `\r` are folded into `\n` first, then lines that are empty
/// after trimming are dropped. No terminator is appended after the last line.
pub fn normalize_line_endings(program: &str) -> String {
    let unified = program.replace("\r\n", "\n").replace('\r', "\n");

    let lines: Vec<&str> = unified
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .collect();

    lines.join(&LINE_TERMINATOR.to_string())
}
