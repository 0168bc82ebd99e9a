//! Extraction of the code portion from a chat-model answer.
//!
//! Models asked for "code only" still wrap their answer in markdown fences,
//! open with a friendly sentence, or echo their role. The cleaner drops those
//! lines and then skips any prose that precedes the first recognizable
//! Python statement. It is a heuristic: a code line that happens to contain
//! one of the filler phrases (for example inside a string literal) is
//! dropped as well.

/// Lines whose trimmed, lowercased form starts with this are markdown fences.
pub const FENCE_MARKER: &str = "```";

/// Conversational phrases; any line containing one of them is dropped.
pub const FILLER_PHRASES: [&str; 5] = ["sure", "certainly", "here is", "here's", "assistant"];

/// Prefixes marking the first line of actual code.
pub const CODE_START_PREFIXES: [&str; 4] = ["from ", "import ", "class ", "def "];

/// Return only the code segment of a raw model response.
///
/// Fence and filler lines are removed, then everything before the first line
/// that starts with a [`CODE_START_PREFIXES`] entry is discarded. When no such
/// line exists, all remaining lines are kept. Lines are rejoined with `\n`
/// and otherwise returned untouched.
pub fn clean_generated_code(raw: &str) -> String {
    let kept: Vec<&str> = raw.lines().filter(|line| !is_noise_line(line)).collect();
    let start = kept
        .iter()
        .position(|line| starts_code(line))
        .unwrap_or(0);
    kept[start..].join("\n")
}

/// True for fence lines and lines containing a filler phrase (case-insensitive).
pub fn is_noise_line(line: &str) -> bool {
    let normalized = line.trim().to_lowercase();
    normalized.starts_with(FENCE_MARKER)
        || FILLER_PHRASES
            .iter()
            .any(|phrase| normalized.contains(phrase))
}

/// True when the line, ignoring leading whitespace, opens a Python statement.
pub fn starts_code(line: &str) -> bool {
    let line = line.trim_start();
    CODE_START_PREFIXES
        .iter()
        .any(|prefix| line.starts_with(prefix))
}
