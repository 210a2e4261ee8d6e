//! Greedy word wrap for the receipt body.

/// Wraps `text` to lines of at most `width` characters.
///
/// Each input line is wrapped on its own, so line breaks in the poem survive
/// and blank lines stay as stanza breaks. Runs of whitespace collapse to a
/// single space. Words are never split: a word longer than `width` gets a
/// line to itself. Wrapping already-wrapped text returns it unchanged.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();

    for line in text.lines() {
        let mut current = String::new();
        let mut current_len = 0;

        for word in line.split_whitespace() {
            let word_len = word.chars().count();
            if current_len == 0 {
                current.push_str(word);
                current_len = word_len;
            } else if current_len + 1 + word_len <= width {
                current.push(' ');
                current.push_str(word);
                current_len += 1 + word_len;
            } else {
                out.push(std::mem::take(&mut current));
                current.push_str(word);
                current_len = word_len;
            }
        }
        out.push(current);
    }

    out
}
