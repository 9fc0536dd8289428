//! Long TXT value codec
//!
//! A single TXT character-string holds at most 255 octets. DNS Made Easy
//! stores longer values as consecutive quoted segments with no separator:
//!
//! ```text
//! "first 255 octets...""remaining octets"
//! ```
//!
//! [`encode`] produces that form and [`decode`] joins it back. For values
//! without double quotes, `decode(&encode(v)) == v`.

/// Maximum octets per TXT segment
pub const MAX_SEGMENT_LEN: usize = 255;

/// Split `value` into quoted segments of at most [`MAX_SEGMENT_LEN`] octets.
pub fn encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2 * (value.len() / MAX_SEGMENT_LEN + 1));
    let mut rest = value;

    if rest.is_empty() {
        out.push_str("\"\"");
        return out;
    }

    while !rest.is_empty() {
        let end = segment_end(rest);
        out.push('"');
        out.push_str(&rest[..end]);
        out.push('"');
        rest = &rest[end..];
    }
    out
}

/// Byte offset where the next segment of `rest` ends
fn segment_end(rest: &str) -> usize {
    if rest.len() <= MAX_SEGMENT_LEN {
        return rest.len();
    }

    let mut end = MAX_SEGMENT_LEN;
    while !rest.is_char_boundary(end) {
        end -= 1;
    }

    // An odd run of trailing backslashes would escape the delimiter that follows
    let trailing = rest.as_bytes()[..end]
        .iter()
        .rev()
        .take_while(|&&b| b == b'\\')
        .count();
    if trailing % 2 == 1 { end - 1 } else { end }
}

/// Join a stored TXT value back into one string.
///
/// Strips the outer quotes and removes every `""` segment delimiter that is
/// not escaped, i.e. preceded by an even run of backslashes.
pub fn decode(raw: &str) -> String {
    let inner = if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        &raw[1..raw.len() - 1]
    } else {
        raw
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    let mut backslashes = 0usize;

    while let Some(c) = chars.next() {
        if c == '"' && backslashes % 2 == 0 && chars.peek() == Some(&'"') {
            chars.next();
            backslashes = 0;
            continue;
        }
        out.push(c);
        backslashes = if c == '\\' { backslashes + 1 } else { 0 };
    }
    out
}
