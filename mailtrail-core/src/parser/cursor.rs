//! Whitespace tokenizer shared by the log grammars.
//!
//! Both MTAs write `KEY=value` and `KEY="quoted value"` tokens; a quoted
//! value may contain spaces and backslash escaped quotes, so a token only
//! ends at whitespace outside quotes.

/// Iterator over the whitespace separated words of a log line.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    pub(crate) const fn new(text: &'a str) -> Self {
        Self { rest: text }
    }

    /// Everything not consumed yet, without leading whitespace.
    pub(crate) fn rest(&self) -> &'a str {
        self.rest.trim_start()
    }
}

impl<'a> Iterator for Cursor<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let text = self.rest.trim_start();
        if text.is_empty() {
            self.rest = text;
            return None;
        }

        let end = token_end(text);
        let (word, rest) = text.split_at(end);
        self.rest = rest;
        Some(word)
    }
}

fn token_end(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut quoted = false;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' if quoted => i += 1,
            b'"' => quoted = !quoted,
            b if b.is_ascii_whitespace() && !quoted => return i,
            _ => {}
        }
        i += 1;
    }

    bytes.len()
}

/// Value of the first `key=value` word in `text`, with quotes removed.
pub(crate) fn field<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    Cursor::new(text)
        .find_map(|word| word.strip_prefix(key)?.strip_prefix('='))
        .map(unquote)
}

pub(crate) fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Remove one pair of surrounding angle brackets, if present.
pub(crate) fn strip_angle(value: &str) -> &str {
    value
        .strip_prefix('<')
        .and_then(|v| v.strip_suffix('>'))
        .unwrap_or(value)
}

/// Three digit SMTP reply code at the start of `text`.
///
/// The code must be followed by a space, a `-` continuation marker or the
/// end of the text, so `2.0.0` enhanced codes and numbers such as IP octets
/// are not mistaken for one.
pub(crate) fn reply_code(text: &str) -> Option<u16> {
    let text = text.trim_start();
    let digits = text.get(..3)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) || !(b'2'..=b'5').contains(&digits.as_bytes()[0]) {
        return None;
    }

    match text.as_bytes().get(3) {
        None | Some(b' ' | b'-') => digits.parse().ok(),
        Some(_) => None,
    }
}

/// Queue id the next hop assigned to a relayed message, as reported in its
/// acceptance reply: `250 OK id=1cNiyG-00040U-Ls` or
/// `250 2.0.0 Ok: queued as B7F313A054`.
pub(crate) fn handoff_id(reply: &str) -> Option<&str> {
    let from_id = Cursor::new(reply).find_map(|word| word.strip_prefix("id="));
    let candidate = from_id.or_else(|| {
        let (_, after) = reply.split_once("queued as ")?;
        Cursor::new(after).next()
    })?;

    let candidate = candidate.trim_end_matches([')', ',', ';', '.']);
    let valid = !candidate.is_empty()
        && candidate
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-');
    valid.then_some(candidate)
}
