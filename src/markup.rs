//! Markup-aware text extraction.
//!
//! Turns HTML-bearing strings into plain text: non-visible elements are
//! dropped together with their inner text, block-level boundaries become
//! newline breaks, remaining tags are stripped, character references are
//! decoded, and whitespace is tidied into a stable shape. The result is
//! line-oriented plain text that survives a second pass unchanged.
//!
//! This is intentionally not a full HTML parser. Extracted field
//! values are small fragments, so a single forward scan with a handful of
//! element classes covers what the comparison layer needs.

/// Elements whose entire content is invisible to a reader.
const HIDDEN_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "template", "iframe", "frame", "object", "embed", "svg",
    "canvas", "audio", "video", "head",
];

/// Elements that introduce a visual line or block boundary.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "fieldset",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main",
    "nav", "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Extract readable text from a markup-bearing string.
pub(crate) fn extract_text(input: &str) -> String {
    let stripped = strip_markup(input);
    let decoded = decode_entities(&stripped);
    tidy_whitespace(&decoded)
}

enum Break {
    None,
    Line,
}

struct Markup {
    consumed: usize,
    brk: Break,
}

/// Remove tags and comments, dropping hidden-element content entirely and
/// emitting a newline at every block boundary.
fn strip_markup(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find('<') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match parse_markup(tail) {
            Some(markup) => {
                // One break per boundary run: "</p><p>" yields a single newline.
                if matches!(markup.brk, Break::Line) && !out.ends_with('\n') && !out.is_empty() {
                    out.push('\n');
                }
                rest = &tail[markup.consumed..];
            }
            None => {
                // A bare '<' that does not open a tag is literal text.
                out.push('<');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Parse one markup construct starting at `tail` (which begins with '<').
/// Returns `None` when the '<' is not markup.
fn parse_markup(tail: &str) -> Option<Markup> {
    if let Some(after) = tail.strip_prefix("<!--") {
        // Comment: consume through the terminator, or everything if unterminated.
        let consumed = match after.find("-->") {
            Some(end) => 4 + end + 3,
            None => tail.len(),
        };
        return Some(Markup {
            consumed,
            brk: Break::None,
        });
    }
    if tail.starts_with("<!") || tail.starts_with("<?") {
        // Doctype or processing instruction.
        let consumed = tail.find('>').map_or(tail.len(), |end| end + 1);
        return Some(Markup {
            consumed,
            brk: Break::None,
        });
    }

    let body = &tail[1..];
    let (closing, body) = match body.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, body),
    };

    let name_len = body
        .char_indices()
        .take_while(|(_, ch)| ch.is_ascii_alphanumeric())
        .map(|(i, ch)| i + ch.len_utf8())
        .last()
        .unwrap_or(0);
    if name_len == 0 || !body.starts_with(|ch: char| ch.is_ascii_alphabetic()) {
        return None;
    }
    let name = body[..name_len].to_ascii_lowercase();

    let tag_end = find_tag_end(tail);
    let self_closing = tail[..tag_end].trim_end_matches('>').ends_with('/');

    let mut consumed = tag_end;
    if !closing && !self_closing && HIDDEN_ELEMENTS.contains(&name.as_str()) {
        // Drop everything up to and including the matching close tag.
        consumed = match find_close_tag(&tail[tag_end..], &name) {
            Some(end) => tag_end + end,
            None => tail.len(),
        };
    }

    // Hidden elements separate surrounding text just like block elements,
    // otherwise "before<script>..</script>after" would fuse into one word.
    let brk = if BLOCK_ELEMENTS.contains(&name.as_str()) || HIDDEN_ELEMENTS.contains(&name.as_str())
    {
        Break::Line
    } else {
        Break::None
    };
    Some(Markup { consumed, brk })
}

/// Byte offset just past the '>' that terminates the tag at the start of
/// `tail`, honoring quoted attribute values. Unterminated tags swallow the
/// remainder of the input.
fn find_tag_end(tail: &str) -> usize {
    let mut quote: Option<char> = None;
    for (i, ch) in tail.char_indices() {
        match quote {
            Some(q) => {
                if ch == q {
                    quote = None;
                }
            }
            None => match ch {
                '"' | '\'' => quote = Some(ch),
                '>' => return i + 1,
                _ => {}
            },
        }
    }
    tail.len()
}

/// Byte offset just past the `</name ... >` close tag, case-insensitive.
fn find_close_tag(tail: &str, name: &str) -> Option<usize> {
    let lower = tail.to_ascii_lowercase();
    let needle = format!("</{name}");
    let mut from = 0;
    while let Some(rel) = lower[from..].find(&needle) {
        let at = from + rel;
        let after = at + needle.len();
        // Require the name to end here: "</script>" matches, "</scripted>" does not.
        let terminated = lower[after..]
            .chars()
            .next()
            .is_none_or(|ch| ch == '>' || ch.is_ascii_whitespace());
        if terminated {
            return match tail[after..].find('>') {
                Some(end) => Some(after + end + 1),
                None => Some(tail.len()),
            };
        }
        from = after;
    }
    None
}

/// Decode named and numeric character references. Unknown references are
/// left untouched.
fn decode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match parse_entity(tail) {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Longest reference we bother to scan for; real entities are far shorter.
const MAX_ENTITY_LEN: usize = 32;

fn parse_entity(tail: &str) -> Option<(char, usize)> {
    let rest = &tail[1..];
    let semi = rest.find(';')?;
    if semi > MAX_ENTITY_LEN {
        return None;
    }
    let body = &rest[..semi];
    let consumed = semi + 2;

    if let Some(num) = body.strip_prefix('#') {
        let code = if let Some(hex) = num.strip_prefix(['x', 'X']) {
            u32::from_str_radix(hex, 16).ok()?
        } else {
            num.parse::<u32>().ok()?
        };
        return char::from_u32(code).map(|ch| (ch, consumed));
    }
    named_entity(body).map(|ch| (ch, consumed))
}

/// The standard named references that show up in extracted page text.
fn named_entity(name: &str) -> Option<char> {
    let ch = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{00A0}',
        "copy" => '\u{00A9}',
        "reg" => '\u{00AE}',
        "trade" => '\u{2122}',
        "hellip" => '\u{2026}',
        "mdash" => '\u{2014}',
        "ndash" => '\u{2013}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201C}',
        "rdquo" => '\u{201D}',
        "laquo" => '\u{00AB}',
        "raquo" => '\u{00BB}',
        "bull" => '\u{2022}',
        "middot" => '\u{00B7}',
        "deg" => '\u{00B0}',
        "plusmn" => '\u{00B1}',
        "times" => '\u{00D7}',
        "divide" => '\u{00F7}',
        "euro" => '\u{20AC}',
        "pound" => '\u{00A3}',
        "yen" => '\u{00A5}',
        "cent" => '\u{00A2}',
        "sect" => '\u{00A7}',
        "para" => '\u{00B6}',
        _ => return None,
    };
    Some(ch)
}

/// Normalize extracted text into its stable whitespace shape: spaces
/// collapsed within lines, line edges trimmed, at most one empty line in a
/// row, outer edges trimmed. Applying it twice yields the same string.
pub(crate) fn tidy_whitespace(input: &str) -> String {
    let unified = input.replace("\r\n", "\n").replace('\r', "\n");

    let mut out = String::with_capacity(unified.len());
    let mut empty_run = 0usize;
    for raw_line in unified.split('\n') {
        let mut line = String::with_capacity(raw_line.len());
        for segment in raw_line.split_whitespace() {
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(segment);
        }

        if line.is_empty() {
            empty_run += 1;
            if empty_run > 1 || out.is_empty() {
                continue;
            }
        } else {
            empty_run = 0;
        }

        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&line);
    }

    // A trailing blank line can survive the loop; drop it.
    while out.ends_with('\n') {
        out.pop();
    }
    out
}
