//! Small helpers for the cell markup carried by the table model.
//!
//! Cells keep their markup verbatim; these helpers only derive the plain text
//! used for full-match search and sorting, and escape plain text coming from
//! delimited input.

/// Derive the text content of a markup fragment: tags are dropped and the
/// common character entities decoded.
pub fn text_content(html: &str) -> String {
    if !html.contains(['<', '&']) {
        return html.to_string();
    }

    let mut stripped = String::with_capacity(html.len());
    let mut in_tag = false;
    let mut quote: Option<char> = None;
    for ch in html.chars() {
        match (in_tag, quote, ch) {
            (false, _, '<') => in_tag = true,
            (false, _, c) => stripped.push(c),
            (true, None, '"' | '\'') => quote = Some(ch),
            (true, Some(q), c) if c == q => quote = None,
            (true, None, '>') => in_tag = false,
            (true, _, _) => {}
        }
    }

    decode_entities(&stripped)
}

/// Decode named and numeric character references.
///
/// Unknown entities are kept as written.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        let (before, after) = rest.split_at(amp);
        out.push_str(before);

        let decoded = after
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| {
                let name = after.get(1..semi)?;
                decode_entity(name).map(|ch| (ch, semi + 1))
            });

        match decoded {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = after.get(consumed..).unwrap_or("");
            }
            None => {
                out.push('&');
                rest = after.get(1..).unwrap_or("");
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" | "#39" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        "hellip" => Some('\u{2026}'),
        "laquo" => Some('\u{ab}'),
        "raquo" => Some('\u{bb}'),
        "lsaquo" => Some('\u{2039}'),
        "rsaquo" => Some('\u{203a}'),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse::<u32>().ok()?,
            };
            char::from_u32(value)
        }
    }
}

/// Escape plain text so it can be stored as cell markup.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("plain", "plain" ; "no markup")]
    #[test_case("<b>bold</b> text", "bold text" ; "simple tags")]
    #[test_case("<a href=\"x>y\">link</a>", "link" ; "quoted gt in attribute")]
    #[test_case("Fish &amp; Chips", "Fish & Chips" ; "named entity")]
    #[test_case("&#65;&#x42;", "AB" ; "numeric entities")]
    #[test_case("a &bogus; b", "a &bogus; b" ; "unknown entity kept")]
    #[test_case("5 & 6", "5 & 6" ; "bare ampersand")]
    fn test_text_content(html: &str, expected: &str) {
        assert_eq!(text_content(html), expected);
    }

    #[test]
    fn test_escape_then_text_content() {
        let raw = "<script>\"x\" & 'y'</script>";
        let escaped = escape(raw);
        assert!(!escaped.contains('<'));
        assert_eq!(text_content(&escaped), raw);
    }
}
