//! HTML → (plain text, [`MessageEntity`]) for outgoing messages.
//!
//! Supported tags: `<b>`, `<strong>`, `<i>`, `<em>`, `<u>`, `<s>`, `<del>`,
//! `<strike>`, `<code>`, `<pre>`, `<a href="url">` and `<br>`. Unknown tags are
//! dropped while their text is kept. Offsets and lengths are in UTF-16 code
//! units, as Telegram counts them.

use sessiongen_tl::api::MessageEntity;

#[derive(Debug, Clone, PartialEq)]
enum HtmlTag {
    Bold,
    Italic,
    Underline,
    Strike,
    Code,
    Pre { language: String },
    Link(String),
    Unknown,
}

struct Open {
    name:  String,
    tag:   HtmlTag,
    start: i32,
}

/// Parse a Telegram-compatible HTML string into `(plain_text, entities)`.
pub fn parse_html(html: &str) -> (String, Vec<MessageEntity>) {
    let mut out = String::with_capacity(html.len());
    let mut entities = Vec::new();
    let mut stack: Vec<Open> = Vec::new();
    let mut utf16_off: i32 = 0;

    let mut rest = html;
    while !rest.is_empty() {
        let Some(stripped) = rest.strip_prefix('<') else {
            let end = rest.find('<').unwrap_or(rest.len());
            for ch in decode_html_entities(&rest[..end]).chars() {
                out.push(ch);
                utf16_off += ch.len_utf16() as i32;
            }
            rest = &rest[end..];
            continue;
        };

        let end = stripped.find('>').unwrap_or(stripped.len());
        let content = stripped[..end].trim();
        rest = stripped.get(end + 1..).unwrap_or("");

        if let Some(closing) = content.strip_prefix('/') {
            let name = closing.trim().to_ascii_lowercase();
            if let Some(pos) = stack.iter().rposition(|o| o.name == name) {
                let open = stack.remove(pos);
                let length = utf16_off - open.start;
                if length > 0 {
                    if let Some(entity) = to_entity(open.tag, open.start, length) {
                        entities.push(entity);
                    }
                }
            }
            continue;
        }

        let (name, attrs) = parse_tag(content);
        let name = name.to_ascii_lowercase();
        let tag = match name.as_str() {
            "b" | "strong"         => HtmlTag::Bold,
            "i" | "em"             => HtmlTag::Italic,
            "u" | "ins"            => HtmlTag::Underline,
            "s" | "del" | "strike" => HtmlTag::Strike,
            "code" => {
                // <pre><code class="language-rust"> names the block's language.
                let language = attr(&attrs, "class")
                    .and_then(|c| c.strip_prefix("language-"))
                    .map(str::to_owned);
                match (language, stack.last_mut()) {
                    (Some(lang), Some(Open { tag: HtmlTag::Pre { language }, .. })) => {
                        *language = lang;
                        HtmlTag::Unknown
                    }
                    (_, Some(Open { tag: HtmlTag::Pre { .. }, .. })) => HtmlTag::Unknown,
                    _ => HtmlTag::Code,
                }
            }
            "pre" => HtmlTag::Pre { language: String::new() },
            "a"   => HtmlTag::Link(attr(&attrs, "href").unwrap_or_default().to_owned()),
            "br"  => {
                out.push('\n');
                utf16_off += 1;
                continue;
            }
            _ => HtmlTag::Unknown,
        };
        if content.ends_with('/') {
            continue;
        }
        stack.push(Open { name, tag, start: utf16_off });
    }

    entities.sort_by_key(MessageEntity::offset);
    (out, entities)
}

fn to_entity(tag: HtmlTag, offset: i32, length: i32) -> Option<MessageEntity> {
    Some(match tag {
        HtmlTag::Bold      => MessageEntity::Bold { offset, length },
        HtmlTag::Italic    => MessageEntity::Italic { offset, length },
        HtmlTag::Underline => MessageEntity::Underline { offset, length },
        HtmlTag::Strike    => MessageEntity::Strike { offset, length },
        HtmlTag::Code      => MessageEntity::Code { offset, length },
        HtmlTag::Pre { language } => MessageEntity::Pre { offset, length, language },
        HtmlTag::Link(url) if !url.is_empty() => MessageEntity::TextUrl { offset, length, url },
        HtmlTag::Link(_) | HtmlTag::Unknown => return None,
    })
}

/// Decodes the named entities Telegram documents plus numeric `&#NN;` / `&#xNN;`.
/// Unrecognised sequences are kept verbatim.
fn decode_html_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail.find(';').and_then(|semi| {
            let ch = match &tail[1..semi] {
                "amp"  => '&',
                "lt"   => '<',
                "gt"   => '>',
                "quot" => '"',
                "apos" => '\'',
                "nbsp" => '\u{00A0}',
                num => {
                    let num = num.strip_prefix('#')?;
                    let code = match num.strip_prefix(['x', 'X']) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                        None      => num.parse().ok()?,
                    };
                    char::from_u32(code)?
                }
            };
            Some((ch, semi + 1))
        });
        match decoded {
            Some((ch, used)) => {
                out.push(ch);
                rest = &tail[used..];
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

fn parse_tag(s: &str) -> (&str, Vec<(String, String)>) {
    let s = s.trim_end_matches('/').trim_end();
    let mut parts = s.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or("");
    let attrs = parse_attrs(parts.next().unwrap_or(""));
    (name, attrs)
}

fn parse_attrs(s: &str) -> Vec<(String, String)> {
    let mut result = Vec::new();
    let mut rem = s.trim();
    while let Some(eq) = rem.find('=') {
        let key = rem[..eq].trim().to_ascii_lowercase();
        rem = rem[eq + 1..].trim_start();
        let (val, rest) = match rem.chars().next() {
            Some(q @ ('"' | '\'')) => {
                let body = &rem[1..];
                let end = body.find(q).unwrap_or(body.len());
                (&body[..end], body.get(end + 1..).unwrap_or(""))
            }
            _ => {
                let end = rem.find(char::is_whitespace).unwrap_or(rem.len());
                (&rem[..end], &rem[end..])
            }
        };
        result.push((key, decode_html_entities(val)));
        rem = rest.trim_start();
    }
    result
}

fn attr<'a>(attrs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attrs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

// ─── Tests ────────────────────────────────────────────────────────────────────
