//! Upload sanitizer.
//!
//! Takes untrusted markup text and returns text the rest of the pipeline can
//! parse: prolog, doctype, CDATA, comments, script, and style blocks are
//! stripped (uploaded documents must not execute code or inject global
//! styles), whitespace is collapsed, and the SVG namespace is injected when
//! absent. If the result still fails a structural parse, a best-effort
//! escape-and-reopen repair pass runs. Sanitization never fails: the worst
//! case is returning text that downstream parsing rejects, in which case the
//! pipeline proceeds with an empty inventory.

use crate::dom::{Document, SVG_NS};

pub fn sanitize(raw: &str) -> String {
    let mut cleaned = raw.to_string();

    // Strip order matters: outer prolog material first, then embedded blocks.
    strip_spans(&mut cleaned, "<?xml", "?>");
    strip_spans(&mut cleaned, "<!doctype", ">");
    strip_spans(&mut cleaned, "<![cdata[", "]]>");
    strip_spans(&mut cleaned, "<!--", "-->");
    strip_tag_blocks(&mut cleaned, "script");
    strip_tag_blocks(&mut cleaned, "style");

    cleaned = collapse_whitespace(&cleaned);

    if !cleaned.contains(&format!(r#"xmlns="{SVG_NS}""#)) {
        cleaned = cleaned.replacen("<svg", &format!(r#"<svg xmlns="{SVG_NS}""#), 1);
    }

    if Document::parse(&cleaned).is_err() {
        tracing::warn!("sanitized markup failed to parse, applying repair pass");
        cleaned = repair(&cleaned);
    }

    cleaned
}

/// Remove every case-insensitive `open ... close` span. A span with no
/// closing token is left in place. ASCII lowercasing keeps byte offsets
/// valid for the original text.
fn strip_spans(text: &mut String, open: &str, close: &str) {
    loop {
        let lower = text.to_ascii_lowercase();
        let Some(start) = lower.find(open) else {
            return;
        };
        let Some(rel_end) = lower[start + open.len()..].find(close) else {
            return;
        };
        let end = start + open.len() + rel_end + close.len();
        text.replace_range(start..end, "");
    }
}

/// Remove `<tag ...> ... </tag>` blocks, case-insensitive. An unclosed
/// block is left in place.
fn strip_tag_blocks(text: &mut String, tag: &str) {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");
    loop {
        let lower = text.to_ascii_lowercase();
        let Some(start) = lower.find(&open) else {
            return;
        };
        let Some(rel_end) = lower[start..].find(&close) else {
            return;
        };
        let end = start + rel_end + close.len();
        text.replace_range(start..end, "");
    }
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_ws = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_ws && !out.is_empty() {
                out.push(' ');
            }
            in_ws = true;
        } else {
            out.push(ch);
            in_ws = false;
        }
    }
    out.trim_end().to_string()
}

/// Escape-and-reopen repair: escape stray `&` and every angle bracket, then
/// re-expand anything that still looks like a tag. Best-effort and lossy for
/// pathological input; accepted as-is by the caller.
fn repair(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let ch = bytes[i] as char;
        match ch {
            '&' => {
                const ENTITIES: [&str; 5] = ["amp;", "lt;", "gt;", "quot;", "apos;"];
                let rest = &text[i + 1..];
                if ENTITIES.iter().any(|e| rest.starts_with(e)) {
                    escaped.push('&');
                } else {
                    escaped.push_str("&amp;");
                }
                i += 1;
            }
            '<' => {
                escaped.push_str("&lt;");
                i += 1;
            }
            '>' => {
                escaped.push_str("&gt;");
                i += 1;
            }
            _ => {
                let c = text[i..].chars().next().expect("in-bounds char");
                escaped.push(c);
                i += c.len_utf8();
            }
        }
    }
    reopen_tags(&escaped)
}

/// Re-expand `&lt;name ...&gt;` back into `<name ...>` when the content
/// between the escaped brackets starts like a tag name and contains no other
/// entity start.
fn reopen_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("&lt;") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 4..];
        let looks_like_tag = after
            .strip_prefix('/')
            .unwrap_or(after)
            .starts_with(|c: char| c.is_ascii_alphabetic());
        let body_end = after.find('&');
        match (looks_like_tag, body_end) {
            (true, Some(end)) if after[end..].starts_with("&gt;") => {
                out.push('<');
                out.push_str(&after[..end]);
                out.push('>');
                rest = &after[end + 4..];
            }
            _ => {
                out.push_str("&lt;");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
