//! Rendered text, approximating a browser's `innerText`.
//!
//! There is no layout engine here, so "rendered" is decided from markup:
//! elements that never render (scripts, styles, `hidden`, inline
//! `display: none`) contribute nothing, block-level elements sit on their
//! own lines, and ordinary whitespace collapses the way CSS `white-space:
//! normal` collapses it.

use super::{Document, ElementData, NodeData, NodeId};

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "caption", "dd", "details", "dialog", "div",
    "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4",
    "h5", "h6", "header", "hgroup", "hr", "li", "main", "nav", "ol", "p", "pre", "section",
    "summary", "table", "tbody", "tfoot", "thead", "tr", "ul",
];

const UNRENDERED_ELEMENTS: &[&str] = &[
    "head", "noscript", "script", "style", "template", "title",
];

const PREFORMATTED_ELEMENTS: &[&str] = &["pre", "textarea", "listing", "plaintext"];

enum Piece {
    Text(String),
    Preformatted(String),
    Break,
}

impl Document {
    /// Visible text of a node, with line breaks where the page would show them.
    ///
    /// A node that is not rendered itself (hidden, or inside something
    /// hidden) has no layout to read, so its raw text content is returned.
    pub fn rendered_text(&self, id: NodeId) -> String {
        if self.closest(id, |el| !is_rendered(el)).is_some() {
            return self.text_content(id);
        }
        let mut pieces = Vec::new();
        self.collect_pieces(id, false, &mut pieces);
        join_pieces(pieces)
    }

    /// Concatenation of every text node below `id`, markup ignored.
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .into_iter()
            .filter_map(|n| match self.data(n) {
                Some(NodeData::Text(t)) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    fn collect_pieces(&self, id: NodeId, preformatted: bool, out: &mut Vec<Piece>) {
        match self.data(id) {
            Some(NodeData::Text(t)) => {
                if preformatted {
                    out.push(Piece::Preformatted(t.clone()));
                } else {
                    out.push(Piece::Text(t.clone()));
                }
            }
            Some(NodeData::Element(el)) => {
                if !is_rendered(el) {
                    return;
                }
                if el.name() == "br" {
                    out.push(Piece::Break);
                    return;
                }
                let block = BLOCK_ELEMENTS.contains(&el.name());
                let pre = preformatted || PREFORMATTED_ELEMENTS.contains(&el.name());
                if block {
                    out.push(Piece::Break);
                }
                for &child in self.children(id) {
                    self.collect_pieces(child, pre, out);
                }
                if block {
                    out.push(Piece::Break);
                }
            }
            Some(NodeData::Document) => {
                for &child in self.children(id) {
                    self.collect_pieces(child, preformatted, out);
                }
            }
            Some(NodeData::Comment(_)) | None => {}
        }
    }
}

fn is_rendered(el: &ElementData) -> bool {
    if UNRENDERED_ELEMENTS.contains(&el.name()) || el.has_attr("hidden") {
        return false;
    }
    match el.attr("style") {
        Some(style) => !hides_display(style),
        None => true,
    }
}

fn hides_display(style: &str) -> bool {
    style.split(';').any(|decl| {
        let mut parts = decl.splitn(2, ':');
        let prop = parts.next().unwrap_or("").trim();
        let value = parts.next().unwrap_or("").trim();
        prop.eq_ignore_ascii_case("display")
            && value
                .split_ascii_whitespace()
                .next()
                .is_some_and(|v| v.eq_ignore_ascii_case("none"))
    })
}

/// Collapse whitespace inside each line, then join the lines.
///
/// Consecutive breaks count once, and breaks at either end are dropped.
fn join_pieces(pieces: Vec<Piece>) -> String {
    let mut lines: Vec<String> = vec![String::new()];
    let mut pending_space = false;
    let mut pending_break = false;

    for piece in pieces {
        match piece {
            Piece::Break => {
                pending_break = true;
                pending_space = false;
            }
            Piece::Text(text) => {
                for (i, word) in text.split_ascii_whitespace().enumerate() {
                    let line = start_line(&mut lines, &mut pending_break);
                    if (i > 0 || pending_space || starts_with_space(&text)) && !line.is_empty() {
                        line.push(' ');
                    }
                    line.push_str(word);
                    pending_space = false;
                }
                if ends_with_space(&text) {
                    pending_space = true;
                }
            }
            Piece::Preformatted(text) => {
                let line = start_line(&mut lines, &mut pending_break);
                if pending_space && !line.is_empty() {
                    line.push(' ');
                }
                pending_space = false;
                let mut segments = text.split('\n');
                if let Some(first) = segments.next() {
                    line.push_str(first);
                }
                for segment in segments {
                    lines.push(segment.to_string());
                }
            }
        }
    }

    while lines.last().is_some_and(|l| l.is_empty()) && lines.len() > 1 {
        lines.pop();
    }
    lines.join("\n")
}

fn start_line<'a>(lines: &'a mut Vec<String>, pending_break: &mut bool) -> &'a mut String {
    if *pending_break {
        if lines.last().is_some_and(|l| !l.is_empty()) {
            lines.push(String::new());
        }
        *pending_break = false;
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    let last = lines.len() - 1;
    &mut lines[last]
}

fn starts_with_space(text: &str) -> bool {
    text.starts_with(|c: char| c.is_ascii_whitespace())
}

fn ends_with_space(text: &str) -> bool {
    text.ends_with(|c: char| c.is_ascii_whitespace())
}
