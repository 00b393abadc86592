//! HTML form of the document.
//!
//! Content is exchanged with storage either as structured JSON or as an
//! HTML string. This module converts editor HTML into the same node
//! vocabulary the live editor uses, so math regions inside it are
//! recognized identically, and serializes a tree back out.
//!
//! Editor HTML is parsed as markup via roxmltree after a small
//! normalization pass (void tags closed, `&nbsp;` resolved). Anything that
//! still fails to parse is reported as [`ModelError::Markup`]; callers fall
//! back rather than erroring the user.

use smol_str::SmolStr;

use crate::node::{kind, Mark, Node};
use crate::ModelError;

const ROOT_TAG: &str = "texflow-root";

/// Parse an HTML string into a `"doc"` tree.
pub fn parse_html(html: &str) -> Result<Node, ModelError> {
    let prepared = prepare_markup(html);
    let wrapped = format!("<{ROOT_TAG}>{prepared}</{ROOT_TAG}>");
    let xml = roxmltree::Document::parse(&wrapped).map_err(|e| {
        tracing::debug!(target: "texflow::model", error = %e, "markup parse failed");
        ModelError::Markup {
            message: e.to_string(),
        }
    })?;

    let mut blocks = Vec::new();
    let mut pending_inline: Vec<Node> = Vec::new();
    for child in xml.root_element().children() {
        convert_top_level(child, &mut blocks, &mut pending_inline);
    }
    flush_inline(&mut blocks, &mut pending_inline);

    Ok(Node::doc(blocks))
}

/// Top-level children become blocks; stray inline content is wrapped in a
/// paragraph so no text is dropped.
fn convert_top_level(
    xml: roxmltree::Node<'_, '_>,
    blocks: &mut Vec<Node>,
    pending_inline: &mut Vec<Node>,
) {
    if xml.is_text() {
        let text = xml.text().unwrap_or_default();
        if !text.trim().is_empty() {
            pending_inline.push(Node::text(text));
        }
        return;
    }
    if !xml.is_element() {
        return;
    }

    match tag_name(xml) {
        "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "ul" | "ol" | "img" => {
            flush_inline(blocks, pending_inline);
            if let Some(block) = convert_block(xml) {
                blocks.push(block);
            }
        }
        // Transparent wrappers: hoist their children.
        "div" | "section" | "article" | "main" | "body" | "html" => {
            for child in xml.children() {
                convert_top_level(child, blocks, pending_inline);
            }
        }
        // Inline element at the top level.
        _ => {
            let mut marks = Vec::new();
            convert_inline(xml, &mut marks, pending_inline);
        }
    }
}

fn flush_inline(blocks: &mut Vec<Node>, pending_inline: &mut Vec<Node>) {
    if !pending_inline.is_empty() {
        blocks.push(Node::paragraph(std::mem::take(pending_inline)));
    }
}

fn convert_block(xml: roxmltree::Node<'_, '_>) -> Option<Node> {
    let tag = tag_name(xml);
    match tag {
        "p" => Some(Node::paragraph(convert_inline_children(xml))),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = tag[1..].parse::<u8>().unwrap_or(1);
            Some(Node::heading(level, convert_inline_children(xml)))
        }
        "ul" => Some(Node::bullet_list(convert_list_items(xml))),
        "ol" => Some(Node::ordered_list(convert_list_items(xml))),
        "img" => Some(Node::image(
            xml.attribute("src").unwrap_or_default(),
            xml.attribute("alt"),
        )),
        _ => None,
    }
}

fn convert_list_items(xml: roxmltree::Node<'_, '_>) -> Vec<Node> {
    let mut items = Vec::new();
    for child in xml.children() {
        if child.is_element() && tag_name(child) == "li" {
            let mut blocks = Vec::new();
            let mut inline = Vec::new();
            for grandchild in child.children() {
                convert_top_level(grandchild, &mut blocks, &mut inline);
            }
            flush_inline(&mut blocks, &mut inline);
            items.push(Node::list_item(blocks));
        }
    }
    items
}

fn convert_inline_children(xml: roxmltree::Node<'_, '_>) -> Vec<Node> {
    let mut out = Vec::new();
    let mut marks = Vec::new();
    for child in xml.children() {
        convert_inline(child, &mut marks, &mut out);
    }
    out
}

/// Inline conversion with the active mark stack.
fn convert_inline(xml: roxmltree::Node<'_, '_>, marks: &mut Vec<Mark>, out: &mut Vec<Node>) {
    if xml.is_text() {
        let text = xml.text().unwrap_or_default();
        if !text.is_empty() {
            out.push(Node::text(text).with_marks(marks.clone()));
        }
        return;
    }
    if !xml.is_element() {
        return;
    }

    let mark = match tag_name(xml) {
        "br" => {
            out.push(Node::hard_break());
            return;
        }
        "img" => {
            out.push(Node::image(
                xml.attribute("src").unwrap_or_default(),
                xml.attribute("alt"),
            ));
            return;
        }
        "b" | "strong" => Some(Mark::new("bold")),
        "i" | "em" => Some(Mark::new("italic")),
        "a" => Some(Mark::new("link").with_attr("href", xml.attribute("href").unwrap_or_default())),
        "span" => style_color(xml).map(|c| Mark::new("color").with_attr("color", c.as_str())),
        _ => None,
    };

    let pushed = mark.is_some();
    if let Some(mark) = mark {
        marks.push(mark);
    }
    for child in xml.children() {
        convert_inline(child, marks, out);
    }
    if pushed {
        marks.pop();
    }
}

fn style_color(xml: roxmltree::Node<'_, '_>) -> Option<SmolStr> {
    let style = xml.attribute("style")?;
    for decl in style.split(';') {
        let mut parts = decl.splitn(2, ':');
        let prop = parts.next()?.trim();
        if prop.eq_ignore_ascii_case("color") {
            return parts.next().map(|v| SmolStr::new(v.trim()));
        }
    }
    None
}

fn tag_name<'a>(xml: roxmltree::Node<'a, '_>) -> &'a str {
    xml.tag_name().name()
}

/// Close the HTML void tags roxmltree rejects and resolve `&nbsp;`.
fn prepare_markup(html: &str) -> String {
    let html = html.replace("&nbsp;", "\u{00A0}");
    let mut out = String::with_capacity(html.len());
    let mut rest = html.as_str();

    while let Some(open) = rest.find('<') {
        let (before, tail) = rest.split_at(open);
        out.push_str(before);
        let Some(close) = tail.find('>') else {
            out.push_str(tail);
            return out;
        };
        let tag = &tail[..=close];
        if is_void_tag(tag) && !tag.ends_with("/>") {
            out.push_str(&tag[..close]);
            out.push_str("/>");
        } else {
            out.push_str(tag);
        }
        rest = &tail[close + 1..];
    }
    out.push_str(rest);
    out
}

fn is_void_tag(tag: &str) -> bool {
    let name: String = tag
        .trim_start_matches('<')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();
    matches!(name.to_ascii_lowercase().as_str(), "br" | "hr" | "img")
}

/// Serialize a tree back to HTML.
pub fn to_html(doc: &Node) -> String {
    let mut out = String::new();
    for block in &doc.content {
        write_node(block, &mut out);
    }
    out
}

fn write_node(node: &Node, out: &mut String) {
    match node.kind.as_str() {
        kind::PARAGRAPH => write_wrapped(node, "p", out),
        kind::HEADING => {
            let level = node.attr_u64("level").unwrap_or(1).clamp(1, 6);
            let tag = format!("h{level}");
            write_wrapped(node, &tag, out);
        }
        kind::BULLET_LIST => write_wrapped(node, "ul", out),
        kind::ORDERED_LIST => write_wrapped(node, "ol", out),
        kind::LIST_ITEM => write_wrapped(node, "li", out),
        kind::IMAGE => {
            out.push_str("<img src=\"");
            escape_into(out, node.attr_str("src").unwrap_or_default());
            out.push('"');
            if let Some(alt) = node.attr_str("alt") {
                out.push_str(" alt=\"");
                escape_into(out, alt);
                out.push('"');
            }
            out.push_str("/>");
        }
        kind::HARD_BREAK => out.push_str("<br/>"),
        kind::TEXT => write_text(node, out),
        _ => {
            for child in &node.content {
                write_node(child, out);
            }
        }
    }
}

fn write_wrapped(node: &Node, tag: &str, out: &mut String) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    for child in &node.content {
        write_node(child, out);
    }
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn write_text(node: &Node, out: &mut String) {
    let mut open = String::new();
    let mut close = String::new();
    for mark in &node.marks {
        match mark.kind.as_str() {
            "bold" => {
                open.push_str("<strong>");
                close.insert_str(0, "</strong>");
            }
            "italic" => {
                open.push_str("<em>");
                close.insert_str(0, "</em>");
            }
            "link" => {
                let href = mark
                    .attrs
                    .as_ref()
                    .and_then(|a| a.get("href"))
                    .and_then(|v| v.as_str())
                    .unwrap_or_default();
                open.push_str("<a href=\"");
                let mut escaped = String::new();
                escape_into(&mut escaped, href);
                open.push_str(&escaped);
                open.push_str("\">");
                close.insert_str(0, "</a>");
            }
            "color" => {
                let color = mark
                    .attrs
                    .as_ref()
                    .and_then(|a| a.get("color"))
                    .and_then(|v| v.as_str())
                    .unwrap_or_default();
                open.push_str("<span style=\"color:");
                let mut escaped = String::new();
                escape_into(&mut escaped, color);
                open.push_str(&escaped);
                open.push_str("\">");
                close.insert_str(0, "</span>");
            }
            _ => {}
        }
    }
    out.push_str(&open);
    escape_into(out, node.text.as_deref().unwrap_or_default());
    out.push_str(&close);
}

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{default_delimiters, scan_document};

    #[test]
    fn test_parse_paragraphs_and_headings() {
        let doc = parse_html("<h2>Title</h2><p>body text</p>").unwrap();
        assert_eq!(doc.content.len(), 2);
        assert_eq!(doc.content[0].kind, "heading");
        assert_eq!(doc.content[0].attr_u64("level"), Some(2));
        assert_eq!(doc.content[1].kind, "paragraph");
        assert_eq!(doc.content[1].flat_text(), "body text");
    }

    #[test]
    fn test_parse_marks() {
        let doc = parse_html(r#"<p>a <strong>b</strong> <em>c</em> <a href="/x">d</a></p>"#)
            .unwrap();
        let para = &doc.content[0];
        let bold = para.content.iter().find(|n| n.has_mark("bold")).unwrap();
        assert_eq!(bold.text.as_deref(), Some("b"));
        let link = para.content.iter().find(|n| n.has_mark("link")).unwrap();
        assert_eq!(link.text.as_deref(), Some("d"));
    }

    #[test]
    fn test_parse_color_span() {
        let doc = parse_html(r#"<p><span style="color: #ff0000">red</span></p>"#).unwrap();
        let leaf = &doc.content[0].content[0];
        assert!(leaf.has_mark("color"));
        assert_eq!(
            leaf.marks[0].attrs.as_ref().unwrap()["color"],
            serde_json::json!("#ff0000")
        );
    }

    #[test]
    fn test_parse_lists() {
        let doc = parse_html("<ul><li>one</li><li><p>two</p></li></ul>").unwrap();
        let list = &doc.content[0];
        assert_eq!(list.kind, "bulletList");
        assert_eq!(list.content.len(), 2);
        assert_eq!(list.content[0].kind, "listItem");
        assert_eq!(list.content[0].flat_text(), "one");
        assert_eq!(list.content[1].flat_text(), "two");
    }

    #[test]
    fn test_void_tags_and_nbsp() {
        let doc = parse_html("<p>a<br>b&nbsp;c</p><img src=\"pic.png\">").unwrap();
        let para = &doc.content[0];
        assert!(para.content.iter().any(|n| n.kind == "hardBreak"));
        assert!(para.flat_text().contains('\u{00A0}'));
        assert_eq!(doc.content[1].kind, "image");
        assert_eq!(doc.content[1].attr_str("src"), Some("pic.png"));
    }

    #[test]
    fn test_unparseable_markup_errors() {
        let err = parse_html("<p>unclosed <em>tag</p>").unwrap_err();
        assert!(matches!(err, ModelError::Markup { .. }));
    }

    #[test]
    fn test_math_survives_html_round_trip() {
        // Regions in HTML content are recognized identically after
        // normalization to the structured tree.
        let doc = parse_html("<p>inline $x^2$ and</p><p>$$\\frac{a}{b}$$</p>").unwrap();
        let regions = scan_document(&doc, &default_delimiters());
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].latex, "x^2");
        assert!(regions[1].display);

        let html = to_html(&doc);
        let reparsed = parse_html(&html).unwrap();
        let regions2 = scan_document(&reparsed, &default_delimiters());
        assert_eq!(regions, regions2);
    }

    #[test]
    fn test_to_html_escapes_text() {
        let doc = Node::doc(vec![Node::paragraph(vec![Node::text("a < b & c")])]);
        assert_eq!(to_html(&doc), "<p>a &lt; b &amp; c</p>");
    }

    #[test]
    fn test_top_level_bare_text_becomes_paragraph() {
        let doc = parse_html("just some text").unwrap();
        assert_eq!(doc.content.len(), 1);
        assert_eq!(doc.content[0].kind, "paragraph");
        assert_eq!(doc.content[0].flat_text(), "just some text");
    }
}
