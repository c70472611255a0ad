use std::collections::HashSet;

use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Tags whose whole subtree is dropped during serialization.
const BLOCKED_TAGS: &[&str] = &[
    "script", "style", "head", "nav", "footer", "header", "iframe", "video", "audio", "embed",
    "object", "svg", "template", "button", "form", "input", "select", "textarea",
];

/// Tags re-emitted as-is (with a filtered attribute set). Anything neither
/// blocked nor listed here is unwrapped: its text survives, its tag does not.
const ALLOWED_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li", "blockquote", "pre", "code", "em",
    "strong", "b", "i", "u", "s", "a", "img", "br", "hr", "figure", "figcaption",
];

const VOID_TAGS: &[&str] = &["img", "br", "hr"];

const UNSAFE_SCHEMES: &[&str] = &[
    "about:",
    "blob:",
    "data:",
    "javascript:",
    "chrome-extension:",
    "webkit:",
    "file:",
    "ftp:",
];

/// Markers that must not survive into the final document.
const UNSAFE_MARKERS: &[&str] = &["about:", "blob:", "data:", "javascript:"];

/// Path fragments of bundler/asset output that never point at content.
const ASSET_PATH_HINTS: &[&str] = &["/_next/", "/static/", "/assets/", "/webpack/", "/node_modules/"];

/// Class/id fragments that mark a likely article body container.
const CONTENT_HINTS: &[&str] = &[
    "content", "article", "post", "story", "entry", "main", "body", "text",
];

/// A container (or collected element set) must carry this much text.
const MIN_CONTAINER_TEXT: usize = 200;

/// Minimum collected paragraph/heading/list elements for the flat fallback.
const MIN_CONTENT_ELEMENTS: usize = 4;

/// Serialized output shorter than this is discarded for plain text.
const MIN_HTML_LEN: usize = 100;

/// Sanitize a fetched document into a small, safe, renderable fragment.
///
/// The document is parsed into a real DOM and re-serialized through an
/// allow-list walk; blocked subtrees vanish, unknown tags are unwrapped,
/// and URL-bearing attributes are validated against scheme and origin
/// rules (`base` supplies the origin for root-relative links). Extraction
/// prefers a single content container, then a flat collection of content
/// elements, and finally degrades to a whitespace-collapsed plain-text
/// paragraph capped at `max_text_length` characters.
pub fn sanitize_document(html: &str, base: Option<&Url>, max_text_length: usize) -> String {
    let doc = Html::parse_document(html);

    if let Some(container) = find_content_container(&doc) {
        let mut out = String::new();
        serialize_children(container, base, &mut out);
        if is_acceptable(&out) {
            return out;
        }
    } else if let Some(collected) = collect_content_elements(&doc, base) {
        if is_acceptable(&collected) {
            return collected;
        }
    }

    plain_text_fallback(&doc, max_text_length)
}

/// Strip all markup from a fragment, collapsing whitespace.
pub fn strip_tags(html: &str) -> String {
    let doc = Html::parse_document(html);
    collapse_whitespace(&collect_text(&doc))
}

fn find_content_container(doc: &Html) -> Option<ElementRef<'_>> {
    for selector in ["main", "article"] {
        if let Ok(sel) = Selector::parse(selector) {
            if let Some(el) = doc.select(&sel).find(|el| text_len(*el) > MIN_CONTAINER_TEXT) {
                return Some(el);
            }
        }
    }

    let div_sel = Selector::parse("div").ok()?;
    doc.select(&div_sel).find(|el| {
        let mut hint = el.value().id().unwrap_or_default().to_lowercase();
        if let Some(class) = el.value().attr("class") {
            hint.push(' ');
            hint.push_str(&class.to_lowercase());
        }
        CONTENT_HINTS.iter().any(|h| hint.contains(h)) && text_len(*el) > MIN_CONTAINER_TEXT
    })
}

fn collect_content_elements(doc: &Html, base: Option<&Url>) -> Option<String> {
    let sel = Selector::parse("p, h1, h2, h3, h4, h5, h6, ul, ol, blockquote, pre").ok()?;
    let matches: Vec<ElementRef<'_>> = doc.select(&sel).collect();
    let ids: HashSet<_> = matches.iter().map(|el| el.id()).collect();

    // Keep only top-most matches so nested hits are not emitted twice.
    let top_level: Vec<ElementRef<'_>> = matches
        .into_iter()
        .filter(|el| !el.ancestors().any(|a| ids.contains(&a.id())))
        .collect();
    if top_level.len() < MIN_CONTENT_ELEMENTS {
        return None;
    }

    let mut out = String::new();
    for el in top_level {
        serialize_node(*el, base, &mut out);
    }
    Some(out)
}

fn is_acceptable(out: &str) -> bool {
    let lower = out.to_lowercase();
    if UNSAFE_MARKERS.iter().any(|m| lower.contains(m)) {
        return false;
    }
    out.chars().count() >= MIN_HTML_LEN
}

fn plain_text_fallback(doc: &Html, max_text_length: usize) -> String {
    let mut text = collapse_whitespace(&collect_text(doc));
    if text.chars().count() > max_text_length {
        text = text.chars().take(max_text_length).collect();
    }
    format!("<p>{}</p>", html_escape::encode_text(&text))
}

fn collect_text(doc: &Html) -> String {
    let mut out = String::new();
    for child in doc.tree.root().children() {
        collect_text_node(child, &mut out);
    }
    out
}

fn collect_text_node(node: ego_tree::NodeRef<'_, Node>, out: &mut String) {
    match node.value() {
        Node::Text(t) => {
            out.push_str(&t.text);
            out.push(' ');
        }
        Node::Element(el) => {
            if BLOCKED_TAGS.contains(&el.name()) {
                return;
            }
            for child in node.children() {
                collect_text_node(child, out);
            }
        }
        _ => {}
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn text_len(el: ElementRef<'_>) -> usize {
    el.text().map(|t| t.trim().len()).sum()
}

fn serialize_children(el: ElementRef<'_>, base: Option<&Url>, out: &mut String) {
    for child in el.children() {
        serialize_node(child, base, out);
    }
}

fn serialize_node(node: ego_tree::NodeRef<'_, Node>, base: Option<&Url>, out: &mut String) {
    match node.value() {
        Node::Text(t) => {
            out.push_str(&html_escape::encode_text(&*t.text));
        }
        Node::Element(el) => {
            let name = el.name();
            if BLOCKED_TAGS.contains(&name) {
                return;
            }
            if !ALLOWED_TAGS.contains(&name) {
                // Unwrap: keep the children, drop the tag.
                for child in node.children() {
                    serialize_node(child, base, out);
                }
                return;
            }

            match name {
                "a" => {
                    // Links without a usable http(s) target collapse to text.
                    match el.attr("href").and_then(|v| sanitize_link(v, base)) {
                        Some(href) => {
                            out.push_str("<a href=\"");
                            out.push_str(&html_escape::encode_double_quoted_attribute(&href));
                            out.push_str("\">");
                            for child in node.children() {
                                serialize_node(child, base, out);
                            }
                            out.push_str("</a>");
                        }
                        None => {
                            for child in node.children() {
                                serialize_node(child, base, out);
                            }
                        }
                    }
                }
                "img" => {
                    // Images must resolve to an https source or they drop.
                    let Some(src) = el.attr("src").and_then(|v| sanitize_image(v, base)) else {
                        return;
                    };
                    out.push_str("<img src=\"");
                    out.push_str(&html_escape::encode_double_quoted_attribute(&src));
                    out.push('"');
                    if let Some(alt) = el.attr("alt") {
                        out.push_str(" alt=\"");
                        out.push_str(&html_escape::encode_double_quoted_attribute(alt));
                        out.push('"');
                    }
                    out.push('>');
                }
                _ => {
                    out.push('<');
                    out.push_str(name);
                    out.push('>');
                    if VOID_TAGS.contains(&name) {
                        return;
                    }
                    for child in node.children() {
                        serialize_node(child, base, out);
                    }
                    out.push_str("</");
                    out.push_str(name);
                    out.push('>');
                }
            }
        }
        _ => {}
    }
}

/// Validate and normalize a link target. Unsafe schemes, empty or
/// hash-only values and bundler asset paths are stripped; protocol- and
/// root-relative URLs are resolved where possible.
fn sanitize_link(value: &str, base: Option<&Url>) -> Option<String> {
    let v = value.trim();
    if v.is_empty() || v.starts_with('#') {
        return None;
    }
    let lower = v.to_lowercase();
    if UNSAFE_SCHEMES.iter().any(|s| lower.starts_with(s)) {
        return None;
    }
    if ASSET_PATH_HINTS.iter().any(|h| lower.contains(h)) {
        return None;
    }
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Some(v.to_string());
    }
    if v.starts_with("//") {
        return Some(format!("https:{v}"));
    }
    if v.starts_with('/') {
        return base?.join(v).ok().map(|u| u.to_string());
    }
    None
}

fn sanitize_image(value: &str, base: Option<&Url>) -> Option<String> {
    sanitize_link(value, base).filter(|v| v.starts_with("https://"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_link_rejects_unsafe_schemes() {
        for bad in [
            "about:blank",
            "javascript:alert(1)",
            "data:text/html,x",
            "file:///etc/passwd",
            "ftp://host/file",
            "",
            "#section",
        ] {
            assert_eq!(sanitize_link(bad, None), None, "{bad:?} should be rejected");
        }
    }

    #[test]
    fn sanitize_link_resolves_root_relative_against_base() {
        let base = Url::parse("https://example.com/posts/1").unwrap();
        assert_eq!(
            sanitize_link("/about", Some(&base)),
            Some("https://example.com/about".to_string())
        );
        assert_eq!(sanitize_link("/about", None), None);
        assert_eq!(sanitize_link("/_next/static/x.js", Some(&base)), None);
    }

    #[test]
    fn sanitize_image_requires_https() {
        assert_eq!(sanitize_image("http://example.com/a.jpg", None), None);
        assert_eq!(
            sanitize_image("https://example.com/a.jpg", None),
            Some("https://example.com/a.jpg".to_string())
        );
        assert_eq!(
            sanitize_image("//cdn.example.com/a.jpg", None),
            Some("https://cdn.example.com/a.jpg".to_string())
        );
    }

    #[test]
    fn strip_tags_drops_markup_and_script_bodies() {
        let text = strip_tags("<div><script>alert(1)</script><p>one</p> <p>two</p></div>");
        assert_eq!(text, "one two");
    }
}
