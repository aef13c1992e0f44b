//! Renders fetched tab documents into standalone HTML pages.

use std::sync::OnceLock;

use regex::Regex;

use crate::upstream::TabDocument;

fn chord_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[ch\](.*?)\[/ch\]").expect("static regex"))
}

/// Escapes text for use in HTML element content and attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Converts the site's markup to HTML: `[ch]X[/ch]` becomes a chord span
/// and `[tab]` wrappers are dropped. Everything else is escaped.
fn content_to_html(content: &str) -> String {
    let stripped = content.replace("[tab]", "").replace("[/tab]", "");
    let escaped = escape_html(&stripped);
    // Markers contain no escapable characters, so they survive escaping.
    chord_marker()
        .replace_all(&escaped, r#"<span class="chord">$1</span>"#)
        .into_owned()
}

/// Builds the page written to `chords.html` / `tab.html`.
pub fn tab_to_html(doc: &TabDocument) -> String {
    let title = escape_html(&doc.song_name);
    let artist = escape_html(&doc.artist_name);

    let mut meta = Vec::new();
    if !doc.kind.is_empty() {
        meta.push(format!("<li>Type: {}</li>", escape_html(&doc.kind)));
    }
    if let Some(key) = doc.tonality.as_deref().filter(|k| !k.is_empty()) {
        meta.push(format!("<li>Key: {}</li>", escape_html(key)));
    }
    if doc.capo > 0 {
        meta.push(format!("<li>Capo: {}</li>", doc.capo));
    }
    if let Some(difficulty) = doc.difficulty.as_deref().filter(|d| !d.is_empty()) {
        meta.push(format!("<li>Difficulty: {}</li>", escape_html(difficulty)));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} - {artist}</title>
<style>
body {{ font-family: sans-serif; margin: 2rem; }}
pre {{ font-family: monospace; line-height: 1.4; }}
.chord {{ color: #c0392b; font-weight: bold; }}
</style>
</head>
<body data-tab-id="{id}">
<h1>{title}</h1>
<h2>{artist}</h2>
<ul class="meta">{meta}</ul>
<pre class="content">{content}</pre>
</body>
</html>
"#,
        title = title,
        artist = artist,
        id = doc.id,
        meta = meta.join(""),
        content = content_to_html(&doc.content),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(content: &str) -> TabDocument {
        TabDocument {
            id: 99,
            song_name: "Bohemian Rhapsody".into(),
            artist_name: "Queen".into(),
            kind: "Chords".into(),
            content: content.into(),
            tonality: Some("Bb".into()),
            capo: 0,
            difficulty: None,
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn test_chords_become_spans() {
        let html = content_to_html("[tab][ch]Bb[/ch]  [ch]Gm[/ch]\nIs this the real life?[/tab]");
        assert!(html.contains(r#"<span class="chord">Bb</span>"#));
        assert!(html.contains(r#"<span class="chord">Gm</span>"#));
        assert!(!html.contains("[tab]"));
        assert!(!html.contains("[/ch]"));
    }

    #[test]
    fn test_content_is_escaped() {
        let html = content_to_html("e|--<3>--|");
        assert_eq!(html, "e|--&lt;3&gt;--|");
    }

    #[test]
    fn test_page_includes_metadata() {
        let page = tab_to_html(&doc("[ch]C[/ch]"));
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<title>Bohemian Rhapsody - Queen</title>"));
        assert!(page.contains("<li>Key: Bb</li>"));
        assert!(!page.contains("Capo"));
        assert!(page.contains(r#"data-tab-id="99""#));
    }
}
