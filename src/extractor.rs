//! Image reference extraction.
//!
//! Scans raw text with two pattern rules: `<img>` tags yield their `src`
//! attribute, and CSS `background`/`background-image` declarations yield the
//! inner content of every `url(...)` token. Markup files run both rules since
//! they may carry inline `<style>` blocks.

use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::sync::LazyLock;

static IMG_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<img[^>]*>").expect("img tag pattern"));

// `src` must stand on its own so `data-src` and friends are not picked up.
static SRC_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\ssrc\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("src attribute pattern")
});

static BACKGROUND_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:background|background-image):[^;}]*url[^;}]*[;}]")
        .expect("background declaration pattern")
});

static URL_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)url\(([^)]*)\)").expect("url token pattern"));

/// Source formats with an extraction rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// HTML; runs both the tag rule and the stylesheet rule.
    Markup,
    Stylesheet,
}

/// Extension lookup. Matched exactly, without case-folding.
const FORMAT_TABLE: &[(&str, Format)] = &[
    ("html", Format::Markup),
    ("htm", Format::Markup),
    ("css", Format::Stylesheet),
];

impl Format {
    pub fn from_extension(ext: &str) -> Option<Self> {
        FORMAT_TABLE
            .iter()
            .find(|(candidate, _)| *candidate == ext)
            .map(|(_, format)| *format)
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// All extensions that map to a format, in table order.
    pub fn recognized_extensions() -> Vec<&'static str> {
        FORMAT_TABLE.iter().map(|(ext, _)| *ext).collect()
    }

    /// Runs this format's extraction rules over `content`.
    pub fn extract(self, content: &str) -> Vec<String> {
        match self {
            Format::Markup => {
                let mut refs = extract_img_sources(content);
                refs.extend(extract_background_urls(content));
                refs
            }
            Format::Stylesheet => extract_background_urls(content),
        }
    }
}

/// Returns the `src` value of every `<img>` tag, in document order.
///
/// Tags without a `src` attribute, or with an empty one, contribute nothing.
pub fn extract_img_sources(content: &str) -> Vec<String> {
    IMG_TAG
        .find_iter(content)
        .filter_map(|tag| {
            let caps = SRC_ATTR.captures(tag.as_str())?;
            caps.get(1).or_else(|| caps.get(2))
        })
        .map(|m| m.as_str().to_string())
        .filter(|src| !src.is_empty())
        .collect()
}

/// Returns the inner content of every `url(...)` inside background declarations.
///
/// Surrounding quotes and whitespace are stripped from each URL.
pub fn extract_background_urls(content: &str) -> Vec<String> {
    BACKGROUND_DECL
        .find_iter(content)
        .flat_map(|decl| URL_TOKEN.captures_iter(decl.as_str()))
        .filter_map(|caps| caps.get(1))
        .map(|m| {
            m.as_str()
                .trim()
                .trim_matches(|c| c == '"' || c == '\'')
                .to_string()
        })
        .filter(|url| !url.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_double_and_single_quoted_src() {
        let html = r#"<p><img src="img/a.png"> text <IMG alt='x' SRC='b.gif' /></p>"#;
        assert_eq!(extract_img_sources(html), vec!["img/a.png", "b.gif"]);
    }

    #[test]
    fn img_without_src_yields_nothing() {
        let html = r#"<img alt="logo"><img data-src="lazy.png"><img src="">"#;
        assert!(extract_img_sources(html).is_empty());
    }

    #[test]
    fn img_tag_may_span_lines() {
        let html = "<img\n  class=\"hero\"\n  src=\"media/hero.jpg\"\n>";
        assert_eq!(extract_img_sources(html), vec!["media/hero.jpg"]);
    }

    #[test]
    fn keeps_duplicates_in_document_order() {
        let html = r#"<img src="a.png"><img src="b.png"><img src="a.png">"#;
        assert_eq!(extract_img_sources(html), vec!["a.png", "b.png", "a.png"]);
    }

    #[test]
    fn extracts_background_url_with_quotes_stripped() {
        let css = ".hero{background: url('../media/hero.jpg') no-repeat;}";
        assert_eq!(extract_background_urls(css), vec!["../media/hero.jpg"]);
    }

    #[test]
    fn extracts_every_url_in_one_declaration() {
        let css = r#"div { background-image: url("a.png"), URL( b.png ); }"#;
        assert_eq!(extract_background_urls(css), vec!["a.png", "b.png"]);
    }

    #[test]
    fn declaration_terminated_by_closing_brace() {
        let css = ".x{color:red;BACKGROUND:url(c.bmp)}";
        assert_eq!(extract_background_urls(css), vec!["c.bmp"]);
    }

    #[test]
    fn background_without_url_yields_nothing() {
        let css = ".a { background: #fff; } .b { background-image: none; }";
        assert!(extract_background_urls(css).is_empty());
    }

    #[test]
    fn ignores_url_outside_background_declarations() {
        let css = "@font-face { src: url(font.woff); } .a { border-image: url(b.png); }";
        assert!(extract_background_urls(css).is_empty());
    }

    #[test]
    fn markup_runs_both_rules() {
        let html = r#"<style>.a{background:url(bg.png);}</style><img src="fg.png">"#;
        assert_eq!(Format::Markup.extract(html), vec!["fg.png", "bg.png"]);
    }

    #[test]
    fn stylesheet_ignores_img_tags() {
        let css = r#"/* <img src="a.png"> */ .a{background:url(b.png);}"#;
        assert_eq!(Format::Stylesheet.extract(css), vec!["b.png"]);
    }

    #[test]
    fn format_lookup_by_extension() {
        assert_eq!(Format::from_path(Path::new("site/index.html")), Some(Format::Markup));
        assert_eq!(Format::from_path(Path::new("site/old.htm")), Some(Format::Markup));
        assert_eq!(Format::from_path(Path::new("a/b/site.css")), Some(Format::Stylesheet));
        assert_eq!(Format::from_path(Path::new("script.js")), None);
        assert_eq!(Format::from_path(Path::new("README")), None);
        assert_eq!(Format::from_path(Path::new("INDEX.HTML")), None);
    }
}
