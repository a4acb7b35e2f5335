//! Cross-file preview assembly
//!
//! Builds a single self-contained HTML document from the workspace by
//! inlining the main document's stylesheet and script references. Matching
//! is by exact filename against the sibling set; unmatched or absolute
//! references are left untouched. Resolution is single-pass and does not
//! recurse into inlined content.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::core::workspace::CodeArtifact;

fn link_regex() -> &'static Regex {
    static LINK: OnceLock<Regex> = OnceLock::new();
    LINK.get_or_init(|| {
        Regex::new(r#"<link\s+[^>]*?href=["']([^"']*)["'][^>]*?>"#).expect("link pattern compiles")
    })
}

fn script_regex() -> &'static Regex {
    static SCRIPT: OnceLock<Regex> = OnceLock::new();
    SCRIPT.get_or_init(|| {
        Regex::new(r#"<script\s+[^>]*?src=["']([^"']*)["'][^>]*?>\s*</script>"#)
            .expect("script pattern compiles")
    })
}

fn is_absolute(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

/// True when the workspace holds anything previewable.
pub fn is_previewable(files: &[CodeArtifact]) -> bool {
    files
        .iter()
        .any(|f| f.filename.to_lowercase().ends_with(".html"))
}

/// Pick the main document: `index.html` if present (case-insensitive),
/// otherwise the first `.html` file in collection order.
pub fn find_main_document(files: &[CodeArtifact]) -> Option<&CodeArtifact> {
    let mut html_files = files
        .iter()
        .filter(|f| f.filename.to_lowercase().ends_with(".html"));
    let first = html_files.next()?;
    Some(
        std::iter::once(first)
            .chain(html_files)
            .find(|f| f.filename.to_lowercase() == "index.html")
            .unwrap_or(first),
    )
}

/// Assemble the preview document, or `None` when no HTML file exists.
pub fn build_preview(files: &[CodeArtifact]) -> Option<String> {
    let main = find_main_document(files)?;
    let html = inline_stylesheets(&main.content, files);
    Some(inline_scripts(&html, files))
}

fn inline_stylesheets(html: &str, files: &[CodeArtifact]) -> String {
    link_regex()
        .replace_all(html, |caps: &Captures| {
            let target = caps[1].trim();
            if is_absolute(target) {
                return caps[0].to_string();
            }
            match files.iter().find(|f| f.filename == target) {
                Some(css) => format!("<style>\n{}\n</style>", css.content),
                // Keep the original tag when the sibling is missing
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn inline_scripts(html: &str, files: &[CodeArtifact]) -> String {
    script_regex()
        .replace_all(html, |caps: &Captures| {
            let target = caps[1].trim();
            if is_absolute(target) {
                return caps[0].to_string();
            }
            match files.iter().find(|f| f.filename == target) {
                Some(js) => format!("<script>\n{}\n</script>", js.content),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}
