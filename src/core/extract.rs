//! Fenced code-block extraction
//!
//! Model replies mix prose with fenced code blocks. This module splits a raw
//! reply into the conversational remainder and an ordered list of blocks,
//! then resolves each block's filename and language from its info string.
//!
//! A fence is three backticks, an optional info string on the same line, a
//! newline, the body, and a closing three-backtick fence. An opening fence
//! with no closing fence does not match and stays in the prose verbatim.

use std::sync::OnceLock;

use regex::Regex;

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)```([^\n]*)\n(.*?)```").expect("fence pattern compiles")
    })
}

/// One fenced region as it appeared in the reply: the raw info string (the
/// rest of the opening fence line) and the trimmed body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedBlock {
    pub info: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub conversational_text: String,
    pub blocks: Vec<ExtractedBlock>,
}

/// Split a raw reply into prose and fenced blocks, in document order.
///
/// Matched spans (fences, info string, body) are removed exactly; the
/// remaining prose is trimmed once at the end.
pub fn extract_blocks(text: &str) -> Extraction {
    let mut blocks = Vec::new();
    let mut prose = String::with_capacity(text.len());
    let mut cursor = 0;

    for caps in fence_regex().captures_iter(text) {
        let whole = caps.get(0).expect("group 0 is the whole match");
        prose.push_str(&text[cursor..whole.start()]);
        cursor = whole.end();
        blocks.push(ExtractedBlock {
            info: caps[1].to_string(),
            content: caps[2].trim().to_string(),
        });
    }
    prose.push_str(&text[cursor..]);

    Extraction {
        conversational_text: prose.trim().to_string(),
        blocks,
    }
}

/// Structured reading of an info string, parsed before any fallback rules
/// apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfoString {
    /// `lang filename` — both declared outright. Extra tokens are ignored.
    Explicit { language: String, filename: String },
    /// A single token containing a dot: a bare filename.
    FromExtension { filename: String },
    /// A single token without a dot: a bare language tag.
    LanguageOnly { language: String },
    /// Empty or whitespace-only.
    Unknown,
}

impl InfoString {
    pub fn parse(info: &str) -> Self {
        let mut tokens = info.split_whitespace();
        match (tokens.next(), tokens.next()) {
            (Some(language), Some(filename)) => InfoString::Explicit {
                language: language.to_string(),
                filename: filename.to_string(),
            },
            (Some(token), None) if token.contains('.') => InfoString::FromExtension {
                filename: token.to_string(),
            },
            (Some(token), None) => InfoString::LanguageOnly {
                language: token.to_string(),
            },
            (None, _) => InfoString::Unknown,
        }
    }
}

fn language_for_extension(extension: &str) -> Option<&'static str> {
    let language = match extension {
        "js" => "javascript",
        "ts" => "typescript",
        "py" => "python",
        "rb" => "ruby",
        "html" => "xml",
        "css" => "css",
        "json" => "json",
        "md" => "markdown",
        "sh" => "bash",
        "java" => "java",
        "go" => "go",
        "cpp" => "cpp",
        "cs" => "csharp",
        "php" => "php",
        "rs" => "rust",
        _ => return None,
    };
    Some(language)
}

fn extension_for_language(language: &str) -> Option<&'static str> {
    let extension = match language {
        "javascript" => "js",
        "typescript" => "ts",
        "python" => "py",
        "html" | "xml" => "html",
        "css" => "css",
        "json" => "json",
        "markdown" => "md",
        "bash" | "shell" => "sh",
        "java" => "java",
        "go" => "go",
        "cpp" => "cpp",
        "csharp" => "cs",
        "php" => "php",
        "rust" => "rs",
        "ruby" => "rb",
        _ => return None,
    };
    Some(extension)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIdentity {
    pub filename: String,
    pub language: String,
}

/// Resolve a block's filename and language from its info string alone.
///
/// `session_count` is the number of files already in the workspace and
/// `batch_index` the number of blocks already resolved in this extraction,
/// so synthesized `script-{N}` names keep increasing within one batch before
/// anything is persisted. Never inspects body content.
pub fn resolve_identity(info: &str, session_count: usize, batch_index: usize) -> FileIdentity {
    let (language, filename) = match InfoString::parse(info) {
        InfoString::Explicit { language, filename } => (language, Some(filename)),
        InfoString::FromExtension { filename } => {
            let extension = filename.rsplit('.').next().unwrap_or("");
            let language = language_for_extension(extension)
                .map(str::to_string)
                .unwrap_or_else(|| extension.to_string());
            (language, Some(filename))
        }
        InfoString::LanguageOnly { language } => (language, None),
        InfoString::Unknown => ("plaintext".to_string(), None),
    };

    let filename = filename.unwrap_or_else(|| {
        let extension = extension_for_language(&language.to_lowercase()).unwrap_or("txt");
        format!("script-{}.{}", session_count + batch_index + 1, extension)
    });

    FileIdentity { filename, language }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_blocks_in_document_order() {
        let text = "Intro.\n```python a.py\nprint(1)\n```\nMiddle.\n```css b.css\nbody {}\n```\nOutro.";
        let extraction = extract_blocks(text);
        assert_eq!(extraction.blocks.len(), 2);
        assert_eq!(extraction.blocks[0].info, "python a.py");
        assert_eq!(extraction.blocks[0].content, "print(1)");
        assert_eq!(extraction.blocks[1].info, "css b.css");
        assert_eq!(extraction.blocks[1].content, "body {}");
        assert_eq!(extraction.conversational_text, "Intro.\n\nMiddle.\n\nOutro.");
    }

    #[test]
    fn plain_text_yields_no_blocks() {
        let extraction = extract_blocks("  just words  ");
        assert!(extraction.blocks.is_empty());
        assert_eq!(extraction.conversational_text, "just words");
    }

    #[test]
    fn unterminated_fence_stays_in_the_prose() {
        let text = "Before\n```python\nprint(1)\n";
        let extraction = extract_blocks(text);
        assert!(extraction.blocks.is_empty());
        assert_eq!(extraction.conversational_text, "Before\n```python\nprint(1)");
    }

    #[test]
    fn unterminated_trailing_fence_does_not_swallow_earlier_blocks() {
        let text = "```js\n1;\n```\ntail\n```css\nbroken";
        let extraction = extract_blocks(text);
        assert_eq!(extraction.blocks.len(), 1);
        assert_eq!(extraction.blocks[0].content, "1;");
        assert_eq!(extraction.conversational_text, "tail\n```css\nbroken");
    }

    #[test]
    fn block_bodies_are_trimmed() {
        let extraction = extract_blocks("```\n\n  x = 1\n\n```");
        assert_eq!(extraction.blocks[0].content, "x = 1");
        assert!(extraction.conversational_text.is_empty());
    }

    #[test]
    fn blocks_do_not_overlap() {
        // Four fence lines: the middle pair closes the first block and opens
        // the second, so the text between blocks is prose.
        let text = "```a\none\n```\nbetween\n```b\ntwo\n```";
        let extraction = extract_blocks(text);
        assert_eq!(extraction.blocks.len(), 2);
        assert_eq!(extraction.conversational_text, "between");
    }

    #[test]
    fn info_string_parses_into_tagged_variants() {
        assert_eq!(
            InfoString::parse("python main.py"),
            InfoString::Explicit {
                language: "python".to_string(),
                filename: "main.py".to_string()
            }
        );
        assert_eq!(
            InfoString::parse("main.py"),
            InfoString::FromExtension {
                filename: "main.py".to_string()
            }
        );
        assert_eq!(
            InfoString::parse("python"),
            InfoString::LanguageOnly {
                language: "python".to_string()
            }
        );
        assert_eq!(InfoString::parse("   "), InfoString::Unknown);
        assert_eq!(InfoString::parse(""), InfoString::Unknown);
    }

    #[test]
    fn explicit_info_wins_verbatim() {
        let identity = resolve_identity("python main.py", 0, 0);
        assert_eq!(identity.language, "python");
        assert_eq!(identity.filename, "main.py");
    }

    #[test]
    fn bare_filename_derives_language_from_extension() {
        let identity = resolve_identity("main.py", 0, 0);
        assert_eq!(identity.language, "python");
        assert_eq!(identity.filename, "main.py");

        // html maps to the xml highlighting tag
        let identity = resolve_identity("index.html", 0, 0);
        assert_eq!(identity.language, "xml");
    }

    #[test]
    fn unknown_extension_falls_back_to_the_raw_extension() {
        let identity = resolve_identity("conf.zig", 0, 0);
        assert_eq!(identity.language, "zig");
        assert_eq!(identity.filename, "conf.zig");
    }

    #[test]
    fn bare_language_synthesizes_a_numbered_filename() {
        let identity = resolve_identity("python", 0, 0);
        assert_eq!(identity.language, "python");
        assert_eq!(identity.filename, "script-1.py");

        let identity = resolve_identity("python", 2, 1);
        assert_eq!(identity.filename, "script-4.py");
    }

    #[test]
    fn empty_info_defaults_to_plaintext() {
        let identity = resolve_identity("", 0, 0);
        assert_eq!(identity.language, "plaintext");
        assert_eq!(identity.filename, "script-1.txt");
    }

    #[test]
    fn unknown_language_synthesizes_txt() {
        let identity = resolve_identity("brainfuck", 3, 0);
        assert_eq!(identity.language, "brainfuck");
        assert_eq!(identity.filename, "script-4.txt");
    }

    #[test]
    fn shell_and_xml_aliases_map_to_conventional_extensions() {
        assert_eq!(resolve_identity("shell", 0, 0).filename, "script-1.sh");
        assert_eq!(resolve_identity("xml", 0, 0).filename, "script-1.html");
    }

    #[test]
    fn numbering_is_monotonic_within_a_batch() {
        let session_count = 1;
        let first = resolve_identity("python", session_count, 0);
        let second = resolve_identity("", session_count, 1);
        assert_eq!(first.filename, "script-2.py");
        assert_eq!(second.filename, "script-3.txt");
    }
}
