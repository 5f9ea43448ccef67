/// Segment pattern compiler
///
/// Turns one filesystem path segment into a typed [`SegmentKey`]. This is the
/// only place that understands the bracket grammar; the trie, matcher and
/// resolver work on the typed key.
///
/// | segment                | key                                      |
/// |------------------------|------------------------------------------|
/// | `users`                | `Literal("users")`                       |
/// | `[[d:id]]`             | `Dynamic(<id:[0-9]+>)`                   |
/// | `blog-[[s:slug]]-post` | `Dynamic(blog-<slug:[a-zA-Z0-9-]+>-post)`|
/// | `[[...path]]`          | `CatchAll { path, .+ }`                  |
use std::fmt;

use crate::error::PatternError;

/// Synthetic segment appended to every route; terminal entries hang below it.
pub const INDEX_SEGMENT: &str = "index";

/// Regex used for bare `[[name]]` captures and unrecognized prefixes.
///
/// Wider than `w` (it admits hyphens); older page trees rely on that.
pub const DEFAULT_REGEX: &str = "[a-zA-Z0-9-]+";

/// Regex of a `[[...name]]` catch-all.
pub const CATCH_ALL_REGEX: &str = ".+";

/// Character class selected by a capture prefix (`[[d:id]]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureClass {
    /// `d`: digits
    Digits,
    /// `w`: ASCII letters and digits
    Word,
    /// `s`: letters, digits and hyphen (also the default)
    Slug,
    /// `a`: ASCII letters
    Alpha,
    /// `h`: hexadecimal digits
    Hex,
}

impl CaptureClass {
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "d" => Some(CaptureClass::Digits),
            "w" => Some(CaptureClass::Word),
            "s" => Some(CaptureClass::Slug),
            "a" => Some(CaptureClass::Alpha),
            "h" => Some(CaptureClass::Hex),
            _ => None,
        }
    }

    pub fn regex(self) -> &'static str {
        match self {
            CaptureClass::Digits => "[0-9]+",
            CaptureClass::Word => "[a-zA-Z0-9]+",
            CaptureClass::Slug => DEFAULT_REGEX,
            CaptureClass::Alpha => "[a-zA-Z]+",
            CaptureClass::Hex => "[a-fA-F0-9]+",
        }
    }
}

/// Regex for a capture prefix; unknown or empty prefixes get [`DEFAULT_REGEX`].
pub fn regex_for_prefix(prefix: &str) -> &'static str {
    CaptureClass::from_prefix(prefix)
        .map(CaptureClass::regex)
        .unwrap_or(DEFAULT_REGEX)
}

/// How strictly bracket syntax is parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompileMode {
    /// Malformed brackets are kept as literal text.
    #[default]
    Loose,
    /// Malformed brackets are reported as [`PatternError`]s.
    Strict,
}

/// One piece of a dynamic segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternPart {
    Text(String),
    Capture { name: String, regex: String },
}

/// Literal text interleaved with typed captures, matched against one segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentPattern {
    parts: Vec<PatternPart>,
}

impl SegmentPattern {
    pub fn new(parts: Vec<PatternPart>) -> Self {
        Self { parts }
    }

    /// A segment made of a single capture.
    pub fn capture(name: impl Into<String>, regex: impl Into<String>) -> Self {
        Self::new(vec![PatternPart::Capture {
            name: name.into(),
            regex: regex.into(),
        }])
    }

    pub fn parts(&self) -> &[PatternPart] {
        &self.parts
    }

    /// `(name, regex)` of every capture, in segment order.
    pub fn captures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.parts.iter().filter_map(|part| match part {
            PatternPart::Capture { name, regex } => Some((name.as_str(), regex.as_str())),
            PatternPart::Text(_) => None,
        })
    }

    /// True when the segment is one capture with no surrounding text.
    pub fn is_pure(&self) -> bool {
        matches!(self.parts.as_slice(), [PatternPart::Capture { .. }])
    }

    /// Anchored regex for the whole segment. Capture `i` is the group `p{i}`.
    pub fn to_regex(&self) -> String {
        let mut out = String::from("^");
        let mut index = 0;
        for part in &self.parts {
            match part {
                PatternPart::Text(text) => out.push_str(&regex::escape(text)),
                PatternPart::Capture { regex, .. } => {
                    out.push_str(&format!("(?P<p{}>{})", index, regex));
                    index += 1;
                }
            }
        }
        out.push('$');
        out
    }
}

impl fmt::Display for SegmentPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            match part {
                PatternPart::Text(text) => f.write_str(text)?,
                PatternPart::Capture { name, regex } => write!(f, "<{}:{}>", name, regex)?,
            }
        }
        Ok(())
    }
}

/// Key of one trie edge.
///
/// The string form (`Display`) is also the key used by the serialized store
/// and the order in which sibling edges are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKey {
    /// Exact, case-sensitive segment.
    Literal(String),
    /// One segment matched against a pattern of text and captures.
    Dynamic(SegmentPattern),
    /// All remaining segments joined by `/`.
    CatchAll { name: String, regex: String },
}

impl SegmentKey {
    pub fn literal(value: impl Into<String>) -> Self {
        SegmentKey::Literal(value.into())
    }

    pub fn dynamic(name: impl Into<String>, regex: impl Into<String>) -> Self {
        SegmentKey::Dynamic(SegmentPattern::capture(name, regex))
    }

    pub fn catch_all(name: impl Into<String>) -> Self {
        SegmentKey::CatchAll {
            name: name.into(),
            regex: CATCH_ALL_REGEX.to_string(),
        }
    }

    pub fn index() -> Self {
        SegmentKey::Literal(INDEX_SEGMENT.to_string())
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, SegmentKey::Literal(_))
    }

    pub fn is_catch_all(&self) -> bool {
        matches!(self, SegmentKey::CatchAll { .. })
    }

    pub fn is_index(&self) -> bool {
        matches!(self, SegmentKey::Literal(value) if value == INDEX_SEGMENT)
    }

    /// Parameter names bound by this key.
    pub fn param_names(&self) -> Vec<&str> {
        match self {
            SegmentKey::Literal(_) => Vec::new(),
            SegmentKey::Dynamic(pattern) => pattern.captures().map(|(name, _)| name).collect(),
            SegmentKey::CatchAll { name, .. } => vec![name.as_str()],
        }
    }

    /// Parses the string form written by the store.
    ///
    /// A segment that is exactly `<name:.+>` or `<name:.*>` is a catch-all;
    /// any other `<name:regex>` group is a capture. `<` that does not open a
    /// well-formed group is literal text.
    pub fn parse(key: &str) -> Self {
        let mut parts = Vec::new();
        let mut text = String::new();
        let mut rest = key;

        while let Some(open) = rest.find('<') {
            text.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            match scan_capture(after) {
                Some((name, regex, consumed)) => {
                    flush_text(&mut parts, &mut text);
                    parts.push(PatternPart::Capture {
                        name: name.to_string(),
                        regex: regex.to_string(),
                    });
                    rest = &after[consumed..];
                }
                None => {
                    text.push('<');
                    rest = after;
                }
            }
        }
        text.push_str(rest);

        if parts.is_empty() {
            return SegmentKey::Literal(text);
        }
        flush_text(&mut parts, &mut text);

        if let [PatternPart::Capture { name, regex }] = parts.as_slice() {
            if regex == ".+" || regex == ".*" {
                return SegmentKey::CatchAll {
                    name: name.clone(),
                    regex: regex.clone(),
                };
            }
        }
        SegmentKey::Dynamic(SegmentPattern::new(parts))
    }
}

impl fmt::Display for SegmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentKey::Literal(value) => f.write_str(value),
            SegmentKey::Dynamic(pattern) => pattern.fmt(f),
            SegmentKey::CatchAll { name, regex } => write!(f, "<{}:{}>", name, regex),
        }
    }
}

/// Scans `name:regex>` (the text after `<`).
///
/// The name/regex split is the last `:` outside groups and classes, so legacy
/// names such as `x:id` survive, and so do regexes like `(?:a|b)`.
fn scan_capture(input: &str) -> Option<(&str, &str, usize)> {
    let mut depth = 0usize;
    let mut escaped = false;
    let mut split = None;

    for (i, c) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ':' if depth == 0 => split = Some(i),
            '<' if depth == 0 => return None,
            '>' if depth == 0 => {
                let split = split?;
                let (name, regex) = (&input[..split], &input[split + 1..i]);
                if name.is_empty() || regex.is_empty() {
                    return None;
                }
                return Some((name, regex, i + 1));
            }
            _ => {}
        }
    }
    None
}

fn flush_text(parts: &mut Vec<PatternPart>, text: &mut String) {
    if !text.is_empty() {
        parts.push(PatternPart::Text(std::mem::take(text)));
    }
}

/// Builds the capture for the inside of one `[[...]]` group.
fn capture_for(inner: &str) -> PatternPart {
    let (name, regex) = match inner.split_once(':') {
        Some((prefix, name)) if !name.is_empty() => match CaptureClass::from_prefix(prefix) {
            Some(class) => (name, class.regex()),
            None => (inner, DEFAULT_REGEX),
        },
        _ => (inner, DEFAULT_REGEX),
    };
    PatternPart::Capture {
        name: name.to_string(),
        regex: regex.to_string(),
    }
}

/// Compiles one filesystem path segment into a [`SegmentKey`].
///
/// # Examples
///
/// ```
/// use folio_router::route::pattern::{compile_segment, CompileMode, SegmentKey};
///
/// let key = compile_segment("[[d:id]]", CompileMode::Loose).unwrap();
/// assert_eq!(key, SegmentKey::dynamic("id", "[0-9]+"));
/// assert_eq!(key.to_string(), "<id:[0-9]+>");
///
/// let key = compile_segment("[[...path]]", CompileMode::Loose).unwrap();
/// assert!(key.is_catch_all());
/// ```
pub fn compile_segment(segment: &str, mode: CompileMode) -> Result<SegmentKey, PatternError> {
    // `<name:regex>` is the stored form of a capture
    if segment.contains(['<', '>']) {
        return Err(PatternError::ReservedCharacter {
            segment: segment.to_string(),
        });
    }

    if let Some(name) = segment
        .strip_prefix("[[...")
        .and_then(|s| s.strip_suffix("]]"))
    {
        if !name.is_empty() && !name.contains("[[") && !name.contains("]]") {
            return Ok(SegmentKey::catch_all(name));
        }
    }

    let mut parts = Vec::new();
    let mut text = String::new();
    let mut rest = segment;

    while let Some(open) = rest.find("[[") {
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("]]") else {
            if mode == CompileMode::Strict {
                return Err(PatternError::Unterminated {
                    segment: segment.to_string(),
                });
            }
            break;
        };

        text.push_str(&rest[..open]);
        let inner = &after_open[..close];
        rest = &after_open[close + 2..];

        if inner.is_empty() || inner == "..." {
            if mode == CompileMode::Strict {
                return Err(PatternError::EmptyName {
                    segment: segment.to_string(),
                });
            }
            text.push_str("[[");
            text.push_str(inner);
            text.push_str("]]");
            continue;
        }
        if inner.starts_with("...") {
            return Err(PatternError::EmbeddedCatchAll {
                segment: segment.to_string(),
            });
        }

        flush_text(&mut parts, &mut text);
        parts.push(capture_for(inner));
    }
    text.push_str(rest);

    if parts.is_empty() {
        return Ok(SegmentKey::Literal(text));
    }
    flush_text(&mut parts, &mut text);
    Ok(SegmentKey::Dynamic(SegmentPattern::new(parts)))
}
