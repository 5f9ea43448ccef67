/// Route module for file-based routing
///
/// Everything that reads the file-name grammar lives here:
/// - `pattern`: one segment → [`SegmentKey`]
/// - `verb`: `.get|post` suffixes
/// - `parser`: whole page path → [`RouteDefinition`]

pub mod parser;
pub mod pattern;
pub mod verb;

pub use parser::{compile_route_path, render_pattern, RouteDefinition};
pub use pattern::{
    compile_segment, regex_for_prefix, CaptureClass, CompileMode, PatternPart, SegmentKey,
    SegmentPattern,
};
pub use verb::{normalize_method, split_verb_suffix, ANY_METHOD};
