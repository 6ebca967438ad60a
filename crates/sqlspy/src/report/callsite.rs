//! Call-site attribution for debug level messages.
//!
//! The stack is captured with [`std::backtrace::Backtrace`] and parsed into
//! frames. Frames of this crate are "internal"; the interesting frame is
//! the application code that called into the proxy.

use std::backtrace::Backtrace;
use std::fmt;
use std::panic::Location;

/// Symbol prefixes of this crate's own frames.
const INTERNAL_PREFIXES: &[&str] = &["sqlspy::", "<sqlspy::"];

/// Frames of the capture machinery itself.
const RUNTIME_PREFIXES: &[&str] = &["std::backtrace", "<std::backtrace", "__rust"];

/// One resolved stack frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub symbol: String,
    pub location: Option<String>,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{}({location})", self.symbol),
            None => f.write_str(&self.symbol),
        }
    }
}

/// How call sites are described.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallSiteResolver {
    application_prefix: Option<String>,
    full_stack: bool,
}

impl CallSiteResolver {
    #[must_use]
    pub fn new(application_prefix: Option<String>, full_stack: bool) -> Self {
        Self {
            application_prefix: application_prefix.filter(|p| !p.trim().is_empty()),
            full_stack,
        }
    }

    /// Describe the application code that made the current call.
    ///
    /// `site` is the `#[track_caller]` location of the spy call, used when
    /// the captured stack has nothing better.
    pub fn describe(&self, site: &'static Location<'static>) -> String {
        let frames = capture();
        self.describe_frames(&frames, site)
    }

    pub(crate) fn describe_frames(&self, frames: &[Frame], site: &Location<'_>) -> String {
        if self.full_stack {
            let stack = full_stack(frames);
            if !stack.is_empty() {
                return stack;
            }
        } else if let Some(frame) = select_frame(frames, self.application_prefix.as_deref()) {
            return frame.to_string();
        }
        format!("{}:{}:{}", site.file(), site.line(), site.column())
    }
}

fn capture() -> Vec<Frame> {
    parse_backtrace(&Backtrace::force_capture().to_string())
}

fn is_internal(symbol: &str) -> bool {
    INTERNAL_PREFIXES.iter().any(|p| symbol.starts_with(p))
}

fn is_runtime(symbol: &str) -> bool {
    RUNTIME_PREFIXES.iter().any(|p| symbol.starts_with(p))
}

fn matches_prefix(symbol: &str, prefix: &str) -> bool {
    symbol.starts_with(prefix) || symbol.strip_prefix('<').is_some_and(|s| s.starts_with(prefix))
}

/// Pick the frame to report.
///
/// With a prefix, the first frame under that prefix wins, whatever its
/// position. Otherwise, or if nothing matches, the frame just after the
/// outermost internal frame.
pub(crate) fn select_frame<'a>(frames: &'a [Frame], prefix: Option<&str>) -> Option<&'a Frame> {
    if let Some(prefix) = prefix
        && let Some(frame) = frames.iter().find(|f| matches_prefix(&f.symbol, prefix))
    {
        return Some(frame);
    }
    let outermost_internal = frames.iter().rposition(|f| is_internal(&f.symbol))?;
    frames.get(outermost_internal + 1)
}

/// Every frame past the outermost internal frame, one per line.
///
/// Frames between internal ones (closures, `catch_unwind`) belong to the
/// proxy as well and are skipped with them.
pub(crate) fn full_stack(frames: &[Frame]) -> String {
    let start = frames
        .iter()
        .rposition(|f| is_internal(&f.symbol))
        .map_or(0, |i| i + 1);
    frames[start..]
        .iter()
        .filter(|f| !is_runtime(&f.symbol))
        .map(|f| format!("at {f}"))
        .collect::<Vec<_>>()
        .join("\n  ")
}

/// Parse the `Display` output of a [`Backtrace`].
pub(crate) fn parse_backtrace(text: &str) -> Vec<Frame> {
    let mut frames: Vec<Frame> = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(location) = line.strip_prefix("at ") {
            if let Some(last) = frames.last_mut() {
                last.location = Some(location.to_owned());
            }
            continue;
        }
        let symbol = match line.split_once(": ") {
            Some((index, symbol)) if index.bytes().all(|b| b.is_ascii_digit()) => symbol,
            _ => line,
        };
        frames.push(Frame {
            symbol: strip_hash(symbol.trim()).to_owned(),
            location: None,
        });
    }
    frames
}

/// Drop a trailing `::h0123456789abcdef` symbol hash.
fn strip_hash(symbol: &str) -> &str {
    match symbol.rsplit_once("::h") {
        Some((head, hash)) if hash.len() == 16 && hash.bytes().all(|b| b.is_ascii_hexdigit()) => {
            head
        }
        _ => symbol,
    }
}
