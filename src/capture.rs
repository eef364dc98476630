//! Stack capture for the current thread
//!
//! Resolves the running thread's backtrace with the `backtrace` crate and
//! turns every resolved symbol into a [`Frame`]. Rust has no classes, so the
//! module path (`crate::module::Type`) stands in for the class name and the
//! last path segment is the method.

use crate::frame::Frame;

/// Capture the current thread's stack, most recent call first
///
/// Frames of the capture machinery itself are left out. Symbols that cannot
/// be resolved (stripped binaries) are dropped, so the result may be empty.
pub fn capture_current() -> Vec<Frame> {
    let backtrace = backtrace::Backtrace::new();
    let mut frames: Vec<Frame> = Vec::new();

    for raw in backtrace.frames() {
        // Inlined calls resolve to several symbols, innermost first
        for symbol in raw.symbols() {
            let Some(name) = symbol.name() else {
                continue;
            };
            let path = format!("{:#}", name);
            let file = symbol.filename().map(|file| file.display().to_string());
            if let Some(frame) = frame_from_symbol(&path, file, symbol.lineno()) {
                frames.push(frame);
            }
        }
    }

    let skip = frames
        .iter()
        .take_while(|frame| is_capture_machinery(frame))
        .count();
    let frames = frames.split_off(skip);

    tracing::debug!("Captured {} stack frames", frames.len());
    frames
}

fn is_capture_machinery(frame: &Frame) -> bool {
    let identifier = frame.identifier();
    identifier.starts_with("backtrace::")
        || identifier.starts_with("<backtrace::")
        || identifier.starts_with("zonetrace::capture")
}

/// Build a frame from a demangled symbol path such as `crate::module::function`
///
/// A trailing `::h<16 hex digits>` hash is removed. The path is split at its
/// last `::` outside angle brackets, so trait-impl paths like
/// `<T as core::ops::FnOnce>::call_once` keep their qualified self type.
/// Returns `None` for an empty symbol.
pub fn frame_from_symbol(symbol: &str, file: Option<String>, line: Option<u32>) -> Option<Frame> {
    let symbol = strip_hash(symbol.trim());
    if symbol.is_empty() {
        return None;
    }

    let (class_name, method_name) = match last_path_separator(symbol) {
        Some(index) => (&symbol[..index], &symbol[index + 2..]),
        None => ("", symbol),
    };

    let mut frame = Frame::new(class_name, method_name);
    frame.file_name = file;
    frame.line_number = line;
    Some(frame)
}

fn strip_hash(symbol: &str) -> &str {
    match symbol.rsplit_once("::") {
        Some((head, tail))
            if tail.len() == 17
                && tail.starts_with('h')
                && tail[1..].chars().all(|c| c.is_ascii_hexdigit()) =>
        {
            head
        }
        _ => symbol,
    }
}

/// Byte index of the last `::` at angle-bracket depth zero
fn last_path_separator(symbol: &str) -> Option<usize> {
    let bytes = symbol.as_bytes();
    let mut depth = 0usize;
    let mut last = None;
    let mut index = 0;

    while index < bytes.len() {
        match bytes[index] {
            b'<' => depth += 1,
            b'>' => depth = depth.saturating_sub(1),
            b':' if depth == 0 && bytes.get(index + 1) == Some(&b':') => {
                last = Some(index);
                index += 1;
            }
            _ => {}
        }
        index += 1;
    }
    last
}
