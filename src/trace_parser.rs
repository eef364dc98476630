//! Parsing of textual stack traces into [`Frame`]s
//!
//! Supported formats:
//! - JVM: `at com.example.Worker.doWork(Worker.java:20)`, with optional
//!   module prefix (`java.base/`) and `(Native Method)` / `(Unknown Source)`
//! - Rust backtraces: `  3: crate::module::function` optionally followed by
//!   `at ./src/module.rs:12:5`
//!
//! Frames are returned in the order they appear, which for both formats is
//! most recent call first. Only the first trace of a JVM cause chain is
//! read: parsing stops at `Caused by:` or `Suppressed:`.

use crate::capture::frame_from_symbol;
use crate::frame::Frame;
use regex::Regex;
use std::sync::LazyLock;

/// Matches JVM frame lines: `at [module/]pkg.Type.method(location)`
/// Captures: 1=class, 2=method, 3=location
pub static JVM_FRAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*at\s+(?:[^\s/(]+/+)?([^\s(]+)\.([^\s.(]+)\((.*)\)\s*$")
        .expect("Invalid JVM_FRAME_REGEX")
});

/// Matches Rust backtrace frame lines: `  12: path::to::function`
/// Captures: 1=frame index, 2=symbol
pub static RUST_FRAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+):\s+(\S.*?)\s*$").expect("Invalid RUST_FRAME_REGEX")
});

/// Matches Rust backtrace location lines: `at ./src/main.rs:12:5`
/// Captures: 1=file, 2=line
pub static RUST_LOCATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*at\s+(.+?):(\d+)(?::\d+)?\s*$").expect("Invalid RUST_LOCATION_REGEX")
});

/// Matches the start of a secondary trace in a JVM cause chain
pub static CAUSE_CHAIN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(Caused by|Suppressed):").expect("Invalid CAUSE_CHAIN_REGEX")
});

/// Stack trace format variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraceFormat {
    /// `at pkg.Type.method(File.java:12)`
    Jvm,
    /// `N: path::to::function` + `at file:line:col`
    Rust,
    /// No frame line recognised
    #[default]
    Unknown,
}

/// Detect the format from the first recognised frame line
pub fn detect_format(text: &str) -> TraceFormat {
    for line in text.lines() {
        if JVM_FRAME_REGEX.is_match(line) {
            return TraceFormat::Jvm;
        }
        if RUST_FRAME_REGEX.is_match(line) {
            return TraceFormat::Rust;
        }
    }
    TraceFormat::Unknown
}

/// Parse a stack trace; unrecognised lines are ignored
pub fn parse_stack_trace(text: &str) -> Vec<Frame> {
    let frames = match detect_format(text) {
        TraceFormat::Jvm => parse_jvm(text),
        TraceFormat::Rust => parse_rust(text),
        TraceFormat::Unknown => Vec::new(),
    };
    tracing::debug!("Parsed {} stack frames", frames.len());
    frames
}

fn parse_jvm(text: &str) -> Vec<Frame> {
    let mut frames = Vec::new();
    for line in text.lines() {
        if CAUSE_CHAIN_REGEX.is_match(line) {
            break;
        }
        if let Some(frame) = parse_jvm_line(line) {
            frames.push(frame);
        }
    }
    frames
}

/// Parse one JVM frame line
pub fn parse_jvm_line(line: &str) -> Option<Frame> {
    let caps = JVM_FRAME_REGEX.captures(line)?;
    let mut frame = Frame::new(&caps[1], &caps[2]);

    let location = caps[3].trim();
    match location.rsplit_once(':') {
        Some((file, line)) if line.parse::<u32>().is_ok() => {
            frame.file_name = Some(file.to_string());
            frame.line_number = line.parse().ok();
        }
        _ if location == "Native Method" || location == "Unknown Source" || location.is_empty() => {}
        _ => frame.file_name = Some(location.to_string()),
    }
    Some(frame)
}

fn parse_rust(text: &str) -> Vec<Frame> {
    let mut frames: Vec<Frame> = Vec::new();
    // Location lines belong to the frame line right above them
    let mut awaiting_location = false;

    for line in text.lines() {
        if let Some(caps) = RUST_FRAME_REGEX.captures(line) {
            awaiting_location = match frame_from_symbol(&caps[2], None, None) {
                Some(frame) => {
                    frames.push(frame);
                    true
                }
                None => false,
            };
        } else if let Some(caps) = RUST_LOCATION_REGEX.captures(line) {
            if awaiting_location {
                if let Some(frame) = frames.last_mut() {
                    frame.file_name = Some(caps[1].to_string());
                    frame.line_number = caps[2].parse().ok();
                }
                awaiting_location = false;
            }
        }
    }
    frames
}
