//! Call-site frames of a captured stack
//!
//! A [`Frame`] is an immutable snapshot of one stack entry: the declaring
//! type (or module path), the member that was running, and where in the
//! source it was. Frames come from [`crate::trace_parser`] or
//! [`crate::capture`]; the analyzer never builds or mutates them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Member-name prefix of compiler-generated accessor methods
///
/// Such frames are plumbing, not real call boundaries.
pub const SYNTHETIC_ACCESSOR_PREFIX: &str = "access$";

/// A single call-site of a captured stack
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Frame {
    /// Fully-qualified declaring type or module path (e.g. "com.example.Worker")
    pub class_name: String,
    /// Member name (e.g. "doWork")
    pub method_name: String,
    /// Source file name, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// 1-based source line, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
}

impl Frame {
    /// Create a frame without source location
    pub fn new(class_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            method_name: method_name.into(),
            file_name: None,
            line_number: None,
        }
    }

    /// Attach a source location
    pub fn with_location(mut self, file_name: impl Into<String>, line_number: u32) -> Self {
        self.file_name = Some(file_name.into());
        self.line_number = Some(line_number);
        self
    }

    /// Attach only a line number
    pub fn with_line(mut self, line_number: u32) -> Self {
        self.line_number = Some(line_number);
        self
    }

    /// Identifier that zones are matched against
    pub fn identifier(&self) -> &str {
        &self.class_name
    }

    /// Last segment of the class name (after `.` or `::`)
    pub fn short_class_name(&self) -> &str {
        self.class_name
            .rsplit(['.', ':'])
            .next()
            .unwrap_or(&self.class_name)
    }

    /// Whether this frame is a compiler-generated accessor
    pub fn is_synthetic_accessor(&self) -> bool {
        self.method_name.starts_with(SYNTHETIC_ACCESSOR_PREFIX)
    }

    /// Label used for the calling side of a transition: `Short#method(line)`
    ///
    /// A frame without a line number (native code, stripped debug info)
    /// renders `(?)` in place of the line. There is no sentinel value such as
    /// `-1`, since `line_number` is `None` rather than a magic number.
    pub fn invoker_label(&self) -> String {
        match self.line_number {
            Some(line) => format!("{}#{}({})", self.short_class_name(), self.method_name, line),
            None => format!("{}#{}(?)", self.short_class_name(), self.method_name),
        }
    }

    /// Label used for the called side of a transition: `Short#method`
    pub fn invoked_label(&self) -> String {
        format!("{}#{}", self.short_class_name(), self.method_name)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.class_name, self.method_name)?;
        match (&self.file_name, self.line_number) {
            (Some(file), Some(line)) => write!(f, "({}:{})", file, line),
            (Some(file), None) => write!(f, "({})", file),
            (None, Some(line)) => write!(f, "(:{})", line),
            (None, None) => write!(f, "(Unknown Source)"),
        }
    }
}
