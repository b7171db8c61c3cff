// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 YamlBind, Schema-Directed YAML Marshalling for Rust. All rights reserved.

use std::{
    ffi::CStr,
    fmt::{self, Debug, Display},
    mem::MaybeUninit,
    os::raw::c_char,
};
#[allow(clippy::unsafe_removed_from_name)]
use unsafe_libyaml as sys;

/// Alias for a `Result` with a backend [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// An error reported by the raw YAML parser or emitter.
///
/// The problem and context strings are copied out of the backend state at
/// construction time, so the error stays valid after the parser or
/// emitter is torn down.
pub struct Error {
    kind: sys::yaml_error_type_t,
    problem: String,
    problem_offset: u64,
    problem_mark: Mark,
    context: Option<String>,
    context_mark: Mark,
}

fn lossy_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    let cstr = unsafe { CStr::from_ptr(ptr) };
    Some(cstr.to_string_lossy().into_owned())
}

impl Error {
    /// Captures the failure state of a parser.
    ///
    /// # Safety
    ///
    /// `parser` must point at an initialised backend parser.
    pub(crate) unsafe fn parse_error(parser: *const sys::yaml_parser_t) -> Self {
        Error {
            kind: unsafe { (*parser).error },
            problem: unsafe { lossy_string((*parser).problem.cast()) }
                .unwrap_or_else(|| "backend parser failed without a problem string".to_owned()),
            problem_offset: unsafe { (*parser).problem_offset },
            problem_mark: Mark {
                sys: unsafe { (*parser).problem_mark },
            },
            context: unsafe { lossy_string((*parser).context.cast()) },
            context_mark: Mark {
                sys: unsafe { (*parser).context_mark },
            },
        }
    }

    /// Captures the failure state of an emitter.
    ///
    /// # Safety
    ///
    /// `emitter` must point at an initialised backend emitter.
    pub(crate) unsafe fn emit_error(emitter: *const sys::yaml_emitter_t) -> Self {
        let zero_mark = Mark {
            sys: unsafe { MaybeUninit::<sys::yaml_mark_t>::zeroed().assume_init() },
        };
        Error {
            kind: unsafe { (*emitter).error },
            problem: unsafe { lossy_string((*emitter).problem.cast()) }
                .unwrap_or_else(|| "backend emitter failed without a problem string".to_owned()),
            problem_offset: 0,
            problem_mark: zero_mark,
            context: None,
            context_mark: zero_mark,
        }
    }

    /// Returns the position of the problem.
    pub fn mark(&self) -> Mark {
        self.problem_mark
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.problem)?;
        if self.problem_mark.sys.line != 0 || self.problem_mark.sys.column != 0 {
            write!(f, " at {}", self.problem_mark)?;
        } else if self.problem_offset != 0 {
            write!(f, " at position {}", self.problem_offset)?;
        }
        if let Some(context) = &self.context {
            write!(f, ", {}", context)?;
            if (self.context_mark.sys.line != 0 || self.context_mark.sys.column != 0)
                && (self.context_mark.sys.line != self.problem_mark.sys.line
                    || self.context_mark.sys.column != self.problem_mark.sys.column)
            {
                write!(f, " at {}", self.context_mark)?;
            }
        }
        Ok(())
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Error");
        if let Some(kind) = match self.kind {
            sys::YAML_MEMORY_ERROR => Some("MEMORY"),
            sys::YAML_READER_ERROR => Some("READER"),
            sys::YAML_SCANNER_ERROR => Some("SCANNER"),
            sys::YAML_PARSER_ERROR => Some("PARSER"),
            sys::YAML_COMPOSER_ERROR => Some("COMPOSER"),
            sys::YAML_WRITER_ERROR => Some("WRITER"),
            sys::YAML_EMITTER_ERROR => Some("EMITTER"),
            _ => None,
        } {
            out.field("kind", &format_args!("{}", kind));
        }
        out.field("problem", &self.problem);
        if self.problem_mark.sys.line != 0 || self.problem_mark.sys.column != 0 {
            out.field("problem_mark", &self.problem_mark);
        } else if self.problem_offset != 0 {
            out.field("problem_offset", &self.problem_offset);
        }
        if let Some(context) = &self.context {
            out.field("context", context);
            if self.context_mark.sys.line != 0 || self.context_mark.sys.column != 0 {
                out.field("context_mark", &self.context_mark);
            }
        }
        out.finish()
    }
}

/// A position in the YAML input, as reported by the backend.
#[derive(Copy, Clone)]
pub struct Mark {
    pub(super) sys: sys::yaml_mark_t,
}

impl Mark {
    /// The byte index of the mark within the input.
    pub fn index(&self) -> u64 {
        self.sys.index
    }

    /// The zero-based line of the mark.
    pub fn line(&self) -> u64 {
        self.sys.line
    }

    /// The zero-based column of the mark.
    pub fn column(&self) -> u64 {
        self.sys.column
    }
}

impl Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sys.line != 0 || self.sys.column != 0 {
            write!(f, "line {} column {}", self.sys.line + 1, self.sys.column + 1)
        } else {
            write!(f, "position {}", self.sys.index)
        }
    }
}

impl Debug for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Mark");
        if self.sys.line != 0 || self.sys.column != 0 {
            out.field("line", &(self.sys.line + 1));
            out.field("column", &(self.sys.column + 1));
        } else {
            out.field("index", &self.sys.index);
        }
        out.finish()
    }
}
