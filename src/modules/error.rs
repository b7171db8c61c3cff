// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 YamlBind, Schema-Directed YAML Marshalling for Rust. All rights reserved.

use crate::{libyaml::error as backend, modules::path::Path};
use std::{
    error::Error as StdError,
    fmt::{self, Debug, Display},
    io, result,
};

/// An error produced while loading, saving, copying, or freeing data.
pub struct Error(Box<ErrorImpl>);

/// Alias for a `Result` with the error type `yamlbind::Error`.
pub type Result<T, E = Error> = result::Result<T, E>;

/// The stable taxonomy of error kinds produced by the engine.
///
/// Every failure path in the library maps to exactly one of these kinds;
/// [`ErrorKind::detail`] yields the matching static description. The
/// `Null*` kinds mirror the misuse checks of the C-style contract; the
/// ones that cannot arise through safe Rust references are retained so the
/// taxonomy stays stable for callers that match on it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A null data pointer was handed to save, copy, or free.
    NullData,
    /// A null configuration was supplied.
    NullConfig,
    /// The configuration carries no memory allocation function.
    NullMemFn,
    /// A null schema was supplied.
    NullSchema,
    /// A schema node has an invalid type or an illegal flag combination.
    BadTypeInSchema,
    /// A schema node declares a data size its type does not permit.
    InvalidDataSize,
    /// A schema node declares an inconsistent minimum/maximum constraint.
    BadMinMaxSchema,
    /// A fixed-count sequence schema declares differing minimum and maximum.
    SequenceFixedCount,
    /// A bitfield definition does not fit the backing storage.
    BadBitvalInSchema,
    /// Bitfield definitions overlap.
    BadBitfield,
    /// A scalar value could not be parsed against the expected type.
    InvalidValue,
    /// A Base64 payload could not be decoded.
    InvalidBase64,
    /// A string value is shorter than the schema minimum.
    StringLengthMin,
    /// A string value is longer than the schema maximum.
    StringLengthMax,
    /// A required mapping field was absent from the input.
    MappingFieldMissing,
    /// A mapping key is unknown to the schema, or was given twice.
    InvalidKey,
    /// A sequence holds fewer entries than the schema minimum.
    SequenceEntriesMin,
    /// A sequence holds more entries than the schema maximum.
    SequenceEntriesMax,
    /// The event stream did not match the structure the schema expects.
    UnexpectedEvent,
    /// An alias could not be resolved, or alias use is disabled or too deep.
    InvalidAlias,
    /// The memory allocation callback returned null.
    AllocFailed,
    /// The underlying YAML parser or emitter reported an error.
    Parser,
    /// A validation callback rejected a populated value.
    DataValidErr,
    /// A null pointer was found where a non-null pointer is required.
    DataTargetNonNullPtrReq,
    /// A file could not be opened, read, or written.
    FileOpen,
}

impl ErrorKind {
    /// Returns the static human-readable description of this error kind.
    pub const fn detail(self) -> &'static str {
        match self {
            ErrorKind::NullData => "null data pointer",
            ErrorKind::NullConfig => "null configuration",
            ErrorKind::NullMemFn => "configuration has no memory allocation function",
            ErrorKind::NullSchema => "null schema",
            ErrorKind::BadTypeInSchema => "bad type or flags in schema",
            ErrorKind::InvalidDataSize => "invalid data size in schema",
            ErrorKind::BadMinMaxSchema => "bad minimum/maximum in schema",
            ErrorKind::SequenceFixedCount => {
                "fixed sequence schema requires matching minimum and maximum"
            }
            ErrorKind::BadBitvalInSchema => "bitfield definition exceeds backing storage",
            ErrorKind::BadBitfield => "overlapping bitfield definitions in schema",
            ErrorKind::InvalidValue => "invalid value",
            ErrorKind::InvalidBase64 => "invalid Base64 payload",
            ErrorKind::StringLengthMin => "string is shorter than the permitted minimum",
            ErrorKind::StringLengthMax => "string is longer than the permitted maximum",
            ErrorKind::MappingFieldMissing => "required mapping field is missing",
            ErrorKind::InvalidKey => "invalid mapping key",
            ErrorKind::SequenceEntriesMin => "sequence has too few entries",
            ErrorKind::SequenceEntriesMax => "sequence has too many entries",
            ErrorKind::UnexpectedEvent => "unexpected event in input",
            ErrorKind::InvalidAlias => "invalid alias",
            ErrorKind::AllocFailed => "memory allocation failed",
            ErrorKind::Parser => "YAML parse or emit error",
            ErrorKind::DataValidErr => "value rejected by validation callback",
            ErrorKind::DataTargetNonNullPtrReq => "non-null pointer required",
            ErrorKind::FileOpen => "file could not be opened, read, or written",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.detail())
    }
}

/// The internal representation of an error.
pub(crate) struct ErrorImpl {
    kind: ErrorKind,
    pos: Option<Pos>,
    cause: Option<Cause>,
}

/// An underlying cause carried alongside the error kind.
#[derive(Debug)]
pub(crate) enum Cause {
    Backend(backend::Error),
    Io(io::Error),
}

/// The position inside the document an error was raised at.
struct Pos {
    mark: backend::Mark,
    path: String,
}

/// The input location at which an error occurred.
#[derive(Copy, Clone, Debug)]
pub struct Location {
    index: usize,
    line: usize,
    column: usize,
}

impl Location {
    /// The byte index of the error within the input.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The one-based line of the error.
    pub fn line(&self) -> usize {
        self.line
    }

    /// The one-based column of the error.
    pub fn column(&self) -> usize {
        self.column
    }

    fn from_mark(mark: backend::Mark) -> Self {
        Location {
            index: mark.index() as usize,
            // Marks are zero-indexed; rendered positions are one-based.
            line: mark.line() as usize + 1,
            column: mark.column() as usize + 1,
        }
    }
}

impl Error {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        self.0.kind
    }

    /// Returns the input location of the error, when one is known.
    pub fn location(&self) -> Option<Location> {
        self.0.mark().map(Location::from_mark)
    }

    /// Returns the document path of the error (for example `.servers[2].port`),
    /// when one is known.
    pub fn path(&self) -> Option<&str> {
        self.0.pos.as_ref().map(|pos| pos.path.as_str())
    }
}

/// Creates a new `Error` of the given kind, with no position attached yet.
pub(crate) fn new(kind: ErrorKind) -> Error {
    Error(Box::new(ErrorImpl {
        kind,
        pos: None,
        cause: None,
    }))
}

/// Creates a new `Error` wrapping a backend parser/emitter failure.
pub(crate) fn backend(err: backend::Error) -> Error {
    Error(Box::new(ErrorImpl {
        kind: ErrorKind::Parser,
        pos: None,
        cause: Some(Cause::Backend(err)),
    }))
}

/// Creates a new `Error` wrapping an I/O failure.
pub(crate) fn io(err: io::Error) -> Error {
    Error(Box::new(ErrorImpl {
        kind: ErrorKind::FileOpen,
        pos: None,
        cause: Some(Cause::Io(err)),
    }))
}

/// Attaches a mark and document path to an error that has none yet.
pub(crate) fn fix_mark(mut error: Error, mark: backend::Mark, path: Path<'_>) -> Error {
    if error.0.pos.is_none() {
        error.0.pos = Some(Pos {
            mark,
            path: path.to_string(),
        });
    }
    error
}

impl From<backend::Error> for Error {
    fn from(err: backend::Error) -> Self {
        backend(err)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        io(err)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.0.cause {
            Some(Cause::Io(err)) => Some(err),
            _ => None,
        }
    }
}

impl ErrorImpl {
    fn mark(&self) -> Option<backend::Mark> {
        if let Some(pos) = &self.pos {
            return Some(pos.mark);
        }
        if let Some(Cause::Backend(err)) = &self.cause {
            return Some(err.mark());
        }
        None
    }

    fn message(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            Some(Cause::Backend(err)) => Display::fmt(err, f),
            Some(Cause::Io(err)) => {
                write!(f, "{}: {}", self.kind.detail(), err)
            }
            None => {
                if let Some(pos) = &self.pos {
                    if pos.path != "." {
                        write!(f, "{}: ", pos.path)?;
                    }
                }
                f.write_str(self.kind.detail())
            }
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.message(f)?;
        if let Some(mark) = self.0.mark() {
            if mark.line() != 0 || mark.column() != 0 {
                write!(f, " at {}", mark)?;
            }
        }
        Ok(())
    }
}

// Keep the debug representation compact; it is what unwrap() shows.
impl Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error({:?}, {:?}", self.0.kind, self.to_string())?;
        if let Some(mark) = self.0.mark() {
            write!(
                f,
                ", line: {}, column: {}",
                mark.line() + 1,
                mark.column() + 1
            )?;
        }
        f.write_str(")")
    }
}
