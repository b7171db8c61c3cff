// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 YamlBind, Schema-Directed YAML Marshalling for Rust. All rights reserved.

use crate::libyaml::{
    error::{Error, Mark, Result},
    util::Pinned,
};
use std::{
    borrow::Cow,
    ffi::CStr,
    fmt::{self, Debug},
    mem::MaybeUninit,
    ptr::{addr_of_mut, NonNull},
    slice,
};
#[allow(clippy::unsafe_removed_from_name)]
use unsafe_libyaml as sys;

/// A pull parser over a YAML byte stream.
///
/// Wraps the raw backend parser and yields one [`Event`] per call to
/// [`Parser::next_event`], together with the [`Mark`] of the event's start
/// position. The `'input` lifetime ties the parser to borrowed input.
pub struct Parser<'input> {
    pin: Pinned<ParserPinned<'input>>,
}

struct ParserPinned<'input> {
    sys: sys::yaml_parser_t,
    input: Cow<'input, [u8]>,
}

/// A parsing event.
///
/// Tags and presentation styles are stripped: the schema decides how every
/// node is interpreted, so the engine only needs structure, scalar bytes,
/// and anchor names.
#[derive(Debug)]
pub enum Event {
    /// Start of the YAML stream.
    StreamStart,
    /// End of the YAML stream.
    StreamEnd,
    /// Start of a document.
    DocumentStart,
    /// End of a document.
    DocumentEnd,
    /// A reference to a previously anchored node.
    Alias(Anchor),
    /// A scalar value.
    Scalar(Scalar),
    /// Start of a sequence.
    SequenceStart(CollectionStart),
    /// End of a sequence.
    SequenceEnd,
    /// Start of a mapping.
    MappingStart(CollectionStart),
    /// End of a mapping.
    MappingEnd,
}

/// A scalar value together with its optional anchor.
pub struct Scalar {
    /// The anchor set on this scalar, if any.
    pub anchor: Option<Anchor>,
    /// The scalar payload bytes.
    pub value: Box<[u8]>,
}

/// The opening of a sequence or mapping.
#[derive(Debug)]
pub struct CollectionStart {
    /// The anchor set on this collection, if any.
    pub anchor: Option<Anchor>,
}

/// An anchor name.
#[derive(Clone, Ord, PartialOrd, Eq, PartialEq)]
pub struct Anchor(Box<[u8]>);

impl<'input> Parser<'input> {
    /// Creates a parser over the given input bytes.
    ///
    /// # Panics
    ///
    /// Panics if the backend cannot allocate its parser state.
    pub fn new(input: Cow<'input, [u8]>) -> Parser<'input> {
        let state = Pinned::<ParserPinned<'input>>::slot();
        let pin = unsafe {
            let parser = addr_of_mut!((*state).sys);
            if sys::yaml_parser_initialize(parser).fail {
                let error = Error::parse_error(parser);
                Pinned::discard(state);
                panic!("malloc error: {}", error);
            }
            sys::yaml_parser_set_encoding(parser, sys::YAML_UTF8_ENCODING);
            sys::yaml_parser_set_input_string(parser, input.as_ptr(), input.len() as u64);
            addr_of_mut!((*state).input).write(input);
            Pinned::adopt(state)
        };
        Parser { pin }
    }

    /// Pulls the next event from the input.
    pub fn next_event(&mut self) -> Result<(Event, Mark)> {
        let mut event = MaybeUninit::<sys::yaml_event_t>::uninit();
        unsafe {
            let parser = addr_of_mut!((*self.pin.as_ptr()).sys);
            if (*parser).error != sys::YAML_NO_ERROR {
                return Err(Error::parse_error(parser));
            }
            let event = event.as_mut_ptr();
            if sys::yaml_parser_parse(parser, event).fail {
                return Err(Error::parse_error(parser));
            }
            let ret = convert_event(&*event);
            let mark = Mark {
                sys: (*event).start_mark,
            };
            sys::yaml_event_delete(event);
            Ok((ret, mark))
        }
    }
}

unsafe fn convert_event(sys: &sys::yaml_event_t) -> Event {
    match sys.type_ {
        sys::YAML_STREAM_START_EVENT => Event::StreamStart,
        sys::YAML_STREAM_END_EVENT => Event::StreamEnd,
        sys::YAML_DOCUMENT_START_EVENT => Event::DocumentStart,
        sys::YAML_DOCUMENT_END_EVENT => Event::DocumentEnd,
        sys::YAML_ALIAS_EVENT => {
            Event::Alias(unsafe { optional_anchor(sys.data.alias.anchor) }.expect("alias anchor"))
        }
        sys::YAML_SCALAR_EVENT => Event::Scalar(Scalar {
            anchor: unsafe { optional_anchor(sys.data.scalar.anchor) },
            value: Box::from(unsafe {
                slice::from_raw_parts(sys.data.scalar.value, sys.data.scalar.length as usize)
            }),
        }),
        sys::YAML_SEQUENCE_START_EVENT => Event::SequenceStart(CollectionStart {
            anchor: unsafe { optional_anchor(sys.data.sequence_start.anchor) },
        }),
        sys::YAML_SEQUENCE_END_EVENT => Event::SequenceEnd,
        sys::YAML_MAPPING_START_EVENT => Event::MappingStart(CollectionStart {
            anchor: unsafe { optional_anchor(sys.data.mapping_start.anchor) },
        }),
        sys::YAML_MAPPING_END_EVENT => Event::MappingEnd,
        _ => unreachable!("backend produced an unknown event type"),
    }
}

unsafe fn optional_anchor(anchor: *const u8) -> Option<Anchor> {
    let ptr = NonNull::new(anchor as *mut u8)?;
    let cstr = unsafe { CStr::from_ptr(ptr.as_ptr().cast()) };
    Some(Anchor(Box::from(cstr.to_bytes())))
}

impl Anchor {
    /// The anchor name bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Debug for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scalar")
            .field("anchor", &self.anchor)
            .field("value", &String::from_utf8_lossy(&self.value))
            .finish()
    }
}

impl Debug for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(&self.0))
    }
}

impl Drop for ParserPinned<'_> {
    fn drop(&mut self) {
        unsafe { sys::yaml_parser_delete(&mut self.sys) }
    }
}
