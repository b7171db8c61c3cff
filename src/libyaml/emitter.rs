// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 YamlBind, Schema-Directed YAML Marshalling for Rust. All rights reserved.

use crate::libyaml::{self, util::Pinned};
use std::{
    ffi::c_void,
    io,
    mem::{self, MaybeUninit},
    ptr::{self, addr_of_mut},
    slice,
};
#[allow(clippy::unsafe_removed_from_name)]
use unsafe_libyaml as sys;

/// Errors that can occur during YAML emission.
#[derive(Debug)]
pub enum Error {
    /// The backend emitter failed.
    Libyaml(libyaml::error::Error),
    /// The output writer failed.
    Io(io::Error),
}

/// A push emitter producing YAML bytes from a stream of [`Event`]s.
pub struct Emitter<'a> {
    pin: Pinned<EmitterPinned<'a>>,
}

struct EmitterPinned<'a> {
    sys: sys::yaml_emitter_t,
    write: Box<dyn io::Write + 'a>,
    write_error: Option<io::Error>,
}

/// An emission event.
#[derive(Debug)]
pub enum Event<'a> {
    /// Start of the YAML stream.
    StreamStart,
    /// End of the YAML stream.
    StreamEnd,
    /// Start of a document; `explicit` forces the `---` marker.
    DocumentStart {
        /// Emit the `---` document delimiter.
        explicit: bool,
    },
    /// End of a document.
    DocumentEnd,
    /// A scalar value.
    Scalar(Scalar<'a>),
    /// Start of a sequence in the given style.
    SequenceStart(CollectionStyle),
    /// End of a sequence.
    SequenceEnd,
    /// Start of a mapping in the given style.
    MappingStart(CollectionStyle),
    /// End of a mapping.
    MappingEnd,
}

/// A scalar to emit.
#[derive(Debug)]
pub struct Scalar<'a> {
    /// The scalar text.
    pub value: &'a str,
    /// The presentation style.
    pub style: ScalarStyle,
}

/// Presentation styles for emitted scalars.
#[derive(Copy, Clone, Debug)]
pub enum ScalarStyle {
    /// Let the emitter choose, quoting only when required.
    Any,
    /// Plain (unquoted).
    Plain,
    /// Single quoted.
    SingleQuoted,
}

/// Presentation styles for emitted sequences and mappings.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CollectionStyle {
    /// Indentation-based block form.
    Block,
    /// Bracketed flow form.
    Flow,
}

impl<'a> Emitter<'a> {
    /// Creates an emitter writing into `write`.
    ///
    /// # Panics
    ///
    /// Panics if the backend cannot allocate its emitter state.
    pub fn new(write: Box<dyn io::Write + 'a>) -> Emitter<'a> {
        let state = Pinned::<EmitterPinned<'a>>::slot();
        let pin = unsafe {
            let emitter = addr_of_mut!((*state).sys);
            if sys::yaml_emitter_initialize(emitter).fail {
                let error = libyaml::error::Error::emit_error(emitter);
                Pinned::discard(state);
                panic!("malloc error: {}", error);
            }
            sys::yaml_emitter_set_unicode(emitter, true);
            sys::yaml_emitter_set_width(emitter, -1);
            addr_of_mut!((*state).write).write(write);
            addr_of_mut!((*state).write_error).write(None);
            sys::yaml_emitter_set_output(emitter, write_handler, state.cast());
            Pinned::adopt(state)
        };
        Emitter { pin }
    }

    /// Emits one event.
    pub fn emit(&mut self, event: Event<'_>) -> Result<(), Error> {
        let mut sys_event = MaybeUninit::<sys::yaml_event_t>::uninit();
        let sys_event = sys_event.as_mut_ptr();
        unsafe {
            let emitter = addr_of_mut!((*self.pin.as_ptr()).sys);
            let initialize_status = match event {
                Event::StreamStart => {
                    sys::yaml_stream_start_event_initialize(sys_event, sys::YAML_UTF8_ENCODING)
                }
                Event::StreamEnd => sys::yaml_stream_end_event_initialize(sys_event),
                Event::DocumentStart { explicit } => sys::yaml_document_start_event_initialize(
                    sys_event,
                    ptr::null_mut(),
                    ptr::null_mut(),
                    ptr::null_mut(),
                    !explicit,
                ),
                Event::DocumentEnd => sys::yaml_document_end_event_initialize(sys_event, true),
                Event::Scalar(scalar) => {
                    let style = match scalar.style {
                        ScalarStyle::Any => sys::YAML_ANY_SCALAR_STYLE,
                        ScalarStyle::Plain => sys::YAML_PLAIN_SCALAR_STYLE,
                        ScalarStyle::SingleQuoted => sys::YAML_SINGLE_QUOTED_SCALAR_STYLE,
                    };
                    sys::yaml_scalar_event_initialize(
                        sys_event,
                        ptr::null(),
                        ptr::null(),
                        scalar.value.as_ptr(),
                        scalar.value.len() as i32,
                        true,
                        true,
                        style,
                    )
                }
                Event::SequenceStart(style) => {
                    let style = match style {
                        CollectionStyle::Block => sys::YAML_BLOCK_SEQUENCE_STYLE,
                        CollectionStyle::Flow => sys::YAML_FLOW_SEQUENCE_STYLE,
                    };
                    sys::yaml_sequence_start_event_initialize(
                        sys_event,
                        ptr::null(),
                        ptr::null(),
                        true,
                        style,
                    )
                }
                Event::SequenceEnd => sys::yaml_sequence_end_event_initialize(sys_event),
                Event::MappingStart(style) => {
                    let style = match style {
                        CollectionStyle::Block => sys::YAML_BLOCK_MAPPING_STYLE,
                        CollectionStyle::Flow => sys::YAML_FLOW_MAPPING_STYLE,
                    };
                    sys::yaml_mapping_start_event_initialize(
                        sys_event,
                        ptr::null(),
                        ptr::null(),
                        true,
                        style,
                    )
                }
                Event::MappingEnd => sys::yaml_mapping_end_event_initialize(sys_event),
            };
            if initialize_status.fail {
                return Err(Error::Libyaml(libyaml::error::Error::emit_error(emitter)));
            }
            if sys::yaml_emitter_emit(emitter, sys_event).fail {
                return Err(self.error());
            }
        }
        Ok(())
    }

    /// Flushes buffered output into the writer.
    pub fn flush(&mut self) -> Result<(), Error> {
        unsafe {
            let emitter = addr_of_mut!((*self.pin.as_ptr()).sys);
            if sys::yaml_emitter_flush(emitter).fail {
                return Err(self.error());
            }
        }
        Ok(())
    }

    /// Tears the emitter down and returns the writer.
    pub fn into_inner(self) -> Box<dyn io::Write + 'a> {
        let sink = Box::new(io::sink());
        unsafe { mem::replace(&mut (*self.pin.as_ptr()).write, sink) }
    }

    fn error(&mut self) -> Error {
        let emitter = unsafe { &mut *self.pin.as_ptr() };
        if let Some(write_error) = emitter.write_error.take() {
            Error::Io(write_error)
        } else {
            Error::Libyaml(unsafe { libyaml::error::Error::emit_error(&emitter.sys) })
        }
    }
}

unsafe fn write_handler(data: *mut c_void, buffer: *mut u8, size: u64) -> i32 {
    let data = data.cast::<EmitterPinned<'_>>();
    match io::Write::write_all(unsafe { &mut *(*data).write }, unsafe {
        slice::from_raw_parts(buffer, size as usize)
    }) {
        Ok(()) => 1,
        Err(err) => {
            unsafe {
                (*data).write_error = Some(err);
            }
            0
        }
    }
}

impl Drop for EmitterPinned<'_> {
    fn drop(&mut self) {
        unsafe { sys::yaml_emitter_delete(&mut self.sys) }
    }
}
