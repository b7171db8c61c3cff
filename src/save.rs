// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 YamlBind, Schema-Directed YAML Marshalling for Rust. All rights reserved.

//! The save engine: a schema-directed walk over a populated target graph,
//! emitting YAML events.
//!
//! Mapping fields are emitted in schema declaration order; `OPTIONAL`
//! fields whose runtime value equals their declared default byte-for-byte
//! are skipped. Anchors and aliases are never produced.

use crate::{
    base64,
    config::{Config, ConfigFlags},
    libyaml::emitter::{CollectionStyle, Emitter, Error as EmitError, Event, Scalar, ScalarStyle},
    mem,
    modules::error::{self, ErrorKind, Result},
    scalar,
    schema::{Field, Flags, Missing, Schema, SchemaKind},
};
use std::{io, slice, str};

/// Serialises a target graph to YAML through the given writer.
///
/// # Safety
///
/// `data` must be the root of a graph laid out exactly as `schema`
/// describes, and `seq_count` must be its entry count when the top level
/// is a variable sequence.
pub(crate) unsafe fn save_data(
    data: *const u8,
    seq_count: u64,
    config: &Config,
    schema: &Schema,
    write: Box<dyn io::Write + '_>,
) -> Result<()> {
    schema.check_node().map_err(error::new)?;
    if !schema.flags.is_pointer() {
        return Err(error::new(ErrorKind::BadTypeInSchema));
    }
    // An empty top-level sequence never allocated a buffer.
    let empty_sequence = matches!(schema.kind, SchemaKind::Sequence { .. }) && seq_count == 0;
    if data.is_null() && !schema.flags.is_nullable() && !empty_sequence {
        return Err(error::new(ErrorKind::NullData));
    }

    let style = if config.flags.contains(ConfigFlags::STYLE_FLOW)
        && !config.flags.contains(ConfigFlags::STYLE_BLOCK)
    {
        CollectionStyle::Flow
    } else {
        CollectionStyle::Block
    };
    let mut engine = SaveEngine {
        emitter: Emitter::new(write),
        style,
    };

    engine.emit(Event::StreamStart)?;
    engine.emit(Event::DocumentStart {
        explicit: config.flags.contains(ConfigFlags::DOCUMENT_DELIM),
    })?;
    let root_slot = (&data as *const *const u8).cast::<u8>();
    unsafe { engine.save_node(schema, root_slot, seq_count) }?;
    engine.emit(Event::DocumentEnd)?;
    engine.emit(Event::StreamEnd)?;
    engine.flush()
}

struct SaveEngine<'w> {
    emitter: Emitter<'w>,
    style: CollectionStyle,
}

impl SaveEngine<'_> {
    fn emit(&mut self, event: Event<'_>) -> Result<()> {
        self.emitter.emit(event).map_err(convert_emit_error)
    }

    fn flush(&mut self) -> Result<()> {
        self.emitter.flush().map_err(convert_emit_error)
    }

    fn emit_scalar(&mut self, value: &str, style: ScalarStyle) -> Result<()> {
        self.emit(Event::Scalar(Scalar { value, style }))
    }

    /// Emits one value reachable through `slot`.
    ///
    /// # Safety
    ///
    /// As for [`save_data`], scoped to this slot.
    unsafe fn save_node(&mut self, schema: &Schema, slot: *const u8, count: u64) -> Result<()> {
        schema.check_node().map_err(error::new)?;

        // An empty sequence legitimately stores a null backing pointer.
        if matches!(schema.kind, SchemaKind::Sequence { .. })
            && count == 0
            && schema.flags.is_pointer()
            && unsafe { mem::read_ptr(slot) }.is_null()
        {
            self.emit(Event::SequenceStart(self.style))?;
            return self.emit(Event::SequenceEnd);
        }

        let value = if schema.flags.is_pointer() {
            let target = unsafe { mem::read_ptr(slot) };
            if target.is_null() {
                if schema.flags.is_nullable() {
                    return self.emit_scalar("", ScalarStyle::Plain);
                }
                return Err(error::new(ErrorKind::DataTargetNonNullPtrReq));
            }
            target.cast_const()
        } else {
            slot
        };

        match &schema.kind {
            SchemaKind::Int { .. } => {
                let stored = unsafe { mem::read_int(value, schema.data_size) };
                self.emit_scalar(&scalar::render_int(stored), ScalarStyle::Plain)
            }
            SchemaKind::Uint { .. } => {
                let stored = unsafe { mem::read_uint(value, schema.data_size) };
                self.emit_scalar(&scalar::render_uint(stored), ScalarStyle::Plain)
            }
            SchemaKind::Bool => {
                let stored = unsafe { mem::read_uint(value, schema.data_size) };
                self.emit_scalar(scalar::render_bool(stored != 0), ScalarStyle::Plain)
            }
            SchemaKind::Float => {
                let stored = unsafe { mem::read_float(value, schema.data_size) };
                self.emit_scalar(
                    &scalar::render_float(stored, schema.data_size),
                    ScalarStyle::Plain,
                )
            }
            SchemaKind::Enum { table } => {
                let stored = unsafe { mem::read_int(value, schema.data_size) };
                match scalar::enum_name(table, stored) {
                    Some(name) => self.emit_scalar(name, ScalarStyle::Any),
                    None => self.emit_scalar(&scalar::render_int(stored), ScalarStyle::Plain),
                }
            }
            SchemaKind::Flags { table } => {
                self.emit(Event::SequenceStart(self.style))?;
                let mut rest = unsafe { mem::read_uint(value, schema.data_size) };
                for entry in table {
                    let bits = entry.value as u64;
                    if bits != 0 && rest & bits == bits {
                        self.emit_scalar(&entry.name, ScalarStyle::Any)?;
                        rest &= !bits;
                    }
                }
                if rest != 0 {
                    // Bits with no name render as one numeric entry.
                    self.emit_scalar(&scalar::render_uint(rest), ScalarStyle::Plain)?;
                }
                self.emit(Event::SequenceEnd)
            }
            SchemaKind::Bitfield { defs } => {
                self.emit(Event::MappingStart(self.style))?;
                let stored = unsafe { mem::read_uint(value, schema.data_size) };
                for def in defs {
                    let slice = (stored & def.mask()) >> def.offset;
                    if slice == 0 {
                        continue;
                    }
                    self.emit_scalar(&def.name, ScalarStyle::Any)?;
                    self.emit_scalar(&scalar::render_uint(slice), ScalarStyle::Plain)?;
                }
                self.emit(Event::MappingEnd)
            }
            SchemaKind::String { .. } => {
                let limit = if schema.flags.is_pointer() {
                    usize::MAX
                } else {
                    schema.data_size
                };
                let bytes = unsafe { c_string_bytes(value, limit) };
                let text =
                    str::from_utf8(bytes).map_err(|_| error::new(ErrorKind::InvalidValue))?;
                self.emit_scalar(text, ScalarStyle::Any)
            }
            SchemaKind::Binary { min, max } => {
                let length = if min == max { *min } else { count as usize };
                let bytes = unsafe { slice::from_raw_parts(value, length) };
                self.emit_scalar(&base64::encode(bytes), ScalarStyle::Plain)
            }
            SchemaKind::Mapping { fields } => {
                self.emit(Event::MappingStart(self.style))?;
                for field in fields.iter() {
                    if matches!(field.value.kind, SchemaKind::Ignore) {
                        continue;
                    }
                    if field.value.flags.contains(Flags::OPTIONAL)
                        && unsafe { equals_missing(field, value) }
                    {
                        continue;
                    }
                    let field_count = match field.count {
                        Some(count_slot) => unsafe {
                            mem::read_uint(value.add(count_slot.offset), count_slot.size)
                        },
                        None => {
                            if matches!(field.value.kind, SchemaKind::Sequence { .. }) {
                                return Err(error::new(ErrorKind::InvalidDataSize));
                            }
                            0
                        }
                    };
                    self.emit_scalar(&field.key, ScalarStyle::Any)?;
                    unsafe {
                        self.save_node(&field.value, value.add(field.data_offset), field_count)
                    }?;
                }
                self.emit(Event::MappingEnd)
            }
            SchemaKind::Sequence { entry, .. } => {
                self.emit(Event::SequenceStart(self.style))?;
                let stride = entry.stride().max(1);
                for index in 0..count as usize {
                    unsafe { self.save_node(entry, value.add(index * stride), 0) }?;
                }
                self.emit(Event::SequenceEnd)
            }
            SchemaKind::SequenceFixed { entry, max, .. } => {
                self.emit(Event::SequenceStart(self.style))?;
                let stride = entry.stride().max(1);
                for index in 0..*max {
                    unsafe { self.save_node(entry, value.add(index * stride), 0) }?;
                }
                self.emit(Event::SequenceEnd)
            }
            SchemaKind::Ignore => self.emit_scalar("", ScalarStyle::Plain),
        }
    }
}

/// Whether an `OPTIONAL` field currently holds exactly its declared
/// default (byte-wise over the slot width).
unsafe fn equals_missing(field: &Field, base: *const u8) -> bool {
    let schema = &field.value;
    let missing = match field.missing {
        None => return false,
        Some(missing) => missing,
    };
    let slot = unsafe { base.add(field.data_offset) };

    let value = if schema.flags.is_pointer() {
        let target = unsafe { mem::read_ptr(slot) };
        if matches!(missing, Missing::Zero) {
            return target.is_null();
        }
        if target.is_null() {
            return false;
        }
        target.cast_const()
    } else {
        slot
    };

    let size = schema.data_size.min(8);
    if size == 0 {
        return false;
    }
    let mut expected = [0u8; 8];
    let is_float = matches!(schema.kind, SchemaKind::Float);
    unsafe {
        match missing {
            Missing::Zero => {}
            Missing::Int(default) => {
                if is_float {
                    mem::write_float(expected.as_mut_ptr(), size, default as f64);
                } else {
                    mem::write_uint(expected.as_mut_ptr(), size, default as u64);
                }
            }
            Missing::Uint(default) => {
                if is_float {
                    mem::write_float(expected.as_mut_ptr(), size, default as f64);
                } else {
                    mem::write_uint(expected.as_mut_ptr(), size, default);
                }
            }
            Missing::Bool(default) => {
                mem::write_uint(expected.as_mut_ptr(), size, u64::from(default));
            }
            Missing::Float(default) => {
                if is_float {
                    mem::write_float(expected.as_mut_ptr(), size, default);
                } else {
                    mem::write_uint(expected.as_mut_ptr(), size, default as u64);
                }
            }
        }
    }
    unsafe { slice::from_raw_parts(value, size) == &expected[..size] }
}

unsafe fn c_string_bytes<'p>(ptr: *const u8, limit: usize) -> &'p [u8] {
    let mut len = 0usize;
    while len < limit && unsafe { *ptr.add(len) } != 0 {
        len += 1;
    }
    unsafe { slice::from_raw_parts(ptr, len) }
}

fn convert_emit_error(err: EmitError) -> crate::modules::error::Error {
    match err {
        EmitError::Libyaml(err) => error::backend(err),
        EmitError::Io(err) => error::io(err),
    }
}
