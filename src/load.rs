// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 YamlBind, Schema-Directed YAML Marshalling for Rust. All rights reserved.

//! The load engine: walks one buffered document, guided by the schema,
//! allocating and populating the target graph.
//!
//! Every allocation is zeroed before use and every parent slot (value
//! pointers, sequence counts) is kept up to date eagerly, so at any error
//! the partially-built graph is a consistent tree the free engine can
//! release. Aliases replay the anchored event subsequence by jumping the
//! cursor, with a hard expansion depth cap against malicious inputs.

use crate::{
    base64,
    config::{Config, ConfigFlags, LogLevel},
    free,
    libyaml::error::Mark,
    loader::{Document, Event, Loader},
    mem::{self, Alloc},
    modules::{
        error::{self, ErrorKind, Result},
        path::Path,
    },
    scalar,
    schema::{Field, FieldTable, Flags, Missing, NamedValue, Schema, SchemaKind},
};
use std::{borrow::Cow, ptr, str};

/// Hard cap on nested alias expansion.
const MAX_ALIAS_DEPTH: usize = 1024;

/// Smallest sequence backing-buffer capacity, in entries.
const MIN_SEQUENCE_CAPACITY: usize = 4;

/// Loads one document into a freshly allocated target graph.
///
/// On success returns the root allocation and, for a top-level variable
/// sequence, its entry count (zero otherwise). On any error everything
/// allocated so far is released through the free engine and the error is
/// returned with the caller seeing no allocation at all.
pub(crate) fn load_data(
    input: Cow<'_, [u8]>,
    config: &Config,
    schema: &Schema,
) -> Result<(*mut u8, u64)> {
    let alloc = Alloc::new(config)?;
    schema.check_node().map_err(error::new)?;
    if !schema.flags.is_pointer() {
        // The root must own its allocation.
        return Err(error::new(ErrorKind::BadTypeInSchema));
    }

    let record_anchors = !config.flags.contains(ConfigFlags::NO_ANCHORS);
    let mut loader = Loader::new(input, record_anchors);
    let document = match loader.next_document() {
        Some(Ok(document)) => document,
        Some(Err(err)) => return Err(err),
        None => return Err(error::new(ErrorKind::UnexpectedEvent)),
    };
    // Trailing documents in the stream are never pulled from the parser.

    let mut engine = LoadEngine {
        config,
        alloc,
        document: &document,
        pos: 0,
        alias_depth: 0,
        jump_count: 0,
    };

    let mut root: *mut u8 = ptr::null_mut();
    let mut root_count: u64 = 0;
    let root_slot = (&mut root as *mut *mut u8).cast::<u8>();
    // The count out-value stands in for the count slot a mapping field
    // would carry: sequences report their entry count through it, and a
    // variable-length binary blob reports its byte length.
    let needs_count = match &schema.kind {
        SchemaKind::Sequence { .. } => true,
        SchemaKind::Binary { min, max } => min != max,
        _ => false,
    };
    let count_slot = if needs_count {
        Some(((&mut root_count as *mut u64).cast::<u8>(), 8))
    } else {
        None
    };

    let result = unsafe { engine.parse_node(schema, root_slot, count_slot, &Path::Root) };
    match result {
        Ok(()) => Ok((root, root_count)),
        Err(err) => {
            unsafe { free::free_node(&alloc, schema, root_slot, root_count) };
            config.log(
                LogLevel::Error,
                format_args!("load failed: {}", err),
            );
            Err(err)
        }
    }
}

struct LoadEngine<'a> {
    config: &'a Config,
    alloc: Alloc,
    document: &'a Document,
    pos: usize,
    alias_depth: usize,
    jump_count: usize,
}

type CountSlotPtr = Option<(*mut u8, usize)>;

impl<'a> LoadEngine<'a> {
    fn peek(&self) -> Result<(&'a Event, Mark)> {
        match self.document.events.get(self.pos) {
            Some((event, mark)) => Ok((event, *mark)),
            None => Err(error::new(ErrorKind::UnexpectedEvent)),
        }
    }

    fn next(&mut self) -> Result<(&'a Event, Mark)> {
        let next = self.peek()?;
        self.pos += 1;
        Ok(next)
    }

    /// Moves the cursor to an anchored event, returning the saved position.
    fn jump(&mut self, id: usize, mark: Mark, path: &Path<'_>) -> Result<usize> {
        if self.config.flags.contains(ConfigFlags::NO_ALIAS) {
            return Err(error::fix_mark(
                error::new(ErrorKind::InvalidAlias),
                mark,
                *path,
            ));
        }
        self.jump_count += 1;
        if self.jump_count > self.document.events.len().saturating_mul(100) {
            // Pathological alias amplification.
            return Err(error::fix_mark(
                error::new(ErrorKind::InvalidAlias),
                mark,
                *path,
            ));
        }
        self.alias_depth += 1;
        if self.alias_depth > MAX_ALIAS_DEPTH {
            return Err(error::fix_mark(
                error::new(ErrorKind::InvalidAlias),
                mark,
                *path,
            ));
        }
        match self.document.anchor_event_map.get(&id) {
            Some(target) => Ok(std::mem::replace(&mut self.pos, *target)),
            None => Err(error::fix_mark(
                error::new(ErrorKind::InvalidAlias),
                mark,
                *path,
            )),
        }
    }

    /// Parses one node of the document against `schema`, writing through
    /// `slot` (the pointer slot for pointer schemas, the value location
    /// otherwise).
    ///
    /// # Safety
    ///
    /// `slot` must be valid for `schema.stride()` bytes and zeroed or
    /// previously unwritten; `count_slot` must be valid when present.
    unsafe fn parse_node(
        &mut self,
        schema: &Schema,
        slot: *mut u8,
        count_slot: CountSlotPtr,
        path: &Path<'_>,
    ) -> Result<()> {
        let (event, mark) = self.peek()?;
        schema
            .check_node()
            .map_err(|kind| error::fix_mark(error::new(kind), mark, *path))?;

        if let Event::Alias(id) = event {
            self.next()?;
            let saved = self.jump(*id, mark, path)?;
            let alias_path = Path::Alias { parent: path };
            let result = unsafe { self.parse_node(schema, slot, count_slot, &alias_path) };
            self.pos = saved;
            self.alias_depth -= 1;
            return result;
        }

        if matches!(schema.kind, SchemaKind::Ignore) {
            // Ignore nodes own no storage; never touch the slot.
            return self
                .consume_node()
                .map_err(|err| error::fix_mark(err, mark, *path));
        }

        if schema.flags.is_nullable() {
            if let Event::Scalar(value) = event {
                if is_null_scalar(value, schema.flags) {
                    self.next()?;
                    unsafe { mem::write_ptr(slot, ptr::null_mut()) };
                    return Ok(());
                }
            }
        }

        let result = match &schema.kind {
            SchemaKind::Ignore => unreachable!(),
            SchemaKind::Int { .. }
            | SchemaKind::Uint { .. }
            | SchemaKind::Bool
            | SchemaKind::Float
            | SchemaKind::Enum { .. }
            | SchemaKind::String { .. }
            | SchemaKind::Binary { .. } => unsafe {
                self.parse_scalar(schema, slot, count_slot, path)
            },
            SchemaKind::Flags { table } => unsafe { self.parse_flags(schema, table, slot, path) },
            SchemaKind::Bitfield { defs } => unsafe {
                self.parse_bitfield(schema, defs, slot, path)
            },
            SchemaKind::Mapping { fields } => unsafe {
                self.parse_mapping(schema, fields, slot, path)
            },
            SchemaKind::Sequence { .. } | SchemaKind::SequenceFixed { .. } => unsafe {
                self.parse_sequence(schema, slot, count_slot, path)
            },
        };
        result.map_err(|err| error::fix_mark(err, mark, *path))?;

        if let Some(validate) = schema.validate {
            let target = if schema.flags.is_pointer() {
                unsafe { mem::read_ptr(slot) }
            } else {
                slot
            };
            if !target.is_null() && !unsafe { validate(target.cast_const()) } {
                return Err(error::fix_mark(
                    error::new(ErrorKind::DataValidErr),
                    mark,
                    *path,
                ));
            }
        }
        Ok(())
    }

    /// Allocates the value's storage for pointer slots, recording the
    /// pointer in the slot immediately so rollback can find it.
    unsafe fn value_target(&mut self, schema: &Schema, slot: *mut u8, size: usize) -> Result<*mut u8> {
        if schema.flags.is_pointer() {
            let target = unsafe { self.alloc.alloc_zeroed(size.max(1)) }?;
            unsafe { mem::write_ptr(slot, target) };
            Ok(target)
        } else {
            Ok(slot)
        }
    }

    unsafe fn parse_scalar(
        &mut self,
        schema: &Schema,
        slot: *mut u8,
        count_slot: CountSlotPtr,
        path: &Path<'_>,
    ) -> Result<()> {
        let (event, mark) = self.next()?;
        let value = match event {
            Event::Scalar(value) => value,
            Event::SequenceStart | Event::MappingStart => {
                return Err(error::fix_mark(
                    error::new(ErrorKind::UnexpectedEvent),
                    mark,
                    *path,
                ))
            }
            _ => {
                return Err(error::fix_mark(
                    error::new(ErrorKind::UnexpectedEvent),
                    mark,
                    *path,
                ))
            }
        };

        match &schema.kind {
            SchemaKind::Int { range } => {
                let text = scalar_text(value, mark, path)?;
                let parsed = scalar::parse_int(text, schema.data_size, *range)
                    .map_err(|kind| error::fix_mark(error::new(kind), mark, *path))?;
                let target = unsafe { self.value_target(schema, slot, schema.data_size) }?;
                unsafe { mem::write_uint(target, schema.data_size, parsed as u64) };
            }
            SchemaKind::Uint { range } => {
                let text = scalar_text(value, mark, path)?;
                let parsed = scalar::parse_uint(text, schema.data_size, *range)
                    .map_err(|kind| error::fix_mark(error::new(kind), mark, *path))?;
                let target = unsafe { self.value_target(schema, slot, schema.data_size) }?;
                unsafe { mem::write_uint(target, schema.data_size, parsed) };
            }
            SchemaKind::Bool => {
                let text = scalar_text(value, mark, path)?;
                let parsed = scalar::parse_bool(text)
                    .map_err(|kind| error::fix_mark(error::new(kind), mark, *path))?;
                let target = unsafe { self.value_target(schema, slot, schema.data_size) }?;
                unsafe { mem::write_uint(target, schema.data_size, u64::from(parsed)) };
            }
            SchemaKind::Float => {
                let text = scalar_text(value, mark, path)?;
                let parsed = scalar::parse_float(text, schema.data_size)
                    .map_err(|kind| error::fix_mark(error::new(kind), mark, *path))?;
                if parsed != 0.0 && scalar::is_subnormal(parsed, schema.data_size) {
                    self.config.log(
                        LogLevel::Notice,
                        format_args!("sub-normal float underflow at {}", mark),
                    );
                }
                let target = unsafe { self.value_target(schema, slot, schema.data_size) }?;
                unsafe { mem::write_float(target, schema.data_size, parsed) };
            }
            SchemaKind::Enum { table } => {
                let text = scalar_text(value, mark, path)?;
                let parsed = self
                    .match_table_entry(schema, table, text)
                    .map_err(|kind| error::fix_mark(error::new(kind), mark, *path))?;
                let target = unsafe { self.value_target(schema, slot, schema.data_size) }?;
                unsafe { mem::write_uint(target, schema.data_size, parsed as u64) };
            }
            SchemaKind::String { min, max } => {
                let text = scalar_text(value, mark, path)?;
                unsafe { self.parse_string(schema, *min, *max, text, slot, mark, path) }?;
            }
            SchemaKind::Binary { min, max } => {
                unsafe {
                    self.parse_binary(schema, *min, *max, value, slot, count_slot, mark, path)
                }?;
            }
            _ => {
                // A composite schema faced with a scalar event.
                return Err(error::fix_mark(
                    error::new(ErrorKind::InvalidValue),
                    mark,
                    *path,
                ));
            }
        }
        Ok(())
    }

    /// Enum-style lookup with the STRICT and case policy rules applied.
    fn match_table_entry(
        &self,
        schema: &Schema,
        table: &[NamedValue],
        text: &str,
    ) -> Result<i64, ErrorKind> {
        let strict = schema.flags.contains(Flags::STRICT);
        let case_insensitive = !strict && self.config.case_insensitive(schema.flags);
        match scalar::match_enum(table, text.trim(), case_insensitive) {
            Some(value) => Ok(value),
            None if strict => Err(ErrorKind::InvalidValue),
            None => scalar::parse_int(text, schema.data_size, None),
        }
    }

    unsafe fn parse_string(
        &mut self,
        schema: &Schema,
        min: usize,
        max: usize,
        text: &str,
        slot: *mut u8,
        mark: Mark,
        path: &Path<'_>,
    ) -> Result<()> {
        let chars = text.chars().count();
        if chars < min {
            return Err(error::fix_mark(
                error::new(ErrorKind::StringLengthMin),
                mark,
                *path,
            ));
        }
        if chars > max {
            return Err(error::fix_mark(
                error::new(ErrorKind::StringLengthMax),
                mark,
                *path,
            ));
        }
        let bytes = text.as_bytes();
        if schema.flags.is_pointer() {
            let target = unsafe { self.value_target(schema, slot, bytes.len() + 1) }?;
            unsafe { ptr::copy_nonoverlapping(bytes.as_ptr(), target, bytes.len()) };
        } else {
            // Multi-byte characters can outgrow a slot sized in characters.
            if bytes.len() + 1 > schema.data_size {
                return Err(error::fix_mark(
                    error::new(ErrorKind::StringLengthMax),
                    mark,
                    *path,
                ));
            }
            unsafe { ptr::copy_nonoverlapping(bytes.as_ptr(), slot, bytes.len()) };
            // The terminator is already in place: the slot arrives zeroed.
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    unsafe fn parse_binary(
        &mut self,
        schema: &Schema,
        min: usize,
        max: usize,
        value: &[u8],
        slot: *mut u8,
        count_slot: CountSlotPtr,
        mark: Mark,
        path: &Path<'_>,
    ) -> Result<()> {
        let decoded =
            base64::decode(value).map_err(|err| error::fix_mark(err, mark, *path))?;
        if decoded.len() < min {
            return Err(error::fix_mark(
                error::new(ErrorKind::StringLengthMin),
                mark,
                *path,
            ));
        }
        if decoded.len() > max {
            return Err(error::fix_mark(
                error::new(ErrorKind::StringLengthMax),
                mark,
                *path,
            ));
        }
        let target = if schema.flags.is_pointer() {
            unsafe { self.value_target(schema, slot, decoded.len()) }?
        } else {
            slot
        };
        unsafe { ptr::copy_nonoverlapping(decoded.as_ptr(), target, decoded.len()) };
        if let Some((count_ptr, count_size)) = count_slot {
            unsafe { mem::write_uint(count_ptr, count_size, decoded.len() as u64) };
        }
        Ok(())
    }

    unsafe fn parse_flags(
        &mut self,
        schema: &Schema,
        table: &[NamedValue],
        slot: *mut u8,
        path: &Path<'_>,
    ) -> Result<()> {
        let (event, mark) = self.next()?;
        match event {
            Event::SequenceStart => {}
            Event::Scalar(_) => {
                return Err(error::fix_mark(
                    error::new(ErrorKind::InvalidValue),
                    mark,
                    *path,
                ))
            }
            _ => {
                return Err(error::fix_mark(
                    error::new(ErrorKind::UnexpectedEvent),
                    mark,
                    *path,
                ))
            }
        }

        let strict = schema.flags.contains(Flags::STRICT);
        let case_insensitive = !strict && self.config.case_insensitive(schema.flags);
        let mut accumulator: u64 = 0;
        loop {
            if let (Event::SequenceEnd, _) = self.peek()? {
                self.next()?;
                break;
            }
            let (entry, entry_mark) = self.next_scalar(path)?;
            let text = scalar_text(entry, entry_mark, path)?;
            let bit = match scalar::match_enum(table, text.trim(), case_insensitive) {
                Some(value) => value as u64,
                None if strict => {
                    return Err(error::fix_mark(
                        error::new(ErrorKind::InvalidValue),
                        entry_mark,
                        *path,
                    ))
                }
                None => scalar::parse_uint(text, 8, None)
                    .map_err(|kind| error::fix_mark(error::new(kind), entry_mark, *path))?,
            };
            accumulator |= bit;
        }
        if accumulator > uint_capacity(schema.data_size) {
            return Err(error::fix_mark(
                error::new(ErrorKind::InvalidValue),
                mark,
                *path,
            ));
        }
        let target = unsafe { self.value_target(schema, slot, schema.data_size) }?;
        unsafe { mem::write_uint(target, schema.data_size, accumulator) };
        Ok(())
    }

    unsafe fn parse_bitfield(
        &mut self,
        schema: &Schema,
        defs: &[crate::schema::BitDef],
        slot: *mut u8,
        path: &Path<'_>,
    ) -> Result<()> {
        let (event, mark) = self.next()?;
        match event {
            Event::MappingStart => {}
            Event::Scalar(_) => {
                return Err(error::fix_mark(
                    error::new(ErrorKind::InvalidValue),
                    mark,
                    *path,
                ))
            }
            _ => {
                return Err(error::fix_mark(
                    error::new(ErrorKind::UnexpectedEvent),
                    mark,
                    *path,
                ))
            }
        }

        let case_insensitive = self.config.case_insensitive(schema.flags);
        let mut accumulator: u64 = 0;
        loop {
            if let (Event::MappingEnd, _) = self.peek()? {
                self.next()?;
                break;
            }
            let (key, key_mark) = self.next_scalar(path)?;
            let key = scalar_text(key, key_mark, path)?;
            let def = defs
                .iter()
                .find(|def| {
                    if case_insensitive {
                        def.name.eq_ignore_ascii_case(key)
                    } else {
                        def.name == key
                    }
                })
                .ok_or_else(|| {
                    error::fix_mark(error::new(ErrorKind::InvalidKey), key_mark, *path)
                })?;
            let slice_path = Path::Map { parent: path, key };
            let (value, value_mark) = self.next_scalar(&slice_path)?;
            let text = scalar_text(value, value_mark, &slice_path)?;
            let parsed = scalar::parse_uint(text, 8, None)
                .map_err(|kind| error::fix_mark(error::new(kind), value_mark, slice_path))?;
            if def.bits < 64 && (parsed >> def.bits) != 0 {
                return Err(error::fix_mark(
                    error::new(ErrorKind::InvalidValue),
                    value_mark,
                    slice_path,
                ));
            }
            // Last value wins for a repeated key.
            accumulator = (accumulator & !def.mask()) | (parsed << def.offset);
        }
        let target = unsafe { self.value_target(schema, slot, schema.data_size) }?;
        unsafe { mem::write_uint(target, schema.data_size, accumulator) };
        Ok(())
    }

    unsafe fn parse_mapping(
        &mut self,
        schema: &Schema,
        fields: &FieldTable,
        slot: *mut u8,
        path: &Path<'_>,
    ) -> Result<()> {
        let (event, start_mark) = self.next()?;
        match event {
            Event::MappingStart => {}
            Event::Scalar(_) => {
                return Err(error::fix_mark(
                    error::new(ErrorKind::InvalidValue),
                    start_mark,
                    *path,
                ))
            }
            _ => {
                return Err(error::fix_mark(
                    error::new(ErrorKind::UnexpectedEvent),
                    start_mark,
                    *path,
                ))
            }
        }

        let target = unsafe { self.value_target(schema, slot, schema.data_size) }?;
        let case_insensitive = self.config.case_insensitive(schema.flags);
        let mut seen = vec![false; fields.len()];
        loop {
            if let (Event::MappingEnd, _) = self.peek()? {
                self.next()?;
                break;
            }
            let (key, key_mark) = self.next_scalar(path)?;
            let key = scalar_text(key, key_mark, path)?;
            let Some((index, field)) = fields.lookup(key, case_insensitive) else {
                if self.config.flags.contains(ConfigFlags::IGNORE_UNKNOWN_KEYS) {
                    if self.config.flags.contains(ConfigFlags::IGNORED_KEY_WARNING) {
                        self.config.log(
                            LogLevel::Warning,
                            format_args!("ignoring unknown key '{}' at {}", key, key_mark),
                        );
                    }
                    self.consume_node()?;
                    continue;
                }
                self.config.log(
                    LogLevel::Error,
                    format_args!("unknown key '{}' at {}", key, key_mark),
                );
                return Err(error::fix_mark(
                    error::new(ErrorKind::InvalidKey),
                    key_mark,
                    *path,
                ));
            };
            let ignore_field = matches!(field.value.kind, SchemaKind::Ignore);
            if seen[index] && !ignore_field {
                // A repeated field would leak its first value.
                return Err(error::fix_mark(
                    error::new(ErrorKind::InvalidKey),
                    key_mark,
                    *path,
                ));
            }
            seen[index] = true;
            let field_path = Path::Map {
                parent: path,
                key: &field.key,
            };
            let count_slot = self.field_count_slot(field, target, key_mark, &field_path)?;
            unsafe {
                self.parse_node(
                    &field.value,
                    target.add(field.data_offset),
                    count_slot,
                    &field_path,
                )
            }?;
        }

        for (index, field) in fields.iter().enumerate() {
            if seen[index] || matches!(field.value.kind, SchemaKind::Ignore) {
                continue;
            }
            if !field.value.flags.contains(Flags::OPTIONAL) {
                self.config.log(
                    LogLevel::Error,
                    format_args!("missing required field '{}'", field.key),
                );
                return Err(error::fix_mark(
                    error::new(ErrorKind::MappingFieldMissing),
                    start_mark,
                    *path,
                ));
            }
            unsafe { self.install_default(field, target, start_mark, path) }?;
        }
        Ok(())
    }

    /// Resolves and sanity-checks a field's count slot.
    fn field_count_slot(
        &self,
        field: &Field,
        base: *mut u8,
        mark: Mark,
        path: &Path<'_>,
    ) -> Result<CountSlotPtr> {
        let needs_count = match &field.value.kind {
            SchemaKind::Sequence { .. } => true,
            SchemaKind::Binary { min, max } => min != max,
            _ => false,
        };
        match field.count {
            Some(count) => {
                if count.size == 0 || count.size > 8 {
                    return Err(error::fix_mark(
                        error::new(ErrorKind::InvalidDataSize),
                        mark,
                        *path,
                    ));
                }
                Ok(Some((unsafe { base.add(count.offset) }, count.size)))
            }
            None if needs_count => {
                // The count would be unrecoverable for save and free.
                Err(error::fix_mark(
                    error::new(ErrorKind::InvalidDataSize),
                    mark,
                    *path,
                ))
            }
            None => Ok(None),
        }
    }

    unsafe fn install_default(
        &mut self,
        field: &Field,
        base: *mut u8,
        mark: Mark,
        path: &Path<'_>,
    ) -> Result<()> {
        let schema = &field.value;
        schema
            .check_node()
            .map_err(|kind| error::fix_mark(error::new(kind), mark, *path))?;
        let slot = unsafe { base.add(field.data_offset) };
        let missing = match field.missing {
            // The slot is already zeroed: inline values default to zero
            // and pointer slots stay null.
            None | Some(Missing::Zero) => return Ok(()),
            Some(missing) => missing,
        };
        let target = unsafe { self.value_target(schema, slot, schema.data_size) }?;
        let is_float = matches!(schema.kind, SchemaKind::Float);
        unsafe {
            match missing {
                Missing::Int(value) => {
                    if is_float {
                        mem::write_float(target, schema.data_size, value as f64);
                    } else {
                        mem::write_uint(target, schema.data_size, value as u64);
                    }
                }
                Missing::Uint(value) => {
                    if is_float {
                        mem::write_float(target, schema.data_size, value as f64);
                    } else {
                        mem::write_uint(target, schema.data_size, value);
                    }
                }
                Missing::Bool(value) => {
                    mem::write_uint(target, schema.data_size, u64::from(value));
                }
                Missing::Float(value) => {
                    if is_float {
                        mem::write_float(target, schema.data_size, value);
                    } else {
                        mem::write_uint(target, schema.data_size, value as u64);
                    }
                }
                Missing::Zero => unreachable!(),
            }
        }
        if let Some(validate) = schema.validate {
            if !unsafe { validate(target.cast_const()) } {
                return Err(error::fix_mark(
                    error::new(ErrorKind::DataValidErr),
                    mark,
                    *path,
                ));
            }
        }
        Ok(())
    }

    unsafe fn parse_sequence(
        &mut self,
        schema: &Schema,
        slot: *mut u8,
        count_slot: CountSlotPtr,
        path: &Path<'_>,
    ) -> Result<()> {
        let (event, start_mark) = self.next()?;
        match event {
            Event::SequenceStart => {}
            Event::Scalar(_) => {
                return Err(error::fix_mark(
                    error::new(ErrorKind::InvalidValue),
                    start_mark,
                    *path,
                ))
            }
            _ => {
                return Err(error::fix_mark(
                    error::new(ErrorKind::UnexpectedEvent),
                    start_mark,
                    *path,
                ))
            }
        }

        match &schema.kind {
            SchemaKind::SequenceFixed { entry, max, .. } => {
                let target = unsafe { self.value_target(schema, slot, schema.data_size) }?;
                let stride = entry.stride();
                let mut index = 0usize;
                loop {
                    let (event, mark) = self.peek()?;
                    if matches!(event, Event::SequenceEnd) {
                        self.next()?;
                        break;
                    }
                    if index >= *max {
                        return Err(error::fix_mark(
                            error::new(ErrorKind::SequenceEntriesMax),
                            mark,
                            *path,
                        ));
                    }
                    let entry_path = Path::Seq {
                        parent: path,
                        index: index as u64,
                    };
                    unsafe {
                        self.parse_node(entry, target.add(index * stride), None, &entry_path)
                    }?;
                    index += 1;
                }
                if index < *max {
                    return Err(error::fix_mark(
                        error::new(ErrorKind::SequenceEntriesMin),
                        start_mark,
                        *path,
                    ));
                }
                Ok(())
            }
            SchemaKind::Sequence { entry, min, max } => {
                let stride = entry.stride().max(1);
                let limit = match count_slot {
                    Some((_, size)) => (*max).min(count_capacity(size)),
                    None => *max,
                };
                let mut data: *mut u8 = ptr::null_mut();
                let mut capacity = 0usize;
                let mut count = 0usize;
                loop {
                    let (event, mark) = self.peek()?;
                    if matches!(event, Event::SequenceEnd) {
                        self.next()?;
                        break;
                    }
                    if count >= limit {
                        return Err(error::fix_mark(
                            error::new(ErrorKind::SequenceEntriesMax),
                            mark,
                            *path,
                        ));
                    }
                    if count == capacity {
                        let new_capacity = if capacity == 0 {
                            MIN_SEQUENCE_CAPACITY
                        } else {
                            capacity.saturating_mul(2)
                        };
                        let bytes = new_capacity
                            .checked_mul(stride)
                            .ok_or_else(|| error::new(ErrorKind::AllocFailed))?;
                        data = unsafe {
                            self.alloc.realloc_zeroed(data, capacity * stride, bytes)
                        }?;
                        capacity = new_capacity;
                        unsafe { mem::write_ptr(slot, data) };
                    }
                    let entry_path = Path::Seq {
                        parent: path,
                        index: count as u64,
                    };
                    // Count the entry before parsing it, so a failure
                    // mid-entry still gets its allocations rolled back.
                    count += 1;
                    if let Some((count_ptr, count_size)) = count_slot {
                        unsafe { mem::write_uint(count_ptr, count_size, count as u64) };
                    }
                    unsafe {
                        self.parse_node(entry, data.add((count - 1) * stride), None, &entry_path)
                    }?;
                }
                if count < *min {
                    return Err(error::fix_mark(
                        error::new(ErrorKind::SequenceEntriesMin),
                        start_mark,
                        *path,
                    ));
                }
                if capacity != count {
                    // One trailing reallocation down to the exact count.
                    data = unsafe {
                        self.alloc.realloc_zeroed(data, capacity * stride, count * stride)
                    }?;
                    unsafe { mem::write_ptr(slot, data) };
                }
                if let Some((count_ptr, count_size)) = count_slot {
                    unsafe { mem::write_uint(count_ptr, count_size, count as u64) };
                }
                Ok(())
            }
            _ => unreachable!(),
        }
    }

    /// Consumes the next scalar event, resolving aliases.
    fn next_scalar(&mut self, path: &Path<'_>) -> Result<(&'a [u8], Mark)> {
        let (event, mark) = self.next()?;
        match event {
            Event::Scalar(value) => Ok((value, mark)),
            Event::Alias(id) => {
                let saved = self.jump(*id, mark, path)?;
                let result = self.next_scalar(path);
                self.pos = saved;
                self.alias_depth -= 1;
                result
            }
            _ => Err(error::fix_mark(
                error::new(ErrorKind::UnexpectedEvent),
                mark,
                *path,
            )),
        }
    }

    /// Consumes one node of arbitrary shape without side effects.
    fn consume_node(&mut self) -> Result<()> {
        let mut depth = 0usize;
        loop {
            let (event, mark) = self.next()?;
            match event {
                Event::Alias(_) | Event::Scalar(_) | Event::Void => {}
                Event::SequenceStart | Event::MappingStart => depth += 1,
                Event::SequenceEnd | Event::MappingEnd => {
                    if depth == 0 {
                        return Err(error::new(ErrorKind::UnexpectedEvent));
                    }
                    depth -= 1;
                }
            }
            if depth == 0 {
                return Ok(());
            }
        }
    }
}

fn is_null_scalar(value: &[u8], flags: Flags) -> bool {
    if value.is_empty() {
        return true;
    }
    flags.accepts_null_token()
        && (value == b"null" || value == b"Null" || value == b"NULL" || value == b"~")
}

fn scalar_text<'v>(value: &'v [u8], mark: Mark, path: &Path<'_>) -> Result<&'v str> {
    str::from_utf8(value)
        .map_err(|_| error::fix_mark(error::new(ErrorKind::InvalidValue), mark, *path))
}

fn uint_capacity(data_size: usize) -> u64 {
    if data_size >= 8 {
        u64::MAX
    } else {
        (1u64 << (8 * data_size)) - 1
    }
}

fn count_capacity(count_size: usize) -> usize {
    if count_size >= 8 {
        usize::MAX
    } else {
        (((1u64 << (8 * count_size)) - 1) as usize).min(usize::MAX)
    }
}
