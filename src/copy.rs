// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 YamlBind, Schema-Directed YAML Marshalling for Rust. All rights reserved.

//! The copy engine: deep-clones a target graph through the same
//! allocator, producing a root the free engine can release independently
//! of the original.

use crate::{
    config::Config,
    free,
    mem::{self, Alloc},
    modules::error::{self, ErrorKind, Result},
    schema::{Schema, SchemaKind},
};
use std::ptr;

/// Deep-clones a loaded graph.
///
/// # Safety
///
/// `data` must be the root of a graph laid out exactly as `schema`
/// describes, with `seq_count` its entry count when the top level is a
/// variable sequence.
pub(crate) unsafe fn copy_data(
    data: *const u8,
    seq_count: u64,
    config: &Config,
    schema: &Schema,
) -> Result<(*mut u8, u64)> {
    let alloc = Alloc::new(config)?;
    schema.check_node().map_err(error::new)?;
    if !schema.flags.is_pointer() {
        return Err(error::new(ErrorKind::BadTypeInSchema));
    }
    if data.is_null() {
        let empty_sequence =
            matches!(schema.kind, SchemaKind::Sequence { .. }) && seq_count == 0;
        if schema.flags.is_nullable() || empty_sequence {
            return Ok((ptr::null_mut(), 0));
        }
        return Err(error::new(ErrorKind::NullData));
    }

    let mut root: *mut u8 = ptr::null_mut();
    let src_slot = (&data as *const *const u8).cast::<u8>();
    let dst_slot = (&mut root as *mut *mut u8).cast::<u8>();
    match unsafe { copy_node(&alloc, schema, src_slot, dst_slot, seq_count) } {
        Ok(()) => Ok((root, seq_count)),
        Err(err) => {
            unsafe { free::free_node(&alloc, schema, dst_slot, seq_count) };
            Err(err)
        }
    }
}

unsafe fn copy_node(
    alloc: &Alloc,
    schema: &Schema,
    src_slot: *const u8,
    dst_slot: *mut u8,
    count: u64,
) -> Result<()> {
    schema.check_node().map_err(error::new)?;
    if matches!(schema.kind, SchemaKind::Ignore) {
        return Ok(());
    }

    let (src, dst) = if schema.flags.is_pointer() {
        let source = unsafe { mem::read_ptr(src_slot) }.cast_const();
        if source.is_null() {
            let empty_sequence =
                matches!(schema.kind, SchemaKind::Sequence { .. }) && count == 0;
            if schema.flags.is_nullable() || empty_sequence {
                unsafe { mem::write_ptr(dst_slot, ptr::null_mut()) };
                return Ok(());
            }
            return Err(error::new(ErrorKind::DataTargetNonNullPtrReq));
        }
        let size = match &schema.kind {
            SchemaKind::String { .. } => (unsafe { string_length(source) }) + 1,
            SchemaKind::Binary { min, max } => {
                if min == max {
                    *min
                } else {
                    count as usize
                }
            }
            SchemaKind::Sequence { entry, .. } => {
                (count as usize).saturating_mul(entry.stride().max(1))
            }
            _ => schema.data_size,
        };
        let target = unsafe { alloc.alloc_zeroed(size.max(1)) }?;
        unsafe { mem::write_ptr(dst_slot, target) };
        (source, target)
    } else {
        (src_slot, dst_slot)
    };

    match &schema.kind {
        SchemaKind::Mapping { fields } => {
            for field in fields.iter() {
                let field_count = match field.count {
                    Some(count_slot) => {
                        let stored = unsafe {
                            mem::read_uint(src.add(count_slot.offset), count_slot.size)
                        };
                        unsafe {
                            mem::write_uint(dst.add(count_slot.offset), count_slot.size, stored)
                        };
                        stored
                    }
                    None => 0,
                };
                unsafe {
                    copy_node(
                        alloc,
                        &field.value,
                        src.add(field.data_offset),
                        dst.add(field.data_offset),
                        field_count,
                    )
                }?;
            }
        }
        SchemaKind::Sequence { entry, .. } => {
            let stride = entry.stride().max(1);
            for index in 0..count as usize {
                unsafe {
                    copy_node(
                        alloc,
                        entry,
                        src.add(index * stride),
                        dst.add(index * stride),
                        0,
                    )
                }?;
            }
        }
        SchemaKind::SequenceFixed { entry, max, .. } => {
            let stride = entry.stride().max(1);
            for index in 0..*max {
                unsafe {
                    copy_node(
                        alloc,
                        entry,
                        src.add(index * stride),
                        dst.add(index * stride),
                        0,
                    )
                }?;
            }
        }
        SchemaKind::String { .. } => {
            let length = if schema.flags.is_pointer() {
                unsafe { string_length(src) }
            } else {
                // The inline buffer travels whole, terminator included.
                schema.data_size.saturating_sub(1)
            };
            unsafe { ptr::copy_nonoverlapping(src, dst, length) };
        }
        SchemaKind::Binary { min, max } => {
            let length = if min == max { *min } else { count as usize };
            let length = if schema.flags.is_pointer() {
                length
            } else {
                schema.data_size
            };
            unsafe { ptr::copy_nonoverlapping(src, dst, length) };
        }
        SchemaKind::Ignore => {}
        _ => {
            unsafe { ptr::copy_nonoverlapping(src, dst, schema.data_size) };
        }
    }
    Ok(())
}

unsafe fn string_length(ptr: *const u8) -> usize {
    let mut len = 0usize;
    while unsafe { *ptr.add(len) } != 0 {
        len += 1;
    }
    len
}
