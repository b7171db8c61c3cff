// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 YamlBind, Schema-Directed YAML Marshalling for Rust. All rights reserved.

//! The free engine: releases everything the load engine allocated.
//!
//! The traversal mirrors the load walk and is safe on partially-built
//! graphs: the load engine zero-initialises every allocation and keeps
//! parent slots and counts current, so an unpopulated pointer slot is
//! null and is skipped harmlessly. Freed pointer slots are nulled again
//! behind the walk, which makes the free idempotent per slot.

use crate::{
    mem::{self, Alloc},
    schema::{Schema, SchemaKind},
};
use std::ptr;

/// Releases one value reachable through `slot`, recursively.
///
/// `seq_count` is the entry count when `schema` is a variable sequence
/// (recovered by the caller from the count slot or the top-level count);
/// it is ignored otherwise.
///
/// # Safety
///
/// `slot` must be valid for `schema.stride()` bytes, and the graph behind
/// it must have been produced by the load or copy engine under the same
/// schema and allocator.
pub(crate) unsafe fn free_node(alloc: &Alloc, schema: &Schema, slot: *mut u8, seq_count: u64) {
    if matches!(schema.kind, SchemaKind::Ignore) {
        // Ignore slots own no storage.
        return;
    }

    let value = if schema.flags.is_pointer() {
        let target = unsafe { mem::read_ptr(slot) };
        if target.is_null() {
            return;
        }
        target
    } else {
        slot
    };

    match &schema.kind {
        SchemaKind::Mapping { fields } => {
            for field in fields.iter() {
                let count = match field.count {
                    Some(count_slot) => unsafe {
                        mem::read_uint(value.add(count_slot.offset), count_slot.size)
                    },
                    None => 0,
                };
                unsafe { free_node(alloc, &field.value, value.add(field.data_offset), count) };
            }
        }
        SchemaKind::Sequence { entry, .. } => {
            let stride = entry.stride().max(1);
            for index in 0..seq_count as usize {
                unsafe { free_node(alloc, entry, value.add(index * stride), 0) };
            }
        }
        SchemaKind::SequenceFixed { entry, max, .. } => {
            let stride = entry.stride().max(1);
            for index in 0..*max {
                unsafe { free_node(alloc, entry, value.add(index * stride), 0) };
            }
        }
        _ => {}
    }

    if schema.flags.is_pointer() {
        unsafe {
            alloc.free(value);
            mem::write_ptr(slot, ptr::null_mut());
        }
    }
}
