// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 YamlBind, Schema-Directed YAML Marshalling for Rust. All rights reserved.

//! The schema model: an immutable description tree the engines interpret.
//!
//! A [`Schema`] describes one value: its type, the flags governing how it
//! is stored, the number of bytes it occupies in the target, and an
//! optional validation callback. Composite schemas own their child
//! schemas, so a whole description tree is built once by the caller and
//! then shared by every load, save, copy, and free call.
//!
//! Schemas are never mutated by the engines. Structural validity is
//! checked lazily, on entry to the first operation that traverses a node;
//! the checks derive no cached state, so they are idempotent.

use crate::modules::error::ErrorKind;
use bitflags::bitflags;
use indexmap::IndexMap;
use std::mem;

/// Sentinel for an unbounded maximum length or entry count.
///
/// Permitted on strings and binary blobs only when the value is stored
/// behind a pointer, and on sequences freely.
pub const UNLIMITED: usize = usize::MAX;

bitflags! {
    /// Behavioural flags present on every schema node.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct Flags: u32 {
        /// Missing mapping field is not an error; a default may apply.
        const OPTIONAL = 1;
        /// The slot is an owning pointer to the value, not an inline instance.
        const POINTER = 1 << 1;
        /// As `POINTER`, and an empty scalar legally produces a null pointer.
        const POINTER_NULL = 1 << 2;
        /// As `POINTER_NULL`, and the tokens `null`, `Null`, `NULL` and `~`
        /// also produce a null pointer.
        const POINTER_NULL_STR = 1 << 3;
        /// Enum/flags reject unknown strings and match case-sensitively.
        const STRICT = 1 << 4;
        /// Override the ambient case policy to case-sensitive for this node.
        const CASE_SENSITIVE = 1 << 5;
        /// Override the ambient case policy to case-insensitive for this node.
        const CASE_INSENSITIVE = 1 << 6;
    }
}

impl Flags {
    /// The empty flag set.
    pub const DEFAULT: Flags = Flags::empty();

    /// Whether the slot stores an owning pointer.
    pub fn is_pointer(self) -> bool {
        self.intersects(Flags::POINTER | Flags::POINTER_NULL | Flags::POINTER_NULL_STR)
    }

    /// Whether a null value is legal for this slot.
    pub fn is_nullable(self) -> bool {
        self.intersects(Flags::POINTER_NULL | Flags::POINTER_NULL_STR)
    }

    /// Whether the textual null tokens also produce a null pointer.
    pub fn accepts_null_token(self) -> bool {
        self.contains(Flags::POINTER_NULL_STR)
    }
}

/// A name bound to an integer value, for enum and flag tables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamedValue {
    /// The string form.
    pub name: String,
    /// The integer value.
    pub value: i64,
}

impl NamedValue {
    /// Creates a table entry.
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        NamedValue {
            name: name.into(),
            value,
        }
    }
}

/// One named bit slice of a bitfield.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitDef {
    /// The slice name, as it appears as a mapping key.
    pub name: String,
    /// The bit offset of the slice within the backing integer.
    pub offset: u32,
    /// The slice width in bits, `1..=64`.
    pub bits: u32,
}

impl BitDef {
    /// Creates a bit slice definition.
    pub fn new(name: impl Into<String>, offset: u32, bits: u32) -> Self {
        BitDef {
            name: name.into(),
            offset,
            bits,
        }
    }

    pub(crate) fn mask(&self) -> u64 {
        if self.bits >= 64 {
            u64::MAX
        } else {
            ((1u64 << self.bits) - 1) << self.offset
        }
    }
}

/// The byte slot inside the parent structure that receives a sequence's
/// entry count or a binary blob's byte length.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CountSlot {
    /// Byte offset within the parent structure.
    pub offset: usize,
    /// Slot width in bytes, `1..=8`, host endian.
    pub size: usize,
}

/// The default installed into an `OPTIONAL` field absent from the input.
///
/// A `Zero` default leaves a pointer slot null and an inline slot zeroed;
/// any other default on a pointer slot triggers an allocation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Missing {
    /// A signed integer default.
    Int(i64),
    /// An unsigned integer default.
    Uint(u64),
    /// A boolean default.
    Bool(bool),
    /// A floating point default.
    Float(f64),
    /// All-zero: null for pointer slots, zero bytes otherwise.
    Zero,
}

/// A user-supplied predicate run after a value is fully populated.
///
/// Receives a pointer to the populated value (for pointer slots, the
/// allocation; otherwise the slot itself). Returning `false` aborts the
/// load with [`ErrorKind::DataValidErr`] and rolls everything back.
pub type ValidateFn = unsafe fn(*const u8) -> bool;

/// One field of a mapping schema.
#[derive(Clone, Debug)]
pub struct Field {
    /// The mapping key.
    pub key: String,
    /// The field's value schema.
    pub value: Schema,
    /// Byte offset of the field inside the parent structure.
    pub data_offset: usize,
    /// Where the entry count (sequences) or byte length (binary) is kept.
    pub count: Option<CountSlot>,
    /// Default for an absent `OPTIONAL` field.
    pub missing: Option<Missing>,
}

impl Field {
    /// Creates a field at the given byte offset.
    pub fn new(key: impl Into<String>, data_offset: usize, value: Schema) -> Self {
        Field {
            key: key.into(),
            value,
            data_offset,
            count: None,
            missing: None,
        }
    }

    /// Declares the count slot for a sequence or variable-size binary field.
    pub fn with_count(mut self, offset: usize, size: usize) -> Self {
        self.count = Some(CountSlot { offset, size });
        self
    }

    /// Declares the default for an `OPTIONAL` field.
    pub fn with_missing(mut self, missing: Missing) -> Self {
        self.missing = Some(missing);
        self
    }
}

/// The ordered field table of a mapping schema.
///
/// Declaration order is preserved for emission and for the order in which
/// missing-field diagnostics are raised; lookup by exact key is constant
/// time, the case-insensitive policy falls back to an ordered scan.
#[derive(Clone, Debug, Default)]
pub struct FieldTable {
    fields: IndexMap<String, Field>,
}

impl FieldTable {
    /// Builds a table from fields in declaration order.
    ///
    /// A repeated key replaces the earlier declaration.
    pub fn new(fields: Vec<Field>) -> Self {
        let mut map = IndexMap::with_capacity(fields.len());
        for field in fields {
            map.insert(field.key.clone(), field);
        }
        FieldTable { fields: map }
    }

    /// The number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates fields in declaration order.
    pub fn iter(&self) -> indexmap::map::Values<'_, String, Field> {
        self.fields.values()
    }

    pub(crate) fn lookup(&self, key: &str, case_insensitive: bool) -> Option<(usize, &Field)> {
        if case_insensitive {
            self.fields
                .values()
                .enumerate()
                .find(|(_, field)| field.key.eq_ignore_ascii_case(key))
        } else {
            self.fields.get_full(key).map(|(index, _, field)| (index, field))
        }
    }
}

/// The type-specific half of a schema node.
#[derive(Clone, Debug)]
pub enum SchemaKind {
    /// Signed integer with an optional inclusive range.
    Int {
        /// Inclusive `(min, max)` bounds, if constrained.
        range: Option<(i64, i64)>,
    },
    /// Unsigned integer with an optional inclusive range.
    Uint {
        /// Inclusive `(min, max)` bounds, if constrained.
        range: Option<(u64, u64)>,
    },
    /// Boolean.
    Bool,
    /// IEEE float (`data_size` 4) or double (`data_size` 8).
    Float,
    /// One value out of a string table.
    Enum {
        /// The string table.
        table: Vec<NamedValue>,
    },
    /// A bitwise OR over a string table, parsed from a sequence.
    Flags {
        /// The string table.
        table: Vec<NamedValue>,
    },
    /// Named bit slices packed into one integer, parsed from a mapping.
    Bitfield {
        /// The slice definitions.
        defs: Vec<BitDef>,
    },
    /// A NUL-terminated string with character-length constraints.
    String {
        /// Minimum length in characters.
        min: usize,
        /// Maximum length in characters.
        max: usize,
    },
    /// A Base64-encoded byte blob with byte-length constraints.
    Binary {
        /// Minimum length in bytes.
        min: usize,
        /// Maximum length in bytes.
        max: usize,
    },
    /// A structure with named fields.
    Mapping {
        /// The field table.
        fields: FieldTable,
    },
    /// A variable-count sequence; the count must be recoverable through a
    /// count slot or the top-level count out-value.
    Sequence {
        /// The entry schema.
        entry: Box<Schema>,
        /// Minimum entry count.
        min: usize,
        /// Maximum entry count.
        max: usize,
    },
    /// A sequence whose count is a schema constant.
    SequenceFixed {
        /// The entry schema.
        entry: Box<Schema>,
        /// Minimum entry count; must equal `max`.
        min: usize,
        /// Maximum entry count; must equal `min`.
        max: usize,
    },
    /// Consume and discard a subtree of arbitrary shape.
    Ignore,
}

/// An immutable description of one value.
#[derive(Clone, Debug)]
pub struct Schema {
    /// The type-specific description.
    pub kind: SchemaKind,
    /// Behavioural flags.
    pub flags: Flags,
    /// Bytes the value occupies in the target (meaning varies per type).
    pub data_size: usize,
    /// Optional predicate run after the value is populated.
    pub validate: Option<ValidateFn>,
}

impl Schema {
    /// A signed integer schema.
    pub fn int(flags: Flags, data_size: usize) -> Self {
        Schema {
            kind: SchemaKind::Int { range: None },
            flags,
            data_size,
            validate: None,
        }
    }

    /// A signed integer schema with inclusive bounds.
    pub fn int_range(flags: Flags, data_size: usize, min: i64, max: i64) -> Self {
        Schema {
            kind: SchemaKind::Int {
                range: Some((min, max)),
            },
            flags,
            data_size,
            validate: None,
        }
    }

    /// An unsigned integer schema.
    pub fn uint(flags: Flags, data_size: usize) -> Self {
        Schema {
            kind: SchemaKind::Uint { range: None },
            flags,
            data_size,
            validate: None,
        }
    }

    /// An unsigned integer schema with inclusive bounds.
    pub fn uint_range(flags: Flags, data_size: usize, min: u64, max: u64) -> Self {
        Schema {
            kind: SchemaKind::Uint {
                range: Some((min, max)),
            },
            flags,
            data_size,
            validate: None,
        }
    }

    /// A boolean schema.
    pub fn boolean(flags: Flags, data_size: usize) -> Self {
        Schema {
            kind: SchemaKind::Bool,
            flags,
            data_size,
            validate: None,
        }
    }

    /// A float (`data_size` 4) or double (`data_size` 8) schema.
    pub fn float(flags: Flags, data_size: usize) -> Self {
        Schema {
            kind: SchemaKind::Float,
            flags,
            data_size,
            validate: None,
        }
    }

    /// An enum schema over a string table.
    pub fn enumeration(flags: Flags, data_size: usize, table: &[(&str, i64)]) -> Self {
        Schema {
            kind: SchemaKind::Enum {
                table: table
                    .iter()
                    .map(|(name, value)| NamedValue::new(*name, *value))
                    .collect(),
            },
            flags,
            data_size,
            validate: None,
        }
    }

    /// A flag-set schema over a string table.
    pub fn flag_set(flags: Flags, data_size: usize, table: &[(&str, i64)]) -> Self {
        Schema {
            kind: SchemaKind::Flags {
                table: table
                    .iter()
                    .map(|(name, value)| NamedValue::new(*name, *value))
                    .collect(),
            },
            flags,
            data_size,
            validate: None,
        }
    }

    /// A bitfield schema over named bit slices.
    pub fn bitfield(flags: Flags, data_size: usize, defs: Vec<BitDef>) -> Self {
        Schema {
            kind: SchemaKind::Bitfield { defs },
            flags,
            data_size,
            validate: None,
        }
    }

    /// A string schema with character-length bounds.
    ///
    /// For inline storage the slot is sized to hold `max` characters plus
    /// the terminator, assuming single-byte characters; callers storing
    /// multi-byte text inline should widen `data_size` afterwards.
    pub fn string(flags: Flags, min: usize, max: usize) -> Self {
        let data_size = if flags.is_pointer() {
            0
        } else {
            max.saturating_add(1)
        };
        Schema {
            kind: SchemaKind::String { min, max },
            flags,
            data_size,
            validate: None,
        }
    }

    /// A binary blob schema with byte-length bounds.
    pub fn binary(flags: Flags, min: usize, max: usize) -> Self {
        let data_size = if flags.is_pointer() { 0 } else { max };
        Schema {
            kind: SchemaKind::Binary { min, max },
            flags,
            data_size,
            validate: None,
        }
    }

    /// A mapping schema over a structure of `data_size` bytes.
    pub fn mapping(flags: Flags, data_size: usize, fields: Vec<Field>) -> Self {
        Schema {
            kind: SchemaKind::Mapping {
                fields: FieldTable::new(fields),
            },
            flags,
            data_size,
            validate: None,
        }
    }

    /// A variable-count sequence schema.
    pub fn sequence(flags: Flags, entry: Schema, min: usize, max: usize) -> Self {
        let data_size = entry.stride();
        Schema {
            kind: SchemaKind::Sequence {
                entry: Box::new(entry),
                min,
                max,
            },
            flags,
            data_size,
            validate: None,
        }
    }

    /// A fixed-count sequence schema.
    pub fn sequence_fixed(flags: Flags, entry: Schema, count: usize) -> Self {
        let data_size = count.saturating_mul(entry.stride());
        Schema {
            kind: SchemaKind::SequenceFixed {
                entry: Box::new(entry),
                min: count,
                max: count,
            },
            flags,
            data_size,
            validate: None,
        }
    }

    /// A schema that consumes and discards a subtree.
    pub fn ignore(flags: Flags) -> Self {
        Schema {
            kind: SchemaKind::Ignore,
            flags,
            data_size: 0,
            validate: None,
        }
    }

    /// Overrides the declared data size.
    pub fn with_data_size(mut self, data_size: usize) -> Self {
        self.data_size = data_size;
        self
    }

    /// Attaches a validation callback.
    pub fn with_validate(mut self, validate: ValidateFn) -> Self {
        self.validate = Some(validate);
        self
    }

    /// Bytes one instance of this value occupies where it is stored:
    /// the pointer width for pointer slots, `data_size` otherwise.
    pub fn stride(&self) -> usize {
        if self.flags.is_pointer() {
            mem::size_of::<*mut u8>()
        } else {
            self.data_size
        }
    }

    /// Checks the structural validity of this node (children excluded).
    ///
    /// Run lazily by the engines on entry to each node; derives no cached
    /// state, so repeated runs give identical results.
    pub(crate) fn check_node(&self) -> Result<(), ErrorKind> {
        let pointer_bits = [Flags::POINTER, Flags::POINTER_NULL, Flags::POINTER_NULL_STR]
            .iter()
            .filter(|bit| self.flags.contains(**bit))
            .count();
        if pointer_bits > 1 {
            return Err(ErrorKind::BadTypeInSchema);
        }
        if self
            .flags
            .contains(Flags::CASE_SENSITIVE | Flags::CASE_INSENSITIVE)
        {
            return Err(ErrorKind::BadTypeInSchema);
        }

        match &self.kind {
            SchemaKind::Int { range } => {
                check_scalar_size(self.data_size)?;
                if let Some((min, max)) = range {
                    if min > max {
                        return Err(ErrorKind::BadMinMaxSchema);
                    }
                }
            }
            SchemaKind::Uint { range } => {
                check_scalar_size(self.data_size)?;
                if let Some((min, max)) = range {
                    if min > max {
                        return Err(ErrorKind::BadMinMaxSchema);
                    }
                }
            }
            SchemaKind::Bool | SchemaKind::Enum { .. } | SchemaKind::Flags { .. } => {
                check_scalar_size(self.data_size)?;
            }
            SchemaKind::Float => {
                if self.data_size != 4 && self.data_size != 8 {
                    return Err(ErrorKind::InvalidDataSize);
                }
            }
            SchemaKind::Bitfield { defs } => {
                check_scalar_size(self.data_size)?;
                let storage_bits = 8 * self.data_size as u64;
                let mut used: u64 = 0;
                for def in defs {
                    if def.bits < 1 || def.bits > 64 {
                        return Err(ErrorKind::BadBitvalInSchema);
                    }
                    if u64::from(def.offset) + u64::from(def.bits) > storage_bits {
                        return Err(ErrorKind::BadBitvalInSchema);
                    }
                    let mask = def.mask();
                    if used & mask != 0 {
                        return Err(ErrorKind::BadBitfield);
                    }
                    used |= mask;
                }
            }
            SchemaKind::String { min, max } => {
                if min > max {
                    return Err(ErrorKind::BadMinMaxSchema);
                }
                if !self.flags.is_pointer() {
                    if *max == UNLIMITED || self.data_size <= *max {
                        return Err(ErrorKind::InvalidDataSize);
                    }
                }
            }
            SchemaKind::Binary { min, max } => {
                if min > max {
                    return Err(ErrorKind::BadMinMaxSchema);
                }
                if !self.flags.is_pointer() && (*max == UNLIMITED || self.data_size < *max) {
                    return Err(ErrorKind::InvalidDataSize);
                }
            }
            SchemaKind::Mapping { .. } => {
                if self.data_size == 0 {
                    return Err(ErrorKind::InvalidDataSize);
                }
            }
            SchemaKind::Sequence { entry, min, max } => {
                if min > max {
                    return Err(ErrorKind::BadMinMaxSchema);
                }
                if !self.flags.is_pointer() {
                    return Err(ErrorKind::BadTypeInSchema);
                }
                if entry_needs_count(&entry.kind) {
                    // The entry's count would have nowhere to live.
                    return Err(ErrorKind::BadTypeInSchema);
                }
            }
            SchemaKind::SequenceFixed { entry, min, max } => {
                if min != max {
                    return Err(ErrorKind::SequenceFixedCount);
                }
                if entry_needs_count(&entry.kind) {
                    return Err(ErrorKind::BadTypeInSchema);
                }
                let expected = max.checked_mul(entry.stride());
                if expected != Some(self.data_size) {
                    return Err(ErrorKind::InvalidDataSize);
                }
            }
            SchemaKind::Ignore => {}
        }
        Ok(())
    }
}

fn check_scalar_size(data_size: usize) -> Result<(), ErrorKind> {
    match data_size {
        1 | 2 | 4 | 8 => Ok(()),
        _ => Err(ErrorKind::InvalidDataSize),
    }
}

/// Whether a value of this kind needs an external count to be walked
/// again later. Such values only fit where a count slot (or the
/// top-level count out-value) exists.
fn entry_needs_count(kind: &SchemaKind) -> bool {
    match kind {
        SchemaKind::Sequence { .. } => true,
        SchemaKind::Binary { min, max } => min != max,
        _ => false,
    }
}
