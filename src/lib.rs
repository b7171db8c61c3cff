// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 YamlBind, Schema-Directed YAML Marshalling for Rust. All rights reserved.

//! # YamlBind
//!
//! ## Schema-directed YAML marshalling for Rust.
//!
//! [`yamlbind`](crate) loads YAML documents directly into caller-described
//! native structures and saves them back, driven entirely by an immutable
//! *schema*: a description tree naming the type, byte layout, flags, and
//! constraints of every value. The same schema drives four pipelines that
//! share all invariants:
//!
//! - **load**: YAML events in, a fully-populated, freshly-allocated
//!   graph out, with validation and rollback on any error;
//! - **save**: a populated graph in, YAML out, in declaration order;
//! - **copy**: a deep clone through the same allocator;
//! - **free**: the matching deallocator, safe on partial graphs.
//!
//! Scalars cover signed and unsigned integers with ranges, booleans,
//! floats, enums and flag sets over string tables, packed bitfields,
//! length-bounded strings, and Base64 binary blobs. Composites cover
//! mappings (structs), variable and fixed-count sequences, and an ignore
//! type that discards a subtree. Anchors and aliases are honoured with
//! last-definition-wins semantics.
//!
//! Memory comes from a realloc-style callback in the [`Config`] (the C
//! heap by default), so every byte the loader allocates is accounted for
//! and [`free`] releases exactly that set. Diagnostics flow through a
//! levelled callback defaulting to the `log` facade.
//!
//! ## Example
//!
//! ```
//! use std::mem::{offset_of, size_of};
//! use yamlbind::{Config, Field, Flags, Schema};
//!
//! #[repr(C)]
//! struct Target {
//!     value: i64,
//! }
//!
//! let schema = Schema::mapping(
//!     Flags::POINTER,
//!     size_of::<Target>(),
//!     vec![Field::new(
//!         "value",
//!         offset_of!(Target, value),
//!         Schema::int(Flags::DEFAULT, 8),
//!     )],
//! );
//! let config = Config::default();
//!
//! let (root, _) = yamlbind::load_str("value: 90\n", &config, &schema).unwrap();
//! let target = unsafe { &*root.cast::<Target>() };
//! assert_eq!(target.value, 90);
//! unsafe { yamlbind::free(root, 0, &config, &schema) };
//! ```

#![deny(missing_docs)]
#![allow(dangerous_implicit_autorefs)]
#![doc(html_root_url = "https://docs.rs/yamlbind")]
#![crate_name = "yamlbind"]
#![crate_type = "lib"]

use std::{borrow::Cow, fs, io::Write as _, path::Path};

pub use crate::config::{Config, ConfigFlags, LogFn, LogLevel, MemFn};
pub use crate::mem::default_mem_fn;
pub use crate::modules::error::{Error, ErrorKind, Location, Result};
pub use crate::schema::{
    BitDef, CountSlot, Field, FieldTable, Flags, Missing, NamedValue, Schema, SchemaKind,
    ValidateFn, UNLIMITED,
};

/// The `base64` module contains the lenient Base64 codec for blob values.
pub mod base64;

/// The `config` module contains the per-call configuration object.
pub mod config;

/// The `libyaml` module wraps the raw YAML parser and emitter.
pub mod libyaml;

/// The `loader` module buffers document events and resolves anchors.
pub mod loader;

/// The `modules` module contains the error taxonomy and path tracking.
pub mod modules;

/// The `schema` module contains the schema description model.
pub mod schema;

mod copy;
mod free;
mod load;
mod mem;
mod save;
mod scalar;

use modules::error as error_mod;

/// Loads the first YAML document in `input` into a freshly allocated
/// graph described by `schema`.
///
/// Returns the root allocation and, when the top level is a
/// variable-count sequence or a variable-length binary blob, its entry
/// count or byte length (zero otherwise). On any error, everything
/// allocated during the attempt has already been released and no
/// allocation is returned.
///
/// The caller owns the result and must release it with [`free`] using the
/// same configuration and schema.
pub fn load_str(input: &str, config: &Config, schema: &Schema) -> Result<(*mut u8, u64)> {
    load::load_data(Cow::Borrowed(input.as_bytes()), config, schema)
}

/// Loads the first YAML document in `input`, as [`load_str`] but from bytes.
pub fn load_slice(input: &[u8], config: &Config, schema: &Schema) -> Result<(*mut u8, u64)> {
    load::load_data(Cow::Borrowed(input), config, schema)
}

/// Loads the first YAML document in the file at `path`.
///
/// Open and read failures map to [`ErrorKind::FileOpen`].
pub fn load_file(
    path: impl AsRef<Path>,
    config: &Config,
    schema: &Schema,
) -> Result<(*mut u8, u64)> {
    let bytes = fs::read(path).map_err(error_mod::io)?;
    load::load_data(Cow::Owned(bytes), config, schema)
}

/// Serialises a loaded graph to a YAML string.
///
/// `seq_count` is the entry count when the top level of `schema` is a
/// variable-count sequence, or the byte length when it is a
/// variable-length binary blob; it is ignored otherwise.
///
/// # Safety
///
/// `data` must be the root of a graph laid out exactly as `schema`
/// describes (as produced by [`load_str`] or [`copy`] under the same
/// schema), and `seq_count` must be accurate.
pub unsafe fn save_str(
    data: *const u8,
    seq_count: u64,
    config: &Config,
    schema: &Schema,
) -> Result<String> {
    let bytes = unsafe { save_vec(data, seq_count, config, schema) }?;
    String::from_utf8(bytes).map_err(|_| error_mod::new(ErrorKind::InvalidValue))
}

/// Serialises a loaded graph to YAML bytes.
///
/// # Safety
///
/// As for [`save_str`].
pub unsafe fn save_vec(
    data: *const u8,
    seq_count: u64,
    config: &Config,
    schema: &Schema,
) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    unsafe { save::save_data(data, seq_count, config, schema, Box::new(&mut buffer)) }?;
    Ok(buffer)
}

/// Serialises a loaded graph into the file at `path`.
///
/// # Safety
///
/// As for [`save_str`].
pub unsafe fn save_file(
    path: impl AsRef<Path>,
    data: *const u8,
    seq_count: u64,
    config: &Config,
    schema: &Schema,
) -> Result<()> {
    let mut file = fs::File::create(path).map_err(error_mod::io)?;
    unsafe { save::save_data(data, seq_count, config, schema, Box::new(&mut file)) }?;
    file.flush().map_err(error_mod::io)
}

/// Releases a graph produced by [`load_str`], [`load_file`], or [`copy`].
///
/// This is the sole deallocator for engine-built graphs, and it is safe
/// to call on a partially-constructed graph. A null `data` is a no-op.
///
/// # Safety
///
/// `data` must be null or a root produced by this library under the same
/// configuration allocator and schema, not yet freed; `seq_count` must be
/// the count the producing call reported.
pub unsafe fn free(data: *mut u8, seq_count: u64, config: &Config, schema: &Schema) {
    if data.is_null() {
        return;
    }
    let alloc = match mem::Alloc::new(config) {
        Ok(alloc) => alloc,
        Err(_) => {
            config.log(
                LogLevel::Error,
                format_args!("free: configuration has no allocator"),
            );
            return;
        }
    };
    let mut root = data;
    let root_slot = (&mut root as *mut *mut u8).cast::<u8>();
    unsafe { free::free_node(&alloc, schema, root_slot, seq_count) };
}

/// Deep-clones a loaded graph through the configuration's allocator.
///
/// # Safety
///
/// As for [`save_str`]; the returned root is a new graph the caller must
/// release with [`free`].
pub unsafe fn copy(
    data: *const u8,
    seq_count: u64,
    config: &Config,
    schema: &Schema,
) -> Result<(*mut u8, u64)> {
    unsafe { copy::copy_data(data, seq_count, config, schema) }
}
