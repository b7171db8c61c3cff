// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 YamlBind, Schema-Directed YAML Marshalling for Rust. All rights reserved.

//! Per-call configuration: logging sink, memory allocator, and behaviour
//! flags. A configuration is never mutated by the engines; independent
//! calls may run in parallel as long as each has its own configuration.

use crate::schema::Flags;
use bitflags::bitflags;
use std::{ffi::c_void, fmt, ptr};

bitflags! {
    /// Behaviour flags carried by a [`Config`].
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct ConfigFlags: u32 {
        /// Unknown mapping keys are consumed silently instead of failing.
        const IGNORE_UNKNOWN_KEYS = 1;
        /// With `IGNORE_UNKNOWN_KEYS`, log a warning per ignored key.
        const IGNORED_KEY_WARNING = 1 << 1;
        /// Ambient string comparisons are case-sensitive (the default).
        const CASE_SENSITIVE = 1 << 2;
        /// Ambient string comparisons are case-insensitive.
        const CASE_INSENSITIVE = 1 << 3;
        /// Reject aliases in the input.
        const NO_ALIAS = 1 << 4;
        /// Do not record anchors; aliases consequently fail to resolve.
        const NO_ANCHORS = 1 << 5;
        /// Emit sequences and mappings in flow form.
        const STYLE_FLOW = 1 << 6;
        /// Emit sequences and mappings in block form (the default).
        const STYLE_BLOCK = 1 << 7;
        /// Emit the explicit `---` document delimiter.
        const DOCUMENT_DELIM = 1 << 8;
    }
}

/// Diagnostic severity, lowest to highest.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// Chatty internal progress.
    Debug,
    /// Informational.
    Info,
    /// Normal but noteworthy.
    Notice,
    /// Something looks wrong but the operation continues.
    Warning,
    /// The operation failed.
    Error,
}

/// A diagnostic sink: opaque context, severity, preformatted message.
pub type LogFn = fn(ctx: *mut c_void, level: LogLevel, args: fmt::Arguments<'_>);

/// A realloc-style allocation callback.
///
/// `mem_fn(ctx, ptr, new_size)` must behave like `realloc`: a null `ptr`
/// allocates, a `new_size` of zero frees and returns null, anything else
/// resizes, preserving content up to the smaller of the old and new sizes.
/// Returning null for a non-zero `new_size` signals allocation failure.
pub type MemFn = unsafe fn(ctx: *mut c_void, ptr: *mut u8, new_size: usize) -> *mut u8;

/// The per-call configuration object.
pub struct Config {
    /// Diagnostic sink, or `None` for silence.
    pub log_fn: Option<LogFn>,
    /// Opaque pointer handed to `log_fn`.
    pub log_ctx: *mut c_void,
    /// Minimum severity forwarded to `log_fn`.
    pub log_level: LogLevel,
    /// The allocation callback. Mandatory for every operation.
    pub mem_fn: Option<MemFn>,
    /// Opaque pointer handed to `mem_fn`.
    pub mem_ctx: *mut c_void,
    /// Behaviour flags.
    pub flags: ConfigFlags,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_fn: Some(log_to_facade),
            log_ctx: ptr::null_mut(),
            log_level: LogLevel::Warning,
            mem_fn: Some(crate::mem::default_mem_fn),
            mem_ctx: ptr::null_mut(),
            flags: ConfigFlags::empty(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("log_fn", &self.log_fn.is_some())
            .field("log_ctx", &self.log_ctx)
            .field("log_level", &self.log_level)
            .field("mem_fn", &self.mem_fn.is_some())
            .field("mem_ctx", &self.mem_ctx)
            .field("flags", &self.flags)
            .finish()
    }
}

/// The default diagnostic sink: forwards to the `log` crate facade.
///
/// `Notice` maps to `log::Level::Info`; the facade has no notice level.
pub fn log_to_facade(_ctx: *mut c_void, level: LogLevel, args: fmt::Arguments<'_>) {
    match level {
        LogLevel::Debug => log::debug!("{}", args),
        LogLevel::Info | LogLevel::Notice => log::info!("{}", args),
        LogLevel::Warning => log::warn!("{}", args),
        LogLevel::Error => log::error!("{}", args),
    }
}

impl Config {
    pub(crate) fn log(&self, level: LogLevel, args: fmt::Arguments<'_>) {
        if let Some(log_fn) = self.log_fn {
            if level >= self.log_level {
                log_fn(self.log_ctx, level, args);
            }
        }
    }

    /// Resolves the effective case policy for one schema node: a node
    /// override beats the ambient configuration.
    pub(crate) fn case_insensitive(&self, node: Flags) -> bool {
        if node.contains(Flags::CASE_SENSITIVE) {
            false
        } else if node.contains(Flags::CASE_INSENSITIVE) {
            true
        } else {
            self.flags.contains(ConfigFlags::CASE_INSENSITIVE)
        }
    }
}
