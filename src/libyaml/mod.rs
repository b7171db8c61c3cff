// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 YamlBind, Schema-Directed YAML Marshalling for Rust. All rights reserved.

//! Safe wrappers around the raw YAML backend.
//!
//! The engines above this module never touch the backend directly; they
//! consume [`parser::Event`] values and produce [`emitter::Event`] values.

/// YAML emitter.
pub mod emitter;
/// Backend error and source position types.
pub mod error;
/// YAML parser.
pub mod parser;
/// Pinned-allocation utility.
mod util;
