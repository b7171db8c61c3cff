// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 YamlBind, Schema-Directed YAML Marshalling for Rust. All rights reserved.

/// The `error` module contains the library's error taxonomy and error type.
pub mod error;

/// The `path` module tracks the document path for diagnostics.
pub mod path;
