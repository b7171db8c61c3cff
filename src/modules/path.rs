// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 YamlBind, Schema-Directed YAML Marshalling for Rust. All rights reserved.

use std::fmt::{self, Display};

/// The path to the current value in the document, like `.servers[2].port`.
///
/// Paths are built on the stack while the engines descend through the
/// schema; each frame borrows its parent. They exist purely so diagnostics
/// can say where in the document something went wrong.
#[derive(Copy, Clone, Debug)]
pub enum Path<'a> {
    /// The document root.
    Root,
    /// A sequence entry, addressed by index.
    Seq {
        /// The path of the enclosing sequence.
        parent: &'a Path<'a>,
        /// The zero-based entry index.
        index: u64,
    },
    /// A mapping field, addressed by key.
    Map {
        /// The path of the enclosing mapping.
        parent: &'a Path<'a>,
        /// The field key.
        key: &'a str,
    },
    /// A value reached through an alias expansion.
    Alias {
        /// The path of the alias reference itself.
        parent: &'a Path<'a>,
    },
}

impl Display for Path<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Path::Root => f.write_str("."),
            Path::Seq { parent, index } => {
                parent.fmt_prefix(f)?;
                write!(f, "[{}]", index)
            }
            Path::Map { parent, key } => {
                parent.fmt_prefix(f)?;
                f.write_str(key)
            }
            Path::Alias { parent } => write!(f, "{}", parent),
        }
    }
}

impl Path<'_> {
    fn fmt_prefix(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Path::Root => f.write_str("."),
            path => write!(f, "{}.", path),
        }
    }
}
