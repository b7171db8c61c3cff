// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 YamlBind, Schema-Directed YAML Marshalling for Rust. All rights reserved.

use std::{mem::MaybeUninit, ptr::NonNull};

/// An owning handle to backend state at a stable heap address.
///
/// The raw parser and emitter states hold pointers into themselves once
/// the backend has set them up, so they must never move. [`Pinned::slot`]
/// leases uninitialised storage, the caller initialises it in place
/// through the backend, and [`Pinned::adopt`] turns the slot into this
/// handle, which runs `T`'s drop glue at the same address when it goes
/// away. A slot whose initialisation failed is returned with
/// [`Pinned::discard`] instead, without being treated as a live `T`.
pub(crate) struct Pinned<T> {
    ptr: NonNull<T>,
}

impl<T> Pinned<T> {
    /// Leases uninitialised stable storage for one `T`.
    pub(crate) fn slot() -> *mut T {
        Box::into_raw(Box::new(MaybeUninit::<T>::uninit())).cast()
    }

    /// Takes ownership of a slot.
    ///
    /// # Safety
    ///
    /// `ptr` must come from [`Pinned::slot`], every field of `T` must
    /// have been written, and the slot must not be adopted twice.
    pub(crate) unsafe fn adopt(ptr: *mut T) -> Pinned<T> {
        Pinned {
            ptr: unsafe { NonNull::new_unchecked(ptr) },
        }
    }

    /// Releases a slot that never became a live `T`.
    ///
    /// # Safety
    ///
    /// `ptr` must come from [`Pinned::slot`] and must not have been
    /// adopted.
    pub(crate) unsafe fn discard(ptr: *mut T) {
        let _ = unsafe { Box::from_raw(ptr.cast::<MaybeUninit<T>>()) };
    }

    /// The stable address of the state.
    pub(crate) fn as_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }
}

impl<T> Drop for Pinned<T> {
    fn drop(&mut self) {
        let _ = unsafe { Box::from_raw(self.ptr.as_ptr()) };
    }
}
