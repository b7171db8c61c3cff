// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 YamlBind, Schema-Directed YAML Marshalling for Rust. All rights reserved.

//! Allocator-balance properties: a successful load followed by free nets
//! to zero live allocations, and a failed load rolls everything back on
//! its own.

use indoc::indoc;
use std::ffi::{c_void, CStr};
use std::mem::{offset_of, size_of};
use std::os::raw::c_char;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use yamlbind::{Config, ErrorKind, Field, Flags, Schema, UNLIMITED};

static LIVE_ALLOCATIONS: AtomicI64 = AtomicI64::new(0);
static SERIAL: Mutex<()> = Mutex::new(());

unsafe fn counting_mem_fn(_ctx: *mut c_void, ptr: *mut u8, new_size: usize) -> *mut u8 {
    if new_size == 0 {
        if !ptr.is_null() {
            LIVE_ALLOCATIONS.fetch_sub(1, Ordering::SeqCst);
            unsafe { libc::free(ptr.cast()) };
        }
        return std::ptr::null_mut();
    }
    if ptr.is_null() {
        LIVE_ALLOCATIONS.fetch_add(1, Ordering::SeqCst);
    }
    unsafe { libc::realloc(ptr.cast(), new_size).cast() }
}

fn counting_config() -> Config {
    Config {
        log_fn: None,
        mem_fn: Some(counting_mem_fn),
        ..Config::default()
    }
}

fn live() -> i64 {
    LIVE_ALLOCATIONS.load(Ordering::SeqCst)
}

#[repr(C)]
struct Entry {
    name: *mut c_char,
    values: *mut u32,
    value_count: u64,
}

#[repr(C)]
struct Nested {
    title: *mut c_char,
    entries: *mut Entry,
    entry_count: u64,
}

fn nested_schema() -> Schema {
    let entry = Schema::mapping(
        Flags::DEFAULT,
        size_of::<Entry>(),
        vec![
            Field::new(
                "name",
                offset_of!(Entry, name),
                Schema::string(Flags::POINTER, 0, UNLIMITED),
            ),
            Field::new(
                "values",
                offset_of!(Entry, values),
                Schema::sequence(Flags::POINTER, Schema::uint(Flags::DEFAULT, 4), 0, UNLIMITED),
            )
            .with_count(offset_of!(Entry, value_count), 8),
        ],
    );
    Schema::mapping(
        Flags::POINTER,
        size_of::<Nested>(),
        vec![
            Field::new(
                "title",
                offset_of!(Nested, title),
                Schema::string(Flags::POINTER, 0, UNLIMITED),
            ),
            Field::new(
                "entries",
                offset_of!(Nested, entries),
                Schema::sequence(Flags::POINTER, entry, 0, UNLIMITED),
            )
            .with_count(offset_of!(Nested, entry_count), 8),
        ],
    )
}

const NESTED_INPUT: &str = indoc! {"
    title: inventory
    entries:
    - name: bolts
      values: [1, 2, 3]
    - name: nuts
      values: []
    - name: washers
      values: [9]
"};

#[test]
fn test_free_releases_everything() {
    let _ = env_logger::builder().is_test(true).try_init();
    let _guard = SERIAL.lock().unwrap();
    let schema = nested_schema();
    let config = counting_config();

    let before = live();
    let (root, _) = yamlbind::load_str(NESTED_INPUT, &config, &schema).unwrap();
    let target = unsafe { &*root.cast::<Nested>() };
    assert_eq!(target.entry_count, 3);
    assert_eq!(
        unsafe { CStr::from_ptr(target.title) }.to_str().unwrap(),
        "inventory"
    );
    assert!(live() > before);
    unsafe { yamlbind::free(root, 0, &config, &schema) };
    assert_eq!(live(), before);
}

#[test]
fn test_failed_load_rolls_back() {
    let _guard = SERIAL.lock().unwrap();
    let schema = nested_schema();
    let config = counting_config();

    // The bad value arrives after several allocations have been made.
    let input = indoc! {"
        title: inventory
        entries:
        - name: bolts
          values: [1, 2, 3]
        - name: nuts
          values: [1, oops]
    "};
    let before = live();
    let err = yamlbind::load_str(input, &config, &schema).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidValue);
    assert_eq!(live(), before);
}

#[test]
fn test_missing_field_rolls_back() {
    let _guard = SERIAL.lock().unwrap();
    let schema = nested_schema();
    let config = counting_config();

    let input = indoc! {"
        entries:
        - name: bolts
          values: [4]
    "};
    let before = live();
    let err = yamlbind::load_str(input, &config, &schema).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MappingFieldMissing);
    assert_eq!(live(), before);
}

#[test]
fn test_validation_callback_rolls_back() {
    let _guard = SERIAL.lock().unwrap();

    unsafe fn reject_odd(value: *const u8) -> bool {
        (unsafe { *value.cast::<u32>() }) % 2 == 0
    }

    #[repr(C)]
    struct Target {
        value: u32,
    }

    let schema = Schema::mapping(
        Flags::POINTER,
        size_of::<Target>(),
        vec![Field::new(
            "value",
            offset_of!(Target, value),
            Schema::uint(Flags::DEFAULT, 4).with_validate(reject_odd),
        )],
    );
    let config = counting_config();

    let before = live();
    let err = yamlbind::load_str("value: 3\n", &config, &schema).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataValidErr);
    assert_eq!(live(), before);

    let (root, _) = yamlbind::load_str("value: 4\n", &config, &schema).unwrap();
    assert_eq!(unsafe { (*root.cast::<Target>()).value }, 4);
    unsafe { yamlbind::free(root, 0, &config, &schema) };
    assert_eq!(live(), before);
}

#[test]
fn test_copy_is_deep_and_balanced() {
    let _guard = SERIAL.lock().unwrap();
    let schema = nested_schema();
    let config = counting_config();

    let before = live();
    let (root, count) = yamlbind::load_str(NESTED_INPUT, &config, &schema).unwrap();
    let (clone, clone_count) = unsafe { yamlbind::copy(root, count, &config, &schema) }.unwrap();
    assert_eq!(count, clone_count);

    let original = unsafe { &*root.cast::<Nested>() };
    let copied = unsafe { &*clone.cast::<Nested>() };
    assert_ne!(original.title, copied.title);
    assert_eq!(
        unsafe { CStr::from_ptr(original.title) },
        unsafe { CStr::from_ptr(copied.title) }
    );
    assert_eq!(original.entry_count, copied.entry_count);
    for index in 0..original.entry_count as usize {
        let a = unsafe { &*original.entries.add(index) };
        let b = unsafe { &*copied.entries.add(index) };
        assert_eq!(
            unsafe { CStr::from_ptr(a.name) },
            unsafe { CStr::from_ptr(b.name) }
        );
        assert_eq!(a.value_count, b.value_count);
        let a_values =
            unsafe { std::slice::from_raw_parts(a.values, a.value_count as usize) };
        let b_values =
            unsafe { std::slice::from_raw_parts(b.values, b.value_count as usize) };
        assert_eq!(a_values, b_values);
    }

    // Freeing the original must leave the clone intact.
    unsafe { yamlbind::free(root, count, &config, &schema) };
    assert_eq!(
        unsafe { CStr::from_ptr(copied.title) }.to_str().unwrap(),
        "inventory"
    );
    unsafe { yamlbind::free(clone, clone_count, &config, &schema) };
    assert_eq!(live(), before);
}

#[test]
fn test_double_schema_use_is_idempotent() {
    let _guard = SERIAL.lock().unwrap();
    let schema = nested_schema();
    let config = counting_config();

    let before = live();
    for _ in 0..2 {
        let (root, _) = yamlbind::load_str(NESTED_INPUT, &config, &schema).unwrap();
        let saved = unsafe { yamlbind::save_str(root, 0, &config, &schema) }.unwrap();
        assert!(saved.contains("bolts"));
        unsafe { yamlbind::free(root, 0, &config, &schema) };
    }
    assert_eq!(live(), before);
}

#[test]
fn test_missing_allocator_is_reported() {
    let schema = nested_schema();
    let config = Config {
        log_fn: None,
        mem_fn: None,
        ..Config::default()
    };
    let err = yamlbind::load_str("title: x\nentries: []\n", &config, &schema).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NullMemFn);
}
