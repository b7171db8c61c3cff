// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 YamlBind, Schema-Directed YAML Marshalling for Rust. All rights reserved.

use indoc::indoc;
use std::ffi::CStr;
use std::mem::{offset_of, size_of};
use std::os::raw::c_char;
use yamlbind::{Config, ConfigFlags, ErrorKind, Field, Flags, Missing, Schema, UNLIMITED};

fn quiet_config() -> Config {
    Config {
        log_fn: None,
        ..Config::default()
    }
}

#[test]
fn test_positive_int_field() {
    #[repr(C)]
    struct Target {
        test_int: i64,
    }

    let schema = Schema::mapping(
        Flags::POINTER,
        size_of::<Target>(),
        vec![Field::new(
            "test_int",
            offset_of!(Target, test_int),
            Schema::int(Flags::DEFAULT, 8),
        )],
    );
    let config = quiet_config();
    let (root, count) = yamlbind::load_str("test_int: 90\n", &config, &schema).unwrap();
    assert_eq!(count, 0);
    let target = unsafe { &*root.cast::<Target>() };
    assert_eq!(target.test_int, 90);
    unsafe { yamlbind::free(root, 0, &config, &schema) };
}

#[test]
fn test_narrow_int_widths_and_negatives() {
    #[repr(C)]
    struct Target {
        small: i8,
        medium: i16,
        wide: i32,
    }

    let schema = Schema::mapping(
        Flags::POINTER,
        size_of::<Target>(),
        vec![
            Field::new("small", offset_of!(Target, small), Schema::int(Flags::DEFAULT, 1)),
            Field::new("medium", offset_of!(Target, medium), Schema::int(Flags::DEFAULT, 2)),
            Field::new("wide", offset_of!(Target, wide), Schema::int(Flags::DEFAULT, 4)),
        ],
    );
    let config = quiet_config();
    let input = "small: -128\nmedium: 0x7fff\nwide: -70000\n";
    let (root, _) = yamlbind::load_str(input, &config, &schema).unwrap();
    let target = unsafe { &*root.cast::<Target>() };
    assert_eq!(target.small, -128);
    assert_eq!(target.medium, 0x7fff);
    assert_eq!(target.wide, -70000);
    unsafe { yamlbind::free(root, 0, &config, &schema) };
}

#[test]
fn test_int_range_boundaries() {
    #[repr(C)]
    struct Target {
        bounded: i32,
    }

    let schema = Schema::mapping(
        Flags::POINTER,
        size_of::<Target>(),
        vec![Field::new(
            "bounded",
            offset_of!(Target, bounded),
            Schema::int_range(Flags::DEFAULT, 4, -5, 5),
        )],
    );
    let config = quiet_config();

    for (input, expected) in [("bounded: -5\n", -5), ("bounded: 5\n", 5)] {
        let (root, _) = yamlbind::load_str(input, &config, &schema).unwrap();
        let target = unsafe { &*root.cast::<Target>() };
        assert_eq!(target.bounded, expected);
        unsafe { yamlbind::free(root, 0, &config, &schema) };
    }
    for input in ["bounded: -6\n", "bounded: 6\n"] {
        let err = yamlbind::load_str(input, &config, &schema).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }
}

#[test]
fn test_uint_bool_and_float_fields() {
    #[repr(C)]
    struct Target {
        count: u32,
        enabled: u8,
        ratio: f32,
        precise: f64,
    }

    let schema = Schema::mapping(
        Flags::POINTER,
        size_of::<Target>(),
        vec![
            Field::new("count", offset_of!(Target, count), Schema::uint(Flags::DEFAULT, 4)),
            Field::new("enabled", offset_of!(Target, enabled), Schema::boolean(Flags::DEFAULT, 1)),
            Field::new("ratio", offset_of!(Target, ratio), Schema::float(Flags::DEFAULT, 4)),
            Field::new("precise", offset_of!(Target, precise), Schema::float(Flags::DEFAULT, 8)),
        ],
    );
    let config = quiet_config();
    let input = indoc! {"
        count: 0xff
        enabled: yes
        ratio: 0.5
        precise: -2.5e3
    "};
    let (root, _) = yamlbind::load_str(input, &config, &schema).unwrap();
    let target = unsafe { &*root.cast::<Target>() };
    assert_eq!(target.count, 255);
    assert_eq!(target.enabled, 1);
    assert_eq!(target.ratio, 0.5);
    assert_eq!(target.precise, -2500.0);
    unsafe { yamlbind::free(root, 0, &config, &schema) };
}

#[test]
fn test_optional_field_default() {
    #[repr(C)]
    struct Target {
        before: u64,
        test: u64,
        after: u64,
    }

    let schema = Schema::mapping(
        Flags::POINTER,
        size_of::<Target>(),
        vec![
            Field::new("before", offset_of!(Target, before), Schema::uint(Flags::DEFAULT, 8)),
            Field::new("test", offset_of!(Target, test), Schema::uint(Flags::OPTIONAL, 8))
                .with_missing(Missing::Uint(0x55)),
            Field::new("after", offset_of!(Target, after), Schema::uint(Flags::DEFAULT, 8)),
        ],
    );
    let config = quiet_config();
    let (root, _) =
        yamlbind::load_str("before: 1\nafter: 0xff\n", &config, &schema).unwrap();
    let target = unsafe { &*root.cast::<Target>() };
    assert_eq!(target.before, 1);
    assert_eq!(target.test, 0x55);
    assert_eq!(target.after, 0xff);
    unsafe { yamlbind::free(root, 0, &config, &schema) };
}

#[test]
fn test_unknown_key() {
    #[repr(C)]
    struct Target {
        key: i64,
    }

    let schema = Schema::mapping(
        Flags::POINTER,
        size_of::<Target>(),
        vec![Field::new(
            "key",
            offset_of!(Target, key),
            Schema::int(Flags::OPTIONAL, 8),
        )],
    );

    let config = quiet_config();
    let err = yamlbind::load_str("wrong_key: 2\n", &config, &schema).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidKey);

    let mut lenient = quiet_config();
    lenient.flags = ConfigFlags::IGNORE_UNKNOWN_KEYS;
    let (root, _) = yamlbind::load_str("wrong_key: 2\n", &lenient, &schema).unwrap();
    let target = unsafe { &*root.cast::<Target>() };
    assert_eq!(target.key, 0);
    unsafe { yamlbind::free(root, 0, &lenient, &schema) };

    // Structured unknown values are consumed whole.
    let input = "wrong_key:\n  nested: [1, 2]\nkey: 3\n";
    let (root, _) = yamlbind::load_str(input, &lenient, &schema).unwrap();
    let target = unsafe { &*root.cast::<Target>() };
    assert_eq!(target.key, 3);
    unsafe { yamlbind::free(root, 0, &lenient, &schema) };
}

#[test]
fn test_missing_required_field() {
    #[repr(C)]
    struct Target {
        key: i64,
    }

    let schema = Schema::mapping(
        Flags::POINTER,
        size_of::<Target>(),
        vec![Field::new(
            "key",
            offset_of!(Target, key),
            Schema::int(Flags::DEFAULT, 8),
        )],
    );
    let config = quiet_config();
    let err = yamlbind::load_str("{}\n", &config, &schema).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MappingFieldMissing);
}

#[test]
fn test_duplicate_key_rejected() {
    #[repr(C)]
    struct Target {
        key: i64,
    }

    let schema = Schema::mapping(
        Flags::POINTER,
        size_of::<Target>(),
        vec![Field::new(
            "key",
            offset_of!(Target, key),
            Schema::int(Flags::DEFAULT, 8),
        )],
    );
    let config = quiet_config();
    let err = yamlbind::load_str("key: 1\nkey: 2\n", &config, &schema).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidKey);
}

#[test]
fn test_case_insensitive_keys() {
    #[repr(C)]
    struct Target {
        some_key: i64,
    }

    let schema = Schema::mapping(
        Flags::POINTER,
        size_of::<Target>(),
        vec![Field::new(
            "some_key",
            offset_of!(Target, some_key),
            Schema::int(Flags::DEFAULT, 8),
        )],
    );

    let config = quiet_config();
    assert!(yamlbind::load_str("SOME_KEY: 4\n", &config, &schema).is_err());

    let mut insensitive = quiet_config();
    insensitive.flags = ConfigFlags::CASE_INSENSITIVE;
    let (root, _) = yamlbind::load_str("SOME_KEY: 4\n", &insensitive, &schema).unwrap();
    let target = unsafe { &*root.cast::<Target>() };
    assert_eq!(target.some_key, 4);
    unsafe { yamlbind::free(root, 0, &insensitive, &schema) };
}

#[test]
fn test_enum_field() {
    #[repr(C)]
    struct Target {
        colour: i32,
    }

    const TABLE: &[(&str, i64)] = &[("red", 1), ("green", 2), ("blue", 3)];
    let config = quiet_config();

    let schema = Schema::mapping(
        Flags::POINTER,
        size_of::<Target>(),
        vec![Field::new(
            "colour",
            offset_of!(Target, colour),
            Schema::enumeration(Flags::DEFAULT, 4, TABLE),
        )],
    );
    let (root, _) = yamlbind::load_str("colour: green\n", &config, &schema).unwrap();
    assert_eq!(unsafe { (*root.cast::<Target>()).colour }, 2);
    unsafe { yamlbind::free(root, 0, &config, &schema) };

    // Numeric fallback applies when the schema is not strict.
    let (root, _) = yamlbind::load_str("colour: 7\n", &config, &schema).unwrap();
    assert_eq!(unsafe { (*root.cast::<Target>()).colour }, 7);
    unsafe { yamlbind::free(root, 0, &config, &schema) };

    let strict = Schema::mapping(
        Flags::POINTER,
        size_of::<Target>(),
        vec![Field::new(
            "colour",
            offset_of!(Target, colour),
            Schema::enumeration(Flags::STRICT, 4, TABLE),
        )],
    );
    let err = yamlbind::load_str("colour: 7\n", &config, &strict).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidValue);
    let err = yamlbind::load_str("colour: Red\n", &config, &strict).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidValue);
}

#[test]
fn test_flags_field() {
    #[repr(C)]
    struct Target {
        test_flags: u64,
    }

    const TABLE: &[(&str, i64)] = &[
        ("first", 1),
        ("second", 2),
        ("third", 4),
        ("fourth", 8),
        ("fifth", 16),
        ("sixth", 32),
    ];
    let schema = Schema::mapping(
        Flags::POINTER,
        size_of::<Target>(),
        vec![Field::new(
            "test_flags",
            offset_of!(Target, test_flags),
            Schema::flag_set(Flags::DEFAULT, 8, TABLE),
        )],
    );
    let config = quiet_config();
    let input = indoc! {"
        test_flags:
          - second
          - fifth
          - 1024
    "};
    let (root, _) = yamlbind::load_str(input, &config, &schema).unwrap();
    assert_eq!(unsafe { (*root.cast::<Target>()).test_flags }, 1042);
    unsafe { yamlbind::free(root, 0, &config, &schema) };

    // An empty sequence yields zero.
    let (root, _) = yamlbind::load_str("test_flags: []\n", &config, &schema).unwrap();
    assert_eq!(unsafe { (*root.cast::<Target>()).test_flags }, 0);
    unsafe { yamlbind::free(root, 0, &config, &schema) };
}

#[test]
fn test_flags_must_fit_storage() {
    #[repr(C)]
    struct Target {
        test_flags: u8,
    }

    let schema = Schema::mapping(
        Flags::POINTER,
        size_of::<Target>(),
        vec![Field::new(
            "test_flags",
            offset_of!(Target, test_flags),
            Schema::flag_set(Flags::DEFAULT, 1, &[("first", 1)]),
        )],
    );
    let config = quiet_config();
    let err = yamlbind::load_str("test_flags:\n  - 1024\n", &config, &schema).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidValue);
}

#[test]
fn test_bitfield_packing() {
    use yamlbind::BitDef;

    #[repr(C)]
    struct Target {
        bits: u64,
    }

    let schema = Schema::mapping(
        Flags::POINTER,
        size_of::<Target>(),
        vec![Field::new(
            "bits",
            offset_of!(Target, bits),
            Schema::bitfield(
                Flags::DEFAULT,
                8,
                vec![
                    BitDef::new("a", 0, 3),
                    BitDef::new("b", 3, 7),
                    BitDef::new("c", 10, 32),
                    BitDef::new("d", 42, 8),
                    BitDef::new("e", 50, 14),
                ],
            ),
        )],
    );
    let config = quiet_config();
    let input = indoc! {"
        bits:
          a: 7
          b: 0x7f
          c: 0xffffffff
          d: 0xff
          e: 0x3fff
    "};
    let (root, _) = yamlbind::load_str(input, &config, &schema).unwrap();
    assert_eq!(unsafe { (*root.cast::<Target>()).bits }, u64::MAX);
    unsafe { yamlbind::free(root, 0, &config, &schema) };

    // A value wider than its slice is rejected.
    let err = yamlbind::load_str("bits:\n  a: 8\n", &config, &schema).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidValue);

    // Unknown slice names are rejected.
    let err = yamlbind::load_str("bits:\n  z: 1\n", &config, &schema).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidKey);

    // Missing slices default to zero; a repeated key keeps its last value.
    let (root, _) =
        yamlbind::load_str("bits:\n  a: 7\n  a: 1\n", &config, &schema).unwrap();
    assert_eq!(unsafe { (*root.cast::<Target>()).bits }, 1);
    unsafe { yamlbind::free(root, 0, &config, &schema) };
}

#[test]
fn test_string_fields() {
    #[repr(C)]
    struct Target {
        inline: [c_char; 16],
        heap: *mut c_char,
    }

    let schema = Schema::mapping(
        Flags::POINTER,
        size_of::<Target>(),
        vec![
            Field::new(
                "inline",
                offset_of!(Target, inline),
                Schema::string(Flags::DEFAULT, 0, 15),
            ),
            Field::new(
                "heap",
                offset_of!(Target, heap),
                Schema::string(Flags::POINTER, 0, UNLIMITED),
            ),
        ],
    );
    let config = quiet_config();
    let (root, _) =
        yamlbind::load_str("inline: hello\nheap: a much longer string\n", &config, &schema)
            .unwrap();
    let target = unsafe { &*root.cast::<Target>() };
    let inline = unsafe { CStr::from_ptr(target.inline.as_ptr()) };
    assert_eq!(inline.to_str().unwrap(), "hello");
    let heap = unsafe { CStr::from_ptr(target.heap) };
    assert_eq!(heap.to_str().unwrap(), "a much longer string");
    unsafe { yamlbind::free(root, 0, &config, &schema) };
}

#[test]
fn test_string_length_limits() {
    #[repr(C)]
    struct Target {
        name: *mut c_char,
    }

    let schema = Schema::mapping(
        Flags::POINTER,
        size_of::<Target>(),
        vec![Field::new(
            "name",
            offset_of!(Target, name),
            Schema::string(Flags::POINTER, 2, 4),
        )],
    );
    let config = quiet_config();

    let err = yamlbind::load_str("name: a\n", &config, &schema).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StringLengthMin);
    let err = yamlbind::load_str("name: abcde\n", &config, &schema).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StringLengthMax);

    for text in ["ab", "abcd"] {
        let input = format!("name: {}\n", text);
        let (root, _) = yamlbind::load_str(&input, &config, &schema).unwrap();
        let loaded = unsafe { CStr::from_ptr((*root.cast::<Target>()).name) };
        assert_eq!(loaded.to_str().unwrap(), text);
        unsafe { yamlbind::free(root, 0, &config, &schema) };
    }
}

#[test]
fn test_binary_field() {
    #[repr(C)]
    struct Target {
        blob: *mut u8,
        blob_len: u64,
    }

    let schema = Schema::mapping(
        Flags::POINTER,
        size_of::<Target>(),
        vec![Field::new(
            "blob",
            offset_of!(Target, blob),
            Schema::binary(Flags::POINTER, 0, UNLIMITED),
        )
        .with_count(offset_of!(Target, blob_len), 8)],
    );
    let config = quiet_config();
    let (root, _) = yamlbind::load_str("blob: 8J+YuA==\n", &config, &schema).unwrap();
    let target = unsafe { &*root.cast::<Target>() };
    assert_eq!(target.blob_len, 4);
    let bytes = unsafe { std::slice::from_raw_parts(target.blob, 4) };
    assert_eq!(bytes, &[0xF0, 0x9F, 0x98, 0xB8]);
    unsafe { yamlbind::free(root, 0, &config, &schema) };

    let err = yamlbind::load_str("blob: C\n", &config, &schema).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidBase64);
}

#[test]
fn test_sequence_with_count_slot() {
    #[repr(C)]
    struct Target {
        items: *mut u32,
        item_count: u64,
    }

    let schema = Schema::mapping(
        Flags::POINTER,
        size_of::<Target>(),
        vec![Field::new(
            "items",
            offset_of!(Target, items),
            Schema::sequence(Flags::POINTER, Schema::uint(Flags::DEFAULT, 4), 0, UNLIMITED),
        )
        .with_count(offset_of!(Target, item_count), 8)],
    );
    let config = quiet_config();

    let input = "items:\n  - 1\n  - 2\n  - 3\n  - 4\n  - 5\n";
    let (root, _) = yamlbind::load_str(input, &config, &schema).unwrap();
    let target = unsafe { &*root.cast::<Target>() };
    assert_eq!(target.item_count, 5);
    let items = unsafe { std::slice::from_raw_parts(target.items, 5) };
    assert_eq!(items, &[1, 2, 3, 4, 5]);
    unsafe { yamlbind::free(root, 0, &config, &schema) };

    // Empty sequences store no buffer and a zero count.
    let (root, _) = yamlbind::load_str("items: []\n", &config, &schema).unwrap();
    let target = unsafe { &*root.cast::<Target>() };
    assert_eq!(target.item_count, 0);
    assert!(target.items.is_null());
    unsafe { yamlbind::free(root, 0, &config, &schema) };
}

#[test]
fn test_sequence_entry_bounds() {
    #[repr(C)]
    struct Target {
        items: *mut u32,
        item_count: u64,
    }

    let schema = Schema::mapping(
        Flags::POINTER,
        size_of::<Target>(),
        vec![Field::new(
            "items",
            offset_of!(Target, items),
            Schema::sequence(Flags::POINTER, Schema::uint(Flags::DEFAULT, 4), 2, 3),
        )
        .with_count(offset_of!(Target, item_count), 8)],
    );
    let config = quiet_config();

    let err = yamlbind::load_str("items: [1]\n", &config, &schema).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SequenceEntriesMin);
    let err = yamlbind::load_str("items: [1, 2, 3, 4]\n", &config, &schema).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SequenceEntriesMax);
    let (root, _) = yamlbind::load_str("items: [1, 2, 3]\n", &config, &schema).unwrap();
    assert_eq!(unsafe { (*root.cast::<Target>()).item_count }, 3);
    unsafe { yamlbind::free(root, 0, &config, &schema) };
}

#[test]
fn test_fixed_sequence_inline() {
    #[repr(C)]
    struct Target {
        triple: [u32; 3],
    }

    let schema = Schema::mapping(
        Flags::POINTER,
        size_of::<Target>(),
        vec![Field::new(
            "triple",
            offset_of!(Target, triple),
            Schema::sequence_fixed(Flags::DEFAULT, Schema::uint(Flags::DEFAULT, 4), 3),
        )],
    );
    let config = quiet_config();
    let (root, _) = yamlbind::load_str("triple: [7, 8, 9]\n", &config, &schema).unwrap();
    assert_eq!(unsafe { (*root.cast::<Target>()).triple }, [7, 8, 9]);
    unsafe { yamlbind::free(root, 0, &config, &schema) };

    let err = yamlbind::load_str("triple: [7, 8]\n", &config, &schema).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SequenceEntriesMin);
    let err = yamlbind::load_str("triple: [7, 8, 9, 10]\n", &config, &schema).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SequenceEntriesMax);
}

#[test]
fn test_top_level_sequence() {
    let schema = Schema::sequence(
        Flags::POINTER,
        Schema::int(Flags::DEFAULT, 4),
        0,
        UNLIMITED,
    );
    let config = quiet_config();
    let (root, count) = yamlbind::load_str("- 10\n- 20\n- 30\n", &config, &schema).unwrap();
    assert_eq!(count, 3);
    let items = unsafe { std::slice::from_raw_parts(root.cast::<i32>(), 3) };
    assert_eq!(items, &[10, 20, 30]);
    unsafe { yamlbind::free(root, count, &config, &schema) };
}

#[test]
fn test_nested_mappings_behind_pointers() {
    #[repr(C)]
    struct Inner {
        value: u32,
    }

    #[repr(C)]
    struct Target {
        required: *mut Inner,
        optional: *mut Inner,
    }

    let inner = |flags| {
        Schema::mapping(
            flags,
            size_of::<Inner>(),
            vec![Field::new(
                "value",
                offset_of!(Inner, value),
                Schema::uint(Flags::DEFAULT, 4),
            )],
        )
    };
    let schema = Schema::mapping(
        Flags::POINTER,
        size_of::<Target>(),
        vec![
            Field::new("required", offset_of!(Target, required), inner(Flags::POINTER)),
            Field::new(
                "optional",
                offset_of!(Target, optional),
                inner(Flags::POINTER_NULL | Flags::OPTIONAL),
            ),
        ],
    );
    let config = quiet_config();

    let (root, _) =
        yamlbind::load_str("required:\n  value: 3\noptional:\n", &config, &schema).unwrap();
    let target = unsafe { &*root.cast::<Target>() };
    assert_eq!(unsafe { (*target.required).value }, 3);
    assert!(target.optional.is_null());
    unsafe { yamlbind::free(root, 0, &config, &schema) };

    let (root, _) = yamlbind::load_str("required: {value: 9}\n", &config, &schema).unwrap();
    let target = unsafe { &*root.cast::<Target>() };
    assert_eq!(unsafe { (*target.required).value }, 9);
    assert!(target.optional.is_null());
    unsafe { yamlbind::free(root, 0, &config, &schema) };
}

#[test]
fn test_null_string_tokens() {
    #[repr(C)]
    struct Target {
        plain: *mut c_char,
        tokened: *mut c_char,
    }

    let schema = Schema::mapping(
        Flags::POINTER,
        size_of::<Target>(),
        vec![
            Field::new(
                "plain",
                offset_of!(Target, plain),
                Schema::string(Flags::POINTER_NULL, 0, UNLIMITED),
            ),
            Field::new(
                "tokened",
                offset_of!(Target, tokened),
                Schema::string(Flags::POINTER_NULL_STR, 0, UNLIMITED),
            ),
        ],
    );
    let config = quiet_config();

    let (root, _) = yamlbind::load_str("plain:\ntokened: NULL\n", &config, &schema).unwrap();
    let target = unsafe { &*root.cast::<Target>() };
    assert!(target.plain.is_null());
    assert!(target.tokened.is_null());
    unsafe { yamlbind::free(root, 0, &config, &schema) };

    // Without the token flag, "null" is four ordinary characters.
    let (root, _) = yamlbind::load_str("plain: 'null'\ntokened: ~\n", &config, &schema).unwrap();
    let target = unsafe { &*root.cast::<Target>() };
    assert_eq!(
        unsafe { CStr::from_ptr(target.plain) }.to_str().unwrap(),
        "null"
    );
    assert!(target.tokened.is_null());
    unsafe { yamlbind::free(root, 0, &config, &schema) };
}

#[test]
fn test_scalar_where_composite_expected() {
    #[repr(C)]
    struct Target {
        items: *mut u32,
        item_count: u64,
    }

    let schema = Schema::mapping(
        Flags::POINTER,
        size_of::<Target>(),
        vec![Field::new(
            "items",
            offset_of!(Target, items),
            Schema::sequence(Flags::POINTER, Schema::uint(Flags::DEFAULT, 4), 0, UNLIMITED),
        )
        .with_count(offset_of!(Target, item_count), 8)],
    );
    let config = quiet_config();
    let err = yamlbind::load_str("items: 12\n", &config, &schema).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidValue);
}

#[test]
fn test_composite_where_scalar_expected() {
    #[repr(C)]
    struct Target {
        value: i64,
    }

    let schema = Schema::mapping(
        Flags::POINTER,
        size_of::<Target>(),
        vec![Field::new(
            "value",
            offset_of!(Target, value),
            Schema::int(Flags::DEFAULT, 8),
        )],
    );
    let config = quiet_config();
    let err = yamlbind::load_str("value: [1, 2]\n", &config, &schema).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnexpectedEvent);
    assert!(err.location().is_some());
}

#[test]
fn test_ignore_field() {
    #[repr(C)]
    struct Target {
        keep: i64,
    }

    let schema = Schema::mapping(
        Flags::POINTER,
        size_of::<Target>(),
        vec![
            Field::new("keep", offset_of!(Target, keep), Schema::int(Flags::DEFAULT, 8)),
            Field::new("noise", 0, Schema::ignore(Flags::DEFAULT)),
        ],
    );
    let config = quiet_config();
    let input = "noise:\n  anything: [goes, here]\nkeep: 11\n";
    let (root, _) = yamlbind::load_str(input, &config, &schema).unwrap();
    assert_eq!(unsafe { (*root.cast::<Target>()).keep }, 11);
    unsafe { yamlbind::free(root, 0, &config, &schema) };
}

#[test]
fn test_error_reports_location_and_path() {
    #[repr(C)]
    struct Target {
        value: i64,
    }

    let schema = Schema::mapping(
        Flags::POINTER,
        size_of::<Target>(),
        vec![Field::new(
            "value",
            offset_of!(Target, value),
            Schema::int(Flags::DEFAULT, 8),
        )],
    );
    let config = quiet_config();
    let err = yamlbind::load_str("value: not-a-number\n", &config, &schema).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidValue);
    let location = err.location().expect("location");
    assert_eq!(location.line(), 1);
    assert!(err.path().is_some());
    let rendered = err.to_string();
    assert!(rendered.contains("line 1"), "{}", rendered);
}

#[test]
fn test_strerror_is_static_and_stable() {
    assert_eq!(ErrorKind::InvalidValue.detail(), "invalid value");
    assert!(!ErrorKind::AllocFailed.detail().is_empty());
    assert_eq!(
        ErrorKind::InvalidValue.detail(),
        ErrorKind::InvalidValue.detail()
    );
}

#[test]
fn test_multi_document_takes_first() {
    #[repr(C)]
    struct Target {
        value: i64,
    }

    let schema = Schema::mapping(
        Flags::POINTER,
        size_of::<Target>(),
        vec![Field::new(
            "value",
            offset_of!(Target, value),
            Schema::int(Flags::DEFAULT, 8),
        )],
    );
    let config = quiet_config();
    let input = "---\nvalue: 1\n...\n---\nvalue: 2\n...\n";
    let (root, _) = yamlbind::load_str(input, &config, &schema).unwrap();
    assert_eq!(unsafe { (*root.cast::<Target>()).value }, 1);
    unsafe { yamlbind::free(root, 0, &config, &schema) };
}

#[test]
fn test_load_file_and_missing_file() {
    #[repr(C)]
    struct Target {
        value: i64,
    }

    let schema = Schema::mapping(
        Flags::POINTER,
        size_of::<Target>(),
        vec![Field::new(
            "value",
            offset_of!(Target, value),
            Schema::int(Flags::DEFAULT, 8),
        )],
    );
    let config = quiet_config();

    let path = std::env::temp_dir().join("yamlbind_test_load_file.yaml");
    std::fs::write(&path, "value: 64\n").unwrap();
    let (root, _) = yamlbind::load_file(&path, &config, &schema).unwrap();
    assert_eq!(unsafe { (*root.cast::<Target>()).value }, 64);
    unsafe { yamlbind::free(root, 0, &config, &schema) };
    std::fs::remove_file(&path).unwrap();

    let err = yamlbind::load_file("/no/such/file.yaml", &config, &schema).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FileOpen);
}
