//! Property-based tests for tagged-types.
//!
//! Properties tested:
//! - Property 1: Kind Separation
//! - Property 2: Optional Acceptance
//! - Property 3: Nested Array Depth and First Failing Index
//! - Property 4: Codec Round-Trip
//! - Property 5: Keyed Collection Integrity
//! - Property 6: Exhaustive Matching
//! - Property 7: Declaration Order Independence

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;

use tagged_types::{ErrorCode, Handlers, RejectionKind, TypeError, TypeRegistry, Value};

// =============================================================================
// Generators for property tests
// =============================================================================

fn arb_number() -> impl Strategy<Value = f64> {
    prop_oneof![
        (-1_000_000i64..1_000_000).prop_map(|n| n as f64),
        -1.0e6f64..1.0e6,
    ]
}

fn arb_key() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,8}"
}

fn measure() -> Arc<TypeRegistry> {
    TypeRegistry::builder()
        .record("Measure", [("label", "String"), ("value", "Number"), ("note", "String?")])
        .unwrap()
        .build()
        .unwrap()
}

fn arb_date() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..4_102_444_800_000).prop_map(|ms| Utc.timestamp_millis_opt(ms).unwrap())
}

/// JSON-shaped content for untyped fields.
fn arb_plain() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        arb_number().prop_map(Value::from),
        "[a-z ]{0,8}".prop_map(Value::from),
    ];
    leaf.prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::vec((arb_key(), inner), 0..4)
                .prop_map(|entries| Value::object(entries)),
        ]
    })
}

fn arb_plain_object() -> impl Strategy<Value = Value> {
    prop::collection::vec((arb_key(), arb_plain()), 0..4).prop_map(|entries| Value::object(entries))
}

fn reading() -> Arc<TypeRegistry> {
    TypeRegistry::builder()
        .record(
            "Reading",
            [
                ("label", "String"),
                ("at", "Date"),
                ("value", "Number"),
                ("payload", "Any"),
                ("meta", "Object?"),
                ("origin", "Point?"),
                ("trail", "[Point]"),
                ("note", "String?"),
            ],
        )
        .unwrap()
        .record("Point", [("x", "Number"), ("y", "Number")])
        .unwrap()
        .build()
        .unwrap()
}

fn point(x: f64, y: f64) -> Value {
    Value::object([("x", Value::from(x)), ("y", Value::from(y))])
}

fn inventory() -> Arc<TypeRegistry> {
    TypeRegistry::builder()
        .record("Inventory", [("items", "{Item:sku}")])
        .unwrap()
        .record("Item", [("sku", "String"), ("count", "Number")])
        .unwrap()
        .build()
        .unwrap()
}

fn item(sku: &str, count: f64) -> Value {
    Value::object([("sku", Value::from(sku)), ("count", Value::from(count))])
}

// =============================================================================
// Property 1: Kind Separation
//
// A Number field accepts every number and rejects every string, reporting
// the field by name.
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// **Property 1: Kind Separation**
    #[test]
    fn prop_kind_separation(n in arb_number(), s in "\\PC*") {
        let registry = measure();
        let measure = registry.record("Measure").unwrap();

        prop_assert!(measure.construct([Value::from("m"), Value::from(n)]).is_ok());

        let err = measure.construct([Value::from("m"), Value::from(s)]).unwrap_err();
        let rejection = err.rejection().unwrap();
        prop_assert_eq!(rejection.field(), Some("value"));
        prop_assert_eq!(rejection.kind, RejectionKind::WrongKind);
    }
}

// =============================================================================
// Property 2: Optional Acceptance
//
// An absent value is accepted exactly when the field is optional.
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// **Property 2: Optional Acceptance**
    #[test]
    fn prop_optional_acceptance(label in "\\PC*", n in arb_number(), with_note in any::<bool>()) {
        let registry = measure();
        let measure = registry.record("Measure").unwrap();

        let note = with_note.then(|| Value::from("noted"));
        let m = measure
            .construct([Some(Value::from(label.as_str())), Some(Value::from(n)), note])
            .unwrap();
        prop_assert_eq!(m.contains("note"), with_note);

        let err = measure.construct([Some(Value::from(label)), None]).unwrap_err();
        prop_assert_eq!(err.rejection().unwrap().kind, RejectionKind::Missing);
    }
}

// =============================================================================
// Property 3: Nested Array Depth and First Failing Index
//
// A sequence nested exactly `depth` levels deep is accepted; a single bad
// element is reported at its own index.
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// **Property 3: Nested Array Depth and First Failing Index**
    #[test]
    fn prop_nested_array_depth(
        depth in 1usize..4,
        len in 1usize..6,
        bad in any::<prop::sample::Index>(),
    ) {
        let expression = format!("{}Number{}", "[".repeat(depth), "]".repeat(depth));
        let registry = TypeRegistry::builder()
            .record("Tensor", [("data", expression.as_str())])
            .unwrap()
            .build()
            .unwrap();
        let tensor = registry.record("Tensor").unwrap();

        // `len` numbers at the innermost level, wrapped in single-element arrays
        let wrap = |mut value: Value| {
            for _ in 1..depth {
                value = Value::Array(vec![value]);
            }
            value
        };
        let numbers: Vec<Value> = (0..len).map(|i| Value::from(i as f64)).collect();
        prop_assert!(tensor.construct([wrap(Value::Array(numbers.clone()))]).is_ok());

        let bad = bad.index(len);
        let mut broken = numbers;
        broken[bad] = Value::from("nope");
        let err = tensor.construct([wrap(Value::Array(broken))]).unwrap_err();

        let expected_path = format!("data{}[{bad}]", "[0]".repeat(depth - 1));
        prop_assert_eq!(err.rejection().unwrap().path.to_string(), expected_path);
    }
}

// =============================================================================
// Property 4: Codec Round-Trip
//
// Decoding an encoded instance yields an equal instance, across dates,
// untyped content, optional and nested fields.
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// **Property 4: Codec Round-Trip**
    #[test]
    fn prop_codec_round_trip(
        label in "\\PC*",
        at in arb_date(),
        n in arb_number(),
        payload in arb_plain(),
        meta in proptest::option::of(arb_plain_object()),
        origin in proptest::option::of((arb_number(), arb_number())),
        trail in prop::collection::vec((arb_number(), arb_number()), 0..4),
        note in proptest::option::of("[a-z ]{0,12}"),
    ) {
        let registry = reading();
        let reading = registry.record("Reading").unwrap();
        let r = reading
            .construct([
                Some(Value::from(label)),
                Some(Value::from(at)),
                Some(Value::from(n)),
                Some(payload),
                meta,
                origin.map(|(x, y)| point(x, y)),
                Some(Value::Array(trail.into_iter().map(|(x, y)| point(x, y)).collect())),
                note.map(Value::from),
            ])
            .unwrap();

        let encoded = reading.encode(&r).unwrap();
        let decoded = reading.decode(&encoded).unwrap();
        prop_assert_eq!(registry.render(&decoded), registry.render(&r));
        prop_assert_eq!(decoded, r);
    }
}

// =============================================================================
// Property 5: Keyed Collection Integrity
//
// A keyed collection is accepted when every key equals its member's id,
// and survives a codec round trip. Changing one member's id is reported
// at that member.
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// **Property 5: Keyed Collection Integrity**
    #[test]
    fn prop_keyed_collection_integrity(
        keys in prop::collection::btree_set(arb_key(), 1..6),
        tampered in any::<prop::sample::Index>(),
    ) {
        let registry = inventory();
        let inventory = registry.record("Inventory").unwrap();
        let keys: Vec<String> = keys.into_iter().collect();

        let members = keys.iter().map(|key| (key.clone(), item(key, 1.0)));
        let inv = inventory.construct([Value::object(members)]).unwrap();

        let encoded = inventory.encode(&inv).unwrap();
        prop_assert_eq!(encoded["items"].as_array().map(Vec::len), Some(keys.len()));
        prop_assert_eq!(inventory.decode(&encoded).unwrap(), inv);

        let tampered = &keys[tampered.index(keys.len())];
        let members = keys.iter().map(|key| {
            let id = if key == tampered { format!("{key}!") } else { key.clone() };
            (key.clone(), item(&id, 1.0))
        });
        let err = inventory.construct([Value::object(members)]).unwrap_err();
        let rejection = err.rejection().unwrap();
        prop_assert_eq!(rejection.kind, RejectionKind::KeyMismatch);
        prop_assert_eq!(rejection.path.to_string(), format!("items[{}].sku", json!(tampered)));
    }
}

// =============================================================================
// Property 6: Exhaustive Matching
//
// A match succeeds exactly when every declared variant has a handler, no
// matter which extra handlers are supplied.
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// **Property 6: Exhaustive Matching**
    #[test]
    fn prop_exhaustive_matching(
        covered in prop::collection::btree_set(0usize..4, 0..5),
        extra in prop::collection::btree_set("[A-Z][a-z]{2,6}", 0..3),
    ) {
        const VARIANTS: [&str; 4] = ["North", "East", "South", "West"];
        let registry = TypeRegistry::builder()
            .union("Heading", VARIANTS.map(|name| (name, Vec::<(&str, &str)>::new())))
            .unwrap()
            .build()
            .unwrap();
        let heading = registry.union("Heading").unwrap();
        let north = heading.variant("North").unwrap().construct(Vec::<Value>::new()).unwrap();

        let mut handlers = Handlers::new();
        for &i in &covered {
            handlers = handlers.on(VARIANTS[i], move |_| i);
        }
        for name in extra.iter().filter(|name| !VARIANTS.contains(&name.as_str())) {
            handlers = handlers.on(name.as_str(), |_| usize::MAX);
        }

        let result = heading.match_on(&north, &handlers);
        if covered.len() == VARIANTS.len() {
            prop_assert_eq!(result.unwrap(), 0);
        } else {
            let first_missing = (0..VARIANTS.len()).find(|i| !covered.contains(i)).unwrap();
            match result {
                Err(TypeError::ExhaustivenessViolation { variant, .. }) => {
                    prop_assert_eq!(variant, VARIANTS[first_missing]);
                }
                other => prop_assert!(false, "expected exhaustiveness violation, got {:?}", other),
            }
        }
    }
}

// =============================================================================
// Property 7: Declaration Order Independence
//
// Any declaration order of mutually referencing types builds the same
// registry, and the dependency order lists referenced types first.
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// **Property 7: Declaration Order Independence**
    #[test]
    fn prop_declaration_order_independence(
        order in Just(vec![0usize, 1, 2, 3]).prop_shuffle(),
    ) {
        let declarations: [(&str, Vec<(&str, &str)>); 4] = [
            ("Company", vec![("name", "String"), ("teams", "{Team:slug}")]),
            ("Team", vec![("slug", "String"), ("lead", "Person"), ("members", "[Person]")]),
            ("Person", vec![("id", "String"), ("home", "Address?")]),
            ("Address", vec![("city", "String")]),
        ];

        let mut builder = TypeRegistry::builder();
        for &i in &order {
            let (name, fields) = &declarations[i];
            builder = builder.record(name, fields.iter().copied()).unwrap();
        }
        let registry = builder.build().unwrap();

        let position = |name: &str| {
            registry.dependency_order().iter().position(|n| *n == name).unwrap()
        };
        prop_assert!(position("Team") < position("Company"));
        prop_assert!(position("Person") < position("Team"));
        prop_assert!(position("Address") < position("Person"));
        prop_assert_eq!(
            registry.record("Company").unwrap().signature(),
            "Company(name: String, teams: {Team:slug})"
        );

        let missing = TypeRegistry::builder()
            .record("Team", [("lead", "Person")])
            .unwrap()
            .build()
            .unwrap_err();
        prop_assert_eq!(missing.code(), ErrorCode::UnresolvedReference);
    }
}
