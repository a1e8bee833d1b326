//! Snapshot tests for rendered instances, signatures and error messages.
//!
//! These tests use insta inline snapshots to pin the exact text users see.
//! Run `cargo insta review` to review and accept snapshot changes.

use chrono::{TimeZone, Utc};
use std::sync::Arc;
use tagged_types::{EngineConfig, FormatConfig, Handlers, TypeRegistry, Value};

fn orders(max_width: usize) -> Arc<TypeRegistry> {
    let config = EngineConfig {
        format: FormatConfig {
            max_width,
            indent: 4,
        },
        ..EngineConfig::default()
    };

    TypeRegistry::builder()
        .config(config)
        .record("Order", [("id", "String"), ("lines", "[Line]"), ("placed", "Date")])
        .unwrap()
        .record("Line", [("sku", "String"), ("quantity", "Number")])
        .unwrap()
        .build()
        .unwrap()
}

fn order_values() -> [Value; 3] {
    let line = |sku: &str, quantity: i32| {
        Value::object([
            ("sku", Value::from(sku)),
            ("quantity", Value::from(quantity)),
        ])
    };
    [
        Value::from("ord_0001"),
        Value::Array(vec![line("A-1", 2), line("B-7", 1)]),
        Value::from(Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()),
    ]
}

// =============================================================================
// Rendering
// =============================================================================

#[test]
fn snapshot_render_single_line() {
    let registry = TypeRegistry::builder()
        .record("Point", [("x", "Number"), ("y", "Number")])
        .unwrap()
        .build()
        .unwrap();
    let point = registry.record("Point").unwrap();
    let p = point.construct([Value::from(1.5), Value::from(-2)]).unwrap();

    insta::assert_snapshot!(point.render(&p).unwrap(), @"Point(x: 1.5, y: -2)");
}

#[test]
fn snapshot_render_breaks_long_instance() {
    let registry = orders(80);
    let order = registry.record("Order").unwrap();
    let o = order.construct(order_values()).unwrap();

    insta::assert_snapshot!(order.render(&o).unwrap(), @r#"
    Order(
        id: "ord_0001",
        lines: [Line(sku: "A-1", quantity: 2), Line(sku: "B-7", quantity: 1)],
        placed: 2024-03-01T09:30:00.000Z
    )
    "#);
}

#[test]
fn snapshot_render_breaks_nested_groups() {
    let registry = orders(40);
    let order = registry.record("Order").unwrap();
    let o = order.construct(order_values()).unwrap();

    insta::assert_snapshot!(order.render(&o).unwrap(), @r#"
    Order(
        id: "ord_0001",
        lines: [
            Line(sku: "A-1", quantity: 2),
            Line(sku: "B-7", quantity: 1)
        ],
        placed: 2024-03-01T09:30:00.000Z
    )
    "#);
}

#[test]
fn snapshot_render_union_variant() {
    let registry = TypeRegistry::builder()
        .union(
            "Shape",
            [
                ("Circle", vec![("radius", "Number")]),
                ("Square", vec![("side", "Number")]),
            ],
        )
        .unwrap()
        .build()
        .unwrap();
    let shape = registry.union("Shape").unwrap();
    let circle = shape.variant("Circle").unwrap().construct([Value::from(1)]).unwrap();

    insta::assert_snapshot!(shape.render(&circle).unwrap(), @"Shape.Circle(radius: 1)");
}

#[test]
fn snapshot_render_keyed_collection_and_absent_optional() {
    let registry = TypeRegistry::builder()
        .record("Bank", [("name", "String"), ("motto", "String?"), ("accounts", "{Account}")])
        .unwrap()
        .record("Account", [("id", "String"), ("balance", "Number")])
        .unwrap()
        .build()
        .unwrap();
    let bank = registry.record("Bank").unwrap();
    let account = Value::object([("id", Value::from("acc-1")), ("balance", Value::from(10))]);
    let b = bank
        .construct([
            Some(Value::from("Acme")),
            None,
            Some(Value::object([("acc-1", account)])),
        ])
        .unwrap();

    insta::assert_snapshot!(bank.render(&b).unwrap(), @r#"Bank(name: "Acme", accounts: {"acc-1": Account(id: "acc-1", balance: 10)})"#);
}

// =============================================================================
// Signatures
// =============================================================================

#[test]
fn snapshot_signatures() {
    let registry = TypeRegistry::builder()
        .record(
            "Profile",
            [
                ("handle", "/^@[a-z0-9_]+$/i"),
                ("scores", "[[Number]]"),
                ("friends", "{Profile:handle}?"),
                ("since", "Date"),
            ],
        )
        .unwrap()
        .union(
            "Shape",
            [
                ("Circle", vec![("radius", "Number")]),
                ("Square", vec![("side", "Number")]),
            ],
        )
        .unwrap()
        .build()
        .unwrap();

    insta::assert_snapshot!(
        registry.record("Profile").unwrap().signature(),
        @"Profile(handle: /^@[a-z0-9_]+$/i, scores: [[Number]], friends: {Profile:handle}?, since: Date)"
    );
    insta::assert_snapshot!(
        registry.union("Shape").unwrap().signature(),
        @"Shape = Circle(radius: Number) | Square(side: Number)"
    );
    insta::assert_snapshot!(
        registry.union("Shape").unwrap().variant("Square").unwrap().signature(),
        @"Shape.Square(side: Number)"
    );
}

// =============================================================================
// Error Messages
// =============================================================================

#[test]
fn snapshot_validation_rejected_message() {
    let registry = TypeRegistry::builder()
        .record("Point", [("x", "Number"), ("y", "Number")])
        .unwrap()
        .build()
        .unwrap();
    let err = registry
        .record("Point")
        .unwrap()
        .construct([Value::from(1), Value::from("2")])
        .unwrap_err();

    insta::assert_snapshot!(err.to_string(), @r#"Point rejected at y: expected Number, got "2" (signature: Point(x: Number, y: Number))"#);
}

#[test]
fn snapshot_missing_value_message() {
    let registry = TypeRegistry::builder()
        .record("Grid", [("cells", "[[Number]]")])
        .unwrap()
        .build()
        .unwrap();
    let err = registry
        .record("Grid")
        .unwrap()
        .construct(Vec::<Value>::new())
        .unwrap_err();

    insta::assert_snapshot!(err.rejection().unwrap().to_string(), @"at cells: missing required value (expected [[Number]])");
}

#[test]
fn snapshot_key_mismatch_message() {
    let registry = TypeRegistry::builder()
        .record("Bank", [("accounts", "{Account}")])
        .unwrap()
        .record("Account", [("id", "String")])
        .unwrap()
        .build()
        .unwrap();
    let err = registry
        .record("Bank")
        .unwrap()
        .construct([Value::object([("acc_1", Value::object([("id", "acc_2")]))])])
        .unwrap_err();

    insta::assert_snapshot!(err.rejection().unwrap().to_string(), @r#"at accounts["acc_1"].id: expected "acc_1", got "acc_2""#);
}

#[test]
fn snapshot_exhaustiveness_message() {
    let registry = TypeRegistry::builder()
        .union(
            "Shape",
            [
                ("Circle", vec![("radius", "Number")]),
                ("Square", vec![("side", "Number")]),
            ],
        )
        .unwrap()
        .build()
        .unwrap();
    let shape = registry.union("Shape").unwrap();
    let circle = shape.variant("Circle").unwrap().construct([Value::from(1)]).unwrap();

    let err = shape
        .match_on(&circle, &Handlers::new().on("Circle", |_| ()))
        .unwrap_err();

    insta::assert_snapshot!(err.to_string(), @"non-exhaustive match on Shape: no handler for variant 'Square'");
}

#[test]
fn snapshot_declaration_error_messages() {
    let malformed = TypeRegistry::builder()
        .record("Grid", [("cells", "[Number")])
        .unwrap_err();
    insta::assert_snapshot!(malformed.to_string(), @"malformed field type `[Number`: unbalanced array brackets");

    let missing_id = TypeRegistry::builder()
        .record("Ledger", [("entries", "{Entry}")])
        .unwrap()
        .record("Entry", [("amount", "Number")])
        .unwrap()
        .build()
        .unwrap_err();
    insta::assert_snapshot!(missing_id.to_string(), @"no identity field 'id' on 'Entry' (required by Ledger.entries)");

    let unresolved = TypeRegistry::builder()
        .record("Pin", [("at", "Piont")])
        .unwrap()
        .build()
        .unwrap_err();
    insta::assert_snapshot!(unresolved.to_string(), @"field 'at' of Pin references undeclared type 'Piont'");
}
