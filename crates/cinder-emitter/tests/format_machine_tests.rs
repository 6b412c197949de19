use super::*;
use crate::test_support::*;
use cinder_types::{ClassKind, Universe};

fn constant(u: &Universe, ty: cinder_common::TypeId, name: &str) -> Value {
    let sym = u
        .enum_constants(ty)
        .unwrap()
        .into_iter()
        .find(|&c| u.symbols.name(c) == name)
        .unwrap();
    Value::Enum { ty, constant: sym }
}

#[test]
fn test_class_round_trip_keeps_field_order() {
    let mut u = Universe::new();
    let c = class_c(&mut u);
    let value = Value::aggregate(c, [("x", Value::Int(1)), ("y", Value::Int(2))]);

    let mut machine = FormatMachine::new(&mut u);
    let text = machine.write(c, &value).unwrap();
    assert_eq!(text, "{x = 1, y = 2}");

    let back = machine.read(c, &text).unwrap();
    assert_eq!(back, value);
    let Value::Aggregate { fields, .. } = back else {
        panic!("expected an aggregate");
    };
    let names: Vec<&str> = fields.keys().map(String::as_str).collect();
    assert_eq!(names, ["x", "y"]);
}

#[test]
fn test_nil_class_writes_only_nil() {
    let mut u = Universe::new();
    let c = class_c(&mut u);
    let mut machine = FormatMachine::new(&mut u);
    assert_eq!(machine.write(c, &Value::Nil).unwrap(), "nil");
}

#[test]
fn test_record_uses_parentheses() {
    let mut u = Universe::new();
    let p = point(&mut u);
    let value = Value::aggregate(p, [("x", Value::Int(3)), ("y", Value::Int(-4))]);
    let mut machine = FormatMachine::new(&mut u);
    let text = machine.write(p, &value).unwrap();
    assert_eq!(text, "(x = 3, y = -4)");
    assert_eq!(machine.read(p, &text).unwrap(), value);
}

#[test]
fn test_enum_token_converts_to_matching_constant_only() {
    let mut u = Universe::new();
    let color = color(&mut u);
    let green = constant(&u, color, "green");
    let mut machine = FormatMachine::new(&mut u);
    assert_eq!(machine.read(color, "green").unwrap(), green);
    assert_eq!(machine.write(color, &green).unwrap(), "green");

    let err = machine.read(color, "purple").unwrap_err();
    assert_eq!(
        err.as_runtime().map(|e| e.message.as_str()),
        Some("***Error: Not of Color type***")
    );
    // Matching is case-sensitive.
    assert!(machine.read(color, "Green").is_err());
}

#[test]
fn test_out_of_order_fields_fail_at_first_mismatch() {
    let mut u = Universe::new();
    let c = class_c(&mut u);
    let mut machine = FormatMachine::new(&mut u);
    let err = machine.read(c, "{y = 2, x = 1}").unwrap_err();
    let runtime = err.as_runtime().expect("runtime failure");
    assert_eq!(runtime.message, "Read of the class failed: 0");
}

#[test]
fn test_missing_delimiters_fail() {
    let mut u = Universe::new();
    let c = class_c(&mut u);
    let p = point(&mut u);
    let mut machine = FormatMachine::new(&mut u);
    assert!(machine.read(c, "x = 1, y = 2}").is_err());
    assert!(machine.read(c, "{x = 1 y = 2}").is_err());
    assert!(machine.read(c, "{x 1, y = 2}").is_err());
    assert!(machine.read(c, "{x = 1, y = 2").is_err());
    // A record never reads braces.
    assert!(machine.read(p, "{x = 1, y = 2}").is_err());
}

#[test]
fn test_whitespace_is_insignificant_on_read() {
    let mut u = Universe::new();
    let c = class_c(&mut u);
    let mut machine = FormatMachine::new(&mut u);
    let value = machine.read(c, "  {\n x=1 ,y=   2 }").unwrap();
    assert_eq!(value.field("x"), Some(&Value::Int(1)));
    assert_eq!(value.field("y"), Some(&Value::Int(2)));
}

#[test]
fn test_nested_fields_recurse_into_their_own_format() {
    let mut u = Universe::new();
    let p = point(&mut u);
    let color = color(&mut u);
    let string = u.builtins.string;
    let line = aggregate(
        &mut u,
        "Line",
        ClassKind::Value,
        &[("start", p), ("tint", color), ("label", string)],
    );
    let blue = constant(&u, color, "blue");
    let value = Value::aggregate(
        line,
        [
            ("start", Value::aggregate(p, [("x", Value::Int(1)), ("y", Value::Int(2))])),
            ("tint", blue),
            ("label", Value::Str("axis".to_string())),
        ],
    );
    let mut machine = FormatMachine::new(&mut u);
    let text = machine.write(line, &value).unwrap();
    assert_eq!(text, "(start = (x = 1, y = 2), tint = blue, label = axis)");
    assert_eq!(machine.read(line, &text).unwrap(), value);
}

#[test]
fn test_nil_field_inside_a_record_writes_nil_but_does_not_read_back() {
    let mut u = Universe::new();
    let c = class_c(&mut u);
    let holder = aggregate(&mut u, "Holder", ClassKind::Value, &[("item", c)]);
    let value = Value::aggregate(holder, [("item", Value::Nil)]);
    let mut machine = FormatMachine::new(&mut u);
    let text = machine.write(holder, &value).unwrap();
    assert_eq!(text, "(item = nil)");

    // Reading a reference field expects `{`, never the `nil` token.
    let err = machine.read(holder, &text).unwrap_err();
    assert!(matches!(err, MachineError::Runtime(_)), "{err:?}");
}

#[test]
fn test_bad_primitive_token_is_a_runtime_error() {
    let mut u = Universe::new();
    let c = class_c(&mut u);
    let mut machine = FormatMachine::new(&mut u);
    let err = machine.read(c, "{x = one, y = 2}").unwrap_err();
    assert!(matches!(err, MachineError::Runtime(_)), "{err:?}");
    assert!(err.to_string().contains("\"one\" is not a valid int"));
}
