//! Modules, structs and the operator-override protocol

mod common;

use common::*;
use common::assert_eq;
use flow_runtime::ErrorKind;
use rstest::rstest;

const VECTOR: &str = r#"
    module Vec(x, y) do
        function __add__(self, other) do
            Vec{self.x + other.x, self.y + other.y}
        end
        function __equals__(self, other) do
            self.x == other.x and self.y == other.y
        end
        function __display__(self) do
            "(" + self.x + ", " + self.y + ")"
        end
        function __length__(self) do 2 end
        function __get_item__(self, i) do
            if i == 0 do self.x else self.y end
        end
        function __negative__(self) do Vec{-self.x, -self.y} end
    end
"#;

fn with_vector(program: &str) -> String {
    format!("{}\n{}", VECTOR, program)
}

// ============================================================================
// Modules and structs
// ============================================================================

#[test]
fn test_struct_fields() {
    let source = r#"
        module Point(x, y = 0) do end
        p = Point{3}
        [p.x, p.y]
    "#;
    assert_eval_display(source, "[3, 0]");
}

#[test]
fn test_struct_display() {
    let source = r#"
        module Point(x, y) do end
        Point{1, y = 2}
    "#;
    assert_eval_display(source, "Point{x = 1, y = 2}");
}

#[test]
fn test_struct_type_name() {
    let source = r#"
        module Point(x) do end
        core.type(Point{1})
    "#;
    assert_eval_string(source, "Point");
}

#[test]
fn test_struct_field_assignment_invalidates_display() {
    let source = r#"
        module Point(x) do end
        p = Point{1}
        before = core.text(p)
        p.x = 5
        [before, core.text(p)]
    "#;
    let items = eval(source).list_items().unwrap();
    assert_eq!(render(&items[0]), "Point{x = 1}");
    assert_eq!(render(&items[1]), "Point{x = 5}");
}

#[test]
fn test_module_attributes_stay_inside() {
    let source = r#"
        module Config do
            name = "inner"
            version = 2
        end
        [Config.name, Config.version, core.length(Config)]
    "#;
    assert_eval_display(source, r#"["inner", 2, 2]"#);
}

#[test]
fn test_module_body_does_not_leak_assignments() {
    let source = r#"
        name = "outer"
        module Config do
            name = "inner"
        end
        name
    "#;
    assert_eval_string(source, "outer");
}

#[test]
fn test_nested_module_sees_sibling_bindings() {
    let source = r#"
        module Outer do
            module Inner do
                value = base * 2
            end
            base = 21
        end
        Outer.Inner.value
    "#;
    assert_eval_integer(source, 42);
}

#[test]
fn test_module_display() {
    assert_eval_display("module Tools do end", "<module Tools>");
}

#[test]
fn test_module_attribute_assignment() {
    let source = r#"
        module Counter do count = 0 end
        Counter.count = Counter.count + 1
        Counter.count
    "#;
    assert_eval_integer(source, 1);
}

#[test]
fn test_module_without_params_cannot_construct() {
    assert_error_kind("module M do end; M{}", ErrorKind::Type);
}

#[test]
fn test_missing_attribute() {
    let source = r#"
        module Point(x) do end
        Point{1}.z
    "#;
    assert_error_kind(source, ErrorKind::Attribute);
}

#[test]
fn test_module_functions_take_receiver_explicitly() {
    let source = r#"
        module Account(balance) do
            function deposit(self, amount) do
                self.balance = self.balance + amount
                self
            end
        end
        a = Account{10}
        Account.deposit(a, 5)
        a.balance
    "#;
    assert_eval_integer(source, 15);
}

// ============================================================================
// Operator overrides
// ============================================================================

#[test]
fn test_add_override_result_returned_verbatim() {
    let source = r#"
        module Weird(x) do
            function __add__(self, other) do [self.x, other] end
        end
        Weird{1} + 2
    "#;
    assert_eval_display(source, "[1, 2]");
}

#[test]
fn test_struct_without_override_raises_type_error() {
    let source = r#"
        module Plain(x) do end
        Plain{1} + 2
    "#;
    assert_error_kind(source, ErrorKind::Type);
}

#[rstest]
#[case("core.text(Vec{1, 2} + Vec{3, 4})", "(4, 6)")]
#[case("core.text(-Vec{1, 2})", "(-1, -2)")]
#[case("core.text([Vec{1, 2}])", "[(1, 2)]")]
#[case("core.text(core.length(Vec{0, 0}))", "2")]
#[case("core.text(Vec{7, 8}[1])", "8")]
#[case("core.text(Vec{1, 2} == Vec{1, 2})", "true")]
#[case("core.text(Vec{1, 2} != Vec{1, 3})", "true")]
#[case("core.text(Vec{1, 2} in [Vec{0, 0}, Vec{1, 2}])", "true")]
fn test_vector_overrides(#[case] program: &str, #[case] expected: &str) {
    assert_eval_string(&with_vector(program), expected);
}

#[test]
fn test_boolean_override() {
    let source = r#"
        module Empty() do
            function __boolean__(self) do false end
        end
        if Empty{} do "yes" else "no" end
    "#;
    assert_eval_string(source, "no");
}

#[test]
fn test_boolean_override_must_not_return_struct() {
    let source = r#"
        module Odd() do
            function __boolean__(self) do self end
        end
        not Odd{}
    "#;
    assert_error_kind(source, ErrorKind::Type);
}

#[test]
fn test_contains_override() {
    let source = r#"
        module Evens() do
            function __contains__(self, item) do item % 2 == 0 end
        end
        [4 in Evens{}, 3 in Evens{}]
    "#;
    assert_eval_display(source, "[true, false]");
}

#[test]
fn test_attribute_overrides_apply_to_non_fields() {
    let source = r#"
        module Bag(store) do
            function __get_attribute__(self, name) do self.store[name] end
            function __set_attribute__(self, name, value) do
                self.store[name] = value
            end
        end
        b = Bag{{}}
        b.color = "red"
        [b.color, core.length(b.store)]
    "#;
    assert_eval_display(source, r#"["red", 1]"#);
}

#[test]
fn test_and_override_receives_right_operand() {
    let source = r#"
        module Flag(on) do
            function __and__(self, other) do "combined " + other end
        end
        Flag{false} and "right"
    "#;
    assert_eval_string(source, "combined right");
}

#[test]
fn test_hash_override_makes_struct_keys_equal() {
    let source = r#"
        module Key(id) do
            function __hash__(self) do self.id end
        end
        d = {Key{1}: "one"}
        d[Key{1}]
    "#;
    assert_eval_string(source, "one");
}

#[test]
fn test_structs_without_hash_are_keyed_by_identity() {
    let source = r#"
        module Key(id) do end
        k = Key{1}
        d = {k: "one"}
        [d[k], Key{1} in d]
    "#;
    assert_eval_display(source, r#"["one", false]"#);
}

#[test]
fn test_set_item_override() {
    let source = r#"
        module Log(entries) do
            function __set_item__(self, key, value) do
                self.entries = self.entries + [key + "=" + value]
            end
        end
        l = Log{[]}
        l["a"] = "1"
        l.entries
    "#;
    assert_eval_display(source, r#"["a=1"]"#);
}

#[test]
fn test_override_errors_propagate() {
    let source = r#"
        module Broken(x) do
            function __subtract__(self, other) do raise "Nope": "no subtraction" end
        end
        Broken{1} - 1
    "#;
    let error = eval_err(source);
    assert_eq!(error.kind, ErrorKind::Custom("Nope".into()));
    assert_eq!(error.message, "no subtraction");
}

// ============================================================================
// Documentation
// ============================================================================

#[test]
fn test_doc_attaches_dedented_text() {
    let source = r#"
        @doc /*
            Adds one.
              Indented detail.
        */
        function inc(n) do n + 1 end
        core.doc(inc)
    "#;
    assert_eval_string(source, "Adds one.\n  Indented detail.");
}

#[test]
fn test_doc_belongs_to_value_not_binding() {
    let source = r#"
        @doc /* A number */
        x = 1 + 1
        x = x + 0
        core.doc(x)
    "#;
    assert_eval_null(source);
}
