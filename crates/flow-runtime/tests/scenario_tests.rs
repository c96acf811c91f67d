//! End-to-end scenarios through the public runtime

mod common;

use common::*;
use common::assert_eq;
use flow_runtime::{evaluate, Context, ErrorKind, Flow, SettingsLoader, ValueKind};
use rstest::rstest;

// ============================================================================
// Literal scenarios
// ============================================================================

#[test]
fn test_integer_addition() {
    assert_eval_integer("1 + 2", 3);
}

#[test]
fn test_string_repetition() {
    assert_eval_string(r#""ab" * 3"#, "ababab");
}

#[test]
fn test_list_concatenation_then_removal() {
    assert_eval_display("[1, 2] + [3]", "[1, 2, 3]");
    assert_eval_display("[1, 2, 3] - 0", "[2, 3]");
}

#[test]
fn test_division_by_zero_raises() {
    assert_error_kind("10 / 0", ErrorKind::ZeroDivision);
}

#[test]
fn test_try_catches_division_by_zero() {
    assert_eval_string(r#"try do 10/0 otherwise (e) do "caught" end"#, "caught");
}

#[test]
fn test_dict_display_reflects_item_assignment() {
    let source = r#"
        d = {"a": 1}
        before = core.text(d)
        d["a"] = 2
        [before, core.text(d)]
    "#;
    let value = eval(source);
    let items = value.list_items().unwrap();
    assert_eq!(items[0].as_str().as_deref(), Some(r#"{"a": 1}"#));
    assert_eq!(items[1].as_str().as_deref(), Some(r#"{"a": 2}"#));
}

#[test]
fn test_nested_mutation_invalidates_outer_display() {
    let source = r#"
        inner = [1]
        outer = {"k": inner}
        first = core.text(outer)
        inner[0] = 9
        [first, core.text(outer)]
    "#;
    let texts: Vec<String> = eval(source)
        .list_items()
        .unwrap()
        .iter()
        .map(render)
        .collect();
    assert_eq!(texts, vec![r#"{"k": [1]}"#, r#"{"k": [9]}"#]);
}

// ============================================================================
// Arithmetic
// ============================================================================

#[rstest]
#[case("7 / 2", "3.5")]
#[case("8 / 2", "4")]
#[case("0.1 + 0.2", "0.3")]
#[case("1.5 * 1.5", "2.25")]
#[case("-7 % 3", "2")]
#[case("7 % -3", "-2")]
#[case("2 ^ 10", "1024")]
#[case("2 ^ -1", "0.5")]
#[case("2 ^ 3 ^ 2", "512")]
#[case("1 + 2 * 3", "7")]
#[case("(1 + 2) * 3", "9")]
#[case("-3 + 5", "2")]
#[case("true + 1", "2")]
#[case("1.0", "1.0")]
fn test_arithmetic(#[case] source: &str, #[case] expected: &str) {
    assert_eval_display(source, expected);
}

#[test]
fn test_integer_overflow_raises() {
    assert_error_kind("9007199254740991 + 1", ErrorKind::NumberTooBig);
    assert_error_kind("9007199254740992", ErrorKind::NumberTooBig);
}

#[rstest]
#[case(r#""a" + "b""#, "ab")]
#[case(r#""n = " + 1.5"#, "n = 1.5")]
#[case(r#""banana" - "an""#, "ba")]
fn test_string_operators(#[case] source: &str, #[case] expected: &str) {
    assert_eval_string(source, expected);
}

#[test]
fn test_unsupported_operands_raise_type_error() {
    assert_error_kind(r#"[1] * "x""#, ErrorKind::Type);
    assert_error_kind("null + 1", ErrorKind::Type);
}

#[rstest]
#[case(r#""ab" * 9007199254740991"#)]
#[case("[1, 2] * 9007199254740991")]
#[case(r#""x" * 20000000"#)]
fn test_oversized_repetition_raises(#[case] source: &str) {
    assert_error_kind(source, ErrorKind::NumberTooBig);
}

#[test]
fn test_repetition_by_negative_count_is_empty() {
    assert_eval_string(r#""ab" * -2"#, "");
    assert_eval_display("[1] * 0", "[]");
}

#[test]
fn test_list_removal_out_of_range() {
    assert_error_kind("[1, 2] - 5", ErrorKind::Index);
}

#[test]
fn test_dict_operators() {
    assert_eval_display(r#"{"a": 1} + {"b": 2}"#, r#"{"a": 1, "b": 2}"#);
    assert_eval_display(r#"{"a": 1, "b": 2} - "a""#, r#"{"b": 2}"#);
    assert_error_kind(r#"{"a": 1} - "z""#, ErrorKind::Key);
}

// ============================================================================
// Comparison and logic
// ============================================================================

#[rstest]
#[case("1 == 1.0", true)]
#[case("true == 1", true)]
#[case(r#""a" < "b""#, true)]
#[case("[1, 2] == [1, 2]", true)]
#[case(r#"{"a": 1} != {"a": 2}"#, true)]
#[case("2 in [1, 2, 3]", true)]
#[case(r#""ell" in "hello""#, true)]
#[case(r#""z" in {"a": 1}"#, false)]
#[case("not 0", true)]
#[case("3 >= 4", false)]
fn test_comparisons(#[case] source: &str, #[case] expected: bool) {
    assert_eval_bool(source, expected);
}

#[test]
fn test_and_short_circuits() {
    let source = r#"
        hits = 0
        function touch() do
            hits = hits + 1
            true
        end
        result = false and touch()
        [result, hits]
    "#;
    assert_eval_display(source, "[false, 0]");
}

#[test]
fn test_or_short_circuits() {
    let source = r#"
        hits = 0
        function touch() do
            hits = hits + 1
            false
        end
        result = true or touch()
        [result, hits]
    "#;
    assert_eval_display(source, "[true, 0]");
}

#[test]
fn test_logical_operators_return_operands() {
    assert_eval_integer("0 or 5", 5);
    assert_eval_string(r#""x" and "y""#, "y");
    assert_eval_display("[] or null", "null");
}

// ============================================================================
// Control flow
// ============================================================================

#[test]
fn test_if_chain() {
    let source = r#"
        function sign(n) do
            if n < 0 do "negative" else if n == 0 do "zero" else "positive" end
        end
        [sign(-2), sign(0), sign(3)]
    "#;
    assert_eval_display(source, r#"["negative", "zero", "positive"]"#);
}

#[test]
fn test_if_without_else_is_null() {
    assert_eval_null("if false do 1 end");
}

#[test]
fn test_return_leaves_function_early() {
    let source = r#"
        function first_even(items) do
            if items[0] % 2 == 0 do return items[0] end
            "none"
        end
        [first_even([4, 1]), first_even([3])]
    "#;
    assert_eval_display(source, r#"[4, "none"]"#);
}

#[test]
fn test_raise_and_catch_binding() {
    let source = r#"
        try do
            raise "Custom": "went wrong"
        otherwise (e) do
            [e.type, e.message]
        end
    "#;
    assert_eval_display(source, r#"["Custom", "went wrong"]"#);
}

#[test]
fn test_raise_without_type_uses_error() {
    let error = eval_err(r#"raise "plain""#);
    assert_eq!(error.kind, ErrorKind::Error);
    assert_eq!(error.message, "plain");
}

#[test]
fn test_raise_keeps_non_string_payload() {
    let source = r#"
        try do raise [1, 2] otherwise (e) do e.message end
    "#;
    assert_eval_display(source, "[1, 2]");
}

#[test]
fn test_reraise_caught_error() {
    let source = r#"
        try do 1 / 0 otherwise (e) do raise e end
    "#;
    assert_error_kind(source, ErrorKind::ZeroDivision);
}

#[test]
fn test_error_carries_span() {
    let error = eval_err("x = 1\ny = x / 0");
    let span = error.span.expect("runtime errors carry a span");
    assert!(span.start > 5);
}

#[test]
fn test_undefined_name() {
    assert_error_kind("missing + 1", ErrorKind::Name);
}

// ============================================================================
// Calls and recursion
// ============================================================================

#[test]
fn test_tail_recursion_is_bounded() {
    let source = r#"
        function count(n, acc) do
            if n == 0 do acc else count(n - 1, acc + 1) end
        end
        count(100000, 0)
    "#;
    assert_eval_integer(source, 100000);
}

#[test]
fn test_non_tail_recursion_hits_depth_limit() {
    let source = r#"
        function depth(n) do
            if n == 0 do 0 else 1 + depth(n - 1) end
        end
        depth(100000)
    "#;
    let error = Flow::new().eval(source).unwrap_err();
    assert_eq!(error.kind, ErrorKind::Error);
    assert!(error.message.contains("maximum call depth"), "{}", error.message);
}

#[test]
fn test_non_tail_recursion_within_limit() {
    let source = r#"
        function depth(n) do
            if n == 0 do 0 else 1 + depth(n - 1) end
        end
        depth(150)
    "#;
    assert_eval_integer(source, 150);
}

#[test]
fn test_raised_depth_limit_does_not_exhaust_host_stack() {
    let settings = SettingsLoader::new()
        .without_env()
        .load_from_str("[limits]\nmax_call_depth = 2000\n")
        .unwrap();
    let context = Context::new(settings);
    let source = r#"
        function depth(n) do
            if n == 0 do 0 else 1 + depth(n - 1) end
        end
        depth(1000)
    "#;
    let value = evaluate(source, &context, false).unwrap();
    assert_eq!(value.as_integer(), Some(1000));
}

#[test]
fn test_configured_depth_limit() {
    let settings = SettingsLoader::new()
        .without_env()
        .load_from_str("[limits]\nmax_call_depth = 10\n")
        .unwrap();
    let context = Context::new(settings);
    let source = r#"
        function depth(n) do
            if n == 0 do 0 else 1 + depth(n - 1) end
        end
        depth(20)
    "#;
    let error = evaluate(source, &context, false).unwrap_err();
    assert_eq!(error.kind, ErrorKind::Error);
}

#[test]
fn test_closures_capture_scope() {
    let source = r#"
        function adder(n) do
            function (x) do x + n end
        end
        add_two = adder(2)
        add_two(40)
    "#;
    assert_eval_integer(source, 42);
}

#[test]
fn test_named_and_default_arguments() {
    let source = r#"
        function greet(name, greeting = "hello") do greeting + " " + name end
        [greet("ann"), greet(greeting = "hi", name = "bo")]
    "#;
    assert_eval_display(source, r#"["hello ann", "hi bo"]"#);
}

#[rstest]
#[case("function f(a) do a end; f()", "missing required argument")]
#[case("function f(a) do a end; f(1, 2)", "takes 1 argument")]
#[case("function f(a) do a end; f(b = 1)", "unexpected argument 'b'")]
#[case("function f(a) do a end; f(1, a = 2)", "got multiple values for 'a'")]
fn test_argument_binding_errors(#[case] source: &str, #[case] fragment: &str) {
    let error = eval_err(source);
    assert_eq!(error.kind, ErrorKind::Attribute);
    assert!(error.message.contains(fragment), "{}", error.message);
}

#[test]
fn test_anonymous_function_named_by_assignment() {
    assert_eval_display("f = function (x) do x end; f", "<function f>");
}

#[test]
fn test_calling_non_function() {
    assert_error_kind("x = 1; x()", ErrorKind::Type);
}

// ============================================================================
// Deep nesting
// ============================================================================

#[test]
fn test_deeply_nested_parentheses() {
    let source = format!("{}1{}", "(".repeat(5000), ")".repeat(5000));
    assert_eval_integer(&source, 1);
}

#[test]
fn test_deeply_nested_unary_signs() {
    let source = format!("{}1", "- ".repeat(1000));
    assert_eval_integer(&source, 1);
}

#[test]
fn test_deeply_nested_lists_display() {
    let source = format!("{}{}", "[".repeat(500), "]".repeat(500));
    let expected = format!("{}{}", "[".repeat(500), "]".repeat(500));
    assert_eval_display(&source, &expected);
}

// ============================================================================
// Indexing
// ============================================================================

#[rstest]
#[case("[1, 2, 3][-1]", "3")]
#[case(r#""hello"[1]"#, "\"e\"")]
#[case(r#"{"a": [1, 2]}["a"][0]"#, "1")]
fn test_indexing(#[case] source: &str, #[case] expected: &str) {
    let value = eval(source);
    let rendered = match value.kind() {
        ValueKind::String => format!("\"{}\"", render(&value)),
        _ => render(&value),
    };
    assert_eq!(rendered, expected);
}

#[test]
fn test_list_index_out_of_range() {
    assert_error_kind("[1][3]", ErrorKind::Index);
}

#[test]
fn test_missing_dict_key() {
    assert_error_kind(r#"{"a": 1}["b"]"#, ErrorKind::Key);
}

#[test]
fn test_unhashable_dict_key() {
    assert_error_kind("{[1]: 2}", ErrorKind::Type);
}

#[test]
fn test_numeric_keys_unify() {
    assert_eval_string(r#"d = {1: "one"}; d[1.0]"#, "one");
}

// ============================================================================
// Datetime literals and comments
// ============================================================================

#[test]
fn test_datetime_literal_normalizes() {
    assert_eval_string("~D[2024-01-31 10:00]", "2024-01-31T10:00:00");
}

#[test]
fn test_invalid_datetime_is_syntax_error() {
    assert_error_kind("~D[2024-13-01]", ErrorKind::Syntax);
}

#[test]
fn test_comments_are_ignored() {
    assert_eval_integer("# leading\n1 + 1 # trailing", 2);
}
