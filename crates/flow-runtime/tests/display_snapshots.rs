//! Snapshot tests for display forms

mod common;

use common::*;
use insta::assert_snapshot;

#[test]
fn snapshot_scalars() {
    assert_snapshot!(render(&eval("[null, true, 1, 1.0, 0.25, \"s\"]")), @r#"[null, true, 1, 1.0, 0.25, "s"]"#);
}

#[test]
fn snapshot_nested_containers() {
    assert_snapshot!(
        render(&eval(r#"{"list": [1, [2]], "dict": {"k": "v"}, 3: null}"#)),
        @r#"{"list": [1, [2]], "dict": {"k": "v"}, 3: null}"#
    );
}

#[test]
fn snapshot_escaped_strings() {
    assert_snapshot!(render(&eval(r#"["a\"b", "line\nbreak"]"#)), @r#"["a\"b", "line\nbreak"]"#);
}

#[test]
fn snapshot_struct() {
    let source = r#"
        module Pair(left, right = "x") do end
        Pair{[1], right = {"k": 2}}
    "#;
    assert_snapshot!(render(&eval(source)), @r#"Pair{left = [1], right = {"k": 2}}"#);
}

#[test]
fn snapshot_functions_and_modules() {
    let source = r#"
        module Tools do
            function helper() do null end
        end
        [Tools, Tools.helper, function () do 1 end]
    "#;
    assert_snapshot!(render(&eval(source)), @"[<module Tools>, <function helper>, <function anonymous>]");
}

#[test]
fn snapshot_error_value() {
    let value = flow_runtime::Flow::new().eval_lenient(r#"raise "Oops": "bad input""#);
    assert_snapshot!(render(&value), @"Oops: bad input");
}
