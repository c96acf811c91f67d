//! Settings loading and validation tests

use flow_config::{ConfigError, ErrorClass, KeywordRole, MethodRole, SettingsLoader};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serial_test::serial;
use std::fs;
use tempfile::TempDir;

fn loader() -> SettingsLoader {
    SettingsLoader::new().without_env()
}

#[test]
fn test_empty_document_gives_english_defaults() {
    let settings = loader().load_from_str("").unwrap();
    assert_eq!(settings.keyword(KeywordRole::If), "if");
    assert_eq!(settings.keyword(KeywordRole::Otherwise), "otherwise");
    assert_eq!(settings.decimal_separator(), '.');
    assert_eq!(settings.argument_separator(), ',');
    assert_eq!(settings.symbols().quotes, vec!['"', '\'']);
    assert_eq!(settings.max_call_depth(), 200);
}

#[test]
fn test_french_table() {
    let toml = r#"
[keywords]
if = "si"
else_if = "sinon si"
else = "sinon"
do = "faire"
end = "fin"

[symbols]
decimal_separator = ","
argument_separator = ";"
quotes = ["\"", "«"]

[special_methods]
add = "__plus__"

[errors]
zero_division = "DivisionParZero"

[limits]
max_call_depth = 50
"#;
    let settings = loader().load_from_str(toml).unwrap();
    assert_eq!(settings.keyword(KeywordRole::If), "si");
    assert_eq!(settings.keyword_role("sinon si"), Some(KeywordRole::ElseIf));
    assert_eq!(settings.decimal_separator(), ',');
    assert_eq!(settings.argument_separator(), ';');
    assert_eq!(settings.symbols().quotes, vec!['"', '«']);
    assert_eq!(settings.special_method(MethodRole::Add), "__plus__");
    assert_eq!(settings.special_method(MethodRole::Subtract), "__subtract__");
    assert_eq!(
        settings.error_name(ErrorClass::ZeroDivision),
        "DivisionParZero"
    );
    assert_eq!(settings.max_call_depth(), 50);
}

#[rstest]
#[case("[keywords]\nif = \"\"")]
#[case("[keywords]\nif = \"1si\"")]
#[case("[keywords]\nwhilst = \"tant\"")]
#[case("[symbols]\ndecimal_separator = \"a\"")]
#[case("[symbols]\nquotes = []")]
#[case("[special_methods]\nadd = \"not valid\"")]
#[case("[limits]\nmax_call_depth = 0")]
fn test_invalid_values_rejected(#[case] toml: &str) {
    let err = loader().load_from_str(toml).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }), "{:?}", err);
}

#[rstest]
#[case("[keywords]\nif = \"do\"")]
#[case("[symbols]\ndecimal_separator = \",\"")]
#[case("[special_methods]\nadd = \"__subtract__\"")]
#[case("[errors]\nkey = \"IndexError\"")]
fn test_conflicting_spellings_rejected(#[case] toml: &str) {
    let err = loader().load_from_str(toml).unwrap_err();
    assert!(matches!(err, ConfigError::Conflict { .. }), "{:?}", err);
}

#[rstest]
#[case("[keywords\nif = \"si\"")]
#[case("[unknown]\nvalue = 1")]
#[case("[symbols]\nthousands = \"_\"")]
#[case("[symbols]\nquotes = [\"<<\"]")]
fn test_malformed_documents_rejected(#[case] toml: &str) {
    let err = loader().load_from_str(toml).unwrap_err();
    assert!(matches!(err, ConfigError::TomlParseError { .. }), "{:?}", err);
}

#[test]
fn test_load_from_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("custom.toml");
    fs::write(&path, "[keywords]\nreturn = \"retour\"\n").unwrap();

    let settings = loader().load_from_file(&path).unwrap();
    assert_eq!(settings.keyword(KeywordRole::Return), "retour");
}

#[test]
fn test_missing_file_is_not_found() {
    let temp = TempDir::new().unwrap();
    let err = loader()
        .load_from_file(&temp.path().join("absent.toml"))
        .unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(_)));
}

#[test]
fn test_parse_error_names_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("flow.toml");
    fs::write(&path, "not toml at all [").unwrap();

    match loader().load_from_file(&path).unwrap_err() {
        ConfigError::TomlParseError { file, .. } => assert_eq!(file, path),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_load_from_directory() {
    let temp = TempDir::new().unwrap();
    let settings = loader().load_from_directory(temp.path()).unwrap();
    assert_eq!(settings.keyword(KeywordRole::Try), "try");

    fs::write(temp.path().join("flow.toml"), "[keywords]\ntry = \"essayer\"\n").unwrap();
    let settings = loader().load_from_directory(temp.path()).unwrap();
    assert_eq!(settings.keyword(KeywordRole::Try), "essayer");
}

#[test]
#[serial]
fn test_env_overrides_apply() {
    std::env::set_var("FLOW_MAX_CALL_DEPTH", "75");
    std::env::set_var("FLOW_DECIMAL_SEPARATOR", ",");
    let result = SettingsLoader::new().load_from_str("[symbols]\nargument_separator = \";\"");
    std::env::remove_var("FLOW_MAX_CALL_DEPTH");
    std::env::remove_var("FLOW_DECIMAL_SEPARATOR");

    let settings = result.unwrap();
    assert_eq!(settings.max_call_depth(), 75);
    assert_eq!(settings.decimal_separator(), ',');
}

#[test]
#[serial]
fn test_env_override_is_revalidated() {
    // Clashes with the default argument separator
    std::env::set_var("FLOW_DECIMAL_SEPARATOR", ",");
    let result = SettingsLoader::new().load_defaults();
    std::env::remove_var("FLOW_DECIMAL_SEPARATOR");

    assert!(matches!(result, Err(ConfigError::Conflict { .. })));
}

#[test]
#[serial]
fn test_malformed_env_override() {
    std::env::set_var("FLOW_MAX_CALL_DEPTH", "deep");
    let result = SettingsLoader::new().load_defaults();
    std::env::remove_var("FLOW_MAX_CALL_DEPTH");

    assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
}
