//! Settings file schema and the resolved translation table
//!
//! [`SettingsFile`] mirrors `flow.toml` with every field optional.
//! [`Settings`] is the validated, fully-populated table the runtime reads.

use crate::roles::{ErrorClass, KeywordRole, MethodRole};
use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Raw settings as written in `flow.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsFile {
    #[serde(default)]
    pub keywords: BTreeMap<String, String>,

    #[serde(default)]
    pub symbols: SymbolsSection,

    #[serde(default)]
    pub special_methods: BTreeMap<String, String>,

    #[serde(default)]
    pub errors: BTreeMap<String, String>,

    #[serde(default)]
    pub attributes: AttributesSection,

    #[serde(default)]
    pub limits: LimitsSection,
}

/// `[symbols]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SymbolsSection {
    pub decimal_separator: Option<char>,
    pub argument_separator: Option<char>,
    pub quotes: Option<Vec<char>>,
    pub line_comment: Option<String>,
    pub doc_marker: Option<String>,
    pub datetime_sigil: Option<char>,
    pub datetime_marker: Option<char>,
}

/// `[attributes]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributesSection {
    pub error_type: Option<String>,
    pub error_message: Option<String>,
}

/// `[limits]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsSection {
    pub max_call_depth: Option<usize>,
}

impl SettingsFile {
    /// Parse a TOML document
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Resolved symbol spellings
#[derive(Debug, Clone, PartialEq)]
pub struct Symbols {
    pub decimal_separator: char,
    pub argument_separator: char,
    pub quotes: Vec<char>,
    pub line_comment: String,
    pub doc_marker: String,
    pub datetime_sigil: char,
    pub datetime_marker: char,
}

impl Default for Symbols {
    fn default() -> Self {
        Self {
            decimal_separator: '.',
            argument_separator: ',',
            quotes: vec!['"', '\''],
            line_comment: "#".to_string(),
            doc_marker: "@doc".to_string(),
            datetime_sigil: '~',
            datetime_marker: 'D',
        }
    }
}

/// The validated translation table shared by every stage of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    keywords: HashMap<KeywordRole, String>,
    keyword_lookup: HashMap<String, KeywordRole>,
    phrases: Vec<(Vec<String>, KeywordRole)>,
    symbols: Symbols,
    special_methods: HashMap<MethodRole, String>,
    error_names: HashMap<ErrorClass, String>,
    error_type_attribute: String,
    error_message_attribute: String,
    max_call_depth: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings::resolve(&SettingsFile::default())
    }
}

impl Settings {
    /// Resolve a settings file against the English defaults and validate it
    pub fn from_file(file: SettingsFile) -> ConfigResult<Self> {
        check_keys("keywords", &file.keywords, |key| {
            KeywordRole::from_key(key).is_some()
        })?;
        check_keys("special_methods", &file.special_methods, |key| {
            MethodRole::from_key(key).is_some()
        })?;
        check_keys("errors", &file.errors, |key| ErrorClass::from_key(key).is_some())?;
        let settings = Settings::resolve(&file);
        settings.validate()?;
        Ok(settings)
    }

    fn resolve(file: &SettingsFile) -> Self {
        let mut keywords = HashMap::new();
        for role in KeywordRole::ALL {
            let spelling = file
                .keywords
                .get(role.key())
                .map(|s| normalize_phrase(s))
                .unwrap_or_else(|| role.default_spelling().to_string());
            keywords.insert(role, spelling);
        }

        let defaults = Symbols::default();
        let symbols = Symbols {
            decimal_separator: file
                .symbols
                .decimal_separator
                .unwrap_or(defaults.decimal_separator),
            argument_separator: file
                .symbols
                .argument_separator
                .unwrap_or(defaults.argument_separator),
            quotes: file.symbols.quotes.clone().unwrap_or(defaults.quotes),
            line_comment: file
                .symbols
                .line_comment
                .clone()
                .unwrap_or(defaults.line_comment),
            doc_marker: file
                .symbols
                .doc_marker
                .clone()
                .unwrap_or(defaults.doc_marker),
            datetime_sigil: file
                .symbols
                .datetime_sigil
                .unwrap_or(defaults.datetime_sigil),
            datetime_marker: file
                .symbols
                .datetime_marker
                .unwrap_or(defaults.datetime_marker),
        };

        let special_methods = MethodRole::ALL
            .iter()
            .map(|&role| {
                let name = file
                    .special_methods
                    .get(role.key())
                    .cloned()
                    .unwrap_or_else(|| role.default_name());
                (role, name)
            })
            .collect();

        let error_names = ErrorClass::ALL
            .iter()
            .map(|&class| {
                let name = file
                    .errors
                    .get(class.key())
                    .cloned()
                    .unwrap_or_else(|| class.default_name().to_string());
                (class, name)
            })
            .collect();

        let mut settings = Settings {
            keywords,
            keyword_lookup: HashMap::new(),
            phrases: Vec::new(),
            symbols,
            special_methods,
            error_names,
            error_type_attribute: file
                .attributes
                .error_type
                .clone()
                .unwrap_or_else(|| "type".to_string()),
            error_message_attribute: file
                .attributes
                .error_message
                .clone()
                .unwrap_or_else(|| "message".to_string()),
            max_call_depth: file.limits.max_call_depth.unwrap_or(200),
        };
        settings.index_keywords();
        settings
    }

    fn index_keywords(&mut self) {
        self.keyword_lookup = self
            .keywords
            .iter()
            .map(|(role, spelling)| (spelling.clone(), *role))
            .collect();
        let mut phrases: Vec<(Vec<String>, KeywordRole)> = self
            .keywords
            .iter()
            .filter(|(_, spelling)| spelling.contains(' '))
            .map(|(role, spelling)| {
                let words = spelling.split(' ').map(str::to_string).collect();
                (words, *role)
            })
            .collect();
        // Longest phrase first so matching is greedy
        phrases.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(&b.0)));
        self.phrases = phrases;
    }

    /// Check every table for empty, malformed, or clashing spellings
    pub fn validate(&self) -> ConfigResult<()> {
        let mut seen: HashMap<&str, KeywordRole> = HashMap::new();
        for role in KeywordRole::ALL {
            let spelling = self.keyword(role);
            if spelling.is_empty() {
                return Err(invalid(
                    format!("keywords.{}", role.key()),
                    "keyword must not be empty",
                ));
            }
            if !is_phrase(spelling) {
                return Err(invalid(
                    format!("keywords.{}", role.key()),
                    format!("'{}' is not a valid keyword", spelling),
                ));
            }
            if let Some(first) = seen.insert(spelling, role) {
                return Err(ConfigError::Conflict {
                    spelling: spelling.to_string(),
                    first: format!("keywords.{}", first.key()),
                    second: format!("keywords.{}", role.key()),
                });
            }
        }

        let symbols = &self.symbols;
        if symbols.decimal_separator.is_alphanumeric()
            || symbols.decimal_separator.is_whitespace()
            || symbols.decimal_separator == '_'
        {
            return Err(invalid(
                "symbols.decimal_separator",
                format!(
                    "'{}' cannot be used as a decimal separator",
                    symbols.decimal_separator
                ),
            ));
        }
        if symbols.argument_separator.is_alphanumeric() || symbols.argument_separator.is_whitespace()
        {
            return Err(invalid(
                "symbols.argument_separator",
                format!(
                    "'{}' cannot be used as an argument separator",
                    symbols.argument_separator
                ),
            ));
        }
        if symbols.decimal_separator == symbols.argument_separator {
            return Err(ConfigError::Conflict {
                spelling: symbols.decimal_separator.to_string(),
                first: "symbols.decimal_separator".to_string(),
                second: "symbols.argument_separator".to_string(),
            });
        }
        if symbols.quotes.is_empty() {
            return Err(invalid("symbols.quotes", "at least one quote is required"));
        }
        for quote in &symbols.quotes {
            if quote.is_alphanumeric()
                || quote.is_whitespace()
                || *quote == symbols.decimal_separator
                || *quote == symbols.argument_separator
            {
                return Err(invalid(
                    "symbols.quotes",
                    format!("'{}' cannot be used as a quote", quote),
                ));
            }
        }
        if symbols.line_comment.is_empty() {
            return Err(invalid("symbols.line_comment", "must not be empty"));
        }
        if symbols.doc_marker.is_empty() {
            return Err(invalid("symbols.doc_marker", "must not be empty"));
        }
        if symbols.datetime_sigil.is_alphanumeric() || symbols.datetime_sigil.is_whitespace() {
            return Err(invalid(
                "symbols.datetime_sigil",
                format!("'{}' cannot be used as a sigil", symbols.datetime_sigil),
            ));
        }

        let mut seen: HashMap<&str, MethodRole> = HashMap::new();
        for role in MethodRole::ALL {
            let name = self.special_method(role);
            if !is_identifier(name) {
                return Err(invalid(
                    format!("special_methods.{}", role.key()),
                    format!("'{}' is not a valid name", name),
                ));
            }
            if let Some(first) = seen.insert(name, role) {
                return Err(ConfigError::Conflict {
                    spelling: name.to_string(),
                    first: format!("special_methods.{}", first.key()),
                    second: format!("special_methods.{}", role.key()),
                });
            }
        }

        let mut seen: HashMap<&str, ErrorClass> = HashMap::new();
        for class in ErrorClass::ALL {
            let name = self.error_name(class);
            if name.trim().is_empty() {
                return Err(invalid(format!("errors.{}", class.key()), "must not be empty"));
            }
            if let Some(first) = seen.insert(name, class) {
                return Err(ConfigError::Conflict {
                    spelling: name.to_string(),
                    first: format!("errors.{}", first.key()),
                    second: format!("errors.{}", class.key()),
                });
            }
        }

        if !is_identifier(&self.error_type_attribute) {
            return Err(invalid("attributes.error_type", "must be a valid name"));
        }
        if !is_identifier(&self.error_message_attribute) {
            return Err(invalid("attributes.error_message", "must be a valid name"));
        }
        if self.error_type_attribute == self.error_message_attribute {
            return Err(ConfigError::Conflict {
                spelling: self.error_type_attribute.clone(),
                first: "attributes.error_type".to_string(),
                second: "attributes.error_message".to_string(),
            });
        }

        if self.max_call_depth == 0 {
            return Err(invalid("limits.max_call_depth", "must be at least 1"));
        }

        Ok(())
    }

    /// Active spelling of a keyword
    pub fn keyword(&self, role: KeywordRole) -> &str {
        self.keywords
            .get(&role)
            .map(String::as_str)
            .unwrap_or_else(|| role.default_spelling())
    }

    /// Role of a single- or multi-word spelling
    pub fn keyword_role(&self, spelling: &str) -> Option<KeywordRole> {
        self.keyword_lookup.get(spelling).copied()
    }

    /// Multi-word keywords, longest first
    pub fn phrases(&self) -> &[(Vec<String>, KeywordRole)] {
        &self.phrases
    }

    pub fn symbols(&self) -> &Symbols {
        &self.symbols
    }

    pub fn decimal_separator(&self) -> char {
        self.symbols.decimal_separator
    }

    pub fn argument_separator(&self) -> char {
        self.symbols.argument_separator
    }

    /// Active name of a special method
    pub fn special_method(&self, role: MethodRole) -> &str {
        self.special_methods
            .get(&role)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Role whose special method is spelled `name`
    pub fn method_role(&self, name: &str) -> Option<MethodRole> {
        self.special_methods
            .iter()
            .find(|(_, spelling)| spelling.as_str() == name)
            .map(|(role, _)| *role)
    }

    /// Display name of a built-in error kind
    pub fn error_name(&self, class: ErrorClass) -> &str {
        self.error_names
            .get(&class)
            .map(String::as_str)
            .unwrap_or_else(|| class.default_name())
    }

    /// Built-in error kind displayed as `name`
    pub fn error_class(&self, name: &str) -> Option<ErrorClass> {
        self.error_names
            .iter()
            .find(|(_, spelling)| spelling.as_str() == name)
            .map(|(class, _)| *class)
    }

    /// Attribute exposing an error's kind name
    pub fn error_type_attribute(&self) -> &str {
        &self.error_type_attribute
    }

    /// Attribute exposing an error's message
    pub fn error_message_attribute(&self) -> &str {
        &self.error_message_attribute
    }

    pub fn max_call_depth(&self) -> usize {
        self.max_call_depth
    }
}

fn check_keys(
    section: &str,
    table: &BTreeMap<String, String>,
    known: impl Fn(&str) -> bool,
) -> ConfigResult<()> {
    match table.keys().find(|key| !known(key)) {
        Some(key) => Err(invalid(
            format!("{}.{}", section, key),
            "unknown entry",
        )),
        None => Ok(()),
    }
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.into(),
        reason: reason.into(),
    }
}

/// Collapse runs of whitespace inside a keyword phrase to single spaces
fn normalize_phrase(spelling: &str) -> String {
    spelling.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// A name the lexer would scan as a single identifier
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if is_identifier_start(c) => chars.all(is_identifier_char),
        _ => false,
    }
}

fn is_phrase(s: &str) -> bool {
    s.split(' ').all(is_identifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_resolve() {
        let settings = Settings::default();
        assert_eq!(settings.keyword(KeywordRole::ElseIf), "else if");
        assert_eq!(settings.keyword_role("otherwise"), Some(KeywordRole::Otherwise));
        assert_eq!(settings.phrases().len(), 1);
        assert_eq!(settings.special_method(MethodRole::Add), "__add__");
        assert_eq!(settings.method_role("__hash__"), Some(MethodRole::Hash));
        assert_eq!(settings.error_name(ErrorClass::ZeroDivision), "ZeroDivisionError");
        assert_eq!(settings.error_class("KeyError"), Some(ErrorClass::Key));
        assert_eq!(settings.max_call_depth(), 200);
    }

    #[test]
    fn test_unknown_keyword_role_rejected() {
        let mut file = SettingsFile::default();
        file.keywords.insert("whilst".to_string(), "tant".to_string());
        let err = Settings::from_file(file).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "keywords.whilst"));
    }

    #[test]
    fn test_phrase_whitespace_is_normalized() {
        let mut file = SettingsFile::default();
        file.keywords
            .insert("else_if".to_string(), "sinon   si".to_string());
        let settings = Settings::from_file(file).unwrap();
        assert_eq!(settings.keyword(KeywordRole::ElseIf), "sinon si");
        assert_eq!(
            settings.phrases()[0].0,
            vec!["sinon".to_string(), "si".to_string()]
        );
    }

    #[test]
    fn test_identifier_rules() {
        assert!(is_identifier("__add__"));
        assert!(is_identifier("größe"));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier(""));
    }
}
