//! Host context: settings, builtin-module registration and translations
//!
//! A host builds one [`Context`] per application run. Each registered
//! module is bound in the program record of every evaluation, under its
//! localized name when a translation is attached. Translations are
//! cosmetic: the implementation that runs never changes.

use crate::interpreter::{Interpreter, Record, RecordKind};
use crate::value::{
    Arguments, Data, Detached, FlowError, FunctionBody, FunctionData, Interchange, ModuleData,
    NativeFn, Param, Value,
};
use flow_config::Settings;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::debug;

/// A builtin module implementation
pub trait BuiltinModule {
    /// Operations exposed by the module, in display order
    fn operations(&self) -> Vec<Operation>;
}

/// A native operation of a builtin module
pub struct Operation {
    pub name: String,
    pub params: Vec<ParamSpec>,
    pub func: NativeFn,
}

impl Operation {
    pub fn new<F>(name: impl Into<String>, params: Vec<ParamSpec>, func: F) -> Self
    where
        F: Fn(&mut Arguments<'_>) -> Result<Value, FlowError> + 'static,
    {
        Self {
            name: name.into(),
            params,
            func: Rc::new(func),
        }
    }
}

/// Declared parameter of a native operation
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    pub default: Option<Interchange>,
}

impl ParamSpec {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    pub fn optional(name: impl Into<String>, default: Interchange) -> Self {
        Self {
            name: name.into(),
            default: Some(default),
        }
    }
}

/// Localized names for a module and its operations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleTranslation {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Keyed by canonical operation name
    pub operations: HashMap<String, OperationTranslation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationTranslation {
    pub name: Option<String>,
    /// Canonical parameter name to localized name
    pub params: HashMap<String, String>,
}

struct Registration {
    module: Rc<dyn BuiltinModule>,
    canonical: String,
}

/// Settings plus registered builtin modules
pub struct Context {
    settings: Rc<Settings>,
    registrations: Vec<Registration>,
    translations: HashMap<String, ModuleTranslation>,
}

impl Context {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Rc::new(settings),
            registrations: Vec::new(),
            translations: HashMap::new(),
        }
    }

    /// English defaults with the standard modules registered
    pub fn with_standard_modules() -> Self {
        let mut context = Self::default();
        context.register_standard_modules();
        context
    }

    pub fn register_standard_modules(&mut self) {
        self.register_modules(crate::stdlib::standard_modules());
    }

    pub fn settings(&self) -> &Rc<Settings> {
        &self.settings
    }

    /// Register `(implementation, canonical name)` pairs in order. A
    /// canonical name registered again replaces the earlier module.
    pub fn register_modules(&mut self, modules: Vec<(Rc<dyn BuiltinModule>, String)>) {
        for (module, canonical) in modules {
            match self
                .registrations
                .iter_mut()
                .find(|registration| registration.canonical == canonical)
            {
                Some(existing) => existing.module = module,
                None => self.registrations.push(Registration { module, canonical }),
            }
        }
    }

    pub fn translate_module(&mut self, canonical: impl Into<String>, translation: ModuleTranslation) {
        self.translations.insert(canonical.into(), translation);
    }

    /// Canonical names in registration order
    pub fn canonical_names(&self) -> Vec<&str> {
        self.registrations
            .iter()
            .map(|registration| registration.canonical.as_str())
            .collect()
    }

    /// Name a module is bound to in programs
    pub fn bound_name<'a>(&'a self, canonical: &'a str) -> &'a str {
        self.translations
            .get(canonical)
            .and_then(|translation| translation.name.as_deref())
            .unwrap_or(canonical)
    }

    /// Bind every registered module in the interpreter's program record
    pub(crate) fn install(&self, interpreter: &mut Interpreter) -> Result<(), FlowError> {
        for registration in &self.registrations {
            let canonical = registration.canonical.as_str();
            let module = self.build_module(registration, interpreter)?;
            let bound = self.bound_name(canonical);
            debug!(canonical, bound, "registered builtin module");
            interpreter.define_global(bound, module);
        }
        Ok(())
    }

    fn build_module(
        &self,
        registration: &Registration,
        interpreter: &Interpreter,
    ) -> Result<Value, FlowError> {
        let heap = interpreter.heap();
        let translation = self.translations.get(&registration.canonical);
        let attributes = Record::new_scope(RecordKind::Module, None);

        for operation in registration.module.operations() {
            let op_translation = translation.and_then(|t| t.operations.get(&operation.name));
            let mut params = Vec::with_capacity(operation.params.len());
            for declared in &operation.params {
                let default = match &declared.default {
                    Some(form) => Some(heap.from_interchange(form, &mut Detached)?),
                    None => None,
                };
                params.push(Param {
                    name: declared.name.as_str().into(),
                    alias: op_translation
                        .and_then(|t| t.params.get(&declared.name))
                        .map(|alias| alias.as_str().into()),
                    default,
                });
            }
            let exposed = op_translation
                .and_then(|t| t.name.clone())
                .unwrap_or_else(|| operation.name.clone());
            let function = Value::new(
                Data::Function(FunctionData {
                    name: Some(exposed.as_str().into()),
                    params: params.into(),
                    body: FunctionBody::Native(operation.func),
                }),
                heap,
            );
            attributes.borrow_mut().define(&exposed, function);
        }

        let module = Value::new(
            Data::Module(ModuleData {
                name: Some(self.bound_name(&registration.canonical).into()),
                attributes,
                params: None,
            }),
            heap,
        );
        if let Some(description) = translation.and_then(|t| t.description.as_deref()) {
            module.set_doc(description);
        }
        Ok(module)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Heap;
    use pretty_assertions::assert_eq;

    struct Greeter;

    impl BuiltinModule for Greeter {
        fn operations(&self) -> Vec<Operation> {
            vec![Operation::new(
                "hello",
                vec![ParamSpec::optional("name", Interchange::Str("world".into()))],
                |args| {
                    let name = args.get("name")?;
                    let text = name.display(args.invoker())?;
                    Ok(args.heap().string(format!("hello {}", text)))
                },
            )]
        }
    }

    #[test]
    fn test_reregistering_replaces() {
        let mut context = Context::default();
        context.register_modules(vec![(Rc::new(Greeter), "greet".to_string())]);
        context.register_modules(vec![(Rc::new(Greeter), "greet".to_string())]);
        assert_eq!(context.canonical_names(), vec!["greet"]);
    }

    #[test]
    fn test_install_binds_translated_name() {
        let mut context = Context::default();
        context.register_modules(vec![(Rc::new(Greeter), "greet".to_string())]);
        context.translate_module(
            "greet",
            ModuleTranslation {
                name: Some("saluer".into()),
                description: Some("Salutations".into()),
                operations: HashMap::new(),
            },
        );
        let mut interpreter = Interpreter::new(Heap::new(Rc::clone(context.settings())));
        context.install(&mut interpreter).unwrap();
        let globals = interpreter.globals();
        let module = globals.borrow().get_local("saluer").unwrap();
        assert_eq!(module.doc().as_deref(), Some("Salutations"));
        assert!(module.module_attribute("hello").is_some());
        assert!(globals.borrow().get_local("greet").is_none());
    }

    #[test]
    fn test_translation_deserializes() {
        let translation: ModuleTranslation = serde_json::from_str(
            r#"{"name": "maths", "operations": {"abs": {"name": "absolu", "params": {"x": "nombre"}}}}"#,
        )
        .unwrap();
        assert_eq!(translation.name.as_deref(), Some("maths"));
        assert_eq!(
            translation.operations["abs"].params.get("x").map(String::as_str),
            Some("nombre")
        );
    }
}
