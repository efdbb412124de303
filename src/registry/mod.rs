//! Component registry.
//!
//! Name-keyed factories for parsers, notifiers and savers. Routes refer to
//! components by name; the registry turns a name into a freshly constructed,
//! configured instance. Built once in the composition root and passed around
//! explicitly, read-only after startup.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::components::{
    DatabaseSaver, NilNotifier, SimpleFileSystemSaver, SimpleParser, SmtpNotifier,
};
use crate::config::RouteSettings;
use crate::pipeline::{Configurable, PayloadNotifier, PayloadParser, PayloadSaver, PipelineError};

/// Builds one unconfigured component instance.
pub type Factory<T> = Box<dyn Fn() -> Box<T> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Parser,
    Notifier,
    Saver,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Parser => "parser",
            Role::Notifier => "notifier",
            Role::Saver => "saver",
        })
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown {role} {name:?} (registered: {registered})")]
    UnknownComponent {
        role: Role,
        name: String,
        registered: String,
    },

    #[error("error configuring {role} {name:?}: {source}")]
    Configuration {
        role: Role,
        name: String,
        #[source]
        source: PipelineError,
    },
}

/// Factories for one role.
pub struct ComponentTable<T: ?Sized> {
    role: Role,
    factories: HashMap<String, Factory<T>>,
}

impl<T: ?Sized + Configurable> ComponentTable<T> {
    fn new(role: Role) -> Self {
        Self {
            role,
            factories: HashMap::new(),
        }
    }

    /// Registering a name twice replaces the earlier factory.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<T> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.factories.insert(name.clone(), Box::new(factory)).is_some() {
            tracing::debug!(role = %self.role, name = %name, "Replaced registered component");
        }
    }

    pub fn create(&self, name: &str, settings: &RouteSettings) -> Result<Box<T>, RegistryError> {
        let factory = self.factories.get(name).ok_or_else(|| RegistryError::UnknownComponent {
            role: self.role,
            name: name.to_string(),
            registered: self.names().join(", "),
        })?;

        let mut component = factory();
        component
            .configure(settings)
            .map_err(|source| RegistryError::Configuration {
                role: self.role,
                name: name.to_string(),
                source,
            })?;
        Ok(component)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }
}

pub struct ComponentRegistry {
    parsers: ComponentTable<dyn PayloadParser>,
    notifiers: ComponentTable<dyn PayloadNotifier>,
    savers: ComponentTable<dyn PayloadSaver>,
}

impl ComponentRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            parsers: ComponentTable::new(Role::Parser),
            notifiers: ComponentTable::new(Role::Notifier),
            savers: ComponentTable::new(Role::Saver),
        }
    }

    /// A registry holding every built-in component.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_parser(SimpleParser::NAME, || Box::new(SimpleParser::default()));
        registry.register_notifier(NilNotifier::NAME, || Box::new(NilNotifier));
        registry.register_notifier(SmtpNotifier::NAME, || Box::new(SmtpNotifier::default()));
        registry.register_saver(SimpleFileSystemSaver::NAME, || {
            Box::new(SimpleFileSystemSaver::default())
        });
        registry.register_saver(DatabaseSaver::NAME, || Box::new(DatabaseSaver::default()));
        registry
    }

    pub fn register_parser<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn PayloadParser> + Send + Sync + 'static,
    {
        self.parsers.register(name, factory);
    }

    pub fn register_notifier<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn PayloadNotifier> + Send + Sync + 'static,
    {
        self.notifiers.register(name, factory);
    }

    pub fn register_saver<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn PayloadSaver> + Send + Sync + 'static,
    {
        self.savers.register(name, factory);
    }

    pub fn create_parser(
        &self,
        name: &str,
        settings: &RouteSettings,
    ) -> Result<Arc<dyn PayloadParser>, RegistryError> {
        self.parsers.create(name, settings).map(Arc::from)
    }

    pub fn create_notifier(
        &self,
        name: &str,
        settings: &RouteSettings,
    ) -> Result<Arc<dyn PayloadNotifier>, RegistryError> {
        self.notifiers.create(name, settings).map(Arc::from)
    }

    pub fn create_saver(
        &self,
        name: &str,
        settings: &RouteSettings,
    ) -> Result<Arc<dyn PayloadSaver>, RegistryError> {
        self.savers.create(name, settings).map(Arc::from)
    }

    pub fn contains(&self, role: Role, name: &str) -> bool {
        match role {
            Role::Parser => self.parsers.contains(name),
            Role::Notifier => self.notifiers.contains(name),
            Role::Saver => self.savers.contains(name),
        }
    }

    pub fn names(&self, role: Role) -> Vec<String> {
        match role {
            Role::Parser => self.parsers.names(),
            Role::Notifier => self.notifiers.names(),
            Role::Saver => self.savers.names(),
        }
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PayloadRecord;
    use async_trait::async_trait;

    struct NeedsName {
        name: String,
    }

    impl Configurable for NeedsName {
        fn configure(&mut self, settings: &RouteSettings) -> Result<(), PipelineError> {
            if settings.name.is_empty() {
                return Err(PipelineError::InvalidSetting {
                    field: "name",
                    reason: "must not be empty".to_string(),
                });
            }
            self.name = settings.name.clone();
            Ok(())
        }
    }

    #[async_trait]
    impl PayloadNotifier for NeedsName {
        async fn notify(&self, _payload: Option<&PayloadRecord>) -> Result<(), PipelineError> {
            Ok(())
        }
    }

    #[test]
    fn test_builtins_registered() {
        let registry = ComponentRegistry::with_builtins();
        assert_eq!(registry.names(Role::Parser), vec!["SimpleParser"]);
        assert_eq!(registry.names(Role::Notifier), vec!["NilNotifier", "SMTPNotifier"]);
        assert_eq!(
            registry.names(Role::Saver),
            vec!["DatabaseSaver", "SimpleFileSystemSaver"]
        );
    }

    #[test]
    fn test_unknown_component() {
        let registry = ComponentRegistry::with_builtins();
        let err = registry
            .create_parser("XmlParser", &RouteSettings::default())
            .err()
            .unwrap();
        assert!(matches!(
            err,
            RegistryError::UnknownComponent { role: Role::Parser, ref name, .. } if name == "XmlParser"
        ));
        assert!(err.to_string().contains("SimpleParser"));
    }

    #[test]
    fn test_configure_failure_is_wrapped() {
        let mut registry = ComponentRegistry::new();
        registry.register_notifier("needs-name", || Box::new(NeedsName { name: String::new() }));

        let settings = RouteSettings { name: String::new(), ..RouteSettings::default() };
        let err = registry.create_notifier("needs-name", &settings).err().unwrap();
        assert!(matches!(
            err,
            RegistryError::Configuration { role: Role::Notifier, source: PipelineError::InvalidSetting { field: "name", .. }, .. }
        ));

        assert!(registry.create_notifier("needs-name", &RouteSettings::default()).is_ok());
    }

    #[test]
    fn test_instances_are_independent() {
        let registry = ComponentRegistry::with_builtins();
        let settings = RouteSettings::default();
        let a = registry.create_saver("SimpleFileSystemSaver", &settings).unwrap();
        let b = registry.create_saver("SimpleFileSystemSaver", &settings).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = ComponentRegistry::new();
        registry.register_notifier("nil", || Box::new(NilNotifier));
        registry.register_notifier("nil", || Box::new(NilNotifier));
        assert_eq!(registry.names(Role::Notifier).len(), 1);
        assert!(registry.contains(Role::Notifier, "nil"));
        assert!(!registry.contains(Role::Saver, "nil"));
    }
}
