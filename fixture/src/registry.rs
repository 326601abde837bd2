//! Register handlers once, then resolve them by name from any number of readers.

use crate::{handler::TypeHandler, Error};
use std::{collections::HashMap, sync::Arc};
use tracing::debug;
pub use wireproof_descriptor::strip_namespace;

/// Collects handlers before the [Registry] is frozen.
#[derive(Default)]
pub struct Builder {
    handlers: Vec<TypeHandler>,
    index: HashMap<String, usize>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler.
    ///
    /// Fails if a handler with the same name was already registered (the existing handler is kept).
    pub fn register(&mut self, handler: TypeHandler) -> Result<(), Error> {
        if self.index.contains_key(handler.name()) {
            return Err(Error::DuplicateType(handler.name().to_string()));
        }
        debug!(
            name = handler.name(),
            size = handler.size_of(),
            "registered type"
        );
        self.index
            .insert(handler.name().to_string(), self.handlers.len());
        self.handlers.push(handler);
        Ok(())
    }

    /// Freeze the registry.
    pub fn build(self) -> Registry {
        Registry {
            handlers: self.handlers.into(),
            index: Arc::new(self.index),
        }
    }
}

/// Immutable, cheaply cloneable collection of [TypeHandler]s in registration order.
#[derive(Clone, Debug)]
pub struct Registry {
    handlers: Arc<[TypeHandler]>,
    index: Arc<HashMap<String, usize>>,
}

impl Registry {
    /// Find a handler by exact name or, failing that, the first handler (in registration order)
    /// whose name without its namespace equals `name`.
    pub fn lookup(&self, name: &str) -> Option<&TypeHandler> {
        if let Some(&index) = self.index.get(name) {
            return self.handlers.get(index);
        }
        self.handlers
            .iter()
            .find(|handler| strip_namespace(handler.name()) == name)
    }

    /// Like [Registry::lookup], but an unknown name is an error.
    pub fn get(&self, name: &str) -> Result<&TypeHandler, Error> {
        self.lookup(name)
            .ok_or_else(|| Error::UnknownType(name.to_string()))
    }

    /// Names of all handlers, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.iter().map(|handler| handler.name())
    }

    pub fn handlers(&self) -> impl Iterator<Item = &TypeHandler> {
        self.handlers.iter()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Construct, Field, Primitive, Scalar};
    use std::thread;

    fn handler(name: &str) -> TypeHandler {
        TypeHandler::new(
            name,
            Construct::structure(
                "T",
                vec![Field::key("id", Construct::primitive(Primitive::Int32, Scalar::IDENTITY))],
            ),
        )
    }

    #[test]
    fn test_strip_namespace() {
        assert_eq!(strip_namespace("AtomicTests::Int32Topic"), "Int32Topic");
        assert_eq!(strip_namespace("A::B::C"), "B::C");
        assert_eq!(strip_namespace("Int32Topic"), "Int32Topic");
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut builder = Builder::new();
        builder.register(handler("A::T")).unwrap();
        assert_eq!(
            builder.register(handler("A::T")),
            Err(Error::DuplicateType("A::T".to_string()))
        );
        builder.register(handler("B::T")).unwrap();
        assert_eq!(builder.build().len(), 2);
    }

    #[test]
    fn test_lookup_order() {
        let mut builder = Builder::new();
        builder.register(handler("A::T")).unwrap();
        builder.register(handler("B::T")).unwrap();
        builder.register(handler("U")).unwrap();
        builder.register(handler("Outer::Inner::V")).unwrap();
        let registry = builder.build();

        // Only the leading namespace is stripped
        assert_eq!(registry.lookup("Inner::V").unwrap().name(), "Outer::Inner::V");
        assert!(registry.lookup("V").is_none());

        assert_eq!(registry.lookup("B::T").unwrap().name(), "B::T");
        assert_eq!(registry.lookup("T").unwrap().name(), "A::T");
        assert_eq!(registry.lookup("U").unwrap().name(), "U");
        assert!(registry.lookup("C::T").is_none());
        assert_eq!(
            registry.get("W").unwrap_err(),
            Error::UnknownType("W".to_string())
        );
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["A::T", "B::T", "U", "Outer::Inner::V"]
        );
    }

    #[test]
    fn test_concurrent_readers() {
        let mut builder = Builder::new();
        builder.register(handler("A::T")).unwrap();
        let registry = builder.build();

        let readers: Vec<_> = (0..4)
            .map(|seed| {
                let registry = registry.clone();
                thread::spawn(move || {
                    let handler = registry.get("T").unwrap();
                    handler.is_valid(&handler.generate(seed), seed)
                })
            })
            .collect();
        for reader in readers {
            assert!(reader.join().unwrap());
        }
    }
}
