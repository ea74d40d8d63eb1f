//! Method registry.

use super::{EngineError, MethodSpec};
use crate::ports::MethodHandler;
use std::collections::HashMap;
use std::sync::Arc;

/// A declared method with its body.
#[derive(Clone)]
pub struct Method {
    pub spec: Arc<MethodSpec>,
    pub handler: Arc<dyn MethodHandler>,
}

/// Every method the dispatcher can route to, by name.
#[derive(Default)]
pub struct MethodRegistry {
    methods: HashMap<&'static str, Method>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        spec: MethodSpec,
        handler: impl MethodHandler + 'static,
    ) -> Result<(), EngineError> {
        if self.methods.contains_key(spec.name) {
            return Err(EngineError::DuplicateMethod(spec.name.to_string()));
        }
        self.methods.insert(
            spec.name,
            Method {
                spec: Arc::new(spec),
                handler: Arc::new(handler),
            },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.methods.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Every declared nested call must target a registered method.
    pub fn validate(&self) -> Result<(), EngineError> {
        for method in self.methods.values() {
            if let Some(missing) = method.spec.methods.iter().find(|m| !self.contains(m)) {
                return Err(EngineError::UnknownDependency {
                    method: method.spec.name.to_string(),
                    dependency: (*missing).to_string(),
                });
            }
        }
        Ok(())
    }
}
