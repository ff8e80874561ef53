// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Named registry: a string-keyed table of constructors plus one optional
//! default slot, the same shape as the source's `_MAPPERS`/`_REDUCERS`/
//! `_READERS`/`_WRITERS` dictionaries and their `REGISTER_*` helpers.

use std::sync::Arc;

use anyhow::{Result, bail};
use dashmap::DashMap;
use once_cell::sync::OnceCell;

type Constructor<T> = Arc<dyn Fn() -> Box<T> + Send + Sync>;

pub struct Registry<T: ?Sized> {
    entries: DashMap<String, Constructor<T>>,
    default: OnceCell<String>,
}

impl<T: ?Sized> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Registry<T> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            default: OnceCell::new(),
        }
    }

    pub fn register(&self, name: impl Into<String>, ctor: impl Fn() -> Box<T> + Send + Sync + 'static) {
        self.entries.insert(name.into(), Arc::new(ctor));
    }

    /// Registers `ctor` under `name` and, if no default has been claimed
    /// yet, also sets it as the default slot.
    pub fn register_default(
        &self,
        name: impl Into<String>,
        ctor: impl Fn() -> Box<T> + Send + Sync + 'static,
    ) {
        let name = name.into();
        self.register(name.clone(), ctor);
        let _ = self.default.set(name);
    }

    /// Constructs the named entry, or the default entry when `name` is
    /// `None`.
    pub fn construct(&self, name: Option<&str>) -> Result<Box<T>> {
        let key = match name {
            Some(n) => n.to_owned(),
            None => self
                .default
                .get()
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no default registered and no name given"))?,
        };
        match self.entries.get(&key) {
            Some(ctor) => Ok(ctor()),
            None => bail!("no entry registered under name {key:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct Hello;
    impl Greeter for Hello {
        fn greet(&self) -> String {
            "hello".into()
        }
    }

    #[test]
    fn constructs_by_name() {
        let registry: Registry<dyn Greeter> = Registry::new();
        registry.register("hello", || Box::new(Hello));
        let g = registry.construct(Some("hello")).unwrap();
        assert_eq!(g.greet(), "hello");
    }

    #[test]
    fn falls_back_to_default() {
        let registry: Registry<dyn Greeter> = Registry::new();
        registry.register_default("hello", || Box::new(Hello));
        let g = registry.construct(None).unwrap();
        assert_eq!(g.greet(), "hello");
    }

    #[test]
    fn unknown_name_is_an_error() {
        let registry: Registry<dyn Greeter> = Registry::new();
        registry.register("hello", || Box::new(Hello));
        assert!(registry.construct(Some("bye")).is_err());
    }

    #[test]
    fn no_default_and_no_name_is_an_error() {
        let registry: Registry<dyn Greeter> = Registry::new();
        registry.register("hello", || Box::new(Hello));
        assert!(registry.construct(None).is_err());
    }
}
