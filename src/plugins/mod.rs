// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Pluggable Mapper/Reducer/Reader/Writer registries. Deliberately out of
//! the core: the coordinator and worker only ever see these through
//! [`traits`], resolved by name through [`registry::Registry`].

pub mod builtins;
pub mod registry;
pub mod traits;

use std::sync::Arc;

use registry::Registry;
use traits::{Mapper, Reader, Reducer, Writer};

/// The four named registries a launched process draws from. One `Plugins`
/// is built at startup and shared (read-only after that) between the
/// coordinator and any worker threads.
pub struct Plugins {
    pub mappers: Registry<dyn Mapper>,
    pub reducers: Registry<dyn Reducer>,
    pub readers: Registry<dyn Reader>,
    pub writers: Registry<dyn Writer>,
}

impl Plugins {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            mappers: Registry::new(),
            reducers: Registry::new(),
            readers: Registry::new(),
            writers: Registry::new(),
        })
    }
}

/// Builds a `Plugins` set with every built-in already registered.
/// `IdentityMapper`/`IdentityReducer`/`GlobFileReader`/`FileWriter` are the
/// default slot for their respective registry, matching the source's
/// habit of giving every registry a usable out-of-the-box default.
pub fn default_plugins() -> Arc<Plugins> {
    let plugins = Plugins::new();

    plugins
        .mappers
        .register_default("identity", || Box::new(builtins::IdentityMapper));
    plugins
        .mappers
        .register("wordcount", || Box::new(builtins::WordCountMapper));

    plugins
        .reducers
        .register_default("identity", || Box::new(builtins::IdentityReducer));
    plugins
        .reducers
        .register("sum", || Box::new(builtins::SumReducer));
    plugins
        .reducers
        .register("first", || Box::new(builtins::FirstElementReducer));
    plugins
        .reducers
        .register("dropall", || Box::new(builtins::DropAllReducer));

    plugins
        .readers
        .register_default("glob", || Box::new(builtins::GlobFileReader));

    plugins
        .writers
        .register_default("file", || Box::new(builtins::FileWriter));
    plugins
        .writers
        .register("json", || Box::new(builtins::JsonWriter));

    plugins
}
