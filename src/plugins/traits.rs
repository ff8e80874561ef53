// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Contracts implemented by user-supplied map/reduce/reader/writer code.
//! Kept intentionally narrow: the task manager and worker runtime only ever
//! call through these four traits.

use anyhow::Result;
use indexmap::IndexMap;

use crate::protocol::value::Value;

/// `map(k, v) -> lazy sequence of (k', v') pairs`. May be empty.
pub trait Mapper: Send + Sync {
    fn map(&self, key: &Value, value: &Value) -> Result<Vec<(Value, Value)>>;
}

/// `reduce(k', vs) -> v''` where `vs` is non-empty and ordered; `v''` may be
/// absent, meaning "omit this key from results".
pub trait Reducer: Send + Sync {
    fn reduce(&self, key: &Value, values: &[Value]) -> Result<Option<Value>>;
}

/// `read(input_spec) -> mapping K -> V`. Iteration order of the returned map
/// must be deterministic for a given spec; callers rely on `IndexMap`'s
/// insertion-order semantics for that.
pub trait Reader: Send + Sync {
    fn read(&self, input_spec: &str) -> Result<IndexMap<Value, Value>>;
}

/// `write(results)`. Consumes the final mapping; side effect only.
pub trait Writer: Send + Sync {
    fn write(&self, output_spec: &str, results: &IndexMap<Value, Value>) -> Result<()>;
}
