// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Built-in Mapper/Reducer/Reader/Writer implementations, registered by
//! [`crate::plugins::default_plugins`] under the same names the source
//! used for its own bundled implementations.

use std::{
    fs,
    io::Write as _,
};

use anyhow::{Context, Result, bail};
use indexmap::IndexMap;

use crate::{
    plugins::traits::{Mapper, Reader, Reducer, Writer},
    protocol::value::Value,
};

/// Emits the input pair unchanged.
pub struct IdentityMapper;

impl Mapper for IdentityMapper {
    fn map(&self, key: &Value, value: &Value) -> Result<Vec<(Value, Value)>> {
        Ok(vec![(key.clone(), value.clone())])
    }
}

/// Splits a string value on whitespace and emits `(word, 1)` for each token.
pub struct WordCountMapper;

impl Mapper for WordCountMapper {
    fn map(&self, _key: &Value, value: &Value) -> Result<Vec<(Value, Value)>> {
        let text = value
            .as_str()
            .context("WordCountMapper requires a string value")?;
        Ok(text
            .split_whitespace()
            .map(|word| (Value::Str(word.to_owned()), Value::Int(1)))
            .collect())
    }
}

/// Returns the whole value list unchanged.
pub struct IdentityReducer;

impl Reducer for IdentityReducer {
    fn reduce(&self, _key: &Value, values: &[Value]) -> Result<Option<Value>> {
        Ok(Some(Value::Seq(values.to_vec())))
    }
}

/// Sums a list of integer or float values, producing an `Int` if every
/// input was an `Int` and a `Float` otherwise.
pub struct SumReducer;

impl Reducer for SumReducer {
    fn reduce(&self, _key: &Value, values: &[Value]) -> Result<Option<Value>> {
        let mut int_sum: i64 = 0;
        let mut float_sum: f64 = 0.0;
        let mut any_float = false;
        for v in values {
            match v {
                Value::Int(i) => {
                    int_sum += i;
                    float_sum += *i as f64;
                },
                Value::Float(f) => {
                    any_float = true;
                    float_sum += f;
                },
                other => bail!("SumReducer cannot sum {other:?}"),
            }
        }
        Ok(Some(if any_float {
            Value::Float(float_sum)
        } else {
            Value::Int(int_sum)
        }))
    }
}

/// Keeps the first value in arrival order, ignoring the rest.
pub struct FirstElementReducer;

impl Reducer for FirstElementReducer {
    fn reduce(&self, _key: &Value, values: &[Value]) -> Result<Option<Value>> {
        Ok(values.first().cloned())
    }
}

/// Drops every key it is given.
pub struct DropAllReducer;

impl Reducer for DropAllReducer {
    fn reduce(&self, _key: &Value, _values: &[Value]) -> Result<Option<Value>> {
        Ok(None)
    }
}

/// Reads every file matching a glob pattern, one entry per line, keyed
/// `"path:lineno"`.
pub struct GlobFileReader;

impl Reader for GlobFileReader {
    fn read(&self, input_spec: &str) -> Result<IndexMap<Value, Value>> {
        let mut data = IndexMap::new();
        for entry in glob::glob(input_spec).context("invalid glob pattern")? {
            let path = entry.context("failed to stat a glob match")?;
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            for (lineno, line) in contents.lines().enumerate() {
                let key = format!("{}:{lineno}", path.display());
                data.insert(Value::Str(key), Value::Str(line.to_owned()));
            }
        }
        Ok(data)
    }
}

/// Writes `key: value\n` lines to the path given as `output_spec`.
pub struct FileWriter;

impl Writer for FileWriter {
    fn write(&self, output_spec: &str, results: &IndexMap<Value, Value>) -> Result<()> {
        let mut fid =
            fs::File::create(output_spec).with_context(|| format!("creating {output_spec}"))?;
        for (key, value) in results {
            writeln!(fid, "{key:?}: {value:?}")?;
        }
        Ok(())
    }
}

/// Writes the results mapping as a single JSON object to the path given as
/// `output_spec`.
pub struct JsonWriter;

impl Writer for JsonWriter {
    fn write(&self, output_spec: &str, results: &IndexMap<Value, Value>) -> Result<()> {
        let pairs: Vec<(&Value, &Value)> = results.iter().collect();
        let fid = fs::File::create(output_spec).with_context(|| format!("creating {output_spec}"))?;
        serde_json::to_writer_pretty(fid, &pairs).context("serializing results as JSON")
    }
}
