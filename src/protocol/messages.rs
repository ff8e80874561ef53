// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Typed payload shapes carried by the four data-bearing commands. Each is
//! bincode-encoded into the length-mode frame body described in
//! [`crate::protocol::codec`].

use serde::{Deserialize, Serialize};

use crate::protocol::value::Value;

/// Payload of a `map` command: one input pair assigned to a worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapAssignment {
    pub key: Value,
    pub value: Value,
}

/// Payload of a `reduce` command: an intermediate key and its accumulated,
/// arrival-ordered value list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReduceAssignment {
    pub key: Value,
    pub values: Vec<Value>,
}

/// Payload of a `mapdone` command: the original input key plus the mapper's
/// output, grouped by intermediate key in first-seen order. `None` stands in
/// for a mapper that produced nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapDone {
    pub key: Value,
    pub output: Option<Vec<(Value, Vec<Value>)>>,
}

/// Payload of a `reducedone` command. `value: None` means "omit this key".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReduceDone {
    pub key: Value,
    pub value: Option<Value>,
}

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, bincode::Error> {
    bincode::serialize(value)
}

pub fn decode<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T, bincode::Error> {
    bincode::deserialize(bytes)
}
