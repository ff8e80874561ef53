// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! A single-coordinator MapReduce engine: a coordinator reads an input
//! key/value set, dispatches map and reduce assignments to cooperating
//! workers over an authenticated TCP protocol, and writes the final mapping
//! through a pluggable sink.

pub mod cfg;
pub mod coordinator;
pub mod launcher;
pub mod plugins;
pub mod protocol;
pub mod worker;
