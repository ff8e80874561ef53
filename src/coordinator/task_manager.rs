// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The task manager: a single-threaded state machine that turns a datasource
//! into a stream of map tasks, shuffles the results, then turns those into a
//! stream of reduce tasks. Every public method runs to completion without
//! suspending, which is what makes the single mutex in
//! [`crate::coordinator::channel`] sufficient to satisfy the "at-most-once
//! result application" invariant — see the crate's concurrency notes.

use std::time::Instant;

use indexmap::IndexMap;
use tracing::info;

use crate::protocol::{
    messages::{MapAssignment, ReduceAssignment},
    value::Value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Start,
    Mapping,
    Reducing,
    Finished,
}

#[derive(Debug, Clone)]
pub enum Assignment {
    Map(MapAssignment),
    Reduce(ReduceAssignment),
}

pub struct TaskManager {
    phase: Phase,
    report_interval: u8,

    datasource: IndexMap<Value, Value>,
    map_cursor: usize,
    working_maps: IndexMap<Value, Instant>,
    map_results: IndexMap<Value, Vec<Value>>,
    maps_done: usize,
    last_map_bucket: u8,

    reduce_cursor: usize,
    working_reduces: IndexMap<Value, Instant>,
    results: IndexMap<Value, Value>,
    reduces_done: usize,
    last_reduce_bucket: u8,
}

impl TaskManager {
    /// `report_interval` is a percentage step (e.g. 10 logs at 10%, 20%,
    /// …); 0 disables progress logging.
    pub fn new(datasource: IndexMap<Value, Value>, report_interval: u8) -> Self {
        Self {
            phase: Phase::Start,
            report_interval,
            datasource,
            map_cursor: 0,
            working_maps: IndexMap::new(),
            map_results: IndexMap::new(),
            maps_done: 0,
            last_map_bucket: 0,
            reduce_cursor: 0,
            working_reduces: IndexMap::new(),
            results: IndexMap::new(),
            reduces_done: 0,
            last_reduce_bucket: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn results(&self) -> &IndexMap<Value, Value> {
        &self.results
    }

    pub fn map_results(&self) -> &IndexMap<Value, Vec<Value>> {
        &self.map_results
    }

    /// Returns the next assignment to hand a worker that just asked for
    /// work, or `None` once the job is finished and the caller should send
    /// `disconnect` and close the connection.
    pub fn next_task(&mut self) -> Option<Assignment> {
        loop {
            match self.phase {
                Phase::Start => {
                    self.phase = Phase::Mapping;
                },
                Phase::Mapping => {
                    if let Some(assignment) = self.next_map_task() {
                        return Some(assignment);
                    }
                    self.phase = Phase::Reducing;
                },
                Phase::Reducing => {
                    if let Some(assignment) = self.next_reduce_task() {
                        return Some(assignment);
                    }
                    self.phase = Phase::Finished;
                },
                Phase::Finished => return None,
            }
        }
    }

    fn next_map_task(&mut self) -> Option<Assignment> {
        if self.map_cursor < self.datasource.len() {
            let (key, value) = self
                .datasource
                .get_index(self.map_cursor)
                .expect("cursor stays within bounds");
            let key = key.clone();
            let value = value.clone();
            self.map_cursor += 1;
            self.working_maps.insert(key.clone(), Instant::now());
            return Some(Assignment::Map(MapAssignment { key, value }));
        }

        let oldest = self
            .working_maps
            .iter()
            .min_by_key(|&(_, t)| *t)
            .map(|(k, _)| k.clone())?;
        self.working_maps.insert(oldest.clone(), Instant::now());
        let value = self
            .datasource
            .get(&oldest)
            .expect("every working_maps key came from the datasource")
            .clone();
        Some(Assignment::Map(MapAssignment { key: oldest, value }))
    }

    fn next_reduce_task(&mut self) -> Option<Assignment> {
        if self.reduce_cursor < self.map_results.len() {
            let (key, _) = self
                .map_results
                .get_index(self.reduce_cursor)
                .expect("cursor stays within bounds");
            let key = key.clone();
            self.reduce_cursor += 1;
            self.working_reduces.insert(key.clone(), Instant::now());
            let values = self
                .map_results
                .get(&key)
                .expect("key was just read from map_results")
                .clone();
            return Some(Assignment::Reduce(ReduceAssignment { key, values }));
        }

        let oldest = self
            .working_reduces
            .iter()
            .min_by_key(|&(_, t)| *t)
            .map(|(k, _)| k.clone())?;
        self.working_reduces.insert(oldest.clone(), Instant::now());
        let values = self
            .map_results
            .get(&oldest)
            .expect("every working_reduces key came from map_results")
            .clone();
        Some(Assignment::Reduce(ReduceAssignment {
            key: oldest,
            values,
        }))
    }

    /// Applies a map result, or silently drops it if `key` is no longer
    /// outstanding (late or duplicate completion).
    pub fn map_done(&mut self, key: Value, output: Option<Vec<(Value, Vec<Value>)>>) {
        if self.working_maps.swap_remove(&key).is_none() {
            return;
        }
        if let Some(pairs) = output {
            for (k2, vs) in pairs {
                self.map_results.entry(k2).or_default().extend(vs);
            }
        }
        self.maps_done += 1;
        self.maybe_log_progress(Phase::Mapping, self.maps_done, self.datasource.len());
    }

    /// Applies a reduce result, or silently drops it if `key` is no longer
    /// outstanding.
    pub fn reduce_done(&mut self, key: Value, value: Option<Value>) {
        if self.working_reduces.swap_remove(&key).is_none() {
            return;
        }
        if let Some(v) = value {
            self.results.insert(key, v);
        }
        self.reduces_done += 1;
        self.maybe_log_progress(Phase::Reducing, self.reduces_done, self.map_results.len());
    }

    fn maybe_log_progress(&mut self, phase: Phase, done: usize, total: usize) {
        if self.report_interval == 0 || total == 0 {
            return;
        }
        let pct = (done * 100 / total) as u8;
        let bucket = pct / self.report_interval;
        let last = match phase {
            Phase::Mapping => &mut self.last_map_bucket,
            Phase::Reducing => &mut self.last_reduce_bucket,
            _ => return,
        };
        if bucket > *last || done == total {
            *last = bucket;
            info!(?phase, done, total, pct, "progress");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datasource(pairs: &[(i64, &str)]) -> IndexMap<Value, Value> {
        pairs
            .iter()
            .map(|(k, v)| (Value::Int(*k), Value::Str((*v).to_owned())))
            .collect()
    }

    #[test]
    fn empty_datasource_finishes_immediately() {
        let mut tm = TaskManager::new(IndexMap::new(), 0);
        assert!(tm.next_task().is_none());
        assert_eq!(tm.phase(), Phase::Finished);
    }

    #[test]
    fn issues_one_map_per_key_then_reassigns_oldest() {
        let mut tm = TaskManager::new(datasource(&[(0, "a"), (1, "b")]), 0);
        let first = tm.next_task().unwrap();
        let second = tm.next_task().unwrap();
        // no more fresh keys: the next call steals the oldest outstanding one
        let third = tm.next_task().unwrap();
        match (&first, &third) {
            (Assignment::Map(a), Assignment::Map(c)) => assert_eq!(a.key, c.key),
            _ => panic!("expected map assignments"),
        }
        let _ = second;
    }

    #[test]
    fn map_done_moves_job_into_reducing() {
        let mut tm = TaskManager::new(datasource(&[(0, "a")]), 0);
        let assignment = tm.next_task().unwrap();
        let key = match assignment {
            Assignment::Map(m) => m.key,
            _ => panic!("expected a map assignment"),
        };
        tm.map_done(
            key,
            Some(vec![(Value::Str("a".into()), vec![Value::Int(1)])]),
        );
        let next = tm.next_task().unwrap();
        assert!(matches!(next, Assignment::Reduce(_)));
        assert_eq!(tm.phase(), Phase::Reducing);
    }

    #[test]
    fn late_map_done_is_dropped_silently() {
        let mut tm = TaskManager::new(datasource(&[(0, "a")]), 0);
        tm.map_done(Value::Int(99), Some(vec![]));
        assert_eq!(tm.map_results().len(), 0);
    }

    #[test]
    fn reduce_done_with_absent_value_omits_key() {
        let mut tm = TaskManager::new(datasource(&[(0, "a")]), 0);
        let assignment = tm.next_task().unwrap();
        let key = match assignment {
            Assignment::Map(m) => m.key,
            _ => panic!("expected a map assignment"),
        };
        tm.map_done(
            key,
            Some(vec![(Value::Str("a".into()), vec![Value::Int(1)])]),
        );
        let reduce = tm.next_task().unwrap();
        let rkey = match reduce {
            Assignment::Reduce(r) => r.key,
            _ => panic!("expected a reduce assignment"),
        };
        tm.reduce_done(rkey, None);
        assert!(tm.results().is_empty());
        assert!(tm.next_task().is_none());
        assert_eq!(tm.phase(), Phase::Finished);
    }

    #[test]
    fn full_word_count_run_produces_expected_counts() {
        let mut tm = TaskManager::new(datasource(&[(0, "a b a"), (1, "b c")]), 0);

        let mut pending = Vec::new();
        while let Some(Assignment::Map(m)) = tm.next_task() {
            pending.push(m);
            if pending.len() == 2 {
                break;
            }
        }
        for m in pending {
            let text = m.value.as_str().unwrap();
            let mut grouped: IndexMap<Value, Vec<Value>> = IndexMap::new();
            for word in text.split_whitespace() {
                grouped
                    .entry(Value::Str(word.to_owned()))
                    .or_default()
                    .push(Value::Int(1));
            }
            tm.map_done(m.key, Some(grouped.into_iter().collect()));
        }

        let mut outputs = IndexMap::new();
        while let Some(Assignment::Reduce(r)) = tm.next_task() {
            let sum: i64 = r.values.iter().filter_map(Value::as_int).sum();
            tm.reduce_done(r.key.clone(), Some(Value::Int(sum)));
            outputs.insert(r.key, sum);
        }

        assert_eq!(tm.phase(), Phase::Finished);
        assert_eq!(outputs.get(&Value::Str("a".into())), Some(&2));
        assert_eq!(outputs.get(&Value::Str("b".into())), Some(&2));
        assert_eq!(outputs.get(&Value::Str("c".into())), Some(&1));
    }
}
