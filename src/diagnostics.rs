use std::collections::BTreeMap;

use crate::types::Float;

/// Receives the per-tick values a component wants to expose for tuning and
/// logging. Each component instance owns its own sink.
pub trait DiagnosticsSink {
    fn record_scalar(&mut self, key: &'static str, value: Float);

    fn record_count(&mut self, key: &'static str, value: usize);
}

/// Forwards every value to `tracing` at trace level, tagged with the
/// component name.
#[derive(Debug, Clone)]
pub struct TracingSink {
    component: &'static str,
}

impl TracingSink {
    pub fn new(component: &'static str) -> Self {
        TracingSink { component }
    }
}

impl DiagnosticsSink for TracingSink {
    fn record_scalar(&mut self, key: &'static str, value: Float) {
        tracing::trace!(component = self.component, key, value);
    }

    fn record_count(&mut self, key: &'static str, value: usize) {
        tracing::trace!(component = self.component, key, value);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn record_scalar(&mut self, _key: &'static str, _value: Float) {}

    fn record_count(&mut self, _key: &'static str, _value: usize) {}
}

/// Keeps the latest value recorded under each key.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub scalars: BTreeMap<&'static str, Float>,
    pub counts: BTreeMap<&'static str, usize>,
}

impl RecordingSink {
    pub fn scalar(&self, key: &str) -> Option<Float> {
        self.scalars.get(key).copied()
    }

    pub fn count(&self, key: &str) -> Option<usize> {
        self.counts.get(key).copied()
    }
}

impl DiagnosticsSink for RecordingSink {
    fn record_scalar(&mut self, key: &'static str, value: Float) {
        self.scalars.insert(key, value);
    }

    fn record_count(&mut self, key: &'static str, value: usize) {
        self.counts.insert(key, value);
    }
}
