use lazy_static::lazy_static;
use prometheus_exporter::prometheus::{
    IntCounterVec, IntGaugeVec, default_registry, register_int_counter_vec_with_registry,
    register_int_gauge_vec_with_registry,
};

pub fn create_int_counter_vec(name: &str, help: &str, label_names: &[&str]) -> IntCounterVec {
    let registry = default_registry();
    register_int_counter_vec_with_registry!(name, help, label_names, registry)
        .expect("failed to create int counter vec")
}

pub fn create_int_gauge_vec(name: &str, help: &str, label_names: &[&str]) -> IntGaugeVec {
    let registry = default_registry();
    register_int_gauge_vec_with_registry!(name, help, label_names, registry)
        .expect("failed to create int gauge vec")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Get,
    Delete,
    Evict,
}

impl Operation {
    fn as_str(&self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Get => "get",
            Operation::Delete => "delete",
            Operation::Evict => "evict",
        }
    }
}

lazy_static! {
    pub static ref CACHE_OPERATIONS: IntCounterVec = create_int_counter_vec(
        "checkpointz_cache_operations_total",
        "Total amount of operations performed against a cache",
        &["cache", "operation"]
    );
    pub static ref CACHE_HITS: IntCounterVec = create_int_counter_vec(
        "checkpointz_cache_hits_total",
        "Total amount of cache hits",
        &["cache"]
    );
    pub static ref CACHE_MISSES: IntCounterVec = create_int_counter_vec(
        "checkpointz_cache_misses_total",
        "Total amount of cache misses",
        &["cache"]
    );
    pub static ref CACHE_LEN: IntGaugeVec = create_int_gauge_vec(
        "checkpointz_cache_items",
        "Current amount of items held in a cache",
        &["cache"]
    );
}

pub fn observe_operation(cache: &str, operation: Operation) {
    CACHE_OPERATIONS
        .with_label_values(&[cache, operation.as_str()])
        .inc();
}

pub fn observe_hit(cache: &str) {
    CACHE_HITS.with_label_values(&[cache]).inc();
}

pub fn observe_miss(cache: &str) {
    CACHE_MISSES.with_label_values(&[cache]).inc();
}

pub fn observe_len(cache: &str, len: usize) {
    CACHE_LEN.with_label_values(&[cache]).set(len as i64);
}
