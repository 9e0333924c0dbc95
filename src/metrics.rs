use std::sync::LazyLock;

use prometheus::*;

static METRIC_CACHE_LOOKUP: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "imembed_cache_lookup_count",
        "count of digest lookups by result",
        &["result"]
    )
    .unwrap()
});

static METRIC_EMBEDDING_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!(
        "imembed_embedding_duration",
        "duration of normalization plus embedding computation in seconds"
    )
    .unwrap()
});

static METRIC_GATE_WAIT: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!(
        "imembed_gate_wait_duration",
        "time spent waiting for the store gate in seconds",
        exponential_buckets(1e-5, 4.0, 10).unwrap()
    )
    .unwrap()
});

static METRIC_ERASE_OUTCOME: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "imembed_erase_outcome_count",
        "count of bulk erase operations by outcome",
        &["outcome"]
    )
    .unwrap()
});

/// 记录一次摘要查询结果
pub fn inc_lookup(hit: bool) {
    METRIC_CACHE_LOOKUP.with_label_values(&[if hit { "hit" } else { "miss" }]).inc();
}

pub fn observe_embedding_duration(seconds: f64) {
    METRIC_EMBEDDING_DURATION.observe(seconds);
}

pub fn observe_gate_wait(seconds: f64) {
    METRIC_GATE_WAIT.observe(seconds);
}

pub fn inc_erase_outcome(outcome: &str) {
    METRIC_ERASE_OUTCOME.with_label_values(&[outcome]).inc();
}

/// 以文本格式导出所有指标
pub fn gather_text() -> String {
    let encoder = TextEncoder::new();
    encoder.encode_to_string(&prometheus::gather()).unwrap_or_default()
}
