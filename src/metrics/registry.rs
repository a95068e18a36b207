use lazy_static::lazy_static;
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

lazy_static! {
    pub static ref HTTP_ENVELOPES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_envelopes_total",
        "Total response envelopes emitted",
        &["kind", "code", "status"]  // kind: success, failure
    )
    .unwrap();

    pub static ref UNHANDLED_ERRORS_TOTAL: IntCounter = register_int_counter!(
        "unhandled_errors_total",
        "Errors with no registry entry, answered with a generic 500"
    )
    .unwrap();
}

/// Initialize all metrics (called on startup)
pub fn init_metrics() {
    // Force lazy_static initialization
    lazy_static::initialize(&HTTP_ENVELOPES_TOTAL);
    lazy_static::initialize(&UNHANDLED_ERRORS_TOTAL);
}
