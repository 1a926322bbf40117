use lazy_static::lazy_static;
use prometheus::{register_gauge, register_int_counter, register_int_counter_vec};
use prometheus::{Gauge, IntCounter, IntCounterVec};

const PREFIX: &str = "workshop";

lazy_static! {
    pub static ref MIRROR_FAILURES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_mirror_failures_total", PREFIX),
        "Index mirror writes that failed and were recorded in the sync ledger",
        &["operation"]
    )
    .unwrap();
    pub static ref SYNC_REPLAYS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_sync_replays_total", PREFIX),
        "Ledger entries successfully replayed into the search index"
    )
    .unwrap();
    pub static ref SYNC_DEAD_LETTERS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_sync_dead_letters_total", PREFIX),
        "Ledger entries abandoned after exhausting the replay attempt budget"
    )
    .unwrap();
    pub static ref SYNC_LEDGER_PENDING: Gauge = register_gauge!(
        format!("{}_sync_ledger_pending", PREFIX),
        "Ledger entries currently awaiting replay"
    )
    .unwrap();
    pub static ref SEARCH_FALLBACKS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_search_fallbacks_total", PREFIX),
        "Searches served from the primary store because the index was down"
    )
    .unwrap();
}

/// Touch every metric so it shows up in the exposition before first use.
pub fn init_metrics() {
    MIRROR_FAILURES_TOTAL.reset();
    SYNC_REPLAYS_TOTAL.reset();
    SYNC_DEAD_LETTERS_TOTAL.reset();
    SYNC_LEDGER_PENDING.set(0.0);
    SEARCH_FALLBACKS_TOTAL.reset();
}
