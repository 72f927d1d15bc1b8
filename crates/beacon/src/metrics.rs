use checkpointz_cache::metrics::create_int_gauge_vec;
use lazy_static::lazy_static;
use prometheus_exporter::prometheus::IntGaugeVec;

use crate::config::OperatingMode;

lazy_static! {
    pub static ref HEAD_EPOCH: IntGaugeVec = create_int_gauge_vec(
        "checkpointz_beacon_head_epoch",
        "The current head finalized epoch",
        &[]
    );
    pub static ref SERVING_EPOCH: IntGaugeVec = create_int_gauge_vec(
        "checkpointz_beacon_serving_epoch",
        "The finalized epoch of the bundle currently being served",
        &[]
    );
    pub static ref OPERATING_MODE: IntGaugeVec = create_int_gauge_vec(
        "checkpointz_beacon_operating_mode",
        "The operating mode of the instance",
        &["mode"]
    );
}

pub fn observe_head_epoch(epoch: u64) {
    HEAD_EPOCH.with_label_values(&[]).set(epoch as i64);
}

pub fn observe_serving_epoch(epoch: u64) {
    SERVING_EPOCH.with_label_values(&[]).set(epoch as i64);
}

pub fn observe_operating_mode(mode: OperatingMode) {
    OPERATING_MODE
        .with_label_values(&[&mode.to_string()])
        .set(1);
}
