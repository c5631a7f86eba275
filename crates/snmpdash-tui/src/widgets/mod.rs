pub mod metrics_fmt;
pub mod status_indicator;
