//! Process observability.

pub mod logging;
