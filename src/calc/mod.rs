// src/calc/mod.rs
// Pure computations over already-loaded records. Nothing in here touches the database or the clock.
pub mod decimal;
pub mod format;
pub mod margin;
pub mod metrics;
pub mod pricing;
pub mod shipment_status;
