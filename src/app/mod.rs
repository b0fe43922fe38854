//! Application core — pure configuration logic, zero I/O.
//!
//! The command orchestrator in [`service`] composes the schema registry,
//! merge engine, and level store into the Get / Set / Save operations.
//! All interaction with storage hardware, the reboot machinery, and
//! observers happens through **port traits** defined in [`ports`], keeping
//! this layer fully testable without a device.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
