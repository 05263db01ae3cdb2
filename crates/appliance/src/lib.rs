#![doc = include_str!("../README.md")]

pub mod call_log;
pub mod error;
pub mod faults;
pub mod simulator;
mod store;
pub mod validation;

pub use call_log::{CallLog, CallRecord};
pub use error::ApplianceError;
pub use faults::FaultPlan;
pub use simulator::{SimulatedAppliance, SimulatedApplianceBuilder};
