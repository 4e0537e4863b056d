//! Outer adapters: CSV seed readers, the JSON tool surface and the tool
//! executors that sit between the agent runtime and the engine.

pub mod agent;
pub mod csv;
pub mod tools;
