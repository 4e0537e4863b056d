//! Application layer: the `OrderEngine` orchestrates the domain rules over the
//! store ports for checkout, payment confirmation and lookups.

pub mod engine;
