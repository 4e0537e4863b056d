//! Domain model: menu items, promotions, orders and payments, plus the ports
//! through which the application layer reaches its collaborators.

pub mod customer;
pub mod menu;
pub mod money;
pub mod order;
pub mod payment;
pub mod ports;
pub mod promotion;
