//! Services module for business logic

pub mod acceptance_fee;
