pub mod error;
pub mod gateway;
pub mod http;
pub mod metadata;
pub mod paystack;
pub mod types;
