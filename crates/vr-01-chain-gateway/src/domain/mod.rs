//! Gateway domain: error taxonomy and revert decoding.

pub mod errors;
pub mod revert;

pub use errors::{GatewayError, GatewayResult};
pub use revert::{decode_revert, encode_custom_error, encode_error_string, selector, RevertReason};
