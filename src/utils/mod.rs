pub mod signal;
pub mod validate;
