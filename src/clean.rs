//! Normalization of the address values found in `addr:*` tags.

pub mod postcode;
pub mod street;

pub use postcode::clean_post;
pub use street::audit_street_type;
