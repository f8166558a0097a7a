pub mod address;
pub mod ping;
pub mod probe;
pub mod status;
