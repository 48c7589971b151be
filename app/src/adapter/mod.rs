pub mod aeris;
pub mod mqtt;
