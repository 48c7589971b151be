pub mod codes;
mod error;
pub mod evapotranspiration;
pub mod profile;
mod query;

pub use error::QueryError;
pub use evapotranspiration::{EvapotranspirationModel, Fao56};
pub use query::{QueryOrchestrator, QueryState};
