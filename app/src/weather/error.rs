use derive_more::derive::{Display, Error, From};

use crate::core::Channel;

#[derive(Debug, Display, Error, From)]
pub enum QueryError {
    #[display("Node is not configured")]
    NotConfigured,

    #[display("Error fetching weather data: {:#}", _0)]
    #[from]
    Fetch(#[error(not(source))] anyhow::Error),

    #[display("Malformed response: missing {}", _0)]
    MalformedResponse(#[error(not(source))] &'static str),

    #[display("Field {} for channel {} not found", tag, channel)]
    FieldNotFound { channel: Channel, tag: String },

    #[display("Field {} for channel {} is not a number", tag, channel)]
    InvalidValue { channel: Channel, tag: String },
}
