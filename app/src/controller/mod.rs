mod event;
mod params;
mod runner;

pub use event::{Command, NodeEvent};
pub use params::Notices;
pub use runner::{NodeTiming, WeatherNode};
