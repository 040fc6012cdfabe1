pub mod aggregate;
pub mod config;
pub mod error;
pub mod event;
pub mod normalize;
pub mod stats;
pub mod timestamp;
pub mod window;

pub use aggregate::{EndpointStat, Metrics, SortKey, SortOrder};
pub use config::PulseConfig;
pub use error::PulseError;
pub use event::LogEvent;
pub use normalize::{normalize, parse_line};
pub use window::Window;
