mod events;
mod logging;

pub use events::spawn_event_logger;
pub use logging::{build_filter, init_logging};
