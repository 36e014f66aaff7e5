mod debounce;
mod driver;

pub use debounce::Debouncer;
pub use driver::{PlaybackSource, PlaybackStatus, PlaybackSyncDriver};
