mod events;
mod phase;

pub use events::RelayEvent;
pub use phase::RelayPhase;
