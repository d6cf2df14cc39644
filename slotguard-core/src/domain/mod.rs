//! Domain types for SlotGuard

pub mod candle;
pub mod direction;
pub mod ids;
pub mod slot;

pub use candle::{Candle, CandleError};
pub use direction::{Decision, Direction, Signal};
pub use ids::EventId;
pub use slot::{SlotGranularity, TimeSlotKey};
