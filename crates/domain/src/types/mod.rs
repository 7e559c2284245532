//! Domain types and models

pub mod mutation;
pub mod slot;
pub mod window;
pub mod wire_time;

pub use mutation::{
    CreateRequest, DeleteRequest, DeleteScope, RescheduleProposal, RescheduleRequest,
    UpdateRequest,
};
pub use slot::{Slot, SlotKey, SlotKind};
pub use window::TimeWindow;
