//! `evently-events`: the event/registration domain model.
//!
//! Pure types and rules; persistence lives in `evently-infra`.

pub mod event;
pub mod patch;
pub mod registration;

pub use event::{Event, EventDetails};
pub use patch::{EventField, EventPatch};
pub use registration::Registration;
