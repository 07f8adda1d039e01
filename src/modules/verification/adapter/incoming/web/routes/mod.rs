pub mod receive_event;

pub use receive_event::receive_verification_event_handler;
