// Business logic services

pub mod event;

pub use event::EventService;
