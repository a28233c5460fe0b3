//! Ports: the trait seams between the engine and the outside world.
//!
//! Every external dependency (language model, location data, flight
//! inventory, session persistence, outbound delivery) sits behind one of
//! these traits, so the application layer is testable with in-process fakes.

mod flight_provider;
mod language_model;
mod location_resolver;
mod message_sender;
mod session_store;

pub use flight_provider::FlightProvider;
pub use language_model::{LanguageModel, ModelError};
pub use location_resolver::LocationResolver;
pub use message_sender::MessageSender;
pub use session_store::{SessionStore, StoreError};
