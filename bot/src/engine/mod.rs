pub mod dispatcher;
pub mod error;
pub mod events;
pub mod render;
pub mod session;
pub mod status;
pub mod store;
pub mod transitions;
pub mod transport;
