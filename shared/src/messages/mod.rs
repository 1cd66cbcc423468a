//! Message types exchanged between the engine, the webserver and clients

pub mod quotes;
pub mod requests;
pub mod summary;

pub use quotes::*;
pub use requests::*;
pub use summary::*;
