//! Nixie display pipeline
//!
//! Fetches a page, pulls a number out of it and drives the tubes:
//!
//! ```text
//! FetchTransport --events--> scan --> display_value
//!                                          |
//!                          decode (tube symbol table)
//!                                          |
//!                          encode (wiring table) --> ShiftRegisterTransport
//! ```

pub mod encode;
pub mod pipeline;
pub mod scan;
pub mod state;

pub use encode::EXPLICIT_BLANKING;
pub use pipeline::DisplayPipeline;
pub use state::{DisplayError, DisplayState, PipelineFault};
