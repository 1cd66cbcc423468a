//! Quote API client
//!
//! Talks to the quote webserver and runs the county resolution workflow:
//! trigger a run, poll for it when the request does not come back, preview
//! members whose ZIP spans several counties, then persist the choices with a
//! final run.

pub mod api_client;
pub mod chooser;
pub mod error;
pub mod session;
pub mod summary;

pub use api_client::{HttpQuoteApi, MockQuoteApi, QuoteApi};
pub use chooser::{
    parse_selection, CountyChoice, CountyChooser, MockCountyChooser, PresetCountyChooser, StdinCountyChooser,
};
pub use error::{ClientError, ClientResult};
pub use session::{merge_entry, QuoteSession, RunOutcome, SessionConfig, SessionState};
pub use summary::render_summary;
