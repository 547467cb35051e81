/*
 *  The KataGo analysis interface: the line-delimited JSON wire model, the
 *  launch configuration, and the child-process driver.
 */

pub mod engine;
pub mod launch;
pub mod profile;
pub mod query;
pub mod response;

use response::SuccessResponse;

/// Anything that hands out engine responses keyed by query id. The driver
/// implements this; the composer depends only on the trait so it can be
/// exercised without a child process.
pub trait ResponseSource {
    /// Pops the head of the per-id FIFO, or `None` if nothing has arrived.
    fn next_response(&self, query_id: &str) -> Option<SuccessResponse>;

    /// Whether the response stream has ended for good; once this is true
    /// and the queues are drained, no further responses will ever arrive.
    fn closed(&self) -> bool {
        false
    }
}

pub mod prelude {
    pub use super::ResponseSource;
    pub use super::engine::Engine;
    pub use super::launch::LaunchConfiguration;
    pub use super::profile::HumanProfile;
    pub use super::query::{Placement, Player, Query, Rules};
    pub use super::response::{
        ErrorResponse, MoveInfo, Response, RootInfo, SuccessResponse, WarningResponse,
    };
}
