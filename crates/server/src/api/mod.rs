pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod runs;
pub mod ws;

pub use routes::create_router;
pub use ws::{BroadcastReporter, WsBroadcaster, WsMessage};
