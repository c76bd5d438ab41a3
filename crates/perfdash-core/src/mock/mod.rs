//! In-process substitute for the dashboard backend.
//!
//! [`MockGateway`] resolves a request against the [`RouteTable`], waits a
//! randomized delay and answers from the synthetic generators. Requests it
//! does not recognise are left for the real transport.

pub mod gateway;
pub mod handlers;
pub mod routes;
pub mod store;

pub use gateway::{MockGateway, PendingResponse};
pub use handlers::{handle, HandlerContext};
pub use routes::{Endpoint, RouteMatch, RouteTable};
pub use store::{ConfigStore, ProxyConfig, ProxyConfigUpdate};
