//! Fetch-and-publish runtime: one [`FetchManager`] per consumer.

mod manager;
mod pending;
mod result;

pub use manager::{DecodePolicy, FetchManager, ManagerConfig};
pub use pending::{PendingGuard, PendingRequest, PendingRequests};
pub use result::FetchResult;

pub use core_types::{LoadingStatus, RequestId};
pub use net::{FetchConfig, Fetcher, NetError};
