// amicale-core: request lifecycle, screen boundaries, and multi-request
// aggregation on top of amicale-api

pub mod aggregator;
pub mod boundary;
pub mod lifecycle;
pub mod nav;
pub mod present;

pub use aggregator::{AggregateState, AggregatorConfig, MultiRequestAggregator, RequestDescriptor};
pub use boundary::{BoundaryConfig, RenderState, RequestBoundary};
pub use lifecycle::{
    LifecyclePhase, LifecycleState, MIN_REFRESH_INTERVAL, Refresh, RequestFn, RequestLifecycle,
    request_fn,
};
pub use nav::{LoginRedirect, Navigator};
pub use present::{ErrorDisplay, ErrorOverride, describe, display_for};
