//! Regex route table, matcher and dispatcher.

mod dispatch;
mod router;
mod table;

pub use dispatch::{dispatch, MAX_BODY_BYTES};
pub use router::{CompiledRouter, PatternError, RouteError, RouteMatch};
pub use table::{handler, Handler, MethodMap, Params, RouteMap, RouteRequest};
