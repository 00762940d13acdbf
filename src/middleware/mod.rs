mod admin;
mod tracing;

pub use admin::admin_auth_middleware;
pub use tracing::{request_id_middleware, RequestId, REQUEST_ID_HEADER};
