mod payme_auth;

pub use payme_auth::{is_authorized, PaymeAuthMiddlewareFactory, PaymeAuthMiddlewareService};
