mod acl;
mod auth;
mod hmac;

pub use acl::AclMiddlewareFactory;
pub use auth::JwtAuthMiddlewareFactory;
pub use hmac::HmacMiddlewareFactory;
