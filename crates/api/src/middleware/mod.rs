//! Request middleware.

pub mod admin;

pub use admin::{ADMIN_TOKEN_HEADER, Admin, AdminFlag, admin_middleware};
