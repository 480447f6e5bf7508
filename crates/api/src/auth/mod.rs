//! Bearer-token validation.
//!
//! Tokens are minted by the external identity provider and verified here
//! with a shared HS256 secret; this service never issues tokens itself.

pub mod jwt;
