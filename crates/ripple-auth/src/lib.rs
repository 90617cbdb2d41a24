//! Token codec and password hashing. Pure functions, no state: signing
//! secrets are passed in by the caller, never read from the environment.

pub mod password;
pub mod tokens;
