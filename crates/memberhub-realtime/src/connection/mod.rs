pub mod authenticator;
pub mod handle;
pub mod pool;
