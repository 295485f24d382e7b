//! External service integrations.

pub mod clear_client {
    pub use crate::clear_client::*;
}
