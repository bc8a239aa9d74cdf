//! Types shared by every grid crate: cell model, observer protocol and fault codes.

pub mod domain;
pub mod error;
pub mod protocol;
