//! Ports (interfaces) consumed by the use cases

pub mod completion;
pub mod presenter;
