//! Capability traits implemented by values handed to the crate.

mod dispose;

pub use dispose::Dispose;
