//! Buffer implementations

mod blocking;

pub use blocking::BlockingBuffer;
