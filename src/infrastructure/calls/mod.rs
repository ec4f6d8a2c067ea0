//! Call-tracking adapters

mod memory_call_list;

pub use memory_call_list::{CallStatus, MemoryCallList, TrackedCall};
