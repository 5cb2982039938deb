//! Multi-participant scenarios over a shared [`ether_bus::MemorySegment`].

pub mod end_to_end;
pub mod resilience;
