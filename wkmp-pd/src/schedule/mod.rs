//! Schedule resolution: the cache of C1 and the recurrence engine of C2.

pub mod cache;
pub mod recurrence;

pub use cache::ScheduleCache;
pub use recurrence::resolve_occurrence;
