pub mod cache_entry;
pub mod contractor;
pub mod workflow_run;

pub use cache_entry::{CacheEntry, CacheUpdate, Completed};
pub use contractor::{Contractor, RowRecord};
pub use workflow_run::{Step, Verdict, WorkflowRun};
