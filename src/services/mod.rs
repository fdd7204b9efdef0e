pub mod cell_io;
pub mod name_parser;
pub mod row_cache;
pub mod sheet_surface;
pub mod status_views;
pub mod verification;

pub use cell_io::{CellIo, CellSurface, WriteOutcome};
pub use name_parser::{parse, SplitName};
pub use row_cache::{CacheStore, FileStore, MemoryStore, RowCache};
pub use sheet_surface::SheetSurface;
pub use status_views::{PortalStatusView, StatusView, ViewHit, ViewKind};
pub use verification::VerificationReconciler;
