//! Asset discovery, classification and transformation.

mod disposition;
mod fingerprint;
mod process;
mod route;
mod scan;

// Types
pub use disposition::Disposition;
pub use route::FileRecord;

// Scanning (pure functions)
pub use scan::scan_source_files;

// Hashing
pub use fingerprint::fingerprint;

// Processing (side effects)
pub use process::{ProcessOutcome, process_file};
