//! Output directory preparation.

mod guard;
mod retry;

pub use guard::prepare_output_dir;
pub use retry::RetryPolicy;
