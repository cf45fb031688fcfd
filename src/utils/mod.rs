//! Build metadata and logging setup.

pub mod build_info;
pub mod logging;

pub use build_info::{version_line, BUILD_COMMIT, BUILD_DATE};
pub use logging::{init_logging, DEFAULT_FILTER};
