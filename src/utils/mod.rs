pub mod logging;
pub mod report;

pub use logging::{append_log_line, init_log_file, log_startup, truncate_text};
pub use report::render_report;
