pub mod environment;
pub mod paths;

pub use environment::resolve_index_dir;
pub use paths::{absolutize, collect_files, format_path_with_tilde};
