pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    DEFAULT_SEEDS, load_seeds_from_file, load_seeds_from_source, parse_seed_line, resolve_db_path,
};
