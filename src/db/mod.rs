mod pool;

pub use pool::{
    create_pool, sqlstate, EXCLUSION_VIOLATION, FOREIGN_KEY_VIOLATION, UNIQUE_VIOLATION,
};
