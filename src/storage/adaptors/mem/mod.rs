mod mem_storage_engine;

pub use mem_storage_engine::*;

#[cfg(test)]
mod mem_engine_test;
