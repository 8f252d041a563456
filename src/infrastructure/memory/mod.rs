mod in_memory_storage;

pub use in_memory_storage::InMemoryObjectStorage;
