pub mod in_memory_identity_store;
