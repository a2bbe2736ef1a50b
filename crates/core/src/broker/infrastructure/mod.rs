pub mod in_memory_broker;
pub mod redis_broker;
