pub mod entities;
pub mod memory;
pub mod seaorm;
pub mod storage;

pub use memory::MemoryEventStore;
pub use seaorm::SeaOrmEventStore;
pub use storage::{EventStore, PointdataRecord, StorageError, StorageResult};
