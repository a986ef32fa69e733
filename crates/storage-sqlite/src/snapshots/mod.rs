mod keys;
mod model;
mod repository;

pub use model::EntryDB;
pub use repository::SqliteSnapshotStore;
