pub mod models;
pub mod store;
pub mod writer;

pub use store::RecordStore;
pub use writer::RecordWriter;
