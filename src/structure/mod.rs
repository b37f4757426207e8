pub mod store;
pub mod types;

pub use store::StructureStore;
pub use types::{FieldDescriptor, TableInfo, TableStructure};
