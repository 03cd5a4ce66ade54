/// Чтение исходных файлов и запись результатов

pub mod arff;
pub mod loader;
pub mod persistence;

pub use loader::{load_fixed_schema, load_flow_csv, resolve_case_insensitive, SourceFormat};
pub use persistence::OutputStore;
