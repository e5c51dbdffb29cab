//! MedQA dataset loading.

mod loader;

pub use loader::{DatasetError, LoadedDataset, load_dataset, parse_dataset};
