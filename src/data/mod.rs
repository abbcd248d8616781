//! Data module - CSV loading, cleaning and feature extraction

mod cleaner;
mod features;
mod loader;

pub use cleaner::{clean_data, CleanError, CleanSchema, DataCleaner, Domain};
pub use features::{FeatureError, FeatureMatrix};
pub use loader::{import_csv_data, DataLoader, LoaderError};
