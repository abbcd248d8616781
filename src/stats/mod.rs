//! Statistics module - Feature standardization

mod scaler;

pub use scaler::{scale_data, ColumnStats, StandardScaler};
