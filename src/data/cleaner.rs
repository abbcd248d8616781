//! Data Cleaner Module
//! Removes ghost cells and structural columns (coordinates, time) from
//! simulation output before dimensionality reduction.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::loader::DataLoader;

#[derive(Error, Debug)]
pub enum CleanError {
    #[error("dim can only be 2 or 3, got {0}. Use 2 for 2D-plane data and 3 for 3D-volume data")]
    InvalidDimension(u8),
    #[error("Column not found: {0}")]
    MissingColumn(String),
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Dimensionality of the simulation domain the table was sampled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Domain {
    /// 2D plane: the out-of-plane velocity component carries no information
    Plane,
    /// 3D volume
    Volume,
}

impl TryFrom<u8> for Domain {
    type Error = CleanError;

    fn try_from(dim: u8) -> Result<Self, Self::Error> {
        match dim {
            2 => Ok(Domain::Plane),
            3 => Ok(Domain::Volume),
            other => Err(CleanError::InvalidDimension(other)),
        }
    }
}

impl From<Domain> for u8 {
    fn from(domain: Domain) -> Self {
        match domain {
            Domain::Plane => 2,
            Domain::Volume => 3,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}D", u8::from(*self))
    }
}

/// Names of the structural columns written by the simulation export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanSchema {
    /// Spatial coordinate columns, always dropped
    pub coordinates: Vec<String>,
    /// Time column, always dropped
    pub time: String,
    /// Ghost-cell marker column, dropped together with ghost rows when present
    pub ghost_marker: String,
    /// Marker value identifying a ghost cell
    pub ghost_value: i64,
    /// Dropped only for 2D-plane data
    pub plane_only: Vec<String>,
}

impl Default for CleanSchema {
    fn default() -> Self {
        Self {
            coordinates: (0..3).map(|i| format!("XYZ:{i}")).collect(),
            time: "T".to_string(),
            ghost_marker: "vtkGhostType".to_string(),
            ghost_value: 2,
            plane_only: vec!["U:2".to_string()],
        }
    }
}

impl CleanSchema {
    /// Columns that must be present and are dropped for the given domain.
    fn required_drops(&self, domain: Domain) -> Vec<String> {
        let mut cols = self.coordinates.clone();
        cols.push(self.time.clone());
        if domain == Domain::Plane {
            cols.extend(self.plane_only.iter().cloned());
        }
        cols
    }
}

/// Handles in-place cleaning of simulation tables.
pub struct DataCleaner;

impl DataCleaner {
    /// Remove ghost rows and structural columns from `df` in place.
    ///
    /// Every column to drop is checked before anything is mutated, so a
    /// failed call leaves the table untouched.
    pub fn clean(df: &mut DataFrame, domain: Domain, schema: &CleanSchema) -> Result<(), CleanError> {
        let mut cols_to_drop = schema.required_drops(domain);
        if let Some(missing) = cols_to_drop
            .iter()
            .find(|name| !DataLoader::has_column(df, name))
        {
            return Err(CleanError::MissingColumn(missing.clone()));
        }

        let has_ghosts = DataLoader::has_column(df, &schema.ghost_marker);
        let mut cleaned = if has_ghosts {
            cols_to_drop.push(schema.ghost_marker.clone());
            Self::remove_ghost_rows(df, schema)?
        } else {
            df.clone()
        };

        for name in &cols_to_drop {
            cleaned.drop_in_place(name)?;
        }

        log::info!(
            "Cleaned {} data: dropped {:?}, {} -> {} rows, {} feature columns left",
            domain,
            cols_to_drop,
            df.height(),
            cleaned.height(),
            cleaned.width()
        );
        *df = cleaned;
        Ok(())
    }

    /// Filter out rows whose ghost marker equals the ghost value.
    /// Rows with a null marker are kept.
    fn remove_ghost_rows(df: &DataFrame, schema: &CleanSchema) -> Result<DataFrame, CleanError> {
        let filtered = df
            .clone()
            .lazy()
            .filter(
                col(schema.ghost_marker.as_str())
                    .neq_missing(lit(schema.ghost_value)),
            )
            .collect()?;

        let removed = df.height() - filtered.height();
        if removed > 0 {
            log::debug!("Removed {} ghost rows", removed);
        }
        Ok(filtered)
    }
}

/// Clean a table in place using the default simulation schema.
///
/// `dim` must be 2 (plane) or 3 (volume).
pub fn clean_data(df: &mut DataFrame, dim: u8) -> Result<(), CleanError> {
    let domain = Domain::try_from(dim)?;
    DataCleaner::clean(df, domain, &CleanSchema::default())
}
