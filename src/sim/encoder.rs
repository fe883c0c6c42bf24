//! Candidate encoding.
//!
//! The search space is one-dimensional: a candidate is an integer row index
//! into a fixed table of geocoded camp locations. This module loads the two
//! reference tables and turns an index into everything the materializer
//! needs: coordinates, the nearest reachable location in the transport
//! network, and the connection distance.

use std::path::Path;

use crate::error::{CampOptError, Result};

/// Native unit of the route-distance table is metres; candidates carry
/// kilometres.
const METRES_PER_KM: f64 = 1000.0;

/// Ordered table of candidate camp coordinates.
///
/// Immutable reference data, loaded once per run. Row `i` holds the
/// `(longitude, latitude)` of candidate `i`.
#[derive(Debug, Clone)]
pub struct CampLocationTable {
    coords: Vec<(f64, f64)>,
}

impl CampLocationTable {
    /// Loads the table from a CSV file with a header row; columns 1 and 2
    /// of each record are longitude and latitude.
    pub fn load(path: &Path) -> Result<CampLocationTable> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut coords = Vec::new();
        for record in reader.records() {
            let record = record?;
            let lon = parse_cell(&record, 1, path)?;
            let lat = parse_cell(&record, 2, path)?;
            coords.push((lon, lat));
        }
        if coords.is_empty() {
            return Err(CampOptError::Config(format!(
                "camp location table {} has no data rows",
                path.display()
            )));
        }
        Ok(CampLocationTable { coords })
    }

    /// Number of candidate locations.
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// True when the table holds no candidates.
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Largest valid candidate index; the search space is `[0, max_index]`.
    pub fn max_index(&self) -> usize {
        self.coords.len() - 1
    }

    /// Coordinates of candidate `index`.
    ///
    /// # Panics
    /// Panics if `index` is out of range. Out-of-range indices are a caller
    /// contract violation: the search space must be bounded upstream.
    pub fn coords(&self, index: usize) -> (f64, f64) {
        self.coords[index]
    }

    #[cfg(test)]
    pub(crate) fn from_coords(coords: Vec<(f64, f64)>) -> CampLocationTable {
        CampLocationTable { coords }
    }
}

/// Precomputed origin-candidate distance table.
///
/// Rows are candidate camp locations (same order as [`CampLocationTable`]),
/// columns from index 3 onward are named destinations in the existing
/// transport network, and cells are distances in metres.
#[derive(Debug, Clone)]
pub struct RouteDistanceTable {
    destinations: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl RouteDistanceTable {
    /// First column carrying a distance cell; earlier columns describe the
    /// candidate itself.
    const FIRST_DISTANCE_COLUMN: usize = 3;

    /// Loads the table from a CSV file with a header row.
    pub fn load(path: &Path) -> Result<RouteDistanceTable> {
        let mut reader = csv::Reader::from_path(path)?;
        let destinations: Vec<String> = reader
            .headers()?
            .iter()
            .skip(Self::FIRST_DISTANCE_COLUMN)
            .map(|h| h.to_string())
            .collect();
        if destinations.is_empty() {
            return Err(CampOptError::Config(format!(
                "route distance table {} has no destination columns",
                path.display()
            )));
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let mut row = Vec::with_capacity(destinations.len());
            for col in Self::FIRST_DISTANCE_COLUMN..record.len() {
                row.push(parse_cell(&record, col, path)?);
            }
            if row.len() != destinations.len() {
                return Err(CampOptError::Config(format!(
                    "route distance table {} row {} has {} cells, expected {}",
                    path.display(),
                    rows.len(),
                    row.len(),
                    destinations.len()
                )));
            }
            rows.push(row);
        }
        Ok(RouteDistanceTable { destinations, rows })
    }

    /// Number of candidate rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Nearest destination for candidate `index`: the column with the
    /// row-wise minimum distance. Returns the destination name and the
    /// distance converted to kilometres. Ties resolve to the first column.
    ///
    /// # Panics
    /// Panics if `index` is out of range.
    pub fn nearest(&self, index: usize) -> (&str, f64) {
        let row = &self.rows[index];
        let mut best = 0;
        for (col, &d) in row.iter().enumerate() {
            if d < row[best] {
                best = col;
            }
        }
        (&self.destinations[best], row[best] / METRES_PER_KM)
    }

    #[cfg(test)]
    pub(crate) fn from_parts(destinations: Vec<String>, rows: Vec<Vec<f64>>) -> RouteDistanceTable {
        RouteDistanceTable { destinations, rows }
    }
}

/// One proposed camp-location choice, fully decoded.
///
/// Derived from the reference tables at evaluation time; never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Row index into the camp location table.
    pub index: usize,
    /// Candidate longitude.
    pub lon: f64,
    /// Candidate latitude.
    pub lat: f64,
    /// Name of the nearest reachable location in the transport network.
    pub nearest_location: String,
    /// Distance to the nearest location, in kilometres.
    pub connection_km: f64,
}

/// Decodes a candidate index against the two reference tables.
///
/// # Panics
/// Panics if `index` is out of range for either table; the optimizer bounds
/// the search space to `[0, max_index]`, so this is a logic error upstream.
pub fn encode(
    index: usize,
    camps: &CampLocationTable,
    routes: &RouteDistanceTable,
) -> Candidate {
    assert!(
        index < camps.len() && index < routes.len(),
        "candidate index {index} outside the camp table"
    );
    let (lon, lat) = camps.coords(index);
    let (nearest, km) = routes.nearest(index);
    Candidate {
        index,
        lon,
        lat,
        nearest_location: nearest.to_string(),
        connection_km: km,
    }
}

fn parse_cell(record: &csv::StringRecord, col: usize, path: &Path) -> Result<f64> {
    let raw = record.get(col).ok_or_else(|| {
        CampOptError::Config(format!(
            "{}: record has no column {col}",
            path.display()
        ))
    })?;
    raw.trim().parse::<f64>().map_err(|_| {
        CampOptError::Config(format!(
            "{}: cell '{raw}' in column {col} is not a number",
            path.display()
        ))
    })
}

// ============================================================================
// Tests
// ============================================================================
