//! Day-partitioned nearest-neighbour join between two dated point sets.
//!
//! For every query point, the join looks only at target points of the same calendar day,
//! finds the single great-circle nearest one and keeps the pair when it lies within a
//! distance bound. A fresh spatial index is bulk-loaded for each day.

use crate::geo::sphere::{great_circle_m, unit_vector};
use crate::LatLon;
use chrono::NaiveDate;
use log::debug;
use rayon::prelude::*;
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use std::collections::BTreeMap;

/// A location observed on a calendar day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatedPoint {
    pub date: NaiveDate,
    pub location: LatLon,
}

impl DatedPoint {
    pub fn new(date: NaiveDate, location: LatLon) -> Self {
        Self { date, location }
    }
}

/// A query point paired with its nearest same-day target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestMatch {
    /// Position of the query point in the query slice.
    pub query: usize,
    /// Position of the matched point in the target slice.
    pub target: usize,
    pub distance_m: f64,
}

/// Point stored in the R-tree: its unit-sphere embedding and its row in the day's point list.
#[derive(Debug, Clone, Copy)]
struct SpherePoint {
    position: [f64; 3],
    row: usize,
}

impl RTreeObject for SpherePoint {
    type Envelope = AABB<[f64; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for SpherePoint {
    /// Squared chord length to `point`, monotone in the great-circle distance.
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        self.position
            .iter()
            .zip(point)
            .map(|(a, b)| (a - b) * (a - b))
            .sum()
    }
}

/// Great-circle nearest-neighbour index over a fixed set of locations.
#[derive(Debug, Clone)]
pub struct SphereIndex {
    rtree: RTree<SpherePoint>,
    locations: Vec<LatLon>,
}

impl SphereIndex {
    /// Bulk-loads an index; rows are positions in `locations`.
    pub fn new(locations: Vec<LatLon>) -> Self {
        let points = locations
            .iter()
            .enumerate()
            .map(|(row, location)| SpherePoint {
                position: unit_vector(*location),
                row,
            })
            .collect();
        Self {
            rtree: RTree::bulk_load(points),
            locations,
        }
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Returns the row of the nearest location and its great-circle distance in meters.
    ///
    /// Among locations at exactly the same distance the lowest row wins.
    pub fn nearest(&self, location: LatLon) -> Option<(usize, f64)> {
        let query = unit_vector(location);
        let mut candidates = self.rtree.nearest_neighbor_iter_with_distance_2(&query);
        let (first, best_distance_2) = candidates.next()?;
        let mut best_row = first.row;
        for (candidate, distance_2) in candidates {
            if distance_2 > best_distance_2 {
                break;
            }
            best_row = best_row.min(candidate.row);
        }
        Some((best_row, great_circle_m(location, self.locations[best_row])))
    }
}

/// Groups point positions by day. Points with non-finite coordinates are left out.
pub fn partition_by_day(points: &[DatedPoint]) -> BTreeMap<NaiveDate, Vec<usize>> {
    let mut days: BTreeMap<NaiveDate, Vec<usize>> = BTreeMap::new();
    for (row, point) in points.iter().enumerate() {
        if point.location.is_finite() {
            days.entry(point.date).or_default().push(row);
        }
    }
    days
}

/// Matches every query point with its nearest same-day target within `max_distance_m`.
///
/// Query days without any target are skipped, as are queries whose nearest target lies
/// beyond the bound; neither is an error. Matches are ordered by day, then by query position,
/// whether or not the days run in `parallel`.
pub fn nearest_same_day(
    queries: &[DatedPoint],
    targets: &[DatedPoint],
    max_distance_m: f64,
    parallel: bool,
) -> Vec<NearestMatch> {
    let target_days = partition_by_day(targets);
    let query_days: Vec<(NaiveDate, Vec<usize>)> = partition_by_day(queries).into_iter().collect();

    let match_day = |(day, query_rows): &(NaiveDate, Vec<usize>)| -> Vec<NearestMatch> {
        let Some(target_rows) = target_days.get(day) else {
            debug!(
                "No weather observation on {}, skipping {} radiation points",
                day,
                query_rows.len()
            );
            return Vec::new();
        };
        let index = SphereIndex::new(target_rows.iter().map(|&r| targets[r].location).collect());

        query_rows
            .iter()
            .filter_map(|&query| {
                let (row, distance_m) = index.nearest(queries[query].location)?;
                (distance_m <= max_distance_m).then_some(NearestMatch {
                    query,
                    target: target_rows[row],
                    distance_m,
                })
            })
            .collect()
    };

    let per_day: Vec<Vec<NearestMatch>> = if parallel {
        query_days.par_iter().map(match_day).collect()
    } else {
        query_days.iter().map(match_day).collect()
    };
    per_day.into_iter().flatten().collect()
}
