//! Unit-conversion pipeline
//!
//! Entered conversions form a directed graph over units. For every meter unit
//! the graph is searched breadth-first and each reachable graphable unit gets
//! one derived conversion (a cik row) composed along the shortest path.

use std::collections::{HashMap, HashSet, VecDeque};

use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::UnitRepository;
use crate::models::{Cik, Conversion, Unit, UnitType};
use crate::utils::AppError;

/// One directed edge of the conversion graph
#[derive(Debug, Clone, Copy)]
struct Edge {
    to: i64,
    slope: f64,
    intercept: f64,
}

/// Derive the cik rows for `units` from the entered `conversions`
pub fn compute_cik(units: &[Unit], conversions: &[Conversion]) -> Vec<Cik> {
    let unit_types: HashMap<i64, UnitType> = units.iter().map(|u| (u.id, u.type_of_unit)).collect();

    let mut graph: HashMap<i64, Vec<Edge>> = HashMap::new();
    for conversion in conversions {
        graph.entry(conversion.source_id).or_default().push(Edge {
            to: conversion.destination_id,
            slope: conversion.slope,
            intercept: conversion.intercept,
        });

        if conversion.bidirectional {
            if conversion.slope == 0.0 {
                warn!(
                    source = conversion.source_id,
                    destination = conversion.destination_id,
                    "Skipping reverse of a bidirectional conversion with zero slope"
                );
                continue;
            }
            graph.entry(conversion.destination_id).or_default().push(Edge {
                to: conversion.source_id,
                slope: 1.0 / conversion.slope,
                intercept: -conversion.intercept / conversion.slope,
            });
        }
    }

    let mut rows = Vec::new();
    for meter_unit in units.iter().filter(|u| u.type_of_unit == UnitType::Meter) {
        let mut visited: HashSet<i64> = HashSet::from([meter_unit.id]);
        let mut queue: VecDeque<(i64, f64, f64)> = VecDeque::from([(meter_unit.id, 1.0, 0.0)]);

        while let Some((unit_id, slope, intercept)) = queue.pop_front() {
            for edge in graph.get(&unit_id).into_iter().flatten() {
                // Meter units are only ever the start of a path
                match unit_types.get(&edge.to) {
                    None | Some(UnitType::Meter) => continue,
                    Some(_) => {}
                }
                if !visited.insert(edge.to) {
                    continue;
                }

                let composed_slope = slope * edge.slope;
                let composed_intercept = intercept * edge.slope + edge.intercept;
                rows.push(Cik {
                    source_id: meter_unit.id,
                    destination_id: edge.to,
                    slope: composed_slope,
                    intercept: composed_intercept,
                });
                queue.push_back((edge.to, composed_slope, composed_intercept));
            }
        }
    }

    rows
}

/// Recompute and store the cik table
pub async fn redo_cik(pool: &SqlitePool) -> Result<usize, AppError> {
    let repo = UnitRepository::new(pool.clone());
    let units = repo.list_all().await?;
    let conversions = repo.list_conversions().await?;

    let rows = compute_cik(&units, &conversions);
    repo.replace_cik(&rows).await?;

    info!(
        units = units.len(),
        conversions = conversions.len(),
        cik = rows.len(),
        "Recomputed derived conversions"
    );
    Ok(rows.len())
}
