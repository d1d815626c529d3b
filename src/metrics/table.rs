//! Structured result tables: one row per joint plus a total row.

use serde::Serialize;

use crate::joints::{Joint, NUM_JOINTS, TOTAL_LABEL};
use crate::utils::nan_mean;

use super::TrackingCounts;

/// One row of the pose estimation table. Values are fractions in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct APRow {
    pub name: &'static str,
    pub ap: f64,
    pub precision: f64,
    pub recall: f64,
}

/// Average precision per joint and in total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct APTable {
    rows: Vec<APRow>,
    /// Joints without ground truth, left out of the total.
    excluded: Vec<&'static str>,
}

impl APTable {
    /// Build the table from per-joint `(ap, precision, recall)` values.
    ///
    /// `defined[j]` tells whether joint `j` has ground truth; undefined joints
    /// are excluded from the total.
    pub(crate) fn from_joint_values(values: &[(f64, f64, f64)], defined: &[bool]) -> Self {
        debug_assert_eq!(values.len(), NUM_JOINTS);

        let mut rows: Vec<APRow> = Joint::iter()
            .zip(values)
            .map(|(joint, &(ap, precision, recall))| APRow {
                name: joint.name(),
                ap,
                precision,
                recall,
            })
            .collect();

        let included = || rows.iter().zip(defined).filter(|(_, &d)| d).map(|(r, _)| r);
        let total = APRow {
            name: TOTAL_LABEL,
            ap: nan_mean(included().map(|r| r.ap)),
            precision: nan_mean(included().map(|r| r.precision)),
            recall: nan_mean(included().map(|r| r.recall)),
        };
        rows.push(total);

        Self {
            rows,
            excluded: excluded_names(defined),
        }
    }

    /// All `NUM_JOINTS + 1` rows, total last.
    pub fn rows(&self) -> &[APRow] {
        &self.rows
    }

    pub fn joint(&self, joint: Joint) -> &APRow {
        &self.rows[joint.index()]
    }

    pub fn total(&self) -> &APRow {
        &self.rows[NUM_JOINTS]
    }

    pub fn excluded(&self) -> &[&'static str] {
        &self.excluded
    }
}

/// One row of the tracking table. MOTP is a raw normalized distance, lower is better.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MOTRow {
    pub name: &'static str,
    pub mota: f64,
    pub motp: f64,
    pub precision: f64,
    pub recall: f64,
}

/// Tracking metrics per joint and in total, with the counts they came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MOTTable {
    rows: Vec<MOTRow>,
    excluded: Vec<&'static str>,
    counts: Vec<TrackingCounts>,
}

impl MOTTable {
    pub(crate) fn from_joint_rows(joint_rows: Vec<MOTRow>, counts: Vec<TrackingCounts>) -> Self {
        debug_assert_eq!(joint_rows.len(), NUM_JOINTS);

        let defined: Vec<bool> = counts.iter().map(|c| c.num_objects > 0).collect();
        let mut rows = joint_rows;

        let included = || rows.iter().zip(&defined).filter(|(_, &d)| d).map(|(r, _)| r);
        let total = MOTRow {
            name: TOTAL_LABEL,
            mota: nan_mean(included().map(|r| r.mota)),
            motp: nan_mean(included().map(|r| r.motp)),
            precision: nan_mean(included().map(|r| r.precision)),
            recall: nan_mean(included().map(|r| r.recall)),
        };
        rows.push(total);

        Self {
            rows,
            excluded: excluded_names(&defined),
            counts,
        }
    }

    pub fn rows(&self) -> &[MOTRow] {
        &self.rows
    }

    pub fn joint(&self, joint: Joint) -> &MOTRow {
        &self.rows[joint.index()]
    }

    pub fn total(&self) -> &MOTRow {
        &self.rows[NUM_JOINTS]
    }

    pub fn excluded(&self) -> &[&'static str] {
        &self.excluded
    }

    /// Raw per-joint counts.
    pub fn counts(&self) -> &[TrackingCounts] {
        &self.counts
    }
}

fn excluded_names(defined: &[bool]) -> Vec<&'static str> {
    Joint::iter()
        .zip(defined)
        .filter(|(_, &d)| !d)
        .map(|(j, _)| j.name())
        .collect()
}
