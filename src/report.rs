//! Text rendering of result tables, summarized per body part.
//!
//! Left and right joints are averaged into one column per body part and the
//! values are printed as percentages, in the `& col & col \\` row layout of
//! the PoseTrack evaluation tool so that rows can be pasted into LaTeX.

use std::fmt::Write;

use crate::joints::{BodyPart, Joint};
use crate::metrics::{APTable, MOTTable};
use crate::utils::nan_mean;

/// One labeled summary value (fraction, not percent).
pub type Column = (&'static str, f64);

fn part_mean<F: Fn(Joint) -> f64>(part: BodyPart, value: F) -> f64 {
    nan_mean(part.joints().iter().map(|&j| value(j)))
}

/// AP per body part plus the total.
pub fn ap_summary(table: &APTable) -> Vec<Column> {
    BodyPart::ALL
        .iter()
        .map(|&part| (part.label(), part_mean(part, |j| table.joint(j).ap)))
        .chain(std::iter::once(("Total", table.total().ap)))
        .collect()
}

/// MOTA per body part, then total MOTA, MOTP, precision and recall.
pub fn mot_summary(table: &MOTTable) -> Vec<Column> {
    let total = table.total();
    BodyPart::ALL
        .iter()
        .map(|&part| (part.label(), part_mean(part, |j| table.joint(j).mota)))
        .chain([
            ("Total", total.mota),
            ("Total", total.motp),
            ("Total", total.precision),
            ("Total", total.recall),
        ])
        .collect()
}

/// Render columns as a header row and a value row.
pub fn render(columns: &[Column]) -> String {
    let mut header = String::from("&");
    let mut values = String::from("&");
    for (i, (label, value)) in columns.iter().enumerate() {
        let sep = if i + 1 == columns.len() { "\\\\" } else { "&" };
        let cell = format_percent(*value);
        let width = label.len().max(cell.len());
        let _ = write!(header, " {:<width$} {}", label, sep, width = width);
        let _ = write!(values, " {:<width$} {}", cell, sep, width = width);
    }
    format!("{}\n{}\n", header, values)
}

pub fn format_ap_table(table: &APTable) -> String {
    let mut out = render(&ap_summary(table));
    push_excluded(&mut out, table.excluded());
    out
}

pub fn format_mot_table(table: &MOTTable) -> String {
    let mut out = String::from("MOTA per part, then MOTA, MOTP, Prec, Rec\n");
    out.push_str(&render(&mot_summary(table)));
    push_excluded(&mut out, table.excluded());
    out
}

fn format_percent(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else {
        format!("{:.1}", value * 100.0)
    }
}

fn push_excluded(out: &mut String, excluded: &[&'static str]) {
    if !excluded.is_empty() {
        let _ = writeln!(out, "(no ground truth, excluded from total: {})", excluded.join(", "));
    }
}
