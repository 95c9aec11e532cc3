//! Chart specifications handed to the plotting front end.
//!
//! Pure mappings from a derived aggregate to a serializable spec; the actual
//! rendering happens client-side. An empty aggregate produces empty vectors,
//! which the front end renders as an empty chart.

use serde::Serialize;

use crate::aggregate::Aggregate;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieChart {
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x: Vec<String>,
    pub y: Vec<u64>,
    /// Draw the count above each bar (the age breakdown does this).
    pub show_values: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x: Vec<String>,
    pub y: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub provincia: String,
    pub casos: u64,
    pub porcentaje: f64,
}

pub fn pie_chart(title: String, agg: &Aggregate) -> PieChart {
    PieChart {
        title,
        labels: agg.rows.iter().map(|r| r.key.clone()).collect(),
        values: agg.rows.iter().map(|r| r.count).collect(),
    }
}

pub fn bar_chart(
    title: String,
    x_label: &str,
    y_label: &str,
    show_values: bool,
    agg: &Aggregate,
) -> BarChart {
    BarChart {
        title,
        x_label: x_label.to_string(),
        y_label: y_label.to_string(),
        x: agg.rows.iter().map(|r| r.key.clone()).collect(),
        y: agg.rows.iter().map(|r| r.count).collect(),
        show_values,
    }
}

pub fn line_chart(title: &str, x_label: &str, y_label: &str, agg: &Aggregate) -> LineChart {
    LineChart {
        title: title.to_string(),
        x_label: x_label.to_string(),
        y_label: y_label.to_string(),
        x: agg.rows.iter().map(|r| r.key.clone()).collect(),
        y: agg.rows.iter().map(|r| r.count).collect(),
    }
}

pub fn table_rows(agg: &Aggregate) -> Vec<TableRow> {
    agg.rows
        .iter()
        .map(|r| TableRow {
            provincia: r.key.clone(),
            casos: r.count,
            porcentaje: r.percentage,
        })
        .collect()
}

pub fn total_label(total: u64) -> String {
    format!("Total: {} casos", total)
}
