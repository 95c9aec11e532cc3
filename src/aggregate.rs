//! Filter-and-group-count engine.
//!
//! `aggregate` is a pure function of the dataset, a conjunctive set of typed
//! equality predicates and a grouping dimension. Group keys are emitted in
//! ascending key order (numeric for ano/edad, lexicographic for text), so
//! identical inputs always produce identical output including row order.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::dataset::{Dataset, Record, Sex};

/// Typed equality predicate. One variant per filterable field, so a filter
/// can never reference a column that does not exist.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Departamento(String),
    Provincia(String),
    Distrito(String),
    Ano(u16),
    Edad(u16),
    Sexo(Sex),
}

impl Predicate {
    pub fn matches(&self, r: &Record) -> bool {
        match self {
            Predicate::Departamento(v) => r.departamento == *v,
            Predicate::Provincia(v) => r.provincia == *v,
            Predicate::Distrito(v) => r.distrito == *v,
            Predicate::Ano(v) => r.ano == *v,
            Predicate::Edad(v) => r.edad == *v,
            Predicate::Sexo(v) => r.sexo == *v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupDim {
    Provincia,
    Distrito,
    Ano,
    Edad,
    Sexo,
}

impl GroupDim {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupDim::Provincia => "provincia",
            GroupDim::Distrito => "distrito",
            GroupDim::Ano => "ano",
            GroupDim::Edad => "edad",
            GroupDim::Sexo => "sexo",
        }
    }

    fn key_of(&self, r: &Record) -> GroupKey {
        match self {
            GroupDim::Provincia => GroupKey::Text(r.provincia.clone()),
            GroupDim::Distrito => GroupKey::Text(r.distrito.clone()),
            GroupDim::Ano => GroupKey::Num(r.ano),
            GroupDim::Edad => GroupKey::Num(r.edad),
            GroupDim::Sexo => GroupKey::Text(r.sexo.as_str().to_string()),
        }
    }
}

/// Sortable group key. Numeric dimensions order numerically so that e.g.
/// age 9 sorts before age 10.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum GroupKey {
    Num(u16),
    Text(String),
}

impl GroupKey {
    fn label(self) -> String {
        match self {
            GroupKey::Num(n) => n.to_string(),
            GroupKey::Text(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub key: String,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregate {
    pub dimension: GroupDim,
    pub rows: Vec<AggregateRow>,
}

impl Aggregate {
    pub fn total(&self) -> u64 {
        self.rows.iter().map(|r| r.count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Share of `count` in `total`, as a percentage rounded to 2 decimals.
/// A zero total yields 0.0 for every row rather than a division error.
pub fn percentage_of(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64 * 10_000.0).round() / 100.0
}

pub fn aggregate(ds: &Dataset, predicates: &[Predicate], dim: GroupDim) -> Aggregate {
    let mut counts: BTreeMap<GroupKey, u64> = BTreeMap::new();
    for r in ds.rows() {
        if predicates.iter().all(|p| p.matches(r)) {
            *counts.entry(dim.key_of(r)).or_insert(0) += 1;
        }
    }
    let total: u64 = counts.values().sum();
    let rows = counts
        .into_iter()
        .map(|(key, count)| AggregateRow {
            key: key.label(),
            count,
            percentage: percentage_of(count, total),
        })
        .collect();
    Aggregate { dimension: dim, rows }
}
