//! Per-user dashboard session: one selection state plus the cached output
//! set, recomputed through the dependency graph on every selector change.
//!
//! Updates are synchronous and run to completion, so at most one recompute
//! per output is ever in flight. Sessions never share mutable state; the
//! dataset itself is shared read-only behind an `Arc`.

use std::sync::Arc;

use serde::Serialize;

use crate::aggregate::{aggregate, GroupDim};
use crate::dataset::Dataset;
use crate::graph::{plan, Input, Node};
use crate::logging::{json_log, log_at, obj, v_num, v_str, Domain, Level};
use crate::selection::{derive_options, SelectionState};
use crate::view::{
    bar_chart, line_chart, pie_chart, table_rows, total_label, BarChart, LineChart, PieChart,
    TableRow,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outputs {
    pub provincia_options: Vec<String>,
    pub provincia: Option<String>,
    pub district_bar: BarChart,
    pub province_pie: PieChart,
    pub summary_table: Vec<TableRow>,
    pub total_label: String,
    pub year_line: LineChart,
    pub age_bar: BarChart,
    pub sex_pie: PieChart,
}

impl Outputs {
    fn empty() -> Self {
        Self {
            provincia_options: Vec::new(),
            provincia: None,
            district_bar: BarChart {
                title: String::new(),
                x_label: String::new(),
                y_label: String::new(),
                x: Vec::new(),
                y: Vec::new(),
                show_values: false,
            },
            province_pie: PieChart {
                title: String::new(),
                labels: Vec::new(),
                values: Vec::new(),
            },
            summary_table: Vec::new(),
            total_label: String::new(),
            year_line: LineChart {
                title: String::new(),
                x_label: String::new(),
                y_label: String::new(),
                x: Vec::new(),
                y: Vec::new(),
            },
            age_bar: BarChart {
                title: String::new(),
                x_label: String::new(),
                y_label: String::new(),
                x: Vec::new(),
                y: Vec::new(),
                show_values: false,
            },
            sex_pie: PieChart {
                title: String::new(),
                labels: Vec::new(),
                values: Vec::new(),
            },
        }
    }
}

pub struct Session {
    dataset: Arc<Dataset>,
    selection: SelectionState,
    outputs: Outputs,
}

impl Session {
    pub fn new(dataset: Arc<Dataset>, default_department: &str) -> Self {
        let mut session = Self {
            dataset,
            selection: SelectionState::new(default_department.to_string()),
            outputs: Outputs::empty(),
        };
        session.run_update(Input::Departamento);
        session
    }

    pub fn outputs(&self) -> &Outputs {
        &self.outputs
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn set_departamento(&mut self, value: &str) -> &Outputs {
        self.selection.departamento = value.to_string();
        self.run_update(Input::Departamento);
        json_log(
            Domain::Session,
            obj(&[
                ("change", v_str("departamento")),
                ("value", v_str(value)),
                ("provincia", v_str(self.selection.provincia.as_deref().unwrap_or(""))),
            ]),
        );
        &self.outputs
    }

    pub fn set_provincia(&mut self, value: Option<String>) -> &Outputs {
        self.selection.provincia = value;
        self.run_update(Input::Provincia);
        json_log(
            Domain::Session,
            obj(&[
                ("change", v_str("provincia")),
                ("value", v_str(self.selection.provincia.as_deref().unwrap_or(""))),
            ]),
        );
        &self.outputs
    }

    /// One synchronous update cycle: plan, then recompute in plan order.
    fn run_update(&mut self, changed: Input) {
        let nodes = plan(changed);
        log_at(
            Level::Debug,
            Domain::Graph,
            obj(&[
                ("changed", v_str(match changed {
                    Input::Departamento => "departamento",
                    Input::Provincia => "provincia",
                })),
                ("nodes", v_num(nodes.len() as f64)),
            ]),
        );
        for node in nodes {
            self.compute(node, changed);
        }
    }

    fn compute(&mut self, node: Node, changed: Input) {
        let dep = self.selection.departamento.clone();
        match node {
            Node::ProvinceOptions => {
                self.outputs.provincia_options = derive_options(&self.dataset, &dep);
            }
            Node::ProvinceValue => {
                match changed {
                    // Department changed: province comes from the new set.
                    Input::Departamento => {
                        self.selection.reset_province(&self.outputs.provincia_options);
                    }
                    // Direct selection: unknown values drop the filter.
                    Input::Provincia => {
                        if self.selection.clamp_province(&self.outputs.provincia_options) {
                            log_at(
                                Level::Warn,
                                Domain::Session,
                                obj(&[("drop", v_str("provincia_not_in_options"))]),
                            );
                        }
                    }
                }
                self.outputs.provincia = self.selection.provincia.clone();
            }
            Node::ProvincePie => {
                let agg = aggregate(
                    &self.dataset,
                    &self.selection.department_predicates(),
                    GroupDim::Provincia,
                );
                self.outputs.province_pie = pie_chart(format!("Casos en {}", dep), &agg);
            }
            Node::SummaryTable => {
                let agg = aggregate(
                    &self.dataset,
                    &self.selection.department_predicates(),
                    GroupDim::Provincia,
                );
                self.outputs.summary_table = table_rows(&agg);
            }
            Node::TotalLabel => {
                let agg = aggregate(
                    &self.dataset,
                    &self.selection.department_predicates(),
                    GroupDim::Provincia,
                );
                self.outputs.total_label = total_label(agg.total());
            }
            Node::DistrictBar => {
                let agg = aggregate(&self.dataset, &self.selection.predicates(), GroupDim::Distrito);
                let scope = self.selection.provincia.as_deref().unwrap_or(&dep);
                self.outputs.district_bar =
                    bar_chart(format!("Casos en {}", scope), "Distrito", "Casos", false, &agg);
            }
            Node::YearLine => {
                let agg = aggregate(&self.dataset, &self.selection.predicates(), GroupDim::Ano);
                self.outputs.year_line = line_chart(
                    "Evolución de Casos a lo Largo de los Años",
                    "Año",
                    "Casos",
                    &agg,
                );
            }
            Node::AgeBar => {
                let agg = aggregate(&self.dataset, &self.selection.predicates(), GroupDim::Edad);
                self.outputs.age_bar = bar_chart(
                    format!("Casos por edad en {}", dep),
                    "Edad",
                    "Número de Casos",
                    true,
                    &agg,
                );
            }
            Node::SexPie => {
                let agg = aggregate(&self.dataset, &self.selection.predicates(), GroupDim::Sexo);
                self.outputs.sex_pie = pie_chart(format!("Casos en {}", dep), &agg);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Record, Sex};

    fn rec(dep: &str, prov: &str, dist: &str, ano: u16, edad: u16, sexo: Sex) -> Record {
        Record {
            departamento: dep.to_string(),
            provincia: prov.to_string(),
            distrito: dist.to_string(),
            ano,
            edad,
            sexo,
        }
    }

    fn dataset() -> Arc<Dataset> {
        Arc::new(Dataset::new(vec![
            rec("PIURA", "PAITA", "PAITA", 2019, 30, Sex::M),
            rec("PIURA", "PAITA", "COLAN", 2020, 12, Sex::F),
            rec("PIURA", "SULLANA", "BELLAVISTA", 2020, 8, Sex::F),
            rec("LIMA", "LIMA", "ATE", 2021, 25, Sex::M),
            rec("LIMA", "LIMA", "COMAS", 2021, 40, Sex::F),
        ]))
    }

    #[test]
    fn test_new_session_populates_all_outputs() {
        let s = Session::new(dataset(), "PIURA");
        let out = s.outputs();
        assert_eq!(out.provincia_options, vec!["PAITA".to_string(), "SULLANA".to_string()]);
        assert_eq!(out.provincia.as_deref(), Some("PAITA"));
        assert_eq!(out.total_label, "Total: 3 casos");
        assert_eq!(out.province_pie.labels, vec!["PAITA", "SULLANA"]);
        // Province-dependent charts are filtered to the default PAITA.
        assert_eq!(out.district_bar.x, vec!["COLAN", "PAITA"]);
    }

    #[test]
    fn test_department_change_resets_province_first() {
        let mut s = Session::new(dataset(), "LIMA");
        assert_eq!(s.outputs().provincia.as_deref(), Some("LIMA"));

        let out = s.set_departamento("PIURA");
        // Province was reset to the first Piura option before any
        // province-dependent chart recomputed.
        assert_eq!(out.provincia.as_deref(), Some("PAITA"));
        assert_eq!(out.district_bar.x, vec!["COLAN", "PAITA"]);
        assert_eq!(out.sex_pie.labels, vec!["F", "M"]);
    }

    #[test]
    fn test_zero_row_department_renders_empty_state() {
        let mut s = Session::new(dataset(), "PIURA");
        let out = s.set_departamento("CUSCO");
        assert!(out.provincia_options.is_empty());
        assert_eq!(out.provincia, None);
        assert!(out.district_bar.x.is_empty());
        assert!(out.province_pie.labels.is_empty());
        assert!(out.summary_table.is_empty());
        assert!(out.year_line.x.is_empty());
        assert_eq!(out.total_label, "Total: 0 casos");
    }

    #[test]
    fn test_clearing_province_falls_back_to_department_filter() {
        let mut s = Session::new(dataset(), "PIURA");
        let out = s.set_provincia(None);
        assert_eq!(out.provincia, None);
        // All three Piura districts, not just the default province's.
        assert_eq!(out.district_bar.x, vec!["BELLAVISTA", "COLAN", "PAITA"]);
        assert_eq!(out.district_bar.title, "Casos en PIURA");
    }

    #[test]
    fn test_province_change_leaves_department_outputs_alone() {
        let mut s = Session::new(dataset(), "PIURA");
        let pie_before = s.outputs().province_pie.clone();
        let out = s.set_provincia(Some("SULLANA".to_string()));
        assert_eq!(out.province_pie, pie_before);
        assert_eq!(out.district_bar.x, vec!["BELLAVISTA"]);
        assert_eq!(out.district_bar.title, "Casos en SULLANA");
    }

    #[test]
    fn test_unknown_province_drops_filter() {
        let mut s = Session::new(dataset(), "PIURA");
        let out = s.set_provincia(Some("ATLANTIS".to_string()));
        assert_eq!(out.provincia, None);
        assert_eq!(out.district_bar.x, vec!["BELLAVISTA", "COLAN", "PAITA"]);
    }

    #[test]
    fn test_year_line_ascending_years() {
        let mut s = Session::new(dataset(), "PIURA");
        let out = s.set_provincia(None);
        assert_eq!(out.year_line.x, vec!["2019", "2020"]);
        assert_eq!(out.year_line.y, vec![1, 2]);
    }
}
