//! Selection state for the two linked filter controls.
//!
//! The department is required and always set; the province is optional and
//! only ever holds a value present under the current department. `None`
//! means "no province filter" and dependent aggregates fall back to
//! department-only filtering.

use serde::Serialize;

use crate::aggregate::{aggregate, GroupDim, Predicate};
use crate::dataset::Dataset;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionState {
    pub departamento: String,
    pub provincia: Option<String>,
}

impl SelectionState {
    pub fn new(departamento: String) -> Self {
        Self {
            departamento,
            provincia: None,
        }
    }

    /// Department changed: the province must come from the freshly derived
    /// option set. A previously selected province survives only if it also
    /// exists under the new department; otherwise the first option (or no
    /// selection at all, when the set is empty) takes its place.
    pub fn reset_province(&mut self, options: &[String]) {
        let still_valid = self
            .provincia
            .as_deref()
            .map(|p| options.iter().any(|o| o == p))
            .unwrap_or(false);
        if !still_valid {
            self.provincia = options.first().cloned();
        }
    }

    /// Province set directly by the user: a value outside the current
    /// option set drops the filter entirely. Returns true when a value
    /// was dropped.
    pub fn clamp_province(&mut self, options: &[String]) -> bool {
        if let Some(p) = &self.provincia {
            if !options.iter().any(|o| o == p) {
                self.provincia = None;
                return true;
            }
        }
        false
    }

    /// Department-only filter.
    pub fn department_predicates(&self) -> Vec<Predicate> {
        vec![Predicate::Departamento(self.departamento.clone())]
    }

    /// Department plus province filter, when a province is selected.
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut preds = self.department_predicates();
        if let Some(p) = &self.provincia {
            preds.push(Predicate::Provincia(p.clone()));
        }
        preds
    }
}

/// Sorted distinct provinces present under `departamento`.
pub fn derive_options(ds: &Dataset, departamento: &str) -> Vec<String> {
    aggregate(
        ds,
        &[Predicate::Departamento(departamento.to_string())],
        GroupDim::Provincia,
    )
    .rows
    .into_iter()
    .map(|r| r.key)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Record, Sex};

    fn rec(dep: &str, prov: &str) -> Record {
        Record {
            departamento: dep.to_string(),
            provincia: prov.to_string(),
            distrito: "D".to_string(),
            ano: 2020,
            edad: 20,
            sexo: Sex::M,
        }
    }

    #[test]
    fn test_derive_options_only_cooccurring() {
        let ds = Dataset::new(vec![
            rec("PIURA", "SULLANA"),
            rec("PIURA", "PAITA"),
            rec("PIURA", "SULLANA"),
            rec("LIMA", "LIMA"),
        ]);
        assert_eq!(
            derive_options(&ds, "PIURA"),
            vec!["PAITA".to_string(), "SULLANA".to_string()]
        );
        assert_eq!(derive_options(&ds, "LIMA"), vec!["LIMA".to_string()]);
        assert!(derive_options(&ds, "CUSCO").is_empty());
    }

    #[test]
    fn test_reset_picks_first_when_absent() {
        let mut sel = SelectionState::new("PIURA".to_string());
        sel.provincia = Some("LIMA".to_string());
        sel.reset_province(&["PAITA".to_string(), "SULLANA".to_string()]);
        assert_eq!(sel.provincia.as_deref(), Some("PAITA"));
    }

    #[test]
    fn test_reset_keeps_province_still_present() {
        let mut sel = SelectionState::new("PIURA".to_string());
        sel.provincia = Some("SULLANA".to_string());
        sel.reset_province(&["PAITA".to_string(), "SULLANA".to_string()]);
        assert_eq!(sel.provincia.as_deref(), Some("SULLANA"));
    }

    #[test]
    fn test_reset_empty_options_clears() {
        let mut sel = SelectionState::new("CUSCO".to_string());
        sel.provincia = Some("LIMA".to_string());
        sel.reset_province(&[]);
        assert_eq!(sel.provincia, None);
    }

    #[test]
    fn test_reset_none_selects_first() {
        let mut sel = SelectionState::new("PIURA".to_string());
        sel.reset_province(&["PAITA".to_string()]);
        assert_eq!(sel.provincia.as_deref(), Some("PAITA"));
    }

    #[test]
    fn test_clamp_drops_unknown_value() {
        let mut sel = SelectionState::new("PIURA".to_string());
        sel.provincia = Some("NOWHERE".to_string());
        let dropped = sel.clamp_province(&["PAITA".to_string()]);
        assert!(dropped);
        assert_eq!(sel.provincia, None);
    }

    #[test]
    fn test_predicates_with_and_without_province() {
        let mut sel = SelectionState::new("PIURA".to_string());
        assert_eq!(sel.predicates().len(), 1);
        sel.provincia = Some("SULLANA".to_string());
        assert_eq!(sel.predicates().len(), 2);
    }
}
