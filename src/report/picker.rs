//! Material group and material selectors kept in step with each other.
//!
//! Changing the group reloads the material list for that group and resets the
//! material to "all". Picking a material moves the group selector to the
//! material's parent. The second move is a plain assignment, so it never
//! triggers another reload.

use serde::{Deserialize, Serialize};

use super::endpoint::Endpoint;
use super::fetcher::{ReportFetcher, Transport};
use super::filter::{Filter, QueryParams, Selection, ALL_VALUES_ID};
use crate::error::{ReportError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialGroupOption {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialOption {
    pub id: String,
    pub name: String,
    pub material_group_id: String,
}

/// Source of the selector option lists
pub trait Catalog {
    fn material_groups(&self) -> Result<Vec<MaterialGroupOption>>;
    fn materials(&self, group: &Selection) -> Result<Vec<MaterialOption>>;
}

impl<T: Transport> Catalog for ReportFetcher<T> {
    fn material_groups(&self) -> Result<Vec<MaterialGroupOption>> {
        self.fetch_json(&Endpoint::MaterialGroups, &QueryParams::new())
    }

    fn materials(&self, group: &Selection) -> Result<Vec<MaterialOption>> {
        self.fetch_json(&Endpoint::Materials(group.clone()), &QueryParams::new())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MaterialPicker {
    groups: Vec<MaterialGroupOption>,
    materials: Vec<MaterialOption>,
    group: Selection,
    material: Selection,
    materials_error: Option<String>,
}

impl MaterialPicker {
    /// Fill both selectors the way a freshly loaded page does
    pub fn load<C: Catalog>(catalog: &C) -> Self {
        let mut picker = Self::default();
        match catalog.material_groups() {
            Ok(groups) => picker.groups = groups,
            Err(e) => log::error!("material groups: {}", e),
        }
        picker.reload_materials(catalog);
        picker
    }

    pub fn group(&self) -> &Selection {
        &self.group
    }

    pub fn material(&self) -> &Selection {
        &self.material
    }

    /// Group options, led by the "all" entry
    pub fn group_options(&self) -> Vec<MaterialGroupOption> {
        let mut options = vec![MaterialGroupOption {
            id: ALL_VALUES_ID.to_string(),
            name: "All Material Groups".to_string(),
        }];
        options.extend(self.groups.iter().cloned());
        options
    }

    /// Material options, led by the "all" entry whose parent is also "all"
    pub fn material_options(&self) -> Vec<MaterialOption> {
        let mut options = vec![MaterialOption {
            id: ALL_VALUES_ID.to_string(),
            name: "All Materials".to_string(),
            material_group_id: ALL_VALUES_ID.to_string(),
        }];
        options.extend(self.materials.iter().cloned());
        options
    }

    pub fn select_group<C: Catalog>(&mut self, catalog: &C, group: Selection) {
        self.group = group;
        self.reload_materials(catalog);
    }

    /// Pick a material from the current list and follow it with the group
    pub fn select_material(&mut self, material: &Selection) -> Result<()> {
        let option = self
            .material_options()
            .into_iter()
            .find(|m| m.id == material.as_str())
            .ok_or_else(|| match &self.materials_error {
                Some(reason) => ReportError::MaterialListUnavailable {
                    material: material.to_string(),
                    reason: reason.clone(),
                },
                None => ReportError::MaterialNotFound(material.to_string()),
            })?;

        self.material = material.clone();
        self.group = Selection::parse(&option.material_group_id);
        Ok(())
    }

    /// Copy both selections into a report filter
    pub fn apply_to(&self, filter: &mut Filter) {
        filter.material_group = self.group.clone();
        filter.material = self.material.clone();
    }

    fn reload_materials<C: Catalog>(&mut self, catalog: &C) {
        self.material = Selection::All;
        self.materials.clear();
        self.materials_error = None;

        let materials = match catalog.materials(&self.group) {
            Ok(materials) => materials,
            Err(e) => {
                log::error!("materials of group {}: {}", self.group, e);
                self.materials_error = Some(e.to_string());
                return;
            }
        };

        match self.group.id() {
            Some(group) => {
                let before = materials.len();
                self.materials = materials
                    .into_iter()
                    .filter(|m| m.material_group_id == group)
                    .collect();
                if self.materials.len() != before {
                    log::warn!(
                        "dropped {} material(s) outside group {}",
                        before - self.materials.len(),
                        group
                    );
                }
            }
            None => self.materials = materials,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fetcher::testing::FakeTransport;
    use std::cell::RefCell;

    struct FakeCatalog {
        materials: Vec<MaterialOption>,
        fail: bool,
        calls: RefCell<Vec<Selection>>,
    }

    impl FakeCatalog {
        fn new() -> Self {
            Self {
                materials: vec![
                    material("m1", "Copper", "g1"),
                    material("m2", "Brass", "g1"),
                    material("m3", "Steel", "g2"),
                ],
                fail: false,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl Catalog for FakeCatalog {
        fn material_groups(&self) -> Result<Vec<MaterialGroupOption>> {
            Ok(vec![
                MaterialGroupOption {
                    id: "g1".to_string(),
                    name: "Non-ferrous".to_string(),
                },
                MaterialGroupOption {
                    id: "g2".to_string(),
                    name: "Ferrous".to_string(),
                },
            ])
        }

        fn materials(&self, group: &Selection) -> Result<Vec<MaterialOption>> {
            self.calls.borrow_mut().push(group.clone());
            if self.fail {
                return Err(ReportError::Transport {
                    url: "get-materials".to_string(),
                    reason: "offline".to_string(),
                });
            }
            // Return everything so the picker has to narrow it down itself
            Ok(self.materials.clone())
        }
    }

    fn material(id: &str, name: &str, group: &str) -> MaterialOption {
        MaterialOption {
            id: id.to_string(),
            name: name.to_string(),
            material_group_id: group.to_string(),
        }
    }

    #[test]
    fn load_fills_both_lists() {
        let catalog = FakeCatalog::new();
        let picker = MaterialPicker::load(&catalog);
        assert_eq!(picker.group_options().len(), 3);
        assert_eq!(picker.group_options()[0].id, "all");
        assert_eq!(picker.material_options().len(), 4);
        assert_eq!(*catalog.calls.borrow(), vec![Selection::All]);
    }

    #[test]
    fn group_change_refetches_once_and_narrows() {
        let catalog = FakeCatalog::new();
        let mut picker = MaterialPicker::load(&catalog);
        picker.select_material(&Selection::parse("m3")).unwrap();

        picker.select_group(&catalog, Selection::parse("g1"));

        assert_eq!(
            *catalog.calls.borrow(),
            vec![Selection::All, Selection::parse("g1")]
        );
        assert_eq!(picker.material(), &Selection::All);
        let ids: Vec<_> = picker.materials.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2"]);
        assert!(picker
            .materials
            .iter()
            .all(|m| m.material_group_id == "g1"));
    }

    #[test]
    fn material_choice_moves_group_without_refetch() {
        let catalog = FakeCatalog::new();
        let mut picker = MaterialPicker::load(&catalog);

        picker.select_material(&Selection::parse("m3")).unwrap();

        assert_eq!(picker.group(), &Selection::parse("g2"));
        assert_eq!(picker.material(), &Selection::parse("m3"));
        assert_eq!(catalog.calls.borrow().len(), 1);
    }

    #[test]
    fn all_materials_option_resets_group() {
        let catalog = FakeCatalog::new();
        let mut picker = MaterialPicker::load(&catalog);
        picker.select_material(&Selection::parse("m1")).unwrap();
        picker.select_material(&Selection::All).unwrap();
        assert_eq!(picker.group(), &Selection::All);
    }

    #[test]
    fn unknown_material_is_rejected() {
        let catalog = FakeCatalog::new();
        let mut picker = MaterialPicker::load(&catalog);
        let err = picker.select_material(&Selection::parse("nope"));
        assert!(matches!(err, Err(ReportError::MaterialNotFound(_))));
        assert_eq!(picker.group(), &Selection::All);
    }

    #[test]
    fn failed_reload_leaves_only_all_option() {
        let mut catalog = FakeCatalog::new();
        let mut picker = MaterialPicker::load(&catalog);
        catalog.fail = true;
        picker.select_group(&catalog, Selection::parse("g2"));
        assert_eq!(picker.material_options().len(), 1);
        assert_eq!(picker.group(), &Selection::parse("g2"));
    }

    #[test]
    fn lookup_after_failed_reload_reports_the_failure() {
        let mut catalog = FakeCatalog::new();
        catalog.fail = true;
        let mut picker = MaterialPicker::load(&catalog);

        let err = picker.select_material(&Selection::parse("m2")).unwrap_err();

        match err {
            ReportError::MaterialListUnavailable { material, reason } => {
                assert_eq!(material, "m2");
                assert!(reason.contains("offline"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(picker.group(), &Selection::All);

        catalog.fail = false;
        picker.select_group(&catalog, Selection::parse("g2"));
        assert!(matches!(
            picker.select_material(&Selection::parse("m2")),
            Err(ReportError::MaterialNotFound(_))
        ));
    }

    #[test]
    fn apply_copies_selection_into_filter() {
        let catalog = FakeCatalog::new();
        let mut picker = MaterialPicker::load(&catalog);
        picker.select_material(&Selection::parse("m2")).unwrap();
        let mut filter = Filter::default();
        picker.apply_to(&mut filter);
        assert_eq!(filter.material_group, Selection::parse("g1"));
        assert_eq!(filter.material, Selection::parse("m2"));
    }

    #[test]
    fn fetcher_reads_catalog_json() {
        let transport = FakeTransport::new()
            .route(
                "get-material-groups",
                200,
                r#"[{"id": "g1", "name": "Non-ferrous"}]"#,
            )
            .route(
                "get-materials/g1",
                200,
                r#"[{"id": "m1", "name": "Copper", "material_group_id": "g1"}]"#,
            );
        let fetcher = ReportFetcher::new("http://h", transport);

        let groups = fetcher.material_groups().unwrap();
        assert_eq!(groups[0].name, "Non-ferrous");
        let materials = fetcher.materials(&Selection::parse("g1")).unwrap();
        assert_eq!(materials, vec![material("m1", "Copper", "g1")]);
    }
}
