//! Loaded patient report with per-tooth lookup and undo/redo.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::DENTAL_STORAGE_KEY;
use crate::error::StoreError;
use crate::model::{DentalData, Problem, ReportPayload, Tooth, TreatmentPlan};
use crate::store::{HistoryConfig, PersistedStore, Reducer, SnapshotHistory, StateStorage};

/// Presence flags and counts for the loaded dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataStatus {
    pub has_data: bool,
    pub has_patient_info: bool,
    pub has_teeth_data: bool,
    pub has_scan_data: bool,
    pub has_treatment_plans: bool,
    pub has_problems: bool,
    pub is_empty: bool,
    pub teeth_count: usize,
    pub problems_count: usize,
    pub treatment_plans_count: usize,
}

/// Outcome of [`DentalState::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// State of the dental data store.
///
/// Only `data` and `history` are persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DentalState {
    #[serde(default)]
    pub data: DentalData,
    #[serde(default)]
    pub history: SnapshotHistory<DentalData>,
    #[serde(skip)]
    pub loading: bool,
    #[serde(skip)]
    pub error: Option<String>,
}

/// Actions accepted by [`DentalState`].
#[derive(Debug, Clone)]
pub enum DentalAction {
    /// A report request is in flight
    LoadStarted,
    /// Replace the dataset with a freshly loaded report
    Loaded(Box<DentalData>),
    /// A report could not be loaded
    LoadFailed(String),
    /// Shallow-merge fields into the patient details (not recorded in history)
    UpdatePatientInfo(Map<String, Value>),
    /// Shallow-merge fields into a tooth
    UpdateTooth {
        number: u32,
        fields: Map<String, Value>,
    },
    AddToothProblem {
        number: u32,
        problem: Problem,
    },
    AddTreatmentPlan(TreatmentPlan),
    UpdateTreatmentPlan {
        plan_id: String,
        fields: Map<String, Value>,
    },
    Undo,
    Redo,
    Reset,
}

/// Shallow merge of `fields` into a serializable value.
///
/// Returns `None` if the merged object no longer fits the type.
fn merged<T>(current: &T, fields: Map<String, Value>) -> Option<T>
where
    T: Serialize + serde::de::DeserializeOwned,
{
    let mut value = serde_json::to_value(current).ok()?;
    let object = value.as_object_mut()?;
    object.extend(fields);
    match serde_json::from_value(value) {
        Ok(updated) => Some(updated),
        Err(e) => {
            log::warn!("Rejected update with incompatible fields: {}", e);
            None
        }
    }
}

impl DentalState {
    /// Create an empty state with a custom history bound.
    pub fn with_history_config(config: HistoryConfig) -> Self {
        Self {
            history: SnapshotHistory::with_config(config),
            ..Self::default()
        }
    }

    fn tooth_index(&self, number: u32) -> Option<usize> {
        self.data
            .teeth
            .iter()
            .position(|t| t.tooth_number == Some(number))
    }

    /// Record the current data as a new history entry.
    fn commit(&mut self) {
        self.history.push(self.data.clone());
    }

    /// Look up a tooth by its number.
    pub fn tooth_by_number(&self, number: u32) -> Option<&Tooth> {
        self.data
            .teeth
            .iter()
            .find(|t| t.tooth_number == Some(number))
    }

    /// A patient is loaded: non-blank id and name.
    pub fn has_data(&self) -> bool {
        let info = &self.data.patient_info;
        !info.patient_id.trim().is_empty() && !info.info.full_name.trim().is_empty()
    }

    /// Id, name and date of birth are all set.
    pub fn has_patient_info(&self) -> bool {
        let info = &self.data.patient_info;
        !info.patient_id.is_empty()
            && !info.info.full_name.is_empty()
            && !info.info.date_of_birth.is_empty()
    }

    pub fn has_teeth_data(&self) -> bool {
        !self.data.teeth.is_empty()
    }

    pub fn has_scan_data(&self) -> bool {
        let scan = &self.data.scan_info;
        !scan.device.is_empty() || !scan.scan_date.is_empty() || !scan.scan_type.is_empty()
    }

    pub fn has_treatment_plans(&self) -> bool {
        !self.data.treatment_plan.is_empty()
    }

    pub fn has_problems(&self) -> bool {
        self.data.teeth.iter().any(Tooth::has_problems)
    }

    /// Summary of what the dataset contains.
    pub fn data_status(&self) -> DataStatus {
        let has_data = self.has_data();
        DataStatus {
            has_data,
            has_patient_info: self.has_patient_info(),
            has_teeth_data: self.has_teeth_data(),
            has_scan_data: self.has_scan_data(),
            has_treatment_plans: self.has_treatment_plans(),
            has_problems: self.has_problems(),
            is_empty: !has_data,
            teeth_count: self.data.teeth.len(),
            problems_count: self.data.problem_count(),
            treatment_plans_count: self.data.treatment_plan.len(),
        }
    }

    /// Check required patient fields and tooth numbers.
    pub fn validate(&self) -> ValidationReport {
        let mut errors = Vec::new();
        let info = &self.data.patient_info;

        if info.patient_id.is_empty() {
            errors.push("Patient ID is required".to_string());
        }
        if info.info.full_name.is_empty() {
            errors.push("Patient name is required".to_string());
        }
        if info.info.date_of_birth.is_empty() {
            errors.push("Date of birth is required".to_string());
        }
        for (index, tooth) in self.data.teeth.iter().enumerate() {
            if tooth.tooth_number.is_none_or(|n| n == 0) {
                errors.push(format!("Tooth number missing for tooth #{}", index + 1));
            }
        }

        ValidationReport {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    /// Count problems by type over all teeth.
    pub fn problem_statistics(&self) -> BTreeMap<String, usize> {
        let mut stats = BTreeMap::new();
        for problem in self.data.teeth.iter().flat_map(|t| &t.problems) {
            *stats.entry(problem.kind.clone()).or_insert(0) += 1;
        }
        stats
    }
}

impl Reducer for DentalState {
    type Action = DentalAction;

    fn reduce(&mut self, action: DentalAction) {
        match action {
            DentalAction::LoadStarted => {
                self.loading = true;
                self.error = None;
            }
            DentalAction::Loaded(data) => {
                self.data = *data;
                self.history.reset_to(self.data.clone());
                self.loading = false;
                self.error = None;
            }
            DentalAction::LoadFailed(message) => {
                self.error = Some(message);
                self.loading = false;
            }
            DentalAction::UpdatePatientInfo(fields) => {
                if let Some(info) = merged(&self.data.patient_info.info, fields) {
                    self.data.patient_info.info = info;
                }
            }
            DentalAction::UpdateTooth { number, fields } => {
                let Some(index) = self.tooth_index(number) else {
                    log::debug!("Dental store: no tooth {} to update", number);
                    return;
                };
                if let Some(tooth) = merged(&self.data.teeth[index], fields) {
                    self.data.teeth[index] = tooth;
                    self.commit();
                }
            }
            DentalAction::AddToothProblem { number, problem } => {
                let Some(index) = self.tooth_index(number) else {
                    log::debug!("Dental store: no tooth {} for problem", number);
                    return;
                };
                self.data.teeth[index].problems.push(problem);
                self.commit();
            }
            DentalAction::AddTreatmentPlan(plan) => {
                self.data.treatment_plan.push(plan);
                self.commit();
            }
            DentalAction::UpdateTreatmentPlan { plan_id, fields } => {
                let Some(index) = self
                    .data
                    .treatment_plan
                    .iter()
                    .position(|p| p.plan_id == plan_id)
                else {
                    log::debug!("Dental store: no treatment plan '{}'", plan_id);
                    return;
                };
                if let Some(plan) = merged(&self.data.treatment_plan[index], fields) {
                    self.data.treatment_plan[index] = plan;
                    self.commit();
                }
            }
            DentalAction::Undo => {
                if let Some(data) = self.history.undo() {
                    self.data = data;
                }
            }
            DentalAction::Redo => {
                if let Some(data) = self.history.redo() {
                    self.data = data;
                }
            }
            DentalAction::Reset => {
                self.data = DentalData::default();
                self.history.clear();
                self.error = None;
            }
        }
    }
}

/// Persisted dental data store.
pub struct DentalStore<S: StateStorage> {
    inner: PersistedStore<DentalState, S>,
}

impl<S: StateStorage> DentalStore<S> {
    /// Open the store, restoring any snapshot under the dental storage key.
    pub fn open(storage: S) -> Self {
        Self {
            inner: PersistedStore::open(storage, DENTAL_STORAGE_KEY),
        }
    }

    /// Open with a custom history bound.
    pub fn open_with_history(storage: S, config: HistoryConfig) -> Self {
        let mut store = Self::open(storage);
        let mut state = store.inner.state().clone();
        state.history.set_config(config);
        store.inner.replace(state);
        store
    }

    /// Current state.
    pub fn state(&self) -> &DentalState {
        self.inner.state()
    }

    /// Persisted store (for subscriptions and purging).
    pub fn inner_mut(&mut self) -> &mut PersistedStore<DentalState, S> {
        &mut self.inner
    }

    /// Mark a report request as in flight.
    pub fn begin_loading(&mut self) {
        self.inner.dispatch(DentalAction::LoadStarted);
    }

    /// Load a backend report. On failure the error is recorded in state and returned.
    pub fn load_patient_data(&mut self, payload: ReportPayload) -> Result<(), StoreError> {
        match DentalData::from_payload(payload) {
            Ok(data) => {
                log::info!("Loaded patient {}", data.patient_info.patient_id);
                self.inner.dispatch(DentalAction::Loaded(Box::new(data)));
                Ok(())
            }
            Err(e) => {
                log::warn!("Failed to load patient data: {}", e);
                self.inner.dispatch(DentalAction::LoadFailed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Load a raw JSON report.
    pub fn load_report_value(&mut self, value: Value) -> Result<(), StoreError> {
        match ReportPayload::from_value(value) {
            Ok(payload) => self.load_patient_data(payload),
            Err(e) => {
                let e = StoreError::from(e);
                self.inner.dispatch(DentalAction::LoadFailed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Shallow-merge fields into the patient details.
    pub fn update_patient_info(&mut self, fields: Map<String, Value>) {
        self.inner.dispatch(DentalAction::UpdatePatientInfo(fields));
    }

    /// Look up a tooth by its number.
    pub fn tooth_by_number(&self, number: u32) -> Option<&Tooth> {
        self.state().tooth_by_number(number)
    }

    /// Shallow-merge fields into a tooth and record history.
    pub fn update_tooth(&mut self, number: u32, fields: Map<String, Value>) {
        self.inner
            .dispatch(DentalAction::UpdateTooth { number, fields });
    }

    /// Append a problem to a tooth.
    pub fn add_tooth_problem(&mut self, number: u32, problem: Problem) {
        self.inner
            .dispatch(DentalAction::AddToothProblem { number, problem });
    }

    /// Append a treatment plan.
    pub fn add_treatment_plan(&mut self, plan: TreatmentPlan) {
        self.inner.dispatch(DentalAction::AddTreatmentPlan(plan));
    }

    /// Shallow-merge fields into the plan with `plan_id`.
    pub fn update_treatment_plan(&mut self, plan_id: impl Into<String>, fields: Map<String, Value>) {
        self.inner.dispatch(DentalAction::UpdateTreatmentPlan {
            plan_id: plan_id.into(),
            fields,
        });
    }

    /// Step back one history entry.
    pub fn undo(&mut self) {
        self.inner.dispatch(DentalAction::Undo);
    }

    /// Step forward one history entry.
    pub fn redo(&mut self) {
        self.inner.dispatch(DentalAction::Redo);
    }

    /// Clear the dataset and its history.
    pub fn reset(&mut self) {
        self.inner.dispatch(DentalAction::Reset);
    }

    /// Copy of the current dataset.
    pub fn export(&self) -> DentalData {
        self.state().data.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStorage;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    fn loaded_store() -> DentalStore<MemoryStorage> {
        let mut store = DentalStore::open(MemoryStorage::new());
        store
            .load_report_value(json!({
                "patientId": "P-1",
                "info": { "fullName": "Sam Doe", "dateOfBirth": "1985-04-02" },
                "teeth": [
                    { "toothNumber": 11, "category": "Incisor" },
                    { "toothNumber": 36, "problems": [{ "type": "Caries" }, { "type": "Caries" }] },
                    { "toothNumber": 46, "problems": [{ "type": "Lesion" }] }
                ],
                "scan": { "device": "OPG-3" }
            }))
            .unwrap();
        store
    }

    #[test]
    fn test_load_sets_data_and_history() {
        let store = loaded_store();
        let state = store.state();
        assert!(state.has_data());
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.history.cursor(), Some(0));
        assert!(state.error.is_none());
    }

    #[test]
    fn test_loading_flag() {
        let mut store = DentalStore::open(MemoryStorage::new());
        store.begin_loading();
        assert!(store.state().loading);
        store
            .load_report_value(json!({ "patientId": "P-3" }))
            .unwrap();
        assert!(!store.state().loading);
    }

    #[test]
    fn test_load_failure_records_error() {
        let mut store = DentalStore::open(MemoryStorage::new());
        let result = store.load_report_value(json!({ "info": { "fullName": "Nobody" } }));
        assert!(matches!(result, Err(StoreError::MissingPatientId)));
        assert!(store.state().error.is_some());
        assert!(!store.state().loading);
        assert!(!store.state().has_data());
    }

    #[test]
    fn test_tooth_lookup_and_update() {
        let mut store = loaded_store();
        assert_eq!(store.tooth_by_number(11).unwrap().category, "Incisor");
        assert!(store.tooth_by_number(21).is_none());

        store.update_tooth(11, fields(json!({ "comment": "chipped", "gumHealth": "good" })));
        let tooth = store.tooth_by_number(11).unwrap();
        assert_eq!(tooth.comment, "chipped");
        assert_eq!(tooth.gum_health, "good");
        assert_eq!(tooth.category, "Incisor");
        assert_eq!(store.state().history.len(), 2);
    }

    #[test]
    fn test_update_unknown_tooth_is_noop() {
        let mut store = loaded_store();
        let before = store.state().clone();
        store.update_tooth(99, fields(json!({ "comment": "x" })));
        assert_eq!(store.state(), &before);
    }

    #[test]
    fn test_loose_update_fields_are_coerced() {
        let mut store = loaded_store();
        store.update_tooth(11, fields(json!({ "comment": "chipped" })));
        store.update_tooth(11, fields(json!({ "comment": null, "problems": "none" })));
        let tooth = store.tooth_by_number(11).unwrap();
        assert_eq!(tooth.comment, "");
        assert!(tooth.problems.is_empty());
        assert_eq!(tooth.category, "Incisor");
        assert_eq!(store.state().history.len(), 3);

        store.update_patient_info(fields(json!({ "gender": null, "age": "51" })));
        let info = &store.state().data.patient_info.info;
        assert_eq!(info.gender, "");
        assert_eq!(info.age, 51);
    }

    #[test]
    fn test_null_fields_do_not_fail_load() {
        let mut store = DentalStore::open(MemoryStorage::new());
        store
            .load_report_value(json!({
                "patientId": 77,
                "info": { "fullName": "Jane", "gender": null },
                "teeth": [{ "toothNumber": 11, "comment": null }],
                "scan": { "dimensions": { "width": 2048.0 } },
                "treatmentPlan": null
            }))
            .unwrap();
        assert_eq!(store.state().data.patient_info.patient_id, "77");
        assert_eq!(store.tooth_by_number(11).unwrap().comment, "");
        assert_eq!(store.state().data.scan_info.dimensions.width, 2048);
        assert!(store.state().error.is_none());
    }

    #[test]
    fn test_undo_redo_tooth_problem() {
        let mut store = loaded_store();
        store.add_tooth_problem(11, Problem::new("Fracture"));
        assert_eq!(store.tooth_by_number(11).unwrap().problems.len(), 1);

        store.undo();
        assert!(store.tooth_by_number(11).unwrap().problems.is_empty());
        store.undo();
        assert!(store.tooth_by_number(11).unwrap().problems.is_empty());

        store.redo();
        assert_eq!(store.tooth_by_number(11).unwrap().problems.len(), 1);
        store.redo();
        assert_eq!(store.tooth_by_number(11).unwrap().problems.len(), 1);
    }

    #[test]
    fn test_treatment_plans() {
        let mut store = loaded_store();
        store.add_treatment_plan(TreatmentPlan::new("T1"));
        store.update_treatment_plan("T1", fields(json!({ "status": "scheduled" })));
        store.update_treatment_plan("T9", fields(json!({ "status": "ignored" })));

        let plans = &store.state().data.treatment_plan;
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].details.get("status"), Some(&json!("scheduled")));
        assert_eq!(store.state().history.len(), 3);
    }

    #[test]
    fn test_update_patient_info_skips_history() {
        let mut store = loaded_store();
        store.update_patient_info(fields(json!({ "bloodType": "A+" })));
        assert_eq!(store.state().data.patient_info.info.blood_type, "A+");
        assert_eq!(store.state().data.patient_info.info.full_name, "Sam Doe");
        assert_eq!(store.state().history.len(), 1);
    }

    #[test]
    fn test_status_validation_and_statistics() {
        let store = loaded_store();
        let status = store.state().data_status();
        assert!(status.has_patient_info);
        assert!(status.has_scan_data);
        assert!(status.has_problems);
        assert!(!status.has_treatment_plans);
        assert!(!status.is_empty);
        assert_eq!(status.teeth_count, 3);
        assert_eq!(status.problems_count, 3);

        assert!(store.state().validate().is_valid);

        let stats = store.state().problem_statistics();
        assert_eq!(stats.get("Caries"), Some(&2));
        assert_eq!(stats.get("Lesion"), Some(&1));
    }

    #[test]
    fn test_validation_errors() {
        let mut state = DentalState::default();
        state.data.teeth.push(Tooth::default());
        let report = state.validate();
        assert!(!report.is_valid);
        assert_eq!(report.errors.len(), 4);
    }

    #[test]
    fn test_reset() {
        let mut store = loaded_store();
        store.reset();
        assert!(store.state().data_status().is_empty);
        assert!(store.state().history.is_empty());
    }

    #[test]
    fn test_persists_data_and_history_only() {
        let mut store = loaded_store();
        store.add_tooth_problem(11, Problem::new("Fracture"));
        let storage = store.inner.into_storage();

        let reopened = DentalStore::open(storage);
        assert_eq!(reopened.state().data.patient_info.patient_id, "P-1");
        assert_eq!(reopened.state().history.len(), 2);
        assert!(reopened.state().error.is_none());
    }

    #[test]
    fn test_open_with_history_bound() {
        let mut store =
            DentalStore::open_with_history(MemoryStorage::new(), HistoryConfig { max_history: 2 });
        store
            .load_report_value(json!({ "patientId": "P-2", "teeth": [{ "toothNumber": 11 }] }))
            .unwrap();
        for kind in ["A", "B", "C"] {
            store.add_tooth_problem(11, Problem::new(kind));
        }
        assert_eq!(store.state().history.len(), 2);

        let reopened =
            DentalStore::open_with_history(store.inner.into_storage(), HistoryConfig { max_history: 1 });
        assert_eq!(reopened.state().history.len(), 1);
        let storage = reopened.inner.into_storage();
        let restored = DentalStore::open(storage);
        assert_eq!(restored.state().history.len(), 1);
    }
}
