//! Active image, analysis result and per-tooth edit data.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::IMAGE_STORAGE_KEY;
use crate::store::{PersistedStore, Reducer, StateStorage};

/// Per-tooth user edits and the history log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToothData {
    /// User-entered corrections and annotations
    #[serde(default)]
    pub tooth_edit_data: Vec<Value>,
    /// Append-only log of prior states/actions
    #[serde(rename = "hestoriqData", default)]
    pub history: Vec<Value>,
}

/// Partial update for [`ToothData`].
///
/// Values are raw JSON; anything that is not an array is stored as `[]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToothDataPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooth_edit_data: Option<Value>,
    #[serde(rename = "hestoriqData", default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Value>,
}

impl ToothDataPatch {
    /// Patch replacing the edit records.
    pub fn edits(value: Value) -> Self {
        Self {
            tooth_edit_data: Some(value),
            history: None,
        }
    }

    /// Patch replacing the history log.
    pub fn history(value: Value) -> Self {
        Self {
            tooth_edit_data: None,
            history: Some(value),
        }
    }
}

fn array_or_empty(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => {
            log::debug!("Tooth data: coercing non-array value {} to []", other);
            Vec::new()
        }
    }
}

/// State of the image/analysis store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageState {
    #[serde(default)]
    pub image: Option<Value>,
    #[serde(default)]
    pub analysis: Option<Value>,
    /// Display settings per viewer pane
    #[serde(rename = "DentalViewSettings", default)]
    pub view_settings: Map<String, Value>,
    #[serde(default)]
    pub tooth_data: ToothData,
}

/// Actions accepted by [`ImageState`].
#[derive(Debug, Clone)]
pub enum ImageAction {
    SetImage(Option<Value>),
    SetAnalysis(Option<Value>),
    SetViewSettings(Map<String, Value>),
    SetToothData(ToothDataPatch),
    AddToHistory(Value),
    /// Reset image, analysis and tooth data; view settings are kept
    Clear,
}

impl Reducer for ImageState {
    type Action = ImageAction;

    fn reduce(&mut self, action: ImageAction) {
        match action {
            ImageAction::SetImage(image) => self.image = image,
            ImageAction::SetAnalysis(analysis) => self.analysis = analysis,
            ImageAction::SetViewSettings(settings) => self.view_settings = settings,
            ImageAction::SetToothData(patch) => {
                if let Some(edits) = patch.tooth_edit_data {
                    self.tooth_data.tooth_edit_data = array_or_empty(edits);
                }
                if let Some(history) = patch.history {
                    self.tooth_data.history = array_or_empty(history);
                }
            }
            ImageAction::AddToHistory(item) => self.tooth_data.history.push(item),
            ImageAction::Clear => {
                self.image = None;
                self.analysis = None;
                self.tooth_data = ToothData::default();
            }
        }
    }
}

/// Persisted image/analysis store.
pub struct ImageStore<S: StateStorage> {
    inner: PersistedStore<ImageState, S>,
}

impl<S: StateStorage> ImageStore<S> {
    /// Open the store, restoring any snapshot under the image storage key.
    pub fn open(storage: S) -> Self {
        Self {
            inner: PersistedStore::open(storage, IMAGE_STORAGE_KEY),
        }
    }

    /// Current state.
    pub fn state(&self) -> &ImageState {
        self.inner.state()
    }

    /// Persisted store (for subscriptions and purging).
    pub fn inner_mut(&mut self) -> &mut PersistedStore<ImageState, S> {
        &mut self.inner
    }

    /// Set or clear the current image.
    pub fn set_image(&mut self, image: Option<Value>) {
        self.inner.dispatch(ImageAction::SetImage(image));
    }

    /// Current image metadata.
    pub fn image(&self) -> Option<&Value> {
        self.state().image.as_ref()
    }

    /// Set or clear the analysis result.
    pub fn set_analysis(&mut self, analysis: Option<Value>) {
        self.inner.dispatch(ImageAction::SetAnalysis(analysis));
    }

    /// Current analysis result.
    pub fn analysis(&self) -> Option<&Value> {
        self.state().analysis.as_ref()
    }

    /// Merge fields into the view settings.
    pub fn set_view_settings(&mut self, settings: Map<String, Value>) {
        self.inner.dispatch(ImageAction::SetViewSettings(settings));
    }

    /// Merge supplied tooth data fields; non-array values become `[]`.
    pub fn set_tooth_data(&mut self, patch: ToothDataPatch) {
        self.inner.dispatch(ImageAction::SetToothData(patch));
    }

    /// Edit data, history and backups.
    pub fn tooth_data(&self) -> &ToothData {
        &self.state().tooth_data
    }

    /// Append a history record.
    pub fn add_to_history(&mut self, item: Value) {
        self.inner.dispatch(ImageAction::AddToHistory(item));
    }

    /// Reset image, analysis and tooth data in one transition.
    pub fn clear(&mut self) {
        self.inner.dispatch(ImageAction::Clear);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStorage, Store};
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_image_and_analysis_slots() {
        let mut store = ImageStore::open(MemoryStorage::new());
        assert!(store.image().is_none());

        store.set_image(Some(json!({ "url": "/xray/1.png" })));
        store.set_analysis(Some(json!({ "teeth": [] })));
        assert_eq!(store.image(), Some(&json!({ "url": "/xray/1.png" })));
        assert_eq!(store.analysis(), Some(&json!({ "teeth": [] })));
    }

    #[test]
    fn test_set_tooth_data_coerces_non_arrays() {
        let mut store = ImageStore::open(MemoryStorage::new());
        store.set_tooth_data(ToothDataPatch::edits(json!([{ "tooth": 11 }])));
        store.set_tooth_data(ToothDataPatch::edits(json!("not-an-array")));
        assert!(store.tooth_data().tooth_edit_data.is_empty());
    }

    #[test]
    fn test_set_tooth_data_keeps_unsupplied_fields() {
        let mut store = ImageStore::open(MemoryStorage::new());
        store.add_to_history(json!({ "action": "edit" }));
        store.set_tooth_data(ToothDataPatch::edits(json!([1, 2])));

        assert_eq!(store.tooth_data().tooth_edit_data, vec![json!(1), json!(2)]);
        assert_eq!(store.tooth_data().history.len(), 1);
    }

    #[test]
    fn test_patch_from_json_keys() {
        let patch: ToothDataPatch =
            serde_json::from_value(json!({ "hestoriqData": { "bad": true } })).unwrap();
        let mut state = ImageState::default();
        state.tooth_data.history.push(json!(1));
        state.reduce(ImageAction::SetToothData(patch));
        assert!(state.tooth_data.history.is_empty());
    }

    #[test]
    fn test_add_to_history_appends() {
        let mut store = ImageStore::open(MemoryStorage::new());
        for i in 0..3 {
            store.add_to_history(json!(i));
        }
        assert_eq!(
            store.tooth_data().history,
            vec![json!(0), json!(1), json!(2)]
        );
    }

    #[test]
    fn test_clear_is_one_transition() {
        let mut state = ImageState::default();
        state.reduce(ImageAction::SetImage(Some(json!("img"))));
        state.reduce(ImageAction::SetAnalysis(Some(json!("result"))));
        state.reduce(ImageAction::AddToHistory(json!("h")));

        let mut store = Store::new(state);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store.subscribe(move |s: &ImageState| sink.borrow_mut().push(s.clone()));
        store.dispatch(ImageAction::Clear);

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].image, None);
        assert_eq!(seen[0].analysis, None);
        assert_eq!(seen[0].tooth_data, ToothData::default());
    }

    #[test]
    fn test_state_persists_under_fixed_key() {
        let mut store = ImageStore::open(MemoryStorage::new());
        store.set_image(Some(json!("scan.png")));
        store.add_to_history(json!("first"));

        let storage = store.inner.into_storage();
        assert!(storage.get_item(IMAGE_STORAGE_KEY).unwrap().is_some());

        let reopened = ImageStore::open(storage);
        assert_eq!(reopened.image(), Some(&json!("scan.png")));
        assert_eq!(reopened.tooth_data().history, vec![json!("first")]);
    }
}
