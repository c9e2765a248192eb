//! Grid layout registry and the current layout selection.
//!
//! [`LayoutStore`] is the single owner of the selected layout. Persistence is
//! optional: with a storage backend the selection is restored on open and
//! written on every change, otherwise it lives for the session only.

use serde::{Deserialize, Serialize};

use crate::constants::LAYOUT_STORAGE_KEY;
use crate::store::{Reducer, StateStorage, Store};

/// Named CSS-grid template for the multi-pane viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LayoutTemplate {
    /// Display name
    pub name: &'static str,
    /// `grid-template-areas` value
    pub template: &'static str,
    /// `grid-template-columns` value
    pub columns: &'static str,
    /// `grid-template-rows` value
    pub rows: &'static str,
    pub description: &'static str,
}

/// Keys of the layout registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LayoutKey {
    #[serde(rename = "COMPACT")]
    Compact,
    #[default]
    #[serde(rename = "DEFAULT")]
    Default,
    #[serde(rename = "VIEW")]
    View,
    #[serde(rename = "DETAILS_VIEW")]
    DetailsView,
    #[serde(rename = "COMPARISON")]
    Comparison,
    #[serde(rename = "FULL_XRAY")]
    FullXray,
    #[serde(rename = "NEW_LAYOUT")]
    NewLayout,
    #[serde(rename = "XRAY_SIDE")]
    XraySide,
    #[serde(rename = "wLayout")]
    XrayLabelsSide,
}

impl LayoutKey {
    /// Get all layout keys in registry order.
    pub fn all() -> &'static [LayoutKey] {
        &[
            LayoutKey::Compact,
            LayoutKey::Default,
            LayoutKey::View,
            LayoutKey::DetailsView,
            LayoutKey::Comparison,
            LayoutKey::FullXray,
            LayoutKey::NewLayout,
            LayoutKey::XraySide,
            LayoutKey::XrayLabelsSide,
        ]
    }

    /// Registry key as stored and passed around by the UI.
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutKey::Compact => "COMPACT",
            LayoutKey::Default => "DEFAULT",
            LayoutKey::View => "VIEW",
            LayoutKey::DetailsView => "DETAILS_VIEW",
            LayoutKey::Comparison => "COMPARISON",
            LayoutKey::FullXray => "FULL_XRAY",
            LayoutKey::NewLayout => "NEW_LAYOUT",
            LayoutKey::XraySide => "XRAY_SIDE",
            LayoutKey::XrayLabelsSide => "wLayout",
        }
    }

    /// Look up a key by its registry name.
    pub fn parse(key: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.as_str() == key)
    }

    /// Template for this key.
    pub fn template(&self) -> &'static LayoutTemplate {
        match self {
            LayoutKey::Compact => &COMPACT,
            LayoutKey::Default => &DEFAULT,
            LayoutKey::View => &VIEW,
            LayoutKey::DetailsView => &DETAILS_VIEW,
            LayoutKey::Comparison => &COMPARISON,
            LayoutKey::FullXray => &FULL_XRAY,
            LayoutKey::NewLayout => &NEW_LAYOUT,
            LayoutKey::XraySide => &XRAY_SIDE,
            LayoutKey::XrayLabelsSide => &XRAY_LABELS_SIDE,
        }
    }
}

impl std::fmt::Display for LayoutKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const COMPACT: LayoutTemplate = LayoutTemplate {
    name: "Compact View",
    template: r#""xray labels ." "xray side ." "xray side .""#,
    columns: "1fr 1fr 0.5fr",
    rows: "1fr 1fr 1fr",
    description: "Compact view focused on the X-ray image",
};

const DEFAULT: LayoutTemplate = LayoutTemplate {
    name: "Default View",
    template: r#""xray side" "labels side""#,
    columns: "1fr 1fr",
    rows: "1.5fr 1fr",
    description: "Default view balancing all panels",
};

const VIEW: LayoutTemplate = LayoutTemplate {
    name: "VIEW",
    template: r#""settings xray side" "settings xray side" "settings xray side""#,
    columns: ".5fr 1.75fr 1fr",
    rows: "1fr 1fr 1fr",
    description: "Image settings, X-ray and side panel",
};

const DETAILS_VIEW: LayoutTemplate = LayoutTemplate {
    name: "Details View",
    template: r#""details details details""#,
    columns: "1fr",
    rows: "1fr",
    description: "Detailed data for the selected tooth",
};

const COMPARISON: LayoutTemplate = LayoutTemplate {
    name: "Comparison View",
    template: r#""compare xray" "compare labels" "side side""#,
    columns: "1fr 2fr",
    rows: "1fr 1fr auto",
    description: "Comparison view focused on tooth analysis",
};

const FULL_XRAY: LayoutTemplate = LayoutTemplate {
    name: "Full X-Ray View",
    template: r#""xray xray xray" "xray xray xray""#,
    columns: "1fr",
    rows: "1fr",
    description: "Full X-ray image with other panels hidden",
};

const NEW_LAYOUT: LayoutTemplate = LayoutTemplate {
    name: "Dental Details View",
    template: r#""labels newcomponent" "side newcomponent" "side newcomponent""#,
    columns: "1fr 1fr",
    rows: "1fr 1fr 1fr",
    description: "Tooth details without the X-ray image",
};

const XRAY_SIDE: LayoutTemplate = LayoutTemplate {
    name: "Xray Side View",
    template: r#""xray side""#,
    columns: "4fr 1fr",
    rows: "1fr",
    description: "X-ray image with a single side panel",
};

const XRAY_LABELS_SIDE: LayoutTemplate = LayoutTemplate {
    name: "Xray Side",
    template: r#""xray labels" "xray side""#,
    columns: "2fr 1fr",
    rows: "fit-content(300px) 3fr",
    description: "X-ray image with labels above the side panel",
};

/// Current layout selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoutState {
    pub current: LayoutKey,
    pub fullscreen: bool,
}

/// Actions accepted by [`LayoutState`].
#[derive(Debug, Clone, Copy)]
pub enum LayoutAction {
    Select(LayoutKey),
    ToggleFullscreen,
}

impl Reducer for LayoutState {
    type Action = LayoutAction;

    fn reduce(&mut self, action: LayoutAction) {
        match action {
            LayoutAction::Select(key) => self.current = key,
            LayoutAction::ToggleFullscreen => self.fullscreen = !self.fullscreen,
        }
    }
}

/// Owner of the layout selection.
pub struct LayoutStore {
    store: Store<LayoutState>,
    storage: Option<Box<dyn StateStorage>>,
}

impl LayoutStore {
    /// Session-only store starting at `default`.
    pub fn volatile(default: LayoutKey) -> Self {
        Self {
            store: Store::new(LayoutState {
                current: default,
                fullscreen: false,
            }),
            storage: None,
        }
    }

    /// Store backed by `storage`; a stored valid key wins over `default`.
    pub fn persistent(storage: Box<dyn StateStorage>, default: LayoutKey) -> Self {
        let stored = match storage.get_item(LAYOUT_STORAGE_KEY) {
            Ok(value) => value.as_deref().and_then(LayoutKey::parse),
            Err(e) => {
                log::warn!("Failed to read stored layout: {}", e);
                None
            }
        };
        let mut store = Self::volatile(stored.unwrap_or(default));
        store.storage = Some(storage);
        store
    }

    /// Currently selected key.
    pub fn current(&self) -> LayoutKey {
        self.store.state().current
    }

    /// Template of the selected layout.
    pub fn layout(&self) -> &'static LayoutTemplate {
        self.current().template()
    }

    /// All registry entries.
    pub fn list(&self) -> Vec<(LayoutKey, &'static LayoutTemplate)> {
        LayoutKey::all().iter().map(|k| (*k, k.template())).collect()
    }

    /// Select a layout by registry name. Unknown names are ignored.
    ///
    /// Returns true if the name was recognized.
    pub fn set_layout(&mut self, key: &str) -> bool {
        let Some(key) = LayoutKey::parse(key) else {
            log::debug!("Ignoring unknown layout '{}'", key);
            return false;
        };
        self.select(key);
        true
    }

    /// Select a layout.
    pub fn select(&mut self, key: LayoutKey) {
        self.store.dispatch(LayoutAction::Select(key));
        if let Some(storage) = self.storage.as_mut() {
            if let Err(e) = storage.set_item(LAYOUT_STORAGE_KEY, key.as_str()) {
                log::warn!("Failed to persist layout: {}", e);
            }
        }
    }

    /// Whether the viewer is fullscreen.
    pub fn is_fullscreen(&self) -> bool {
        self.store.state().fullscreen
    }

    /// Flip fullscreen mode.
    pub fn toggle_fullscreen(&mut self) {
        self.store.dispatch(LayoutAction::ToggleFullscreen);
    }
}
