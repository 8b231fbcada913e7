//! Modal controller: which mode, if any, shows its detail modules.
//!
//! Modes are registered once through [`crate::BarBuilder`]. At most one mode
//! is expanded at a time; every other mode shows its collapsed form (summary
//! modules, or the override segment when the summary is empty). The state
//! lives in a single [`Mutable`], so producers setting overrides, the click
//! dispatcher toggling modes and the render loop reading visibility are all
//! serialized through the same lock.

use std::fmt;

use futures_signals::signal::{Mutable, Signal};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::ModalError;
use crate::module::ModuleId;
use crate::output::Segment;

/// Every mode the bar knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeKey {
    Battery,
    Kube,
    Media,
    Network,
    SysInfo,
    Timezones,
    Weather,
}

impl ModeKey {
    pub const ALL: [ModeKey; 7] = [
        ModeKey::Battery,
        ModeKey::Kube,
        ModeKey::Media,
        ModeKey::Network,
        ModeKey::SysInfo,
        ModeKey::Timezones,
        ModeKey::Weather,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModeKey::Battery => "battery",
            ModeKey::Kube => "kube",
            ModeKey::Media => "media",
            ModeKey::Network => "network",
            ModeKey::SysInfo => "sysinfo",
            ModeKey::Timezones => "timezones",
            ModeKey::Weather => "weather",
        }
    }

    /// Segment source name used for the mode's override segment.
    pub fn override_name(&self) -> &'static str {
        match self {
            ModeKey::Battery => "mode.battery",
            ModeKey::Kube => "mode.kube",
            ModeKey::Media => "mode.media",
            ModeKey::Network => "mode.network",
            ModeKey::SysInfo => "mode.sysinfo",
            ModeKey::Timezones => "mode.timezones",
            ModeKey::Weather => "mode.weather",
        }
    }
}

impl fmt::Display for ModeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current presentation of the mode group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Presentation {
    #[default]
    Collapsed,
    Expanded(ModeKey),
}

impl Presentation {
    pub fn is_expanded(&self, key: ModeKey) -> bool {
        *self == Presentation::Expanded(key)
    }
}

/// Registration of one mode.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeSpec {
    key: ModeKey,
    override_segment: Option<Segment>,
    summary: Vec<ModuleId>,
    detail: Vec<ModuleId>,
    always: Vec<ModuleId>,
}

impl ModeSpec {
    pub fn new(key: ModeKey) -> Self {
        Self {
            key,
            override_segment: None,
            summary: Vec::new(),
            detail: Vec::new(),
            always: Vec::new(),
        }
    }

    /// Initial override segment, shown while collapsed with no summary output.
    pub fn override_segment(mut self, segment: impl Into<Option<Segment>>) -> Self {
        self.override_segment = segment.into();
        self
    }

    /// Modules shown only while collapsed.
    pub fn summary(mut self, modules: impl IntoIterator<Item = ModuleId>) -> Self {
        self.summary.extend(modules);
        self
    }

    /// Modules shown only while this mode is expanded.
    pub fn detail(mut self, modules: impl IntoIterator<Item = ModuleId>) -> Self {
        self.detail.extend(modules);
        self
    }

    /// Modules shown in both presentations.
    pub fn always(mut self, modules: impl IntoIterator<Item = ModuleId>) -> Self {
        self.always.extend(modules);
        self
    }

    pub fn key(&self) -> ModeKey {
        self.key
    }

    pub fn initial_override(&self) -> Option<&Segment> {
        self.override_segment.as_ref()
    }

    /// Every module this mode references, summary first.
    pub fn modules(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.summary
            .iter()
            .chain(&self.detail)
            .chain(&self.always)
            .copied()
    }
}

/// One visible item of the mode group, in render order.
#[derive(Debug, Clone, PartialEq)]
pub enum Visible {
    Module { mode: ModeKey, id: ModuleId },
    Override { mode: ModeKey, segment: Segment },
}

#[derive(Debug)]
struct ModeEntry {
    spec: ModeSpec,
    current_override: Option<Segment>,
}

#[derive(Debug, Default)]
struct ModalState {
    presentation: Presentation,
    modes: Vec<ModeEntry>,
}

impl ModalState {
    fn position(&self, key: ModeKey) -> Result<usize, ModalError> {
        self.modes
            .iter()
            .position(|m| m.spec.key == key)
            .ok_or(ModalError::UnregisteredMode(key))
    }
}

/// Shared handle to the modal state.
///
/// Cloning is cheap; every clone observes and drives the same state.
#[derive(Debug, Clone, Default)]
pub struct ModalController {
    state: Mutable<ModalState>,
}

impl ModalController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the mode registry. Called once by the bar builder after
    /// validation; resets the presentation to collapsed.
    pub(crate) fn install(&self, specs: Vec<ModeSpec>) {
        let mut state = self.state.lock_mut();
        state.presentation = Presentation::Collapsed;
        state.modes = specs
            .into_iter()
            .map(|spec| ModeEntry {
                current_override: spec.override_segment.clone(),
                spec,
            })
            .collect();
    }

    pub fn is_registered(&self, key: ModeKey) -> bool {
        self.state.lock_ref().position(key).is_ok()
    }

    /// Registered modes in registration order.
    pub fn modes(&self) -> Vec<ModeKey> {
        self.state
            .lock_ref()
            .modes
            .iter()
            .map(|m| m.spec.key)
            .collect()
    }

    pub fn presentation(&self) -> Presentation {
        self.state.lock_ref().presentation
    }

    /// Expand `key`, or collapse it if it is the expanded mode.
    pub fn toggle(&self, key: ModeKey) -> Result<Presentation, ModalError> {
        let mut state = self.state.lock_mut();
        if let Err(err) = state.position(key) {
            error!("Cannot toggle: {}", err);
            return Err(err);
        }

        let next = if state.presentation.is_expanded(key) {
            Presentation::Collapsed
        } else {
            Presentation::Expanded(key)
        };
        debug!("Modal {:?} -> {:?}", state.presentation, next);
        state.presentation = next;
        Ok(next)
    }

    /// Expand `key`, collapsing whichever mode was expanded before.
    pub fn expand(&self, key: ModeKey) -> Result<(), ModalError> {
        let mut state = self.state.lock_mut();
        if let Err(err) = state.position(key) {
            error!("Cannot expand: {}", err);
            return Err(err);
        }
        if !state.presentation.is_expanded(key) {
            debug!("Modal {:?} -> expanded {}", state.presentation, key);
            state.presentation = Presentation::Expanded(key);
        }
        Ok(())
    }

    pub fn collapse(&self) {
        let mut state = self.state.lock_mut();
        if state.presentation != Presentation::Collapsed {
            debug!("Modal {:?} -> collapsed", state.presentation);
            state.presentation = Presentation::Collapsed;
        }
    }

    /// Replace a mode's override segment. Never changes the presentation.
    ///
    /// Fails when `key`, or a mode the segment's click actions drive, is not
    /// registered.
    pub fn set_override(
        &self,
        key: ModeKey,
        segment: impl Into<Option<Segment>>,
    ) -> Result<(), ModalError> {
        let segment = segment.into();
        let mut state = self.state.lock_mut();
        let targets = segment
            .iter()
            .flat_map(|s| s.actions())
            .filter_map(|(_, action)| action.mode());
        let checked = state.position(key).and_then(|index| {
            targets
                .map(|mode| state.position(mode))
                .collect::<Result<Vec<_>, _>>()
                .map(|_| index)
        });
        let index = match checked {
            Ok(index) => index,
            Err(err) => {
                error!("Cannot set override: {}", err);
                return Err(err);
            }
        };
        if state.modes[index].current_override != segment {
            state.modes[index].current_override = segment;
        }
        Ok(())
    }

    pub fn override_segment(&self, key: ModeKey) -> Option<Segment> {
        let state = self.state.lock_ref();
        let index = state.position(key).ok()?;
        state.modes[index].current_override.clone()
    }

    /// Resolve what the mode group shows right now.
    ///
    /// `has_output` reports whether a module currently has anything to show;
    /// it decides between a mode's summary modules and its override.
    pub fn visible(&self, has_output: impl Fn(ModuleId) -> bool) -> Vec<Visible> {
        let state = self.state.lock_ref();
        let mut visible = Vec::new();

        for entry in &state.modes {
            let mode = entry.spec.key;
            if state.presentation.is_expanded(mode) {
                visible.extend(
                    entry
                        .spec
                        .detail
                        .iter()
                        .map(|&id| Visible::Module { mode, id }),
                );
            } else if entry.spec.summary.iter().any(|&id| has_output(id)) {
                visible.extend(
                    entry
                        .spec
                        .summary
                        .iter()
                        .map(|&id| Visible::Module { mode, id }),
                );
            } else if let Some(segment) = &entry.current_override {
                visible.push(Visible::Override {
                    mode,
                    segment: segment.clone(),
                });
            }

            visible.extend(
                entry
                    .spec
                    .always
                    .iter()
                    .map(|&id| Visible::Module { mode, id }),
            );
        }

        visible
    }

    /// A signal that fires whenever the presentation or an override changes.
    pub fn changed(&self) -> impl Signal<Item = ()> + Send + 'static {
        self.state.signal_ref(|_| ())
    }
}
