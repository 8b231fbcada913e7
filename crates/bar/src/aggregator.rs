//! Render aggregation.
//!
//! The [`Bar`] owns every module slot and a declared layout. Whenever any
//! slot or the modal state changes, the render loop recomputes the whole line
//! from current state and hands it to a [`RenderSink`]. Nothing is diffed:
//! bursts of updates from unrelated producers coalesce into one render.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::Context;
use futures_signals::signal::{Mutable, SignalExt};
use futures_util::stream::{BoxStream, select_all};
use futures_util::{FutureExt, StreamExt};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::click::{ClickAction, ClickDispatcher};
use crate::error::SetupError;
use crate::modal::{ModalController, ModeKey, ModeSpec, Visible};
use crate::module::{ModuleId, ModuleSlot, Producer};
use crate::output::{Button, Output, Segment};

/// Where a rendered segment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Module(ModuleId),
    Override(ModeKey),
}

impl Source {
    pub fn name(&self) -> &'static str {
        match self {
            Source::Module(id) => id.as_str(),
            Source::Override(key) => key.override_name(),
        }
    }
}

/// Identity of a rendered segment: its source and position within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentId {
    pub source: Source,
    pub index: usize,
}

/// A segment placed in the line.
#[derive(Debug, Clone, PartialEq)]
pub struct Placed {
    pub id: SegmentId,
    pub segment: Segment,
}

/// One full render of the bar.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Line {
    segments: Vec<Placed>,
}

impl Line {
    pub fn iter(&self) -> impl Iterator<Item = &Placed> {
        self.segments.iter()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Look a segment up by the identity the sink exposed.
    pub fn find(&self, name: &str, instance: usize) -> Option<&Placed> {
        self.segments
            .iter()
            .find(|p| p.id.index == instance && p.id.source.name() == name)
    }

    /// Full text of every segment, in order.
    pub fn texts(&self) -> Vec<String> {
        self.segments
            .iter()
            .map(|p| p.segment.full_text())
            .collect()
    }
}

/// Receiver of rendered lines.
pub trait RenderSink: Send {
    fn render(&mut self, line: &Line) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entry {
    Module(ModuleId),
    Modes,
}

/// Registration surface, used once at startup.
#[derive(Default)]
pub struct BarBuilder {
    slots: Vec<ModuleSlot>,
    producers: Vec<(ModuleId, Box<dyn Producer>)>,
    modes: Vec<ModeSpec>,
    targets: Vec<(ModuleId, Vec<ModeKey>)>,
    layout: Vec<Entry>,
    controller: ModalController,
}

/// Modes each module's own click actions may drive.
pub(crate) type Targets = Arc<HashMap<ModuleId, HashSet<ModeKey>>>;

impl BarBuilder {
    /// The controller the finished bar will use. Producers and click actions
    /// get their handle from here.
    pub fn controller(&self) -> ModalController {
        self.controller.clone()
    }

    /// Register a module fed by `producer`.
    pub fn module(
        &mut self,
        id: ModuleId,
        producer: impl Producer,
    ) -> Result<ModuleSlot, SetupError> {
        let slot = self.static_module(id)?;
        self.producers.push((id, Box::new(producer)));
        Ok(slot)
    }

    /// Register a module without a producer. The returned slot is filled by
    /// whoever holds it, typically another module's producer.
    pub fn static_module(&mut self, id: ModuleId) -> Result<ModuleSlot, SetupError> {
        if self.slots.iter().any(|s| s.id() == id) {
            return Err(SetupError::DuplicateModule(id));
        }
        let slot = ModuleSlot::new(id);
        self.slots.push(slot.clone());
        Ok(slot)
    }

    pub fn mode(&mut self, spec: ModeSpec) -> Result<&mut Self, SetupError> {
        if self.modes.iter().any(|m| m.key() == spec.key()) {
            return Err(SetupError::DuplicateMode(spec.key()));
        }
        self.modes.push(spec);
        Ok(self)
    }

    /// Declare the modes `id`'s own click actions may drive.
    ///
    /// Members of a mode may always drive that mode; anything else has to be
    /// declared here, and every declared mode must be registered by the time
    /// the bar is built.
    pub fn targets(
        &mut self,
        id: ModuleId,
        modes: impl IntoIterator<Item = ModeKey>,
    ) -> &mut Self {
        self.targets.push((id, modes.into_iter().collect()));
        self
    }

    /// Place a standalone module at the end of the line so far.
    pub fn place(&mut self, id: ModuleId) -> &mut Self {
        self.layout.push(Entry::Module(id));
        self
    }

    /// Place the mode group at the end of the line so far.
    pub fn place_modes(&mut self) -> &mut Self {
        self.layout.push(Entry::Modes);
        self
    }

    /// Validate the registration and produce the bar.
    pub fn build(self) -> Result<Bar, SetupError> {
        let registered: HashSet<ModuleId> = self.slots.iter().map(|s| s.id()).collect();
        let mut placed = HashSet::new();

        let mut modes_placed = false;
        for entry in &self.layout {
            match entry {
                Entry::Module(id) => {
                    if !registered.contains(id) {
                        return Err(SetupError::UnknownModule(*id));
                    }
                    if !placed.insert(*id) {
                        return Err(SetupError::PlacedTwice(*id));
                    }
                }
                Entry::Modes if modes_placed => return Err(SetupError::ModesPlacedTwice),
                Entry::Modes => modes_placed = true,
            }
        }
        if !self.modes.is_empty() && !modes_placed {
            return Err(SetupError::ModesNotPlaced);
        }

        let mode_keys: HashSet<ModeKey> = self.modes.iter().map(|m| m.key()).collect();
        let mut targets: HashMap<ModuleId, HashSet<ModeKey>> = HashMap::new();
        for spec in &self.modes {
            for id in spec.modules() {
                if !registered.contains(&id) {
                    return Err(SetupError::UnknownModeModule {
                        mode: spec.key(),
                        module: id,
                    });
                }
                if !placed.insert(id) {
                    return Err(SetupError::PlacedTwice(id));
                }
                targets.entry(id).or_default().insert(spec.key());
            }

            let override_targets = spec
                .initial_override()
                .into_iter()
                .flat_map(|s| s.actions())
                .filter_map(|(_, action)| action.mode());
            for target in override_targets {
                if !mode_keys.contains(&target) {
                    return Err(SetupError::UnregisteredMode(target));
                }
            }
        }

        for (id, modes) in &self.targets {
            if !registered.contains(id) {
                return Err(SetupError::UnknownModule(*id));
            }
            if let Some(mode) = modes.iter().find(|m| !mode_keys.contains(m)) {
                return Err(SetupError::UnregisteredMode(*mode));
            }
            targets.entry(*id).or_default().extend(modes);
        }

        if let Some(slot) = self.slots.iter().find(|s| !placed.contains(&s.id())) {
            return Err(SetupError::Unplaced(slot.id()));
        }

        // Outputs already set on static slots are checked now; later ones are
        // checked against the same table when clicked.
        for slot in &self.slots {
            let allowed = targets.get(&slot.id());
            let output = slot.get();
            let undeclared = output
                .segments()
                .iter()
                .flat_map(|s| s.actions())
                .filter_map(|(_, action)| action.mode())
                .find(|mode| !allowed.is_some_and(|a| a.contains(mode)));
            if let Some(mode) = undeclared {
                return Err(SetupError::UndeclaredTarget {
                    module: slot.id(),
                    mode,
                });
            }
        }

        self.controller.install(self.modes);
        let index = self
            .slots
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id(), i))
            .collect();

        Ok(Bar {
            slots: self.slots,
            index,
            producers: self.producers,
            layout: self.layout,
            controller: self.controller,
            targets: Arc::new(targets),
            line: Mutable::new(Line::default()),
        })
    }
}

/// Aborts producer tasks when the render loop returns.
struct Producers(Vec<JoinHandle<()>>);

impl Drop for Producers {
    fn drop(&mut self) {
        for task in &self.0 {
            task.abort();
        }
    }
}

/// The assembled bar: slots, layout and modal controller.
pub struct Bar {
    slots: Vec<ModuleSlot>,
    index: HashMap<ModuleId, usize>,
    producers: Vec<(ModuleId, Box<dyn Producer>)>,
    layout: Vec<Entry>,
    controller: ModalController,
    targets: Targets,
    line: Mutable<Line>,
}

impl Bar {
    pub fn builder() -> BarBuilder {
        BarBuilder::default()
    }

    pub fn controller(&self) -> ModalController {
        self.controller.clone()
    }

    pub fn slot(&self, id: ModuleId) -> Option<&ModuleSlot> {
        self.index.get(&id).map(|&i| &self.slots[i])
    }

    /// Replace a module's output.
    pub fn update(&self, id: ModuleId, output: Output) -> Result<(), SetupError> {
        let slot = self.slot(id).ok_or(SetupError::UnknownModule(id))?;
        slot.set(output);
        Ok(())
    }

    /// A dispatcher resolving clicks against the last line handed to the sink.
    pub fn dispatcher(&self) -> ClickDispatcher {
        ClickDispatcher::new(
            self.controller.clone(),
            self.line.clone(),
            self.targets.clone(),
        )
    }

    /// The last line handed to the sink.
    pub fn last_line(&self) -> Line {
        self.line.get_cloned()
    }

    /// Recompute the full line from current state.
    pub fn render(&self) -> Line {
        let mut segments = Vec::new();

        for entry in &self.layout {
            match *entry {
                Entry::Module(id) => self.extend(&mut segments, id, None),
                Entry::Modes => {
                    let visible = self
                        .controller
                        .visible(|id| self.slot(id).is_some_and(|s| s.has_output()));
                    for item in visible {
                        match item {
                            Visible::Module { mode, id } => {
                                self.extend(&mut segments, id, Some(mode))
                            }
                            Visible::Override { mode, segment } => segments.push(Placed {
                                id: SegmentId {
                                    source: Source::Override(mode),
                                    index: 0,
                                },
                                segment: segment
                                    .on_click_or(Button::Left, ClickAction::Toggle(mode)),
                            }),
                        }
                    }
                }
            }
        }

        Line { segments }
    }

    fn extend(&self, segments: &mut Vec<Placed>, id: ModuleId, mode: Option<ModeKey>) {
        let Some(slot) = self.slot(id) else {
            return;
        };
        let output = slot.get();
        segments.extend(
            output
                .into_segments()
                .into_iter()
                .enumerate()
                .map(|(index, segment)| Placed {
                    id: SegmentId {
                        source: Source::Module(id),
                        index,
                    },
                    segment: match mode {
                        Some(mode) => segment.on_click_or(Button::Left, ClickAction::Toggle(mode)),
                        None => segment,
                    },
                }),
        );
    }

    /// Start every producer and render until the sink fails.
    pub async fn run<S: RenderSink>(mut self, mut sink: S) -> anyhow::Result<()> {
        let _producers = Producers(
            self.producers
                .drain(..)
                .map(|(id, producer)| {
                    let slot = self.slots[self.index[&id]].clone();
                    tokio::spawn(async move {
                        producer.run(slot).await;
                        debug!(module = %id, "Producer finished");
                    })
                })
                .collect(),
        );
        info!(
            "Bar started with {} modules and {} modes",
            self.slots.len(),
            self.controller.modes().len()
        );

        let mut streams: Vec<BoxStream<'static, ()>> = self
            .slots
            .iter()
            .map(|s| s.changed().to_stream().boxed())
            .collect();
        streams.push(self.controller.changed().to_stream().boxed());
        let mut changes = select_all(streams);
        let mut rendered = false;

        while changes.next().await.is_some() {
            // Coalesce whatever else is already pending into this render.
            while let Some(Some(())) = changes.next().now_or_never() {}

            let line = self.render();
            if rendered && *self.line.lock_ref() == line {
                continue;
            }
            debug!("Rendering {} segments", line.len());
            // Publish first so clicks on what the sink shows always resolve.
            self.line.set(line.clone());
            sink.render(&line).context("Render sink failed")?;
            rendered = true;
        }

        Ok(())
    }
}
