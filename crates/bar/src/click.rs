//! Click routing.
//!
//! Segments carry [`ClickAction`] values instead of callbacks. The
//! [`ClickDispatcher`] looks the clicked segment up in the most recently
//! rendered line and executes its action. Modal actions only take the
//! controller lock briefly; launches run on detached tasks, so a slow child
//! never holds up clicks or renders.

use std::process::Stdio;

use futures_signals::signal::Mutable;
use futures_util::{Stream, StreamExt};
use tokio::process::Command;
use tracing::{debug, error, warn};

use crate::aggregator::{Line, Source, Targets};
use crate::modal::{ModalController, ModeKey};
use crate::output::Button;

/// An external program to start on click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launch {
    program: String,
    args: Vec<String>,
}

impl Launch {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Build from an argv list; `None` when the list is empty.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone()).args(args.iter().cloned()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        command
    }
}

/// What a click on a segment does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickAction {
    Toggle(ModeKey),
    Expand(ModeKey),
    Collapse,
    Spawn(Launch),
}

impl ClickAction {
    /// The mode this action drives, if any.
    pub fn mode(&self) -> Option<ModeKey> {
        match self {
            ClickAction::Toggle(key) | ClickAction::Expand(key) => Some(*key),
            ClickAction::Collapse | ClickAction::Spawn(_) => None,
        }
    }
}

/// A click as reported by the host bar: the segment identity it was given
/// when rendered, and the button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickEvent {
    pub name: String,
    pub instance: usize,
    pub button: Button,
}

impl ClickEvent {
    pub fn new(name: impl Into<String>, instance: usize, button: Button) -> Self {
        Self {
            name: name.into(),
            instance,
            button,
        }
    }
}

/// Executes the actions of clicked segments.
#[derive(Debug, Clone)]
pub struct ClickDispatcher {
    controller: ModalController,
    line: Mutable<Line>,
    targets: Targets,
}

impl ClickDispatcher {
    pub(crate) fn new(controller: ModalController, line: Mutable<Line>, targets: Targets) -> Self {
        Self {
            controller,
            line,
            targets,
        }
    }

    fn lookup(&self, event: &ClickEvent) -> Option<(Source, ClickAction)> {
        let line = self.line.lock_ref();
        let placed = line.find(&event.name, event.instance)?;
        let action = placed.segment.action(event.button)?;
        Some((placed.id.source, action.clone()))
    }

    /// The action bound to the clicked segment and button, if any.
    pub fn resolve(&self, event: &ClickEvent) -> Option<ClickAction> {
        self.lookup(event).map(|(_, action)| action)
    }

    // Overrides only carry actions the controller accepted.
    fn may_drive(&self, source: Source, mode: ModeKey) -> bool {
        match source {
            Source::Module(id) => self.targets.get(&id).is_some_and(|t| t.contains(&mode)),
            Source::Override(_) => self.controller.is_registered(mode),
        }
    }

    /// Execute the action for `event`. Returns the action that ran, or `None`
    /// when nothing is bound or the action was refused.
    pub fn dispatch(&self, event: &ClickEvent) -> Option<ClickAction> {
        let Some((source, action)) = self.lookup(event) else {
            debug!(
                "No action for {:?} on {}/{}",
                event.button, event.name, event.instance
            );
            return None;
        };

        if let Some(mode) = action.mode().filter(|&m| !self.may_drive(source, m)) {
            error!("{} may not drive undeclared mode {}", source.name(), mode);
            return None;
        }

        let applied = match &action {
            ClickAction::Toggle(key) => self.controller.toggle(*key).map(drop),
            ClickAction::Expand(key) => self.controller.expand(*key),
            ClickAction::Collapse => {
                self.controller.collapse();
                Ok(())
            }
            ClickAction::Spawn(launch) => {
                spawn_detached(launch.clone());
                Ok(())
            }
        };
        applied.ok().map(|()| action)
    }

    /// Dispatch every event of `events` until the stream ends.
    pub async fn run<S>(self, events: S)
    where
        S: Stream<Item = ClickEvent>,
    {
        let mut events = Box::pin(events);
        while let Some(event) = events.next().await {
            self.dispatch(&event);
        }
        debug!("Click source ended");
    }
}

/// Start `launch` and reap it on its own task.
fn spawn_detached(launch: Launch) {
    tokio::spawn(async move {
        let mut child = match launch.command().spawn() {
            Ok(child) => child,
            Err(err) => {
                warn!("Failed to launch {}: {}", launch.program(), err);
                return;
            }
        };
        debug!("Launched {}", launch.program());
        match child.wait().await {
            Ok(status) if !status.success() => {
                warn!("{} exited with {}", launch.program(), status);
            }
            Ok(_) => {}
            Err(err) => warn!("Failed to wait for {}: {}", launch.program(), err),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_from_argv() {
        let argv = vec!["gsimplecal".to_string(), "--flag".to_string()];
        let launch = Launch::from_argv(&argv).unwrap();
        assert_eq!(launch, Launch::new("gsimplecal").arg("--flag"));
        assert!(Launch::from_argv(&[]).is_none());
    }

    #[test]
    fn test_action_mode() {
        assert_eq!(
            ClickAction::Toggle(ModeKey::Media).mode(),
            Some(ModeKey::Media)
        );
        assert_eq!(ClickAction::Collapse.mode(), None);
        assert_eq!(ClickAction::Spawn(Launch::new("true")).mode(), None);
    }

    #[tokio::test]
    async fn test_failed_launch_is_contained() {
        spawn_detached(Launch::new("/nonexistent/modalbar-test-binary"));
        tokio::task::yield_now().await;
    }
}
