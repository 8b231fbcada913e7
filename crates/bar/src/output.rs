//! Styled, clickable units of bar text.
//!
//! A [`Segment`] is the smallest piece the bar renders; an [`Output`] is the
//! ordered list of segments a module produced in one go. Both are plain
//! values: every builder method consumes `self` and returns a new value, so
//! an Output handed to a slot can never change underneath the renderer.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::click::ClickAction;

/// Mouse button (or wheel direction) of a click event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    Left,
    Middle,
    Right,
    ScrollUp,
    ScrollDown,
}

impl Button {
    /// Map an X11 button number to a button.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Button::Left),
            2 => Some(Button::Middle),
            3 => Some(Button::Right),
            4 => Some(Button::ScrollUp),
            5 => Some(Button::ScrollDown),
            _ => None,
        }
    }
}

/// Segment color, either a semantic slot resolved by the sink's theme or an
/// explicit RGB value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Good,
    Degraded,
    Bad,
    Rgb(u8, u8, u8),
}

impl Color {
    /// Parse `#RRGGBB` (the leading `#` is optional).
    pub fn parse_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Format an RGB color as `#RRGGBB`. Semantic colors have no hex value.
    pub fn to_hex(&self) -> Option<String> {
        match self {
            Color::Rgb(r, g, b) => Some(format!("#{r:02X}{g:02X}{b:02X}")),
            _ => None,
        }
    }

    /// Pick a semantic color from threshold flags, most severe first.
    ///
    /// Returns `None` when no flag is set.
    pub fn threshold(bad: bool, degraded: bool, good: bool) -> Option<Self> {
        if bad {
            Some(Color::Bad)
        } else if degraded {
            Some(Color::Degraded)
        } else if good {
            Some(Color::Good)
        } else {
            None
        }
    }
}

/// The smallest styled, clickable unit of rendered text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Segment {
    text: String,
    icon: Option<String>,
    color: Option<Color>,
    urgent: bool,
    short_text: Option<String>,
    on_click: BTreeMap<Button, ClickAction>,
}

impl Segment {
    /// A text-only segment.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// An icon-only segment, used for compact mode summaries.
    pub fn icon(icon: impl Into<String>) -> Self {
        Self {
            icon: Some(icon.into()),
            ..Default::default()
        }
    }

    /// An icon followed by text.
    pub fn new(icon: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            icon: Some(icon.into()),
            ..Default::default()
        }
    }

    pub fn color(mut self, color: impl Into<Option<Color>>) -> Self {
        self.color = color.into();
        self
    }

    pub fn urgent(mut self, urgent: bool) -> Self {
        self.urgent = urgent;
        self
    }

    /// Text shown instead of the full text when the host bar runs out of room.
    pub fn short_text(mut self, short: impl Into<String>) -> Self {
        self.short_text = Some(short.into());
        self
    }

    /// Bind an action to a button, replacing any previous binding.
    pub fn on_click(mut self, button: Button, action: ClickAction) -> Self {
        self.on_click.insert(button, action);
        self
    }

    /// Bind an action to a button only if that button is still unbound.
    pub fn on_click_or(mut self, button: Button, action: ClickAction) -> Self {
        self.on_click.entry(button).or_insert(action);
        self
    }

    pub fn text_str(&self) -> &str {
        &self.text
    }

    pub fn icon_str(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    pub fn color_value(&self) -> Option<Color> {
        self.color
    }

    pub fn is_urgent(&self) -> bool {
        self.urgent
    }

    pub fn short_text_str(&self) -> Option<&str> {
        self.short_text.as_deref()
    }

    /// The action bound to `button`, if any.
    pub fn action(&self, button: Button) -> Option<&ClickAction> {
        self.on_click.get(&button)
    }

    /// Every bound action, in button order.
    pub fn actions(&self) -> impl Iterator<Item = (Button, &ClickAction)> {
        self.on_click.iter().map(|(button, action)| (*button, action))
    }

    /// Icon and text joined by a space, as a plain-text sink shows them.
    pub fn full_text(&self) -> String {
        match (&self.icon, self.text.is_empty()) {
            (Some(icon), true) => icon.clone(),
            (Some(icon), false) => format!("{} {}", icon, self.text),
            (None, _) => self.text.clone(),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_text())
    }
}

/// An ordered sequence of segments produced atomically by one module.
///
/// An empty Output renders as nothing at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Output {
    segments: Vec<Segment>,
}

impl Output {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Concatenate several outputs into one flat list of segments, in order.
    pub fn group(outputs: impl IntoIterator<Item = Output>) -> Self {
        Self {
            segments: outputs.into_iter().flat_map(|o| o.segments).collect(),
        }
    }

    /// Append a segment. Only meaningful while building a fresh value.
    pub fn push(mut self, segment: impl Into<Segment>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Apply a shared color to every segment.
    pub fn with_color(self, color: impl Into<Option<Color>>) -> Self {
        let color = color.into();
        self.map(|s| s.color(color))
    }

    /// Apply a shared urgency flag to every segment.
    pub fn urgent(self, urgent: bool) -> Self {
        self.map(|s| s.urgent(urgent))
    }

    /// Bind the same action to every segment.
    pub fn on_click(self, button: Button, action: ClickAction) -> Self {
        self.map(|s| s.on_click(button, action.clone()))
    }

    /// Split into the first `n` segments and the rest.
    ///
    /// Used to feed one producer's result into a summary slot and a detail
    /// slot.
    pub fn split_at(self, n: usize) -> (Output, Output) {
        let mut head = self.segments;
        let tail = head.split_off(n.min(head.len()));
        (Output { segments: head }, Output { segments: tail })
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }

    fn map(self, f: impl FnMut(Segment) -> Segment) -> Self {
        Self {
            segments: self.segments.into_iter().map(f).collect(),
        }
    }
}

impl From<Segment> for Output {
    fn from(segment: Segment) -> Self {
        Self {
            segments: vec![segment],
        }
    }
}

impl From<Vec<Segment>> for Output {
    fn from(segments: Vec<Segment>) -> Self {
        Self { segments }
    }
}

impl FromIterator<Segment> for Output {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}
