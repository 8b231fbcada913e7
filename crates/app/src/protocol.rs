//! The i3bar/swaybar JSON protocol: rendered lines out on stdout, click
//! events in on stdin.

use std::io::Write;

use anyhow::{Context, anyhow};
use bar::{Button, ClickEvent, Line, Placed, RenderSink};
use futures_util::Stream;
use futures_util::stream::unfold;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;
use tracing::{debug, error, warn};

use crate::config::Theme;

const HEADER: &str = r#"{"version":1,"click_events":true}"#;

#[derive(Debug, Serialize)]
struct Block<'a> {
    full_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    short_text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    urgent: bool,
    name: &'static str,
    instance: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    separator_block_width: Option<u32>,
}

impl<'a> Block<'a> {
    fn new(placed: &'a Placed, theme: &Theme) -> Self {
        let segment = &placed.segment;
        Self {
            full_text: segment.full_text(),
            short_text: segment.short_text_str(),
            color: segment.color_value().and_then(|c| theme.hex(c)),
            urgent: segment.is_urgent(),
            name: placed.id.source.name(),
            instance: placed.id.index.to_string(),
            separator_block_width: theme.separator_width,
        }
    }
}

/// Writes lines as an endless JSON array of block arrays.
pub struct I3barSink<W> {
    out: W,
    theme: Theme,
    started: bool,
}

impl<W: Write + Send> I3barSink<W> {
    pub fn new(out: W, theme: Theme) -> Self {
        Self {
            out,
            theme,
            started: false,
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> RenderSink for I3barSink<W> {
    fn render(&mut self, line: &Line) -> anyhow::Result<()> {
        if !self.started {
            writeln!(self.out, "{}", HEADER).context("Failed to write protocol header")?;
            writeln!(self.out, "[").context("Failed to write protocol header")?;
            self.started = true;
        }

        let blocks: Vec<Block<'_>> = line.iter().map(|p| Block::new(p, &self.theme)).collect();
        serde_json::to_writer(&mut self.out, &blocks).context("Failed to write status line")?;
        writeln!(self.out, ",").context("Failed to write status line")?;
        self.out.flush().context("Failed to flush status line")?;
        Ok(())
    }
}

/// Hands rendered lines to a writer task, keeping only the newest one that
/// has not been written yet. A host bar that stops reading stalls the writer,
/// never the render loop.
pub struct LatestLine {
    tx: watch::Sender<Option<Line>>,
}

impl RenderSink for LatestLine {
    fn render(&mut self, line: &Line) -> anyhow::Result<()> {
        self.tx
            .send(Some(line.clone()))
            .map_err(|_| anyhow!("Status line writer stopped"))
    }
}

/// Spawn the task writing the protocol to `out`.
pub fn spawn_writer<W>(out: W, theme: Theme) -> LatestLine
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = watch::channel(None);
    tokio::spawn(async move {
        if let Err(e) = write_lines(out, theme, rx).await {
            error!("{:#}", e);
        }
    });
    LatestLine { tx }
}

async fn write_lines<W>(
    mut out: W,
    theme: Theme,
    mut rx: watch::Receiver<Option<Line>>,
) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut encoder = I3barSink::new(Vec::new(), theme);
    while rx.changed().await.is_ok() {
        let Some(line) = rx.borrow_and_update().clone() else {
            continue;
        };
        encoder.render(&line)?;
        let bytes = std::mem::take(&mut encoder.out);
        out.write_all(&bytes)
            .await
            .context("Failed to write status line")?;
        out.flush().await.context("Failed to flush status line")?;
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct RawClick {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    instance: Option<String>,
    button: u8,
}

/// Parse one line of the click stream. The opening `[` and the separating
/// `,` the host bar writes are skipped.
pub fn parse_click(line: &str) -> Option<ClickEvent> {
    let line = line.trim().trim_start_matches('[').trim_start_matches(',').trim();
    if line.is_empty() {
        return None;
    }

    let raw: RawClick = match serde_json::from_str(line) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Ignoring malformed click event {:?}: {}", line, e);
            return None;
        }
    };
    let name = raw.name?;
    let instance = raw.instance?.parse().ok()?;
    let Some(button) = Button::from_code(raw.button) else {
        debug!("Ignoring click with button {}", raw.button);
        return None;
    };
    Some(ClickEvent::new(name, instance, button))
}

/// Click events read line by line from `reader`, until it closes.
pub fn clicks<R>(reader: R) -> impl Stream<Item = ClickEvent>
where
    R: AsyncBufRead + Unpin,
{
    unfold(reader.lines(), |mut lines| async move {
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if let Some(event) = parse_click(&line) {
                        return Some((event, lines));
                    }
                }
                Ok(None) => return None,
                Err(e) => {
                    warn!("Failed to read click events: {}", e);
                    return None;
                }
            }
        }
    })
}
