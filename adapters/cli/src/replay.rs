//! Drives the controller through a script and records everything it emits.

use std::{collections::BTreeMap, io::Write};

use anyhow::{Context, Result};
use circles_core::{wire::GameSnapshot, ActionRequest, HexCoord, RenderCommand};
use circles_rendering::{
    BoardPresentation, HexLayout, RenderingBackend, TilePalette, DEFAULT_HEX_GAP,
    DEFAULT_HEX_SIZE,
};
use circles_system_actions::ActionRegistry;
use circles_system_controller::{ActionController, Outbox};
use circles_world::{query, GameState};
use serde::Serialize;
use tracing::warn;

use crate::{network::NetworkClient, script::Step};

/// Line of replay output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayEvent {
    /// Request handed to the network.
    Request(ActionRequest),
    /// Directive handed to the renderer.
    Render(RenderCommand),
}

/// World, controller and presentation of one replay session.
#[derive(Debug)]
pub struct Replay<N> {
    state: GameState,
    controller: ActionController,
    network: N,
    board: BoardPresentation,
}

impl<N: NetworkClient> Replay<N> {
    /// Loads the snapshot and arms `move`.
    pub fn start(
        snapshot: &GameSnapshot,
        network: N,
        events: &mut Vec<ReplayEvent>,
    ) -> Result<Self> {
        let mut render = Vec::new();
        let state =
            GameState::load(snapshot, &mut render).context("failed to load the initial snapshot")?;
        let controller = ActionController::new(ActionRegistry::standard(), &state, &mut render)
            .context("failed to arm the resting action")?;
        let mut replay = Self {
            state,
            controller,
            network,
            board: BoardPresentation::new(),
        };
        replay.publish(
            Outbox {
                requests: Vec::new(),
                render,
            },
            events,
        )?;
        Ok(replay)
    }

    /// Feeds one scripted event through the controller.
    pub fn step(&mut self, step: &Step, events: &mut Vec<ReplayEvent>) -> Result<()> {
        let mut outbox = Outbox::default();
        match step {
            Step::Click(target) => self.controller.click(&self.state, *target, &mut outbox),
            Step::Hover(target) => self.controller.hover(&self.state, *target, &mut outbox.render),
            Step::Leave(target) => self.controller.leave(&self.state, *target, &mut outbox.render),
            Step::Arm(kind) => self
                .controller
                .change_action(&self.state, *kind, &mut outbox.render)
                .with_context(|| format!("cannot arm `{kind}`"))?,
            Step::Respond(_) => match self.network.receive()? {
                Some(response) => {
                    if self.controller.pending().is_none() {
                        warn!("response arrived without a request in flight");
                    }
                    self.controller
                        .handle_response(&mut self.state, &response, &mut outbox.render);
                }
                None => warn!("no scripted response left to deliver"),
            },
        }
        self.publish(outbox, events)
    }

    /// Presents the accumulated board through the backend.
    pub fn present(&self, backend: &mut impl RenderingBackend) -> Result<()> {
        let radius = query::grid(&self.state).radius();
        let layout = HexLayout::for_board(radius, DEFAULT_HEX_SIZE, DEFAULT_HEX_GAP)?;
        backend.present(&self.board, &layout)
    }

    /// Current world.
    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Controller driving the session.
    #[must_use]
    pub fn controller(&self) -> &ActionController {
        &self.controller
    }

    /// Network the session talks to.
    #[must_use]
    pub fn network(&self) -> &N {
        &self.network
    }

    /// Presentation folded from every emitted directive.
    #[must_use]
    pub fn board(&self) -> &BoardPresentation {
        &self.board
    }

    fn publish(&mut self, outbox: Outbox, events: &mut Vec<ReplayEvent>) -> Result<()> {
        for command in outbox.render {
            self.board.apply(&command);
            events.push(ReplayEvent::Render(command));
        }
        for request in outbox.requests {
            self.network.submit(request)?;
            events.push(ReplayEvent::Request(request));
        }
        Ok(())
    }
}

/// Backend that prints one line per hex: pixel centre, fill and occupant.
#[derive(Debug)]
pub struct SummaryBackend<W> {
    writer: W,
    hexes: Vec<HexCoord>,
    palette: TilePalette,
}

impl<W: Write> SummaryBackend<W> {
    /// Creates a backend describing the listed hexes.
    pub fn new(writer: W, hexes: Vec<HexCoord>) -> Self {
        Self {
            writer,
            hexes,
            palette: TilePalette::default(),
        }
    }
}

impl<W: Write> RenderingBackend for SummaryBackend<W> {
    fn present(&mut self, board: &BoardPresentation, layout: &HexLayout) -> Result<()> {
        let occupants: BTreeMap<_, _> =
            board.entities().map(|(entity, hex)| (hex, entity)).collect();
        for &hex in &self.hexes {
            let centre = layout.hex_to_point(hex);
            let fill = board.fill(hex, &self.palette);
            write!(
                self.writer,
                "{hex:>6} ({:>7.1}, {:>7.1}) #{:02x}{:02x}{:02x} {:?}",
                centre.x,
                centre.y,
                channel(fill.red),
                channel(fill.green),
                channel(fill.blue),
                board.tile_state(hex),
            )?;
            for overlay in board.overlays_at(hex) {
                write!(self.writer, " +{overlay:?}")?;
            }
            if let Some(entity) = occupants.get(&hex) {
                write!(self.writer, " {entity:?}")?;
            }
            writeln!(self.writer)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

fn channel(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}
