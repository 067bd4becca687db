// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

//! Decides when the external renderer runs and absorbs its outcomes.
//!
//! `Empty -> Rendering -> {Rendered, Failed}`. Rendering again after `Rendered` or `Failed`
//! takes a different expression; outcomes carry the ticket of the request that
//! produced them and are dropped once a newer request exists.

use crate::error::RenderError;
use crate::expression::{Ast, ExpressionFingerprint};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderTicket {
    pub generation: u64,
    pub fingerprint: ExpressionFingerprint,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderStatus {
    Empty,
    Rendering { ticket: RenderTicket },
    Rendered { ticket: RenderTicket },
    /// `ticket` is `None` when the expression never reached the renderer.
    Failed {
        ticket: Option<RenderTicket>,
        message: String,
    },
}

impl RenderStatus {
    pub fn ticket(&self) -> Option<RenderTicket> {
        match self {
            RenderStatus::Rendering { ticket } | RenderStatus::Rendered { ticket } => Some(*ticket),
            RenderStatus::Failed { ticket, .. } => *ticket,
            RenderStatus::Empty => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RenderStatus::Empty => "empty",
            RenderStatus::Rendering { .. } => "rendering",
            RenderStatus::Rendered { .. } => "rendered",
            RenderStatus::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutcome {
    pub ticket: RenderTicket,
    pub result: Result<(), RenderError>,
}

/// Handed to the renderer so it can report back whenever it finishes.
#[derive(Debug, Clone)]
pub struct RenderOutcomeSender {
    tx: mpsc::UnboundedSender<RenderOutcome>,
}

pub type RenderOutcomeReceiver = mpsc::UnboundedReceiver<RenderOutcome>;

pub fn render_outcome_channel() -> (RenderOutcomeSender, RenderOutcomeReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (RenderOutcomeSender { tx }, rx)
}

impl RenderOutcomeSender {
    pub fn complete(&self, ticket: RenderTicket) {
        self.send(RenderOutcome {
            ticket,
            result: Ok(()),
        });
    }

    pub fn fail(&self, ticket: RenderTicket, error: RenderError) {
        self.send(RenderOutcome {
            ticket,
            result: Err(error),
        });
    }

    fn send(&self, outcome: RenderOutcome) {
        if self.tx.send(outcome).is_err() {
            debug!("Render outcome dropped: editor frame is gone");
        }
    }
}

/// The external evaluator. `render` may report its outcome immediately or later.
pub trait ExpressionRenderer {
    fn render(&mut self, expression: &Ast, ticket: RenderTicket, outcomes: &RenderOutcomeSender);
}

#[derive(Debug)]
pub struct RenderGate {
    status: RenderStatus,
    generation: u64,
}

impl Default for RenderGate {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderGate {
    pub fn new() -> Self {
        Self {
            status: RenderStatus::Empty,
            generation: 0,
        }
    }

    pub fn status(&self) -> &RenderStatus {
        &self.status
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, RenderStatus::Failed { .. })
    }

    /// Nothing to render; the next expression renders whatever it is.
    pub fn show_empty(&mut self) {
        if !matches!(self.status, RenderStatus::Empty) {
            debug!(from = self.status.name(), "Render gate reset to empty");
        }
        self.status = RenderStatus::Empty;
    }

    /// The expression could not be built, so the renderer is never asked.
    pub fn reject(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(%message, "Expression rejected before rendering");
        self.status = RenderStatus::Failed {
            ticket: None,
            message,
        };
    }

    /// Returns a ticket when the renderer has to be invoked for `expression`.
    pub fn submit(&mut self, expression: &Ast) -> Option<RenderTicket> {
        let fingerprint = expression.fingerprint();
        if let Some(current) = self.status.ticket() {
            if current.fingerprint == fingerprint {
                debug!(
                    fingerprint = %fingerprint.short(),
                    status = self.status.name(),
                    "Expression unchanged, skipping render"
                );
                return None;
            }
        }
        self.generation += 1;
        let ticket = RenderTicket {
            generation: self.generation,
            fingerprint,
        };
        debug!(
            generation = ticket.generation,
            fingerprint = %fingerprint.short(),
            "Render requested"
        );
        self.status = RenderStatus::Rendering { ticket };
        Some(ticket)
    }

    /// Applies a renderer outcome. Returns `false` for stale outcomes.
    pub fn apply(&mut self, outcome: RenderOutcome) -> bool {
        match outcome.result {
            Ok(()) => self.complete(outcome.ticket),
            Err(error) => self.fail(outcome.ticket, error),
        }
    }

    pub fn complete(&mut self, ticket: RenderTicket) -> bool {
        match self.status {
            RenderStatus::Rendering { ticket: current } if current == ticket => {
                debug!(generation = ticket.generation, "Render completed");
                self.status = RenderStatus::Rendered { ticket };
                true
            }
            _ => {
                debug!(
                    generation = ticket.generation,
                    current = self.generation,
                    status = self.status.name(),
                    "Ignoring stale render completion"
                );
                false
            }
        }
    }

    pub fn fail(&mut self, ticket: RenderTicket, error: RenderError) -> bool {
        match self.status {
            RenderStatus::Rendering { ticket: current } | RenderStatus::Rendered { ticket: current }
                if current == ticket =>
            {
                info!(generation = ticket.generation, error = %error, "Render failed");
                self.status = RenderStatus::Failed {
                    ticket: Some(ticket),
                    message: error.to_string(),
                };
                true
            }
            _ => {
                debug!(
                    generation = ticket.generation,
                    current = self.generation,
                    status = self.status.name(),
                    "Ignoring stale render failure"
                );
                false
            }
        }
    }
}
