//! Round robin: every entrant meets every other entrant once.

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::calculator::{self, FormatSummary};
use crate::config::BracketFormat;
use crate::errors::BracketResult;
use crate::progression::Progress;
use crate::seeding::EntrantId;
use crate::standings;

use super::formats::FormatStrategy;
use super::models::{MatchId, MatchSet, Segment, Slot};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRobin;

impl FormatStrategy for RoundRobin {
    fn kind(&self) -> BracketFormat {
        BracketFormat::RoundRobin
    }

    fn summary(&self, entrants: usize) -> BracketResult<FormatSummary> {
        calculator::round_robin(entrants)
    }

    /// Circle method: the first entry stays put while the rest rotate one
    /// place per round. An odd field gets a phantom entry; whoever faces it
    /// sits the round out and no match is created.
    fn populate(&self, set: &mut MatchSet, _rng: &mut dyn RngCore) -> BracketResult<()> {
        let mut ring: Vec<Option<EntrantId>> = set
            .seeds()
            .iter()
            .map(|s| Some(s.entrant.id.clone()))
            .collect();
        if ring.len() % 2 == 1 {
            ring.push(None);
        }

        let n = ring.len();
        for round in 1..n as u32 {
            let mut position = 0;
            for idx in 0..n / 2 {
                if let (Some(a), Some(b)) = (&ring[idx], &ring[n - 1 - idx]) {
                    position += 1;
                    set.push(
                        Segment::RoundRobin,
                        round,
                        position,
                        Slot::Entrant(a.clone()),
                        Slot::Entrant(b.clone()),
                    )?;
                }
            }
            ring[1..].rotate_right(1);
        }

        Ok(())
    }

    fn on_finished(
        &self,
        _set: &mut MatchSet,
        _id: MatchId,
        _progress: &mut Progress,
    ) -> BracketResult<()> {
        Ok(())
    }

    fn champion(&self, set: &MatchSet) -> Option<EntrantId> {
        if !set.matches().iter().all(|m| m.is_finished()) {
            return None;
        }
        standings::standings(set)
            .into_iter()
            .next()
            .map(|standing| standing.entrant)
    }
}
