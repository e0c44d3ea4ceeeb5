//! Match graph data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::calculator::FormatSummary;
use crate::config::{BestOf, BracketFormat, MatchOptions};
use crate::errors::{BracketError, BracketResult};
use crate::seeding::{EntrantId, SeedAssignment, Seeded};

use super::formats::{Format, FormatStrategy};

/// Match ID, the match's index in its match set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MatchId(pub u32);

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bracket segment a match belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Upper,
    Lower,
    GrandFinal,
    RoundRobin,
    Swiss,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Upper => write!(f, "upper"),
            Segment::Lower => write!(f, "lower"),
            Segment::GrandFinal => write!(f, "grand_final"),
            Segment::RoundRobin => write!(f, "round_robin"),
            Segment::Swiss => write!(f, "swiss"),
        }
    }
}

impl FromStr for Segment {
    type Err = BracketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upper" => Ok(Segment::Upper),
            "lower" => Ok(Segment::Lower),
            "grand_final" => Ok(Segment::GrandFinal),
            "round_robin" => Ok(Segment::RoundRobin),
            "swiss" => Ok(Segment::Swiss),
            other => Err(BracketError::InvalidConfiguration(format!(
                "unknown segment: {other}"
            ))),
        }
    }
}

/// One of the two slots of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

/// Which participant of a source match moves along a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Winner,
    Loser,
}

/// Placeholder reference to the match that will fill a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Feed {
    pub source: MatchId,
    pub outcome: Outcome,
}

/// Content of a match slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    /// A concrete entrant
    Entrant(EntrantId),
    /// Nobody will ever occupy this slot
    Bye,
    /// Awaiting the named source match
    Pending(Feed),
}

impl Slot {
    pub fn entrant(&self) -> Option<&EntrantId> {
        match self {
            Slot::Entrant(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_bye(&self) -> bool {
        matches!(self, Slot::Bye)
    }

    /// Entrant or bye, no longer waiting on a source
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Slot::Pending(_))
    }

    pub(crate) fn feed(source: MatchId, outcome: Outcome) -> Self {
        Slot::Pending(Feed { source, outcome })
    }
}

/// Downstream destination for a match participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub target: MatchId,
    pub side: Side,
}

/// Match lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    /// At least one slot still waits on a source match
    Pending,
    /// Both entrants known, awaiting a result
    Ready,
    /// Result recorded
    Completed,
    /// Both slots resolved to byes; nothing to play
    Cancelled,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStatus::Pending => write!(f, "pending"),
            MatchStatus::Ready => write!(f, "ready"),
            MatchStatus::Completed => write!(f, "completed"),
            MatchStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// How a result came about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    Played,
    Forfeit,
    /// Walkover against a bye
    Bye,
}

/// Recorded match result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub score_a: u32,
    pub score_b: u32,
    pub winner: Side,
    pub kind: ResultKind,
}

/// A single match in the bracket graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub segment: Segment,
    /// Round within the segment (1-indexed)
    pub round: u32,
    /// Position within the round (1-indexed)
    pub position: u32,
    pub slot_a: Slot,
    pub slot_b: Slot,
    pub best_of: BestOf,
    pub status: MatchStatus,
    pub result: Option<MatchResult>,
    pub winner_to: Option<Link>,
    pub loser_to: Option<Link>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Match {
    pub fn slot(&self, side: Side) -> &Slot {
        match side {
            Side::A => &self.slot_a,
            Side::B => &self.slot_b,
        }
    }

    pub(crate) fn slot_mut(&mut self, side: Side) -> &mut Slot {
        match side {
            Side::A => &mut self.slot_a,
            Side::B => &mut self.slot_b,
        }
    }

    /// Both entrants, once known
    pub fn entrants(&self) -> Option<(&EntrantId, &EntrantId)> {
        Some((self.slot_a.entrant()?, self.slot_b.entrant()?))
    }

    pub fn involves(&self, entrant: &str) -> bool {
        self.slot_a.entrant().is_some_and(|id| id == entrant)
            || self.slot_b.entrant().is_some_and(|id| id == entrant)
    }

    pub fn winner(&self) -> Option<&EntrantId> {
        self.result
            .as_ref()
            .and_then(|result| self.slot(result.winner).entrant())
    }

    pub fn loser(&self) -> Option<&EntrantId> {
        self.result
            .as_ref()
            .and_then(|result| self.slot(result.winner.other()).entrant())
    }

    /// Completed or cancelled
    pub fn is_finished(&self) -> bool {
        matches!(self.status, MatchStatus::Completed | MatchStatus::Cancelled)
    }

    /// Completed by play or forfeit, as opposed to a walkover
    pub fn is_decided(&self) -> bool {
        self.status == MatchStatus::Completed
            && self
                .result
                .is_some_and(|result| result.kind != ResultKind::Bye)
    }

    pub fn is_walkover(&self) -> bool {
        self.result
            .is_some_and(|result| result.kind == ResultKind::Bye)
    }

    /// Slot content handed downstream for an outcome once the match is finished.
    /// A cancelled match forwards a bye on both links.
    pub(crate) fn outcome_slot(&self, outcome: Outcome) -> Option<Slot> {
        match self.status {
            MatchStatus::Cancelled => Some(Slot::Bye),
            MatchStatus::Completed => self.result.map(|result| {
                let side = match outcome {
                    Outcome::Winner => result.winner,
                    Outcome::Loser => result.winner.other(),
                };
                self.slot(side).clone()
            }),
            _ => None,
        }
    }

    pub(crate) fn link(&self, outcome: Outcome) -> Option<Link> {
        match outcome {
            Outcome::Winner => self.winner_to,
            Outcome::Loser => self.loser_to,
        }
    }
}

/// Overall bracket lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketStatus {
    InProgress,
    Completed,
}

/// Swiss round bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwissProgress {
    /// Latest generated round
    pub current_round: u32,
    /// Rounds to play in total
    pub total_rounds: u32,
}

/// Counts over a match set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketSummary {
    pub format: BracketFormat,
    pub entrants: usize,
    pub total_matches: usize,
    pub ready: usize,
    pub pending: usize,
    /// Completed by play or forfeit
    pub decided: usize,
    pub walkovers: usize,
    pub cancelled: usize,
    pub status: BracketStatus,
    pub champion: Option<EntrantId>,
    pub swiss: Option<SwissProgress>,
}

/// The full match graph of one bracket.
///
/// Matches live in an arena indexed by [`MatchId`]; links between them are
/// IDs, never references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSet {
    format: Format,
    options: MatchOptions,
    seeds: Vec<Seeded>,
    matches: Vec<Match>,
    status: BracketStatus,
    champion: Option<EntrantId>,
    swiss: Option<SwissProgress>,
    created_at: DateTime<Utc>,
}

impl MatchSet {
    pub(crate) fn new(format: Format, options: MatchOptions, seeds: &SeedAssignment) -> Self {
        Self {
            format,
            options,
            seeds: seeds.as_slice().to_vec(),
            matches: Vec::new(),
            status: BracketStatus::InProgress,
            champion: None,
            swiss: None,
            created_at: Utc::now(),
        }
    }

    pub fn format(&self) -> &Format {
        &self.format
    }

    pub fn kind(&self) -> BracketFormat {
        self.format.kind()
    }

    pub fn options(&self) -> &MatchOptions {
        &self.options
    }

    /// Entrants in seed order
    pub fn seeds(&self) -> &[Seeded] {
        &self.seeds
    }

    pub fn seed_of(&self, entrant: &str) -> Option<u32> {
        self.seeds
            .iter()
            .find(|s| s.entrant.id == entrant)
            .map(|s| s.seed)
    }

    pub fn entrant_count(&self) -> usize {
        self.seeds.len()
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn get(&self, id: MatchId) -> BracketResult<&Match> {
        self.matches
            .get(id.0 as usize)
            .ok_or(BracketError::MatchNotFound(id))
    }

    pub(crate) fn get_mut(&mut self, id: MatchId) -> BracketResult<&mut Match> {
        self.matches
            .get_mut(id.0 as usize)
            .ok_or(BracketError::MatchNotFound(id))
    }

    /// Match at a segment/round/position coordinate
    pub fn find(&self, segment: Segment, round: u32, position: u32) -> Option<&Match> {
        self.matches
            .iter()
            .find(|m| m.segment == segment && m.round == round && m.position == position)
    }

    /// Matches of one round, in position order
    pub fn round(&self, segment: Segment, round: u32) -> Vec<&Match> {
        let mut matches: Vec<&Match> = self
            .matches
            .iter()
            .filter(|m| m.segment == segment && m.round == round)
            .collect();
        matches.sort_by_key(|m| m.position);
        matches
    }

    /// Highest round number present in a segment
    pub fn rounds(&self, segment: Segment) -> u32 {
        self.matches
            .iter()
            .filter(|m| m.segment == segment)
            .map(|m| m.round)
            .max()
            .unwrap_or(0)
    }

    /// Matches currently awaiting a result
    pub fn ready_matches(&self) -> Vec<&Match> {
        self.matches
            .iter()
            .filter(|m| m.status == MatchStatus::Ready)
            .collect()
    }

    pub fn status(&self) -> BracketStatus {
        self.status
    }

    pub fn is_completed(&self) -> bool {
        self.status == BracketStatus::Completed
    }

    pub fn champion(&self) -> Option<&EntrantId> {
        self.champion.as_ref()
    }

    pub fn swiss_progress(&self) -> Option<SwissProgress> {
        self.swiss
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Format shape for this field size
    pub fn format_summary(&self) -> BracketResult<FormatSummary> {
        self.format.summary(self.seeds.len())
    }

    /// Count matches by state
    pub fn summary(&self) -> BracketSummary {
        let count = |status: MatchStatus| self.matches.iter().filter(|m| m.status == status).count();

        BracketSummary {
            format: self.kind(),
            entrants: self.seeds.len(),
            total_matches: self.matches.len(),
            ready: count(MatchStatus::Ready),
            pending: count(MatchStatus::Pending),
            decided: self.matches.iter().filter(|m| m.is_decided()).count(),
            walkovers: self.matches.iter().filter(|m| m.is_walkover()).count(),
            cancelled: count(MatchStatus::Cancelled),
            status: self.status,
            champion: self.champion.clone(),
            swiss: self.swiss,
        }
    }

    /// Lower-bracket matches where a dropped upper loser may meet an entrant
    /// it already beat. Only the upper final's drop slot (or, with two
    /// entrants, the grand final) can produce such a rematch.
    pub fn drop_exceptions(&self) -> Vec<MatchId> {
        if self.kind() != BracketFormat::DoubleElimination {
            return Vec::new();
        }

        let upper_rounds = self.rounds(Segment::Upper);
        let Some(upper_final) = self.find(Segment::Upper, upper_rounds, 1) else {
            return Vec::new();
        };

        upper_final
            .loser_to
            .filter(|link| {
                self.get(link.target).is_ok_and(|target| {
                    target.segment == Segment::GrandFinal
                        || self.round(target.segment, target.round).len() == 1
                })
            })
            .map(|link| vec![link.target])
            .unwrap_or_default()
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Append a match. Every pending slot is wired back to its source so the
    /// source's `winner_to`/`loser_to` points here.
    ///
    /// # Errors
    ///
    /// Returns `AdvancementConflict` if a source already routes that outcome
    /// elsewhere.
    pub(crate) fn push(
        &mut self,
        segment: Segment,
        round: u32,
        position: u32,
        slot_a: Slot,
        slot_b: Slot,
    ) -> BracketResult<MatchId> {
        let id = MatchId(self.matches.len() as u32);

        for (side, slot) in [(Side::A, &slot_a), (Side::B, &slot_b)] {
            if let Slot::Pending(feed) = slot {
                let source = self.get_mut(feed.source)?;
                let link = match feed.outcome {
                    Outcome::Winner => &mut source.winner_to,
                    Outcome::Loser => &mut source.loser_to,
                };
                if link.is_some() {
                    return Err(BracketError::AdvancementConflict {
                        source_match: feed.source,
                        target: format!("{segment} round {round} position {position}"),
                    });
                }
                *link = Some(Link { target: id, side });
            }
        }

        self.matches.push(Match {
            id,
            segment,
            round,
            position,
            slot_a,
            slot_b,
            best_of: self.options.best_of(segment, round),
            status: MatchStatus::Pending,
            result: None,
            winner_to: None,
            loser_to: None,
            completed_at: None,
        });

        Ok(id)
    }

    pub(crate) fn start_swiss(&mut self, total_rounds: u32) {
        self.swiss = Some(SwissProgress {
            current_round: 1,
            total_rounds,
        });
    }

    pub(crate) fn advance_swiss_round(&mut self) {
        if let Some(progress) = self.swiss.as_mut() {
            progress.current_round += 1;
        }
    }

    /// Make the current Swiss round the last one
    pub(crate) fn end_swiss_early(&mut self) {
        if let Some(progress) = self.swiss.as_mut() {
            progress.total_rounds = progress.current_round;
        }
    }

    pub(crate) fn complete(&mut self, champion: EntrantId) {
        self.status = BracketStatus::Completed;
        self.champion = Some(champion);
    }
}
