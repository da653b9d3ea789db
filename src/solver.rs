use crate::data::{SLOT_COUNT, TimeBlock};
use crate::error::SolveError;
use crate::progress::ProgressReporter;
use crate::timeline::{DayTimeline, NodeHandle, Span};
use log::{debug, info};
use std::time::Instant;

pub type Score = u64;

/// Cost of attending school on one (weekday, parity) slot. Larger than any
/// span inside a day, so fewer days always wins over a tighter day.
pub const DAY_PENALTY: Score = 1440;

/// Index of the chosen candidate in each group, in group order.
pub type Selection = Vec<usize>;

/// A block of a candidate section, resolved to its day timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotBlock {
    pub slot: usize,
    pub span: Span,
}

impl TryFrom<&TimeBlock> for SlotBlock {
    type Error = SolveError;

    fn try_from(block: &TimeBlock) -> Result<Self, Self::Error> {
        let slot = block
            .slot()
            .ok_or(SolveError::InvalidWeekday { day: block.day })?;
        Ok(Self {
            slot,
            span: Span::new(block.start, block.end),
        })
    }
}

/// A candidate section as seen by the search: just the blocks it occupies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    pub blocks: Vec<SlotBlock>,
}

impl Candidate {
    pub fn new(blocks: Vec<SlotBlock>) -> Self {
        Self { blocks }
    }

    /// Fails on blocks that do not map to a day timeline.
    pub fn from_timetable(timetable: &[TimeBlock]) -> Result<Self, SolveError> {
        let blocks = timetable
            .iter()
            .map(SlotBlock::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(blocks))
    }
}

/// All minimal-score, collision-free selections found by a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestResult {
    /// `None` when no collision-free selection exists.
    pub score: Option<Score>,
    pub combinations: Vec<Selection>,
}

impl BestResult {
    fn empty() -> Self {
        Self {
            score: None,
            combinations: Vec::new(),
        }
    }
}

/// Depth-first branch-and-bound over one candidate per group.
///
/// Groups should be ordered so the ones with fewer candidates come first;
/// deciding them early prunes more of the tree.
#[derive(Debug, Clone)]
pub struct ScheduleSolver {
    groups: Vec<Vec<Candidate>>,
    // subtree[d] = number of complete selections below one candidate at depth d
    subtree: Vec<u64>,
    total: u64,
}

impl ScheduleSolver {
    pub fn new(groups: Vec<Vec<Candidate>>) -> Result<Self, SolveError> {
        for (index, group) in groups.iter().enumerate() {
            if group.is_empty() {
                return Err(SolveError::EmptyGroup(index));
            }
            for block in group.iter().flat_map(|c| &c.blocks) {
                if block.slot >= SLOT_COUNT || block.span.start >= block.span.end {
                    return Err(SolveError::InvalidBlock {
                        slot: block.slot,
                        start: block.span.start,
                        end: block.span.end,
                    });
                }
            }
        }

        let mut subtree = vec![1u64; groups.len()];
        for depth in (0..groups.len().saturating_sub(1)).rev() {
            subtree[depth] = subtree[depth + 1].saturating_mul(groups[depth + 1].len() as u64);
        }
        let total = groups
            .iter()
            .fold(1u64, |acc, g| acc.saturating_mul(g.len() as u64));

        Ok(Self {
            groups,
            subtree,
            total,
        })
    }

    /// Size of the search space: product of the group sizes.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn groups(&self) -> &[Vec<Candidate>] {
        &self.groups
    }

    /// Runs the search to completion. Every explored or pruned combination
    /// is reported to `progress` exactly once, so it ends at `self.total()`.
    pub fn solve<F>(&self, progress: &mut ProgressReporter<F>) -> BestResult
    where
        F: FnMut(u64),
    {
        let start_time = Instant::now();
        info!(
            "Starting search over {} groups ({} combinations)...",
            self.groups.len(),
            self.total
        );

        if self.groups.is_empty() {
            progress.increment(1);
            return BestResult {
                score: Some(0),
                combinations: vec![Vec::new()],
            };
        }

        let mut ctx = SearchContext::new(self.groups.len(), progress);
        self.descend(&mut ctx, 0);
        let best = ctx.best;

        info!(
            "Search finished in {:.2?}: best score {:?}, {} optimal combinations",
            start_time.elapsed(),
            best.score,
            best.combinations.len()
        );
        best
    }

    fn descend<F>(&self, ctx: &mut SearchContext<'_, F>, depth: usize)
    where
        F: FnMut(u64),
    {
        let is_leaf = depth + 1 == self.groups.len();
        let below = self.subtree[depth];

        for (index, candidate) in self.groups[depth].iter().enumerate() {
            if !ctx.place(depth, candidate) {
                ctx.unplace(depth);
                ctx.progress.increment(below);
                continue;
            }
            ctx.selection[depth] = index;

            let score = ctx.score();
            if is_leaf {
                ctx.progress.increment(1);
                ctx.record(score);
            } else if score <= ctx.best_score() {
                self.descend(ctx, depth + 1);
            } else {
                ctx.progress.increment(below);
            }

            ctx.unplace(depth);
        }
    }
}

/// Mutable state of one in-flight search.
struct SearchContext<'p, F>
where
    F: FnMut(u64),
{
    timelines: [DayTimeline; SLOT_COUNT],
    // undo[d] holds the nodes placed by the candidate currently tried at depth d
    undo: Vec<Vec<(usize, NodeHandle)>>,
    selection: Selection,
    best: BestResult,
    progress: &'p mut ProgressReporter<F>,
}

impl<'p, F> SearchContext<'p, F>
where
    F: FnMut(u64),
{
    fn new(depth: usize, progress: &'p mut ProgressReporter<F>) -> Self {
        Self {
            timelines: std::array::from_fn(|_| DayTimeline::new()),
            undo: vec![Vec::new(); depth],
            selection: vec![0; depth],
            best: BestResult::empty(),
            progress,
        }
    }

    /// Places every block of `candidate`; stops at the first collision.
    /// Whatever was placed is recorded for [`Self::unplace`] either way.
    fn place(&mut self, depth: usize, candidate: &Candidate) -> bool {
        for block in &candidate.blocks {
            match self.timelines[block.slot].insert_if_no_collision(block.span) {
                Ok(handle) => self.undo[depth].push((block.slot, handle)),
                Err(_) => return false,
            }
        }
        true
    }

    fn unplace(&mut self, depth: usize) {
        for (slot, handle) in self.undo[depth].drain(..) {
            self.timelines[slot].remove(handle);
        }
    }

    fn score(&self) -> Score {
        self.timelines
            .iter()
            .filter_map(DayTimeline::bounds)
            .map(|(first, last)| DAY_PENALTY + Score::from(last - first))
            .sum()
    }

    fn best_score(&self) -> Score {
        self.best.score.unwrap_or(Score::MAX)
    }

    fn record(&mut self, score: Score) {
        let best = self.best_score();
        if score < best {
            debug!("New best score {} (was {:?})", score, self.best.score);
            self.best.score = Some(score);
            self.best.combinations.clear();
            self.best.combinations.push(self.selection.clone());
        } else if score == best {
            self.best.combinations.push(self.selection.clone());
        }
    }
}
