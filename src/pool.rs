//! Object Pool (spec §2, §5, §9): a recycler for `FontRun` instances
//! so repeated re-layouts don't repeatedly allocate and free the
//! glyph/position/cluster vectors backing each run.
//!
//! The design notes call out that a hidden, thread-local, keyed-by-
//! thread pool is the wrong shape for a library: it is replaced here
//! with an explicit arena the caller owns and threads through
//! `TextBlock::layout`, which is also what makes "pools are never
//! shared across threads" trivially true, since there is no global state
//! to share.

use crate::font_run::{FontMetrics, FontRun, FontRunKind};
use crate::shaping::Direction;

/// Per-layout-pass recycler for `FontRun<T>` allocations.
///
/// Not `Send`/`Sync`: a pool is owned by exactly one `TextBlock`'s
/// layout call at a time, matching the single-threaded-per-Text-Block
/// scheduling model (spec §5).
#[derive(Debug)]
pub struct FontRunPool<T: Clone + PartialEq> {
    free: Vec<FontRun<T>>,
    checkouts: usize,
    returns: usize,
}

impl<T: Clone + PartialEq> Default for FontRunPool<T> {
    fn default() -> Self {
        Self { free: Vec::new(), checkouts: 0, returns: 0 }
    }
}

impl<T: Clone + PartialEq> FontRunPool<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks out a reset `FontRun` from the free list, or allocates a
    /// fresh one if the pool is empty.
    pub fn checkout(&mut self) -> FontRun<T>
    where
        T: Default,
    {
        self.checkouts += 1;
        self.free.pop().map(Self::clean).unwrap_or_else(Self::blank)
    }

    /// Returns a run to the pool, releasing any embedded shaping
    /// allocations (the run's vectors are truncated to zero length but
    /// their capacity is retained for the next checkout).
    pub fn release(&mut self, mut run: FontRun<T>) {
        self.returns += 1;
        run.glyphs.clear();
        run.positions.clear();
        run.clusters.clear();
        run.relative_cp_x.clear();
        self.free.push(run);
    }

    pub fn release_all(&mut self, runs: Vec<FontRun<T>>) {
        for run in runs {
            self.release(run);
        }
    }

    /// Number of `FontRun`s currently sitting in the free list.
    pub fn available(&self) -> usize {
        self.free.len()
    }

    pub fn stats(&self) -> (usize, usize) {
        (self.checkouts, self.returns)
    }

    fn clean(mut run: FontRun<T>) -> FontRun<T> {
        run.glyphs.clear();
        run.positions.clear();
        run.clusters.clear();
        run.relative_cp_x.clear();
        run.width = 0.0;
        run.x_coord = 0.0;
        run.line_index = None;
        run.line_height_multiplier = 1.0;
        run
    }

    fn blank() -> FontRun<T>
    where
        T: Default,
    {
        FontRun {
            kind: FontRunKind::Normal,
            style_run_index: 0,
            start: 0,
            length: 0,
            direction: Direction::Ltr,
            typeface: T::default(),
            metrics: FontMetrics::default(),
            glyphs: Vec::new(),
            positions: Vec::new(),
            clusters: Vec::new(),
            relative_cp_x: Vec::new(),
            width: 0.0,
            x_coord: 0.0,
            line_index: None,
            line_height_multiplier: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct T(&'static str);

    #[test]
    fn checkout_reuses_released_allocation_capacity() {
        let mut pool: FontRunPool<T> = FontRunPool::new();
        let mut run = pool.checkout();
        run.glyphs = vec![1, 2, 3, 4, 5];
        let cap_before = run.glyphs.capacity();
        pool.release(run);
        assert_eq!(pool.available(), 1);

        let reused = pool.checkout();
        assert_eq!(pool.available(), 0);
        assert!(reused.glyphs.is_empty());
        assert!(reused.glyphs.capacity() >= cap_before);
        assert_eq!(pool.stats(), (2, 1));
    }
}
