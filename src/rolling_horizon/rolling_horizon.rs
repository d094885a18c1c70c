use std::ops::Range;

use crate::problem::TimeIndex;

/// A window of the fix-and-optimize plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    /// Periods whose binary decisions are free while solving the window
    pub free: Range<TimeIndex>,
    /// Periods whose decisions are pinned once the window is solved. For the last window
    /// this runs to the end of the horizon.
    pub committed: Range<TimeIndex>,
    pub last: bool,
}

/// A sliding window over `horizon` periods. Each window spans `fix + overlap` periods; after a
/// window is solved its first `fix` periods are committed and the window slides forward by
/// `fix`, so consecutive windows share `overlap` periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingHorizon {
    horizon: usize,
    fix: usize,
    overlap: usize,
}

impl RollingHorizon {
    /// A window must commit at least one period; a `fix` of zero is raised to one.
    pub fn new(horizon: usize, fix: usize, overlap: usize) -> Self {
        RollingHorizon {
            horizon,
            fix: fix.max(1),
            overlap,
        }
    }

    pub fn size(&self) -> usize {
        self.fix + self.overlap
    }

    pub fn windows(&self) -> Windows {
        Windows {
            plan: *self,
            begin: 0,
            done: self.horizon == 0,
        }
    }
}

pub struct Windows {
    plan: RollingHorizon,
    begin: TimeIndex,
    done: bool,
}

impl Iterator for Windows {
    type Item = Window;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let RollingHorizon { horizon, fix, .. } = self.plan;
        let begin = self.begin;
        let end = (begin + self.plan.size()).min(horizon);
        let last = end >= horizon;

        let committed = if last {
            begin..horizon
        } else {
            begin..begin + fix
        };

        self.begin = begin + fix;
        self.done = last;

        Some(Window {
            free: begin..end,
            committed,
            last,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_periods_with_three_wide_windows() {
        let windows: Vec<_> = RollingHorizon::new(10, 1, 2).windows().collect();
        assert_eq!(windows.len(), 8);
        assert_eq!(windows[0].free, 0..3);
        assert_eq!(windows[1].free, 1..4);
        assert_eq!(windows[7].free, 7..10);
        assert!(windows[7].last);
        assert!(windows[..7].iter().all(|w| !w.last));

        // consecutive windows share exactly the overlap
        for pair in windows.windows(2) {
            assert_eq!(pair[0].free.end - pair[1].free.start, 2);
        }

        // the committed periods cover the horizon exactly once
        let mut committed: Vec<_> = windows.iter().flat_map(|w| w.committed.clone()).collect();
        committed.sort_unstable();
        assert_eq!(committed, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn wide_window_covers_everything_at_once() {
        let windows: Vec<_> = RollingHorizon::new(4, 2, 3).windows().collect();
        assert_eq!(
            windows,
            vec![Window {
                free: 0..4,
                committed: 0..4,
                last: true
            }]
        );
    }

    #[test]
    fn last_window_is_clamped() {
        let windows: Vec<_> = RollingHorizon::new(10, 2, 5).windows().collect();
        let frees: Vec<_> = windows.iter().map(|w| w.free.clone()).collect();
        assert_eq!(frees, vec![0..7, 2..9, 4..10]);
        assert_eq!(windows[2].committed, 4..10);
    }
}
