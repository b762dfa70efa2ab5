use std::ops::Range;

pub trait Categorized {
    fn major_category(&self) -> &str;
    fn middle_category(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupRun {
    pub start: usize,
    pub len: usize,
}

impl GroupRun {
    pub fn indices(&self) -> Range<usize> {
        self.start..self.start + self.len
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AxisGrouping {
    runs: Vec<GroupRun>,
    membership: Vec<Option<usize>>,
}

impl AxisGrouping {
    #[allow(dead_code)]
    pub fn runs(&self) -> &[GroupRun] {
        &self.runs
    }

    pub fn run_at(&self, index: usize) -> Option<GroupRun> {
        self.membership
            .get(index)
            .copied()
            .flatten()
            .map(|slot| self.runs[slot])
    }

    pub fn is_grouped(&self, index: usize) -> bool {
        self.run_at(index).is_some()
    }

    pub fn is_first(&self, index: usize) -> bool {
        self.run_at(index).is_some_and(|run| run.start == index)
    }

    pub fn row_span(&self, index: usize) -> usize {
        self.run_at(index).map_or(1, |run| run.len)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowGrouping {
    pub major: AxisGrouping,
    pub middle: AxisGrouping,
}

pub fn compute_grouping<R: Categorized>(rows: &[R]) -> RowGrouping {
    let major = scan_axis(rows.len(), |index| {
        mergeable(
            rows[index - 1].major_category(),
            rows[index].major_category(),
        )
    });
    let middle = scan_axis(rows.len(), |index| {
        mergeable(
            rows[index - 1].major_category(),
            rows[index].major_category(),
        ) && mergeable(
            rows[index - 1].middle_category(),
            rows[index].middle_category(),
        )
    });

    RowGrouping { major, middle }
}

// Trimming applies to the comparison only; stored values are left alone.
fn mergeable(left: &str, right: &str) -> bool {
    let left = left.trim();
    !left.is_empty() && left == right.trim()
}

fn scan_axis(count: usize, merges_with_previous: impl Fn(usize) -> bool) -> AxisGrouping {
    let mut runs = Vec::new();
    let mut membership = vec![None; count];
    let mut start = 0;

    for index in 1..=count {
        if index < count && merges_with_previous(index) {
            continue;
        }

        // Runs of length 1 are not recorded: singletons render as plain cells.
        let len = index - start;
        if len >= 2 {
            let slot = runs.len();
            runs.push(GroupRun { start, len });
            for covered in start..index {
                membership[covered] = Some(slot);
            }
        }
        start = index;
    }

    AxisGrouping { runs, membership }
}
