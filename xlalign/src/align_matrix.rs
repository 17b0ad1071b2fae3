use crate::{AlignMode, ScoringConfig, piece::Step};

/// Stand in for minus infinity, far enough from `i32::MIN` to allow subtracting penalties
const NEG: i32 = i32::MIN / 4;

/// The three Gotoh states, which of the matrices a path is in
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    /// Ends with two aligned residues
    Match,
    /// Ends with a reference residue against a gap in the comparison sequence
    GapQuery,
    /// Ends with a comparison residue against a gap in the reference
    GapReference,
}

/// One cell of all three matrices, with the state each value was reached from
#[derive(Clone, Copy, Debug)]
struct Cell {
    m: i32,
    x: i32,
    y: i32,
    /// `None` marks the start of a local alignment
    m_from: Option<State>,
    x_from: State,
    y_from: State,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            m: NEG,
            x: NEG,
            y: NEG,
            m_from: Some(State::Match),
            x_from: State::Match,
            y_from: State::Match,
        }
    }
}

impl Cell {
    fn best(&self) -> (i32, State) {
        best([
            (self.m, State::Match),
            (self.x, State::GapQuery),
            (self.y, State::GapReference),
        ])
    }
}

/// Take the highest option, on ties the earliest option wins
fn best(options: [(i32, State); 3]) -> (i32, State) {
    options
        .into_iter()
        .fold((NEG, State::Match), |acc, o| if o.0 > acc.0 { o } else { acc })
}

/// The affine gap dynamic programming matrices for one comparison sequence (`a`, rows) against one
/// reference sequence (`b`, columns).
#[derive(Debug)]
pub(super) struct Matrix {
    value: Vec<Vec<Cell>>,
    a: usize,
    b: usize,
}

/// The traced optimal path: score, start in the comparison sequence, start in the reference, steps
pub(super) type TracedPath = (i32, usize, usize, Vec<Step>);

impl Matrix {
    pub(super) fn new(a: usize, b: usize) -> Self {
        Self {
            value: vec![vec![Cell::default(); b + 1]; a + 1],
            a,
            b,
        }
    }

    /// Set up the borders for the given mode
    #[expect(clippy::cast_possible_wrap)]
    fn start(&mut self, mode: AlignMode, scoring: &ScoringConfig) {
        self.value[0][0].m = 0;
        if mode == AlignMode::Local {
            return;
        }
        for j in 1..=self.b {
            let cell = &mut self.value[0][j];
            cell.x = if mode == AlignMode::SemiGlobal {
                -scoring.gap_at_start
            } else {
                -(scoring.gap_open + j as i32 * scoring.gap_extend)
            };
            cell.x_from = if j == 1 { State::Match } else { State::GapQuery };
        }
        for i in 1..=self.a {
            let cell = &mut self.value[i][0];
            cell.y = -(scoring.gap_open + i as i32 * scoring.gap_extend);
            cell.y_from = if i == 1 {
                State::Match
            } else {
                State::GapReference
            };
        }
    }

    /// Fill all cells with the Gotoh recurrences
    pub(super) fn fill(
        &mut self,
        query: &[(u8, Option<usize>)],
        reference: &[(u8, Option<usize>)],
        scoring: &ScoringConfig,
        mode: AlignMode,
    ) {
        debug_assert_eq!(query.len(), self.a);
        debug_assert_eq!(reference.len(), self.b);
        self.start(mode, scoring);
        let open = scoring.gap_open + scoring.gap_extend;
        let extend = scoring.gap_extend;

        for i in 1..=self.a {
            for j in 1..=self.b {
                let local = scoring.pair(query[i - 1], reference[j - 1]);
                let (previous, from) = self.value[i - 1][j - 1].best();
                let (m, m_from) = if mode == AlignMode::Local && previous <= 0 {
                    (local, None)
                } else {
                    (previous + local, Some(from))
                };

                let left = self.value[i][j - 1];
                let (x, x_from) = best([
                    (left.m - open, State::Match),
                    (left.x - extend, State::GapQuery),
                    (left.y - open, State::GapReference),
                ]);

                let up = self.value[i - 1][j];
                let (y, y_from) = best([
                    (up.m - open, State::Match),
                    (up.x - open, State::GapQuery),
                    (up.y - extend, State::GapReference),
                ]);

                self.value[i][j] = Cell {
                    m,
                    x,
                    y,
                    m_from,
                    x_from,
                    y_from,
                };
            }
        }
    }

    /// Find the end cell and state of the optimal path and its score
    fn find_end(&self, mode: AlignMode, scoring: &ScoringConfig) -> (i32, usize, usize, State) {
        match mode {
            AlignMode::Global => {
                let (score, state) = self.value[self.a][self.b].best();
                (score, self.a, self.b, state)
            }
            AlignMode::SemiGlobal => (0..=self.b)
                .rev()
                .map(|j| {
                    let (score, state) = self.value[self.a][j].best();
                    let flank = if j < self.b { scoring.gap_at_start } else { 0 };
                    (score - flank, self.a, j, state)
                })
                .fold((NEG, self.a, self.b, State::Match), |acc, o| {
                    if o.0 > acc.0 { o } else { acc }
                }),
            AlignMode::Local => {
                let mut high = (0, 0, 0, State::Match);
                for i in 1..=self.a {
                    for j in 1..=self.b {
                        if self.value[i][j].m > high.0 {
                            high = (self.value[i][j].m, i, j, State::Match);
                        }
                    }
                }
                high
            }
        }
    }

    /// Trace the optimal path back from its end
    pub(super) fn trace_path(
        &self,
        query: &[(u8, Option<usize>)],
        reference: &[(u8, Option<usize>)],
        scoring: &ScoringConfig,
        mode: AlignMode,
    ) -> TracedPath {
        let (score, mut i, mut j, mut state) = self.find_end(mode, scoring);
        let mut path = Vec::with_capacity(i + j);

        // An empty local alignment
        if mode == AlignMode::Local && i == 0 {
            return (0, 0, 0, path);
        }

        while !(i == 0 && j == 0 || mode == AlignMode::SemiGlobal && i == 0) {
            let cell = &self.value[i][j];
            match state {
                State::Match => {
                    path.push(if query[i - 1].0.eq_ignore_ascii_case(&reference[j - 1].0) {
                        Step::Match
                    } else {
                        Step::Mismatch
                    });
                    i -= 1;
                    j -= 1;
                    match cell.m_from {
                        Some(from) => state = from,
                        None => break,
                    }
                }
                State::GapQuery => {
                    path.push(Step::Deletion);
                    state = cell.x_from;
                    j -= 1;
                }
                State::GapReference => {
                    path.push(Step::Insertion);
                    state = cell.y_from;
                    i -= 1;
                }
            }
        }
        path.reverse();
        (score, i, j, path)
    }
}
