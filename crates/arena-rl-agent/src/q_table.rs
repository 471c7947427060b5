//! Dense tabular Q-function over the discretized arena state

use arena_rl_core::{State, TableShape};

/// Q-values for every state-action pair in one flat buffer.
///
/// Cells are laid out x, y, bearing, distance, action from outermost to
/// innermost, which is also the order they are persisted in.
#[derive(Debug, Clone, PartialEq)]
pub struct QTable {
    shape: TableShape,
    cells: Vec<f64>,
}

impl QTable {
    /// Create a zero-initialized table
    #[must_use]
    pub fn new(shape: TableShape) -> Self {
        Self {
            shape,
            cells: vec![0.0; shape.cell_count()],
        }
    }

    /// Wrap existing cells. Returns `None` if the length does not match the shape.
    #[must_use]
    pub fn from_cells(shape: TableShape, cells: Vec<f64>) -> Option<Self> {
        (cells.len() == shape.cell_count()).then_some(Self { shape, cells })
    }

    /// Table dimensions
    #[must_use]
    pub fn shape(&self) -> TableShape {
        self.shape
    }

    /// Number of cells
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True for a table with no cells
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// All cells in storage order
    #[must_use]
    pub fn cells(&self) -> &[f64] {
        &self.cells
    }

    /// Q-values of every action for one state
    #[must_use]
    pub fn row(&self, state: &State) -> &[f64] {
        let start = self.shape.row_offset(state);
        &self.cells[start..start + self.shape.actions]
    }

    /// Read Q(state, action)
    ///
    /// # Panics
    ///
    /// Panics if `action` is not below the table's action count.
    #[must_use]
    pub fn get(&self, state: &State, action: usize) -> f64 {
        self.cells[self.index(state, action)]
    }

    /// Write Q(state, action)
    ///
    /// # Panics
    ///
    /// Panics if `action` is not below the table's action count.
    pub fn set(&mut self, state: &State, action: usize, value: f64) {
        let index = self.index(state, action);
        self.cells[index] = value;
    }

    /// Action with the highest value for `state`.
    ///
    /// The scan starts from a baseline of `0.0` at action 0 and only moves on
    /// a strictly greater value, so ties go to the lowest index and a row with
    /// no positive value always yields action 0.
    #[must_use]
    pub fn best_action(&self, state: &State) -> usize {
        let mut best = 0;
        let mut best_value = 0.0;
        for (action, &value) in self.row(state).iter().enumerate() {
            if value > best_value {
                best = action;
                best_value = value;
            }
        }
        best
    }

    /// Value of [`best_action`](Self::best_action) for `state`
    #[must_use]
    pub fn best_value(&self, state: &State) -> f64 {
        self.get(state, self.best_action(state))
    }

    /// Largest absolute cell value
    #[must_use]
    pub fn max_abs(&self) -> f64 {
        self.cells.iter().fold(0.0, |max, v| v.abs().max(max))
    }

    /// Rescale so the largest absolute value becomes `scale`.
    ///
    /// An all-zero table is left untouched and `false` is returned.
    pub fn normalize(&mut self, scale: f64) -> bool {
        let max_abs = self.max_abs();
        if max_abs == 0.0 {
            return false;
        }
        for cell in &mut self.cells {
            *cell = (*cell / max_abs) * scale;
        }
        true
    }

    /// Set every cell to `value`
    pub fn fill(&mut self, value: f64) {
        self.cells.fill(value);
    }

    fn index(&self, state: &State, action: usize) -> usize {
        assert!(
            action < self.shape.actions,
            "action {action} out of range for {} actions",
            self.shape.actions
        );
        self.shape.row_offset(state) + action
    }
}
