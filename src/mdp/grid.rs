//! Grid world state: the value matrix, the fixed cells, and the goal.
//!
//! A grid is read from rows of characters:
//!
//! | symbol | meaning         | terminal |
//! |--------|-----------------|----------|
//! | `.`    | free space      | no       |
//! | `*`    | wall / obstacle | yes      |
//! | `x`    | pit (penalty)   | yes      |
//! | `G`    | goal            | optional |
//!
//! Terminal cells keep their initial value for the whole run.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use ndarray::{Array2, ArrayView2};

use crate::error::{Error, GridError, Result};

/// A `(row, col)` coordinate, 0-indexed from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    pub(crate) fn index(self) -> [usize; 2] {
        [self.row, self.col]
    }
}

impl From<(usize, usize)> for Cell {
    fn from((row, col): (usize, usize)) -> Self {
        Self::new(row, col)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// The four cardinal moves plus staying put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    Stay,
}

impl Action {
    /// Enumeration order used everywhere candidates are listed.
    pub const ALL: [Action; 5] = [
        Action::Up,
        Action::Down,
        Action::Left,
        Action::Right,
        Action::Stay,
    ];
}

/// What a grid symbol stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    Free,
    Wall,
    Pit,
    Goal,
}

impl CellKind {
    /// Maps a grid symbol to its kind, `None` for anything unrecognized.
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '.' => Some(CellKind::Free),
            '*' => Some(CellKind::Wall),
            'x' => Some(CellKind::Pit),
            'G' => Some(CellKind::Goal),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            CellKind::Free => '.',
            CellKind::Wall => '*',
            CellKind::Pit => 'x',
            CellKind::Goal => 'G',
        }
    }
}

/// Initial scalar assigned to each kind of cell.
#[derive(Debug, Clone, PartialEq)]
pub struct GridRewards {
    /// Initial goal value, also the starting goal bonus.
    pub goal_reward: f64,
    /// Fixed value of `*` cells.
    pub wall_value: f64,
    /// Fixed value of `x` cells.
    pub pit_value: f64,
    /// Whether the goal is fixed like walls and pits.
    pub goal_is_terminal: bool,
}

impl Default for GridRewards {
    fn default() -> Self {
        Self {
            goal_reward: 1.0,
            wall_value: 0.0,
            pit_value: -1.0,
            goal_is_terminal: false,
        }
    }
}

impl GridRewards {
    /// Goal worth 5, walls and pits worth -1, and the goal never updated.
    pub fn terminal_goal() -> Self {
        Self {
            goal_reward: 5.0,
            wall_value: -1.0,
            pit_value: -1.0,
            goal_is_terminal: true,
        }
    }

    fn initial_value(&self, kind: CellKind) -> f64 {
        match kind {
            CellKind::Free => 0.0,
            CellKind::Wall => self.wall_value,
            CellKind::Pit => self.pit_value,
            CellKind::Goal => self.goal_reward,
        }
    }
}

/// A rectangular grid world and its current value estimates.
///
/// The dimensions are fixed at construction. Only the value iteration engine
/// mutates the values, and only at non-terminal cells.
#[derive(Debug, Clone)]
pub struct GridModel {
    kinds: Array2<CellKind>,
    values: Array2<f64>,
    initial_values: Array2<f64>,
    goal: Option<Cell>,
    goal_is_terminal: bool,
    goal_reward: f64,
    remaining_goal_bonus: f64,
}

impl GridModel {
    /// Builds a grid from rows of symbols.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedGrid`] for an empty grid, rows of unequal
    /// length, an unrecognized symbol, or more than one goal.
    ///
    /// # Examples
    ///
    /// ```
    /// use grid_mdp::{Cell, GridModel, GridRewards};
    ///
    /// let grid = GridModel::from_rows(["..G", ".x."], &GridRewards::default()).unwrap();
    /// assert_eq!(grid.dim(), (2, 3));
    /// assert_eq!(grid.goal(), Some(Cell::new(0, 2)));
    /// assert_eq!(grid.value(Cell::new(1, 1)).unwrap(), -1.0);
    /// ```
    pub fn from_rows<I, S>(rows: I, rewards: &GridRewards) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed: Vec<Vec<CellKind>> = Vec::new();
        let mut goal = None;

        for (row, line) in rows.into_iter().enumerate() {
            let mut kinds = Vec::new();
            for (col, symbol) in line.as_ref().chars().enumerate() {
                let kind = CellKind::from_symbol(symbol)
                    .ok_or(GridError::UnrecognizedSymbol { symbol, row, col })?;
                if kind == CellKind::Goal {
                    let cell = Cell::new(row, col);
                    if let Some(first) = goal {
                        return Err(GridError::DuplicateGoal {
                            first,
                            second: cell,
                        }
                        .into());
                    }
                    goal = Some(cell);
                }
                kinds.push(kind);
            }

            if let Some(first) = parsed.first() {
                if first.len() != kinds.len() {
                    return Err(GridError::RaggedRow {
                        row,
                        expected: first.len(),
                        found: kinds.len(),
                    }
                    .into());
                }
            }
            parsed.push(kinds);
        }

        let height = parsed.len();
        let width = parsed.first().map_or(0, Vec::len);
        if height == 0 || width == 0 {
            return Err(GridError::Empty.into());
        }

        let kinds = Array2::from_shape_fn((height, width), |(r, c)| parsed[r][c]);
        let values = kinds.map(|&kind| rewards.initial_value(kind));

        Ok(Self {
            kinds,
            initial_values: values.clone(),
            values,
            goal,
            goal_is_terminal: rewards.goal_is_terminal,
            goal_reward: rewards.goal_reward,
            remaining_goal_bonus: rewards.goal_reward,
        })
    }

    /// Builds a grid from newline-separated text. Trailing whitespace is
    /// ignored and blank lines are skipped.
    pub fn parse(text: &str, rewards: &GridRewards) -> Result<Self> {
        Self::from_rows(
            text.lines().map(str::trim_end).filter(|line| !line.is_empty()),
            rewards,
        )
    }

    /// Reads a grid file and parses it like [`parse`](Self::parse).
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the file cannot be read, otherwise as [`from_rows`](Self::from_rows).
    pub fn from_path<P: AsRef<Path>>(path: P, rewards: &GridRewards) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text, rewards)
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.values.nrows()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.values.ncols()
    }

    /// `(height, width)`
    pub fn dim(&self) -> (usize, usize) {
        self.values.dim()
    }

    /// The goal cell, if the grid has one.
    pub fn goal(&self) -> Option<Cell> {
        self.goal
    }

    /// Whether `cell` lies inside the grid.
    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.row < self.height() && cell.col < self.width()
    }

    /// What kind of cell sits at `cell`, `None` off the grid.
    pub fn kind(&self, cell: Cell) -> Option<CellKind> {
        self.kinds.get(cell.index()).copied()
    }

    /// Walls, pits, and (when so configured) the goal.
    pub fn is_terminal(&self, cell: Cell) -> bool {
        match self.kind(cell) {
            Some(CellKind::Wall | CellKind::Pit) => true,
            Some(CellKind::Goal) => self.goal_is_terminal,
            Some(CellKind::Free) | None => false,
        }
    }

    /// Walls and pits in row-major order.
    pub fn obstacles(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells()
            .filter(|&cell| matches!(self.kind(cell), Some(CellKind::Wall | CellKind::Pit)))
    }

    /// Every coordinate in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> {
        let (height, width) = self.dim();
        (0..height).flat_map(move |row| (0..width).map(move |col| Cell::new(row, col)))
    }

    /// Current value at `cell`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCoordinate`] when `cell` is outside the grid.
    pub fn value(&self, cell: Cell) -> Result<f64> {
        self.get(cell).ok_or_else(|| self.invalid(cell))
    }

    /// Current value at `cell`, `None` off the grid.
    pub fn get(&self, cell: Cell) -> Option<f64> {
        self.values.get(cell.index()).copied()
    }

    /// The whole value matrix, indexed `[[row, col]]`.
    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// The values as parsed, before any sweep.
    pub fn initial_values(&self) -> ArrayView2<'_, f64> {
        self.initial_values.view()
    }

    /// The cell `action` leads to from `cell`, if it stays on the grid.
    pub fn neighbor(&self, cell: Cell, action: Action) -> Option<Cell> {
        let target = match action {
            Action::Up => Cell::new(cell.row.checked_sub(1)?, cell.col),
            Action::Down => Cell::new(cell.row.checked_add(1)?, cell.col),
            Action::Left => Cell::new(cell.row, cell.col.checked_sub(1)?),
            Action::Right => Cell::new(cell.row, cell.col.checked_add(1)?),
            Action::Stay => cell,
        };
        self.in_bounds(target).then_some(target)
    }

    /// Candidate targets from `cell` in the order up, down, left, right,
    /// then `cell` itself when staying is allowed. Off-grid moves are
    /// dropped.
    ///
    /// ```
    /// use grid_mdp::{Cell, GridModel};
    ///
    /// let grid: GridModel = "...\n...".parse().unwrap();
    /// let corner = Cell::new(0, 0);
    /// assert_eq!(
    ///     grid.actions_from(corner, true),
    ///     vec![Cell::new(1, 0), Cell::new(0, 1), corner]
    /// );
    /// ```
    pub fn actions_from(&self, cell: Cell, allow_stay: bool) -> Vec<Cell> {
        if !self.in_bounds(cell) {
            return Vec::new();
        }
        Action::ALL
            .iter()
            .filter(|&&action| allow_stay || action != Action::Stay)
            .filter_map(|&action| self.neighbor(cell, action))
            .collect()
    }

    /// Bonus still collectible by staying on the goal.
    pub fn remaining_goal_bonus(&self) -> f64 {
        self.remaining_goal_bonus
    }

    /// Shrinks the collectible goal bonus by `rate` and returns what is left.
    pub fn decay_goal_bonus(&mut self, rate: f64) -> f64 {
        self.remaining_goal_bonus *= rate;
        self.remaining_goal_bonus
    }

    /// Restores the bonus to the goal reward.
    pub fn reset_goal_bonus(&mut self) {
        self.remaining_goal_bonus = self.goal_reward;
    }

    /// Restores the initial values and the full goal bonus.
    pub fn reset(&mut self) {
        self.values.assign(&self.initial_values);
        self.reset_goal_bonus();
    }

    pub(crate) fn values_mut(&mut self) -> &mut Array2<f64> {
        &mut self.values
    }

    pub(crate) fn invalid(&self, cell: Cell) -> Error {
        Error::InvalidCoordinate {
            cell,
            height: self.height(),
            width: self.width(),
        }
    }
}

impl FromStr for GridModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s, &GridRewards::default())
    }
}

impl fmt::Display for GridModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, line) in self.values.rows().into_iter().enumerate() {
            for (col, value) in line.iter().enumerate() {
                if col > 0 {
                    write!(f, " ")?;
                }
                match self.kinds[[row, col]] {
                    CellKind::Wall => write!(f, "{:>6}", '*')?,
                    _ => write!(f, "{:>6.2}", value)?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&str]) -> GridModel {
        GridModel::from_rows(rows, &GridRewards::default()).unwrap()
    }

    #[test]
    fn test_initial_values() {
        let g = grid(&[".*G", "x.."]);
        assert_eq!(g.dim(), (2, 3));
        assert_eq!(g.value(Cell::new(0, 0)).unwrap(), 0.0);
        assert_eq!(g.value(Cell::new(0, 1)).unwrap(), 0.0);
        assert_eq!(g.value(Cell::new(0, 2)).unwrap(), 1.0);
        assert_eq!(g.value(Cell::new(1, 0)).unwrap(), -1.0);
        assert_eq!(g.goal(), Some(Cell::new(0, 2)));
        assert_eq!(
            g.obstacles().collect::<Vec<_>>(),
            vec![Cell::new(0, 1), Cell::new(1, 0)]
        );
        assert_eq!(g.values(), g.initial_values());
    }

    #[test]
    fn test_terminal_goal_rewards() {
        let g = GridModel::from_rows([".*G"], &GridRewards::terminal_goal()).unwrap();
        assert_eq!(g.values().row(0).to_vec(), vec![0.0, -1.0, 5.0]);
        assert!(g.is_terminal(Cell::new(0, 2)));
        assert!(g.is_terminal(Cell::new(0, 1)));
        assert!(!g.is_terminal(Cell::new(0, 0)));

        let g = grid(&[".*G"]);
        assert!(!g.is_terminal(Cell::new(0, 2)));
    }

    #[test]
    fn test_grid_without_goal() {
        let g = grid(&["..", ".."]);
        assert_eq!(g.goal(), None);
        assert_eq!(g.obstacles().count(), 0);
    }

    #[test]
    fn test_ragged_rows() {
        let err = GridModel::from_rows(["...", ".."], &GridRewards::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedGrid(GridError::RaggedRow {
                row: 1,
                expected: 3,
                found: 2
            })
        ));
    }

    #[test]
    fn test_unrecognized_symbol() {
        let err = GridModel::from_rows(["..", ".#"], &GridRewards::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedGrid(GridError::UnrecognizedSymbol {
                symbol: '#',
                row: 1,
                col: 1
            })
        ));
    }

    #[test]
    fn test_empty_grid() {
        let rows: [&str; 0] = [];
        assert!(matches!(
            GridModel::from_rows(rows, &GridRewards::default()),
            Err(Error::MalformedGrid(GridError::Empty))
        ));
        assert!(matches!(
            GridModel::from_rows([""], &GridRewards::default()),
            Err(Error::MalformedGrid(GridError::Empty))
        ));
        assert!(matches!(
            "\n\n".parse::<GridModel>(),
            Err(Error::MalformedGrid(GridError::Empty))
        ));
    }

    #[test]
    fn test_duplicate_goal() {
        let err = GridModel::from_rows(["G.", ".G"], &GridRewards::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedGrid(GridError::DuplicateGoal { first, second })
                if first == Cell::new(0, 0) && second == Cell::new(1, 1)
        ));
    }

    #[test]
    fn test_parse_text() {
        let g: GridModel = "..G  \r\n\n.x.\n".parse().unwrap();
        assert_eq!(g.dim(), (2, 3));
        assert_eq!(g.kind(Cell::new(1, 1)), Some(CellKind::Pit));
    }

    #[test]
    fn test_from_path() {
        let path = std::env::temp_dir().join(format!("grid_mdp_{}.txt", std::process::id()));
        fs::write(&path, "G.\n*.\n").unwrap();
        let g = GridModel::from_path(&path, &GridRewards::default()).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(g.kind(Cell::new(1, 0)), Some(CellKind::Wall));

        assert!(matches!(
            GridModel::from_path(&path, &GridRewards::default()),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_in_bounds_and_lookup() {
        let g = grid(&["...", "..."]);
        assert!(g.in_bounds(Cell::new(1, 2)));
        assert!(!g.in_bounds(Cell::new(2, 0)));
        assert!(!g.in_bounds(Cell::new(0, 3)));
        assert_eq!(g.get(Cell::new(2, 0)), None);
        assert!(matches!(
            g.value(Cell::new(2, 0)),
            Err(Error::InvalidCoordinate {
                height: 2,
                width: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_actions_from_order() {
        let g = grid(&["...", "...", "..."]);
        let center = Cell::new(1, 1);
        assert_eq!(
            g.actions_from(center, true),
            vec![
                Cell::new(0, 1),
                Cell::new(2, 1),
                Cell::new(1, 0),
                Cell::new(1, 2),
                center
            ]
        );
        assert_eq!(g.actions_from(center, false).len(), 4);

        let corner = Cell::new(2, 2);
        assert_eq!(
            g.actions_from(corner, false),
            vec![Cell::new(1, 2), Cell::new(2, 1)]
        );
        assert!(g.actions_from(Cell::new(3, 0), true).is_empty());
    }

    #[test]
    fn test_neighbor_far_off_grid() {
        let g = grid(&["..", ".."]);
        assert_eq!(g.neighbor(Cell::new(usize::MAX, 0), Action::Down), None);
        assert_eq!(g.neighbor(Cell::new(0, usize::MAX), Action::Right), None);
        assert_eq!(g.neighbor(Cell::new(0, 0), Action::Up), None);
        assert_eq!(g.neighbor(Cell::new(0, 0), Action::Right), Some(Cell::new(0, 1)));
    }

    #[test]
    fn test_single_cell_actions() {
        let g = grid(&["G"]);
        assert!(g.actions_from(Cell::new(0, 0), false).is_empty());
        assert_eq!(g.actions_from(Cell::new(0, 0), true), vec![Cell::new(0, 0)]);
    }

    #[test]
    fn test_goal_bonus_decay_and_reset() {
        let mut g = grid(&["G."]);
        assert_eq!(g.remaining_goal_bonus(), 1.0);
        assert!((g.decay_goal_bonus(0.9) - 0.9).abs() < 1e-12);
        assert!((g.decay_goal_bonus(0.9) - 0.81).abs() < 1e-12);
        g.reset_goal_bonus();
        assert_eq!(g.remaining_goal_bonus(), 1.0);
    }

    #[test]
    fn test_reset_restores_values() {
        let mut g = grid(&["G."]);
        g.values_mut()[[0, 1]] = 3.5;
        g.decay_goal_bonus(0.5);
        g.reset();
        assert_eq!(g.value(Cell::new(0, 1)).unwrap(), 0.0);
        assert_eq!(g.remaining_goal_bonus(), 1.0);
    }

    #[test]
    fn test_display() {
        let g = grid(&["G*", "x."]);
        assert_eq!(g.to_string(), "  1.00      *\n -1.00   0.00\n");
    }
}
