mod policy;
mod render;

pub use policy::{ForwardFirst, MovePolicy};
pub use render::render_maze;

use crate::maze::{Cell, OccupancyGrid};
use hashbrown::HashSet;
use log::{debug, info};
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::ops::Deref;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    /// Forward and one column to the left.
    Left,
    /// Forward and one column to the right.
    Right,
    Stop,
}

impl Direction {
    pub fn symbol(self) -> char {
        match self {
            Direction::Forward => '^',
            Direction::Left => '<',
            Direction::Right => '>',
            Direction::Stop => '!',
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Left => write!(f, "left"),
            Direction::Right => write!(f, "right"),
            Direction::Stop => write!(f, "stop"),
        }
    }
}

/// Ordered moves from the user's cell toward the benchmark row.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct DirectionPlan(Vec<Direction>);

impl Deref for DirectionPlan {
    type Target = Vec<Direction>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Direction>> for DirectionPlan {
    fn from(directions: Vec<Direction>) -> Self {
        Self(directions)
    }
}

impl Display for DirectionPlan {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let symbols: Vec<String> = self.0.iter().map(|d| d.symbol().to_string()).collect();
        write!(f, "{}", symbols.join(" "))
    }
}

/// `Found` and `Blocked` are terminal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DodgeStatus {
    /// Nothing computed yet.
    Pending,
    /// Checking the start cell.
    Init,
    Searching,
    Found,
    Blocked,
}

/// Plans a way through one frame's maze.
///
/// The user stands on the bottom-center cell and walks toward row 0. Moves
/// always advance one row, so a plan never holds more steps than the grid has
/// rows, and no cell is entered twice.
pub struct Dodger<'a, P = ForwardFirst> {
    grid: &'a OccupancyGrid,
    policy: P,
    start: Cell,
    status: DodgeStatus,
    path: Vec<Cell>,
    directions: DirectionPlan,
}

impl<'a> Dodger<'a> {
    pub fn new(grid: &'a OccupancyGrid) -> Self {
        Self::with_policy(grid, ForwardFirst)
    }
}

impl<'a, P: MovePolicy> Dodger<'a, P> {
    pub fn with_policy(grid: &'a OccupancyGrid, policy: P) -> Self {
        Self {
            grid,
            policy,
            start: Cell::new(grid.rows().saturating_sub(1), grid.cols() / 2),
            status: DodgeStatus::Pending,
            path: Vec::new(),
            directions: DirectionPlan::default(),
        }
    }

    pub fn start(&self) -> Cell {
        self.start
    }

    pub fn status(&self) -> DodgeStatus {
        self.status
    }

    /// Empty until a path is found.
    pub fn directions(&self) -> &DirectionPlan {
        &self.directions
    }

    pub fn path(&self) -> &[Cell] {
        &self.path
    }

    /// Runs the search once; later calls return the settled status.
    pub fn calculate(&mut self) -> DodgeStatus {
        if self.status != DodgeStatus::Pending {
            return self.status;
        }

        self.status = DodgeStatus::Init;
        if !self.grid.contains(self.start) || self.grid.is_occupied(self.start) {
            info!("Start cell {:?} is blocked, no way forward", self.start);
            self.status = DodgeStatus::Blocked;
            return self.status;
        }

        self.status = DodgeStatus::Searching;
        let goal_row = self.grid.benchmark_row();

        if self.start.row == goal_row {
            self.path = vec![self.start];
            self.directions = vec![Direction::Forward].into();
            self.status = DodgeStatus::Found;
            return self.status;
        }

        match self.search(goal_row) {
            Some(steps) => {
                self.path = steps.iter().map(|(cell, _)| *cell).collect();
                self.directions = steps
                    .iter()
                    .filter_map(|(_, direction)| *direction)
                    .collect::<Vec<_>>()
                    .into();
                debug!("Found path {:?}", self.path);
                self.status = DodgeStatus::Found;
            }
            None => {
                info!("No safe path through the maze");
                self.status = DodgeStatus::Blocked;
            }
        }

        self.status
    }

    /// Depth-first search in policy order with backtracking.
    fn search(&self, goal_row: usize) -> Option<Vec<(Cell, Option<Direction>)>> {
        let grid = self.grid;
        let mut visited = HashSet::new();
        visited.insert(self.start);

        let mut steps = vec![(self.start, None)];
        let mut frontier = vec![self
            .policy
            .rank(grid, self.start, self.start.col)
            .into_iter()];

        while let Some(candidates) = frontier.last_mut() {
            let Some(&(at, _)) = steps.last() else {
                break;
            };

            let next = candidates.find(|(_, cell)| {
                cell.row < at.row
                    && grid.contains(*cell)
                    && !grid.is_occupied(*cell)
                    && !visited.contains(cell)
            });

            match next {
                Some((direction, cell)) => {
                    visited.insert(cell);
                    steps.push((cell, Some(direction)));
                    if cell.row == goal_row {
                        return Some(steps);
                    }
                    frontier.push(self.policy.rank(grid, cell, self.start.col).into_iter());
                }
                None => {
                    frontier.pop();
                    steps.pop();
                }
            }
        }

        None
    }

    /// Maze picture followed by the planned directions.
    pub fn render(&self) -> String {
        let mut out = render_maze(self.grid, &self.path, self.start);
        match self.status {
            DodgeStatus::Found => out.push_str(&format!("directions: {}\n", self.directions)),
            DodgeStatus::Blocked => out.push_str("directions: blocked\n"),
            DodgeStatus::Pending | DodgeStatus::Init | DodgeStatus::Searching => {
                out.push_str("directions: pending\n")
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoundingBox;
    use crate::maze::generate_maze;

    const CELL: i32 = 10;

    /// Builds a maze from a picture, farthest row first, one box per `#`.
    fn maze(picture: &[&str]) -> OccupancyGrid {
        let rows = picture.len() as u32;
        let cols = picture[0].len() as u32;
        let boxes: Vec<_> = picture
            .iter()
            .enumerate()
            .flat_map(|(row, line)| {
                line.chars()
                    .enumerate()
                    .filter(|(_, c)| *c == '#')
                    .map(move |(col, _)| {
                        let (x, y) = (col as i32 * CELL, row as i32 * CELL);
                        BoundingBox::from_edges(x, y, x + CELL, y + CELL)
                    })
            })
            .collect();

        generate_maze(&boxes, rows * CELL as u32, cols * CELL as u32, 0, CELL as u32).unwrap()
    }

    fn plan(grid: &OccupancyGrid) -> (DodgeStatus, Vec<Direction>) {
        let mut dodger = Dodger::new(grid);
        let status = dodger.calculate();
        (status, dodger.directions().to_vec())
    }

    use Direction::{Forward, Left, Right};

    #[test]
    fn nothing_is_computed_before_calculate() {
        let grid = maze(&["...", "...", "..."]);
        let dodger = Dodger::new(&grid);
        assert_eq!(dodger.status(), DodgeStatus::Pending);
        assert!(dodger.directions().is_empty());
        assert_eq!(dodger.render(), "...\n...\n...\ndirections: pending\n");
    }

    #[test]
    fn forward_wins_when_everything_is_free() {
        let grid = maze(&["...", "...", "..."]);
        assert_eq!(plan(&grid), (DodgeStatus::Found, vec![Forward, Forward]));
    }

    #[test]
    fn equal_detours_prefer_left() {
        let grid = maze(&["...", ".#.", "..."]);
        assert_eq!(plan(&grid), (DodgeStatus::Found, vec![Left, Forward]));
    }

    #[test]
    fn lateral_closer_to_start_column_wins() {
        let grid = maze(&[
            ".....", //
            "...#.",
            ".##..",
            ".....",
        ]);
        // after the forced step right, left returns to the start column
        // while right would drift two columns away
        assert_eq!(
            plan(&grid),
            (DodgeStatus::Found, vec![Right, Left, Forward])
        );
    }

    #[test]
    fn dead_ends_are_backtracked() {
        let grid = maze(&["##.", ".#.", "..."]);
        let mut dodger = Dodger::new(&grid);
        assert_eq!(dodger.calculate(), DodgeStatus::Found);
        assert_eq!(dodger.directions().to_vec(), vec![Right, Forward]);
        assert_eq!(
            dodger.path(),
            &[Cell::new(2, 1), Cell::new(1, 2), Cell::new(0, 2)]
        );
    }

    #[test]
    fn occupied_start_is_blocked_immediately() {
        let grid = maze(&["...", "...", ".#."]);
        let mut dodger = Dodger::new(&grid);
        assert_eq!(dodger.calculate(), DodgeStatus::Blocked);
        assert!(dodger.directions().is_empty());
        assert!(dodger.path().is_empty());
        assert_eq!(dodger.render(), "...\n...\n.X.\ndirections: blocked\n");
    }

    #[test]
    fn full_goal_row_is_blocked() {
        let grid = maze(&["#######", ".......", "......."]);
        assert_eq!(plan(&grid), (DodgeStatus::Blocked, vec![]));
    }

    #[test]
    fn single_row_maze_steps_forward() {
        let grid = maze(&["#.."]);
        assert_eq!(plan(&grid), (DodgeStatus::Found, vec![Forward]));
    }

    #[test]
    fn plans_are_deterministic() {
        let grid = maze(&[
            "#..#...", //
            "..#..#.",
            ".#..#..",
            "...#...",
            ".......",
        ]);
        let first = plan(&grid);
        let second = plan(&grid);
        assert_eq!(first, second);
        assert_eq!(first.0, DodgeStatus::Found);
    }

    #[test]
    fn plans_never_enter_occupied_cells() {
        let grid = maze(&[
            ".#.#...", //
            "#..#.#.",
            "..#...#",
            ".#.....",
            ".......",
        ]);
        let mut dodger = Dodger::new(&grid);
        dodger.calculate();
        assert!(dodger.path().iter().all(|cell| !grid.is_occupied(*cell)));
        assert!(dodger.directions().len() <= grid.rows() * grid.cols());
    }

    #[test]
    fn calculate_settles_once() {
        let grid = maze(&["...", "..."]);
        let mut dodger = Dodger::new(&grid);
        assert_eq!(dodger.calculate(), DodgeStatus::Found);
        assert_eq!(dodger.calculate(), DodgeStatus::Found);
        assert_eq!(dodger.directions().to_vec(), vec![Forward]);
    }

    #[test]
    fn render_marks_path_and_start() {
        let grid = maze(&["...", ".#.", "..."]);
        let mut dodger = Dodger::new(&grid);
        dodger.calculate();
        assert_eq!(dodger.render(), "*..\n*#.\n.@.\ndirections: < ^\n");
    }

    struct RightFirst;

    impl MovePolicy for RightFirst {
        fn rank(&self, grid: &OccupancyGrid, at: Cell, start_col: usize) -> Vec<(Direction, Cell)> {
            let mut moves = ForwardFirst.rank(grid, at, start_col);
            moves.sort_by_key(|(direction, _)| *direction != Right);
            moves
        }
    }

    #[test]
    fn policy_is_swappable() {
        let grid = maze(&["...", "...", "..."]);
        let mut dodger = Dodger::with_policy(&grid, RightFirst);
        assert_eq!(dodger.calculate(), DodgeStatus::Found);
        assert_eq!(dodger.directions().to_vec(), vec![Right, Forward]);
    }
}
