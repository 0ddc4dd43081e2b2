use crate::dodge::Direction;
use crate::maze::{Cell, OccupancyGrid};

/// Ranks the moves the dodger may take from a cell, best first.
///
/// Implementations only decide preference; the dodger still refuses occupied,
/// visited or backward cells whatever a policy returns.
pub trait MovePolicy {
    fn rank(&self, grid: &OccupancyGrid, at: Cell, start_col: usize) -> Vec<(Direction, Cell)>;
}

/// Straight ahead first, then the diagonal that ends closer to the starting
/// column; left wins when both end equally far.
#[derive(Debug, Default, Copy, Clone)]
pub struct ForwardFirst;

impl MovePolicy for ForwardFirst {
    fn rank(&self, grid: &OccupancyGrid, at: Cell, start_col: usize) -> Vec<(Direction, Cell)> {
        let Some(row) = at.row.checked_sub(1) else {
            return Vec::new();
        };

        let free = |cell: &Cell| grid.contains(*cell) && !grid.is_occupied(*cell);

        let mut moves: Vec<_> = Some((Direction::Forward, Cell::new(row, at.col)))
            .into_iter()
            .filter(|(_, cell)| free(cell))
            .collect();

        let mut laterals: Vec<_> = [
            at.col
                .checked_sub(1)
                .map(|col| (Direction::Left, Cell::new(row, col))),
            Some((Direction::Right, Cell::new(row, at.col + 1))),
        ]
        .into_iter()
        .flatten()
        .filter(|(_, cell)| free(cell))
        .collect();
        // stable, so Left stays ahead of Right on equal displacement
        laterals.sort_by_key(|(_, cell)| cell.col.abs_diff(start_col));

        moves.extend(laterals);
        moves
    }
}
