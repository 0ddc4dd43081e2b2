use crate::maze::{Cell, OccupancyGrid};

/// Text picture of the maze, farthest row first: `#` occupied, `.` free,
/// `*` planned path and `@` the user's cell, or `X` when something stands on it.
pub fn render_maze(grid: &OccupancyGrid, path: &[Cell], start: Cell) -> String {
    let mut out = String::with_capacity((grid.cols() + 1) * grid.rows());

    for row in 0..grid.rows() {
        for col in 0..grid.cols() {
            let cell = Cell::new(row, col);
            let mark = if cell == start && grid.is_occupied(cell) {
                'X'
            } else if cell == start {
                '@'
            } else if grid.is_occupied(cell) {
                '#'
            } else if path.contains(&cell) {
                '*'
            } else {
                '.'
            };
            out.push(mark);
        }
        out.push('\n');
    }

    out
}
