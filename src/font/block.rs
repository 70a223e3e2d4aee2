use std::collections::BTreeSet;

use super::{GlyphOutline, GlyphSource};
use crate::geom::{PathCommand, Point2};

const COLS: usize = 5;
const ROWS: usize = 7;

/// Cell size in em units: seven rows span one em.
const CELL: f64 = 1.0 / ROWS as f64;

/// Five columns of ink plus one column of spacing.
const ADVANCE: f64 = (COLS + 1) as f64 * CELL;

type GridPoint = (i32, i32);

/// Built-in 5x7 block font.
///
/// Each glyph is a bitmap whose filled cells are traced into closed contours,
/// so enclosed counters (`A`, `B`, `O`, `8`, ...) come out as real holes.
/// Covers `A`-`Z` (lowercase maps to uppercase), `0`-`9`, space and
/// `. , ! ? - ' : + /`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockFont;

impl BlockFont {
    pub const NAME: &'static str = "block";

    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn supports(ch: char) -> bool {
        glyph_rows(ch.to_ascii_uppercase()).is_some()
    }
}

impl GlyphSource for BlockFont {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn resolve_glyph(&self, ch: char) -> Option<GlyphOutline> {
        let rows = glyph_rows(ch.to_ascii_uppercase())?;
        let mut commands = Vec::new();
        for contour in trace_bitmap(&rows) {
            let mut points = contour
                .into_iter()
                .map(|(x, y)| Point2::new(f64::from(x) * CELL, f64::from(y) * CELL));
            let Some(first) = points.next() else {
                continue;
            };
            commands.push(PathCommand::MoveTo(first));
            commands.extend(points.map(PathCommand::LineTo));
            commands.push(PathCommand::Close);
        }
        Some(GlyphOutline {
            commands,
            advance: ADVANCE,
        })
    }
}

/// Trace the filled cells of a bitmap into closed grid loops.
///
/// Every filled cell contributes its four counter-clockwise edges; an edge
/// whose reverse is already present is shared by two cells and cancels out.
/// The surviving edges are chained into loops (material on the left, so outer
/// boundaries run counter-clockwise and counters clockwise). Where two cells
/// touch only at a corner the walk takes the sharpest left turn, which keeps
/// every loop simple. Collinear runs are collapsed to their end points.
fn trace_bitmap(rows: &[u8; ROWS]) -> Vec<Vec<GridPoint>> {
    let mut edges: BTreeSet<(GridPoint, GridPoint)> = BTreeSet::new();
    for (r, bits) in rows.iter().enumerate() {
        let y = (ROWS - 1 - r) as i32;
        for c in 0..COLS {
            if (bits >> (COLS - 1 - c)) & 1 == 0 {
                continue;
            }
            let x = c as i32;
            let corners = [(x, y), (x + 1, y), (x + 1, y + 1), (x, y + 1)];
            for k in 0..4 {
                let a = corners[k];
                let b = corners[(k + 1) % 4];
                if !edges.remove(&(b, a)) {
                    edges.insert((a, b));
                }
            }
        }
    }

    let mut loops = Vec::new();
    while let Some(&(start, first)) = edges.iter().next() {
        edges.remove(&(start, first));
        let mut points = vec![start];
        let mut prev = start;
        let mut cur = first;

        while cur != start {
            points.push(cur);
            let dir = (cur.0 - prev.0, cur.1 - prev.1);
            let turns = [(-dir.1, dir.0), dir, (dir.1, -dir.0)];
            let Some(next) = turns
                .iter()
                .map(|d| (cur.0 + d.0, cur.1 + d.1))
                .find(|&next| edges.contains(&(cur, next)))
            else {
                log::warn!("block font trace left an open chain at {cur:?}");
                break;
            };
            edges.remove(&(cur, next));
            prev = cur;
            cur = next;
        }

        loops.push(collapse_collinear(points));
    }
    loops
}

fn collapse_collinear(points: Vec<GridPoint>) -> Vec<GridPoint> {
    let n = points.len();
    (0..n)
        .filter(|&i| {
            let a = points[(i + n - 1) % n];
            let b = points[i];
            let c = points[(i + 1) % n];
            (b.0 - a.0) * (c.1 - b.1) - (b.1 - a.1) * (c.0 - b.0) != 0
        })
        .map(|i| points[i])
        .collect()
}

#[rustfmt::skip]
fn glyph_rows(ch: char) -> Option<[u8; ROWS]> {
    let rows = match ch {
        'A' => [0b11111, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10010, 0b10010, 0b11111, 0b10001, 0b10001, 0b11111],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11110, 0b10011, 0b10001, 0b10001, 0b10001, 0b10011, 0b11110],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
        'G' => [0b11111, 0b10000, 0b10000, 0b10111, 0b10001, 0b10001, 0b11111],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'J' => [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001],
        'O' => [0b11111, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11111],
        'P' => [0b11111, 0b10001, 0b10001, 0b11111, 0b10000, 0b10000, 0b10000],
        'Q' => [0b11111, 0b10001, 0b10001, 0b10001, 0b10001, 0b11111, 0b00011],
        'R' => [0b11111, 0b10001, 0b10001, 0b11111, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010],
        'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
        'Y' => [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100],
        'Z' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],
        '0' => [0b11111, 0b10001, 0b10001, 0b10101, 0b10001, 0b10001, 0b11111],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b11111, 0b00001, 0b00001, 0b11111, 0b10000, 0b10000, 0b11111],
        '3' => [0b11111, 0b00001, 0b00001, 0b01111, 0b00001, 0b00001, 0b11111],
        '4' => [0b10010, 0b10010, 0b10010, 0b11111, 0b00010, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b10000, 0b11111, 0b00001, 0b00001, 0b11111],
        '6' => [0b11111, 0b10000, 0b10000, 0b11111, 0b10001, 0b10001, 0b11111],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b11111, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b11111],
        '9' => [0b11111, 0b10001, 0b10001, 0b11111, 0b00001, 0b00001, 0b11111],
        ' ' => [0; ROWS],
        '.' => [0, 0, 0, 0, 0, 0b01100, 0b01100],
        ',' => [0, 0, 0, 0, 0b01100, 0b00100, 0b01000],
        '!' => [0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0, 0b00100],
        '?' => [0b11111, 0b00001, 0b00001, 0b00111, 0b00100, 0, 0b00100],
        '-' => [0, 0, 0, 0b11111, 0, 0, 0],
        '\'' => [0b00100, 0b00100, 0b01000, 0, 0, 0, 0],
        ':' => [0, 0b01100, 0b01100, 0, 0b01100, 0b01100, 0],
        '+' => [0, 0b00100, 0b00100, 0b11111, 0b00100, 0b00100, 0],
        '/' => [0b00001, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b10000],
        _ => return None,
    };
    Some(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Tolerance, flatten_path, group_shapes, signed_area, CURVE_SEGMENTS};

    fn shapes_for(ch: char) -> Vec<crate::geom::Shape> {
        let glyph = BlockFont.resolve_glyph(ch).expect("glyph");
        group_shapes(flatten_path(&glyph.commands, CURVE_SEGMENTS), Tolerance::default_geom())
    }

    #[test]
    fn solid_cell_traces_to_one_square() {
        let mut rows = [0u8; ROWS];
        rows[0] = 0b10000;
        let loops = trace_bitmap(&rows);
        assert_eq!(loops, vec![vec![(0, 6), (1, 6), (1, 7), (0, 7)]]);
    }

    #[test]
    fn counters_become_holes() {
        assert_eq!(shapes_for('O').len(), 1);
        assert_eq!(shapes_for('O')[0].holes.len(), 1);
        assert_eq!(shapes_for('A')[0].holes.len(), 1);
        assert_eq!(shapes_for('B')[0].holes.len(), 2);
        assert_eq!(shapes_for('8')[0].holes.len(), 2);
        assert!(shapes_for('I').iter().all(|s| s.holes.is_empty()));
    }

    #[test]
    fn island_inside_counter_is_its_own_outer() {
        let shapes = shapes_for('0');
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes.iter().map(|s| s.holes.len()).sum::<usize>(), 1);
    }

    #[test]
    fn outline_area_matches_filled_cells() {
        for ch in ['A', 'K', 'M', 'W', 'Z', '4'] {
            let rows = glyph_rows(ch).unwrap();
            let cells: u32 = rows.iter().map(|r| r.count_ones()).sum();
            let area: f64 = shapes_for(ch)
                .iter()
                .map(|s| signed_area(&s.outer) + s.holes.iter().map(|h| signed_area(h)).sum::<f64>())
                .sum();
            let expected = f64::from(cells) * CELL * CELL;
            assert!((area - expected).abs() <= 1e-9, "{ch}: {area} vs {expected}");
        }
    }

    #[test]
    fn space_is_blank_with_advance_and_lowercase_maps_up() {
        let space = BlockFont.resolve_glyph(' ').unwrap();
        assert!(space.is_blank());
        assert!((space.advance - 6.0 / 7.0).abs() <= 1e-12);
        assert_eq!(BlockFont.resolve_glyph('a'), BlockFont.resolve_glyph('A'));
        assert!(BlockFont.resolve_glyph('é').is_none());
        assert!(BlockFont::supports('z'));
    }
}
