//! Glyph outlines: path commands, curve flattening and outer/hole grouping.

use serde::{Deserialize, Serialize};

use super::triangulation::{point_in_loop, signed_area};
use super::{Point2, Tolerance};

/// Segments used to flatten every quadratic or cubic curve, regardless of
/// glyph size.
pub const CURVE_SEGMENTS: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathCommand {
    MoveTo(Point2),
    LineTo(Point2),
    QuadTo(Point2, Point2),
    CubicTo(Point2, Point2, Point2),
    Close,
}

/// One outer loop (counter-clockwise) with the holes directly inside it
/// (clockwise).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Shape {
    pub outer: Vec<Point2>,
    pub holes: Vec<Vec<Point2>>,
}

impl Shape {
    #[must_use]
    pub fn loop_count(&self) -> usize {
        1 + self.holes.len()
    }

    pub fn loops(&self) -> impl Iterator<Item = &[Point2]> {
        std::iter::once(self.outer.as_slice()).chain(self.holes.iter().map(Vec::as_slice))
    }
}

/// Flatten a command list into closed polylines (closing point not repeated).
///
/// Each `MoveTo` starts a new loop; an unterminated loop is closed implicitly.
#[must_use]
pub fn flatten_path(commands: &[PathCommand], segments: usize) -> Vec<Vec<Point2>> {
    let segments = segments.max(1);
    let mut loops = Vec::new();
    let mut current: Vec<Point2> = Vec::new();

    let mut finish = |current: &mut Vec<Point2>| {
        if current.len() > 1 && current.first() == current.last() {
            current.pop();
        }
        if !current.is_empty() {
            loops.push(std::mem::take(current));
        }
    };

    for cmd in commands {
        match *cmd {
            PathCommand::MoveTo(p) => {
                finish(&mut current);
                current.push(p);
            }
            PathCommand::LineTo(p) => current.push(p),
            PathCommand::QuadTo(c, p) => {
                let Some(&p0) = current.last() else {
                    current.push(p);
                    continue;
                };
                for i in 1..=segments {
                    let t = i as f64 / segments as f64;
                    current.push(quad_point(p0, c, p, t));
                }
            }
            PathCommand::CubicTo(c0, c1, p) => {
                let Some(&p0) = current.last() else {
                    current.push(p);
                    continue;
                };
                for i in 1..=segments {
                    let t = i as f64 / segments as f64;
                    current.push(cubic_point(p0, c0, c1, p, t));
                }
            }
            PathCommand::Close => finish(&mut current),
        }
    }
    finish(&mut current);

    loops
}

fn quad_point(p0: Point2, c: Point2, p1: Point2, t: f64) -> Point2 {
    let mt = 1.0 - t;
    Point2::new(
        mt * mt * p0.x + 2.0 * mt * t * c.x + t * t * p1.x,
        mt * mt * p0.y + 2.0 * mt * t * c.y + t * t * p1.y,
    )
}

fn cubic_point(p0: Point2, c0: Point2, c1: Point2, p1: Point2, t: f64) -> Point2 {
    let mt = 1.0 - t;
    let a = mt * mt * mt;
    let b = 3.0 * mt * mt * t;
    let c = 3.0 * mt * t * t;
    let d = t * t * t;
    Point2::new(
        a * p0.x + b * c0.x + c * c1.x + d * p1.x,
        a * p0.y + b * c0.y + c * c1.y + d * p1.y,
    )
}

/// Drop consecutive duplicate points, including across the wrap-around.
#[must_use]
pub fn clean_loop(points: &[Point2], tol: Tolerance) -> Vec<Point2> {
    let eps2 = tol.eps_squared();
    let mut out: Vec<Point2> = Vec::with_capacity(points.len());
    for &p in points {
        if !p.is_finite() {
            continue;
        }
        if out.last().is_none_or(|&last| last.distance_squared(p) > eps2) {
            out.push(p);
        }
    }
    while out.len() > 1 && out[0].distance_squared(out[out.len() - 1]) <= eps2 {
        out.pop();
    }
    out
}

/// Group closed loops into shapes by nesting-depth parity.
///
/// Even depth loops become outers (normalized counter-clockwise), odd depth
/// loops become holes (clockwise) of the smallest loop one level up. Loops
/// with fewer than three points or no area are discarded.
#[must_use]
pub fn group_shapes(loops: Vec<Vec<Point2>>, tol: Tolerance) -> Vec<Shape> {
    let min_area = tol.eps_squared();
    let loops: Vec<Vec<Point2>> = loops
        .into_iter()
        .map(|l| clean_loop(&l, tol))
        .filter(|l| l.len() >= 3 && signed_area(l).abs() > min_area)
        .collect();

    let areas: Vec<f64> = loops.iter().map(|l| signed_area(l).abs()).collect();
    let samples: Vec<Point2> = loops.iter().map(|l| l[0].lerp(l[1], 0.5)).collect();

    let containers: Vec<Vec<usize>> = (0..loops.len())
        .map(|i| {
            (0..loops.len())
                .filter(|&j| j != i && areas[j] > areas[i] && point_in_loop(samples[i], &loops[j]))
                .collect()
        })
        .collect();
    let depth: Vec<usize> = containers.iter().map(Vec::len).collect();

    let mut shapes: Vec<Shape> = Vec::new();
    let mut shape_of_loop: Vec<Option<usize>> = vec![None; loops.len()];

    for (i, l) in loops.iter().enumerate() {
        if depth[i] % 2 == 0 {
            shape_of_loop[i] = Some(shapes.len());
            shapes.push(Shape {
                outer: oriented(l, true),
                holes: Vec::new(),
            });
        }
    }

    for (i, l) in loops.iter().enumerate() {
        if depth[i] % 2 == 0 {
            continue;
        }
        let parent = containers[i]
            .iter()
            .copied()
            .filter(|&j| depth[j] + 1 == depth[i])
            .min_by(|&a, &b| areas[a].total_cmp(&areas[b]))
            .and_then(|j| shape_of_loop[j]);
        match parent {
            Some(shape) => shapes[shape].holes.push(oriented(l, false)),
            None => {
                log::warn!("orphan hole loop with {} points treated as an outer loop", l.len());
                shapes.push(Shape {
                    outer: oriented(l, true),
                    holes: Vec::new(),
                });
            }
        }
    }

    shapes
}

fn oriented(points: &[Point2], ccw: bool) -> Vec<Point2> {
    let mut out = points.to_vec();
    if (signed_area(&out) > 0.0) != ccw {
        out.reverse();
    }
    out
}
