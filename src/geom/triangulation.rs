//! Ear-clipping triangulation of planar polygons with holes.
//!
//! Holes are spliced into the outer loop through a bridge edge found by
//! scanning left from each hole's leftmost vertex, then the single resulting
//! ring is clipped ear by ear. Output triangles are counter-clockwise in the
//! XY plane and index the concatenation `outer ++ holes[0] ++ holes[1] ...`.

use super::{Point2, Tolerance};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TriangulationError {
    #[error("polygon vertices must be finite")]
    NonFinite,
    #[error("outer loop must have at least 3 points, got {0}")]
    TooFewPoints(usize),
    #[error("polygon degenerates after filtering duplicate and collinear points")]
    Degenerate,
    #[error("failed to find a bridge from hole {0} to the outer loop")]
    NoBridge(usize),
    #[error("failed to triangulate polygon (no ears found)")]
    NoEars,
}

#[derive(Debug, Clone, Copy)]
struct Node {
    idx: u32,
    point: Point2,
    prev: usize,
    next: usize,
}

/// Signed area of a closed loop (positive for counter-clockwise).
#[must_use]
pub fn signed_area(points: &[Point2]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        area += a.x * b.y - b.x * a.y;
    }
    0.5 * area
}

/// Even-odd point-in-polygon test against a closed loop.
#[must_use]
pub fn point_in_loop(p: Point2, points: &[Point2]) -> bool {
    let mut inside = false;
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let a = points[i];
        let b = points[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Triangulates `outer` minus `holes`.
///
/// Loops may arrive in either orientation; the outer loop is walked
/// counter-clockwise and holes clockwise internally. Degenerate slivers are
/// dropped from the output.
pub fn triangulate_polygon(
    outer: &[Point2],
    holes: &[Vec<Point2>],
    tol: Tolerance,
) -> Result<Vec<[u32; 3]>, TriangulationError> {
    if outer.len() < 3 {
        return Err(TriangulationError::TooFewPoints(outer.len()));
    }

    let mut vertices: Vec<Point2> = Vec::with_capacity(outer.len());
    vertices.extend_from_slice(outer);
    for hole in holes {
        vertices.extend_from_slice(hole);
    }
    if vertices.iter().any(|p| !p.is_finite()) {
        return Err(TriangulationError::NonFinite);
    }

    let mut nodes: Vec<Node> = Vec::with_capacity(vertices.len() + holes.len() * 2);

    let outer_ccw = signed_area(outer) > 0.0;
    let outer_start = build_ring_nodes(&mut nodes, 0, outer.len(), &vertices, !outer_ccw);
    let mut outer_start =
        filter_ring_points(outer_start, &mut nodes, tol).ok_or(TriangulationError::Degenerate)?;

    let mut hole_lefts = Vec::with_capacity(holes.len());
    let mut cursor = outer.len();
    for (hole_idx, hole) in holes.iter().enumerate() {
        let len = hole.len();
        if len >= 3 {
            let hole_ccw = signed_area(hole) > 0.0;
            let start = build_ring_nodes(&mut nodes, cursor, len, &vertices, hole_ccw);
            if let Some(filtered) = filter_ring_points(start, &mut nodes, tol) {
                hole_lefts.push((hole_idx, leftmost_node(filtered, &nodes)));
            }
        }
        cursor += len;
    }

    hole_lefts.sort_by(|&(_, a), &(_, b)| {
        let pa = nodes[a].point;
        let pb = nodes[b].point;
        pa.x.total_cmp(&pb.x).then_with(|| pa.y.total_cmp(&pb.y))
    });

    for (hole_idx, hole_left) in hole_lefts {
        let bridge = find_hole_bridge(hole_left, outer_start, &nodes)
            .ok_or(TriangulationError::NoBridge(hole_idx))?;
        let bridge_reverse = split_polygon(bridge, hole_left, &mut nodes);
        filter_points(bridge_reverse, &mut nodes, tol);
        outer_start = filter_points(bridge, &mut nodes, tol);
    }
    if ring_len(outer_start, &nodes) < 3 {
        return Err(TriangulationError::Degenerate);
    }

    let mut triangles = Vec::with_capacity(nodes.len().saturating_sub(2));
    earclip_linked(outer_start, &mut nodes, &mut triangles, tol, ClipPass::Plain)?;

    let min_area2 = tol.eps_squared();
    Ok(triangles
        .into_iter()
        .filter(|&[i0, i1, i2]| {
            if i0 == i1 || i1 == i2 || i0 == i2 {
                return false;
            }
            let area2 = orient2d(
                vertices[i0 as usize],
                vertices[i1 as usize],
                vertices[i2 as usize],
            );
            area2.is_finite() && area2 > min_area2
        })
        .collect())
}

fn build_ring_nodes(
    nodes: &mut Vec<Node>,
    first_vertex: usize,
    len: usize,
    vertices: &[Point2],
    reverse: bool,
) -> usize {
    let start_idx = nodes.len();
    for i in 0..len {
        let offset = if reverse { len - 1 - i } else { i };
        let idx = first_vertex + offset;
        nodes.push(Node {
            idx: idx as u32,
            point: vertices[idx],
            prev: 0,
            next: 0,
        });
    }

    for i in 0..len {
        let current = start_idx + i;
        nodes[current].prev = start_idx + ((i + len - 1) % len);
        nodes[current].next = start_idx + ((i + 1) % len);
    }

    start_idx
}

fn ring_len(start: usize, nodes: &[Node]) -> usize {
    let mut count = 0usize;
    let mut cur = start;
    loop {
        count += 1;
        cur = nodes[cur].next;
        if cur == start || count > nodes.len() {
            break;
        }
    }
    count
}

fn filter_ring_points(start: usize, nodes: &mut [Node], tol: Tolerance) -> Option<usize> {
    let start = filter_points(start, nodes, tol);
    (ring_len(start, nodes) >= 3).then_some(start)
}

/// Unlinks duplicate and collinear points (spikes included) and returns a
/// node that is still on the ring.
fn filter_points(start: usize, nodes: &mut [Node], tol: Tolerance) -> usize {
    let mut end = start;
    let mut p = start;
    loop {
        let prev = nodes[p].prev;
        let next = nodes[p].next;
        if prev == p || next == p {
            return p;
        }

        let (a, b, c) = (nodes[prev].point, nodes[p].point, nodes[next].point);
        if approx_eq(b, c, tol) || is_collinear(a, b, c, tol) {
            remove_node(p, nodes);
            p = prev;
            end = prev;
            if nodes[p].next == p {
                return p;
            }
            continue;
        }

        p = next;
        if p == end {
            return end;
        }
    }
}

fn leftmost_node(start: usize, nodes: &[Node]) -> usize {
    let mut left = start;
    let mut cur = nodes[start].next;
    while cur != start {
        let a = nodes[cur].point;
        let b = nodes[left].point;
        if a.x < b.x || (a.x == b.x && a.y < b.y) {
            left = cur;
        }
        cur = nodes[cur].next;
    }
    left
}

/// Picks the outer vertex a hole is spliced to.
///
/// A ray cast left from the hole's leftmost vertex finds the nearest outer
/// edge; its left endpoint is the first candidate. Any ring vertex inside the
/// triangle spanned by the hole point, the hit and that endpoint would block
/// the bridge, so the one with the smallest angle to the ray wins instead.
/// Ties on collinear edges go to the vertex whose sector actually faces the
/// hole.
fn find_hole_bridge(hole: usize, outer_start: usize, nodes: &[Node]) -> Option<usize> {
    let h = nodes[hole].point;
    let mut qx = f64::NEG_INFINITY;
    let mut found = None;

    let mut p = outer_start;
    loop {
        let n = nodes[p].next;
        let (a, b) = (nodes[p].point, nodes[n].point);
        if h.y <= a.y && h.y >= b.y && b.y != a.y {
            let x = a.x + (h.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if x <= h.x && x > qx {
                qx = x;
                let left = if a.x < b.x { p } else { n };
                if x == h.x {
                    // The hole touches this edge.
                    return Some(left);
                }
                found = Some(left);
            }
        }
        p = n;
        if p == outer_start {
            break;
        }
    }

    let mut m = found?;
    let stop = m;
    let anchor = nodes[m].point;
    let hit = Point2::new(qx, h.y);
    let (t0, t2) = if h.y < anchor.y { (h, hit) } else { (hit, h) };
    let mut tan_min = f64::INFINITY;

    let mut p = m;
    loop {
        let pt = nodes[p].point;
        if h.x >= pt.x && pt.x >= anchor.x && h.x != pt.x && point_in_triangle(t0, anchor, t2, pt) {
            let tan = (h.y - pt.y).abs() / (h.x - pt.x);
            let best = nodes[m].point;
            let better = tan < tan_min
                || (tan == tan_min
                    && (pt.x > best.x || (pt.x == best.x && sector_contains_sector(m, p, nodes))));
            if better && locally_inside(p, hole, nodes) {
                m = p;
                tan_min = tan;
            }
        }
        p = nodes[p].next;
        if p == stop {
            break;
        }
    }

    Some(m)
}

/// Links `a` to `b` with a zero-width channel, duplicating both endpoints so
/// each side stays a closed walk. Returns the copy of `b`.
fn split_polygon(a: usize, b: usize, nodes: &mut Vec<Node>) -> usize {
    let a_next = nodes[a].next;
    let b_prev = nodes[b].prev;

    let a2 = nodes.len();
    nodes.push(Node { prev: 0, next: 0, ..nodes[a] });
    let b2 = nodes.len();
    nodes.push(Node { prev: 0, next: 0, ..nodes[b] });

    nodes[a].next = b;
    nodes[b].prev = a;

    nodes[a2].next = a_next;
    nodes[a_next].prev = a2;

    nodes[b2].next = a2;
    nodes[a2].prev = b2;

    nodes[b_prev].next = b2;
    nodes[b2].prev = b_prev;

    b2
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClipPass {
    Plain,
    Filtered,
    Cured,
}

/// Clips ears off a counter-clockwise ring. When a full lap finds none, the
/// ring is filtered and retried, then self-touching corners are cut, and
/// finally the ring is split along a valid diagonal.
fn earclip_linked(
    start: usize,
    nodes: &mut Vec<Node>,
    triangles: &mut Vec<[u32; 3]>,
    tol: Tolerance,
    pass: ClipPass,
) -> Result<(), TriangulationError> {
    let mut ear = start;
    let mut stop = start;

    while nodes[ear].prev != nodes[ear].next {
        let prev = nodes[ear].prev;
        let next = nodes[ear].next;
        if is_ear(prev, ear, next, nodes) {
            triangles.push([nodes[prev].idx, nodes[ear].idx, nodes[next].idx]);
            remove_node(ear, nodes);
            ear = nodes[next].next;
            stop = ear;
            continue;
        }

        ear = next;
        if ear == stop {
            return match pass {
                ClipPass::Plain => {
                    let ring = filter_points(ear, nodes, tol);
                    earclip_linked(ring, nodes, triangles, tol, ClipPass::Filtered)
                }
                ClipPass::Filtered => {
                    let ring = filter_points(ear, nodes, tol);
                    let ring = cure_local_intersections(ring, nodes, triangles, tol);
                    earclip_linked(ring, nodes, triangles, tol, ClipPass::Cured)
                }
                ClipPass::Cured => split_earclip(ear, nodes, triangles, tol),
            };
        }
    }

    Ok(())
}

/// The ring is counter-clockwise here, so an ear is a convex corner with no
/// reflex or flat vertex inside its triangle.
fn is_ear(prev: usize, ear: usize, next: usize, nodes: &[Node]) -> bool {
    let a = nodes[prev].point;
    let b = nodes[ear].point;
    let c = nodes[next].point;

    if orient2d(a, b, c) <= 0.0 {
        return false;
    }

    let mut p = nodes[next].next;
    while p != prev {
        let pt = nodes[p].point;
        if pt != a
            && point_in_triangle(a, b, c, pt)
            && orient2d(nodes[nodes[p].prev].point, pt, nodes[nodes[p].next].point) <= 0.0
        {
            return false;
        }
        p = nodes[p].next;
    }

    true
}

/// Cuts `a, p, p.next, b` where the edges `a-p` and `p.next-b` cross.
fn cure_local_intersections(
    start: usize,
    nodes: &mut [Node],
    triangles: &mut Vec<[u32; 3]>,
    tol: Tolerance,
) -> usize {
    let mut start = start;
    let mut p = start;
    loop {
        let a = nodes[p].prev;
        let p_next = nodes[p].next;
        let b = nodes[p_next].next;
        let (pa, pb) = (nodes[a].point, nodes[b].point);

        if !approx_eq(pa, pb, tol)
            && intersects(pa, nodes[p].point, nodes[p_next].point, pb)
            && locally_inside(a, b, nodes)
            && locally_inside(b, a, nodes)
        {
            triangles.push([nodes[a].idx, nodes[p].idx, nodes[b].idx]);
            remove_node(p, nodes);
            remove_node(p_next, nodes);
            start = b;
            p = b;
        }

        p = nodes[p].next;
        if p == start {
            break;
        }
    }
    filter_points(p, nodes, tol)
}

/// Last resort: split the ring along the first valid diagonal and clip both
/// halves independently.
fn split_earclip(
    start: usize,
    nodes: &mut Vec<Node>,
    triangles: &mut Vec<[u32; 3]>,
    tol: Tolerance,
) -> Result<(), TriangulationError> {
    let mut a = start;
    loop {
        let mut b = nodes[nodes[a].next].next;
        while b != nodes[a].prev {
            if nodes[a].idx != nodes[b].idx && is_valid_diagonal(a, b, nodes) {
                let c = split_polygon(a, b, nodes);
                let a = filter_points(a, nodes, tol);
                let c = filter_points(c, nodes, tol);
                earclip_linked(a, nodes, triangles, tol, ClipPass::Plain)?;
                return earclip_linked(c, nodes, triangles, tol, ClipPass::Plain);
            }
            b = nodes[b].next;
        }
        a = nodes[a].next;
        if a == start {
            return Err(TriangulationError::NoEars);
        }
    }
}

fn is_valid_diagonal(a: usize, b: usize, nodes: &[Node]) -> bool {
    let (na, nb) = (nodes[a], nodes[b]);
    if nodes[na.next].idx == nb.idx || nodes[na.prev].idx == nb.idx || intersects_polygon(a, b, nodes) {
        return false;
    }

    let (a_prev, a_next) = (nodes[na.prev].point, nodes[na.next].point);
    let (b_prev, b_next) = (nodes[nb.prev].point, nodes[nb.next].point);

    let open = locally_inside(a, b, nodes)
        && locally_inside(b, a, nodes)
        && middle_inside(a, b, nodes)
        && (orient2d(a_prev, na.point, b_prev) != 0.0 || orient2d(na.point, b_prev, nb.point) != 0.0);
    // Two copies of one point, both reflex: the ring pinches there.
    let pinched = na.point == nb.point
        && orient2d(a_prev, na.point, a_next) < 0.0
        && orient2d(b_prev, nb.point, b_next) < 0.0;

    open || pinched
}

fn intersects_polygon(a: usize, b: usize, nodes: &[Node]) -> bool {
    let (ia, ib) = (nodes[a].idx, nodes[b].idx);
    let mut p = a;
    loop {
        let n = nodes[p].next;
        let touches = [nodes[p].idx, nodes[n].idx].iter().any(|&i| i == ia || i == ib);
        if !touches && intersects(nodes[p].point, nodes[n].point, nodes[a].point, nodes[b].point) {
            return true;
        }
        p = n;
        if p == a {
            return false;
        }
    }
}

/// Whether the diagonal from `a` towards `b` leaves `a` into the interior.
fn locally_inside(a: usize, b: usize, nodes: &[Node]) -> bool {
    let (prev, pa, next) = (nodes[nodes[a].prev].point, nodes[a].point, nodes[nodes[a].next].point);
    let pb = nodes[b].point;
    if orient2d(prev, pa, next) > 0.0 {
        orient2d(pa, pb, next) <= 0.0 && orient2d(pa, prev, pb) <= 0.0
    } else {
        orient2d(pa, pb, prev) > 0.0 || orient2d(pa, next, pb) > 0.0
    }
}

/// Even-odd test of the diagonal's midpoint against the ring.
fn middle_inside(a: usize, b: usize, nodes: &[Node]) -> bool {
    let (pa, pb) = (nodes[a].point, nodes[b].point);
    let (px, py) = ((pa.x + pb.x) / 2.0, (pa.y + pb.y) / 2.0);
    let mut inside = false;
    let mut p = a;
    loop {
        let n = nodes[p].next;
        let (s, e) = (nodes[p].point, nodes[n].point);
        if (s.y > py) != (e.y > py) && e.y != s.y && px < (e.x - s.x) * (py - s.y) / (e.y - s.y) + s.x {
            inside = !inside;
        }
        p = n;
        if p == a {
            return inside;
        }
    }
}

/// Whether the corner at `p` sits inside the corner at `m`.
fn sector_contains_sector(m: usize, p: usize, nodes: &[Node]) -> bool {
    let (nm, np) = (nodes[m], nodes[p]);
    orient2d(nodes[nm.prev].point, nm.point, nodes[np.prev].point) > 0.0
        && orient2d(nodes[np.next].point, nm.point, nodes[nm.next].point) > 0.0
}

fn remove_node(node: usize, nodes: &mut [Node]) {
    let prev = nodes[node].prev;
    let next = nodes[node].next;
    nodes[prev].next = next;
    nodes[next].prev = prev;
}

fn approx_eq(a: Point2, b: Point2, tol: Tolerance) -> bool {
    (a.x - b.x).abs() <= tol.eps && (a.y - b.y).abs() <= tol.eps
}

fn orient2d(a: Point2, b: Point2, c: Point2) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// `b` lies within `tol` of the line through `a` and `c`; a spike where
/// `a == c` counts as collinear.
fn is_collinear(a: Point2, b: Point2, c: Point2, tol: Tolerance) -> bool {
    let span = a.distance_squared(c).sqrt().max(tol.eps);
    orient2d(a, b, c).abs() <= tol.eps * span
}

/// Inclusive test for a counter-clockwise triangle.
fn point_in_triangle(a: Point2, b: Point2, c: Point2, p: Point2) -> bool {
    (c.x - p.x) * (a.y - p.y) >= (a.x - p.x) * (c.y - p.y)
        && (a.x - p.x) * (b.y - p.y) >= (b.x - p.x) * (a.y - p.y)
        && (b.x - p.x) * (c.y - p.y) >= (c.x - p.x) * (b.y - p.y)
}

fn sign(v: f64) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

/// Closed-segment intersection, touching and collinear overlap included.
fn intersects(p1: Point2, q1: Point2, p2: Point2, q2: Point2) -> bool {
    let o1 = sign(orient2d(p1, q1, p2));
    let o2 = sign(orient2d(p1, q1, q2));
    let o3 = sign(orient2d(p2, q2, p1));
    let o4 = sign(orient2d(p2, q2, q1));

    if o1 != o2 && o3 != o4 {
        return true;
    }
    (o1 == 0 && on_segment(p1, p2, q1))
        || (o2 == 0 && on_segment(p1, q2, q1))
        || (o3 == 0 && on_segment(p2, p1, q2))
        || (o4 == 0 && on_segment(p2, q1, q2))
}

/// `q` within the bounding box of `p..r`; callers have already checked
/// collinearity.
fn on_segment(p: Point2, q: Point2, r: Point2) -> bool {
    q.x <= p.x.max(r.x) && q.x >= p.x.min(r.x) && q.y <= p.y.max(r.y) && q.y >= p.y.min(r.y)
}
