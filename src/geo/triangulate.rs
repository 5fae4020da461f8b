//! Polygon triangulation in longitude/latitude space.
//!
//! Ear clipping over a circular doubly linked list of ring vertices. Holes
//! are merged into the outer ring through bridge edges before clipping, so a
//! polygon with holes is triangulated as a single (weakly simple) ring.
//!
//! Country boundaries come from external data and are not validated, so
//! nothing in here panics on bad input: degenerate rings produce no
//! triangles and holes that cannot be connected to their outer ring are
//! dropped.

use geo_types::Coord;

/// Triangulates a polygon given as an outer ring plus hole rings.
///
/// Returned indices refer to the concatenation of `outer` followed by each
/// hole in order, which lets callers project every referenced point
/// individually. Rings may be given in either winding and may repeat their
/// first point at the end. Output triangles are counter-clockwise in
/// (x = longitude, y = latitude) space.
pub fn triangulate(outer: &[Coord<f64>], holes: &[Vec<Coord<f64>>]) -> Vec<[u32; 3]> {
    let total = outer.len() + holes.iter().map(Vec::len).sum::<usize>();
    let mut earcut = Earcut::with_capacity(total);

    let Some(mut outer_node) = earcut.linked_list(outer, 0, true) else {
        return Vec::new();
    };
    if earcut.next(outer_node) == earcut.prev(outer_node) {
        // Fewer than three usable points
        return Vec::new();
    }

    if !holes.is_empty() {
        outer_node = earcut.eliminate_holes(holes, outer.len(), outer_node);
    }

    earcut.earcut_linked(outer_node, Pass::Initial);
    earcut.triangles
}

/// Iterates all ring points in the index order used by [`triangulate`].
pub fn flatten_rings<'a>(
    outer: &'a [Coord<f64>],
    holes: &'a [Vec<Coord<f64>>],
) -> impl Iterator<Item = Coord<f64>> + 'a {
    outer
        .iter()
        .chain(holes.iter().flat_map(|hole| hole.iter()))
        .copied()
}

/// Signed area of a ring (shoelace). Positive for counter-clockwise rings.
pub fn signed_area(ring: &[Coord<f64>]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        sum += ring[j].x * ring[i].y - ring[i].x * ring[j].y;
        j = i;
    }
    sum / 2.0
}

/// Unsigned area of a triangle.
pub fn triangle_area(a: Coord<f64>, b: Coord<f64>, c: Coord<f64>) -> f64 {
    ((b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)).abs() / 2.0
}

/// Even-odd point in ring test.
pub fn ring_contains(ring: &[Coord<f64>], point: Coord<f64>) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > point.y) != (b.y > point.y)
            && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Fallback stage of the clipping loop when no ear can be found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    /// Plain ear clipping.
    Initial,
    /// Retry after removing duplicate and collinear points.
    Filtered,
    /// Retry after curing small self-intersections.
    Cured,
}

#[derive(Debug, Clone, Copy)]
struct Node {
    /// Index of the point in the flattened input.
    i: u32,
    x: f64,
    y: f64,
    prev: usize,
    next: usize,
}

/// Node arena plus output buffer. Removed nodes stay in the arena, unlinked.
struct Earcut {
    nodes: Vec<Node>,
    triangles: Vec<[u32; 3]>,
}

impl Earcut {
    fn with_capacity(points: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(points + points / 4),
            triangles: Vec::with_capacity(points.saturating_sub(2)),
        }
    }

    #[inline]
    fn next(&self, n: usize) -> usize {
        self.nodes[n].next
    }

    #[inline]
    fn prev(&self, n: usize) -> usize {
        self.nodes[n].prev
    }

    /// Builds a ring from input points, oriented counter-clockwise when
    /// `counter_clockwise` is set and clockwise otherwise.
    fn linked_list(
        &mut self,
        ring: &[Coord<f64>],
        offset: usize,
        counter_clockwise: bool,
    ) -> Option<usize> {
        let points: Vec<(u32, Coord<f64>)> = ring
            .iter()
            .enumerate()
            .filter(|(_, c)| c.x.is_finite() && c.y.is_finite())
            .map(|(k, c)| ((offset + k) as u32, *c))
            .collect();

        let coords: Vec<Coord<f64>> = points.iter().map(|(_, c)| *c).collect();
        let forward = counter_clockwise == (signed_area(&coords) > 0.0);

        let mut last = None;
        if forward {
            for (i, c) in &points {
                last = Some(self.insert_node(*i, *c, last));
            }
        } else {
            for (i, c) in points.iter().rev() {
                last = Some(self.insert_node(*i, *c, last));
            }
        }

        let last = last?;
        let next = self.next(last);
        if last != next && self.equals(last, next) {
            // Closing point repeats the first one
            self.remove_node(last);
            return Some(next);
        }
        Some(last)
    }

    fn push_node(&mut self, i: u32, c: Coord<f64>) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node {
            i,
            x: c.x,
            y: c.y,
            prev: id,
            next: id,
        });
        id
    }

    fn insert_node(&mut self, i: u32, c: Coord<f64>, last: Option<usize>) -> usize {
        let id = self.push_node(i, c);
        if let Some(last) = last {
            let next = self.next(last);
            self.nodes[id].prev = last;
            self.nodes[id].next = next;
            self.nodes[next].prev = id;
            self.nodes[last].next = id;
        }
        id
    }

    fn remove_node(&mut self, p: usize) {
        let Node { prev, next, .. } = self.nodes[p];
        self.nodes[next].prev = prev;
        self.nodes[prev].next = next;
    }

    #[inline]
    fn equals(&self, a: usize, b: usize) -> bool {
        self.nodes[a].x == self.nodes[b].x && self.nodes[a].y == self.nodes[b].y
    }

    /// Twice the signed area of triangle (p, q, r), negated: negative means
    /// the corner at `q` turns counter-clockwise.
    #[inline]
    fn area(&self, p: usize, q: usize, r: usize) -> f64 {
        let (p, q, r) = (&self.nodes[p], &self.nodes[q], &self.nodes[r]);
        (q.y - p.y) * (r.x - q.x) - (q.x - p.x) * (r.y - q.y)
    }

    /// Removes duplicate and collinear points between `start` and `end`.
    fn filter_points(&mut self, start: usize, end: Option<usize>) -> usize {
        let mut end = end.unwrap_or(start);
        let mut p = start;
        loop {
            let node = self.nodes[p];
            let mut again = false;

            if self.equals(p, node.next) || self.area(node.prev, p, node.next) == 0.0 {
                self.remove_node(p);
                p = node.prev;
                end = node.prev;
                if p == self.next(p) {
                    break;
                }
                again = true;
            } else {
                p = node.next;
            }

            if !again && p == end {
                break;
            }
        }
        end
    }

    fn earcut_linked(&mut self, start: usize, pass: Pass) {
        let mut ear = start;
        let mut stop = ear;

        while self.prev(ear) != self.next(ear) {
            let prev = self.prev(ear);
            let next = self.next(ear);

            if self.is_ear(ear) {
                self.triangles
                    .push([self.nodes[prev].i, self.nodes[ear].i, self.nodes[next].i]);
                self.remove_node(ear);
                ear = self.next(next);
                stop = ear;
                continue;
            }

            ear = next;

            if ear == stop {
                match pass {
                    Pass::Initial => {
                        let filtered = self.filter_points(ear, None);
                        self.earcut_linked(filtered, Pass::Filtered);
                    }
                    Pass::Filtered => {
                        let filtered = self.filter_points(ear, None);
                        let cured = self.cure_local_intersections(filtered);
                        self.earcut_linked(cured, Pass::Cured);
                    }
                    Pass::Cured => self.split_earcut(ear),
                }
                break;
            }
        }
    }

    fn is_ear(&self, ear: usize) -> bool {
        let a = self.prev(ear);
        let c = self.next(ear);

        if self.area(a, ear, c) >= 0.0 {
            // Reflex corner
            return false;
        }

        let (na, nb, nc) = (&self.nodes[a], &self.nodes[ear], &self.nodes[c]);
        let x0 = na.x.min(nb.x).min(nc.x);
        let y0 = na.y.min(nb.y).min(nc.y);
        let x1 = na.x.max(nb.x).max(nc.x);
        let y1 = na.y.max(nb.y).max(nc.y);

        let mut p = nc.next;
        while p != a {
            let n = &self.nodes[p];
            if n.x >= x0
                && n.x <= x1
                && n.y >= y0
                && n.y <= y1
                && point_in_triangle_except_first(na, nb, nc, n.x, n.y)
                && self.area(n.prev, p, n.next) >= 0.0
            {
                return false;
            }
            p = n.next;
        }
        true
    }

    /// Clips the corner of every short self-intersecting zig-zag.
    fn cure_local_intersections(&mut self, start: usize) -> usize {
        let mut start = start;
        let mut p = start;
        loop {
            let a = self.prev(p);
            let p_next = self.next(p);
            let b = self.next(p_next);

            if !self.equals(a, b)
                && self.intersects(a, p, p_next, b)
                && self.locally_inside(a, b)
                && self.locally_inside(b, a)
            {
                self.triangles
                    .push([self.nodes[a].i, self.nodes[p].i, self.nodes[b].i]);
                self.remove_node(p);
                self.remove_node(p_next);
                p = b;
                start = b;
            }

            p = self.next(p);
            if p == start {
                break;
            }
        }
        self.filter_points(p, None)
    }

    /// Splits the ring along a valid diagonal and triangulates both halves.
    fn split_earcut(&mut self, start: usize) {
        let mut a = start;
        loop {
            let mut b = self.next(self.next(a));
            while b != self.prev(a) {
                if self.nodes[a].i != self.nodes[b].i && self.is_valid_diagonal(a, b) {
                    let c = self.split_polygon(a, b);

                    let a_end = self.next(a);
                    let a = self.filter_points(a, Some(a_end));
                    let c_end = self.next(c);
                    let c = self.filter_points(c, Some(c_end));

                    self.earcut_linked(a, Pass::Initial);
                    self.earcut_linked(c, Pass::Initial);
                    return;
                }
                b = self.next(b);
            }
            a = self.next(a);
            if a == start {
                break;
            }
        }
        log::debug!("ring left partially triangulated: no valid diagonal found");
    }

    /// Links every hole into the outer ring, leftmost hole first.
    fn eliminate_holes(
        &mut self,
        holes: &[Vec<Coord<f64>>],
        outer_len: usize,
        outer: usize,
    ) -> usize {
        let mut queue = Vec::with_capacity(holes.len());
        let mut offset = outer_len;

        for hole in holes {
            if let Some(list) = self.linked_list(hole, offset, false) {
                let second = self.next(list);
                if second != list && self.next(second) != list {
                    queue.push(self.leftmost(list));
                } else {
                    log::debug!("skipping hole ring with fewer than three points");
                }
            }
            offset += hole.len();
        }

        queue.sort_by(|&a, &b| {
            let (a, b) = (&self.nodes[a], &self.nodes[b]);
            a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y))
        });

        let mut outer = outer;
        for hole in queue {
            outer = self.eliminate_hole(hole, outer);
        }
        outer
    }

    fn eliminate_hole(&mut self, hole: usize, outer: usize) -> usize {
        let Some(bridge) = self.find_hole_bridge(hole, outer) else {
            log::debug!("hole is not enclosed by its outer ring, skipping");
            return outer;
        };

        let bridge_reverse = self.split_polygon(bridge, hole);
        let end = self.next(bridge_reverse);
        self.filter_points(bridge_reverse, Some(end));
        let end = self.next(bridge);
        self.filter_points(bridge, Some(end))
    }

    /// Finds an outer ring vertex visible from the hole's leftmost point.
    fn find_hole_bridge(&self, hole: usize, outer: usize) -> Option<usize> {
        let (hx, hy) = (self.nodes[hole].x, self.nodes[hole].y);
        let mut qx = f64::NEG_INFINITY;
        let mut bridge = None;

        // Nearest segment crossed by a ray cast left from the hole point
        let mut p = outer;
        loop {
            let n = &self.nodes[p];
            let nn = &self.nodes[n.next];
            if hy <= n.y && hy >= nn.y && nn.y != n.y {
                let x = n.x + (hy - n.y) * (nn.x - n.x) / (nn.y - n.y);
                if x <= hx && x > qx {
                    qx = x;
                    bridge = Some(if n.x < nn.x { p } else { n.next });
                    if x == hx {
                        // Hole touches the outer segment
                        return bridge;
                    }
                }
            }
            p = n.next;
            if p == outer {
                break;
            }
        }

        let mut m = bridge?;

        // Prefer the vertex inside (hole point, intersection, m) with the
        // smallest angle to the ray.
        let stop = m;
        let (mx, my) = (self.nodes[m].x, self.nodes[m].y);
        let mut tan_min = f64::INFINITY;
        let (tri_ax, tri_cx) = if hy < my { (hx, qx) } else { (qx, hx) };

        p = m;
        loop {
            let n = &self.nodes[p];
            if hx >= n.x
                && n.x >= mx
                && hx != n.x
                && point_in_triangle(tri_ax, hy, mx, my, tri_cx, hy, n.x, n.y)
            {
                let tan = (hy - n.y).abs() / (hx - n.x);
                let m_x = self.nodes[m].x;
                if self.locally_inside(p, hole)
                    && (tan < tan_min
                        || (tan == tan_min
                            && (n.x > m_x || (n.x == m_x && self.sector_contains_sector(m, p)))))
                {
                    m = p;
                    tan_min = tan;
                }
            }
            p = n.next;
            if p == stop {
                break;
            }
        }

        Some(m)
    }

    fn sector_contains_sector(&self, m: usize, p: usize) -> bool {
        self.area(self.prev(m), m, self.prev(p)) < 0.0
            && self.area(self.next(p), m, self.next(m)) < 0.0
    }

    fn leftmost(&self, start: usize) -> usize {
        let mut p = start;
        let mut leftmost = start;
        loop {
            let (n, l) = (&self.nodes[p], &self.nodes[leftmost]);
            if n.x < l.x || (n.x == l.x && n.y < l.y) {
                leftmost = p;
            }
            p = n.next;
            if p == start {
                break;
            }
        }
        leftmost
    }

    fn is_valid_diagonal(&self, a: usize, b: usize) -> bool {
        let (na, nb) = (&self.nodes[a], &self.nodes[b]);

        let opens_inside = self.locally_inside(a, b)
            && self.locally_inside(b, a)
            && self.middle_inside(a, b)
            && (self.area(na.prev, a, nb.prev) != 0.0 || self.area(a, nb.prev, b) != 0.0);
        let zero_length = self.equals(a, b)
            && self.area(na.prev, a, na.next) > 0.0
            && self.area(nb.prev, b, nb.next) > 0.0;

        self.nodes[na.next].i != nb.i
            && self.nodes[na.prev].i != nb.i
            && !self.intersects_polygon(a, b)
            && (opens_inside || zero_length)
    }

    fn intersects(&self, p1: usize, q1: usize, p2: usize, q2: usize) -> bool {
        let o1 = sign(self.area(p1, q1, p2));
        let o2 = sign(self.area(p1, q1, q2));
        let o3 = sign(self.area(p2, q2, p1));
        let o4 = sign(self.area(p2, q2, q1));

        if o1 != o2 && o3 != o4 {
            return true;
        }

        // Collinear overlaps
        (o1 == 0 && self.on_segment(p1, p2, q1))
            || (o2 == 0 && self.on_segment(p1, q2, q1))
            || (o3 == 0 && self.on_segment(p2, p1, q2))
            || (o4 == 0 && self.on_segment(p2, q1, q2))
    }

    /// Whether `q` lies on segment `p`-`r`, given the three are collinear.
    fn on_segment(&self, p: usize, q: usize, r: usize) -> bool {
        let (p, q, r) = (&self.nodes[p], &self.nodes[q], &self.nodes[r]);
        q.x <= p.x.max(r.x) && q.x >= p.x.min(r.x) && q.y <= p.y.max(r.y) && q.y >= p.y.min(r.y)
    }

    fn intersects_polygon(&self, a: usize, b: usize) -> bool {
        let (ai, bi) = (self.nodes[a].i, self.nodes[b].i);
        let mut p = a;
        loop {
            let n = &self.nodes[p];
            let next_i = self.nodes[n.next].i;
            if n.i != ai
                && next_i != ai
                && n.i != bi
                && next_i != bi
                && self.intersects(p, n.next, a, b)
            {
                return true;
            }
            p = n.next;
            if p == a {
                return false;
            }
        }
    }

    fn locally_inside(&self, a: usize, b: usize) -> bool {
        let (prev, next) = (self.prev(a), self.next(a));
        if self.area(prev, a, next) < 0.0 {
            self.area(a, b, next) >= 0.0 && self.area(a, prev, b) >= 0.0
        } else {
            self.area(a, b, prev) < 0.0 || self.area(a, next, b) < 0.0
        }
    }

    fn middle_inside(&self, a: usize, b: usize) -> bool {
        let px = (self.nodes[a].x + self.nodes[b].x) / 2.0;
        let py = (self.nodes[a].y + self.nodes[b].y) / 2.0;

        let mut inside = false;
        let mut p = a;
        loop {
            let n = &self.nodes[p];
            let nn = &self.nodes[n.next];
            if (n.y > py) != (nn.y > py)
                && nn.y != n.y
                && px < (nn.x - n.x) * (py - n.y) / (nn.y - n.y) + n.x
            {
                inside = !inside;
            }
            p = n.next;
            if p == a {
                return inside;
            }
        }
    }

    /// Joins `a` and `b` with a pair of coincident edges, splitting one
    /// ring in two (or merging a hole into its outer ring). Returns the
    /// copy of `b` that starts the second ring.
    fn split_polygon(&mut self, a: usize, b: usize) -> usize {
        let (ai, ac) = (self.nodes[a].i, coord(&self.nodes[a]));
        let (bi, bc) = (self.nodes[b].i, coord(&self.nodes[b]));
        let a2 = self.push_node(ai, ac);
        let b2 = self.push_node(bi, bc);
        let an = self.next(a);
        let bp = self.prev(b);

        self.nodes[a].next = b;
        self.nodes[b].prev = a;

        self.nodes[a2].next = an;
        self.nodes[an].prev = a2;

        self.nodes[b2].next = a2;
        self.nodes[a2].prev = b2;

        self.nodes[bp].next = b2;
        self.nodes[b2].prev = bp;

        b2
    }
}

#[inline]
fn coord(n: &Node) -> Coord<f64> {
    Coord { x: n.x, y: n.y }
}

#[inline]
fn sign(v: f64) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

#[allow(clippy::too_many_arguments)]
#[inline]
fn point_in_triangle(
    ax: f64,
    ay: f64,
    bx: f64,
    by: f64,
    cx: f64,
    cy: f64,
    px: f64,
    py: f64,
) -> bool {
    (cx - px) * (ay - py) >= (ax - px) * (cy - py)
        && (ax - px) * (by - py) >= (bx - px) * (ay - py)
        && (bx - px) * (cy - py) >= (cx - px) * (by - py)
}

#[inline]
fn point_in_triangle_except_first(a: &Node, b: &Node, c: &Node, px: f64, py: f64) -> bool {
    !(a.x == px && a.y == py) && point_in_triangle(a.x, a.y, b.x, b.y, c.x, c.y, px, py)
}
