//! Perspective cuboid: four vertical edges, two vanishing points and one edge
//! that is never observed directly but rebuilt from the other three.
//!
//! Flat point order: front-left top/bottom, front-right top/bottom,
//! dorsal-right top/bottom, dorsal-left top/bottom.

use kurbo::{Point, Vec2};
use serde::{Serialize, Deserialize};
use crate::consts::{
    CUBOID_BOX_DEPTH_RATIO, CUBOID_DORSAL_NUDGE, CUBOID_EPSILON, CUBOID_NUDGE_ATTEMPTS,
    CUBOID_VERTICAL_TOLERANCE_DEG, MIN_EDGE_LENGTH,
};
use crate::math::intersection;
use crate::transform::{to_flat, to_points};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    pub top: Point,
    pub bottom: Point,
}

impl Edge {
    pub fn new(top: Point, bottom: Point) -> Self {
        Edge { top, bottom }
    }

    fn translated(self, delta: Vec2) -> Self {
        Edge { top: self.top + delta, bottom: self.bottom + delta }
    }

    fn snap_vertical(&mut self) {
        self.top.x = self.bottom.x;
    }

    fn length(&self) -> f64 {
        self.top.distance(self.bottom)
    }

    fn is_finite(&self) -> bool {
        self.top.x.is_finite() && self.top.y.is_finite() && self.bottom.x.is_finite() && self.bottom.y.is_finite()
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Dorsal face displaced to the right; the right side face is visible.
    Right,
    Left,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EdgeId {
    FrontLeft,
    FrontRight,
    DorsalRight,
    DorsalLeft,
}

impl EdgeId {
    pub fn from_point_index(index: usize) -> Option<(EdgeId, bool)> {
        let edge = match index / 2 {
            0 => EdgeId::FrontLeft,
            1 => EdgeId::FrontRight,
            2 => EdgeId::DorsalRight,
            3 => EdgeId::DorsalLeft,
            _ => return None,
        };
        Some((edge, index % 2 == 0))
    }
}

/// Line-line intersection retried with growing opposite vertical perturbations of
/// the second points, so exactly parallel lines still converge far away.
fn nudged_intersection(p1: Point, p2: Point, p3: Point, p4: Point) -> Option<Point> {
    (0..=CUBOID_NUDGE_ATTEMPTS).find_map(|attempt| {
        let shift = Vec2::new(0.0, attempt as f64 * CUBOID_EPSILON);
        intersection(p1, p2 + shift, p3, p4 - shift)
    })
}

#[derive(Clone, Debug, PartialEq)]
pub struct CuboidModel {
    pub fl: Edge,
    pub fr: Edge,
    pub dr: Edge,
    pub dl: Edge,
    vpl: Option<Point>,
    vpr: Option<Point>,
    orientation: Orientation,
}

impl CuboidModel {
    pub fn from_points(points: &[Point; 8]) -> Self {
        let mut model = CuboidModel {
            fl: Edge::new(points[0], points[1]),
            fr: Edge::new(points[2], points[3]),
            dr: Edge::new(points[4], points[5]),
            dl: Edge::new(points[6], points[7]),
            vpl: None,
            vpr: None,
            orientation: Orientation::Right,
        };
        let depth = ((model.dr.top.x - model.fr.top.x) + (model.dl.top.x - model.fl.top.x)) / 2.0;
        model.orientation = if depth >= 0.0 { Orientation::Right } else { Orientation::Left };
        for edge in model.edges_mut() {
            edge.snap_vertical();
        }
        model.update_vanishing_points();
        model
    }

    pub fn from_flat(flat: &[f64]) -> Option<Self> {
        let points: [Point; 8] = to_points(flat).try_into().ok()?;
        Some(CuboidModel::from_points(&points))
    }

    /// Cuboid fitted inside an axis-aligned box: the front face takes the lower-left
    /// part and the depth runs up and to the right.
    pub fn from_box(xtl: f64, ytl: f64, xbr: f64, ybr: f64) -> Self {
        let width = xbr - xtl;
        let height = ybr - ytl;
        let depth = Vec2::new(width * CUBOID_BOX_DEPTH_RATIO, -height * CUBOID_BOX_DEPTH_RATIO);
        let fl = Edge::new(Point::new(xtl, ytl + height * CUBOID_BOX_DEPTH_RATIO), Point::new(xtl, ybr));
        let fr = Edge::new(
            Point::new(xbr - width * CUBOID_BOX_DEPTH_RATIO, fl.top.y),
            Point::new(xbr - width * CUBOID_BOX_DEPTH_RATIO, ybr),
        );
        CuboidModel::from_front(fl, fr, depth)
    }

    /// Back face from a translated front face, its edges pulled slightly inwards so
    /// the side faces converge.
    fn from_front(fl: Edge, fr: Edge, depth: Vec2) -> Self {
        let nudge = |edge: Edge| Edge {
            top: edge.top + depth + Vec2::new(0.0, CUBOID_DORSAL_NUDGE),
            bottom: edge.bottom + depth - Vec2::new(0.0, CUBOID_DORSAL_NUDGE),
        };
        let points = [
            fl.top, fl.bottom, fr.top, fr.bottom,
            nudge(fr).top, nudge(fr).bottom, nudge(fl).top, nudge(fl).bottom,
        ];
        CuboidModel::from_points(&points)
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn vanishing_points(&self) -> (Option<Point>, Option<Point>) {
        (self.vpl, self.vpr)
    }

    pub fn hidden_edge(&self) -> EdgeId {
        match self.orientation {
            Orientation::Right => EdgeId::DorsalLeft,
            Orientation::Left => EdgeId::DorsalRight,
        }
    }

    pub fn edge(&self, id: EdgeId) -> Edge {
        match id {
            EdgeId::FrontLeft => self.fl,
            EdgeId::FrontRight => self.fr,
            EdgeId::DorsalRight => self.dr,
            EdgeId::DorsalLeft => self.dl,
        }
    }

    fn edge_mut(&mut self, id: EdgeId) -> &mut Edge {
        match id {
            EdgeId::FrontLeft => &mut self.fl,
            EdgeId::FrontRight => &mut self.fr,
            EdgeId::DorsalRight => &mut self.dr,
            EdgeId::DorsalLeft => &mut self.dl,
        }
    }

    fn edges_mut(&mut self) -> [&mut Edge; 4] {
        [&mut self.fl, &mut self.fr, &mut self.dr, &mut self.dl]
    }

    pub fn points(&self) -> [Point; 8] {
        [
            self.fl.top, self.fl.bottom, self.fr.top, self.fr.bottom,
            self.dr.top, self.dr.bottom, self.dl.top, self.dl.bottom,
        ]
    }

    pub fn to_flat(&self) -> Vec<f64> {
        to_flat(&self.points())
    }

    /// Front, back, top, bottom, left, right; each clockwise from its top-left.
    pub fn faces(&self) -> [[Point; 4]; 6] {
        let (fl, fr, dr, dl) = (self.fl, self.fr, self.dr, self.dl);
        [
            [fl.top, fr.top, fr.bottom, fl.bottom],
            [dl.top, dr.top, dr.bottom, dl.bottom],
            [dl.top, dr.top, fr.top, fl.top],
            [fl.bottom, fr.bottom, dr.bottom, dl.bottom],
            [dl.top, fl.top, fl.bottom, dl.bottom],
            [fr.top, dr.top, dr.bottom, fr.bottom],
        ]
    }

    /// Left vanishing point from the front face, right one from the visible side face.
    fn update_vanishing_points(&mut self) {
        self.vpl = nudged_intersection(self.fl.top, self.fr.top, self.fl.bottom, self.fr.bottom);
        let (front, dorsal) = match self.orientation {
            Orientation::Right => (self.fr, self.dr),
            Orientation::Left => (self.fl, self.dl),
        };
        self.vpr = nudged_intersection(front.top, dorsal.top, front.bottom, dorsal.bottom);
    }

    fn rebuild_hidden_edge(&mut self) -> bool {
        let (Some(vpl), Some(vpr)) = (self.vpl, self.vpr) else {
            return false;
        };
        let (back, side) = match self.orientation {
            Orientation::Right => (self.dr, self.fl),
            Orientation::Left => (self.dl, self.fr),
        };
        let top = nudged_intersection(vpl, back.top, vpr, side.top);
        let bottom = nudged_intersection(vpl, back.bottom, vpr, side.bottom);
        let (Some(top), Some(bottom)) = (top, bottom) else {
            return false;
        };
        let hidden = self.hidden_edge();
        *self.edge_mut(hidden) = Edge::new(top, bottom);
        true
    }

    /// Recompute everything derived after a mutation. On failure the previous state
    /// is restored so no NaN ever reaches the points.
    fn settle(&mut self, before: CuboidModel) -> bool {
        for edge in self.edges_mut() {
            edge.snap_vertical();
        }
        self.update_vanishing_points();
        let ok = self.rebuild_hidden_edge();
        for edge in self.edges_mut() {
            edge.snap_vertical();
        }
        if ok && [self.fl, self.fr, self.dr, self.dl].iter().all(Edge::is_finite) {
            true
        } else {
            log::warn!("cuboid update produced no vanishing point, reverting");
            *self = before;
            false
        }
    }

    /// Shift one observed edge. The hidden edge cannot be moved directly.
    pub fn move_edge(&mut self, id: EdgeId, delta: Vec2) -> bool {
        if id == self.hidden_edge() {
            return false;
        }
        let before = self.clone();
        let edge = self.edge_mut(id);
        *edge = edge.translated(delta);
        self.settle(before)
    }

    /// Drag one corner: the whole edge follows horizontally, the corner alone vertically.
    pub fn move_point(&mut self, index: usize, to: Point) -> bool {
        let Some((id, is_top)) = EdgeId::from_point_index(index) else {
            return false;
        };
        if id == self.hidden_edge() {
            return false;
        }
        let before = self.clone();
        let edge = self.edge_mut(id);
        edge.top.x = to.x;
        edge.bottom.x = to.x;
        if is_top {
            edge.top.y = to.y;
        } else {
            edge.bottom.y = to.y;
        }
        self.settle(before)
    }

    pub fn translate(&mut self, delta: Vec2) {
        for edge in self.edges_mut() {
            *edge = edge.translated(delta);
        }
        self.vpl = self.vpl.map(|p| p + delta);
        self.vpr = self.vpr.map(|p| p + delta);
    }
}

/// Height-based reconstruction used when the depth runs (almost) vertically: the box
/// height comes from the most axis-aligned adjacent pair, `p0`/`p2` span the front face.
pub fn setup_cuboid_points(p: &[Point; 4]) -> Option<CuboidModel> {
    let pairs = [(p[0], p[1]), (p[1], p[2]), (p[2], p[3])];
    let (a, b) = pairs
        .iter()
        .copied()
        .min_by(|x, y| (x.1.x - x.0.x).abs().total_cmp(&(y.1.x - y.0.x).abs()))?;
    let height = (b.y - a.y).abs();
    let left = p[0].x.min(p[2].x);
    let right = p[0].x.max(p[2].x);
    let bottom = p[0].y.max(p[2].y);
    let top = bottom - height;
    if right - left < MIN_EDGE_LENGTH || height < MIN_EDGE_LENGTH {
        return None;
    }
    let fl = Edge::new(Point::new(left, top), Point::new(left, bottom));
    let fr = Edge::new(Point::new(right, top), Point::new(right, bottom));
    Some(CuboidModel::from_front(fl, fr, p[3] - p[2]))
}

/// Full cuboid from four clicks: three corners of the front face (`p0`, `p1` on one
/// vertical edge, `p2` on the other) and `p3`, the dorsal counterpart of `p2`.
pub fn cuboid_from_4_points(p: &[Point; 4]) -> Option<CuboidModel> {
    let depth = p[3] - p[2];
    let angle = depth.y.atan2(depth.x).to_degrees();
    if (angle.abs() - 90.0).abs() <= CUBOID_VERTICAL_TOLERANCE_DEG {
        return setup_cuboid_points(p);
    }
    let mut quad = [p[0], p[1], p[2], p[0] + (p[2] - p[1])];
    quad.sort_by(|a, b| a.x.total_cmp(&b.x));
    let edge_from = |a: Point, b: Point| {
        let (top, bottom) = if a.y <= b.y { (a, b) } else { (b, a) };
        Edge::new(Point::new(bottom.x, top.y), bottom)
    };
    let fl = edge_from(quad[0], quad[1]);
    let fr = edge_from(quad[2], quad[3]);
    if fr.bottom.x - fl.bottom.x < MIN_EDGE_LENGTH
        || fl.length() < MIN_EDGE_LENGTH
        || fr.length() < MIN_EDGE_LENGTH
    {
        log::warn!("cuboid corners too close together, abandoning");
        return None;
    }
    let model = CuboidModel::from_front(fl, fr, depth);
    let (vpl, vpr) = model.vanishing_points();
    if vpl.is_none() || vpr.is_none() {
        return None;
    }
    Some(model)
}
