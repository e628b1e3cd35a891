use kurbo::Point;

/// Vertex buffer for click-by-click shapes, with slide mode and single-step undo.
/// Vertices are in canvas space; the slide anchor is kept in client space so the
/// threshold is independent of zoom.
#[derive(Clone, Debug, Default)]
pub struct PolyshapeCollector {
    points: Vec<Point>,
    cursor: Option<Point>,
    required: Option<usize>,
    slide_anchor: Option<Point>,
}

impl PolyshapeCollector {
    pub fn new(required: Option<usize>) -> Self {
        PolyshapeCollector { required: required.filter(|&n| n > 0), ..Default::default() }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn cursor(&self) -> Option<Point> {
        self.cursor
    }

    pub fn is_complete(&self) -> bool {
        self.required.is_some_and(|n| self.points.len() >= n)
    }

    /// Append a clicked vertex; true once the required vertex count is reached.
    pub fn add(&mut self, p: Point, client: Point) -> bool {
        self.cursor = Some(p);
        if self.points.last().is_some_and(|last| last.distance(p) < 1e-9) {
            return self.is_complete();
        }
        self.points.push(p);
        self.slide_anchor = Some(client);
        self.is_complete()
    }

    /// Append several vertices at once (autoborder runs), stopping at the required count.
    pub fn extend(&mut self, points: &[Point], client: Point) -> bool {
        for &p in points {
            if self.add(p, client) {
                return true;
            }
        }
        self.is_complete()
    }

    pub fn undo(&mut self) -> Option<Point> {
        let removed = self.points.pop();
        self.slide_anchor = None;
        removed
    }

    pub fn pointer_move(&mut self, p: Point) {
        self.cursor = Some(p);
    }

    /// Slide mode: append the cursor once it has travelled `threshold` client px from
    /// the last vertex. Only continues a shape that already has a vertex.
    pub fn slide(&mut self, p: Point, client: Point, threshold: f64) -> bool {
        self.cursor = Some(p);
        if self.points.is_empty() {
            return false;
        }
        match self.slide_anchor {
            Some(anchor) if anchor.distance(client) >= threshold => self.add(p, client),
            Some(_) => false,
            None => {
                self.slide_anchor = Some(client);
                false
            }
        }
    }

    pub fn with_cursor(&self) -> Vec<Point> {
        let mut points = self.points.clone();
        if let Some(cursor) = self.cursor {
            if !self.is_complete() {
                points.push(cursor);
            }
        }
        points
    }

    pub fn take(&mut self) -> Vec<Point> {
        let required = self.required;
        std::mem::replace(self, PolyshapeCollector::new(required)).points
    }
}
