use kurbo::Point;

/// Two opposite corners from either a drag (down, move, up elsewhere) or two
/// separate clicks. Points are in canvas space.
#[derive(Clone, Debug, Default)]
pub struct BoxCollector {
    start: Option<Point>,
    cursor: Option<Point>,
    pressed: bool,
}

impl BoxCollector {
    pub fn start(&self) -> Option<Point> {
        self.start
    }

    pub fn cursor(&self) -> Option<Point> {
        self.cursor
    }

    /// Returns both corners once the second click lands.
    pub fn pointer_down(&mut self, p: Point) -> Option<(Point, Point)> {
        self.cursor = Some(p);
        match self.start {
            None => {
                self.start = Some(p);
                self.pressed = true;
                None
            }
            Some(start) => Some(self.take(start, p)),
        }
    }

    pub fn pointer_move(&mut self, p: Point) {
        self.cursor = Some(p);
    }

    /// A release farther than `tolerance` from the press finishes a drag; a release in
    /// place keeps waiting for the second click.
    pub fn pointer_up(&mut self, p: Point, tolerance: f64) -> Option<(Point, Point)> {
        self.cursor = Some(p);
        let was_pressed = std::mem::replace(&mut self.pressed, false);
        match self.start {
            Some(start) if was_pressed && start.distance(p) > tolerance => Some(self.take(start, p)),
            _ => None,
        }
    }

    fn take(&mut self, start: Point, end: Point) -> (Point, Point) {
        *self = BoxCollector::default();
        (start, end)
    }

    /// Current rubber band in `[top-left, bottom-right]` form.
    pub fn rubber_band(&self) -> Option<(Point, Point)> {
        let (a, b) = (self.start?, self.cursor?);
        Some((Point::new(a.x.min(b.x), a.y.min(b.y)), Point::new(a.x.max(b.x), a.y.max(b.y))))
    }
}
