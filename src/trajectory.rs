/// One pointer sample taken during a response window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseSample {
    /// seconds since the window opened
    pub t: f64,
    pub x: f64,
    pub y: f64,
}

impl MouseSample {
    pub fn new(t: f64, x: f64, y: f64) -> Self {
        Self { t, x, y }
    }
}

impl From<(f64, f64, f64)> for MouseSample {
    fn from(v: (f64, f64, f64)) -> Self {
        MouseSample {
            t: v.0,
            x: v.1,
            y: v.2,
        }
    }
}

impl From<MouseSample> for (f64, f64, f64) {
    fn from(s: MouseSample) -> Self {
        (s.t, s.x, s.y)
    }
}

/// Last known pointer cell. Positions are reported in a centered frame with
/// y growing upward; an untouched pointer sits at the origin.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerTracker {
    cell: Option<(u16, u16)>,
}

impl PointerTracker {
    pub fn move_to(&mut self, column: u16, row: u16) {
        self.cell = Some((column, row));
    }

    /// Forget the last position, putting the pointer back at the origin
    pub fn recenter(&mut self) {
        self.cell = None;
    }

    pub fn position(&self, (width, height): (u16, u16)) -> (f64, f64) {
        match self.cell {
            Some((column, row)) => (
                column as f64 - width as f64 / 2.0,
                height as f64 / 2.0 - row as f64,
            ),
            None => (0.0, 0.0),
        }
    }
}
