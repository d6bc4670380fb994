use crate::catalog::Dependency;
use crate::layout::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

impl PointerButton {
    /// DOM `MouseEvent.button` numbering.
    pub fn from_index(index: i16) -> Option<Self> {
        match index {
            0 => Some(Self::Primary),
            1 => Some(Self::Middle),
            2 => Some(Self::Secondary),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PointerState {
    Idle,
    Panning {
        /// Pointer minus pan at press time; pan = pointer - origin.
        origin: Point,
        press: Point,
        moved: bool,
        /// Edge whose hit area received the press, selected on a clean release.
        edge: Option<Dependency>,
    },
    Dragging {
        node: String,
        /// Pointer position relative to the node's top-left, in diagram space.
        grab: Point,
        press: Point,
        moved: bool,
    },
}

impl PointerState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Panning { .. } => "panning",
            Self::Dragging { .. } => "dragging-node",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Coalesces pointer samples so at most one drag update is applied per animation frame.
#[derive(Debug, Clone, Default)]
pub struct FrameScheduler {
    pending: Option<Point>,
    in_flight: bool,
}

impl FrameScheduler {
    /// Stores the latest sample. Returns `true` when the host must schedule a frame, which
    /// happens only for the first sample since the last frame.
    pub fn request(&mut self, point: Point) -> bool {
        self.pending = Some(point);
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        true
    }

    /// Frame callback: hands out the latest sample and frees the channel.
    pub fn take(&mut self) -> Option<Point> {
        self.in_flight = false;
        self.pending.take()
    }

    pub fn cancel(&mut self) {
        self.in_flight = false;
        self.pending = None;
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }
}

/// Rounds `value` to the nearest multiple of `grid`.
pub fn snap_to_grid(value: f32, grid: f32) -> f32 {
    if grid <= 0.0 {
        return value;
    }
    (value / grid).round() * grid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_first_sample_requests_a_frame() {
        let mut frames = FrameScheduler::default();
        assert!(frames.request(Point::new(1.0, 1.0)));
        assert!(!frames.request(Point::new(2.0, 2.0)));
        assert!(!frames.request(Point::new(3.0, 3.0)));
        assert_eq!(frames.take(), Some(Point::new(3.0, 3.0)));
        assert!(frames.request(Point::new(4.0, 4.0)));
    }

    #[test]
    fn cancel_discards_pending_sample() {
        let mut frames = FrameScheduler::default();
        frames.request(Point::new(1.0, 1.0));
        frames.cancel();
        assert!(!frames.is_in_flight());
        assert_eq!(frames.take(), None);
    }

    #[test]
    fn snapping_rounds_to_nearest() {
        assert_eq!(snap_to_grid(14.9, 10.0), 10.0);
        assert_eq!(snap_to_grid(15.0, 10.0), 20.0);
        assert_eq!(snap_to_grid(-14.0, 10.0), -10.0);
        assert_eq!(snap_to_grid(7.0, 0.0), 7.0);
    }
}
