use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};

/// Smallest width or height a resize can produce
pub const MIN_IMAGE_SIZE: f32 = 20.0;

/// Half the side of the square hit box around each handle
pub const HANDLE_HIT_HALF: f32 = 8.0;

/// One of the eight grab points on an image's bounding box
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResizeHandle {
    NorthWest,
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::NorthWest,
        ResizeHandle::North,
        ResizeHandle::NorthEast,
        ResizeHandle::East,
        ResizeHandle::SouthEast,
        ResizeHandle::South,
        ResizeHandle::SouthWest,
        ResizeHandle::West,
    ];

    pub fn is_corner(&self) -> bool {
        matches!(
            self,
            ResizeHandle::NorthWest
                | ResizeHandle::NorthEast
                | ResizeHandle::SouthEast
                | ResizeHandle::SouthWest
        )
    }

    /// Handle center on the given rectangle
    pub fn position(&self, rect: &Rect) -> Point {
        let (cx, cy) = (rect.x + rect.width / 2.0, rect.y + rect.height / 2.0);
        let (x, y) = match self {
            ResizeHandle::NorthWest => (rect.x, rect.y),
            ResizeHandle::North => (cx, rect.y),
            ResizeHandle::NorthEast => (rect.right(), rect.y),
            ResizeHandle::East => (rect.right(), cy),
            ResizeHandle::SouthEast => (rect.right(), rect.bottom()),
            ResizeHandle::South => (cx, rect.bottom()),
            ResizeHandle::SouthWest => (rect.x, rect.bottom()),
            ResizeHandle::West => (rect.x, cy),
        };
        Point::new(x, y)
    }

    /// Whether `p` falls in this handle's hit box
    pub fn hit(&self, rect: &Rect, p: Point) -> bool {
        let center = self.position(rect);
        (p.x - center.x).abs() <= HANDLE_HIT_HALF && (p.y - center.y).abs() <= HANDLE_HIT_HALF
    }

    fn moves_left_edge(&self) -> bool {
        matches!(
            self,
            ResizeHandle::NorthWest | ResizeHandle::West | ResizeHandle::SouthWest
        )
    }

    fn moves_top_edge(&self) -> bool {
        matches!(
            self,
            ResizeHandle::NorthWest | ResizeHandle::North | ResizeHandle::NorthEast
        )
    }
}

/// Resize `start` by the pointer delta `(dx, dy)` accumulated since the
/// gesture began.
///
/// Corner handles keep the aspect ratio of `start` when `lock_aspect` is set:
/// width is primary and height follows as `width / aspect`. Edge handles only
/// touch their own dimension. The edge or corner opposite the handle never
/// moves and nothing shrinks below [`MIN_IMAGE_SIZE`].
pub fn resize_rect(handle: ResizeHandle, start: Rect, dx: f32, dy: f32, lock_aspect: bool) -> Rect {
    let signed_dx = if handle.moves_left_edge() { -dx } else { dx };
    let signed_dy = if handle.moves_top_edge() { -dy } else { dy };

    let (width, height) = match handle {
        ResizeHandle::East | ResizeHandle::West => {
            ((start.width + signed_dx).max(MIN_IMAGE_SIZE), start.height)
        }
        ResizeHandle::North | ResizeHandle::South => {
            (start.width, (start.height + signed_dy).max(MIN_IMAGE_SIZE))
        }
        _ if lock_aspect && start.height > 0.0 && start.width > 0.0 => {
            let aspect = start.width / start.height;
            let min_width = MIN_IMAGE_SIZE.max(MIN_IMAGE_SIZE * aspect);
            let width = (start.width + signed_dx).max(min_width);
            (width, width / aspect)
        }
        _ => (
            (start.width + signed_dx).max(MIN_IMAGE_SIZE),
            (start.height + signed_dy).max(MIN_IMAGE_SIZE),
        ),
    };

    let x = if handle.moves_left_edge() {
        start.right() - width
    } else {
        start.x
    };
    let y = if handle.moves_top_edge() {
        start.bottom() - height
    } else {
        start.y
    };
    Rect::new(x, y, width, height)
}
