//! Face-mesh landmark sets and the eye indices the gaze ratios read.
//!
//! All indices follow the MediaPipe Face Mesh topology: 468 surface points,
//! plus 10 iris points (468..=477) when the model runs with iris refinement.
//! They are an external contract with the landmark model. A model with a
//! different index scheme silently produces wrong ratios, so the detector
//! checks point counts against [`MESH_POINTS`] and [`REFINED_POINTS`].

use crate::error::{GazeError, GazeResult};
use crate::types::{Point2D, Rect};

/// Surface points in the base face mesh.
pub const MESH_POINTS: usize = 468;

/// Surface points plus 5 iris points per eye.
pub const REFINED_POINTS: usize = 478;

/// Landmark indices describing one eye.
///
/// `corners` is ordered so that a horizontal ratio of 0 means "toward the
/// temple" and 1 "toward the nose" for the left eye; the right eye uses the
/// opposite physical order (inner, outer), so averaging both assumes a
/// roughly symmetric face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EyeIndices {
    pub iris: [usize; 4],
    pub corners: (usize, usize),
    /// (top, bottom)
    pub lids: (usize, usize),
}

pub const LEFT_EYE: EyeIndices = EyeIndices {
    iris: [474, 475, 476, 477],
    // outer, inner
    corners: (33, 133),
    lids: (159, 145),
};

pub const RIGHT_EYE: EyeIndices = EyeIndices {
    iris: [469, 470, 471, 472],
    // inner, outer
    corners: (362, 263),
    lids: (386, 374),
};

/// Mesh edges drawn on the overlay, grouped by facial feature. These are the
/// face-mesh contour connections; the dense surface tesselation is not drawn.
pub mod contours {
    pub type Edge = (usize, usize);

    /// Ring through corners 33/133 and lids 159/145.
    pub const LEFT_EYE: &[Edge] = &[
        (33, 7), (7, 163), (163, 144), (144, 145), (145, 153), (153, 154), (154, 155), (155, 133),
        (33, 246), (246, 161), (161, 160), (160, 159), (159, 158), (158, 157), (157, 173), (173, 133),
    ];

    /// Ring through corners 362/263 and lids 386/374.
    pub const RIGHT_EYE: &[Edge] = &[
        (263, 249), (249, 390), (390, 373), (373, 374), (374, 380), (380, 381), (381, 382), (382, 362),
        (263, 466), (466, 388), (388, 387), (387, 386), (386, 385), (385, 384), (384, 398), (398, 362),
    ];

    pub const LEFT_BROW: &[Edge] = &[
        (46, 53), (53, 52), (52, 65), (65, 55), (70, 63), (63, 105), (105, 66), (66, 107),
    ];

    pub const RIGHT_BROW: &[Edge] = &[
        (276, 283), (283, 282), (282, 295), (295, 285), (300, 293), (293, 334), (334, 296), (296, 336),
    ];

    pub const LEFT_IRIS: &[Edge] = &[(474, 475), (475, 476), (476, 477), (477, 474)];

    pub const RIGHT_IRIS: &[Edge] = &[(469, 470), (470, 471), (471, 472), (472, 469)];

    pub const LIPS: &[Edge] = &[
        (61, 146), (146, 91), (91, 181), (181, 84), (84, 17), (17, 314), (314, 405), (405, 321),
        (321, 375), (375, 291), (61, 185), (185, 40), (40, 39), (39, 37), (37, 0), (0, 267),
        (267, 269), (269, 270), (270, 409), (409, 291), (78, 95), (95, 88), (88, 178), (178, 87),
        (87, 14), (14, 317), (317, 402), (402, 318), (318, 324), (324, 308), (78, 191), (191, 80),
        (80, 81), (81, 82), (82, 13), (13, 312), (312, 311), (311, 310), (310, 415), (415, 308),
    ];

    pub const FACE_OVAL: &[Edge] = &[
        (10, 338), (338, 297), (297, 332), (332, 284), (284, 251), (251, 389), (389, 356), (356, 454),
        (454, 323), (323, 361), (361, 288), (288, 397), (397, 365), (365, 379), (379, 378), (378, 400),
        (400, 377), (377, 152), (152, 148), (148, 176), (176, 149), (149, 150), (150, 136), (136, 172),
        (172, 58), (58, 132), (132, 93), (93, 234), (234, 127), (127, 162), (162, 21), (21, 54),
        (54, 103), (103, 67), (67, 109), (109, 10),
    ];

    pub const ALL: &[&[Edge]] = &[FACE_OVAL, LIPS, LEFT_BROW, RIGHT_BROW, LEFT_EYE, RIGHT_EYE, LEFT_IRIS, RIGHT_IRIS];
}

/// Landmarks of a single detected face, normalized to the frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceLandmarks {
    pub points: Vec<Point2D>,
}

impl FaceLandmarks {
    pub fn new(points: Vec<Point2D>) -> Self {
        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> GazeResult<Point2D> {
        self.points
            .get(index)
            .copied()
            .ok_or(GazeError::MissingLandmark {
                index,
                available: self.points.len(),
            })
    }

    /// Look up `index` and scale it to pixel space.
    pub fn pixel(&self, index: usize, width: f32, height: f32) -> GazeResult<Point2D> {
        Ok(self.get(index)?.to_pixels(width, height))
    }

    /// Pixel-space bounding box of every point, `None` for an empty set.
    pub fn pixel_bounds(&self, width: f32, height: f32) -> Option<Rect> {
        let mut iter = self.points.iter().map(|p| p.to_pixels(width, height));
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| {
            (
                Point2D::new(min.x.min(p.x), min.y.min(p.y)),
                Point2D::new(max.x.max(p.x), max.y.max(p.y)),
            )
        });
        Some(Rect::new(min.x, min.y, max.x - min.x, max.y - min.y))
    }

    /// Drop the iris points, leaving the base mesh.
    pub fn without_iris(mut self) -> Self {
        self.points.truncate(MESH_POINTS);
        self
    }
}
