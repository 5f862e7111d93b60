//! Drawing primitives accumulated for host canvases.
//!
//! Stories do not render anything. The drawing intrinsics append shapes
//! to named lists, and the host reads or drains those lists however it
//! likes.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A primitive shape queued for a host canvas.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Shape {
    /// An axis-aligned rectangle.
    Rect {
        /// Left edge.
        x: i64,
        /// Top edge.
        y: i64,
        /// Width in host units.
        width: i64,
        /// Height in host units.
        height: i64,
        /// Fill color name.
        fill: String,
        /// Stroke color name.
        stroke: String,
        /// Stroke width in host units.
        stroke_width: i64,
    },
    /// An ellipse inscribed in the given bounding box.
    Ellipse {
        /// Left edge of the bounding box.
        x: i64,
        /// Top edge of the bounding box.
        y: i64,
        /// Width of the bounding box.
        width: i64,
        /// Height of the bounding box.
        height: i64,
        /// Fill color name.
        fill: String,
        /// Stroke color name.
        stroke: String,
        /// Stroke width in host units.
        stroke_width: i64,
    },
}

/// Named draw lists in canvas creation order.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Drawings {
    canvases: Vec<(String, Vec<Shape>)>,
}

impl Drawings {
    /// Creates an empty set of draw lists.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a shape to a canvas, creating the canvas on first use.
    pub fn push(&mut self, canvas: &str, shape: Shape) {
        if let Some((_, shapes)) = self.canvases.iter_mut().find(|(name, _)| name == canvas) {
            shapes.push(shape);
            return;
        }
        self.canvases.push((canvas.to_string(), vec![shape]));
    }

    /// Returns the shapes queued for a canvas, oldest first.
    #[must_use]
    pub fn canvas(&self, name: &str) -> &[Shape] {
        self.canvases
            .iter()
            .find(|(canvas, _)| canvas == name)
            .map_or(&[], |(_, shapes)| shapes.as_slice())
    }

    /// Iterates canvases in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Shape])> + '_ {
        self.canvases
            .iter()
            .map(|(name, shapes)| (name.as_str(), shapes.as_slice()))
    }

    /// Number of canvases that have received at least one shape.
    #[must_use]
    pub fn len(&self) -> usize {
        self.canvases.len()
    }

    /// Whether no canvas has been drawn to.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.canvases.is_empty()
    }

    /// Drops every queued shape, keeping nothing.
    pub fn clear(&mut self) {
        self.canvases.clear();
    }
}
