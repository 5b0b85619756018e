use crate::defaults;
use crate::defaults::Color;

use winsys::geometry::Dim;
use winsys::geometry::Extents;
use winsys::geometry::Region;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ColorScheme {
    pub regular: Color,
    pub focused: Color,
    pub urgent: Color,
}

impl ColorScheme {
    pub const DEFAULT: Self = Self {
        regular: defaults::REGULAR_BORDER_COLOR,
        focused: defaults::FOCUSED_BORDER_COLOR,
        urgent: defaults::URGENT_BORDER_COLOR,
    };
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Frame decoration metrics: a uniform border and a titlebar strip along
/// the frame's top edge, inside the border.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Decoration {
    pub border_width: i32,
    pub titlebar_height: i32,
    pub colors: ColorScheme,
}

impl Decoration {
    pub const DEFAULT: Self = Self {
        border_width: defaults::BORDER_WIDTH,
        titlebar_height: defaults::TITLEBAR_HEIGHT,
        colors: ColorScheme::DEFAULT,
    };

    pub fn extents(&self) -> Extents {
        Extents {
            left: self.border_width,
            right: self.border_width,
            top: self.border_width + self.titlebar_height,
            bottom: self.border_width,
        }
    }

    /// The titlebar's dimensions within a frame of the given region.
    pub fn titlebar_dim(
        &self,
        frame_region: Region,
    ) -> Dim {
        Dim {
            w: frame_region.dim.w,
            h: self.titlebar_height,
        }
    }
}

impl Default for Decoration {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extents_account_for_titlebar_on_top_only() {
        let decoration = Decoration::DEFAULT;
        let extents = decoration.extents();

        assert_eq!(extents.top, decoration.border_width + decoration.titlebar_height);
        assert_eq!(extents.left, decoration.border_width);
        assert_eq!(extents.right, decoration.border_width);
        assert_eq!(extents.bottom, decoration.border_width);
    }

    #[test]
    fn titlebar_spans_frame_width() {
        let decoration = Decoration::DEFAULT;
        let dim = decoration.titlebar_dim(Region::new(0, 0, 640, 480));

        assert_eq!(dim.w, 640);
        assert_eq!(dim.h, decoration.titlebar_height);
    }
}
