use crate::geometry::Dim;
use crate::geometry::Pos;
use crate::window::IcccmWindowState;
use crate::window::Window;

#[derive(Debug, Default, Copy, Clone, PartialOrd)]
pub struct SizeHints {
    pub by_user: bool,
    pub pos: Option<Pos>,
    pub min_width: Option<i32>,
    pub min_height: Option<i32>,
    pub max_width: Option<i32>,
    pub max_height: Option<i32>,
    pub base_width: Option<i32>,
    pub base_height: Option<i32>,
    pub inc_width: Option<i32>,
    pub inc_height: Option<i32>,
    pub min_ratio: Option<f64>,
    pub max_ratio: Option<f64>,
    pub gravity: Option<u32>,
}

impl SizeHints {
    /// Clamp a candidate dimension into hint compliance: min/max bounds,
    /// aspect ratio, then the largest base + k*inc not exceeding the
    /// candidate along each axis.
    pub fn apply(
        &self,
        dim: &mut Dim,
    ) {
        let mut dest_width = dim.w;
        let mut dest_height = dim.h;

        if let Some(min_width) = self.min_width {
            dest_width = std::cmp::max(dest_width, min_width);
        }

        if let Some(min_height) = self.min_height {
            dest_height = std::cmp::max(dest_height, min_height);
        }

        if let Some(max_width) = self.max_width {
            dest_width = std::cmp::min(dest_width, max_width);
        }

        if let Some(max_height) = self.max_height {
            dest_height = std::cmp::min(dest_height, max_height);
        }

        let base_width = self.base_width.unwrap_or(0);
        let base_height = self.base_height.unwrap_or(0);

        let mut width = if base_width < dest_width {
            dest_width - base_width
        } else {
            dest_width
        };

        let mut height = if base_height < dest_height {
            dest_height - base_height
        } else {
            dest_height
        };

        if self.min_ratio.is_some() || self.max_ratio.is_some() {
            if height == 0 {
                height = 1;
            }

            let current_ratio = width as f64 / height as f64;
            let mut new_ratio = None;

            if let Some(min_ratio) = self.min_ratio {
                if current_ratio < min_ratio {
                    new_ratio = Some(min_ratio);
                }
            }

            if new_ratio.is_none() {
                if let Some(max_ratio) = self.max_ratio {
                    if current_ratio > max_ratio {
                        new_ratio = Some(max_ratio);
                    }
                }
            }

            if let Some(new_ratio) = new_ratio {
                height = (width as f64 / new_ratio).round() as i32;
                width = (height as f64 * new_ratio).round() as i32;

                dest_width = width + base_width;
                dest_height = height + base_height;
            }
        }

        if let Some(inc_height) = self.inc_height {
            if inc_height > 0 && dest_height >= base_height {
                dest_height -= base_height;
                dest_height -= dest_height % inc_height;
                dest_height += base_height;
            }
        }

        if let Some(inc_width) = self.inc_width {
            if inc_width > 0 && dest_width >= base_width {
                dest_width -= base_width;
                dest_width -= dest_width % inc_width;
                dest_width += base_width;
            }
        }

        dim.w = std::cmp::max(dest_width, 0i32);
        dim.h = std::cmp::max(dest_height, 0i32);
    }
}

impl PartialEq for SizeHints {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.min_width == other.min_width
            && self.min_height == other.min_height
            && self.max_width == other.max_width
            && self.max_height == other.max_height
            && self.base_width == other.base_width
            && self.base_height == other.base_height
            && self.inc_width == other.inc_width
            && self.inc_height == other.inc_height
    }
}

impl Eq for SizeHints {}

#[derive(Debug, Copy, Clone, PartialOrd, Ord, PartialEq, Eq)]
pub struct Hints {
    pub urgent: bool,
    pub input: Option<bool>,
    pub initial_state: Option<IcccmWindowState>,
    pub group: Option<Window>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_snap_down_to_base_plus_multiple() {
        let size_hints = SizeHints {
            min_width: Some(80),
            min_height: Some(25),
            base_width: Some(4),
            base_height: Some(4),
            inc_width: Some(6),
            inc_height: Some(13),
            ..Default::default()
        };

        let mut dim = Dim {
            w: 500,
            h: 400,
        };

        size_hints.apply(&mut dim);

        assert_eq!(dim.w, 496);
        assert_eq!((dim.w - 4) % 6, 0);
        assert_eq!((dim.h - 4) % 13, 0);
        assert!(dim.h <= 400);
    }

    #[test]
    fn minimum_bounds_win_over_requested() {
        let size_hints = SizeHints {
            min_width: Some(80),
            min_height: Some(25),
            ..Default::default()
        };

        let mut dim = Dim {
            w: 10,
            h: 10,
        };

        size_hints.apply(&mut dim);

        assert_eq!(
            dim,
            Dim {
                w: 80,
                h: 25,
            }
        );
    }

    #[test]
    fn maximum_bounds_cap_requested() {
        let size_hints = SizeHints {
            max_width: Some(640),
            max_height: Some(480),
            ..Default::default()
        };

        let mut dim = Dim {
            w: 1000,
            h: 1000,
        };

        size_hints.apply(&mut dim);

        assert_eq!(
            dim,
            Dim {
                w: 640,
                h: 480,
            }
        );
    }

    #[test]
    fn aspect_ratio_clamped() {
        let size_hints = SizeHints {
            min_ratio: Some(1.0),
            max_ratio: Some(2.0),
            ..Default::default()
        };

        let mut dim = Dim {
            w: 100,
            h: 400,
        };

        size_hints.apply(&mut dim);
        assert!(dim.w as f64 / dim.h as f64 >= 1.0);
    }

    #[test]
    fn hintless_apply_is_identity() {
        let size_hints = SizeHints::default();
        let mut dim = Dim {
            w: 123,
            h: 457,
        };

        size_hints.apply(&mut dim);

        assert_eq!(
            dim,
            Dim {
                w: 123,
                h: 457,
            }
        );
    }
}
