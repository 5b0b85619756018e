use crate::geometry::Pos;
use crate::geometry::Region;

/// The root window's geometry together with the per-CRTC regions reported
/// by RandR. Without RandR the screen acts as a single CRTC covering the
/// full root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    number: usize,
    full_region: Region,
    crtcs: Vec<Region>,
}

impl Screen {
    pub fn new(
        number: usize,
        full_region: Region,
        crtcs: Vec<Region>,
    ) -> Self {
        Self {
            number,
            full_region,
            crtcs: if crtcs.is_empty() {
                vec![full_region]
            } else {
                crtcs
            },
        }
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub fn full_region(&self) -> Region {
        self.full_region
    }

    pub fn set_full_region(
        &mut self,
        region: Region,
    ) {
        self.full_region = region;

        if self.crtcs.len() == 1 {
            self.crtcs = vec![region];
        }
    }

    pub fn crtcs(&self) -> &[Region] {
        &self.crtcs
    }

    pub fn set_crtcs(
        &mut self,
        crtcs: Vec<Region>,
    ) {
        self.crtcs = if crtcs.is_empty() {
            vec![self.full_region]
        } else {
            crtcs
        };
    }

    /// The CRTC containing the given position, falling back to the CRTC
    /// nearest to it.
    pub fn crtc_containing(
        &self,
        pos: Pos,
    ) -> Region {
        self.crtcs
            .iter()
            .find(|crtc| crtc.encompasses(pos))
            .copied()
            .unwrap_or_else(|| {
                self.crtcs
                    .iter()
                    .min_by_key(|crtc| {
                        Pos::from_center_of_region(**crtc).dist(pos).pythagorean()
                    })
                    .copied()
                    .unwrap_or(self.full_region)
            })
    }

    pub fn crtc_containing_region(
        &self,
        region: Region,
    ) -> Region {
        self.crtc_containing(Pos::from_center_of_region(region))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crtc_lookup_prefers_containing_monitor() {
        let screen = Screen::new(0, Region::new(0, 0, 2560, 1024), vec![
            Region::new(0, 0, 1280, 1024),
            Region::new(1280, 0, 1280, 1024),
        ]);

        assert_eq!(
            screen.crtc_containing(Pos {
                x: 1300,
                y: 10,
            }),
            Region::new(1280, 0, 1280, 1024)
        );
    }

    #[test]
    fn screen_without_crtcs_acts_as_one_monitor() {
        let screen = Screen::new(0, Region::new(0, 0, 1920, 1080), vec![]);

        assert_eq!(screen.crtcs(), &[Region::new(0, 0, 1920, 1080)]);
        assert_eq!(
            screen.crtc_containing(Pos {
                x: 5000,
                y: 5000,
            }),
            Region::new(0, 0, 1920, 1080)
        );
    }
}
