use std::f32::consts::TAU;

use super::{Frame, LayoutStrategy, Progress, order_by_degree};
use crate::{config::LayoutConfig, error::LayoutError, snapshot::LayoutSnapshot};

/// Places nodes evenly on a circle around the frame center.
///
/// Options: `radius` (default: 40% of the shorter canvas side),
/// `start_angle` (radians, default 0), `clockwise` (default true),
/// `ordering` (`"degree"` to place well-connected nodes first).
#[derive(Debug)]
pub struct CircularLayout {
    frame: Frame,
    radius: Option<f32>,
    start_angle: f32,
    clockwise: bool,
    by_degree: bool,
}

impl CircularLayout {
    pub fn new(config: &LayoutConfig) -> Result<Self, LayoutError> {
        let mut layout = Self {
            frame: Frame::from_config(config),
            radius: None,
            start_angle: 0.0,
            clockwise: true,
            by_degree: false,
        };
        layout.update_config(config)?;
        Ok(layout)
    }

    fn radius(&self) -> f32 {
        self.radius.unwrap_or(self.frame.min_side() * 0.4)
    }
}

impl LayoutStrategy for CircularLayout {
    fn update_config(&mut self, patch: &LayoutConfig) -> Result<(), LayoutError> {
        self.frame = self.frame.patched(patch);
        if let Some(radius) = patch.number_option("radius")? {
            self.radius = Some(radius.abs());
        }
        if let Some(angle) = patch.number_option("start_angle")? {
            self.start_angle = angle;
        }
        if let Some(clockwise) = patch.bool_option("clockwise")? {
            self.clockwise = clockwise;
        }
        if let Some(ordering) = patch.text_option("ordering")? {
            self.by_degree = ordering == "degree";
        }
        Ok(())
    }

    fn execute(&mut self, snapshot: &mut LayoutSnapshot) -> Result<Progress, LayoutError> {
        let count = snapshot.len();
        if count == 1 {
            snapshot.place(0, self.frame.center);
            return Ok(Progress::Settled);
        }

        let order = if self.by_degree {
            order_by_degree(snapshot)
        } else {
            (0..count).collect()
        };

        let step = TAU / count as f32;
        let direction = if self.clockwise { 1.0 } else { -1.0 };
        let radius = self.radius();
        for (slot, index) in order.into_iter().enumerate() {
            let angle = self.start_angle + direction * step * slot as f32;
            snapshot.place(index, self.frame.center.polar_offset(radius, angle));
        }
        Ok(Progress::Settled)
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;
    use stagehand_core::geometry::{Point, Size};

    use super::*;
    use crate::snapshot::NodeRecord;

    fn nodes(count: usize) -> LayoutSnapshot {
        LayoutSnapshot::new(
            (0..count).map(|i| NodeRecord::new(format!("n{i}"))).collect(),
            Vec::new(),
            Vec::new(),
        )
    }

    #[test]
    fn test_nodes_lie_on_radius() {
        let config = LayoutConfig::new("circular")
            .with_option("radius", 100)
            .with_canvas_defaults(Size::new(800.0, 600.0));
        let mut s = nodes(6);

        CircularLayout::new(&config).expect("valid").execute(&mut s).expect("runs");

        let center = Point::new(400.0, 300.0);
        for index in 0..6 {
            let point = s.position(index).expect("placed");
            assert_approx_eq!(f32, point.sub_point(center).hypot(), 100.0, epsilon = 0.01);
        }
        let first = s.position(0).expect("placed");
        assert_approx_eq!(f32, first.x(), 500.0, epsilon = 0.01);
    }

    #[test]
    fn test_single_node_sits_on_center() {
        let config = LayoutConfig::new("circular").with_canvas_defaults(Size::new(100.0, 100.0));
        let mut s = nodes(1);

        CircularLayout::new(&config).expect("valid").execute(&mut s).expect("runs");

        assert_eq!(s.position(0), Some(Point::new(50.0, 50.0)));
    }

    #[test]
    fn test_update_changes_only_patched_keys() {
        let config = LayoutConfig::new("circular")
            .with_option("radius", 10)
            .with_option("clockwise", false)
            .with_canvas_defaults(Size::new(100.0, 100.0));
        let mut layout = CircularLayout::new(&config).expect("valid");

        layout
            .update_config(&LayoutConfig::default().with_option("radius", 20))
            .expect("valid patch");

        assert_approx_eq!(f32, layout.radius(), 20.0);
        assert!(!layout.clockwise);
    }
}
