use rand::{Rng, SeedableRng, rngs::StdRng};

use stagehand_core::geometry::Point;

use super::{Frame, LayoutStrategy, Progress};
use crate::{config::LayoutConfig, error::LayoutError, snapshot::LayoutSnapshot};

/// Places every node uniformly at random inside the frame.
///
/// Options: `seed` (number) for reproducible placement.
#[derive(Debug)]
pub struct RandomLayout {
    frame: Frame,
    seed: Option<u64>,
}

impl RandomLayout {
    pub fn new(config: &LayoutConfig) -> Result<Self, LayoutError> {
        let mut layout = Self {
            frame: Frame::from_config(config),
            seed: None,
        };
        layout.update_config(config)?;
        Ok(layout)
    }
}

impl LayoutStrategy for RandomLayout {
    fn update_config(&mut self, patch: &LayoutConfig) -> Result<(), LayoutError> {
        self.frame = self.frame.patched(patch);
        if let Some(seed) = patch.number_option("seed")? {
            self.seed = Some(seed.max(0.0) as u64);
        }
        Ok(())
    }

    fn execute(&mut self, snapshot: &mut LayoutSnapshot) -> Result<Progress, LayoutError> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(rand::random::<u64>()),
        };
        let origin = self.frame.origin();
        let size = self.frame.size;
        for index in 0..snapshot.len() {
            let point = Point::new(
                origin.x() + rng.random::<f32>() * size.width(),
                origin.y() + rng.random::<f32>() * size.height(),
            );
            snapshot.place(index, point);
        }
        Ok(Progress::Settled)
    }
}

#[cfg(test)]
mod tests {
    use stagehand_core::geometry::{Bounds, Size};

    use super::*;
    use crate::snapshot::NodeRecord;

    #[test]
    fn test_places_inside_canvas() {
        let config = LayoutConfig::new("random").with_canvas_defaults(Size::new(800.0, 600.0));
        let mut layout = RandomLayout::new(&config).expect("valid config");
        let mut snapshot = LayoutSnapshot::new(
            (0..20).map(|i| NodeRecord::new(format!("n{i}"))).collect(),
            Vec::new(),
            Vec::new(),
        );

        assert_eq!(layout.execute(&mut snapshot), Ok(Progress::Settled));

        let canvas = Bounds::new_from_center(Point::new(400.0, 300.0), Size::new(800.0, 600.0));
        for index in 0..snapshot.len() {
            let point = snapshot.position(index).expect("placed");
            assert!(canvas.contains(point), "{point:?} outside canvas");
        }
    }

    #[test]
    fn test_seed_is_reproducible() {
        let config = LayoutConfig::new("random")
            .with_option("seed", 42)
            .with_canvas_defaults(Size::new(100.0, 100.0));
        let nodes: Vec<NodeRecord> = (0..5).map(|i| NodeRecord::new(format!("n{i}"))).collect();
        let mut first = LayoutSnapshot::new(nodes.clone(), Vec::new(), Vec::new());
        let mut second = LayoutSnapshot::new(nodes, Vec::new(), Vec::new());

        RandomLayout::new(&config).expect("valid").execute(&mut first).expect("runs");
        RandomLayout::new(&config).expect("valid").execute(&mut second).expect("runs");

        assert_eq!(first.positions_or_origin(), second.positions_or_origin());
    }

    #[test]
    fn test_rejects_non_numeric_seed() {
        let config = LayoutConfig::new("random").with_option("seed", "abc");
        assert!(matches!(
            RandomLayout::new(&config),
            Err(LayoutError::InvalidOption { .. })
        ));
    }
}
