use stagehand_core::geometry::Point;

use super::{Frame, LayoutStrategy, Progress, order_by_degree};
use crate::{config::LayoutConfig, error::LayoutError, snapshot::LayoutSnapshot};

/// Arranges nodes in the cells of a grid spanning the frame.
///
/// Options: `rows`, `cols` (numbers, either may be given; the other is
/// derived), `sort_by_degree` (bool, default true) places well-connected
/// nodes first.
#[derive(Debug)]
pub struct GridLayout {
    frame: Frame,
    rows: Option<usize>,
    cols: Option<usize>,
    sort_by_degree: bool,
}

impl GridLayout {
    pub fn new(config: &LayoutConfig) -> Result<Self, LayoutError> {
        let mut layout = Self {
            frame: Frame::from_config(config),
            rows: None,
            cols: None,
            sort_by_degree: true,
        };
        layout.update_config(config)?;
        Ok(layout)
    }

    fn dimensions(&self, count: usize) -> (usize, usize) {
        match (self.rows, self.cols) {
            (Some(rows), Some(cols))
                if rows.checked_mul(cols).is_some_and(|cells| cells >= count) =>
            {
                (rows, cols)
            }
            (Some(rows), _) => (rows, count.div_ceil(rows)),
            (None, Some(cols)) => (count.div_ceil(cols), cols),
            (None, None) => {
                let cols = (count as f32).sqrt().ceil() as usize;
                (count.div_ceil(cols.max(1)), cols)
            }
        }
    }
}

fn count_option(config: &LayoutConfig, key: &str) -> Result<Option<usize>, LayoutError> {
    match config.number_option(key)? {
        Some(value) if value >= 1.0 => Ok(Some(value as usize)),
        Some(value) => Err(LayoutError::invalid_option(
            config.kind().unwrap_or("grid"),
            key,
            format!("expected at least 1, found {value}"),
        )),
        None => Ok(None),
    }
}

impl LayoutStrategy for GridLayout {
    fn update_config(&mut self, patch: &LayoutConfig) -> Result<(), LayoutError> {
        self.frame = self.frame.patched(patch);
        if let Some(rows) = count_option(patch, "rows")? {
            self.rows = Some(rows);
        }
        if let Some(cols) = count_option(patch, "cols")? {
            self.cols = Some(cols);
        }
        if let Some(sort) = patch.bool_option("sort_by_degree")? {
            self.sort_by_degree = sort;
        }
        Ok(())
    }

    fn execute(&mut self, snapshot: &mut LayoutSnapshot) -> Result<Progress, LayoutError> {
        let count = snapshot.len();
        if count == 0 {
            return Ok(Progress::Settled);
        }

        let order = if self.sort_by_degree {
            order_by_degree(snapshot)
        } else {
            (0..count).collect()
        };

        let (rows, cols) = self.dimensions(count);
        let cell_w = self.frame.size.width() / cols as f32;
        let cell_h = self.frame.size.height() / rows.max(1) as f32;
        let origin = self.frame.origin();

        for (slot, index) in order.into_iter().enumerate() {
            let (row, col) = (slot / cols, slot % cols);
            snapshot.place(
                index,
                Point::new(
                    origin.x() + (col as f32 + 0.5) * cell_w,
                    origin.y() + (row as f32 + 0.5) * cell_h,
                ),
            );
        }
        Ok(Progress::Settled)
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;
    use stagehand_core::{geometry::Size, identifier::Id};

    use super::*;
    use crate::snapshot::NodeRecord;

    fn snapshot(count: usize, edges: &[(&str, &str)]) -> LayoutSnapshot {
        LayoutSnapshot::new(
            (0..count).map(|i| NodeRecord::new(format!("n{i}"))).collect(),
            edges
                .iter()
                .map(|(s, t)| (None, Id::new(s), Id::new(t)))
                .collect::<Vec<_>>(),
            Vec::new(),
        )
    }

    #[test]
    fn test_four_nodes_form_two_by_two() {
        let config = LayoutConfig::new("grid")
            .with_option("sort_by_degree", false)
            .with_canvas_defaults(Size::new(200.0, 100.0));
        let mut s = snapshot(4, &[]);

        GridLayout::new(&config).expect("valid").execute(&mut s).expect("runs");

        assert_eq!(s.position(0), Some(Point::new(50.0, 25.0)));
        assert_eq!(s.position(3), Some(Point::new(150.0, 75.0)));
    }

    #[test]
    fn test_highest_degree_takes_first_cell() {
        let config = LayoutConfig::new("grid").with_canvas_defaults(Size::new(200.0, 100.0));
        let mut s = snapshot(3, &[("n2", "n0"), ("n2", "n1")]);

        GridLayout::new(&config).expect("valid").execute(&mut s).expect("runs");

        let hub = s.position(2).expect("placed");
        assert_approx_eq!(f32, hub.x(), 50.0);
        assert_approx_eq!(f32, hub.y(), 25.0);
    }

    #[test]
    fn test_fixed_columns() {
        let config = LayoutConfig::new("grid")
            .with_option("cols", 1)
            .with_canvas_defaults(Size::new(100.0, 300.0));
        let mut s = snapshot(3, &[]);

        GridLayout::new(&config).expect("valid").execute(&mut s).expect("runs");

        for index in 0..3 {
            assert_approx_eq!(f32, s.position(index).map_or(0.0, |p| p.x()), 50.0);
        }
    }

    #[test]
    fn test_huge_grid_does_not_overflow() {
        let config = LayoutConfig::new("grid")
            .with_option("rows", 1e19)
            .with_option("cols", 4)
            .with_canvas_defaults(Size::new(100.0, 100.0));
        let mut s = snapshot(3, &[]);

        let progress = GridLayout::new(&config).expect("valid").execute(&mut s);

        assert!(matches!(progress, Ok(Progress::Settled)));
        for index in 0..3 {
            let point = s.position(index).expect("placed");
            assert!(point.x().is_finite() && point.y().is_finite());
        }
    }

    #[test]
    fn test_zero_rows_is_invalid() {
        let config = LayoutConfig::new("grid").with_option("rows", 0);
        assert!(GridLayout::new(&config).is_err());
    }
}
