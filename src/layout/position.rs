use crate::config::LayoutConfig;

use super::types::{Direction, Point};

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Placement {
    /// Top-left corner per node index.
    pub(crate) positions: Vec<Point>,
    pub(crate) width: f32,
    pub(crate) height: f32,
}

/// Converts ordered layer buckets into pixel positions. Layers run along the main axis of
/// `direction`; every layer is centered on the cross axis against the longest one.
pub(crate) fn assign_coordinates(
    buckets: &[Vec<usize>],
    node_count: usize,
    direction: Direction,
    config: &LayoutConfig,
) -> Placement {
    let mut positions = vec![Point::ZERO; node_count];
    if buckets.is_empty() {
        return Placement {
            positions,
            width: 0.0,
            height: 0.0,
        };
    }

    // Main axis = layer progression, cross axis = order inside a layer.
    let (cross_size, cross_gap, main_size, main_gap) = match direction {
        Direction::TopBottom => (
            config.node_width,
            config.horizontal_gap,
            config.node_height,
            config.vertical_gap,
        ),
        Direction::LeftRight => (
            config.node_height,
            config.vertical_gap,
            config.node_width,
            config.horizontal_gap,
        ),
    };
    let span = |count: usize| -> f32 {
        if count == 0 {
            0.0
        } else {
            count as f32 * cross_size + (count - 1) as f32 * cross_gap
        }
    };

    let max_span = buckets
        .iter()
        .map(|bucket| span(bucket.len()))
        .fold(0.0f32, f32::max);

    let mut main_cursor = 0.0f32;
    for bucket in buckets {
        let mut cross_cursor = (max_span - span(bucket.len())) / 2.0;
        for idx in bucket {
            positions[*idx] = match direction {
                Direction::TopBottom => Point::new(cross_cursor, main_cursor),
                Direction::LeftRight => Point::new(main_cursor, cross_cursor),
            };
            cross_cursor += cross_size + cross_gap;
        }
        main_cursor += main_size + main_gap;
    }
    let main_extent = (main_cursor - main_gap).max(0.0);

    let (width, height) = match direction {
        Direction::TopBottom => (max_span, main_extent),
        Direction::LeftRight => (main_extent, max_span),
    };
    Placement {
        positions,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LayoutConfig {
        LayoutConfig::default()
    }

    #[test]
    fn top_bottom_centers_rows_against_widest() {
        let cfg = config();
        let buckets = vec![vec![0], vec![1, 2]];
        let placement = assign_coordinates(&buckets, 3, Direction::TopBottom, &cfg);
        let widest = 2.0 * cfg.node_width + cfg.horizontal_gap;
        assert_eq!(placement.width, widest);
        assert_eq!(placement.height, 2.0 * cfg.node_height + cfg.vertical_gap);
        assert_eq!(
            placement.positions[0],
            Point::new((widest - cfg.node_width) / 2.0, 0.0)
        );
        assert_eq!(
            placement.positions[1],
            Point::new(0.0, cfg.node_height + cfg.vertical_gap)
        );
        assert_eq!(
            placement.positions[2],
            Point::new(
                cfg.node_width + cfg.horizontal_gap,
                cfg.node_height + cfg.vertical_gap
            )
        );
    }

    #[test]
    fn left_right_centers_columns_against_tallest() {
        let cfg = config();
        let buckets = vec![vec![0, 1, 2], vec![3]];
        let placement = assign_coordinates(&buckets, 4, Direction::LeftRight, &cfg);
        let tallest = 3.0 * cfg.node_height + 2.0 * cfg.vertical_gap;
        assert_eq!(placement.height, tallest);
        assert_eq!(placement.width, 2.0 * cfg.node_width + cfg.horizontal_gap);
        assert_eq!(
            placement.positions[3],
            Point::new(
                cfg.node_width + cfg.horizontal_gap,
                (tallest - cfg.node_height) / 2.0
            )
        );
        assert_eq!(
            placement.positions[2],
            Point::new(0.0, 2.0 * (cfg.node_height + cfg.vertical_gap))
        );
    }

    #[test]
    fn single_node_has_node_extent() {
        let cfg = config();
        let placement = assign_coordinates(&[vec![0]], 1, Direction::TopBottom, &cfg);
        assert_eq!(placement.width, cfg.node_width);
        assert_eq!(placement.height, cfg.node_height);
        assert_eq!(placement.positions[0], Point::ZERO);
    }

    #[test]
    fn no_layers_means_empty_extent() {
        let placement = assign_coordinates(&[], 0, Direction::LeftRight, &config());
        assert_eq!((placement.width, placement.height), (0.0, 0.0));
    }
}
