use rayon::prelude::*;

use crate::types::{Point, Stroke};

/// Where an erase request came from. Each source erases with its own radius.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EraseSource {
    Finger,
    Pointer,
}

/// Returns the points lying strictly farther than `radius` from `center`.
pub fn erase(points: &[Point], center: Point, radius: f32) -> Vec<Point> {
    points
        .iter()
        .copied()
        .filter(|p| p.distance(center) > radius)
        .collect()
}

/// Erases around `center` in every stroke and drops strokes left empty.
/// Stroke order is preserved. Returns the number of points removed.
pub fn erase_strokes(strokes: &mut Vec<Stroke>, center: Point, radius: f32) -> usize {
    let removed = strokes
        .par_iter_mut()
        .map(|stroke| {
            let kept = erase(&stroke.points, center, radius);
            let removed = stroke.points.len() - kept.len();
            if removed > 0 {
                stroke.points = kept;
            }
            removed
        })
        .sum::<usize>();

    if removed > 0 {
        strokes.retain(|stroke| !stroke.points.is_empty());
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f32::consts::TAU;

    fn stroke(points: &[(f32, f32)]) -> Stroke {
        Stroke {
            points: points.iter().copied().map(Point::from).collect(),
            color: [255, 255, 255, 255],
            size: 5.0,
        }
    }

    #[test]
    fn removes_points_on_the_boundary() {
        let points = [Point::new(10.0, 0.0), Point::new(10.5, 0.0)];
        let kept = erase(&points, Point::new(0.0, 0.0), 10.0);
        assert_eq!(kept, vec![Point::new(10.5, 0.0)]);
    }

    #[test]
    fn leaves_input_untouched() {
        let points = vec![Point::new(1.0, 1.0), Point::new(50.0, 50.0)];
        let kept = erase(&points, Point::new(0.0, 0.0), 5.0);
        assert_eq!(points.len(), 2);
        assert_eq!(kept, vec![Point::new(50.0, 50.0)]);
    }

    #[test]
    fn erasing_the_start_of_a_segment() {
        let mut strokes = vec![stroke(&[(0.0, 0.0), (100.0, 0.0)])];
        let removed = erase_strokes(&mut strokes, Point::new(0.0, 0.0), 10.0);
        assert_eq!(removed, 1);
        assert_eq!(strokes[0].points, vec![Point::new(100.0, 0.0)]);
    }

    #[test]
    fn empty_strokes_are_dropped_in_order() {
        let mut strokes = vec![
            stroke(&[(0.0, 0.0)]),
            stroke(&[(1.0, 1.0), (300.0, 300.0)]),
            stroke(&[(2.0, 2.0), (3.0, 3.0)]),
            stroke(&[(400.0, 400.0)]),
        ];
        let removed = erase_strokes(&mut strokes, Point::new(0.0, 0.0), 10.0);
        assert_eq!(removed, 4);
        assert_eq!(strokes.len(), 2);
        assert_eq!(strokes[0].points, vec![Point::new(300.0, 300.0)]);
        assert_eq!(strokes[1].points, vec![Point::new(400.0, 400.0)]);
    }

    #[test]
    fn radius_larger_than_canvas_clears_everything() {
        let mut strokes = vec![stroke(&[(0.0, 0.0), (640.0, 480.0)])];
        erase_strokes(&mut strokes, Point::new(320.0, 240.0), 10_000.0);
        assert!(strokes.is_empty());
    }

    proptest! {
        #[test]
        fn keeps_exactly_the_points_outside_the_radius(
            center in (-500.0f32..500.0, -500.0f32..500.0),
            radius in 1.0f32..300.0,
            samples in prop::collection::vec((0.0f32..TAU, 0.0f32..1.0, any::<bool>()), 0..64),
        ) {
            let center = Point::from(center);
            // Inside points sit within 0.99 r, outside ones beyond 1.01 r.
            let placed: Vec<(Point, bool)> = samples
                .into_iter()
                .map(|(angle, t, outside)| {
                    let d = if outside { radius * (1.01 + 2.0 * t) } else { radius * 0.99 * t };
                    let p = Point::new(center.x + d * angle.cos(), center.y + d * angle.sin());
                    (p, outside)
                })
                .collect();
            let points: Vec<Point> = placed.iter().map(|(p, _)| *p).collect();

            let kept = erase(&points, center, radius);

            let outside: Vec<Point> = placed
                .iter()
                .filter(|(_, outside)| *outside)
                .map(|(p, _)| *p)
                .collect();
            prop_assert_eq!(kept, outside);
        }
    }
}
