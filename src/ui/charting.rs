use ratatui::style::Color;

use crate::dataset::Category;

/// Category colors shared by every trajectory plot
pub fn category_color(category: Category) -> Color {
    match category {
        Category::Similar => Color::Blue,
        Category::Unrelated => Color::Red,
        Category::Gibberish => Color::Green,
    }
}

/// Padded `[min, max]` bounds for the x and y values of `points`.
/// Degenerate ranges are widened so the axis never collapses.
pub fn compute_bounds(points: &[(f64, f64)]) -> ([f64; 2], [f64; 2]) {
    let axis = |values: &mut dyn Iterator<Item = f64>| {
        let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if !lo.is_finite() || !hi.is_finite() {
            return [-1.0, 1.0];
        }
        let pad = ((hi - lo) * 0.05).max(1.0);
        [lo - pad, hi + pad]
    };

    (
        axis(&mut points.iter().map(|p| p.0)),
        axis(&mut points.iter().map(|p| p.1)),
    )
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_bounds_empty() {
        assert_eq!(compute_bounds(&[]), ([-1.0, 1.0], [-1.0, 1.0]));
    }

    #[test]
    fn test_compute_bounds_single_point_is_widened() {
        let (x, y) = compute_bounds(&[(0.0, 0.0)]);
        assert_eq!(x, [-1.0, 1.0]);
        assert_eq!(y, [-1.0, 1.0]);
    }

    #[test]
    fn test_compute_bounds_contains_all_points() {
        let points = [(-30.0, 4.0), (50.0, -8.0), (10.0, 0.0)];
        let (x, y) = compute_bounds(&points);
        assert!(x[0] < -30.0 && x[1] > 50.0);
        assert!(y[0] < -8.0 && y[1] > 4.0);
    }

    #[test]
    fn test_category_colors_distinct() {
        assert_ne!(
            category_color(Category::Similar),
            category_color(Category::Unrelated)
        );
        assert_ne!(
            category_color(Category::Unrelated),
            category_color(Category::Gibberish)
        );
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label(1.0), "1");
        assert_eq!(format_label(1.2345), "1.23");
    }
}
