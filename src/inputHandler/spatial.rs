// Geometry used for hit-testing pointer input and interpolating window frames

use super::types::{ChromeMargins, Frame, Point, ScreenBounds, Size};

/// Check whether `point` lies in the inclusive box spanned by `top_left` and `bottom_right`
pub fn contains_inclusive(top_left: Point, bottom_right: Point, point: Point) -> bool {
    point.x >= top_left.x
        && point.x <= bottom_right.x
        && point.y >= top_left.y
        && point.y <= bottom_right.y
}

/// Hit box of a normal (or minimized) window
///
/// The box runs from the stored position to `position + size + padding`, where
/// padding covers the title bar and frame rows.
pub fn window_contains(home: &Frame, padding: i32, point: Point) -> bool {
    let bottom_right = Point::new(
        home.position.x + home.size.width,
        home.position.y + home.size.height + padding,
    );
    contains_inclusive(home.position, bottom_right, point)
}

/// Hit box of a maximized window: every column, minus the chrome rows
pub fn maximized_contains(bounds: ScreenBounds, chrome: ChromeMargins, point: Point) -> bool {
    let columns = i32::from(bounds.columns);
    let rows = i32::from(bounds.rows);

    point.x >= 0 && point.x < columns && point.y > chrome.top && point.y < rows - chrome.bottom
}

/// Size a maximized window grows to
pub fn maximized_size(bounds: ScreenBounds, chrome: ChromeMargins, has_title_bar: bool) -> Size {
    let title_rows = if has_title_bar { 1 } else { 0 };
    Size::new(
        i32::from(bounds.columns),
        (i32::from(bounds.rows) - chrome.top - chrome.bottom - title_rows).max(0),
    )
}

/// Top-left position that centers `size` on the screen
pub fn centered(size: Size, bounds: ScreenBounds) -> Point {
    Point::new(
        i32::from(bounds.columns) / 2 - size.width / 2,
        i32::from(bounds.rows) / 2 - size.height / 2,
    )
}

/// Linear interpolation between two cell values, rounded to the nearest cell
fn lerp(from: i32, to: i32, t: f64) -> i32 {
    let t = t.clamp(0.0, 1.0);
    (f64::from(from) + (f64::from(to) - f64::from(from)) * t).round() as i32
}

/// Interpolate every component of a frame; `t` runs from 0.0 (start) to 1.0 (target)
pub fn interpolate(from: &Frame, to: &Frame, t: f64) -> Frame {
    Frame::new(
        Point::new(
            lerp(from.position.x, to.position.x, t),
            lerp(from.position.y, to.position.y, t),
        ),
        Size::new(
            lerp(from.size.width, to.size.width, t),
            lerp(from.size.height, to.size.height, t),
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn home() -> Frame {
        Frame::new(Point::new(10, 5), Size::new(50, 12))
    }

    #[test]
    fn test_window_contains_edges() {
        let frame = home();

        // Reflexive at the stored position, inclusive at the far corner
        assert!(window_contains(&frame, 4, Point::new(10, 5)));
        assert!(window_contains(&frame, 4, Point::new(60, 21)));

        // One past the padded corner is outside
        assert!(!window_contains(&frame, 4, Point::new(61, 22)));
        assert!(!window_contains(&frame, 3, Point::new(60, 21)));
        assert!(!window_contains(&frame, 4, Point::new(9, 5)));
    }

    #[test]
    fn test_maximized_contains_excludes_chrome() {
        let bounds = ScreenBounds::new(80, 24);
        let chrome = ChromeMargins::default();

        assert!(!maximized_contains(bounds, chrome, Point::new(5, 3)));
        assert!(maximized_contains(bounds, chrome, Point::new(5, 4)));
        assert!(maximized_contains(bounds, chrome, Point::new(79, 22)));
        assert!(!maximized_contains(bounds, chrome, Point::new(5, 23)));
        assert!(!maximized_contains(bounds, chrome, Point::new(80, 10)));
    }

    #[test]
    fn test_maximized_size() {
        let bounds = ScreenBounds::new(211, 53);
        let chrome = ChromeMargins::default();

        assert_eq!(maximized_size(bounds, chrome, true), Size::new(211, 48));
        assert_eq!(maximized_size(bounds, chrome, false), Size::new(211, 49));
        assert_eq!(
            maximized_size(ScreenBounds::new(10, 2), chrome, true),
            Size::new(10, 0)
        );
    }

    #[test]
    fn test_centered() {
        let position = centered(Size::new(50, 12), ScreenBounds::new(211, 53));
        assert_eq!(position, Point::new(80, 20));
    }

    #[test]
    fn test_interpolate() {
        let from = home();
        let to = Frame::new(Point::ORIGIN, Size::ZERO);

        assert_eq!(interpolate(&from, &to, 0.0), from);
        assert_eq!(interpolate(&from, &to, 1.0), to);
        assert_eq!(
            interpolate(&from, &to, 0.5),
            Frame::new(Point::new(5, 3), Size::new(25, 6))
        );

        // Out-of-range progress is clamped
        assert_eq!(interpolate(&from, &to, 1.5), to);
    }
}
