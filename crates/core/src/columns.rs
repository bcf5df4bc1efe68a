//! Column split detection and zone partitioning.
//!
//! A page is modelled as an optional single-column band at the top (title
//! block, abstract) followed by a two-column body. The boundary is the first
//! line that starts in the right half of the page.

use crate::types::{Snippet, Zone};

/// Find the y coordinate where the two-column body starts.
///
/// Returns `page_height` when no snippet starts right of `midpoint`, which
/// puts every snippet in [`Zone::Top`]. Otherwise the topmost right-half
/// baseline, lifted by `buffer` so the whole of that line sits below the
/// split.
pub fn detect_split_y(snippets: &[Snippet], midpoint: f32, page_height: f32, buffer: f32) -> f32 {
    snippets
        .iter()
        .filter(|s| s.x > midpoint)
        .map(|s| s.y)
        .reduce(f32::min)
        .map_or(page_height, |y| y - buffer)
}

/// Zone of a single snippet.
pub fn classify(snippet: &Snippet, split_y: f32, midpoint: f32) -> Zone {
    if snippet.y < split_y {
        Zone::Top
    } else if snippet.center < midpoint {
        Zone::Left
    } else {
        Zone::Right
    }
}

/// Snippets of one page split by zone. Input order is kept within a zone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Zones {
    pub top: Vec<Snippet>,
    pub left: Vec<Snippet>,
    pub right: Vec<Snippet>,
}

impl Zones {
    pub fn get(&self, zone: Zone) -> &[Snippet] {
        match zone {
            Zone::Top => &self.top,
            Zone::Left => &self.left,
            Zone::Right => &self.right,
        }
    }

    pub fn take(&mut self, zone: Zone) -> Vec<Snippet> {
        match zone {
            Zone::Top => std::mem::take(&mut self.top),
            Zone::Left => std::mem::take(&mut self.left),
            Zone::Right => std::mem::take(&mut self.right),
        }
    }

    pub fn len(&self) -> usize {
        self.top.len() + self.left.len() + self.right.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn partition(snippets: Vec<Snippet>, split_y: f32, midpoint: f32) -> Zones {
    let mut zones = Zones::default();
    for snippet in snippets {
        match classify(&snippet, split_y, midpoint) {
            Zone::Top => zones.top.push(snippet),
            Zone::Left => zones.left.push(snippet),
            Zone::Right => zones.right.push(snippet),
        }
    }
    zones
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDTH: f32 = 612.0;
    const HEIGHT: f32 = 792.0;
    const MID: f32 = WIDTH / 2.0;

    fn snippet(text: &str, x: f32, width: f32, y: f32) -> Snippet {
        Snippet {
            text: text.to_string(),
            x,
            y,
            center: x + width / 2.0,
        }
    }

    #[test]
    fn test_no_right_column_keeps_page_height() {
        let snippets = vec![
            snippet("a", 72.0, 400.0, 100.0),
            snippet("b", 72.0, 400.0, 700.0),
        ];
        assert_eq!(detect_split_y(&snippets, MID, HEIGHT, 10.0), HEIGHT);
    }

    #[test]
    fn test_empty_page_keeps_page_height() {
        assert_eq!(detect_split_y(&[], MID, HEIGHT, 10.0), HEIGHT);
    }

    #[test]
    fn test_split_is_topmost_right_line_minus_buffer() {
        let snippets = vec![
            snippet("abstract", 72.0, 468.0, 80.0),
            snippet("right lower", 320.0, 220.0, 400.0),
            snippet("right top", 320.0, 220.0, 150.0),
            snippet("left", 72.0, 220.0, 160.0),
        ];
        assert_eq!(detect_split_y(&snippets, MID, HEIGHT, 10.0), 140.0);
    }

    #[test]
    fn test_split_uses_left_edge_not_center() {
        // Centered on the right half but starting left of the midpoint.
        let snippets = vec![snippet("wide", 280.0, 200.0, 150.0)];
        assert_eq!(detect_split_y(&snippets, MID, HEIGHT, 10.0), HEIGHT);
    }

    #[test]
    fn test_snippet_exactly_at_midpoint_does_not_split() {
        let snippets = vec![snippet("edge", MID, 100.0, 150.0)];
        assert_eq!(detect_split_y(&snippets, MID, HEIGHT, 10.0), HEIGHT);
    }

    #[test]
    fn test_classify_zones() {
        let split = 140.0;
        assert_eq!(classify(&snippet("t", 72.0, 468.0, 80.0), split, MID), Zone::Top);
        assert_eq!(classify(&snippet("l", 72.0, 220.0, 160.0), split, MID), Zone::Left);
        assert_eq!(classify(&snippet("r", 320.0, 220.0, 150.0), split, MID), Zone::Right);
    }

    #[test]
    fn test_classify_boundaries() {
        // y == split_y is not above the split; center == midpoint goes right.
        let s = snippet("boundary", MID - 50.0, 100.0, 140.0);
        assert_eq!(classify(&s, 140.0, MID), Zone::Right);
    }

    #[test]
    fn test_partition_is_exhaustive_and_disjoint() {
        let snippets = vec![
            snippet("t1", 72.0, 468.0, 80.0),
            snippet("t2", 72.0, 468.0, 95.0),
            snippet("l1", 72.0, 220.0, 160.0),
            snippet("r1", 320.0, 220.0, 150.0),
            snippet("r2", 320.0, 220.0, 170.0),
        ];
        let split = detect_split_y(&snippets, MID, HEIGHT, 10.0);
        let zones = partition(snippets.clone(), split, MID);

        assert_eq!(zones.len(), snippets.len());
        assert_eq!(zones.top.iter().map(|s| s.text.as_str()).collect::<Vec<_>>(), ["t1", "t2"]);
        assert_eq!(zones.left.iter().map(|s| s.text.as_str()).collect::<Vec<_>>(), ["l1"]);
        assert_eq!(zones.right.iter().map(|s| s.text.as_str()).collect::<Vec<_>>(), ["r1", "r2"]);
    }

    #[test]
    fn test_single_column_page_is_all_top() {
        let snippets = vec![
            snippet("a", 72.0, 468.0, 100.0),
            snippet("b", 72.0, 468.0, 780.0),
        ];
        let split = detect_split_y(&snippets, MID, HEIGHT, 10.0);
        let zones = partition(snippets, split, MID);
        assert_eq!(zones.top.len(), 2);
        assert!(zones.left.is_empty());
        assert!(zones.right.is_empty());
    }

    #[test]
    fn test_take_empties_zone() {
        let mut zones = partition(vec![snippet("l", 72.0, 100.0, 300.0)], 200.0, MID);
        assert_eq!(zones.get(Zone::Left).len(), 1);
        let taken = zones.take(Zone::Left);
        assert_eq!(taken.len(), 1);
        assert!(zones.is_empty());
    }
}
