// src/buffer/selection.rs

//! Text selection over the visible grid.

use std::cmp::{max, min};

/// Represents a 2D point in the visible grid, (column, row), 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: usize,
    pub y: usize,
}

impl Point {
    pub fn new(x: usize, y: usize) -> Self {
        Point { x, y }
    }
}

/// Represents the mode of text selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    #[default]
    Normal, // Character-wise, wrapping across rows
    Block, // Rectangular block selection
}

/// Represents the state of text selection over the visible grid.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Selection {
    /// Start point of the selection. Set when selection begins.
    pub start: Option<Point>,
    /// End point of the selection. Updated as the pointer moves.
    pub end: Option<Point>,
    pub mode: SelectionMode,
    /// Whether a selection is currently being dragged.
    pub is_active: bool,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new selection at `point`.
    pub fn start_selection(&mut self, point: Point, mode: SelectionMode) {
        self.start = Some(point);
        self.end = Some(point);
        self.mode = mode;
        self.is_active = true;
        log::debug!("Selection started at {:?} mode {:?}", point, mode);
    }

    /// Moves the end point of an active selection.
    pub fn update_selection(&mut self, point: Point) {
        if self.is_active {
            self.end = Some(point);
        }
    }

    /// Stops dragging. The selected range stays.
    pub fn end_selection(&mut self) {
        if self.is_active {
            self.is_active = false;
            log::debug!("Selection ended. Start: {:?}, End: {:?}", self.start, self.end);
        }
    }

    pub fn clear_selection(&mut self) {
        self.start = None;
        self.end = None;
        self.is_active = false;
        log::debug!("Selection cleared.");
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() || self.end.is_none()
    }

    /// Returns true if the cell at `(x, y)` is inside the selection.
    pub fn contains(&self, x: usize, y: usize) -> bool {
        let (Some(start), Some(end)) = (self.start, self.end) else {
            return false;
        };

        match self.mode {
            SelectionMode::Block => {
                let (left, right) = (min(start.x, end.x), max(start.x, end.x));
                let (top, bottom) = (min(start.y, end.y), max(start.y, end.y));
                (left..=right).contains(&x) && (top..=bottom).contains(&y)
            }
            SelectionMode::Normal => {
                // Order the endpoints so `first` comes before `last` in reading order.
                let (first, last) = if (start.y, start.x) <= (end.y, end.x) {
                    (start, end)
                } else {
                    (end, start)
                };
                if y < first.y || y > last.y {
                    return false;
                }
                let after_first = y > first.y || x >= first.x;
                let before_last = y < last.y || x <= last.x;
                after_first && before_last
            }
        }
    }
}
