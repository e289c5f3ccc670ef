// src/compositor/tests.rs

use super::*;
use crate::buffer::{CursorState, Line, Point, Selection, SelectionMode};
use crate::cell::{Attributes, RasterSlice};
use crate::config::ColorScheme;
use crate::sixel::decode;

const RED: Color = Color::new(1.0, 0.0, 0.0);
const BLUE: Color = Color::new(0.0, 0.0, 1.0);
const GREY: Color = Color::new(0.5, 0.5, 0.5);

fn metrics() -> CellMetrics {
    CellMetrics {
        width: 8.0,
        height: 16.0,
        ascent: 12.0,
    }
}

fn scheme() -> ColorScheme {
    ColorScheme {
        foreground: Color::WHITE,
        background: Color::BLACK,
        cursor: Color::new(0.0, 1.0, 0.0),
        selection: Color::new(1.0, 1.0, 0.0),
    }
}

fn plain(rune: char) -> Cell {
    Cell::new(rune, Attributes::new(Color::WHITE, GREY))
}

/// A view over `rows` with the cursor hidden and nothing selected.
fn view_of(rows: Vec<Vec<Cell>>, width: usize, height: usize) -> GridView {
    GridView {
        visible_lines: rows.into_iter().map(Line::new).collect(),
        view_width: width,
        view_height: height,
        cursor: CursorState::default(),
        scroll_offset: 0,
        selection: Selection::new(),
        colors: scheme(),
    }
}

fn fills(ops: &[DrawOp]) -> Vec<Color> {
    ops.iter()
        .filter_map(|op| match op {
            DrawOp::FillRect { color, .. } => Some(*color),
            _ => None,
        })
        .collect()
}

fn texts(ops: &[DrawOp]) -> Vec<(f64, f64, char, Color)> {
    ops.iter()
        .filter_map(|op| match op {
            DrawOp::DrawText {
                x, y, glyph, color, ..
            } => Some((*x, *y, *glyph, *color)),
            _ => None,
        })
        .collect()
}

#[test_log::test]
fn every_cell_gets_a_background_fill_in_row_major_order() {
    let view = view_of(vec![vec![plain('a'), plain('b')], vec![plain('c'), plain('d')]], 2, 2);
    let ops = Compositor::new(metrics()).composite(&view);

    let origins: Vec<(f64, f64)> = ops
        .iter()
        .filter_map(|op| match op {
            DrawOp::FillRect { x, y, width, height, .. } => {
                assert_eq!((*width, *height), (8.0, 16.0));
                Some((*x, *y))
            }
            _ => None,
        })
        .collect();
    assert_eq!(origins, vec![(0.0, 0.0), (8.0, 0.0), (0.0, 16.0), (8.0, 16.0)]);

    let glyphs: Vec<char> = texts(&ops).into_iter().map(|t| t.2).collect();
    assert_eq!(glyphs, vec!['a', 'b', 'c', 'd']);
}

#[test_log::test]
fn text_is_drawn_on_the_baseline() {
    let view = view_of(vec![vec![plain('x')], vec![plain('y')]], 1, 2);
    let ops = Compositor::new(metrics()).composite(&view);
    assert_eq!(
        texts(&ops),
        vec![(0.0, 12.0, 'x', Color::WHITE), (0.0, 28.0, 'y', Color::WHITE)]
    );
}

#[test_log::test]
fn row_origin_is_floored_for_fractional_heights() {
    let view = view_of(vec![vec![plain(' ')]; 3], 1, 3);
    let compositor = Compositor::new(CellMetrics {
        width: 7.5,
        height: 15.5,
        ascent: 11.0,
    });
    let ys: Vec<f64> = compositor
        .composite(&view)
        .iter()
        .filter_map(|op| match op {
            DrawOp::FillRect { y, .. } => Some(*y),
            _ => None,
        })
        .collect();
    assert_eq!(ys, vec![0.0, 15.0, 31.0]);
}

#[test_log::test]
fn blank_and_space_cells_draw_no_text() {
    let view = view_of(vec![vec![plain(' '), plain('\0')]], 2, 1);
    let ops = Compositor::new(metrics()).composite(&view);
    assert_eq!(ops.len(), 2);
    assert!(texts(&ops).is_empty());
}

#[test_log::test]
fn reverse_swaps_colors_and_drops_the_flag() {
    let attr = Attributes::new(RED, BLUE).with_flags(AttrFlags::REVERSE | AttrFlags::BOLD);
    let view = view_of(vec![vec![Cell::new('r', attr)]], 1, 1);
    let ops = Compositor::new(metrics()).composite(&view);

    assert_eq!(fills(&ops), vec![RED]);
    match &ops[1] {
        DrawOp::DrawText { color, flags, .. } => {
            assert_eq!(*color, BLUE);
            assert_eq!(*flags, AttrFlags::BOLD);
        }
        other => panic!("expected DrawText, got {:?}", other),
    }
}

#[test_log::test]
fn missing_cells_are_filled_with_scheme_background() {
    // Second row absent, first row shorter than the view.
    let view = view_of(vec![vec![plain('a')]], 2, 2);
    let ops = Compositor::new(metrics()).composite(&view);
    assert_eq!(fills(&ops), vec![GREY, Color::BLACK, Color::BLACK, Color::BLACK]);
    assert_eq!(texts(&ops).len(), 1);
}

#[test_log::test]
fn cursor_takes_precedence_over_selection() {
    let mut view = view_of(vec![vec![plain('a'), plain('b'), plain('c')]], 3, 1);
    view.cursor = CursorState {
        x: 1,
        y: 0,
        visible: true,
    };
    view.selection
        .start_selection(Point::new(0, 0), SelectionMode::Normal);
    view.selection.update_selection(Point::new(2, 0));

    let ops = Compositor::new(metrics()).composite(&view);
    let scheme = scheme();
    assert_eq!(
        fills(&ops),
        vec![scheme.selection, scheme.cursor, scheme.selection]
    );
}

#[test_log::test]
fn hidden_cursor_is_not_drawn() {
    let mut view = view_of(vec![vec![plain('a')]], 1, 1);
    view.cursor = CursorState {
        x: 0,
        y: 0,
        visible: false,
    };
    let ops = Compositor::new(metrics()).composite(&view);
    assert_eq!(fills(&ops), vec![GREY]);
}

#[test_log::test]
fn cursor_match_accounts_for_scroll_offset() {
    let mut view = view_of(vec![vec![plain('a')], vec![plain('b')]], 1, 2);
    view.scroll_offset = 10;
    view.cursor = CursorState {
        x: 0,
        y: 11,
        visible: true,
    };
    let ops = Compositor::new(metrics()).composite(&view);
    assert_eq!(fills(&ops), vec![GREY, scheme().cursor]);
}

#[test_log::test]
fn raster_suppresses_glyph() {
    let raster = Arc::new(decode("q~~~~~~~~").unwrap());
    let mut cell = plain('X');
    cell.set_raster(RasterSlice {
        raster: Arc::clone(&raster),
        col_offset: 0,
        row_offset: 0,
    });
    let view = view_of(vec![vec![cell]], 1, 1);
    let ops = Compositor::new(metrics()).composite(&view);

    assert_eq!(ops.len(), 2);
    assert!(texts(&ops).is_empty());
    match &ops[1] {
        DrawOp::BlitRaster { x, y, raster: r, src } => {
            assert_eq!((*x, *y), (0.0, 0.0));
            assert!(Arc::ptr_eq(r, &raster));
            assert_eq!(
                *src,
                PixelRect {
                    x: 0,
                    y: 0,
                    width: 8,
                    height: 6
                }
            );
        }
        other => panic!("expected BlitRaster, got {:?}", other),
    }
}

#[test_log::test]
fn raster_slices_cut_their_own_source_rect() {
    // 12 x 24 pixels over 8 x 16 cells: two columns, two rows.
    let raster = Arc::new(decode("q!12~-!12~-!12~-!12~").unwrap());
    let slice = |col_offset, row_offset| {
        let mut cell = plain(' ');
        cell.set_raster(RasterSlice {
            raster: Arc::clone(&raster),
            col_offset,
            row_offset,
        });
        cell
    };
    let view = view_of(
        vec![vec![slice(0, 0), slice(1, 0)], vec![slice(0, 1), slice(1, 1)]],
        2,
        2,
    );
    let sources: Vec<(f64, f64, PixelRect)> = Compositor::new(metrics())
        .composite(&view)
        .into_iter()
        .filter_map(|op| match op {
            DrawOp::BlitRaster { x, y, src, .. } => Some((x, y, src)),
            _ => None,
        })
        .collect();

    let rect = |x, y, width, height| PixelRect {
        x,
        y,
        width,
        height,
    };
    assert_eq!(
        sources,
        vec![
            (0.0, 0.0, rect(0, 0, 8, 16)),
            (8.0, 0.0, rect(8, 0, 4, 16)),
            (0.0, 16.0, rect(0, 16, 8, 8)),
            (8.0, 16.0, rect(8, 16, 4, 8)),
        ]
    );
}

#[test_log::test]
fn slice_outside_raster_is_skipped_but_background_is_kept() {
    let raster = Arc::new(decode("q~").unwrap());
    let mut cell = plain('X');
    cell.set_raster(RasterSlice {
        raster,
        col_offset: 3,
        row_offset: 0,
    });
    let view = view_of(vec![vec![cell]], 1, 1);
    let ops = Compositor::new(metrics()).composite(&view);
    assert_eq!(fills(&ops), vec![GREY]);
    assert_eq!(ops.len(), 1);
}

#[test_log::test]
fn same_view_composites_identically() {
    let view = view_of(vec![vec![plain('a'), plain('b')]], 2, 1);
    let compositor = Compositor::new(metrics());
    assert_eq!(compositor.composite(&view), compositor.composite(&view));
}
