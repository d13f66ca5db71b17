//! Terminal rendition of the tree canvas
//!
//! World coordinates are virtual pixels; one terminal cell covers
//! `CELL_WIDTH` x `CELL_HEIGHT` of them after the view transform. Links are
//! rasterized first, cards are painted on top and clipped to the area.

use crate::tree::{build_path, LayoutConfig, LinkPath, Point, PositionedNode, TreeLayout};
use crate::ui::card::{draw_card, render_card};
use crate::ui::Theme;
use crate::view::{ViewTransform, Viewport};
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

pub const CELL_WIDTH: f64 = 10.0;
pub const CELL_HEIGHT: f64 = 20.0;

/// Upper bound on curve samples per link
const MAX_CURVE_SAMPLES: usize = 4000;
/// Upper bound on the offscreen card buffer along either axis
const MAX_CARD_CELLS: i32 = 1000;

const UP: u8 = 1;
const DOWN: u8 = 2;
const LEFT: u8 = 4;
const RIGHT: u8 = 8;
const DOT: u8 = 16;

/// Viewport in virtual pixels covered by `area`
pub fn viewport_for(area: Rect) -> Viewport {
    Viewport::new(
        f64::from(area.width) * CELL_WIDTH,
        f64::from(area.height) * CELL_HEIGHT,
    )
}

/// Card footprint in cells, relative to the canvas origin. May lie partly or
/// fully outside the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl CellRect {
    pub fn contains(&self, col: i32, row: i32) -> bool {
        col >= self.x && col < self.x + self.width && row >= self.y && row < self.y + self.height
    }
}

/// Screen-space geometry shared by drawing and hit testing
#[derive(Debug, Clone, Copy)]
pub struct CanvasGeometry {
    area: Rect,
    viewport: Viewport,
    transform: ViewTransform,
    node_width: f64,
    node_height: f64,
}

impl CanvasGeometry {
    pub fn new(area: Rect, transform: ViewTransform, config: &LayoutConfig) -> Self {
        Self {
            area,
            viewport: viewport_for(area),
            transform,
            node_width: config.node_width,
            node_height: config.node_height,
        }
    }

    /// World point → fractional cell coordinates relative to the canvas
    fn to_cells(&self, p: Point) -> (f64, f64) {
        let s = self.transform.project(p, self.viewport);
        (s.x / CELL_WIDTH, s.y / CELL_HEIGHT)
    }

    fn to_cell(&self, p: Point) -> (i32, i32) {
        let (x, y) = self.to_cells(p);
        (clamp_i32(x.floor()), clamp_i32(y.floor()))
    }

    pub fn card_cells(&self, node: &PositionedNode) -> CellRect {
        let (x0, y0) = self.to_cells(Point::new(
            node.x - self.node_width / 2.0,
            node.y - self.node_height / 2.0,
        ));
        let (x1, y1) = self.to_cells(Point::new(
            node.x + self.node_width / 2.0,
            node.y + self.node_height / 2.0,
        ));
        let (x0, y0, x1, y1) = (
            clamp_i32(x0.round()),
            clamp_i32(y0.round()),
            clamp_i32(x1.round()),
            clamp_i32(y1.round()),
        );
        CellRect {
            x: x0,
            y: y0,
            width: (x1 - x0).max(1),
            height: (y1 - y0).max(1),
        }
    }

    /// Topmost node under an absolute terminal position
    pub fn node_at(&self, layout: &TreeLayout, column: u16, row: u16) -> Option<usize> {
        if !self.area_contains(column, row) {
            return None;
        }
        let col = i32::from(column - self.area.x);
        let row = i32::from(row - self.area.y);
        layout
            .nodes
            .iter()
            .enumerate()
            .rev()
            .find(|(_, node)| self.card_cells(node).contains(col, row))
            .map(|(idx, _)| idx)
    }

    fn area_contains(&self, column: u16, row: u16) -> bool {
        column >= self.area.x
            && column < self.area.x + self.area.width
            && row >= self.area.y
            && row < self.area.y + self.area.height
    }
}

fn clamp_i32(v: f64) -> i32 {
    if v.is_nan() {
        0
    } else {
        v.clamp(f64::from(i32::MIN / 2), f64::from(i32::MAX / 2)) as i32
    }
}

/// Link direction bits per cell
struct LinkGrid {
    width: i32,
    height: i32,
    cells: Vec<u8>,
}

impl LinkGrid {
    fn new(width: u16, height: u16) -> Self {
        Self {
            width: i32::from(width),
            height: i32::from(height),
            cells: vec![0; usize::from(width) * usize::from(height)],
        }
    }

    fn mark(&mut self, col: i32, row: i32, bits: u8) {
        if col < 0 || row < 0 || col >= self.width || row >= self.height {
            return;
        }
        let idx = (row * self.width + col) as usize;
        self.cells[idx] |= bits;
    }

    fn vertical(&mut self, col: i32, from: i32, to: i32) {
        if col < 0 || col >= self.width {
            return;
        }
        let (lo, hi) = (from.min(to), from.max(to));
        for row in lo.max(0)..=hi.min(self.height - 1) {
            let mut bits = 0;
            if row > lo {
                bits |= UP;
            }
            if row < hi {
                bits |= DOWN;
            }
            self.mark(col, row, bits);
        }
    }

    fn horizontal(&mut self, row: i32, from: i32, to: i32) {
        if row < 0 || row >= self.height {
            return;
        }
        let (lo, hi) = (from.min(to), from.max(to));
        for col in lo.max(0)..=hi.min(self.width - 1) {
            let mut bits = 0;
            if col > lo {
                bits |= LEFT;
            }
            if col < hi {
                bits |= RIGHT;
            }
            self.mark(col, row, bits);
        }
    }

    fn get(&self, col: i32, row: i32) -> u8 {
        self.cells[(row * self.width + col) as usize]
    }
}

fn glyph(bits: u8) -> Option<&'static str> {
    let dirs = bits & (UP | DOWN | LEFT | RIGHT);
    let symbol = match dirs {
        0 if bits & DOT != 0 => "·",
        0 => return None,
        d if d == UP | DOWN || d == UP || d == DOWN => "│",
        d if d == LEFT | RIGHT || d == LEFT || d == RIGHT => "─",
        d if d == DOWN | RIGHT => "┌",
        d if d == DOWN | LEFT => "┐",
        d if d == UP | RIGHT => "└",
        d if d == UP | LEFT => "┘",
        d if d == UP | DOWN | RIGHT => "├",
        d if d == UP | DOWN | LEFT => "┤",
        d if d == LEFT | RIGHT | DOWN => "┬",
        d if d == LEFT | RIGHT | UP => "┴",
        _ => "┼",
    };
    Some(symbol)
}

/// The tree view widget
pub struct TreeCanvas<'a> {
    layout: &'a TreeLayout,
    config: LayoutConfig,
    transform: ViewTransform,
    theme: &'a Theme,
    straight: bool,
    show_lens: bool,
    selected: Option<usize>,
}

impl<'a> TreeCanvas<'a> {
    pub fn new(layout: &'a TreeLayout, config: LayoutConfig, transform: ViewTransform, theme: &'a Theme) -> Self {
        Self {
            layout,
            config,
            transform,
            theme,
            straight: false,
            show_lens: true,
            selected: None,
        }
    }

    pub fn straight(mut self, straight: bool) -> Self {
        self.straight = straight;
        self
    }

    pub fn show_lens(mut self, show_lens: bool) -> Self {
        self.show_lens = show_lens;
        self
    }

    pub fn selected(mut self, selected: Option<usize>) -> Self {
        self.selected = selected;
        self
    }

    fn rasterize_links(&self, geometry: &CanvasGeometry, area: Rect) -> LinkGrid {
        let mut grid = LinkGrid::new(area.width, area.height);
        for link in &self.layout.links {
            let (source, target) = self.layout.link_endpoints(link);
            let path = build_path(
                Point::new(source.x, source.y),
                Point::new(target.x, target.y),
                self.straight,
            );
            match path {
                LinkPath::Orthogonal(points) => {
                    let [a, b, c, d] = points.map(|p| geometry.to_cell(p));
                    grid.vertical(a.0, a.1, b.1);
                    grid.horizontal(b.1, b.0, c.0);
                    grid.vertical(d.0, c.1, d.1);
                }
                LinkPath::Curve { .. } => {
                    let screen = path.map(|p| {
                        let (x, y) = geometry.to_cells(p);
                        Point::new(x, y)
                    });
                    let span = (screen.end().x - screen.start().x).abs()
                        + (screen.end().y - screen.start().y).abs();
                    let steps = ((span * 2.0) as usize).clamp(1, MAX_CURVE_SAMPLES);
                    for p in screen.sample(steps) {
                        grid.mark(clamp_i32(p.x.floor()), clamp_i32(p.y.floor()), DOT);
                    }
                }
            }
        }
        grid
    }

    fn draw_node(&self, geometry: &CanvasGeometry, idx: usize, node: &PositionedNode, area: Rect, buf: &mut Buffer) {
        let rect = geometry.card_cells(node);
        let (ax, ay) = (i32::from(area.width), i32::from(area.height));
        if rect.x >= ax || rect.y >= ay || rect.x + rect.width <= 0 || rect.y + rect.height <= 0 {
            return;
        }

        // Paint offscreen at full size, then copy the visible part
        let width = rect.width.min(MAX_CARD_CELLS) as u16;
        let height = rect.height.min(MAX_CARD_CELLS) as u16;
        let card_area = Rect::new(0, 0, width, height);
        let mut scratch = Buffer::empty(card_area);
        let card = render_card(node, self.show_lens);
        draw_card(&card, card_area, &mut scratch, self.theme, self.selected == Some(idx));
        copy_clipped(&scratch, rect, area, buf);
    }
}

fn copy_clipped(scratch: &Buffer, rect: CellRect, area: Rect, buf: &mut Buffer) {
    let scratch_area = scratch.area;
    for sy in 0..scratch_area.height {
        let row = rect.y + i32::from(sy);
        if row < 0 || row >= i32::from(area.height) {
            continue;
        }
        for sx in 0..scratch_area.width {
            let col = rect.x + i32::from(sx);
            if col < 0 || col >= i32::from(area.width) {
                continue;
            }
            let target = (area.x + col as u16, area.y + row as u16);
            if let (Some(src), Some(dst)) = (scratch.cell((sx, sy)), buf.cell_mut(target)) {
                *dst = src.clone();
            }
        }
    }
}

impl Widget for TreeCanvas<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let geometry = CanvasGeometry::new(area, self.transform, &self.config);

        let grid = self.rasterize_links(&geometry, area);
        let link_style = self.theme.link();
        for row in 0..grid.height {
            for col in 0..grid.width {
                if let Some(symbol) = glyph(grid.get(col, row)) {
                    let pos = (area.x + col as u16, area.y + row as u16);
                    if let Some(cell) = buf.cell_mut(pos) {
                        cell.set_symbol(symbol).set_style(link_style);
                    }
                }
            }
        }

        for (idx, node) in self.layout.nodes.iter().enumerate() {
            if Some(idx) != self.selected {
                self.draw_node(&geometry, idx, node, area, buf);
            }
        }
        // Selection stays on top of overlapping neighbours
        if let Some(idx) = self.selected {
            if let Some(node) = self.layout.nodes.get(idx) {
                self.draw_node(&geometry, idx, node, area, buf);
            }
        }
    }
}
