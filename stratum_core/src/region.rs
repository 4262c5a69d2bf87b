// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Integer rectangles and rectangle-set regions.
//!
//! [`Region`] stores a set of pixels as a list of non-overlapping [`IRect`]s
//! in *banded* canonical form:
//!
//! - rectangles are sorted by `y0`, then `x0`;
//! - rectangles sharing a vertical band have identical `y0`/`y1`;
//! - spans inside a band never overlap or touch;
//! - vertically adjacent bands with identical spans are merged.
//!
//! Because the representation is canonical, two regions covering the same
//! pixels compare equal with `==`.
//!
//! All boolean operations go through a single band sweep
//! ([`Region::combine`]). Regions in a compositor are small (tens of
//! rectangles), so the sweep favours simplicity over asymptotic cost.

use alloc::vec::Vec;
use core::fmt;

use kurbo::Rect;

/// An axis-aligned integer rectangle, half-open on the right and bottom.
///
/// A rectangle with `x1 <= x0` or `y1 <= y0` is empty.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct IRect {
    /// Left edge (inclusive).
    pub x0: i32,
    /// Top edge (inclusive).
    pub y0: i32,
    /// Right edge (exclusive).
    pub x1: i32,
    /// Bottom edge (exclusive).
    pub y1: i32,
}

impl IRect {
    /// The empty rectangle at the origin.
    pub const ZERO: Self = Self::new(0, 0, 0, 0);

    /// Creates a rectangle from its edges.
    #[inline]
    #[must_use]
    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Creates a rectangle from an origin and a size.
    #[inline]
    #[must_use]
    pub const fn from_origin_size(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Returns the smallest integer rectangle containing `rect`.
    #[must_use]
    pub fn from_rect_outer(rect: Rect) -> Self {
        Self::from_integral(rect.expand())
    }

    /// Returns the largest integer rectangle contained in `rect`.
    ///
    /// The result is empty when `rect` spans no whole pixel.
    #[must_use]
    pub fn from_rect_inner(rect: Rect) -> Self {
        Self::from_integral(rect.trunc())
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "input is already integral; out-of-range values saturate"
    )]
    fn from_integral(rect: Rect) -> Self {
        Self::new(rect.x0 as i32, rect.y0 as i32, rect.x1 as i32, rect.y1 as i32)
    }

    /// Converts to a floating-point rectangle.
    #[inline]
    #[must_use]
    pub fn to_rect(self) -> Rect {
        Rect::new(
            f64::from(self.x0),
            f64::from(self.y0),
            f64::from(self.x1),
            f64::from(self.y1),
        )
    }

    /// Width, or zero for an inverted rectangle.
    #[inline]
    #[must_use]
    pub const fn width(self) -> i32 {
        if self.x1 > self.x0 { self.x1 - self.x0 } else { 0 }
    }

    /// Height, or zero for an inverted rectangle.
    #[inline]
    #[must_use]
    pub const fn height(self) -> i32 {
        if self.y1 > self.y0 { self.y1 - self.y0 } else { 0 }
    }

    /// Number of pixels covered.
    #[inline]
    #[must_use]
    pub const fn area(self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Returns `true` if the rectangle covers no pixels.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    /// Intersection of two rectangles, [`ZERO`](Self::ZERO) when disjoint.
    #[must_use]
    pub fn intersect(self, other: Self) -> Self {
        let r = Self::new(
            self.x0.max(other.x0),
            self.y0.max(other.y0),
            self.x1.min(other.x1),
            self.y1.min(other.y1),
        );
        if r.is_empty() { Self::ZERO } else { r }
    }

    /// Returns `true` if the rectangles share at least one pixel.
    #[inline]
    #[must_use]
    pub fn intersects(self, other: Self) -> bool {
        !self.intersect(other).is_empty()
    }

    /// Smallest rectangle containing both. Empty inputs are ignored.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        Self::new(
            self.x0.min(other.x0),
            self.y0.min(other.y0),
            self.x1.max(other.x1),
            self.y1.max(other.y1),
        )
    }

    /// Returns `true` if every pixel of `other` lies inside `self`.
    ///
    /// An empty `other` is contained in anything.
    #[must_use]
    pub fn contains_rect(self, other: Self) -> bool {
        other.is_empty()
            || (self.x0 <= other.x0
                && self.y0 <= other.y0
                && self.x1 >= other.x1
                && self.y1 >= other.y1)
    }

    /// Returns `true` if the pixel at `(x, y)` lies inside the rectangle.
    #[inline]
    #[must_use]
    pub const fn contains_point(self, x: i32, y: i32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }

    /// Moves the rectangle by `(dx, dy)`.
    #[inline]
    #[must_use]
    pub const fn translate(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x0 + dx, self.y0 + dy, self.x1 + dx, self.y1 + dy)
    }

    /// Grows the rectangle by `d` on every side (shrinks for negative `d`).
    #[inline]
    #[must_use]
    pub const fn inflate(self, d: i32) -> Self {
        Self::new(self.x0 - d, self.y0 - d, self.x1 + d, self.y1 + d)
    }
}

impl fmt::Debug for IRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IRect({}, {}, {}x{})",
            self.x0,
            self.y0,
            self.x1 - self.x0,
            self.y1 - self.y0
        )
    }
}

/// Boolean operator applied per pixel by [`Region::combine`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Op {
    Union,
    Intersect,
    Subtract,
    Xor,
}

impl Op {
    #[inline]
    const fn keep(self, in_a: bool, in_b: bool) -> bool {
        match self {
            Self::Union => in_a || in_b,
            Self::Intersect => in_a && in_b,
            Self::Subtract => in_a && !in_b,
            Self::Xor => in_a != in_b,
        }
    }
}

/// A set of pixels stored as canonical non-overlapping rectangles.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Region {
    rects: Vec<IRect>,
}

impl Region {
    /// Creates an empty region.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { rects: Vec::new() }
    }

    /// Creates a region covering the union of `rects`.
    #[must_use]
    pub fn from_rects(rects: impl IntoIterator<Item = IRect>) -> Self {
        let mut region = Self::new();
        for r in rects {
            region.union_rect(r);
        }
        region
    }

    /// The canonical rectangles of this region.
    #[inline]
    #[must_use]
    pub fn rects(&self) -> &[IRect] {
        &self.rects
    }

    /// Returns `true` if the region covers no pixels.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Removes every rectangle.
    #[inline]
    pub fn clear(&mut self) {
        self.rects.clear();
    }

    /// Bounding rectangle, [`IRect::ZERO`] when empty.
    #[must_use]
    pub fn bounds(&self) -> IRect {
        self.rects
            .iter()
            .fold(IRect::ZERO, |acc, r| acc.union(*r))
    }

    /// Number of pixels covered.
    #[must_use]
    pub fn area(&self) -> u64 {
        self.rects.iter().map(|r| r.area()).sum()
    }

    /// Returns `true` if the pixel at `(x, y)` is in the region.
    #[must_use]
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        self.rects.iter().any(|r| r.contains_point(x, y))
    }

    /// Returns `true` if every pixel of `rect` is in the region.
    #[must_use]
    pub fn contains_rect(&self, rect: IRect) -> bool {
        Self::from(rect).subtract(self).is_empty()
    }

    /// Returns `true` if every pixel of `other` is in the region.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        other.subtract(self).is_empty()
    }

    /// Returns `true` if the regions share at least one pixel.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        if !self.bounds().intersects(other.bounds()) {
            return false;
        }
        self.rects
            .iter()
            .any(|a| other.rects.iter().any(|b| a.intersects(*b)))
    }

    /// Returns `true` if the region shares at least one pixel with `rect`.
    #[must_use]
    pub fn intersects_rect(&self, rect: IRect) -> bool {
        self.rects.iter().any(|r| r.intersects(rect))
    }

    /// Pixels in either region.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        Self::combine(self, other, Op::Union)
    }

    /// Pixels in both regions.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        if self.is_empty() || other.is_empty() {
            return Self::new();
        }
        Self::combine(self, other, Op::Intersect)
    }

    /// Pixels in `self` but not in `other`.
    #[must_use]
    pub fn subtract(&self, other: &Self) -> Self {
        if self.is_empty() || other.is_empty() {
            return self.clone();
        }
        Self::combine(self, other, Op::Subtract)
    }

    /// Pixels in exactly one of the regions.
    #[must_use]
    pub fn xor(&self, other: &Self) -> Self {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        Self::combine(self, other, Op::Xor)
    }

    /// In-place [`union`](Self::union).
    pub fn union_with(&mut self, other: &Self) {
        if !other.is_empty() {
            *self = self.union(other);
        }
    }

    /// In-place [`intersect`](Self::intersect).
    pub fn intersect_with(&mut self, other: &Self) {
        *self = self.intersect(other);
    }

    /// In-place [`subtract`](Self::subtract).
    pub fn subtract_with(&mut self, other: &Self) {
        if !other.is_empty() {
            *self = self.subtract(other);
        }
    }

    /// Adds a rectangle to the region.
    pub fn union_rect(&mut self, rect: IRect) {
        if !rect.is_empty() && !self.contains_rect(rect) {
            *self = self.union(&Self::from(rect));
        }
    }

    /// Restricts the region to `rect`.
    pub fn intersect_rect(&mut self, rect: IRect) {
        if rect.contains_rect(self.bounds()) {
            return;
        }
        *self = self.intersect(&Self::from(rect));
    }

    /// Removes `rect` from the region.
    pub fn subtract_rect(&mut self, rect: IRect) {
        if rect.intersects(self.bounds()) {
            *self = self.subtract(&Self::from(rect));
        }
    }

    /// Returns the region moved by `(dx, dy)`.
    #[must_use]
    pub fn translate(&self, dx: i32, dy: i32) -> Self {
        // Translation preserves canonical form.
        Self {
            rects: self.rects.iter().map(|r| r.translate(dx, dy)).collect(),
        }
    }

    /// Returns the region grown by `d` pixels on every side of every
    /// rectangle.
    #[must_use]
    pub fn inflate(&self, d: i32) -> Self {
        if d == 0 {
            return self.clone();
        }
        self.map_rects(|r| r.inflate(d))
    }

    /// Returns the union of `f` applied to every rectangle.
    #[must_use]
    pub fn map_rects(&self, f: impl Fn(IRect) -> IRect) -> Self {
        Self::from_rects(self.rects.iter().map(|r| f(*r)))
    }

    /// Applies `op` to every pixel of the two regions.
    ///
    /// Both inputs are canonical, so every band between two consecutive
    /// distinct `y` edges is either fully covered by a source rectangle or
    /// not touched by it at all.
    fn combine(a: &Self, b: &Self, op: Op) -> Self {
        let mut ys: Vec<i32> = a
            .rects
            .iter()
            .chain(b.rects.iter())
            .flat_map(|r| [r.y0, r.y1])
            .collect();
        ys.sort_unstable();
        ys.dedup();

        let mut builder = Builder::default();
        let mut spans_a = Vec::new();
        let mut spans_b = Vec::new();
        let mut spans = Vec::new();
        for band in ys.windows(2) {
            let (y0, y1) = (band[0], band[1]);
            collect_spans(&a.rects, y0, y1, &mut spans_a);
            collect_spans(&b.rects, y0, y1, &mut spans_b);
            if spans_a.is_empty() && spans_b.is_empty() {
                continue;
            }
            combine_spans(&spans_a, &spans_b, op, &mut spans);
            builder.push_band(y0, y1, &spans);
        }
        builder.finish()
    }
}

impl From<IRect> for Region {
    fn from(rect: IRect) -> Self {
        if rect.is_empty() {
            Self::new()
        } else {
            Self { rects: alloc::vec![rect] }
        }
    }
}

impl fmt::Debug for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.rects.iter()).finish()
    }
}

/// Collects the `x` spans of the canonical rectangles covering `[y0, y1)`.
fn collect_spans(rects: &[IRect], y0: i32, y1: i32, out: &mut Vec<(i32, i32)>) {
    out.clear();
    out.extend(
        rects
            .iter()
            .filter(|r| r.y0 <= y0 && r.y1 >= y1)
            .map(|r| (r.x0, r.x1)),
    );
}

/// One-dimensional boolean sweep over two sorted, disjoint span lists.
fn combine_spans(a: &[(i32, i32)], b: &[(i32, i32)], op: Op, out: &mut Vec<(i32, i32)>) {
    out.clear();
    let mut xs: Vec<i32> = a
        .iter()
        .chain(b.iter())
        .flat_map(|&(x0, x1)| [x0, x1])
        .collect();
    xs.sort_unstable();
    xs.dedup();

    for w in xs.windows(2) {
        let (x0, x1) = (w[0], w[1]);
        let in_a = a.iter().any(|&(s, e)| s <= x0 && e >= x1);
        let in_b = b.iter().any(|&(s, e)| s <= x0 && e >= x1);
        if !op.keep(in_a, in_b) {
            continue;
        }
        match out.last_mut() {
            Some(last) if last.1 == x0 => last.1 = x1,
            _ => out.push((x0, x1)),
        }
    }
}

/// Accumulates bands top to bottom, coalescing identical neighbours.
#[derive(Default)]
struct Builder {
    rects: Vec<IRect>,
    /// Index of the first rectangle of the last pushed band.
    last_band: usize,
}

impl Builder {
    fn push_band(&mut self, y0: i32, y1: i32, spans: &[(i32, i32)]) {
        if spans.is_empty() {
            return;
        }
        let prev = &self.rects[self.last_band..];
        let coalesce = !prev.is_empty()
            && prev[0].y1 == y0
            && prev.len() == spans.len()
            && prev
                .iter()
                .zip(spans)
                .all(|(r, &(x0, x1))| r.x0 == x0 && r.x1 == x1);
        if coalesce {
            for r in &mut self.rects[self.last_band..] {
                r.y1 = y1;
            }
            return;
        }
        self.last_band = self.rects.len();
        self.rects
            .extend(spans.iter().map(|&(x0, x1)| IRect::new(x0, y0, x1, y1)));
    }

    fn finish(self) -> Region {
        Region { rects: self.rects }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn r(x: i32, y: i32, w: i32, h: i32) -> IRect {
        IRect::from_origin_size(x, y, w, h)
    }

    #[test]
    fn empty_rect_makes_empty_region() {
        assert!(Region::from(IRect::new(5, 5, 5, 10)).is_empty());
        assert!(Region::from(IRect::new(5, 5, 2, 10)).is_empty());
    }

    #[test]
    fn union_of_overlapping_rects_is_canonical() {
        let a = Region::from(r(0, 0, 10, 10));
        let b = Region::from(r(5, 5, 10, 10));
        let u = a.union(&b);
        assert_eq!(u.area(), 100 + 100 - 25);
        assert_eq!(
            u.rects(),
            &[r(0, 0, 10, 5), r(0, 5, 15, 5), r(5, 10, 10, 5)]
        );
        // Same pixel set built in a different order compares equal.
        let v = Region::from_rects([r(5, 5, 10, 10), r(0, 0, 10, 10)]);
        assert_eq!(u, v);
    }

    #[test]
    fn adjacent_rects_coalesce() {
        let u = Region::from_rects([r(0, 0, 10, 5), r(0, 5, 10, 5)]);
        assert_eq!(u.rects(), &[r(0, 0, 10, 10)]);
        let h = Region::from_rects([r(0, 0, 5, 10), r(5, 0, 5, 10)]);
        assert_eq!(h.rects(), &[r(0, 0, 10, 10)]);
    }

    #[test]
    fn subtract_punches_hole() {
        let outer = Region::from(r(0, 0, 30, 30));
        let hole = Region::from(r(10, 10, 10, 10));
        let ring = outer.subtract(&hole);
        assert_eq!(ring.area(), 900 - 100);
        assert!(!ring.contains_point(15, 15));
        assert!(ring.contains_point(5, 15));
        assert_eq!(ring.bounds(), r(0, 0, 30, 30));
        assert_eq!(ring.union(&hole), outer);
    }

    #[test]
    fn intersect_and_xor() {
        let a = Region::from(r(0, 0, 100, 100));
        let b = Region::from(r(50, 50, 100, 100));
        assert_eq!(a.intersect(&b), Region::from(r(50, 50, 50, 50)));
        let x = a.xor(&b);
        assert_eq!(x.area(), 10_000 + 10_000 - 2 * 2_500);
        assert_eq!(x, a.union(&b).subtract(&a.intersect(&b)));
    }

    #[test]
    fn disjoint_intersection_is_empty() {
        let a = Region::from(r(0, 0, 10, 10));
        let b = Region::from(r(10, 0, 10, 10));
        assert!(a.intersect(&b).is_empty());
        assert!(!a.intersects(&b));
    }

    #[test]
    fn containment() {
        let big = Region::from_rects([r(0, 0, 50, 50), r(50, 0, 50, 50)]);
        assert!(big.contains_rect(r(10, 10, 80, 20)));
        assert!(!big.contains_rect(r(10, 10, 80, 60)));
        assert!(big.contains(&Region::new()));
        assert!(Region::new().contains_rect(IRect::ZERO));
    }

    #[test]
    fn in_place_ops_match_pure_ops() {
        let a = Region::from_rects([r(0, 0, 20, 20), r(40, 40, 10, 10)]);
        let b = Region::from(r(10, 10, 35, 35));

        let mut u = a.clone();
        u.union_with(&b);
        assert_eq!(u, a.union(&b));

        let mut i = a.clone();
        i.intersect_with(&b);
        assert_eq!(i, a.intersect(&b));

        let mut s = a.clone();
        s.subtract_with(&b);
        assert_eq!(s, a.subtract(&b));

        let mut sr = a.clone();
        sr.subtract_rect(r(10, 10, 35, 35));
        assert_eq!(sr, s);

        let mut ir = a.clone();
        ir.intersect_rect(r(10, 10, 35, 35));
        assert_eq!(ir, i);
    }

    #[test]
    fn translate_and_inflate() {
        let a = Region::from_rects([r(0, 0, 10, 10), r(20, 0, 10, 10)]);
        let t = a.translate(5, -5);
        assert_eq!(t.rects(), &[r(5, -5, 10, 10), r(25, -5, 10, 10)]);
        let grown = a.inflate(5);
        // The gap between the two rects closes.
        assert_eq!(grown, Region::from(r(-5, -5, 40, 20)));
    }

    #[test]
    fn outer_and_inner_rounding() {
        let rect = Rect::new(0.5, 0.5, 10.5, 10.5);
        assert_eq!(IRect::from_rect_outer(rect), IRect::new(0, 0, 11, 11));
        assert_eq!(IRect::from_rect_inner(rect), IRect::new(1, 1, 10, 10));
        assert!(IRect::from_rect_inner(Rect::new(0.2, 0.2, 0.8, 0.8)).is_empty());
    }

    #[test]
    fn many_rect_union_has_expected_area() {
        // A 10x10 checkerboard of 10px cells.
        let cells = (0..10).flat_map(|i| {
            (0..10)
                .filter(move |j| (i + j) % 2 == 0)
                .map(move |j| r(i * 10, j * 10, 10, 10))
        });
        let board = Region::from_rects(cells);
        assert_eq!(board.area(), 50 * 100);
        let full = Region::from(r(0, 0, 100, 100));
        let inverse = full.subtract(&board);
        assert_eq!(inverse.area(), 50 * 100);
        assert_eq!(board.union(&inverse), full);
        assert!(board.intersect(&inverse).is_empty());
        assert_eq!(board.xor(&inverse), full);
    }

    #[test]
    fn map_rects_unions_results() {
        let a = Region::from(r(0, 0, 10, 10));
        let doubled = a.map_rects(|r| IRect::new(r.x0 * 2, r.y0 * 2, r.x1 * 2, r.y1 * 2));
        assert_eq!(doubled, Region::from(r(0, 0, 20, 20)));
        let v = vec![r(0, 0, 1, 1)];
        assert_eq!(Region::from_rects(v).area(), 1);
    }
}
