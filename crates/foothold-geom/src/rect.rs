//! Half-open integer rectangles in column-key space.
//!
//! A rect covers `[min_x, max_x) × [min_z, max_z)`. The scan windows keep all
//! bounds on multiples of the grid step, so a rect spanning the columns
//! `a..=b` has `max = b + step`.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub min_x: i32,
    pub min_z: i32,
    pub max_x: i32,
    pub max_z: i32,
}

impl Rect {
    pub const EMPTY: Rect = Rect {
        min_x: 0,
        min_z: 0,
        max_x: 0,
        max_z: 0,
    };

    #[inline]
    pub const fn new(min_x: i32, min_z: i32, max_x: i32, max_z: i32) -> Self {
        Self {
            min_x,
            min_z,
            max_x,
            max_z,
        }
    }

    /// The square of columns `center - half_extent ..= center + half_extent` on both axes.
    #[inline]
    pub fn around(center_x: i32, center_z: i32, half_extent: i32, step: i32) -> Self {
        Self::new(
            center_x - half_extent,
            center_z - half_extent,
            center_x + half_extent + step,
            center_z + half_extent + step,
        )
    }

    #[inline]
    pub fn width(&self) -> i32 {
        (self.max_x - self.min_x).max(0)
    }

    #[inline]
    pub fn height(&self) -> i32 {
        (self.max_z - self.min_z).max(0)
    }

    #[inline]
    pub fn area(&self) -> i64 {
        i64::from(self.width()) * i64::from(self.height())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.max_x <= self.min_x || self.max_z <= self.min_z
    }

    #[inline]
    pub fn contains(&self, x: i32, z: i32) -> bool {
        x >= self.min_x && x < self.max_x && z >= self.min_z && z < self.max_z
    }

    /// Overlap of two rects, or `None` when they share no area.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let r = Rect::new(
            self.min_x.max(other.min_x),
            self.min_z.max(other.min_z),
            self.max_x.min(other.max_x),
            self.max_z.min(other.max_z),
        );
        if r.is_empty() { None } else { Some(r) }
    }

    /// Column keys inside the rect in row-major order (x outer, z inner).
    #[inline]
    pub fn columns(&self, step: i32) -> Columns {
        Columns::new(*self, step)
    }
}

/// Row-major walk over the column keys of a [`Rect`].
#[derive(Clone, Debug)]
pub struct Columns {
    rect: Rect,
    step: i32,
    x: i32,
    z: i32,
}

impl Columns {
    fn new(rect: Rect, step: i32) -> Self {
        debug_assert!(step > 0);
        let x = if rect.is_empty() { rect.max_x } else { rect.min_x };
        Self {
            rect,
            step: step.max(1),
            x,
            z: rect.min_z,
        }
    }
}

impl Iterator for Columns {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.x >= self.rect.max_x {
            return None;
        }
        let item = (self.x, self.z);
        self.z += self.step;
        if self.z >= self.rect.max_z {
            self.z = self.rect.min_z;
            self.x += self.step;
        }
        Some(item)
    }
}

/// Up to four rects produced by [`subtract`]; stored inline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Subtraction {
    rects: [Rect; 4],
    len: usize,
}

impl Subtraction {
    #[inline]
    fn push(&mut self, r: Rect) {
        self.rects[self.len] = r;
        self.len += 1;
    }

    #[inline]
    pub fn as_slice(&self) -> &[Rect] {
        &self.rects[..self.len]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'_, Rect> {
        self.as_slice().iter()
    }
}

impl<'a> IntoIterator for &'a Subtraction {
    type Item = &'a Rect;
    type IntoIter = core::slice::Iter<'a, Rect>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// The part of `original` not covered by `cut`, as disjoint rects.
///
/// Bottom and top strips take the full width of `original`; the left and
/// right strips only span the z-range of the overlap. When the two rects do
/// not overlap the result is exactly `[original]`.
pub fn subtract(original: Rect, cut: Rect) -> Subtraction {
    let mut out = Subtraction::default();
    let Some(overlap) = original.intersection(&cut) else {
        out.push(original);
        return out;
    };

    if overlap.min_z > original.min_z {
        out.push(Rect::new(
            original.min_x,
            original.min_z,
            original.max_x,
            overlap.min_z,
        ));
    }
    if overlap.max_z < original.max_z {
        out.push(Rect::new(
            original.min_x,
            overlap.max_z,
            original.max_x,
            original.max_z,
        ));
    }
    if overlap.min_x > original.min_x {
        out.push(Rect::new(
            original.min_x,
            overlap.min_z,
            overlap.min_x,
            overlap.max_z,
        ));
    }
    if overlap.max_x < original.max_x {
        out.push(Rect::new(
            overlap.max_x,
            overlap.min_z,
            original.max_x,
            overlap.max_z,
        ));
    }
    out
}
