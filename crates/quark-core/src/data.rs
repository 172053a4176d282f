//! Shapes, scopes, and borrowed views of derived-quantity results.

use std::fmt;

/// Where a derived quantity's values live.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    /// One value (or one vector/array) for the whole system.
    Global = 0,
    /// One value or row per locally owned particle.
    PerParticle = 1,
    /// One value or row per local interaction (pair, bond, ...).
    Local = 2,
}

impl TryFrom<i32> for Scope {
    type Error = i32;

    fn try_from(raw: i32) -> Result<Self, i32> {
        match raw {
            0 => Ok(Self::Global),
            1 => Ok(Self::PerParticle),
            2 => Ok(Self::Local),
            other => Err(other),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::PerParticle => write!(f, "per-particle"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// Dimensionality of a derived quantity's values.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Shape {
    /// A single value.
    Scalar = 0,
    /// A 1-D sequence.
    Vector = 1,
    /// A row-major 2-D table.
    Array = 2,
}

impl TryFrom<i32> for Shape {
    type Error = i32;

    fn try_from(raw: i32) -> Result<Self, i32> {
        match raw {
            0 => Ok(Self::Scalar),
            1 => Ok(Self::Vector),
            2 => Ok(Self::Array),
            other => Err(other),
        }
    }
}

/// Element type of a per-particle buffer exchanged with the driver.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// 32-bit signed integer.
    Int = 0,
    /// 64-bit float.
    Double = 1,
}

impl TryFrom<i32> for ElementKind {
    type Error = i32;

    fn try_from(raw: i32) -> Result<Self, i32> {
        match raw {
            0 => Ok(Self::Int),
            1 => Ok(Self::Double),
            other => Err(other),
        }
    }
}

/// Owned row-major 2-D buffer of `f64`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Array2 {
    data: Vec<f64>,
    cols: usize,
}

impl Array2 {
    /// Zero-filled `rows x cols` buffer.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![0.0; rows * cols],
            cols,
        }
    }

    /// Resize to `rows x cols`, zeroing every element.
    pub fn reset(&mut self, rows: usize, cols: usize) {
        self.data.clear();
        self.data.resize(rows * cols, 0.0);
        self.cols = cols;
    }

    /// Grow or shrink the row count, keeping existing rows.
    pub fn resize_rows(&mut self, rows: usize) {
        self.data.resize(rows * self.cols, 0.0);
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        if self.cols == 0 {
            0
        } else {
            self.data.len() / self.cols
        }
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Mutable access to row `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= rows()`.
    pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
        let start = i * self.cols;
        &mut self.data[start..start + self.cols]
    }

    /// Borrowed view.
    pub fn view(&self) -> ArrayView<'_> {
        ArrayView::new(&self.data, self.cols)
    }

    /// Flat mutable storage.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }
}

/// Borrowed row-major 2-D view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArrayView<'a> {
    data: &'a [f64],
    cols: usize,
}

impl<'a> ArrayView<'a> {
    /// View `data` as rows of `cols` values. A trailing partial row is
    /// not addressable.
    pub fn new(data: &'a [f64], cols: usize) -> Self {
        Self { data, cols }
    }

    /// Number of complete rows.
    pub fn rows(&self) -> usize {
        if self.cols == 0 {
            0
        } else {
            self.data.len() / self.cols
        }
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Row `i`, if it exists.
    pub fn row(&self, i: usize) -> Option<&'a [f64]> {
        if i >= self.rows() {
            return None;
        }
        let start = i * self.cols;
        Some(&self.data[start..start + self.cols])
    }

    /// Element `(i, j)`, if it exists.
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        if j >= self.cols {
            return None;
        }
        self.row(i).map(|r| r[j])
    }

    /// Flat row-major storage.
    pub fn as_slice(&self) -> &'a [f64] {
        self.data
    }
}

/// Borrowed reference into a derived quantity's own result buffer.
///
/// Valid until the owning object next recomputes or the instance is
/// dropped; the borrow checker enforces this for Rust callers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DataRef<'a> {
    /// Single value.
    Scalar(&'a f64),
    /// 1-D values.
    Vector(&'a [f64]),
    /// 2-D values.
    Array(ArrayView<'a>),
}

impl<'a> DataRef<'a> {
    /// The shape this reference carries.
    pub fn shape(&self) -> Shape {
        match self {
            Self::Scalar(_) => Shape::Scalar,
            Self::Vector(_) => Shape::Vector,
            Self::Array(_) => Shape::Array,
        }
    }

    /// The scalar value, if this is a scalar.
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(v) => Some(**v),
            _ => None,
        }
    }

    /// The vector slice, if this is a vector.
    pub fn as_vector(&self) -> Option<&'a [f64]> {
        match self {
            Self::Vector(v) => Some(v),
            _ => None,
        }
    }

    /// The array view, if this is an array.
    pub fn as_array(&self) -> Option<ArrayView<'a>> {
        match self {
            Self::Array(a) => Some(*a),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_discriminants_round_trip() {
        assert_eq!(Scope::try_from(1), Ok(Scope::PerParticle));
        assert_eq!(Shape::try_from(2), Ok(Shape::Array));
        assert_eq!(ElementKind::try_from(0), Ok(ElementKind::Int));
        assert_eq!(Scope::try_from(3), Err(3));
        assert_eq!(Shape::try_from(-1), Err(-1));
    }

    #[test]
    fn array_view_rows_and_bounds() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let v = ArrayView::new(&data, 3);
        assert_eq!(v.rows(), 2);
        assert_eq!(v.row(1), Some(&[4.0, 5.0, 6.0][..]));
        assert_eq!(v.get(0, 2), Some(3.0));
        assert_eq!(v.get(0, 3), None);
        assert_eq!(v.row(2), None);
    }

    #[test]
    fn array2_resize_keeps_rows() {
        let mut a = Array2::zeros(2, 2);
        a.row_mut(1).copy_from_slice(&[7.0, 8.0]);
        a.resize_rows(3);
        assert_eq!(a.rows(), 3);
        assert_eq!(a.view().row(1), Some(&[7.0, 8.0][..]));
        assert_eq!(a.view().row(2), Some(&[0.0, 0.0][..]));
    }

    #[test]
    fn zero_column_array_has_no_rows() {
        let a = Array2::zeros(5, 0);
        assert_eq!(a.rows(), 0);
        assert_eq!(a.view().rows(), 0);
    }

    #[test]
    fn data_ref_accessors() {
        let x = 2.5;
        let r = DataRef::Scalar(&x);
        assert_eq!(r.shape(), Shape::Scalar);
        assert_eq!(r.as_scalar(), Some(2.5));
        assert!(r.as_vector().is_none());
    }
}
