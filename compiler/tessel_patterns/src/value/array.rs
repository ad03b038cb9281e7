//! Dense numeric containers of dimensionality 0 through 3.

use std::fmt;
use std::hash::{Hash, Hasher};

use smallvec::SmallVec;

use super::Heap;
use crate::annotation::Annotations;
use crate::errors::{invalid_dimensionality, EvalError};

/// Maximum supported dimensionality.
pub const MAX_DIMS: usize = 3;

/// Extent of each dimension; empty for scalars.
pub type Shape = SmallVec<[usize; MAX_DIMS]>;

/// Element types storable in an [`NdArray`].
///
/// Equality and hashing go through this trait so that floats compare by bit
/// pattern, which keeps `Value`'s `Eq` and `Hash` lawful.
pub trait Element: Copy + Send + Sync + fmt::Debug + fmt::Display + 'static {
    /// Structural equality of two elements.
    fn same(self, other: Self) -> bool;
    /// Feed this element into a hasher.
    fn hash_into<H: Hasher>(self, state: &mut H);
    /// Truthiness of a single element.
    fn truthy(self) -> bool;
}

impl Element for bool {
    #[inline]
    fn same(self, other: Self) -> bool {
        self == other
    }

    #[inline]
    fn hash_into<H: Hasher>(self, state: &mut H) {
        self.hash(state);
    }

    #[inline]
    fn truthy(self) -> bool {
        self
    }
}

impl Element for i64 {
    #[inline]
    fn same(self, other: Self) -> bool {
        self == other
    }

    #[inline]
    fn hash_into<H: Hasher>(self, state: &mut H) {
        self.hash(state);
    }

    #[inline]
    fn truthy(self) -> bool {
        self != 0
    }
}

impl Element for f64 {
    #[inline]
    fn same(self, other: Self) -> bool {
        self.to_bits() == other.to_bits()
    }

    #[inline]
    fn hash_into<H: Hasher>(self, state: &mut H) {
        self.to_bits().hash(state);
    }

    #[inline]
    fn truthy(self) -> bool {
        self != 0.0
    }
}

/// A row-major array with 0..=3 dimensions.
///
/// Scalars are arrays with an empty shape. Annotations ride along
/// out-of-band and do not participate in equality or hashing.
#[derive(Clone)]
pub struct NdArray<T> {
    data: Heap<Vec<T>>,
    shape: Shape,
    annotations: Annotations,
}

impl<T: Element> NdArray<T> {
    /// A 0-dimensional array.
    pub fn scalar(value: T) -> Self {
        NdArray {
            data: Heap::new(vec![value]),
            shape: Shape::new(),
            annotations: Annotations::default(),
        }
    }

    /// A 1-dimensional array.
    pub fn vector(values: Vec<T>) -> Self {
        let mut shape = Shape::new();
        shape.push(values.len());
        NdArray {
            data: Heap::new(values),
            shape,
            annotations: Annotations::default(),
        }
    }

    /// An array with an explicit shape.
    ///
    /// Fails if the shape has more than [`MAX_DIMS`] dimensions or does not
    /// match the number of elements.
    pub fn from_shape(shape: &[usize], values: Vec<T>) -> Result<Self, EvalError> {
        if shape.len() > MAX_DIMS {
            return Err(invalid_dimensionality(format!(
                "arrays support at most {MAX_DIMS} dimensions, got {}",
                shape.len()
            )));
        }
        let expected = shape
            .iter()
            .try_fold(1usize, |acc, &extent| acc.checked_mul(extent))
            .ok_or_else(|| invalid_dimensionality("array shape overflows"))?;
        if expected != values.len() {
            return Err(invalid_dimensionality(format!(
                "shape {shape:?} needs {expected} elements, got {}",
                values.len()
            )));
        }
        Ok(NdArray {
            data: Heap::new(values),
            shape: shape.iter().copied().collect(),
            annotations: Annotations::default(),
        })
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }

    /// The single element of a 0-d array.
    #[inline]
    pub fn scalar_value(&self) -> Option<T> {
        if self.is_scalar() {
            self.data.first().copied()
        } else {
            None
        }
    }

    /// Truthy if any element is truthy.
    pub fn any_truthy(&self) -> bool {
        self.data.iter().any(|e| e.truthy())
    }

    /// Apply `f` element-wise. The result carries no annotations.
    pub fn map<U: Element>(&self, f: impl Fn(T) -> U) -> NdArray<U> {
        NdArray {
            data: Heap::new(self.data.iter().map(|&e| f(e)).collect()),
            shape: self.shape.clone(),
            annotations: Annotations::default(),
        }
    }

    /// Apply `f` element-wise, failing on the first error.
    pub fn try_map<U: Element>(
        &self,
        f: impl Fn(T) -> Result<U, EvalError>,
    ) -> Result<NdArray<U>, EvalError> {
        let data = self
            .data
            .iter()
            .map(|&e| f(e))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(NdArray {
            data: Heap::new(data),
            shape: self.shape.clone(),
            annotations: Annotations::default(),
        })
    }

    /// Combine two arrays element-wise, broadcasting scalars.
    pub fn zip_with<U: Element, R: Element>(
        &self,
        other: &NdArray<U>,
        f: impl Fn(T, U) -> Result<R, EvalError>,
    ) -> Result<NdArray<R>, EvalError> {
        let (shape, data) = if let Some(rhs) = other.scalar_value() {
            let data = self
                .data
                .iter()
                .map(|&l| f(l, rhs))
                .collect::<Result<Vec<_>, _>>()?;
            (self.shape.clone(), data)
        } else if let Some(lhs) = self.scalar_value() {
            let data = other
                .data
                .iter()
                .map(|&r| f(lhs, r))
                .collect::<Result<Vec<_>, _>>()?;
            (other.shape.clone(), data)
        } else if self.shape == other.shape {
            let data = self
                .data
                .iter()
                .zip(other.data.iter())
                .map(|(&l, &r)| f(l, r))
                .collect::<Result<Vec<_>, _>>()?;
            (self.shape.clone(), data)
        } else {
            return Err(invalid_dimensionality(format!(
                "operand shapes {:?} and {:?} are not compatible",
                self.shape.as_slice(),
                other.shape.as_slice()
            )));
        };
        Ok(NdArray {
            data: Heap::new(data),
            shape,
            annotations: Annotations::default(),
        })
    }

    #[inline]
    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// Replace the annotations, keeping the data shared.
    #[must_use]
    pub fn with_annotations(mut self, annotations: Annotations) -> Self {
        self.annotations = annotations;
        self
    }
}

impl<T: Element> PartialEq for NdArray<T> {
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(&a, &b)| a.same(b))
    }
}

impl<T: Element> Eq for NdArray<T> {}

impl<T: Element> Hash for NdArray<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.shape.hash(state);
        for &e in self.data.iter() {
            e.hash_into(state);
        }
    }
}

impl<T: Element> fmt::Debug for NdArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NdArray{:?}({self})", self.shape.as_slice())
    }
}

impl<T: Element> fmt::Display for NdArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_dim<T: Element>(
            f: &mut fmt::Formatter<'_>,
            data: &[T],
            shape: &[usize],
        ) -> fmt::Result {
            let Some((&extent, rest)) = shape.split_first() else {
                return match data.first() {
                    Some(e) => write!(f, "{e}"),
                    None => Ok(()),
                };
            };
            let stride: usize = rest.iter().product();
            write!(f, "[")?;
            for i in 0..extent {
                if i > 0 {
                    write!(f, ", ")?;
                }
                let start = i.saturating_mul(stride);
                let end = start.saturating_add(stride).min(data.len());
                write_dim(f, data.get(start..end).unwrap_or(&[]), rest)?;
            }
            write!(f, "]")
        }
        write_dim(f, &self.data, &self.shape)
    }
}
