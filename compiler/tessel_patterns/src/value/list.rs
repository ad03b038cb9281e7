//! Ordered sequences: owned vectors or lazy integer ranges.

use std::fmt;
use std::hash::{Hash, Hasher};

use super::{Heap, Value};
use crate::annotation::Annotations;
use crate::errors::{domain_error, EvalError};

/// Storage of a list.
#[derive(Clone)]
pub enum ListRepr {
    /// `start, start + step, ...` up to but excluding `stop`.
    Range { start: i64, stop: i64, step: i64 },
    Items(Heap<Vec<Value>>),
}

/// A list value.
///
/// A lazy range equals the materialized list holding the same elements.
#[derive(Clone)]
pub struct ListValue {
    repr: ListRepr,
    annotations: Annotations,
}

impl ListValue {
    pub fn from_vec(items: Vec<Value>) -> Self {
        ListValue {
            repr: ListRepr::Items(Heap::new(items)),
            annotations: Annotations::default(),
        }
    }

    /// A lazy range. A zero step is a domain error.
    pub fn range(start: i64, stop: i64, step: i64) -> Result<Self, EvalError> {
        if step == 0 {
            return Err(domain_error("range (step must not be zero)"));
        }
        Ok(ListValue {
            repr: ListRepr::Range { start, stop, step },
            annotations: Annotations::default(),
        })
    }

    #[inline]
    pub fn repr(&self) -> &ListRepr {
        &self.repr
    }

    pub fn len(&self) -> usize {
        match &self.repr {
            ListRepr::Range { start, stop, step } => range_len(*start, *stop, *step),
            ListRepr::Items(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The element at `index`.
    pub fn get(&self, index: usize) -> Option<Value> {
        match &self.repr {
            ListRepr::Range { start, step, .. } => {
                if index >= self.len() {
                    return None;
                }
                let offset = i128::try_from(index).ok()? * i128::from(*step);
                i64::try_from(i128::from(*start) + offset)
                    .ok()
                    .map(Value::int)
            }
            ListRepr::Items(items) => items.get(index).cloned(),
        }
    }

    pub fn iter(&self) -> ListIter<'_> {
        ListIter {
            list: self,
            index: 0,
            len: self.len(),
        }
    }

    /// Materialize the elements.
    pub fn to_vec(&self) -> Vec<Value> {
        match &self.repr {
            ListRepr::Items(items) => items.to_vec(),
            ListRepr::Range { .. } => self.iter().collect(),
        }
    }

    #[inline]
    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    #[must_use]
    pub fn with_annotations(mut self, annotations: Annotations) -> Self {
        self.annotations = annotations;
        self
    }
}

fn range_len(start: i64, stop: i64, step: i64) -> usize {
    let (start, stop, step) = (i128::from(start), i128::from(stop), i128::from(step));
    let span = if step > 0 { stop - start } else { start - stop };
    let stride = step.abs();
    if span <= 0 || stride == 0 {
        return 0;
    }
    usize::try_from((span + stride - 1) / stride).unwrap_or(usize::MAX)
}

/// Iterator over list elements, materializing range elements on the fly.
pub struct ListIter<'a> {
    list: &'a ListValue,
    index: usize,
    len: usize,
}

impl Iterator for ListIter<'_> {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        if self.index >= self.len {
            return None;
        }
        let item = self.list.get(self.index);
        self.index += 1;
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len.saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl PartialEq for ListValue {
    fn eq(&self, other: &Self) -> bool {
        match (&self.repr, &other.repr) {
            (ListRepr::Items(a), ListRepr::Items(b)) => a == b,
            _ => self.len() == other.len() && self.iter().eq(other.iter()),
        }
    }
}

impl Eq for ListValue {}

impl Hash for ListValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for item in self.iter() {
            item.hash(state);
        }
    }
}

impl fmt::Debug for ListValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            ListRepr::Range { start, stop, step } => {
                write!(f, "Range({start}, {stop}, {step})")
            }
            ListRepr::Items(items) => f.debug_list().entries(items.iter()).finish(),
        }
    }
}

impl fmt::Display for ListValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, item) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{item}")?;
        }
        write!(f, "]")
    }
}
