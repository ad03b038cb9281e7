//! Out-of-band metadata carried alongside values.
//!
//! Annotations ride on arrays, lists and dictionaries. They never take part
//! in equality or hashing: two values that differ only in their annotations
//! are the same value.
//!
//! The `tile` and `locality` keys are tiling metadata. Attaching one of them
//! through `annotate` triggers reconciliation across localities; the result
//! additionally carries a `localities` annotation describing every
//! locality's part of the logical whole.

use std::fmt;

use crate::errors::{domain_error, type_mismatch, EvalError};
use crate::value::{Heap, Value};

/// Key of a tile descriptor.
pub const TILE_KEY: &str = "tile";
/// Key of a locality descriptor.
pub const LOCALITY_KEY: &str = "locality";
/// Key of the reconciled per-locality descriptors.
pub const LOCALITIES_KEY: &str = "localities";

/// Dimension names accepted in tile payloads, in axis order.
pub const TILE_DIMENSIONS: [&str; 3] = ["rows", "columns", "pages"];

/// Whether attaching `key` requires reconciliation with other localities.
#[inline]
pub fn is_tiling_key(key: &str) -> bool {
    key == TILE_KEY || key == LOCALITY_KEY
}

/// A key plus an ordered payload.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Annotation {
    pub key: String,
    pub payload: Vec<Value>,
}

impl Annotation {
    pub fn new(key: impl Into<String>, payload: Vec<Value>) -> Self {
        Annotation {
            key: key.into(),
            payload,
        }
    }

    /// `[key, payload...]` as a list value.
    pub fn to_value(&self) -> Value {
        let mut items = Vec::with_capacity(self.payload.len() + 1);
        items.push(Value::string(self.key.as_str()));
        items.extend(self.payload.iter().cloned());
        Value::list(items)
    }
}

/// The annotations attached to one value, in attachment order.
///
/// Empty sets cost one `None`; non-empty sets are shared between clones.
#[derive(Clone, Default)]
pub struct Annotations(Option<Heap<Vec<Annotation>>>);

impl Annotations {
    pub fn from_vec(annotations: Vec<Annotation>) -> Self {
        if annotations.is_empty() {
            Annotations(None)
        } else {
            Annotations(Some(Heap::new(annotations)))
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub fn len(&self) -> usize {
        self.0.as_ref().map_or(0, |list| list.len())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Annotation> {
        match &self.0 {
            Some(list) => list.iter(),
            None => [].iter(),
        }
    }

    /// The annotation stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&Annotation> {
        self.iter().find(|a| a.key == key)
    }

    /// Add `annotation`, replacing an existing one with the same key.
    #[must_use]
    pub fn with(&self, annotation: Annotation) -> Self {
        let mut list = match &self.0 {
            Some(list) => list.clone(),
            None => Heap::new(Vec::new()),
        };
        let entries = list.make_mut();
        match entries.iter_mut().find(|a| a.key == annotation.key) {
            Some(existing) => *existing = annotation,
            None => entries.push(annotation),
        }
        Annotations(Some(list))
    }
}

impl fmt::Debug for Annotations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// One dimension of a tile: the half-open index range `start..stop`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileSpan {
    pub dimension: String,
    pub start: i64,
    pub stop: i64,
}

/// A tile descriptor: which part of a logical array a local value holds.
///
/// Payload format: one `[dim_name, start, stop]` list per dimension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tile {
    spans: Vec<TileSpan>,
}

impl Tile {
    pub fn new(spans: Vec<TileSpan>) -> Self {
        Tile { spans }
    }

    /// Parse a `tile` payload.
    pub fn from_payload(payload: &[Value]) -> Result<Self, EvalError> {
        if payload.is_empty() || payload.len() > TILE_DIMENSIONS.len() {
            return Err(domain_error(
                "tile annotation (expected one to three dimensions)",
            ));
        }
        let mut spans: Vec<TileSpan> = Vec::with_capacity(payload.len());
        for dim in payload {
            let list = dim
                .as_list()
                .ok_or_else(|| type_mismatch("[dimension, start, stop]", dim.type_name()))?;
            let items = list.to_vec();
            let [name, start, stop] = items.as_slice() else {
                return Err(domain_error(
                    "tile annotation (each dimension is [name, start, stop])",
                ));
            };
            let dimension = name
                .as_str()
                .ok_or_else(|| type_mismatch("dimension name", name.type_name()))?;
            if !TILE_DIMENSIONS.contains(&dimension) {
                return Err(domain_error(&format!(
                    "tile annotation (unknown dimension `{dimension}`)"
                )));
            }
            if spans.iter().any(|s| s.dimension == dimension) {
                return Err(domain_error(&format!(
                    "tile annotation (dimension `{dimension}` given twice)"
                )));
            }
            let start = start
                .as_int()
                .ok_or_else(|| type_mismatch("integer", start.type_name()))?;
            let stop = stop
                .as_int()
                .ok_or_else(|| type_mismatch("integer", stop.type_name()))?;
            if start > stop {
                return Err(domain_error(&format!(
                    "tile annotation (`{dimension}` starts at {start} after its stop {stop})"
                )));
            }
            spans.push(TileSpan {
                dimension: dimension.to_string(),
                start,
                stop,
            });
        }
        Ok(Tile { spans })
    }

    pub fn spans(&self) -> &[TileSpan] {
        &self.spans
    }

    /// Dimension names in payload order.
    pub fn dimensions(&self) -> impl Iterator<Item = &str> {
        self.spans.iter().map(|s| s.dimension.as_str())
    }

    /// Whether both tiles describe the same set of dimensions.
    pub fn same_dimensions(&self, other: &Tile) -> bool {
        self.spans.len() == other.spans.len()
            && self
                .dimensions()
                .all(|d| other.dimensions().any(|o| o == d))
    }

    /// The span for `dimension`, if present.
    pub fn span(&self, dimension: &str) -> Option<&TileSpan> {
        self.spans.iter().find(|s| s.dimension == dimension)
    }

    pub fn to_payload(&self) -> Vec<Value> {
        self.spans
            .iter()
            .map(|s| {
                Value::list(vec![
                    Value::string(s.dimension.as_str()),
                    Value::int(s.start),
                    Value::int(s.stop),
                ])
            })
            .collect()
    }

    /// The smallest tile covering every tile in `tiles`.
    ///
    /// All tiles must name the same dimensions; `None` for an empty input.
    pub fn bounding(tiles: &[Tile]) -> Option<Result<Tile, EvalError>> {
        let (first, rest) = tiles.split_first()?;
        let mut extent = first.clone();
        for tile in rest {
            if !tile.same_dimensions(&extent) {
                return Some(Err(domain_error(
                    "tiling extent (tiles describe different dimensions)",
                )));
            }
            for span in &mut extent.spans {
                if let Some(other) = tile.span(&span.dimension) {
                    span.start = span.start.min(other.start);
                    span.stop = span.stop.max(other.stop);
                }
            }
        }
        Some(Ok(extent))
    }
}
