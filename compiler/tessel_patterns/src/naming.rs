//! Hierarchical primitive names.
//!
//! Every node of a compiled tree carries a name of the form
//!
//! ```text
//! /tessel$<locality>/<type>$<sequence>[$<instance>]/<compile_id>$<tag1>[$<tag2>]
//! ```
//!
//! The name is the sole handle by which a node is found across locality
//! boundaries, so composing and parsing must round-trip exactly. Parsing is
//! strict: anything that would not re-compose to the same text is rejected.

use std::fmt;
use std::str::FromStr;

/// Leading segment of every composed name.
pub const NAME_PREFIX: &str = "/tessel$";

/// Error produced by [`PrimitiveName::parse`] and [`PrimitiveName::validate`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("malformed primitive name `{input}`: {reason}")]
    Malformed { input: String, reason: String },
}

impl NameError {
    fn malformed(input: &str, reason: impl Into<String>) -> Self {
        NameError::Malformed {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// The structured parts of a primitive name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PrimitiveName {
    /// Locality that owns the node.
    pub locality: u32,
    /// Primitive type, e.g. `block` or `__add`.
    pub primitive: String,
    /// Per-type sequence number within one compilation.
    pub sequence: u64,
    /// Named entity the node stands for (functions and variables).
    pub instance: Option<String>,
    /// The compile invocation that created the node.
    pub compile_id: u64,
    /// Source line, or `-1` when unknown.
    pub tag1: i64,
    /// Source column.
    pub tag2: Option<i64>,
}

impl PrimitiveName {
    pub fn new(
        locality: u32,
        primitive: impl Into<String>,
        sequence: u64,
        compile_id: u64,
        tag1: i64,
    ) -> Self {
        PrimitiveName {
            locality,
            primitive: primitive.into(),
            sequence,
            instance: None,
            compile_id,
            tag1,
            tag2: None,
        }
    }

    #[must_use]
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    #[must_use]
    pub fn with_tag2(mut self, tag2: i64) -> Self {
        self.tag2 = Some(tag2);
        self
    }

    /// Same node, owned by another locality.
    #[must_use]
    pub fn on_locality(&self, locality: u32) -> Self {
        PrimitiveName {
            locality,
            ..self.clone()
        }
    }

    /// Check that the parts compose to a parseable name.
    pub fn validate(&self) -> Result<(), NameError> {
        check_segment(&self.primitive, "primitive type").map_err(|reason| {
            NameError::malformed(&self.compose(), reason)
        })?;
        if let Some(instance) = &self.instance {
            check_segment(instance, "instance")
                .map_err(|reason| NameError::malformed(&self.compose(), reason))?;
        }
        Ok(())
    }

    /// The full name text.
    pub fn compose(&self) -> String {
        self.to_string()
    }

    /// The name without its locality segment.
    ///
    /// Identical code compiled on different localities yields identical
    /// basenames, which makes this the rendezvous key for collectives.
    pub fn basename(&self) -> String {
        let mut out = String::new();
        self.write_basename(&mut out);
        out
    }

    /// Key under which corresponding nodes on all localities meet.
    pub fn collective_key(&self) -> String {
        match &self.instance {
            Some(instance) => format!("{}${}", self.primitive, instance),
            None => self.basename(),
        }
    }

    fn write_basename(&self, out: &mut String) {
        use std::fmt::Write;
        // Writing into a String cannot fail.
        let _ = write!(out, "/{}${}", self.primitive, self.sequence);
        if let Some(instance) = &self.instance {
            let _ = write!(out, "${instance}");
        }
        let _ = write!(out, "/{}${}", self.compile_id, self.tag1);
        if let Some(tag2) = self.tag2 {
            let _ = write!(out, "${tag2}");
        }
    }

    /// Parse a composed name.
    pub fn parse(input: &str) -> Result<Self, NameError> {
        let rest = input
            .strip_prefix(NAME_PREFIX)
            .ok_or_else(|| NameError::malformed(input, format!("missing `{NAME_PREFIX}` prefix")))?;

        let mut segments = rest.split('/');
        let (Some(locality), Some(component), Some(compile), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(NameError::malformed(input, "expected three `/` segments"));
        };

        let locality = locality
            .parse::<u32>()
            .map_err(|_| NameError::malformed(input, "locality is not a number"))?;

        let mut parts = component.split('$');
        let primitive = parts.next().unwrap_or_default();
        check_segment(primitive, "primitive type").map_err(|r| NameError::malformed(input, r))?;
        let sequence = parts
            .next()
            .ok_or_else(|| NameError::malformed(input, "missing sequence number"))?
            .parse::<u64>()
            .map_err(|_| NameError::malformed(input, "sequence is not a number"))?;
        let instance = parts.next().map(str::to_string);
        if let Some(instance) = &instance {
            check_segment(instance, "instance").map_err(|r| NameError::malformed(input, r))?;
        }
        if parts.next().is_some() {
            return Err(NameError::malformed(input, "too many `$` parts in component"));
        }

        let mut parts = compile.split('$');
        let compile_id = parts
            .next()
            .unwrap_or_default()
            .parse::<u64>()
            .map_err(|_| NameError::malformed(input, "compile id is not a number"))?;
        let tag1 = parts
            .next()
            .ok_or_else(|| NameError::malformed(input, "missing tag"))?
            .parse::<i64>()
            .map_err(|_| NameError::malformed(input, "tag is not a number"))?;
        let tag2 = parts
            .next()
            .map(|t| {
                t.parse::<i64>()
                    .map_err(|_| NameError::malformed(input, "second tag is not a number"))
            })
            .transpose()?;
        if parts.next().is_some() {
            return Err(NameError::malformed(input, "too many `$` parts in tags"));
        }

        let name = PrimitiveName {
            locality,
            primitive: primitive.to_string(),
            sequence,
            instance,
            compile_id,
            tag1,
            tag2,
        };
        // Reject spellings such as `+1` or `007` that parse but do not
        // compose back to the input.
        if name.compose() != input {
            return Err(NameError::malformed(input, "name is not in canonical form"));
        }
        Ok(name)
    }
}

fn check_segment(segment: &str, what: &str) -> Result<(), String> {
    if segment.is_empty() {
        return Err(format!("{what} is empty"));
    }
    if segment.contains(['/', '$']) {
        return Err(format!("{what} `{segment}` contains `/` or `$`"));
    }
    Ok(())
}

impl fmt::Display for PrimitiveName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut base = String::new();
        self.write_basename(&mut base);
        write!(f, "{NAME_PREFIX}{}{base}", self.locality)
    }
}

impl FromStr for PrimitiveName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PrimitiveName::parse(s)
    }
}
