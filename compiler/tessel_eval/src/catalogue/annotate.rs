//! Annotations and their distributed reconciliation.
//!
//! Annotating with a tiling key (`tile`, `locality`) is a collective: every
//! locality evaluating the same node contributes its payload, and each one
//! gets back a `localities` annotation listing every contribution ordered by
//! locality id. All localities must evaluate the node, or the collective
//! times out.

use tracing::debug;

use tessel_patterns::annotation::{is_tiling_key, LOCALITIES_KEY, TILE_KEY};
use tessel_patterns::errors::{domain_error, type_mismatch};
use tessel_patterns::{
    Annotation, Annotations, DistributedSyncError, EvalContext, EvalError, EvalResult,
    PrimitiveName, Tile, Value,
};

fn annotations_of(value: &Value) -> Result<&Annotations, EvalError> {
    value
        .annotations()
        .ok_or_else(|| type_mismatch("array, list or dict (annotation target)", value.type_name()))
}

fn key_arg(value: &Value) -> Result<&str, EvalError> {
    value
        .as_str()
        .ok_or_else(|| type_mismatch("string key", value.type_name()))
}

/// `annotate(target, key, payload...)` and, with an explicit collective
/// basename, `annotate_d(target, basename, key, payload...)`.
pub(super) async fn annotate(
    node: &PrimitiveName,
    basename: Option<&Value>,
    target: Value,
    key: &Value,
    payload: Vec<Value>,
    ctx: &EvalContext,
) -> EvalResult {
    let key = key_arg(key)?;
    let mut annotations = annotations_of(&target)?.clone();
    let entries = if is_tiling_key(key) {
        let collective = match basename {
            Some(basename) => key_arg(basename)?.to_string(),
            None => node.collective_key(),
        };
        Some(reconcile(key, &collective, &payload, ctx).await?)
    } else {
        None
    };
    annotations = annotations.with(Annotation::new(key, payload));
    if let Some(entries) = entries {
        annotations = annotations.with(Annotation::new(LOCALITIES_KEY, entries));
    }
    target.with_annotations(annotations)
}

/// Exchange `payload` with every locality and build the `localities`
/// entries, `[locality_id, payload]` per locality.
async fn reconcile(
    key: &str,
    collective: &str,
    payload: &[Value],
    ctx: &EvalContext,
) -> Result<Vec<Value>, EvalError> {
    let local_tile = if key == TILE_KEY {
        Some(Tile::from_payload(payload)?)
    } else {
        None
    };
    let contributions = ctx
        .locality()
        .all_to_all(collective, Value::list(payload.to_vec()))
        .await?;
    debug!(
        collective,
        locality = ctx.locality().id(),
        participants = contributions.len(),
        "annotation reconciled"
    );

    let mut entries = Vec::with_capacity(contributions.len());
    for (id, contribution) in (0u32..).zip(contributions) {
        if let Some(local) = &local_tile {
            let tile = Tile::from_payload(&contribution.to_items()?)?;
            if !tile.same_dimensions(local) {
                return Err(DistributedSyncError::ContributionMismatch {
                    key: collective.to_string(),
                    reason: format!("locality {id} tiles different dimensions"),
                }
                .into());
            }
        }
        entries.push(Value::list(vec![Value::int(i64::from(id)), contribution]));
    }
    Ok(entries)
}

/// `annotation(value)`: every annotation as `[key, payload...]`.
pub(super) fn all_annotations(value: &Value) -> Value {
    let items = value
        .annotations()
        .map(|annotations| annotations.iter().map(Annotation::to_value).collect())
        .unwrap_or_default();
    Value::list(items)
}

/// `annotation(value, key)`: the payload stored under `key`, or `nil`.
pub(super) fn annotation(value: &Value, key: &Value) -> EvalResult {
    let key = key_arg(key)?;
    Ok(value
        .annotations()
        .and_then(|annotations| annotations.get(key))
        .map_or_else(Value::nil, |a| Value::list(a.payload.clone())))
}

/// `tiling_extent(value)`: the bounding tile of all reconciled tiles, or of
/// the local tile when the value was never reconciled.
pub(super) fn tiling_extent(value: &Value) -> EvalResult {
    let annotations = annotations_of(value)?;
    let tiles = if let Some(localities) = annotations.get(LOCALITIES_KEY) {
        localities
            .payload
            .iter()
            .map(|entry| {
                let items = entry.to_items()?;
                let [_, payload] = items.as_slice() else {
                    return Err(domain_error(
                        "tiling extent (localities entries are [id, tile])",
                    ));
                };
                Tile::from_payload(&payload.to_items()?)
            })
            .collect::<Result<Vec<_>, _>>()?
    } else if let Some(tile) = annotations.get(TILE_KEY) {
        vec![Tile::from_payload(&tile.payload)?]
    } else {
        return Err(domain_error("tiling extent (value carries no tile annotation)"));
    };
    match Tile::bounding(&tiles) {
        Some(extent) => Ok(Value::list(extent?.to_payload())),
        None => Err(domain_error("tiling extent (no tiles)")),
    }
}
