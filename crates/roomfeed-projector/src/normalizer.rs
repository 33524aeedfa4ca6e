//! Raw change → canonical record → typed event.
//!
//! Pure transformation. The only failures are a change kind outside
//! added/modified/removed and a payload that does not decode into the
//! projected entity; both mean the source broke its contract and are
//! returned to the caller rather than skipped.

use roomfeed_core::{
    ChangeBatch, ChangeEvent, ChangeKind, Entity, FeedError, RawChange, Record, Result,
};

/// Canonicalize one raw change.
///
/// The document id becomes the record id. A payload field that is itself
/// called `id` is dropped so the id exists in exactly one place.
pub fn normalize(change: RawChange) -> Result<Record> {
    let kind: ChangeKind = change.kind.parse().map_err(|_| {
        FeedError::ProtocolViolation(format!(
            "unrecognized change kind '{}' for document '{}'",
            change.kind, change.document.id
        ))
    })?;

    let mut payload = change.document.fields;
    if payload.remove("id").is_some() {
        tracing::debug!(
            "Dropped 'id' field from payload of document {}",
            change.document.id
        );
    }

    Ok(Record {
        id: change.document.id,
        kind,
        payload,
    })
}

/// Canonicalize a whole batch, keeping source order.
///
/// Fails on the first bad change; no partial batch is returned.
pub fn normalize_batch(batch: ChangeBatch) -> Result<Vec<Record>> {
    batch.into_iter().map(normalize).collect()
}

/// Turn a record into a typed event for `T`.
pub fn to_event<T: Entity>(record: Record) -> Result<ChangeEvent<T>> {
    match record.kind {
        ChangeKind::Added => Ok(ChangeEvent::Added(T::from_document(record.into_document())?)),
        ChangeKind::Modified => Ok(ChangeEvent::Modified(T::from_document(
            record.into_document(),
        )?)),
        ChangeKind::Removed => Ok(ChangeEvent::Removed(record.id)),
    }
}

/// Normalize and decode a batch in one pass.
pub fn decode_batch<T: Entity>(batch: ChangeBatch) -> Result<Vec<ChangeEvent<T>>> {
    batch
        .into_iter()
        .map(|change| normalize(change).and_then(to_event::<T>))
        .collect()
}
