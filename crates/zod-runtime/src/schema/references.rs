//! Construction-time references
//!
//! A reference declares that one slot of an object (or tuple) takes the
//! schema already declared at another path of the same definition. The
//! target is looked up and copied into the slot when the reference is added,
//! so parsing never sees a reference and a bad one fails at construction.
//!
//! Targets are walked through nested object shapes and tuple item lists.
//! Keys address object fields; numeric segments (`items[1]` or `items.1`)
//! address tuple positions.

use super::{ObjectSchema, Schema, SchemaKind, Shape, TupleSchema};
use crate::error::SchemaError;
use crate::path::{Path, PathSegment};
use tracing::debug;

impl ObjectSchema {
    /// Declare `slot` with the schema found at `target`.
    ///
    /// # Errors
    ///
    /// Fails when either path does not parse, the target is missing, passes
    /// through a node that is neither an object nor a tuple, or is a delete
    /// marker, the slot and target lie on one ancestry line, or the slot is
    /// already declared.
    pub fn with_reference(self, slot: &str, target: &str) -> Result<Self, SchemaError> {
        self.with_reference_at(Path::parse(slot)?, Path::parse(target)?)
    }

    /// Apply several references in order. Later ones can target earlier slots.
    pub fn with_references<'s>(
        self,
        references: impl IntoIterator<Item = (&'s str, &'s str)>,
    ) -> Result<Self, SchemaError> {
        references
            .into_iter()
            .try_fold(self, |schema, (slot, target)| schema.with_reference(slot, target))
    }

    /// [`with_reference`](Self::with_reference) with parsed paths.
    pub fn with_reference_at(mut self, slot: Path, target: Path) -> Result<Self, SchemaError> {
        check_lineage(&slot, &target)?;
        let start = target
            .first()
            .and_then(|first| self.shape.get(&first.as_key()))
            .ok_or_else(|| SchemaError::MissingTarget {
                target: target.clone(),
            })?;
        let resolved = walk(start, &target)?.clone();
        insert_into_shape(&mut self.shape, &slot, 0, resolved)?;
        debug!(slot = %slot, target = %target, "Reference resolved");
        Ok(self)
    }
}

impl TupleSchema {
    /// Declare position `index` with the schema found at `target`, a path
    /// into this tuple's items. `index` must be the next free position.
    ///
    /// # Errors
    ///
    /// As [`ObjectSchema::with_reference`]; additionally
    /// [`SchemaError::SlotOutOfRange`] when `index` skips positions.
    pub fn with_reference(self, index: usize, target: &str) -> Result<Self, SchemaError> {
        self.with_reference_at(index, Path::parse(target)?)
    }

    pub fn with_reference_at(mut self, index: usize, target: Path) -> Result<Self, SchemaError> {
        let slot = Path::root().child(index);
        check_lineage(&slot, &target)?;
        let start = target
            .first()
            .and_then(tuple_index)
            .and_then(|position| self.items.get(position))
            .ok_or_else(|| SchemaError::MissingTarget {
                target: target.clone(),
            })?;
        let resolved = walk(start, &target)?.clone();
        self.place(&slot, index, resolved)?;
        debug!(slot = %slot, target = %target, "Reference resolved");
        Ok(self)
    }
}

/// Reject self references and slots that contain, or sit inside, their
/// target.
fn check_lineage(slot: &Path, target: &Path) -> Result<(), SchemaError> {
    if slot.is_empty() {
        return Err(SchemaError::SlotOccupied { slot: slot.clone() });
    }
    if slot == target {
        return Err(SchemaError::SelfReference { slot: slot.clone() });
    }
    if slot.starts_with(target) || target.starts_with(slot) {
        return Err(SchemaError::CyclicReference {
            slot: slot.clone(),
            target: target.clone(),
        });
    }
    Ok(())
}

fn tuple_index(segment: &PathSegment) -> Option<usize> {
    match segment {
        PathSegment::Index(index) => Some(*index),
        PathSegment::Key(key) => key.parse().ok(),
    }
}

fn prefix(path: &Path, len: usize) -> Path {
    Path::from_segments(path.iter().take(len).cloned())
}

/// Follow `target` from `start`, the node at its first segment.
fn walk<'s>(start: &'s Schema, target: &Path) -> Result<&'s Schema, SchemaError> {
    let missing = || SchemaError::MissingTarget {
        target: target.clone(),
    };
    let mut current = start;
    for (depth, segment) in target.iter().enumerate().skip(1) {
        let next = match current.kind() {
            SchemaKind::Object(object) => object.shape.get(&segment.as_key()),
            SchemaKind::Tuple(tuple) => tuple_index(segment).and_then(|i| tuple.items.get(i)),
            other => {
                return Err(SchemaError::NotTraversable {
                    target: target.clone(),
                    at: prefix(target, depth),
                    kind: other.name(),
                });
            }
        };
        current = next.ok_or_else(missing)?;
    }
    if current.is_delete() {
        return Err(SchemaError::DeletedTarget {
            target: target.clone(),
        });
    }
    Ok(current)
}

fn insert_into_shape(
    shape: &mut Shape,
    slot: &Path,
    depth: usize,
    schema: Schema,
) -> Result<(), SchemaError> {
    let key = slot.segments()[depth].as_key();
    if depth + 1 == slot.len() {
        if shape.contains_key(&key) {
            return Err(SchemaError::SlotOccupied { slot: slot.clone() });
        }
        shape.insert(key, schema);
        return Ok(());
    }
    let parent = shape.get(&key).ok_or_else(|| SchemaError::MissingTarget {
        target: prefix(slot, depth + 1),
    })?;
    let updated = insert_into_node(parent, slot, depth + 1, schema)?;
    shape.insert(key, updated);
    Ok(())
}

/// Copy of `node` with `schema` placed at `slot[depth..]`.
fn insert_into_node(
    node: &Schema,
    slot: &Path,
    depth: usize,
    schema: Schema,
) -> Result<Schema, SchemaError> {
    match node.kind() {
        SchemaKind::Object(object) => {
            let mut object = object.clone();
            insert_into_shape(&mut object.shape, slot, depth, schema)?;
            Ok(object.into())
        }
        SchemaKind::Tuple(tuple) => {
            let mut tuple = tuple.clone();
            let index = tuple_index(&slot.segments()[depth]).ok_or_else(|| {
                SchemaError::MissingTarget {
                    target: prefix(slot, depth + 1),
                }
            })?;
            if depth + 1 == slot.len() {
                tuple.place(slot, index, schema)?;
            } else {
                let item = tuple.items.get(index).ok_or_else(|| SchemaError::MissingTarget {
                    target: prefix(slot, depth + 1),
                })?;
                let updated = insert_into_node(item, slot, depth + 1, schema)?;
                tuple.items[index] = updated;
            }
            Ok(tuple.into())
        }
        other => Err(SchemaError::NotTraversable {
            target: slot.clone(),
            at: prefix(slot, depth),
            kind: other.name(),
        }),
    }
}
