//! List/Array Mapper.
//!
//! Every element maps independently and source order is kept. A failing
//! element aborts the whole list with an error whose path ends in its index.

use serde_json::Value;
use std::any::Any;
use std::borrow::Cow;

use crate::builder::GraphBuilder;
use crate::connection;
use crate::descriptor::{Mapped, ScalarKind, TypeRef};
use crate::error::{MappingError, MappingResult};
use crate::path::FieldPath;
use crate::scalar::{self, Scalar};

/// Elements of a list-valued wire field. An object carrying the conventional
/// item array is unwrapped through the connection resolver.
fn elements<'v>(
    builder: &GraphBuilder<'_>,
    raw: &'v Value,
    path: &FieldPath,
) -> MappingResult<Cow<'v, [Value]>> {
    let keys = &builder.config.connection_keys;
    match raw {
        Value::Array(items) => Ok(Cow::Borrowed(items.as_slice())),
        Value::Object(map) if map.contains_key(&keys.items) => {
            Ok(Cow::Owned(connection::resolve(raw, keys).items))
        }
        other => Err(MappingError::structure(path, "array", other)),
    }
}

fn map_each<R, F>(
    builder: &GraphBuilder<'_>,
    raw: &Value,
    path: &mut FieldPath,
    mut map: F,
) -> MappingResult<Vec<R>>
where
    F: FnMut(&Value, &mut FieldPath) -> MappingResult<R>,
{
    let items = elements(builder, raw, path)?;
    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        path.push_index(index);
        let mapped = map(item, path);
        path.pop();
        out.push(mapped?);
    }
    Ok(out)
}

pub(crate) fn map_scalars(
    builder: &GraphBuilder<'_>,
    raw: &Value,
    kind: &ScalarKind,
    path: &mut FieldPath,
) -> MappingResult<Vec<Scalar>> {
    map_each(builder, raw, path, |item, path| {
        scalar::coerce(item, kind, builder.config, path)?.ok_or_else(|| {
            MappingError::coercion_with_reason(path, item, kind.name(), "null list element")
        })
    })
}

pub(crate) fn map_objects(
    builder: &GraphBuilder<'_>,
    raw: &Value,
    ty: &TypeRef,
    path: &mut FieldPath,
) -> MappingResult<Vec<Box<dyn Any>>> {
    map_each(builder, raw, path, |item, path| ty.build(builder, item, path))
}

/// Typed variant used for top-level lists.
pub(crate) fn map_list<T: Mapped>(
    builder: &GraphBuilder<'_>,
    raw: &Value,
    path: &mut FieldPath,
) -> MappingResult<Vec<T>> {
    map_each(builder, raw, path, |item, path| builder.build::<T>(item, path))
}
