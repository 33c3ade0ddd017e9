//! Animation-curve bookkeeping for proxy attributes.
//!
//! A proxy is "curve-backed" when exactly one curve on the owner's animation
//! data is bound to its path. `observe` reports where the lookup stops;
//! `get`/`delete` act only on valid states.

use serde::{Deserialize, Serialize};

use vdriver_api_core::{CurveId, CurveStore, ObjectId, SceneHost};

/// Outcome of looking up curves bound to `(owner, data_path, array_index)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CurveState {
    /// Owner missing or not a live object.
    InputId,
    InputDataPath,
    InputArrayIndex,
    /// Owner has no animation data.
    AnimationData,
    /// No curve on the data path.
    DataPath,
    /// Curves on the data path, none on the array index.
    ArrayIndex,
    ValidDuplicate,
    ValidOne,
}

impl CurveState {
    pub fn is_valid(self) -> bool {
        matches!(self, CurveState::ValidOne | CurveState::ValidDuplicate)
    }
}

pub fn observe<H>(
    host: &H,
    owner: Option<ObjectId>,
    data_path: &str,
    array_index: i32,
) -> CurveState
where
    H: SceneHost + CurveStore + ?Sized,
{
    let Some(owner) = owner.filter(|id| host.contains(*id)) else {
        return CurveState::InputId;
    };
    if data_path.is_empty() {
        return CurveState::InputDataPath;
    }
    if array_index < 0 {
        return CurveState::InputArrayIndex;
    }
    let Some(bindings) = host.bindings(owner) else {
        return CurveState::AnimationData;
    };
    let on_path: Vec<_> = bindings
        .iter()
        .filter(|b| b.data_path == data_path)
        .collect();
    if on_path.is_empty() {
        return CurveState::DataPath;
    }
    match on_path
        .iter()
        .filter(|b| b.array_index as i64 == i64::from(array_index))
        .count()
    {
        0 => CurveState::ArrayIndex,
        1 => CurveState::ValidOne,
        _ => CurveState::ValidDuplicate,
    }
}

/// Curves bound to the path; empty unless the state is valid.
pub fn get<H>(host: &H, owner: ObjectId, data_path: &str, array_index: usize) -> Vec<CurveId>
where
    H: SceneHost + CurveStore + ?Sized,
{
    let state = observe(host, Some(owner), data_path, index_arg(array_index));
    if state.is_valid() {
        host.curves_bound_to(owner, data_path, array_index)
    } else {
        Vec::new()
    }
}

/// Remove every curve bound to the path; returns how many were removed.
pub fn delete<H>(host: &mut H, owner: ObjectId, data_path: &str, array_index: usize) -> usize
where
    H: SceneHost + CurveStore + ?Sized,
{
    get(&*host, owner, data_path, array_index)
        .into_iter()
        .filter(|curve| host.remove_curve(owner, *curve))
        .count()
}

fn index_arg(array_index: usize) -> i32 {
    i32::try_from(array_index).unwrap_or(i32::MAX)
}

/// Correct a curve flag against the store: a set flag without a curve resets
/// to false, a cleared flag deletes whatever is still bound. Returns the flag
/// value that matches the store.
pub fn reconcile_flag<H>(host: &mut H, owner: ObjectId, data_path: &str, flag: bool) -> bool
where
    H: SceneHost + CurveStore + ?Sized,
{
    let bound = get(&*host, owner, data_path, 0);
    if flag {
        !bound.is_empty()
    } else {
        if !bound.is_empty() {
            let removed = delete(host, owner, data_path, 0);
            log::debug!("flag cleared on '{data_path}'; removed {removed} curve(s)");
        }
        false
    }
}

/// One side of a curve sync: a proxy path and its curve flag.
#[derive(Copy, Clone, Debug)]
pub struct CurveEnd<'a> {
    pub path: &'a str,
    pub has_curve: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CurveSync {
    /// Neither side claims a curve.
    Skipped,
    /// Source had no curve; both flags must be cleared.
    Cleared,
    /// Source had several curves; both flags must be cleared and the state reported.
    Duplicate(usize),
    /// Source curve cloned onto the destination path.
    Cloned(CurveId),
}

/// Make `to`'s curve a copy of `from`'s. The caller applies the resulting
/// flags.
pub fn sync_curve<H>(
    host: &mut H,
    owner: ObjectId,
    from: CurveEnd<'_>,
    to: CurveEnd<'_>,
) -> CurveSync
where
    H: SceneHost + CurveStore + ?Sized,
{
    if !from.has_curve && !to.has_curve {
        return CurveSync::Skipped;
    }
    delete(host, owner, to.path, 0);

    let source = get(&*host, owner, from.path, 0);
    match source.as_slice() {
        [] => CurveSync::Cleared,
        [curve] => match host.clone_curve(owner, *curve) {
            Some(copy) if host.set_curve_target(owner, copy, to.path, 0) => {
                CurveSync::Cloned(copy)
            }
            Some(copy) => {
                host.remove_curve(owner, copy);
                log::warn!("could not retarget curve copy to '{}'", to.path);
                CurveSync::Cleared
            }
            None => CurveSync::Cleared,
        },
        many => CurveSync::Duplicate(many.len()),
    }
}

/// Rebind curves from `from_path` to `to_path`; returns how many moved.
pub fn retarget<H>(host: &mut H, owner: ObjectId, from_path: &str, to_path: &str) -> usize
where
    H: SceneHost + CurveStore + ?Sized,
{
    get(&*host, owner, from_path, 0)
        .into_iter()
        .filter(|curve| host.set_curve_target(owner, *curve, to_path, 0))
        .count()
}
