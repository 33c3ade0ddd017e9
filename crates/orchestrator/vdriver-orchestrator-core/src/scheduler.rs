use indexmap::IndexSet;

use vdriver_api_core::{DataPath, ObjectId, ProxyValue, WriteBatch, WriteOp};
use vdriver_core::{classify, FieldValue, Host};

use crate::diagnostics::{EntryOutcome, EntryRecord, EntryRef};
use crate::{EvaluationFrame, Orchestrator, WriteFailure};

/// Fields of an entry a pass needs, read before any write-back.
struct Pending {
    name: String,
    is_valid: bool,
    mute: bool,
    root: Option<ObjectId>,
    data_path: String,
    proxy: Option<ProxyValue>,
}

/// Run one evaluation pass over the changed objects that own driver entries.
///
/// Returns `None` without touching anything when a pass is already running
/// (re-entrant call) or when no changed object owns a driver context.
pub fn run_pass<H: Host + ?Sized>(
    orchestrator: &mut Orchestrator,
    host: &mut H,
    changed: &[ObjectId],
) -> Option<EvaluationFrame> {
    if orchestrator.lock.is_held() {
        log::debug!("evaluation pass already running; skipping nested call");
        return None;
    }
    let owners: IndexSet<ObjectId> = changed
        .iter()
        .copied()
        .filter(|id| owner_is_active(orchestrator, *id))
        .collect();
    if owners.is_empty() {
        return None;
    }

    let _guard = orchestrator.lock.try_acquire()?;
    orchestrator.pass = orchestrator.pass.wrapping_add(1);
    let mut frame = EvaluationFrame {
        pass: orchestrator.pass,
        writes: WriteBatch::new(),
        invalidated: Vec::new(),
        failures: Vec::new(),
        records: Vec::new(),
    };

    for owner in owners {
        evaluate_owner(orchestrator, host, owner, &mut frame);
    }
    Some(frame)
}

fn owner_is_active(orchestrator: &Orchestrator, owner: ObjectId) -> bool {
    orchestrator
        .drivers
        .context(owner)
        .map(|ctx| !ctx.entries.is_empty() && ctx.selected().is_some())
        .unwrap_or(false)
}

fn evaluate_owner<H: Host + ?Sized>(
    orchestrator: &mut Orchestrator,
    host: &mut H,
    owner: ObjectId,
    frame: &mut EvaluationFrame,
) {
    let clamp = orchestrator.drivers.config().clamp_proxy_to_hard_range;
    let record = orchestrator.diagnostics.enabled;
    let len = orchestrator
        .drivers
        .context(owner)
        .map(|ctx| ctx.entries.len())
        .unwrap_or(0);

    for index in 0..len {
        let Ok(ctx) = orchestrator.drivers.context(owner) else {
            return;
        };
        let Some(entry) = ctx.entries.get(index) else {
            return;
        };
        let pending = Pending {
            name: entry.name.clone(),
            is_valid: entry.is_valid,
            mute: entry.mute,
            root: entry.root,
            data_path: entry.data_path.clone(),
            proxy: entry.proxy.clone(),
        };
        let at = EntryRef { owner, index };

        let outcome = evaluate_entry(orchestrator, host, at, &pending, clamp, frame);
        if record {
            frame.records.push(EntryRecord {
                entry: at,
                name: pending.name,
                outcome,
            });
        }
    }
}

fn evaluate_entry<H: Host + ?Sized>(
    orchestrator: &mut Orchestrator,
    host: &mut H,
    at: EntryRef,
    entry: &Pending,
    clamp: bool,
    frame: &mut EvaluationFrame,
) -> EntryOutcome {
    if !entry.is_valid {
        return EntryOutcome::SkippedInvalid;
    }
    if entry.mute {
        return EntryOutcome::SkippedMuted;
    }
    let Some(proxy) = &entry.proxy else {
        return EntryOutcome::NoProxy;
    };

    let info = entry
        .root
        .and_then(|root| classify(&*host, root, &entry.data_path));
    let Some(info) = info else {
        log::warn!(
            "entry '{}' ({}) no longer resolves '{}'; marking invalid",
            entry.name,
            at.index,
            entry.data_path
        );
        if let Err(err) = orchestrator.drivers.set_entry_field(
            host,
            at.owner,
            at.index,
            FieldValue::IsValid(false),
        ) {
            log::warn!("could not invalidate entry {}: {err}", at.index);
        }
        frame.invalidated.push(at);
        return EntryOutcome::Invalidated;
    };

    let Some(value) = info.conform(proxy, clamp) else {
        let error = format!("{} value does not fit '{}'", proxy.kind(), info.full_path);
        log::warn!("entry '{}': {error}", entry.name);
        frame.failures.push(WriteFailure {
            entry: at,
            error: error.clone(),
        });
        return EntryOutcome::WriteFailed(error);
    };

    match host.write_attribute(info.root, &info.full_path, info.write_index(), &value) {
        Ok(()) => {
            match DataPath::parse(&info.full_path) {
                Ok(path) => frame.writes.push(WriteOp::new_indexed(
                    info.root,
                    path,
                    info.write_index(),
                    value,
                )),
                Err(err) => log::debug!("write to '{}' not recorded: {err}", info.full_path),
            }
            EntryOutcome::Written
        }
        Err(err) => {
            log::warn!("entry '{}' failed to write: {err}", entry.name);
            let error = err.to_string();
            frame.failures.push(WriteFailure {
                entry: at,
                error: error.clone(),
            });
            EntryOutcome::WriteFailed(error)
        }
    }
}
