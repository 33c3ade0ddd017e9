//! Keeps each owner's live block, persisted entries and proxy curves in step.
//!
//! Edits to the live block mirror into the selected entry, edits to the
//! selected entry mirror into the live block, and changing the selection
//! copies the entry into the live block. [`TraceMode`] marks the direction of
//! a mirror in flight so the opposite callback does not echo it back.

use indexmap::IndexMap;

use vdriver_api_core::{ChangeHook, HostValue, ObjectId, ProxyValue, SceneHost};

use crate::classify::{classify, AnimatableInfo};
use crate::curve::{self, CurveEnd, CurveSync};
use crate::entries::{Block, DriverContext, DriverField, FieldValue, TraceBlock};
use crate::schema_copy::copy_schema;
use crate::trace::{TraceMode, TraceModeCell};
use crate::{Config, DriverError, Host};

/// Driver contexts keyed by owner object.
#[derive(Debug, Default)]
pub struct Drivers {
    config: Config,
    contexts: IndexMap<ObjectId, DriverContext>,
    mode: TraceModeCell,
    on_proxy_change: ChangeHook,
}

impl Drivers {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn mode(&self) -> TraceMode {
        self.mode.get()
    }

    /// Handle on the trace mode shared with every sync this coordinator runs.
    pub fn mode_cell(&self) -> TraceModeCell {
        self.mode.clone()
    }

    /// Hook fired whenever a proxy value is written; wired into every schema
    /// copied from now on.
    pub fn set_proxy_hook(&mut self, hook: ChangeHook) {
        self.on_proxy_change = hook;
    }

    /// Give `owner` a driver context, creating an empty one if needed.
    pub fn attach(&mut self, owner: ObjectId) -> &mut DriverContext {
        let id_type = self.config.default_id_type;
        self.contexts
            .entry(owner)
            .or_insert_with(|| DriverContext::new(id_type))
    }

    /// Install previously persisted state for `owner`, replacing any existing context.
    pub fn insert_context(&mut self, owner: ObjectId, context: DriverContext) {
        self.contexts.insert(owner, context);
    }

    pub fn detach(&mut self, owner: ObjectId) -> Option<DriverContext> {
        self.contexts.shift_remove(&owner)
    }

    pub fn owns(&self, owner: ObjectId) -> bool {
        self.contexts.contains_key(&owner)
    }

    pub fn owners(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.contexts.keys().copied()
    }

    pub fn contexts(&self) -> impl Iterator<Item = (ObjectId, &DriverContext)> + '_ {
        self.contexts.iter().map(|(id, ctx)| (*id, ctx))
    }

    pub fn context(&self, owner: ObjectId) -> Result<&DriverContext, DriverError> {
        self.contexts
            .get(&owner)
            .ok_or(DriverError::UnknownContext(owner))
    }

    fn context_mut(&mut self, owner: ObjectId) -> Result<&mut DriverContext, DriverError> {
        self.contexts
            .get_mut(&owner)
            .ok_or(DriverError::UnknownContext(owner))
    }

    fn block_mut(&mut self, owner: ObjectId, block: Block) -> Result<&mut TraceBlock, DriverError> {
        let ctx = self.context_mut(owner)?;
        let len = ctx.entries.len();
        match block {
            Block::Live => Ok(&mut ctx.live),
            Block::Entry(index) => ctx
                .entries
                .get_mut(index)
                .ok_or(DriverError::EntryOutOfRange { index, len }),
        }
    }

    // ---- editing surface ----

    /// Edit a field of the live block; mirrors into the selected entry.
    pub fn set_live_field<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        owner: ObjectId,
        value: FieldValue,
    ) -> Result<(), DriverError> {
        self.write(host, owner, Block::Live, value)
    }

    /// Edit a field of entry `index`; mirrors into the live block when the
    /// entry is selected.
    pub fn set_entry_field<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        owner: ObjectId,
        index: usize,
        value: FieldValue,
    ) -> Result<(), DriverError> {
        self.write(host, owner, Block::Entry(index), value)
    }

    /// Select entry `index` (or nothing) and copy it into the live block.
    pub fn set_active_index<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        owner: ObjectId,
        index: Option<usize>,
    ) -> Result<(), DriverError> {
        let ctx = self.context_mut(owner)?;
        if let Some(index) = index {
            let len = ctx.entries.len();
            if index >= len {
                return Err(DriverError::EntryOutOfRange { index, len });
            }
        }
        ctx.active_index = index;
        self.on_selection_index_changed(host, owner)
    }

    /// Append a fresh entry and select it. Returns its position.
    pub fn add_entry<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        owner: ObjectId,
    ) -> Result<usize, DriverError> {
        let index = self.context(owner)?.entries.len();
        let entry = TraceBlock::new(
            self.config.entry_name(index + 1),
            index,
            self.config.default_id_type,
        );
        self.context_mut(owner)?.entries.push(entry);
        log::debug!("added entry {index} on {owner}");
        self.set_active_index(host, owner, Some(index))?;
        Ok(index)
    }

    /// Remove entry `index` along with its curve. Later entries shift down,
    /// their curves follow, and the selection stays on the same entry (a
    /// removed selection falls to the entry that took its place, or the new
    /// last one). Emptying the list resets the live block.
    pub fn remove_entry<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        owner: ObjectId,
        index: usize,
    ) -> Result<(), DriverError> {
        let len = self.context(owner)?.entries.len();
        if index >= len {
            return Err(DriverError::EntryOutOfRange { index, len });
        }
        curve::delete(host, owner, &self.config.entry_proxy_path(index), 0);

        let ctx = self.context_mut(owner)?;
        let previous = ctx.active_index;
        ctx.entries.remove(index);
        for entry in ctx.entries.iter_mut().filter(|e| e.index > index) {
            entry.index -= 1;
        }
        let remaining = ctx.entries.len();

        for j in index..remaining {
            let from = self.config.entry_proxy_path(j + 1);
            let to = self.config.entry_proxy_path(j);
            curve::retarget(host, owner, &from, &to);
        }
        log::debug!("removed entry {index} on {owner}; {remaining} left");

        let Some(last) = remaining.checked_sub(1) else {
            return self.reset_live(host, owner);
        };
        let selection = previous.map(|active| {
            let shifted = if active > index { active - 1 } else { active };
            shifted.min(last)
        });
        self.set_active_index(host, owner, selection)
    }

    /// Clear the live block and its curve once no entry is left to mirror.
    fn reset_live<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        owner: ObjectId,
    ) -> Result<(), DriverError> {
        curve::delete(host, owner, &self.config.live_proxy_path(), 0);
        let id_type = self.config.default_id_type;
        let ctx = self.context_mut(owner)?;
        ctx.active_index = None;
        ctx.live = TraceBlock::new(String::new(), 0, id_type);
        Ok(())
    }

    // ---- sync protocol ----

    fn write<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        owner: ObjectId,
        block: Block,
        value: FieldValue,
    ) -> Result<(), DriverError> {
        let field = value.field();
        let clamp = self.config.clamp_proxy_to_hard_range;
        let direct = self.mode.get() == TraceMode::Direct;

        let target = self.block_mut(owner, block)?;
        let value = match (value, &target.schema) {
            (FieldValue::Proxy(Some(v)), Some(schema)) => match schema.conform(&v, clamp) {
                Some(conformed) => FieldValue::Proxy(Some(conformed)),
                // mirrored entry values are taken as stored
                None if direct => FieldValue::Proxy(Some(v)),
                None => {
                    return Err(DriverError::ProxyRejected {
                        expected: schema.kind(),
                        found: v.kind(),
                    })
                }
            },
            (value, _) => value,
        };
        let changed = target.set(value);
        if field == DriverField::Proxy {
            if let (Some(schema), Some(v)) = (&target.schema, &target.proxy) {
                schema.notify(v);
            }
        }

        if field == DriverField::HasCurve {
            self.reconcile_curve_flag(host, owner, block)?;
        }
        match block {
            Block::Live => match field {
                DriverField::IdType if changed && !direct => {
                    self.write(host, owner, Block::Live, FieldValue::Root(None))?;
                }
                DriverField::Root | DriverField::DataPath => self.revalidate(host, owner, block)?,
                _ => {}
            },
            // a live -> entry mirror already carries the revalidated fields
            Block::Entry(_) => {
                let mirrored = self.mode.get() == TraceMode::Panel;
                if !mirrored && matches!(field, DriverField::Root | DriverField::DataPath) {
                    self.revalidate(host, owner, block)?;
                }
            }
        }

        match block {
            Block::Live => self.on_live_field_changed(host, owner, field),
            Block::Entry(index) => self.on_persisted_field_changed(host, owner, index, field),
        }
    }

    fn reconcile_curve_flag<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        owner: ObjectId,
        block: Block,
    ) -> Result<(), DriverError> {
        let path = self.config.proxy_path(block);
        let target = self.block_mut(owner, block)?;
        let flag = target.has_curve;
        let corrected = curve::reconcile_flag(host, owner, &path, flag);
        if corrected != flag {
            log::debug!("no curve bound to '{path}'; clearing the flag");
            target.has_curve = corrected;
        }
        Ok(())
    }

    /// Mirror a live edit into the selected entry. Stands down while an
    /// entry -> live mirror is running.
    pub fn on_live_field_changed<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        owner: ObjectId,
        field: DriverField,
    ) -> Result<(), DriverError> {
        // the live index tracks the selection, never the other way round
        if self.mode.get() == TraceMode::Direct || field == DriverField::Index {
            return Ok(());
        }
        let ctx = self.context(owner)?;
        let Some(active) = ctx.selected() else {
            return Ok(());
        };
        let value = ctx.live.get(field);

        let _scope = self.mode.enter(TraceMode::Panel);
        if field == DriverField::HasCurve {
            return self.sync_curves(host, owner, Block::Live, Block::Entry(active));
        }
        self.write(host, owner, Block::Entry(active), value)
    }

    /// Mirror an entry edit into the live block when the entry is selected.
    /// Stands down while a live -> entry mirror is running.
    pub fn on_persisted_field_changed<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        owner: ObjectId,
        index: usize,
        field: DriverField,
    ) -> Result<(), DriverError> {
        if self.mode.get() == TraceMode::Panel {
            return Ok(());
        }
        let ctx = self.context(owner)?;
        if ctx.selected() != Some(index) {
            return Ok(());
        }
        let value = ctx.entries[index].get(field);

        let _scope = self.mode.enter(TraceMode::Direct);
        if field == DriverField::HasCurve {
            return self.sync_curves(host, owner, Block::Entry(index), Block::Live);
        }
        self.write(host, owner, Block::Live, value)
    }

    /// Copy the selected entry into the live block, curve included.
    pub fn on_selection_index_changed<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        owner: ObjectId,
    ) -> Result<(), DriverError> {
        if self.mode.get() == TraceMode::Panel {
            return Ok(());
        }
        let Some(active) = self.context(owner)?.selected() else {
            return Ok(());
        };

        let _scope = self.mode.enter(TraceMode::Direct);
        for field in DriverField::SELECTION {
            let value = self.context(owner)?.entries[active].get(field);
            self.write(host, owner, Block::Live, value)?;
        }
        self.sync_curves(host, owner, Block::Entry(active), Block::Live)
    }

    fn sync_curves<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        owner: ObjectId,
        from: Block,
        to: Block,
    ) -> Result<(), DriverError> {
        let (from_path, to_path) = (self.config.proxy_path(from), self.config.proxy_path(to));
        let from_flag = self.block_mut(owner, from)?.has_curve;
        let to_flag = self.block_mut(owner, to)?.has_curve;

        let outcome = curve::sync_curve(
            host,
            owner,
            CurveEnd {
                path: &from_path,
                has_curve: from_flag,
            },
            CurveEnd {
                path: &to_path,
                has_curve: to_flag,
            },
        );
        match outcome {
            CurveSync::Skipped => Ok(()),
            CurveSync::Cloned(copy) => {
                log::debug!("cloned curve onto '{to_path}' as {copy:?}");
                self.block_mut(owner, to)?.has_curve = true;
                Ok(())
            }
            CurveSync::Cleared => {
                self.block_mut(owner, from)?.has_curve = false;
                self.block_mut(owner, to)?.has_curve = false;
                Ok(())
            }
            CurveSync::Duplicate(count) => {
                self.block_mut(owner, from)?.has_curve = false;
                self.block_mut(owner, to)?.has_curve = false;
                log::error!("{count} curves bound to '{from_path}' on {owner}; not syncing");
                Err(DriverError::DuplicateCurve {
                    owner,
                    path: from_path,
                    array_index: 0,
                    count,
                })
            }
        }
    }

    /// Re-check the live target after its root or data path changed: copy
    /// the target's schema, record validity and kind, and bring the proxy
    /// into the new schema (seeded from the target on a direct edit).
    pub fn revalidate_live<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        owner: ObjectId,
    ) -> Result<(), DriverError> {
        self.revalidate(host, owner, Block::Live)
    }

    /// Same check for any block. Results are written through the block's
    /// ordinary field sync, so an edited selected entry carries them into
    /// the live block.
    fn revalidate<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        owner: ObjectId,
        block: Block,
    ) -> Result<(), DriverError> {
        let target = self.block_mut(owner, block)?;
        let info = target
            .root
            .and_then(|root| classify(&*host, root, &target.data_path));
        let Some(info) = info else {
            self.block_mut(owner, block)?.schema = None;
            return self.write(host, owner, block, FieldValue::IsValid(false));
        };

        let schema = copy_schema(&info.descriptor, self.on_proxy_change.clone());
        let mode = self.mode.get();
        self.block_mut(owner, block)?.schema = schema.clone();
        if block == Block::Live && mode != TraceMode::Direct {
            let ctx = self.context_mut(owner)?;
            if let Some(active) = ctx.selected() {
                ctx.entries[active].schema = schema.clone();
            }
        }
        self.write(host, owner, block, FieldValue::IsValid(true))?;
        self.write(host, owner, block, FieldValue::PropKind(Some(info.kind)))?;

        let Some(schema) = schema else {
            return Ok(());
        };
        let clamp = self.config.clamp_proxy_to_hard_range;
        let seeded = (self.config.seed_proxy_from_target && mode == TraceMode::None)
            .then(|| target_value(&*host, &info))
            .flatten()
            .and_then(|v| schema.conform(&v, clamp));
        let proxy = seeded
            .or_else(|| {
                let current = self.context(owner).ok()?.block(block)?.proxy.as_ref()?;
                schema.conform(current, clamp)
            })
            .unwrap_or_else(|| schema.default.clone());
        self.write(host, owner, block, FieldValue::Proxy(Some(proxy)))
    }
}

/// Current value of a classified target as the host reports it.
fn target_value<H: SceneHost + ?Sized>(host: &H, info: &AnimatableInfo) -> Option<ProxyValue> {
    match host.resolve_path(info.root, &info.full_path).ok()? {
        HostValue::Scalar(v) => Some(v),
        HostValue::Array(values) => values.get(info.array_index).cloned(),
        _ => None,
    }
}
