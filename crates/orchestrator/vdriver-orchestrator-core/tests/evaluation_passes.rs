use vdriver_api_core::{
    AttributeDescriptor, CurveBinding, CurveId, CurveStore, HostError, HostValue, ObjectId,
    ProxyValue, SceneHost,
};
use vdriver_core::Config;
use vdriver_orchestrator::{
    DiagnosticsCfg, DriverListSpec, EntryOutcome, EntryRef, Orchestrator, UpdateLock,
};
use vdriver_test_fixtures::{drivers, scenes, MockScene};

fn installed() -> (MockScene, Orchestrator, ObjectId, ObjectId) {
    let mut scene = scenes::load("basic").unwrap();
    let list = DriverListSpec::from_json(&drivers::json("basic").unwrap())
        .unwrap()
        .resolve(|name| scene.object_id(name))
        .unwrap();
    let mut orch = Orchestrator::new(Config::default());
    orch.install(&mut scene, &list).unwrap();
    let owner = list.owner;
    let cube = scene.object_id("Cube").unwrap();
    (scene, orch, owner, cube)
}

#[test]
fn install_validates_entries() {
    let (_scene, orch, owner, _cube) = installed();
    let ctx = orch.drivers.context(owner).unwrap();
    let valid: Vec<bool> = ctx.entries.iter().map(|e| e.is_valid).collect();
    assert_eq!(valid, vec![true, true, true, true, false]);
    assert_eq!(ctx.entries[0].name, "Size");
    let levels = ctx.entries[1].schema.as_ref().unwrap();
    assert_eq!(levels.hard_range(), Some((0.0, 6.0)));
    assert_eq!(ctx.active_index, Some(4));
}

#[test]
fn one_pass_writes_every_active_entry() {
    let (mut scene, mut orch, owner, cube) = installed();
    let frame = orch.evaluate(&mut scene, &[owner]).unwrap();

    assert_eq!(frame.pass, 1);
    assert_eq!(frame.writes.len(), 3);
    assert!(frame.invalidated.is_empty());
    assert!(frame.failures.is_empty());
    assert_eq!(scene.scalar(cube, "size"), Some(ProxyValue::Float(7.5)));
    assert_eq!(
        scene.scalar(cube, r#"modifiers["Subdivision"].levels"#),
        Some(ProxyValue::Int(3))
    );
    assert_eq!(
        scene.element(cube, "items", 2),
        Some(ProxyValue::Float(0.25))
    );
    assert_eq!(scene.element(cube, "items", 1), Some(ProxyValue::Float(0.0)));
    // muted
    assert_eq!(scene.scalar(cube, "count"), Some(ProxyValue::Int(4)));

    let ops: Vec<_> = frame.writes.iter().collect();
    assert_eq!(ops[0].path.to_string(), "size");
    assert_eq!(ops[2].path.to_string(), "items");
    assert_eq!(ops[2].array_index, Some(2));

    let outcomes: Vec<_> = frame.records.iter().map(|r| r.outcome.clone()).collect();
    assert_eq!(
        outcomes,
        vec![
            EntryOutcome::Written,
            EntryOutcome::Written,
            EntryOutcome::Written,
            EntryOutcome::SkippedMuted,
            EntryOutcome::SkippedInvalid,
        ]
    );
}

#[test]
fn unrelated_changes_do_not_run_a_pass() {
    let (mut scene, mut orch, _owner, cube) = installed();
    assert!(orch.evaluate(&mut scene, &[cube]).is_none());
    assert!(orch.evaluate(&mut scene, &[]).is_none());
    assert_eq!(orch.pass, 0);
    assert!(scene.writes.is_empty());
}

#[test]
fn held_lock_skips_the_pass() {
    let (mut scene, mut orch, owner, cube) = installed();
    let guard = orch.lock.try_acquire().unwrap();
    assert!(orch.evaluate(&mut scene, &[owner]).is_none());
    assert_eq!(scene.scalar(cube, "size"), Some(ProxyValue::Float(1.0)));
    drop(guard);
    assert!(orch.evaluate(&mut scene, &[owner]).is_some());
    assert!(!orch.lock.is_held());
}

#[test]
fn lost_target_is_invalidated_and_left_alone() {
    let (mut scene, mut orch, owner, cube) = installed();
    // persisted state pointing at a field the scene no longer has
    let mut ctx = orch.drivers.detach(owner).unwrap();
    ctx.entries[0].data_path = "nonexistent_field".into();
    orch.drivers.insert_context(owner, ctx);
    let frame = orch.evaluate(&mut scene, &[owner]).unwrap();
    assert_eq!(frame.invalidated, vec![EntryRef { owner, index: 0 }]);
    assert!(!orch.drivers.context(owner).unwrap().entries[0].is_valid);
    assert_eq!(scene.scalar(cube, "size"), Some(ProxyValue::Float(1.0)));
    // the remaining entries still ran
    assert_eq!(frame.writes.len(), 2);
}

#[test]
fn deleted_root_invalidates_its_entries() {
    let (mut scene, mut orch, owner, cube) = installed();
    scene.remove_object(cube);
    let frame = orch.evaluate(&mut scene, &[owner]).unwrap();
    assert!(frame.writes.is_empty());
    assert_eq!(frame.invalidated.len(), 3);
    let ctx = orch.drivers.context(owner).unwrap();
    assert!(ctx.entries.iter().all(|e| !e.is_valid || e.mute));

    // invalid entries are skipped from now on
    let frame = orch.evaluate(&mut scene, &[owner]).unwrap();
    assert!(frame.invalidated.is_empty());
}

#[test]
fn diagnostics_can_be_disabled() {
    let (mut scene, orch, owner, _cube) = installed();
    let mut orch = orch.with_diagnostics(DiagnosticsCfg { enabled: false });
    let frame = orch.evaluate(&mut scene, &[owner]).unwrap();
    assert!(frame.records.is_empty());
    assert_eq!(frame.writes.len(), 3);
}

#[test]
fn frame_serializes_writes() {
    let (mut scene, mut orch, owner, _cube) = installed();
    let frame = orch.evaluate(&mut scene, &[owner]).unwrap();
    let json = serde_json::to_value(&frame).unwrap();
    assert_eq!(json["writes"].as_array().unwrap().len(), 3);
    assert_eq!(json["writes"][2]["array_index"], 2);
    assert_eq!(json["records"][3]["outcome"], "skipped_muted");
}

/// Host that records whether the update lock was held during each write, and
/// can refuse writes to one path.
struct Probe {
    scene: MockScene,
    lock: UpdateLock,
    held: Vec<bool>,
    refuse: Option<String>,
}

impl Probe {
    fn new(scene: MockScene, lock: UpdateLock) -> Self {
        Self {
            scene,
            lock,
            held: Vec::new(),
            refuse: None,
        }
    }
}

impl SceneHost for Probe {
    fn contains(&self, id: ObjectId) -> bool {
        self.scene.contains(id)
    }

    fn resolve_path(&self, root: ObjectId, path: &str) -> Result<HostValue, HostError> {
        self.scene.resolve_path(root, path)
    }

    fn descriptor(
        &self,
        root: ObjectId,
        container_path: &str,
        field: &str,
    ) -> Option<AttributeDescriptor> {
        self.scene.descriptor(root, container_path, field)
    }

    fn write_attribute(
        &mut self,
        root: ObjectId,
        path: &str,
        array_index: Option<usize>,
        value: &ProxyValue,
    ) -> Result<(), HostError> {
        self.held.push(self.lock.is_held());
        if self.refuse.as_deref() == Some(path) {
            return Err(HostError::ReadOnly {
                path: path.to_string(),
            });
        }
        self.scene.write_attribute(root, path, array_index, value)
    }
}

impl CurveStore for Probe {
    fn bindings(&self, owner: ObjectId) -> Option<Vec<CurveBinding>> {
        self.scene.bindings(owner)
    }

    fn remove_curve(&mut self, owner: ObjectId, curve: CurveId) -> bool {
        self.scene.remove_curve(owner, curve)
    }

    fn clone_curve(&mut self, owner: ObjectId, curve: CurveId) -> Option<CurveId> {
        self.scene.clone_curve(owner, curve)
    }

    fn set_curve_target(
        &mut self,
        owner: ObjectId,
        curve: CurveId,
        path: &str,
        array_index: usize,
    ) -> bool {
        self.scene.set_curve_target(owner, curve, path, array_index)
    }
}

#[test]
fn writes_happen_under_the_lock() {
    let (scene, mut orch, owner, _cube) = installed();
    let mut probe = Probe::new(scene, orch.lock.clone());
    orch.evaluate(&mut probe, &[owner]).unwrap();
    assert_eq!(probe.held, vec![true, true, true]);
    assert!(!orch.lock.is_held());
}

#[test]
fn host_refusal_is_reported_and_the_pass_continues() {
    let (scene, mut orch, owner, cube) = installed();
    let mut probe = Probe::new(scene, orch.lock.clone());
    probe.refuse = Some("size".into());
    let frame = orch.evaluate(&mut probe, &[owner]).unwrap();

    assert_eq!(frame.failures.len(), 1);
    assert_eq!(frame.failures[0].entry, EntryRef { owner, index: 0 });
    assert!(matches!(
        frame.records[0].outcome,
        EntryOutcome::WriteFailed(_)
    ));
    assert_eq!(frame.writes.len(), 2);
    assert_eq!(probe.scene.scalar(cube, "size"), Some(ProxyValue::Float(1.0)));
    // a refused write does not invalidate the entry
    assert!(orch.drivers.context(owner).unwrap().entries[0].is_valid);
}
