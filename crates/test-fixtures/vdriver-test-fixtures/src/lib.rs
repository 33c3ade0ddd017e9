use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

pub mod scene;

pub use scene::{Field, MockCurve, MockScene, Node, SceneObject};

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    scenes: HashMap<String, String>,
    #[serde(default)]
    drivers: HashMap<String, String>,
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn load_json<T: DeserializeOwned>(rel: &str) -> Result<T> {
    let text = read_to_string(rel)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
}

fn lookup<'a, T>(map: &'a HashMap<String, T>, kind: &str, name: &str) -> Result<&'a T> {
    map.get(name)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

/// Host scenes, built into a [`MockScene`].
pub mod scenes {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.scenes.keys().cloned().collect()
    }

    pub fn json(name: &str) -> Result<String> {
        let rel = lookup(&MANIFEST.scenes, "scene", name)?;
        read_to_string(rel)
    }

    pub fn load(name: &str) -> Result<MockScene> {
        let rel = lookup(&MANIFEST.scenes, "scene", name)?;
        let value: serde_json::Value = super::load_json(rel)?;
        MockScene::from_json(value).with_context(|| format!("failed to build scene '{name}'"))
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        let rel = lookup(&MANIFEST.scenes, "scene", name)?;
        Ok(resolve_path(rel))
    }
}

/// Serialized driver lists (persisted entries) referencing scene objects by name.
pub mod drivers {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.drivers.keys().cloned().collect()
    }

    pub fn json(name: &str) -> Result<String> {
        let rel = lookup(&MANIFEST.drivers, "driver list", name)?;
        read_to_string(rel)
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        let rel = lookup(&MANIFEST.drivers, "driver list", name)?;
        super::load_json(rel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vdriver_api_core::{CurveStore, ProxyValue, SceneHost};

    #[test]
    fn every_scene_fixture_builds() {
        for name in scenes::keys() {
            scenes::load(&name).unwrap_or_else(|e| panic!("scene '{name}': {e:#}"));
        }
    }

    #[test]
    fn basic_scene_contents() {
        let scene = scenes::load("basic").expect("basic scene");
        let cube = scene.object_id("Cube").expect("cube");
        let owner = scene.object_id("Scene").expect("scene owner");
        assert_eq!(scene.scalar(cube, "size"), Some(ProxyValue::Float(1.0)));
        assert_eq!(
            scene.scalar(cube, r#"modifiers["Subdivision"].levels"#),
            Some(ProxyValue::Int(1))
        );
        assert!(scene.contains(owner));
        assert!(scene.bindings(owner).is_some());
    }

    #[test]
    fn unknown_fixture_is_an_error() {
        assert!(scenes::load("does-not-exist").is_err());
    }
}
