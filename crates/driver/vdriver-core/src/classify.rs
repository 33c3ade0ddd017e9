//! Decide whether a path names an attribute a virtual driver may write.

use vdriver_api_core::{
    AttributeDescriptor, ChangeHook, ObjectId, ProxyValue, SceneHost, ValueKind,
};

use crate::resolve::{reassemble, StepKind};
use crate::schema_copy::copy_schema;

/// A validated, writable target.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimatableInfo {
    pub root: ObjectId,
    /// Attribute path relative to `root`, without the array subscript.
    pub full_path: String,
    /// Slot within an array attribute, 0 for plain attributes.
    pub array_index: usize,
    pub kind: ValueKind,
    pub descriptor: AttributeDescriptor,
}

impl AnimatableInfo {
    /// Index to pass to the host when writing: `Some` for array slots.
    pub fn write_index(&self) -> Option<usize> {
        self.descriptor.is_array().then_some(self.array_index)
    }

    /// Bring a proxy value into the target's kind (and hard range if `clamp`).
    pub fn conform(&self, value: &ProxyValue, clamp: bool) -> Option<ProxyValue> {
        copy_schema(&self.descriptor, ChangeHook::none())?.conform(value, clamp)
    }
}

/// Classify `path` on `root`. The descriptor comes from the last resolution
/// step, else the one before it (index/key tails carry none). Rejected when
/// there is no descriptor, when it is not animatable, read-only or of a kind
/// a proxy cannot hold, and when an array attribute is named without a
/// trailing index.
pub fn classify<H: SceneHost + ?Sized>(
    host: &H,
    root: ObjectId,
    path: &str,
) -> Option<AnimatableInfo> {
    let reassembly = reassemble(host, root, path)?;
    let graph = &reassembly.graph;
    let last = graph.nth_back(0)?;
    let descriptor = last
        .descriptor
        .as_ref()
        .or_else(|| graph.nth_back(1).and_then(|s| s.descriptor.as_ref()))?;

    if !descriptor.is_animatable() {
        log::debug!("'{path}' is not animatable");
        return None;
    }
    if descriptor.is_readonly() {
        log::debug!("'{path}' is read-only");
        return None;
    }
    let Some(kind) = descriptor.kind.value_kind() else {
        log::debug!("'{path}' has unsupported kind {:?}", descriptor.kind);
        return None;
    };
    if descriptor.is_array() && last.kind != StepKind::Index {
        log::debug!("'{path}' names a whole array; an index is required");
        return None;
    }

    Some(AnimatableInfo {
        root,
        full_path: reassembly.full_path(),
        array_index: reassembly.array_index,
        kind,
        descriptor: descriptor.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vdriver_api_core::AttributeKind;
    use vdriver_test_fixtures::{MockScene, Node};

    fn scene() -> (MockScene, ObjectId) {
        let mut scene = MockScene::new();
        let data = Node::structure("Object")
            .with_field(
                AttributeDescriptor::float("size").with_range(0.0, 10.0),
                Node::Scalar(ProxyValue::Float(1.0)),
            )
            .with_field(
                AttributeDescriptor::float("items").array(5),
                Node::Array(vec![ProxyValue::Float(0.0); 5]),
            )
            .with_field(
                AttributeDescriptor::float("volume").readonly(),
                Node::Scalar(ProxyValue::Float(8.0)),
            )
            .with_field(
                AttributeDescriptor::boolean("hide_select").not_animatable(),
                Node::Scalar(ProxyValue::Bool(false)),
            )
            .with_field(
                AttributeDescriptor::new("label", AttributeKind::String),
                Node::Text("Cube".into()),
            )
            .with_field(
                AttributeDescriptor::structural("data", AttributeKind::Pointer),
                Node::structure("Mesh").with_field(
                    AttributeDescriptor::int("levels"),
                    Node::Scalar(ProxyValue::Int(1)),
                ),
            );
        let id = scene.add_object("Cube", "OBJECT", data);
        (scene, id)
    }

    #[test]
    fn plain_attribute_has_index_zero() {
        let (scene, id) = scene();
        let info = classify(&scene, id, "size").unwrap();
        assert_eq!(info.full_path, "size");
        assert_eq!(info.array_index, 0);
        assert_eq!(info.write_index(), None);
        assert_eq!(info.kind, ValueKind::Float);
    }

    #[test]
    fn array_requires_trailing_index() {
        let (scene, id) = scene();
        let info = classify(&scene, id, "items[2]").unwrap();
        assert_eq!(info.full_path, "items");
        assert_eq!(info.array_index, 2);
        assert_eq!(info.write_index(), Some(2));
        assert!(classify(&scene, id, "items").is_none());
    }

    #[test]
    fn nested_attributes_keep_their_parent() {
        let (scene, id) = scene();
        let info = classify(&scene, id, "data.levels").unwrap();
        assert_eq!(info.full_path, "data.levels");
    }

    #[test]
    fn rejects_illegal_targets() {
        let (scene, id) = scene();
        let rejected = [
            "volume",
            "hide_select",
            "label",
            "data",
            "nonexistent_field",
            "items[7]",
            "size[",
        ];
        for path in rejected {
            assert!(classify(&scene, id, path).is_none(), "{path} should be rejected");
        }
    }

    #[test]
    fn conform_converts_and_clamps() {
        let (scene, id) = scene();
        let info = classify(&scene, id, "size").unwrap();
        assert_eq!(
            info.conform(&ProxyValue::Int(20), true),
            Some(ProxyValue::Float(10.0))
        );
        assert_eq!(
            info.conform(&ProxyValue::Float(20.0), false),
            Some(ProxyValue::Float(20.0))
        );
    }
}
