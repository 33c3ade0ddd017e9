//! In-memory scene graph implementing the host contracts ([`SceneHost`] and
//! [`CurveStore`]). Objects are trees of [`Node`]s; struct fields carry the
//! attribute descriptors the reflection layer reports.

use anyhow::{anyhow, bail, Context, Result};
use hashbrown::HashMap;
use serde_json::{Map, Value as JsonValue};

use vdriver_api_core::{
    coercion, json, AttributeDescriptor, AttributeKind, CurveBinding, CurveId, CurveStore,
    DataPath, HostError, HostValue, ObjectId, PathToken, ProxyValue, SceneHost, ValueKind,
};

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Struct { type_name: String, fields: Vec<Field> },
    /// Items are structs; key lookup matches their `name` text field.
    Collection(Vec<Node>),
    Array(Vec<ProxyValue>),
    Scalar(ProxyValue),
    Text(String),
    Pointer(Option<ObjectId>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub descriptor: AttributeDescriptor,
    pub node: Node,
}

impl Node {
    pub fn structure(type_name: impl Into<String>) -> Self {
        Node::Struct {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    /// Struct with a leading read-only `name` text field, addressable by key
    /// inside a collection.
    pub fn named(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Node::structure(type_name).with_field(
            AttributeDescriptor::structural("name", AttributeKind::String),
            Node::Text(name.into()),
        )
    }

    pub fn with_field(mut self, descriptor: AttributeDescriptor, node: Node) -> Self {
        if let Node::Struct { fields, .. } = &mut self {
            fields.push(Field { descriptor, node });
        }
        self
    }

    fn item_name(&self) -> Option<&str> {
        match self.field("name").map(|f| &f.node) {
            Some(Node::Text(name)) => Some(name),
            _ => None,
        }
    }

    fn field(&self, name: &str) -> Option<&Field> {
        match self {
            Node::Struct { fields, .. } => fields.iter().find(|f| f.descriptor.identifier == name),
            _ => None,
        }
    }

    fn snapshot(&self) -> HostValue {
        match self {
            Node::Struct { type_name, .. } => HostValue::Struct {
                type_name: type_name.clone(),
            },
            Node::Collection(items) => HostValue::Collection { len: items.len() },
            Node::Array(values) => HostValue::Array(values.clone()),
            Node::Scalar(v) => HostValue::Scalar(v.clone()),
            Node::Text(s) => HostValue::Text(s.clone()),
            Node::Pointer(id) => HostValue::Pointer(*id),
        }
    }
}

enum Walked<'a> {
    Node(&'a Node),
    Element(&'a ProxyValue),
}

fn describe(token: &PathToken) -> String {
    vdriver_api_core::data_path::render(std::slice::from_ref(token))
}

fn walk<'a>(root: &'a Node, tokens: &[PathToken]) -> Result<Walked<'a>, String> {
    let mut cur = Walked::Node(root);
    for token in tokens {
        let node = match cur {
            Walked::Node(node) => node,
            Walked::Element(_) => return Err(format!("cannot apply {} to a scalar", describe(token))),
        };
        cur = match (node, token) {
            (Node::Struct { .. }, PathToken::Field(name)) => Walked::Node(
                &node
                    .field(name)
                    .ok_or_else(|| format!("no field '{name}'"))?
                    .node,
            ),
            (Node::Collection(items), PathToken::Index(i)) => Walked::Node(
                items
                    .get(*i)
                    .ok_or_else(|| format!("collection index {i} out of range"))?,
            ),
            (Node::Collection(items), PathToken::Key(key)) => Walked::Node(
                items
                    .iter()
                    .find(|item| item.item_name() == Some(key.as_str()))
                    .ok_or_else(|| format!("no item named '{key}'"))?,
            ),
            (Node::Array(values), PathToken::Index(i)) => Walked::Element(
                values
                    .get(*i)
                    .ok_or_else(|| format!("array index {i} out of range"))?,
            ),
            _ => return Err(format!("cannot apply {}", describe(token))),
        };
    }
    Ok(cur)
}

fn walk_mut<'a>(root: &'a mut Node, tokens: &[PathToken]) -> Result<&'a mut Node, String> {
    let mut cur = root;
    for token in tokens {
        cur = match (cur, token) {
            (Node::Struct { fields, .. }, PathToken::Field(name)) => {
                &mut fields
                    .iter_mut()
                    .find(|f| f.descriptor.identifier == *name)
                    .ok_or_else(|| format!("no field '{name}'"))?
                    .node
            }
            (Node::Collection(items), PathToken::Index(i)) => items
                .get_mut(*i)
                .ok_or_else(|| format!("collection index {i} out of range"))?,
            (Node::Collection(items), PathToken::Key(key)) => items
                .iter_mut()
                .find(|item| item.item_name() == Some(key.as_str()))
                .ok_or_else(|| format!("no item named '{key}'"))?,
            (_, token) => return Err(format!("cannot apply {}", describe(token))),
        };
    }
    Ok(cur)
}

#[derive(Clone, Debug)]
pub struct SceneObject {
    pub name: String,
    pub id_type: String,
    pub data: Node,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MockCurve {
    pub binding: CurveBinding,
    pub keyframes: Vec<(f32, f32)>,
}

/// In-memory host scene.
#[derive(Clone, Debug, Default)]
pub struct MockScene {
    objects: HashMap<ObjectId, SceneObject>,
    /// Presence of an entry means the object has animation data.
    animation: HashMap<ObjectId, Vec<MockCurve>>,
    next_curve: u32,
    /// Successful attribute writes, in order.
    pub writes: Vec<(ObjectId, String, Option<usize>, ProxyValue)>,
}

impl MockScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_object(
        &mut self,
        name: impl Into<String>,
        id_type: impl Into<String>,
        data: Node,
    ) -> ObjectId {
        let id = ObjectId::new();
        self.objects.insert(
            id,
            SceneObject {
                name: name.into(),
                id_type: id_type.into(),
                data,
            },
        );
        id
    }

    pub fn object_id(&self, name: &str) -> Option<ObjectId> {
        self.objects
            .iter()
            .find(|(_, obj)| obj.name == name)
            .map(|(id, _)| *id)
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(&id)
    }

    pub fn remove_object(&mut self, id: ObjectId) -> bool {
        self.animation.remove(&id);
        self.objects.remove(&id).is_some()
    }

    /// Current scalar at `path`, if it resolves to one.
    pub fn scalar(&self, id: ObjectId, path: &str) -> Option<ProxyValue> {
        match self.resolve_path(id, path).ok()? {
            HostValue::Scalar(v) => Some(v),
            _ => None,
        }
    }

    /// One slot of the array at `path`.
    pub fn element(&self, id: ObjectId, path: &str, index: usize) -> Option<ProxyValue> {
        match self.resolve_path(id, path).ok()? {
            HostValue::Array(values) => values.get(index).cloned(),
            _ => None,
        }
    }

    pub fn ensure_animation_data(&mut self, owner: ObjectId) {
        self.animation.entry(owner).or_default();
    }

    pub fn add_curve(&mut self, owner: ObjectId, data_path: &str, array_index: usize) -> CurveId {
        self.add_curve_with_keys(owner, data_path, array_index, Vec::new())
    }

    pub fn add_curve_with_keys(
        &mut self,
        owner: ObjectId,
        data_path: &str,
        array_index: usize,
        keyframes: Vec<(f32, f32)>,
    ) -> CurveId {
        let id = self.alloc_curve();
        self.animation.entry(owner).or_default().push(MockCurve {
            binding: CurveBinding {
                id,
                data_path: data_path.to_string(),
                array_index,
            },
            keyframes,
        });
        id
    }

    pub fn curve(&self, owner: ObjectId, curve: CurveId) -> Option<&MockCurve> {
        self.animation
            .get(&owner)?
            .iter()
            .find(|c| c.binding.id == curve)
    }

    pub fn curve_count(&self, owner: ObjectId) -> usize {
        self.animation.get(&owner).map_or(0, Vec::len)
    }

    fn alloc_curve(&mut self) -> CurveId {
        let id = CurveId(self.next_curve);
        self.next_curve = self.next_curve.wrapping_add(1);
        id
    }

    fn object_or_missing(&self, id: ObjectId) -> Result<&SceneObject, HostError> {
        self.objects.get(&id).ok_or(HostError::MissingObject(id))
    }

    /// Build a scene from its JSON description (see `fixtures/scenes`).
    pub fn from_json(value: JsonValue) -> Result<Self> {
        let mut scene = MockScene::new();
        let objects = value
            .get("objects")
            .and_then(JsonValue::as_array)
            .ok_or_else(|| anyhow!("scene json needs an 'objects' array"))?;
        for obj in objects {
            let obj = obj
                .as_object()
                .ok_or_else(|| anyhow!("scene object must be a json object"))?;
            let name = str_field(obj, "name")?;
            let id_type = obj
                .get("id_type")
                .and_then(JsonValue::as_str)
                .unwrap_or("OBJECT");
            let data = parse_struct(obj).with_context(|| format!("object '{name}'"))?;
            scene.add_object(name, id_type, data);
        }
        if let Some(owners) = value.get("animation_data").and_then(JsonValue::as_array) {
            for owner in owners {
                let owner = scene.lookup(owner.as_str().unwrap_or_default())?;
                scene.ensure_animation_data(owner);
            }
        }
        if let Some(curves) = value.get("curves").and_then(JsonValue::as_array) {
            for curve in curves {
                let curve = curve
                    .as_object()
                    .ok_or_else(|| anyhow!("curve must be a json object"))?;
                let owner = scene.lookup(str_field(curve, "owner")?)?;
                let path = str_field(curve, "data_path")?;
                let index = curve
                    .get("array_index")
                    .and_then(JsonValue::as_u64)
                    .unwrap_or(0) as usize;
                let keys: Vec<(f32, f32)> = match curve.get("keyframes") {
                    Some(k) => serde_json::from_value(k.clone())
                        .with_context(|| format!("keyframes of curve on '{path}'"))?,
                    None => Vec::new(),
                };
                scene.add_curve_with_keys(owner, path, index, keys);
            }
        }
        Ok(scene)
    }

    fn lookup(&self, name: &str) -> Result<ObjectId> {
        self.object_id(name)
            .ok_or_else(|| anyhow!("unknown scene object '{name}'"))
    }
}

fn str_field<'a>(obj: &'a Map<String, JsonValue>, key: &str) -> Result<&'a str> {
    obj.get(key)
        .and_then(JsonValue::as_str)
        .ok_or_else(|| anyhow!("missing string '{key}'"))
}

fn parse_struct(obj: &Map<String, JsonValue>) -> Result<Node> {
    let type_name = obj
        .get("type_name")
        .and_then(JsonValue::as_str)
        .unwrap_or("Struct");
    let mut node = match obj.get("name").and_then(JsonValue::as_str) {
        Some(name) => Node::named(type_name, name),
        None => Node::structure(type_name),
    };
    if let Some(fields) = obj.get("fields").and_then(JsonValue::as_array) {
        for field in fields {
            let field = field
                .as_object()
                .ok_or_else(|| anyhow!("field must be a json object"))?;
            let Field { descriptor, node: child } = parse_field(field)?;
            node = node.with_field(descriptor, child);
        }
    }
    Ok(node)
}

fn parse_field(obj: &Map<String, JsonValue>) -> Result<Field> {
    let mut spec = obj.clone();
    let value = spec.remove("value");
    let items = spec.remove("items");
    let nested = spec.remove("struct");
    let explicit_flags = spec.contains_key("flags");
    let identifier = str_field(obj, "identifier")?.to_string();
    let mut descriptor = json::parse_descriptor(JsonValue::Object(spec))
        .with_context(|| format!("descriptor of field '{identifier}'"))?;
    if !explicit_flags {
        descriptor.flags.animatable = descriptor.kind.value_kind().is_some();
    }

    let node = match (descriptor.kind, nested, items) {
        (_, Some(JsonValue::Object(s)), _) => parse_struct(&s)?,
        (_, _, Some(JsonValue::Array(items))) => {
            let parsed = items
                .iter()
                .map(|item| {
                    item.as_object()
                        .ok_or_else(|| anyhow!("collection item must be a json object"))
                        .and_then(parse_struct)
                })
                .collect::<Result<Vec<_>>>()?;
            Node::Collection(parsed)
        }
        (AttributeKind::String, _, _) => Node::Text(
            value
                .as_ref()
                .and_then(JsonValue::as_str)
                .unwrap_or_default()
                .to_string(),
        ),
        (AttributeKind::Pointer, _, _) => Node::Pointer(None),
        (AttributeKind::Collection, _, _) => Node::Collection(Vec::new()),
        (kind, _, _) => match kind.value_kind() {
            Some(vk) => drivable_node(&descriptor, vk, value)
                .with_context(|| format!("value of field '{identifier}'"))?,
            None => Node::structure("Struct"),
        },
    };
    Ok(Field { descriptor, node })
}

fn drivable_node(
    descriptor: &AttributeDescriptor,
    kind: ValueKind,
    value: Option<JsonValue>,
) -> Result<Node> {
    let convert = |v: ProxyValue| {
        coercion::coerce(&v, kind).ok_or_else(|| anyhow!("{v} is not a {kind} value"))
    };
    if descriptor.is_array() {
        let values = match value {
            Some(v) => json::parse_values(v)?
                .into_iter()
                .map(convert)
                .collect::<Result<Vec<_>>>()?,
            None => vec![default_value(descriptor, kind); descriptor.array_length],
        };
        if values.len() != descriptor.array_length {
            bail!(
                "expected {} array values, got {}",
                descriptor.array_length,
                values.len()
            );
        }
        return Ok(Node::Array(values));
    }
    let v = match value {
        Some(v) => convert(json::parse_value(v)?)?,
        None => default_value(descriptor, kind),
    };
    Ok(Node::Scalar(v))
}

fn default_value(descriptor: &AttributeDescriptor, kind: ValueKind) -> ProxyValue {
    match kind {
        ValueKind::Bool => ProxyValue::Bool(false),
        ValueKind::Int => ProxyValue::Int(0),
        ValueKind::Float => ProxyValue::Float(0.0),
        ValueKind::Enum if descriptor.is_enum_flag => ProxyValue::EnumFlags(Vec::new()),
        ValueKind::Enum => ProxyValue::Enum(
            descriptor
                .enum_items
                .first()
                .map(|item| item.identifier.clone())
                .unwrap_or_default(),
        ),
    }
}

fn tokens_of(path: &str) -> Result<Vec<PathToken>, HostError> {
    if path.is_empty() {
        return Ok(Vec::new());
    }
    DataPath::parse(path)
        .map(DataPath::into_tokens)
        .map_err(|e| HostError::Unresolved {
            path: path.to_string(),
            reason: e.to_string(),
        })
}

impl SceneHost for MockScene {
    fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    fn resolve_path(&self, root: ObjectId, path: &str) -> Result<HostValue, HostError> {
        let obj = self.object_or_missing(root)?;
        let tokens = tokens_of(path)?;
        match walk(&obj.data, &tokens) {
            Ok(Walked::Node(node)) => Ok(node.snapshot()),
            Ok(Walked::Element(v)) => Ok(HostValue::Scalar(v.clone())),
            Err(reason) => Err(HostError::Unresolved {
                path: path.to_string(),
                reason,
            }),
        }
    }

    fn descriptor(
        &self,
        root: ObjectId,
        container_path: &str,
        field: &str,
    ) -> Option<AttributeDescriptor> {
        let obj = self.objects.get(&root)?;
        let tokens = tokens_of(container_path).ok()?;
        match walk(&obj.data, &tokens).ok()? {
            Walked::Node(node) => node.field(field).map(|f| f.descriptor.clone()),
            Walked::Element(_) => None,
        }
    }

    fn write_attribute(
        &mut self,
        root: ObjectId,
        path: &str,
        array_index: Option<usize>,
        value: &ProxyValue,
    ) -> Result<(), HostError> {
        let unresolved = |reason: String| HostError::Unresolved {
            path: path.to_string(),
            reason,
        };
        let tokens = tokens_of(path)?;
        let Some((PathToken::Field(name), container)) = tokens.split_last() else {
            return Err(unresolved("attribute path must end in a field".into()));
        };
        let obj = self
            .objects
            .get_mut(&root)
            .ok_or(HostError::MissingObject(root))?;
        let container = walk_mut(&mut obj.data, container).map_err(unresolved)?;
        let Node::Struct { fields, .. } = container else {
            return Err(unresolved("container is not a struct".into()));
        };
        let field = fields
            .iter_mut()
            .find(|f| f.descriptor.identifier == *name)
            .ok_or_else(|| unresolved(format!("no field '{name}'")))?;
        if field.descriptor.is_readonly() {
            return Err(HostError::ReadOnly {
                path: path.to_string(),
            });
        }
        let mismatch = || HostError::TypeMismatch {
            path: path.to_string(),
            kind: value.kind(),
        };
        match (&mut field.node, array_index) {
            (Node::Scalar(current), None) => {
                if current.kind() != value.kind() {
                    return Err(mismatch());
                }
                *current = value.clone();
            }
            (Node::Array(values), Some(index)) => {
                let len = values.len();
                let slot = values.get_mut(index).ok_or(HostError::IndexOutOfRange {
                    path: path.to_string(),
                    index,
                    len,
                })?;
                if slot.kind() != value.kind() {
                    return Err(mismatch());
                }
                *slot = value.clone();
            }
            _ => return Err(mismatch()),
        }
        self.writes
            .push((root, path.to_string(), array_index, value.clone()));
        Ok(())
    }
}

impl CurveStore for MockScene {
    fn bindings(&self, owner: ObjectId) -> Option<Vec<CurveBinding>> {
        self.animation
            .get(&owner)
            .map(|curves| curves.iter().map(|c| c.binding.clone()).collect())
    }

    fn remove_curve(&mut self, owner: ObjectId, curve: CurveId) -> bool {
        let Some(curves) = self.animation.get_mut(&owner) else {
            return false;
        };
        let before = curves.len();
        curves.retain(|c| c.binding.id != curve);
        curves.len() != before
    }

    fn clone_curve(&mut self, owner: ObjectId, curve: CurveId) -> Option<CurveId> {
        let source = self.curve(owner, curve)?.clone();
        let id = self.alloc_curve();
        let copy = MockCurve {
            binding: CurveBinding { id, ..source.binding },
            keyframes: source.keyframes,
        };
        self.animation.get_mut(&owner)?.push(copy);
        Some(id)
    }

    fn set_curve_target(
        &mut self,
        owner: ObjectId,
        curve: CurveId,
        path: &str,
        array_index: usize,
    ) -> bool {
        let Some(found) = self
            .animation
            .get_mut(&owner)
            .and_then(|curves| curves.iter_mut().find(|c| c.binding.id == curve))
        else {
            return false;
        };
        found.binding.data_path = path.to_string();
        found.binding.array_index = array_index;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cube() -> (MockScene, ObjectId) {
        let mut scene = MockScene::new();
        let data = Node::structure("Object")
            .with_field(
                AttributeDescriptor::float("size").with_range(0.0, 10.0),
                Node::Scalar(ProxyValue::Float(1.0)),
            )
            .with_field(
                AttributeDescriptor::float("items").array(3),
                Node::Array(vec![ProxyValue::Float(0.0); 3]),
            )
            .with_field(
                AttributeDescriptor::structural("modifiers", AttributeKind::Collection),
                Node::Collection(vec![Node::named("Modifier", "Sub").with_field(
                    AttributeDescriptor::int("levels"),
                    Node::Scalar(ProxyValue::Int(1)),
                )]),
            );
        let id = scene.add_object("Cube", "OBJECT", data);
        (scene, id)
    }

    #[test]
    fn resolves_fields_indices_and_keys() {
        let (scene, id) = cube();
        assert_eq!(
            scene.resolve_path(id, "").unwrap(),
            HostValue::Struct {
                type_name: "Object".into()
            }
        );
        assert_eq!(scene.scalar(id, "size"), Some(ProxyValue::Float(1.0)));
        assert_eq!(
            scene.resolve_path(id, "items[2]").unwrap(),
            HostValue::Scalar(ProxyValue::Float(0.0))
        );
        assert_eq!(
            scene.scalar(id, r#"modifiers["Sub"].levels"#),
            Some(ProxyValue::Int(1))
        );
        assert_eq!(scene.scalar(id, "modifiers[0].levels"), Some(ProxyValue::Int(1)));
        assert!(scene.resolve_path(id, "items[3]").is_err());
        assert!(scene.resolve_path(id, "missing").is_err());
        assert!(scene.descriptor(id, "modifiers[0]", "levels").is_some());
        assert!(scene.descriptor(id, "", "levels").is_none());
    }

    #[test]
    fn writes_check_kind_and_bounds() {
        let (mut scene, id) = cube();
        scene
            .write_attribute(id, "size", None, &ProxyValue::Float(4.0))
            .unwrap();
        assert_eq!(scene.scalar(id, "size"), Some(ProxyValue::Float(4.0)));
        scene
            .write_attribute(id, "items", Some(1), &ProxyValue::Float(2.0))
            .unwrap();
        assert_eq!(scene.element(id, "items", 1), Some(ProxyValue::Float(2.0)));
        assert!(matches!(
            scene.write_attribute(id, "items", Some(5), &ProxyValue::Float(2.0)),
            Err(HostError::IndexOutOfRange { index: 5, len: 3, .. })
        ));
        assert!(matches!(
            scene.write_attribute(id, "size", None, &ProxyValue::Int(2)),
            Err(HostError::TypeMismatch { .. })
        ));
        assert_eq!(scene.writes.len(), 2);
    }

    #[test]
    fn curves_clone_and_retarget() {
        let (mut scene, id) = cube();
        let c = scene.add_curve_with_keys(id, "a.prop", 0, vec![(0.0, 1.0)]);
        let copy = scene.clone_curve(id, c).unwrap();
        assert!(scene.set_curve_target(id, copy, "b.prop", 0));
        assert_eq!(scene.curves_bound_to(id, "b.prop", 0), vec![copy]);
        assert_eq!(scene.curve(id, copy).unwrap().keyframes, vec![(0.0, 1.0)]);
        assert!(scene.remove_curve(id, c));
        assert_eq!(scene.curve_count(id), 1);
    }

    #[test]
    fn builds_from_json() {
        let scene = MockScene::from_json(json!({
            "objects": [{
                "name": "Cube",
                "type_name": "Object",
                "fields": [
                    { "identifier": "count", "kind": "int", "value": 3 },
                    { "identifier": "items", "kind": "float", "array_length": 2, "value": [1, 2] },
                    { "identifier": "label", "kind": "string", "value": "hi" }
                ]
            }],
            "animation_data": ["Cube"]
        }))
        .unwrap();
        let id = scene.object_id("Cube").unwrap();
        assert_eq!(scene.scalar(id, "count"), Some(ProxyValue::Int(3)));
        assert_eq!(scene.element(id, "items", 1), Some(ProxyValue::Float(2.0)));
        assert!(scene.descriptor(id, "", "count").unwrap().is_animatable());
        assert_eq!(scene.bindings(id), Some(Vec::new()));
    }
}
