//! Attribute-path resolution against a host root object.
//!
//! `resolve` walks a tokenized path one step at a time. Before a field step it
//! asks the host for the field's descriptor on the current container, then it
//! resolves the textual sub-path so far. Every step therefore records both the
//! static metadata and the concrete value. Any failing step fails the whole
//! resolution.
//!
//! `reassemble` inspects the tail of a resolved path and splits it into the
//! `(parent path, attribute name, array index)` triple a write needs.

use thiserror::Error;

use vdriver_api_core::data_path::{self, PathError, PathToken};
use vdriver_api_core::{AttributeDescriptor, HostError, HostValue, ObjectId, SceneHost};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StepKind {
    Root,
    Field,
    Index,
    Key,
}

impl StepKind {
    fn of(token: &PathToken) -> Self {
        match token {
            PathToken::Field(_) => StepKind::Field,
            PathToken::Index(_) => StepKind::Index,
            PathToken::Key(_) => StepKind::Key,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolutionStep {
    pub kind: StepKind,
    /// `None` only for the root step.
    pub token: Option<PathToken>,
    /// Textual path from the root through this step (empty for the root).
    pub path_so_far: String,
    /// Descriptor of the field this step selects; only field steps carry one.
    pub descriptor: Option<AttributeDescriptor>,
    pub value: HostValue,
}

/// Ordered resolution steps, starting with the root.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolutionGraph {
    root: ObjectId,
    steps: Vec<ResolutionStep>,
}

impl ResolutionGraph {
    pub fn root(&self) -> ObjectId {
        self.root
    }

    pub fn steps(&self) -> &[ResolutionStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last(&self) -> Option<&ResolutionStep> {
        self.steps.last()
    }

    /// Step `n` positions from the end (`0` = last).
    pub fn nth_back(&self, n: usize) -> Option<&ResolutionStep> {
        self.steps.iter().rev().nth(n)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResolveError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Host(#[from] HostError),
}

/// Tokenize `path` (convenience re-export of the data-path tokenizer).
pub fn disassemble(path: &str) -> Result<Vec<PathToken>, PathError> {
    data_path::disassemble(path)
}

/// Resolve `tokens` against `root`.
pub fn resolve<H: SceneHost + ?Sized>(
    host: &H,
    root: ObjectId,
    tokens: &[PathToken],
) -> Result<ResolutionGraph, ResolveError> {
    if !host.contains(root) {
        return Err(HostError::MissingObject(root).into());
    }
    let mut steps = Vec::with_capacity(tokens.len() + 1);
    steps.push(ResolutionStep {
        kind: StepKind::Root,
        token: None,
        path_so_far: String::new(),
        descriptor: None,
        value: host.resolve_path(root, "")?,
    });

    let mut path = String::new();
    for (i, token) in tokens.iter().enumerate() {
        let descriptor = match token {
            PathToken::Field(name) => host.descriptor(root, &path, name),
            _ => None,
        };
        token.render_into(&mut path, i == 0);
        let value = host.resolve_path(root, &path)?;
        steps.push(ResolutionStep {
            kind: StepKind::of(token),
            token: Some(token.clone()),
            path_so_far: path.clone(),
            descriptor,
            value,
        });
    }
    Ok(ResolutionGraph { root, steps })
}

/// Tokenize then resolve.
pub fn resolve_str<H: SceneHost + ?Sized>(
    host: &H,
    root: ObjectId,
    path: &str,
) -> Result<ResolutionGraph, ResolveError> {
    let tokens = disassemble(path)?;
    resolve(host, root, &tokens)
}

/// Tail shape of a resolved path.
#[derive(Clone, Debug, PartialEq)]
pub struct Reassembly {
    pub root: ObjectId,
    /// Path of the struct owning the attribute (empty for the root).
    pub parent_path: String,
    /// Attribute name; for keyed tails it carries the `["key"]` suffix.
    pub attribute: String,
    /// Index into an array attribute, 0 otherwise.
    pub array_index: usize,
    pub graph: ResolutionGraph,
}

impl Reassembly {
    /// `parent.attribute`, or just the attribute under the root.
    pub fn full_path(&self) -> String {
        if self.parent_path.is_empty() {
            self.attribute.clone()
        } else {
            format!("{}.{}", self.parent_path, self.attribute)
        }
    }
}

/// Resolve `path` and classify its tail:
/// - `.. field`           -> parent is the previous step
/// - `.. field[int]`      -> parent is two steps back, index taken from the tail
/// - `.. field["key"]`    -> parent is two steps back, the key stays on the name
///
/// Anything else (including paths that fail to resolve) yields `None`.
pub fn reassemble<H: SceneHost + ?Sized>(
    host: &H,
    root: ObjectId,
    path: &str,
) -> Option<Reassembly> {
    let graph = match resolve_str(host, root, path) {
        Ok(graph) => graph,
        Err(err) => {
            log::debug!("'{path}' does not resolve on {root}: {err}");
            return None;
        }
    };

    let g1 = graph.nth_back(0)?;
    let g2 = graph.nth_back(1);
    let g3_path = || graph.nth_back(2).map(|s| s.path_so_far.clone());

    let tail = (g2.and_then(|s| s.token.as_ref()), g1.token.as_ref());
    let (parent_path, attribute, array_index) = match tail {
        (Some(PathToken::Field(name)), Some(PathToken::Index(i))) => (g3_path()?, name.clone(), *i),
        (Some(PathToken::Field(name)), Some(key @ PathToken::Key(_))) => {
            let mut attribute = name.clone();
            key.render_into(&mut attribute, false);
            (g3_path()?, attribute, 0)
        }
        (_, Some(PathToken::Field(name))) => (g2?.path_so_far.clone(), name.clone(), 0),
        _ => return None,
    };

    Some(Reassembly {
        root,
        parent_path,
        attribute,
        array_index,
        graph,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vdriver_api_core::{AttributeKind, ProxyValue};
    use vdriver_test_fixtures::{MockScene, Node};

    fn scene() -> (MockScene, ObjectId) {
        let mut scene = MockScene::new();
        let data = Node::structure("Object")
            .with_field(
                AttributeDescriptor::float("size"),
                Node::Scalar(ProxyValue::Float(1.0)),
            )
            .with_field(
                AttributeDescriptor::float("items").array(5),
                Node::Array(vec![ProxyValue::Float(0.0); 5]),
            )
            .with_field(
                AttributeDescriptor::structural("modifiers", AttributeKind::Collection),
                Node::Collection(vec![Node::named("Modifier", "Mod").with_field(
                    AttributeDescriptor::int("levels"),
                    Node::Scalar(ProxyValue::Int(2)),
                )]),
            );
        let id = scene.add_object("Cube", "OBJECT", data);
        (scene, id)
    }

    #[test]
    fn graph_records_paths_and_descriptors() {
        let (scene, id) = scene();
        let graph = resolve_str(&scene, id, r#"modifiers["Mod"].levels"#).unwrap();
        let paths: Vec<_> = graph.steps().iter().map(|s| s.path_so_far.as_str()).collect();
        assert_eq!(
            paths,
            vec!["", "modifiers", r#"modifiers["Mod"]"#, r#"modifiers["Mod"].levels"#]
        );
        let kinds: Vec<_> = graph.steps().iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![StepKind::Root, StepKind::Field, StepKind::Key, StepKind::Field]
        );
        assert!(graph.steps()[2].descriptor.is_none());
        assert_eq!(
            graph.last().unwrap().descriptor.as_ref().unwrap().identifier,
            "levels"
        );
        assert_eq!(
            graph.last().unwrap().value,
            HostValue::Scalar(ProxyValue::Int(2))
        );
    }

    #[test]
    fn every_step_path_reproduces_its_value() {
        let (scene, id) = scene();
        let graph = resolve_str(&scene, id, "modifiers[0].levels").unwrap();
        for step in graph.steps() {
            assert_eq!(scene.resolve_path(id, &step.path_so_far).unwrap(), step.value);
        }
    }

    #[test]
    fn failures_are_absent() {
        let (mut scene, id) = scene();
        assert!(resolve_str(&scene, id, "nonexistent_field").is_err());
        assert!(matches!(
            resolve_str(&scene, id, "items[").unwrap_err(),
            ResolveError::Path(_)
        ));
        assert!(reassemble(&scene, id, "items[9]").is_none());
        scene.remove_object(id);
        assert!(reassemble(&scene, id, "size").is_none());
    }

    #[test]
    fn reassembles_tail_shapes() {
        let (scene, id) = scene();

        let r = reassemble(&scene, id, "size").unwrap();
        assert_eq!(r.parent_path, "");
        assert_eq!(r.attribute, "size");
        assert_eq!(r.array_index, 0);

        let r = reassemble(&scene, id, "items[2]").unwrap();
        assert_eq!(r.parent_path, "");
        assert_eq!(r.attribute, "items");
        assert_eq!(r.array_index, 2);

        let r = reassemble(&scene, id, "modifiers[0].levels").unwrap();
        assert_eq!(r.parent_path, "modifiers[0]");
        assert_eq!(r.full_path(), "modifiers[0].levels");

        let r = reassemble(&scene, id, r#"modifiers["Mod"]"#).unwrap();
        assert_eq!(r.attribute, r#"modifiers["Mod"]"#);
        assert_eq!(r.array_index, 0);
    }

    #[test]
    fn unsupported_tails_are_none() {
        let mut scene = MockScene::new();
        let grid = Node::Collection(vec![Node::Collection(vec![Node::named("Cell", "a")])]);
        let data = Node::structure("Object").with_field(
            AttributeDescriptor::structural("grid", AttributeKind::Collection),
            grid,
        );
        let id = scene.add_object("Grid", "OBJECT", data);
        assert!(resolve_str(&scene, id, "grid[0][0]").is_ok());
        assert!(reassemble(&scene, id, "grid[0][0]").is_none());
        assert!(reassemble(&scene, id, "").is_none());
    }
}
