use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Relation type whose direction is reversed: `A dependsOn B` draws `B -> A`.
pub const REVERSE_RELATION: &str = "dependsOn";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid catalog document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate entity '{0}' in catalog")]
    DuplicateEntity(String),
    #[error("unknown entity '{0}'")]
    UnknownEntity(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityKind {
    Component,
    Resource,
    Other(String),
}

impl EntityKind {
    pub fn as_str(&self) -> &str {
        match self {
            EntityKind::Component => "Component",
            EntityKind::Resource => "Resource",
            EntityKind::Other(kind) => kind.as_str(),
        }
    }

    /// Only components carry a relation list.
    pub fn bears_relations(&self) -> bool {
        matches!(self, EntityKind::Component)
    }

    /// Components are the only kind with a detail page to open.
    pub fn is_viewable(&self) -> bool {
        matches!(self, EntityKind::Component)
    }
}

impl From<String> for EntityKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Component" => EntityKind::Component,
            "Resource" => EntityKind::Resource,
            _ => EntityKind::Other(value),
        }
    }
}

impl From<EntityKind> for String {
    fn from(value: EntityKind) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    pub kind: EntityKind,
    pub metadata: EntityMetadata,
    #[serde(default)]
    pub spec: EntitySpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntitySpec {
    #[serde(default)]
    pub relations: Vec<Relation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relation {
    #[serde(rename = "type")]
    pub relation_type: String,
    pub target: RelationTarget,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationTarget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub name: String,
}

impl Relation {
    /// Resolves the relation into a `source -> target` pair as seen from `owner`.
    pub fn normalized<'a>(&'a self, owner: &'a str) -> (&'a str, &'a str) {
        if self.relation_type == REVERSE_RELATION {
            (self.target.name.as_str(), owner)
        } else {
            (owner, self.target.name.as_str())
        }
    }
}

/// A node handed to the layout engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DiagramNode {
    pub id: String,
    pub kind: EntityKind,
    pub tags: Vec<String>,
    pub is_center: bool,
}

impl DiagramNode {
    pub fn new(id: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            id: id.into(),
            kind,
            tags: Vec::new(),
            is_center: false,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    fn from_entity(entity: &Entity, is_center: bool) -> Self {
        Self {
            id: entity.metadata.name.clone(),
            kind: entity.kind.clone(),
            tags: entity.metadata.tags.clone(),
            is_center,
        }
    }
}

/// A direction-normalized edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub source: String,
    pub target: String,
}

impl Dependency {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    pub fn id(&self) -> String {
        format!("e-{}-{}", self.source, self.target)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DependencyGraph {
    pub nodes: Vec<DiagramNode>,
    pub edges: Vec<Dependency>,
}

impl DependencyGraph {
    pub fn new(nodes: Vec<DiagramNode>, edges: Vec<Dependency>) -> Self {
        Self { nodes, edges }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Edges whose endpoints are both present in the node set.
    pub fn resolved_edges(&self) -> Vec<Dependency> {
        let ids: HashSet<&str> = self.nodes.iter().map(|node| node.id.as_str()).collect();
        self.edges
            .iter()
            .filter(|edge| ids.contains(edge.source.as_str()) && ids.contains(edge.target.as_str()))
            .cloned()
            .collect()
    }
}

/// Allowed tag set. An entity passes when every one of its tags is allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter {
    allowed: BTreeSet<String>,
}

impl TagFilter {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: tags.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allows(&self, tags: &[String]) -> bool {
        tags.iter().all(|tag| self.allowed.contains(tag))
    }

    pub fn toggle(&mut self, tag: &str) {
        if !self.allowed.remove(tag) {
            self.allowed.insert(tag.to_string());
        }
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.allowed.iter().map(String::as_str)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entities: Vec<Entity>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn new(entities: Vec<Entity>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(entities.len());
        for (idx, entity) in entities.iter().enumerate() {
            if index.insert(entity.metadata.name.clone(), idx).is_some() {
                return Err(CatalogError::DuplicateEntity(entity.metadata.name.clone()));
            }
        }
        Ok(Self { entities, index })
    }

    pub fn from_json(source: &str) -> Result<Self, CatalogError> {
        let entities: Vec<Entity> = serde_json::from_str(source)?;
        Self::new(entities)
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn get(&self, name: &str) -> Option<&Entity> {
        self.index.get(name).map(|idx| &self.entities[*idx])
    }

    /// Every tag used in the catalog, sorted.
    pub fn all_tags(&self) -> Vec<String> {
        let tags: BTreeSet<&str> = self
            .entities
            .iter()
            .flat_map(|entity| entity.metadata.tags.iter().map(String::as_str))
            .collect();
        tags.into_iter().map(str::to_string).collect()
    }

    /// Filter with every catalog tag selected.
    pub fn default_filter(&self) -> TagFilter {
        TagFilter::new(self.all_tags())
    }

    /// The whole catalog as one (possibly disconnected) graph, restricted to entities
    /// passing `filter`.
    pub fn dependency_graph(&self, filter: &TagFilter) -> DependencyGraph {
        let included: Vec<&Entity> = self
            .entities
            .iter()
            .filter(|entity| filter.allows(&entity.metadata.tags))
            .collect();
        let names: HashSet<&str> = included
            .iter()
            .map(|entity| entity.metadata.name.as_str())
            .collect();

        let nodes = included
            .iter()
            .map(|entity| DiagramNode::from_entity(entity, false))
            .collect();

        let mut edges = EdgeSet::default();
        for entity in &included {
            if !entity.kind.bears_relations() {
                continue;
            }
            for relation in &entity.spec.relations {
                if !names.contains(relation.target.name.as_str()) {
                    continue;
                }
                let (source, target) = relation.normalized(&entity.metadata.name);
                edges.push(source, target);
            }
        }

        let graph = DependencyGraph::new(nodes, edges.into_vec());
        debug!(
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "built catalog dependency graph"
        );
        graph
    }

    /// One entity and its direct relations, with the entity marked as the center node.
    pub fn focus_graph(&self, name: &str) -> Result<DependencyGraph, CatalogError> {
        let entity = self
            .get(name)
            .ok_or_else(|| CatalogError::UnknownEntity(name.to_string()))?;

        let mut nodes = vec![DiagramNode::from_entity(entity, true)];
        let mut seen: HashSet<&str> = HashSet::from([entity.metadata.name.as_str()]);
        let mut edges = EdgeSet::default();

        if entity.kind.bears_relations() {
            for relation in &entity.spec.relations {
                let Some(related) = self.get(&relation.target.name) else {
                    continue;
                };
                if seen.insert(related.metadata.name.as_str()) {
                    nodes.push(DiagramNode::from_entity(related, false));
                }
                let (source, target) = relation.normalized(&entity.metadata.name);
                edges.push(source, target);
            }
        }

        Ok(DependencyGraph::new(nodes, edges.into_vec()))
    }
}

/// Insertion-ordered edge list without duplicates or self loops.
#[derive(Default)]
struct EdgeSet {
    seen: HashSet<(String, String)>,
    edges: Vec<Dependency>,
}

impl EdgeSet {
    fn push(&mut self, source: &str, target: &str) {
        if source == target {
            debug!(entity = source, "dropping self relation");
            return;
        }
        if self.seen.insert((source.to_string(), target.to_string())) {
            self.edges.push(Dependency::new(source, target));
        }
    }

    fn into_vec(self) -> Vec<Dependency> {
        self.edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {
            "apiVersion": "backstage.io/v1alpha1",
            "kind": "Component",
            "metadata": { "name": "web", "tags": ["frontend"] },
            "spec": {
                "type": "website",
                "relations": [
                    { "type": "dependsOn", "target": { "kind": "Component", "name": "api" } }
                ]
            }
        },
        {
            "kind": "Component",
            "metadata": { "name": "api", "tags": ["backend"] },
            "spec": {
                "relations": [
                    { "type": "providesData", "target": { "kind": "Resource", "name": "db" } },
                    { "type": "dependsOn", "target": { "kind": "Component", "name": "ghost" } }
                ]
            }
        },
        {
            "kind": "Resource",
            "metadata": { "name": "db", "tags": ["backend", "storage"] },
            "spec": { "type": "database", "owner": "team-a" }
        }
    ]"#;

    #[test]
    fn normalizes_relation_direction() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        let graph = catalog.dependency_graph(&catalog.default_filter());
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(
            graph.edges,
            vec![Dependency::new("api", "web"), Dependency::new("api", "db")]
        );
    }

    #[test]
    fn filter_requires_every_tag() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        let graph = catalog.dependency_graph(&TagFilter::new(["frontend", "backend"]));
        let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["web", "api"]);
        assert_eq!(graph.edges, vec![Dependency::new("api", "web")]);
    }

    #[test]
    fn untagged_entities_pass_any_filter() {
        let mut filter = TagFilter::default();
        assert!(filter.allows(&[]));
        filter.toggle("x");
        assert!(filter.allows(&["x".to_string()]));
        filter.toggle("x");
        assert!(!filter.allows(&["x".to_string()]));
    }

    #[test]
    fn all_tags_are_sorted_and_unique() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        assert_eq!(catalog.all_tags(), vec!["backend", "frontend", "storage"]);
    }

    #[test]
    fn focus_graph_marks_center_and_skips_unknown_targets() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        let graph = catalog.focus_graph("api").unwrap();
        assert_eq!(graph.nodes.len(), 2);
        assert!(graph.nodes[0].is_center);
        assert_eq!(graph.nodes[1].id, "db");
        assert_eq!(graph.edges, vec![Dependency::new("api", "db")]);
        assert!(matches!(
            catalog.focus_graph("nope"),
            Err(CatalogError::UnknownEntity(_))
        ));
    }

    #[test]
    fn rejects_duplicate_entities() {
        let doc = r#"[
            { "kind": "Resource", "metadata": { "name": "db" } },
            { "kind": "Resource", "metadata": { "name": "db" } }
        ]"#;
        assert!(matches!(
            Catalog::from_json(doc),
            Err(CatalogError::DuplicateEntity(name)) if name == "db"
        ));
    }

    #[test]
    fn resolved_edges_drop_dangling_references() {
        let graph = DependencyGraph::new(
            vec![DiagramNode::new("a", EntityKind::Component)],
            vec![Dependency::new("a", "missing")],
        );
        assert!(graph.resolved_edges().is_empty());
    }
}
