use std::collections::{HashMap, HashSet, VecDeque};

use crate::catalog::{Dependency, DiagramNode};

/// A connected component of the input graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Component {
    pub nodes: Vec<DiagramNode>,
    pub edges: Vec<Dependency>,
}

/// Splits nodes into weakly connected components. Components appear in discovery order
/// and list their nodes in breadth-first order; only edges with both endpoints inside a
/// component are kept with it.
pub fn split_components(nodes: &[DiagramNode], edges: &[Dependency]) -> Vec<Component> {
    let mut adjacency: HashMap<&str, Vec<&str>> = nodes
        .iter()
        .map(|node| (node.id.as_str(), Vec::new()))
        .collect();
    for edge in edges {
        if !adjacency.contains_key(edge.source.as_str())
            || !adjacency.contains_key(edge.target.as_str())
        {
            continue;
        }
        if let Some(list) = adjacency.get_mut(edge.source.as_str()) {
            list.push(edge.target.as_str());
        }
        if let Some(list) = adjacency.get_mut(edge.target.as_str()) {
            list.push(edge.source.as_str());
        }
    }

    let by_id: HashMap<&str, &DiagramNode> =
        nodes.iter().map(|node| (node.id.as_str(), node)).collect();

    let mut visited: HashSet<&str> = HashSet::new();
    let mut components = Vec::new();
    for start in nodes {
        if !visited.insert(start.id.as_str()) {
            continue;
        }
        let mut queue = VecDeque::from([start.id.as_str()]);
        let mut members: Vec<DiagramNode> = Vec::new();
        let mut member_ids: HashSet<&str> = HashSet::new();
        while let Some(current) = queue.pop_front() {
            if let Some(node) = by_id.get(current) {
                members.push((*node).clone());
            }
            member_ids.insert(current);
            for neighbor in adjacency.get(current).into_iter().flatten() {
                if visited.insert(*neighbor) {
                    queue.push_back(*neighbor);
                }
            }
        }

        let member_edges = edges
            .iter()
            .filter(|edge| {
                member_ids.contains(edge.source.as_str()) && member_ids.contains(edge.target.as_str())
            })
            .cloned()
            .collect();
        components.push(Component {
            nodes: members,
            edges: member_edges,
        });
    }

    components
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::EntityKind;

    fn nodes(ids: &[&str]) -> Vec<DiagramNode> {
        ids.iter()
            .map(|id| DiagramNode::new(*id, EntityKind::Component))
            .collect()
    }

    fn ids(component: &Component) -> Vec<&str> {
        component.nodes.iter().map(|node| node.id.as_str()).collect()
    }

    #[test]
    fn disjoint_pairs_become_two_components() {
        let nodes = nodes(&["X", "Y", "Z", "W"]);
        let edges = vec![Dependency::new("X", "Y"), Dependency::new("Z", "W")];
        let components = split_components(&nodes, &edges);
        assert_eq!(components.len(), 2);
        for component in &components {
            assert_eq!(component.nodes.len(), 2);
            assert_eq!(component.edges.len(), 1);
        }
        assert_eq!(ids(&components[0]), vec!["X", "Y"]);
        assert_eq!(ids(&components[1]), vec!["Z", "W"]);
    }

    #[test]
    fn connectivity_ignores_edge_direction() {
        let nodes = nodes(&["a", "b", "c"]);
        let edges = vec![Dependency::new("b", "a"), Dependency::new("b", "c")];
        let components = split_components(&nodes, &edges);
        assert_eq!(components.len(), 1);
        assert_eq!(ids(&components[0]), vec!["a", "b", "c"]);
        assert_eq!(components[0].edges, edges);
    }

    #[test]
    fn isolated_nodes_and_dangling_edges() {
        let nodes = nodes(&["solo", "a"]);
        let edges = vec![Dependency::new("a", "ghost")];
        let components = split_components(&nodes, &edges);
        assert_eq!(components.len(), 2);
        assert!(components.iter().all(|component| component.edges.is_empty()));
    }

    #[test]
    fn empty_input_yields_no_components() {
        assert!(split_components(&[], &[]).is_empty());
    }
}
