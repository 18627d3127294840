//! Generates StatVarGroup hierarchies from free-text group paths.

use crate::error::StoreError;
use crate::sanitize::{is_valid_dcid, normalize_identifier};

use super::node::McfNodes;
use super::quoting::unquote;
use super::statvar::{StatVarGroupNode, ROOT_GROUP, STAT_VAR_TYPE};

/// Turns every StatVar `memberOf` written as a path (`Economy/Output/GDP`)
/// into a chain of StatVarGroup nodes under `dcid:dc/g/Root`, then points the
/// variable at the deepest group.
///
/// Each segment gets its own id, `dcid:<namespace>/g/<slug>`, where the slug
/// is the normalised segment name. A segment that already has a group reuses
/// it. Returns the ids of the groups created. Nothing is changed on error.
pub fn build_groups_from_paths(
    nodes: &mut McfNodes,
    namespace: &str,
) -> Result<Vec<String>, StoreError> {
    let namespace = namespace.trim().trim_matches('/');
    if namespace.is_empty() || !is_valid_dcid(namespace) {
        return Err(StoreError::InvalidNode {
            id: namespace.to_string(),
            reason: "group namespace is not a valid identifier".to_string(),
        });
    }

    let mut working = nodes.clone();
    let mut created = Vec::new();

    for node in nodes.iter() {
        if node.type_of() != Some(STAT_VAR_TYPE) {
            continue;
        }
        let Some(member_of) = node.get("memberOf").map(unquote) else {
            continue;
        };
        if member_of.starts_with("dcid:") || member_of.contains("g/") {
            continue;
        }

        let segments: Vec<&str> = member_of
            .split('/')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if segments.is_empty() {
            continue;
        }

        let mut parent = ROOT_GROUP.to_string();
        for segment in &segments {
            let slug = normalize_identifier(segment);
            if slug.is_empty() {
                return Err(StoreError::InvalidNode {
                    id: node.id().to_string(),
                    reason: format!("group path segment '{}' has no usable characters", segment),
                });
            }

            let id = format!("dcid:{}/g/{}", namespace, slug);
            if !working.contains(&id) {
                let group = StatVarGroupNode::new(id.clone(), *segment, parent.clone());
                working.insert(group.to_node()?, false);
                created.push(id.clone());
            }
            parent = id;
        }

        if let Some(target) = working.nodes_mut().find(|n| n.id() == node.id()) {
            target.set("memberOf", parent);
        }
    }

    *nodes = working;
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcf::statvar::StatVarNode;

    fn var(id: &str, path: &str) -> crate::mcf::McfNode {
        StatVarNode::new(id, id).member_of(path).to_node().unwrap()
    }

    #[test]
    fn test_builds_chain() {
        let mut nodes = McfNodes::new();
        nodes.insert(var("gdp", "Economy/National Accounts"), false);

        let created = build_groups_from_paths(&mut nodes, "one").unwrap();

        assert_eq!(
            created,
            vec![
                "dcid:one/g/economy".to_string(),
                "dcid:one/g/nationalAccounts".to_string()
            ]
        );
        let leaf = nodes.get("dcid:one/g/nationalAccounts").unwrap();
        assert_eq!(leaf.get("specializationOf"), Some("dcid:one/g/economy"));
        assert_eq!(leaf.get("name"), Some("\"National Accounts\""));
        assert_eq!(
            nodes.get("dcid:one/g/economy").unwrap().get("specializationOf"),
            Some(ROOT_GROUP)
        );
        assert_eq!(
            nodes.get("gdp").unwrap().get("memberOf"),
            Some("dcid:one/g/nationalAccounts")
        );
    }

    #[test]
    fn test_single_level_path() {
        let mut nodes = McfNodes::new();
        nodes.insert(var("sv", "Category"), false);

        let created = build_groups_from_paths(&mut nodes, "example.org").unwrap();

        assert_eq!(created, vec!["dcid:example.org/g/category".to_string()]);
        let group = nodes.get("dcid:example.org/g/category").unwrap();
        assert_eq!(group.get("name"), Some("\"Category\""));
        assert_eq!(group.get("specializationOf"), Some(ROOT_GROUP));
        assert_eq!(
            nodes.get("sv").unwrap().get("memberOf"),
            Some("dcid:example.org/g/category")
        );
    }

    #[test]
    fn test_nested_path_links_each_segment() {
        let mut nodes = McfNodes::new();
        nodes.insert(var("sv", "A/B/C"), false);

        let created = build_groups_from_paths(&mut nodes, "ns").unwrap();

        assert_eq!(created, vec!["dcid:ns/g/A", "dcid:ns/g/B", "dcid:ns/g/C"]);
        assert_eq!(nodes.get("dcid:ns/g/A").unwrap().get("specializationOf"), Some(ROOT_GROUP));
        assert_eq!(nodes.get("dcid:ns/g/B").unwrap().get("specializationOf"), Some("dcid:ns/g/A"));
        assert_eq!(nodes.get("dcid:ns/g/C").unwrap().get("specializationOf"), Some("dcid:ns/g/B"));
        assert_eq!(nodes.get("sv").unwrap().get("memberOf"), Some("dcid:ns/g/C"));
    }

    #[test]
    fn test_overlapping_paths_share_groups() {
        let mut nodes = McfNodes::new();
        nodes.insert(var("sv1", "X/Y"), false);
        nodes.insert(var("sv2", "X/Y/Z"), false);

        let created = build_groups_from_paths(&mut nodes, "ns2").unwrap();

        assert_eq!(created, vec!["dcid:ns2/g/X", "dcid:ns2/g/Y", "dcid:ns2/g/Z"]);
        assert_eq!(nodes.get("sv1").unwrap().get("memberOf"), Some("dcid:ns2/g/Y"));
        assert_eq!(nodes.get("sv2").unwrap().get("memberOf"), Some("dcid:ns2/g/Z"));
    }

    #[test]
    fn test_shared_prefix_reuses_groups() {
        let mut nodes = McfNodes::new();
        nodes.insert(var("gdp", "Economy/Output"), false);
        nodes.insert(var("debt", "Economy/Debt"), false);

        let created = build_groups_from_paths(&mut nodes, "one").unwrap();
        assert_eq!(created.len(), 3);
    }

    #[test]
    fn test_existing_references_untouched() {
        let mut nodes = McfNodes::new();
        nodes.insert(var("gdp", "dcid:dc/g/Economy"), false);

        let created = build_groups_from_paths(&mut nodes, "one").unwrap();
        assert!(created.is_empty());
        assert_eq!(nodes.get("gdp").unwrap().get("memberOf"), Some("dcid:dc/g/Economy"));
    }

    #[test]
    fn test_invalid_namespace_leaves_nodes_unchanged() {
        let mut nodes = McfNodes::new();
        nodes.insert(var("gdp", "Economy"), false);
        let before = nodes.clone();

        assert!(build_groups_from_paths(&mut nodes, "bad namespace").is_err());
        assert_eq!(nodes, before);
    }
}
