//! Leaf-depth check over a plain, unbalanced binary tree. Unrelated to the
//! AVL map: no ordering, no balance, owned boxed children.

pub struct TreeNode<T> {
    pub value: T,
    pub left: Option<Box<TreeNode<T>>>,
    pub right: Option<Box<TreeNode<T>>>,
}

impl<T> TreeNode<T> {
    pub fn leaf(value: T) -> Self {
        TreeNode {
            value,
            left: None,
            right: None,
        }
    }

    pub fn with_children(value: T, left: Option<TreeNode<T>>, right: Option<TreeNode<T>>) -> Self {
        TreeNode {
            value,
            left: left.map(Box::new),
            right: right.map(Box::new),
        }
    }
}

/// True when every root-to-leaf path has the same length. A node with a
/// single child is not a leaf, so only its child's paths count.
pub fn equal_paths<T>(root: Option<&TreeNode<T>>) -> bool {
    fn leaves_at<T>(node: &TreeNode<T>, depth: usize, leaf_depth: &mut Option<usize>) -> bool {
        match (&node.left, &node.right) {
            (None, None) => match *leaf_depth {
                Some(expected) => expected == depth,
                None => {
                    *leaf_depth = Some(depth);
                    true
                }
            },
            (left, right) => [left, right]
                .into_iter()
                .flatten()
                .all(|child| leaves_at(child, depth + 1, leaf_depth)),
        }
    }
    root.map_or(true, |root| leaves_at(root, 0, &mut None))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(left: Option<TreeNode<u32>>, right: Option<TreeNode<u32>>) -> TreeNode<u32> {
        TreeNode::with_children(0, left, right)
    }

    fn leaf() -> Option<TreeNode<u32>> {
        Some(TreeNode::leaf(0))
    }

    #[test]
    fn trivial_trees() {
        assert!(equal_paths::<u32>(None));
        assert!(equal_paths(Some(&TreeNode::leaf(1))));
    }

    #[test]
    fn single_child_chains() {
        let tree = node(Some(node(leaf(), None)), None);
        assert!(equal_paths(Some(&tree)));
    }

    #[test]
    fn full_tree() {
        let tree = node(Some(node(leaf(), leaf())), Some(node(leaf(), leaf())));
        assert!(equal_paths(Some(&tree)));
    }

    #[test]
    fn uneven_leaves() {
        let tree = node(leaf(), Some(node(leaf(), None)));
        assert!(!equal_paths(Some(&tree)));

        let tree = node(Some(node(leaf(), None)), Some(node(None, leaf())));
        assert!(equal_paths(Some(&tree)));

        let tree = node(Some(node(leaf(), leaf())), Some(node(Some(node(leaf(), None)), None)));
        assert!(!equal_paths(Some(&tree)));
    }
}
