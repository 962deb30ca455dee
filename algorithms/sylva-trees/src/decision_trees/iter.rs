use std::collections::VecDeque;
use std::iter::Iterator;

use super::TreeNode;
use sylva::Float;

/// Level-order (BFT) iterator of nodes in a regression tree
pub struct NodeIter<'a, F> {
    nodes: &'a [TreeNode<F>],
    queue: VecDeque<usize>,
}

impl<'a, F> NodeIter<'a, F> {
    /// Start the traversal at node `root` of the arena `nodes`
    pub fn new(nodes: &'a [TreeNode<F>], root: usize) -> Self {
        let mut queue = VecDeque::new();
        if root < nodes.len() {
            queue.push_back(root);
        }

        NodeIter { nodes, queue }
    }
}

impl<'a, F: Float> Iterator for NodeIter<'a, F> {
    type Item = &'a TreeNode<F>;

    fn next(&mut self) -> Option<Self::Item> {
        let nodes = self.nodes;
        self.queue.pop_front().map(|idx| {
            let node = &nodes[idx];
            if let Some((left, right)) = node.children() {
                self.queue.push_back(left);
                self.queue.push_back(right);
            }

            node
        })
    }
}
