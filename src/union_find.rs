//! Union-Find
//!
//! A disjoint-set forest with path compression, where every set carries a payload that is merged on union.
//! The decoder keeps one payload per cluster; keys are created per decoding round and dropped by [`UnionFindGeneric::clear`].
//!

use crate::serde::{Deserialize, Serialize};
use std::iter::FromIterator;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UnionFindGeneric<NodeType: UnionNodeTrait> {
    /// tree structure, each node has a parent
    pub link_parent: Vec<usize>,
    /// the node information, has the same length as `link_parent`; only the payload of a root is meaningful
    pub payload: Vec<NodeType>,
    /// internal cache of parent list when calling `find`
    find_parent_list: Vec<usize>,
}

pub trait UnionNodeTrait {
    /// return `true` if `left` should stay the root when merged with `right` (weighted union)
    fn prefer_left(left: &Self, right: &Self) -> bool;
    /// move the information of `child` into `parent`, which becomes the root of the merged set
    fn merge(parent: &mut Self, child: &mut Self);
}

impl<NodeType: UnionNodeTrait> FromIterator<NodeType> for UnionFindGeneric<NodeType> {
    #[inline]
    fn from_iter<T: IntoIterator<Item = NodeType>>(iterator: T) -> Self {
        let mut uf = Self {
            link_parent: vec![],
            payload: vec![],
            find_parent_list: Vec::new(),
        };
        uf.extend(iterator);
        uf
    }
}

impl<NodeType: UnionNodeTrait> Extend<NodeType> for UnionFindGeneric<NodeType> {
    #[inline]
    fn extend<T: IntoIterator<Item = NodeType>>(&mut self, iterable: T) {
        let len = self.payload.len();
        self.payload.extend(iterable);
        let new_len = self.payload.len();
        self.link_parent.extend(len..new_len);
    }
}

impl<NodeType: UnionNodeTrait> Default for UnionFindGeneric<NodeType> {
    fn default() -> Self {
        Self::from_iter(std::iter::empty())
    }
}

impl<NodeType: UnionNodeTrait> UnionFindGeneric<NodeType> {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.payload.len()
    }

    #[inline]
    pub fn insert(&mut self, data: NodeType) -> usize {
        let key = self.payload.len();
        self.link_parent.push(key);
        self.payload.push(data);
        key
    }

    /// weighted union, returns the new root, or `None` if they're already in the same set
    #[inline]
    pub fn union(&mut self, key0: usize, key1: usize) -> Option<usize> {
        let k0 = self.find(key0);
        let k1 = self.find(key1);
        if k0 == k1 {
            return None;
        }
        if NodeType::prefer_left(&self.payload[k0], &self.payload[k1]) {
            Some(self.link(k0, k1))
        } else {
            Some(self.link(k1, k0))
        }
    }

    /// union that always keeps the set of `parent_key` as the root
    #[inline]
    pub fn union_into(&mut self, parent_key: usize, child_key: usize) -> Option<usize> {
        let parent = self.find(parent_key);
        let child = self.find(child_key);
        if parent == child {
            return None;
        }
        Some(self.link(parent, child))
    }

    /// both must be distinct roots
    fn link(&mut self, parent: usize, child: usize) -> usize {
        debug_assert!(self.link_parent[parent] == parent && self.link_parent[child] == child);
        let (parent_payload, child_payload) = if parent < child {
            let (left, right) = self.payload.split_at_mut(child);
            (&mut left[parent], &mut right[0])
        } else {
            let (left, right) = self.payload.split_at_mut(parent);
            (&mut right[0], &mut left[child])
        };
        NodeType::merge(parent_payload, child_payload);
        self.link_parent[child] = parent;
        parent
    }

    #[inline]
    pub fn find(&mut self, key: usize) -> usize {
        let mut k = key;
        let mut p = self.link_parent[k];
        while p != k {
            self.find_parent_list.push(k);
            k = p;
            p = self.link_parent[p];
        }
        let root = k;
        for k in self.find_parent_list.iter() {
            self.link_parent[*k] = root; // path compression
        }
        self.find_parent_list.clear();
        root
    }

    #[inline]
    pub fn immutable_find(&self, key: usize) -> usize {
        let mut k = key;
        let mut p = self.link_parent[k];
        while p != k {
            k = p;
            p = self.link_parent[p];
        }
        k
    }

    #[inline]
    pub fn is_root(&self, key: usize) -> bool {
        self.link_parent[key] == key
    }

    #[inline]
    pub fn get(&mut self, key: usize) -> &NodeType {
        let root_key = self.find(key);
        &self.payload[root_key]
    }

    #[inline]
    pub fn immutable_get(&self, key: usize) -> &NodeType {
        let root_key = self.immutable_find(key);
        &self.payload[root_key]
    }

    #[inline]
    pub fn get_mut(&mut self, key: usize) -> &mut NodeType {
        let root_key = self.find(key);
        &mut self.payload[root_key]
    }

    /// drop all sets while keeping the allocated memory
    pub fn clear(&mut self) {
        self.link_parent.clear();
        self.payload.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct CountingNode {
        set_size: usize,
        defects: usize,
    }

    impl CountingNode {
        fn new(is_defect: bool) -> Self {
            Self {
                set_size: 1,
                defects: usize::from(is_defect),
            }
        }
    }

    impl UnionNodeTrait for CountingNode {
        fn prefer_left(left: &Self, right: &Self) -> bool {
            left.set_size >= right.set_size
        }
        fn merge(parent: &mut Self, child: &mut Self) {
            parent.set_size += child.set_size;
            parent.defects += child.defects;
        }
    }

    #[test]
    fn union_find_algorithm_test_1() {
        // cargo test union_find_algorithm_test_1 -- --nocapture
        let mut uf: UnionFindGeneric<CountingNode> = (0..100).map(|_| CountingNode::new(false)).collect();
        assert_eq!(1, uf.get(0).set_size);
        assert_eq!(1, uf.get(1).set_size);
        assert!(uf.find(0) != uf.find(1));
        assert!(uf.immutable_find(0) != uf.immutable_find(1));
        assert!(uf.find(1) != uf.find(2));
        assert!(uf.union(0, 1).is_some());
        assert!(uf.find(0) == uf.find(1));
        assert!(uf.immutable_find(0) == uf.immutable_find(1));
        assert_eq!(2, uf.get(0).set_size);
        assert_eq!(2, uf.get(1).set_size);
        assert_eq!(1, uf.get(2).set_size);
        assert!(uf.union(0, 1).is_none());
        assert_eq!(2, uf.get(0).set_size);
        assert!(uf.union(1, 2).is_some());
        assert_eq!(3, uf.get(0).set_size);
        assert_eq!(3, uf.get(2).set_size);
        assert!(uf.find(2) == uf.find(1));
        let k100 = uf.insert(CountingNode::new(false));
        assert_eq!(k100, 100);
        assert_eq!(uf.union(k100, 0), Some(uf.find(0)));
        assert_eq!(4, uf.get(100).set_size);
        assert_eq!(101, uf.size());
        uf.clear();
        assert_eq!(0, uf.size());
    }

    #[test]
    fn union_find_weighted_union() {
        // cargo test union_find_weighted_union -- --nocapture
        let mut uf: UnionFindGeneric<CountingNode> = (0..5).map(|_| CountingNode::new(false)).collect();
        uf.union(1, 2);
        uf.union(1, 3);
        let big_root = uf.find(1);
        // the smaller set joins the larger one regardless of argument order
        assert_eq!(uf.union(0, 3), Some(big_root));
        // tie keeps the first argument as root
        let mut tie: UnionFindGeneric<CountingNode> = (0..2).map(|_| CountingNode::new(false)).collect();
        assert_eq!(tie.union(1, 0), Some(1));
        // forced direction
        assert_eq!(uf.union_into(4, 0), Some(4));
        assert_eq!(uf.get(2).set_size, 5);
    }

    #[test]
    fn union_find_soundness_random() {
        // cargo test union_find_soundness_random -- --nocapture
        use crate::util::*;
        use crate::rand_xoshiro::rand_core::SeedableRng;
        let n = 64;
        let mut rng = DeterministicRng::seed_from_u64(2023);
        let is_defect: Vec<bool> = (0..n).map(|_| rng.next_f64() < 0.3).collect();
        let mut uf: UnionFindGeneric<CountingNode> = is_defect.iter().map(|&d| CountingNode::new(d)).collect();
        // naive labeling as ground truth
        let mut label: Vec<usize> = (0..n).collect();
        for _ in 0..80 {
            let a = (rng.next_f64() * n as f64) as usize;
            let b = (rng.next_f64() * n as f64) as usize;
            let merged = uf.union(a, b).is_some();
            let (la, lb) = (label[a], label[b]);
            assert_eq!(merged, la != lb);
            for l in label.iter_mut() {
                if *l == lb {
                    *l = la;
                }
            }
            for i in 0..n {
                for j in 0..n {
                    assert_eq!(uf.immutable_find(i) == uf.immutable_find(j), label[i] == label[j]);
                }
            }
        }
        // size and parity are additive over absorbed elements
        for i in 0..n {
            let members: Vec<usize> = (0..n).filter(|&j| label[j] == label[i]).collect();
            let defects = members.iter().filter(|&&j| is_defect[j]).count();
            assert_eq!(uf.get(i).set_size, members.len());
            assert_eq!(uf.get(i).defects, defects);
        }
    }
}
