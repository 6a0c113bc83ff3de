//! # avl-rs
//!
//! An ordered set backed by a height-balanced (AVL) binary search tree.
//!
//! Every insertion and removal rebalances the affected path with single or
//! double rotations, so the tree height stays below `1.44 * log2(n + 2)`.
//!
//! ## Example
//!
//! ```rust
//! use avl_rs::AvlTree;
//!
//! let mut tree = AvlTree::new();
//! for v in [10, 20, 30, 40, 50, 25] {
//!     tree.insert(v);
//! }
//! assert_eq!(tree.inorder().copied().collect::<Vec<_>>(), [10, 20, 25, 30, 40, 50]);
//!
//! tree.remove(&20);
//! tree.remove(&50);
//! assert_eq!(tree.inorder().copied().collect::<Vec<_>>(), [10, 25, 30, 40]);
//! ```

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::iter::FusedIterator;
use std::mem;

use log::{debug, trace};

// =============================================================================
// Nodes
// =============================================================================

type Link<K> = Option<Box<Node<K>>>;

#[derive(Clone)]
struct Node<K> {
    value: K,
    left: Link<K>,
    right: Link<K>,
    /// Height of the subtree rooted here. A leaf has height 1.
    height: u8,
}

impl<K> Node<K> {
    #[inline]
    fn leaf(value: K) -> Box<Self> {
        Box::new(Self {
            value,
            left: None,
            right: None,
            height: 1,
        })
    }
}

#[inline]
fn height<K>(link: &Link<K>) -> u8 {
    link.as_ref().map_or(0, |node| node.height)
}

#[inline]
fn update_height<K>(node: &mut Node<K>) {
    node.height = 1 + height(&node.left).max(height(&node.right));
}

#[inline]
fn balance_factor<K>(node: &Node<K>) -> i16 {
    i16::from(height(&node.left)) - i16::from(height(&node.right))
}

// =============================================================================
// Rotations
// =============================================================================

#[cfg(test)]
thread_local! {
    static ROTATIONS: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
}

#[inline]
fn count_rotation() {
    #[cfg(test)]
    ROTATIONS.with(|count| count.set(count.get() + 1));
}

/// Lifts the left child of `y` into its place. `y` becomes the right child of
/// the new root and inherits the old `x.right` as its left subtree.
fn rotate_right<K>(mut y: Box<Node<K>>) -> Box<Node<K>> {
    let mut x = y.left.take().expect("rotate_right requires a left child");
    y.left = x.right.take();
    update_height(&mut y);
    x.right = Some(y);
    update_height(&mut x);
    count_rotation();
    trace!("rotated right, subtree height now {}", x.height);
    x
}

/// Mirror of [`rotate_right`].
fn rotate_left<K>(mut x: Box<Node<K>>) -> Box<Node<K>> {
    let mut y = x.right.take().expect("rotate_left requires a right child");
    x.right = y.left.take();
    update_height(&mut x);
    y.left = Some(x);
    update_height(&mut y);
    count_rotation();
    trace!("rotated left, subtree height now {}", y.height);
    y
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Imbalance {
    LeftLeft,
    LeftRight,
    RightRight,
    RightLeft,
}

fn restore_balance<K>(mut node: Box<Node<K>>, case: Imbalance) -> Box<Node<K>> {
    debug!("rebalancing {case:?} at height {}", node.height);
    match case {
        Imbalance::LeftLeft => rotate_right(node),
        Imbalance::LeftRight => {
            let left = node.left.take().expect("left-right case requires a left child");
            node.left = Some(rotate_left(left));
            rotate_right(node)
        }
        Imbalance::RightRight => rotate_left(node),
        Imbalance::RightLeft => {
            let right = node.right.take().expect("right-left case requires a right child");
            node.right = Some(rotate_right(right));
            rotate_left(node)
        }
    }
}

/// Rebalance after an insertion below `node`.
///
/// `child_side` is where the new key went relative to the child that received
/// it. Only one side grew by one level, so it alone picks the case.
fn rebalance_inserted<K>(mut node: Box<Node<K>>, child_side: Ordering) -> Box<Node<K>> {
    update_height(&mut node);
    let balance = balance_factor(&node);
    let case = match child_side {
        Ordering::Less if balance > 1 => Imbalance::LeftLeft,
        Ordering::Greater if balance > 1 => Imbalance::LeftRight,
        Ordering::Greater if balance < -1 => Imbalance::RightRight,
        Ordering::Less if balance < -1 => Imbalance::RightLeft,
        _ => return node,
    };
    restore_balance(node, case)
}

/// Rebalance after a removal below `node`, choosing the case from the
/// grandchildren heights.
fn rebalance<K>(mut node: Box<Node<K>>) -> Box<Node<K>> {
    update_height(&mut node);
    let balance = balance_factor(&node);
    let case = if balance > 1 {
        let left = node.left.as_deref().expect("left-heavy node has a left child");
        if height(&left.left) >= height(&left.right) {
            Imbalance::LeftLeft
        } else {
            Imbalance::LeftRight
        }
    } else if balance < -1 {
        let right = node.right.as_deref().expect("right-heavy node has a right child");
        if height(&right.right) >= height(&right.left) {
            Imbalance::RightRight
        } else {
            Imbalance::RightLeft
        }
    } else {
        return node;
    };
    restore_balance(node, case)
}

// =============================================================================
// Recursive insert / remove
// =============================================================================

/// Returns the new subtree root and where `value` went relative to it
/// (`Equal` when the subtree is the freshly created leaf or a duplicate).
fn insert_node<K: Ord>(link: Link<K>, value: K, inserted: &mut bool) -> (Box<Node<K>>, Ordering) {
    let mut node = match link {
        Some(node) => node,
        None => {
            *inserted = true;
            return (Node::leaf(value), Ordering::Equal);
        }
    };

    let side = value.cmp(&node.value);
    let child_side = match side {
        Ordering::Less => {
            let (left, child_side) = insert_node(node.left.take(), value, inserted);
            node.left = Some(left);
            child_side
        }
        Ordering::Greater => {
            let (right, child_side) = insert_node(node.right.take(), value, inserted);
            node.right = Some(right);
            child_side
        }
        Ordering::Equal => return (node, side),
    };

    if !*inserted {
        return (node, side);
    }
    (rebalance_inserted(node, child_side), side)
}

fn remove_node<K, Q>(link: Link<K>, value: &Q, removed: &mut Option<K>) -> Link<K>
where
    K: Borrow<Q>,
    Q: Ord + ?Sized,
{
    let mut node = link?;
    let node = match value.cmp(node.value.borrow()) {
        Ordering::Less => {
            node.left = remove_node(node.left.take(), value, removed);
            node
        }
        Ordering::Greater => {
            node.right = remove_node(node.right.take(), value, removed);
            node
        }
        Ordering::Equal => match (node.left.take(), node.right.take()) {
            (Some(left), Some(right)) => {
                // The node stays where it is and takes over its in-order
                // successor's value.
                let (rest, successor) = take_min(right);
                *removed = Some(mem::replace(&mut node.value, successor));
                node.left = Some(left);
                node.right = rest;
                node
            }
            (left, right) => {
                *removed = Some(node.value);
                left.or(right)?
            }
        },
    };

    if removed.is_none() {
        return Some(node);
    }
    Some(rebalance(node))
}

/// Detaches the minimum of a subtree, rebalancing every level on the way up.
fn take_min<K>(mut node: Box<Node<K>>) -> (Link<K>, K) {
    match node.left.take() {
        Some(left) => {
            let (rest, min) = take_min(left);
            node.left = rest;
            (Some(rebalance(node)), min)
        }
        None => {
            let Node { value, right, .. } = *node;
            (right, value)
        }
    }
}

// =============================================================================
// AvlTree
// =============================================================================

/// An ordered set of unique keys kept in a self-balancing binary search tree.
///
/// Each node is owned by exactly one parent (or by the tree, for the root).
/// Mutations descend recursively and hand ownership of the possibly rotated
/// subtree back to the caller, which relinks it.
#[derive(Clone)]
pub struct AvlTree<K> {
    root: Link<K>,
    len: usize,
}

impl<K> AvlTree<K> {
    pub const fn new() -> Self {
        Self { root: None, len: 0 }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Height of the tree: 0 when empty, 1 for a single key.
    #[inline]
    pub fn height(&self) -> usize {
        usize::from(height(&self.root))
    }

    pub fn clear(&mut self) {
        self.root = None;
        self.len = 0;
    }

    pub fn first(&self) -> Option<&K> {
        let mut node = self.root.as_deref()?;
        while let Some(left) = node.left.as_deref() {
            node = left;
        }
        Some(&node.value)
    }

    pub fn last(&self) -> Option<&K> {
        let mut node = self.root.as_deref()?;
        while let Some(right) = node.right.as_deref() {
            node = right;
        }
        Some(&node.value)
    }

    /// Visits every key once, in ascending order.
    ///
    /// The iterator is lazy and only borrows the tree; calling `inorder` again
    /// restarts from the smallest key.
    pub fn inorder(&self) -> Iter<'_, K> {
        Iter::new(self.root.as_deref(), self.len)
    }
}

impl<K: Ord> AvlTree<K> {
    /// Adds `value` to the tree. Returns `false`, leaving the tree untouched,
    /// if an equal key is already stored.
    pub fn insert(&mut self, value: K) -> bool {
        let mut inserted = false;
        let (root, _) = insert_node(self.root.take(), value, &mut inserted);
        self.root = Some(root);
        if inserted {
            self.len += 1;
        }
        inserted
    }

    /// Removes `value` from the tree. Returns `false` if it was not present.
    pub fn remove<Q>(&mut self, value: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.take(value).is_some()
    }

    /// Removes and returns the stored key equal to `value`.
    pub fn take<Q>(&mut self, value: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut removed = None;
        self.root = remove_node(self.root.take(), value, &mut removed);
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    pub fn get<Q>(&self, value: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            match value.cmp(node.value.borrow()) {
                Ordering::Less => current = node.left.as_deref(),
                Ordering::Greater => current = node.right.as_deref(),
                Ordering::Equal => return Some(&node.value),
            }
        }
        None
    }

    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(value).is_some()
    }
}

impl<K> Default for AvlTree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug> fmt::Debug for AvlTree<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.inorder()).finish()
    }
}

/// Two trees are equal when they hold the same keys, whatever their shape.
impl<K: PartialEq> PartialEq for AvlTree<K> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.inorder().eq(other.inorder())
    }
}

impl<K: Eq> Eq for AvlTree<K> {}

impl<'a, K> IntoIterator for &'a AvlTree<K> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.inorder()
    }
}

impl<K> IntoIterator for AvlTree<K> {
    type Item = K;
    type IntoIter = IntoIter<K>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self.root, self.len)
    }
}

// =============================================================================
// Iterators
// =============================================================================

/// Borrowing in-order iterator. Holds the unvisited left spine, so it uses
/// O(height) memory.
pub struct Iter<'a, K> {
    stack: Vec<&'a Node<K>>,
    remaining: usize,
}

impl<'a, K> Iter<'a, K> {
    fn new(root: Option<&'a Node<K>>, len: usize) -> Self {
        let mut iter = Self {
            stack: Vec::new(),
            remaining: len,
        };
        iter.push_left_spine(root);
        iter
    }

    fn push_left_spine(&mut self, mut node: Option<&'a Node<K>>) {
        while let Some(n) = node {
            self.stack.push(n);
            node = n.left.as_deref();
        }
    }
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left_spine(node.right.as_deref());
        self.remaining -= 1;
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {}

impl<K> FusedIterator for Iter<'_, K> {}

impl<K> Clone for Iter<'_, K> {
    fn clone(&self) -> Self {
        Self {
            stack: self.stack.clone(),
            remaining: self.remaining,
        }
    }
}

/// Consuming in-order iterator.
pub struct IntoIter<K> {
    stack: Vec<Box<Node<K>>>,
    remaining: usize,
}

impl<K> IntoIter<K> {
    fn new(root: Link<K>, len: usize) -> Self {
        let mut iter = Self {
            stack: Vec::new(),
            remaining: len,
        };
        iter.push_left_spine(root);
        iter
    }

    fn push_left_spine(&mut self, mut link: Link<K>) {
        while let Some(mut node) = link {
            link = node.left.take();
            self.stack.push(node);
        }
    }
}

impl<K> Iterator for IntoIter<K> {
    type Item = K;

    fn next(&mut self) -> Option<Self::Item> {
        let mut node = self.stack.pop()?;
        self.push_left_spine(node.right.take());
        self.remaining -= 1;
        Some(node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K> ExactSizeIterator for IntoIter<K> {}

impl<K> FusedIterator for IntoIter<K> {}


#[cfg(test)]
mod proptests;
