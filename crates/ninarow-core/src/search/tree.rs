//! Arena-backed best-first search tree.
//!
//! Nodes live in one `Vec` owned by the [`GameTree`] and refer to each other by
//! [`NodeId`]. Values are kept from player 1's point of view: player 1
//! maximizes, player 2 minimizes. Besides a heuristic value every node tracks
//! pessimistic and optimistic bounds on the game-theoretic outcome; a node is
//! determined once the two meet.

use std::collections::VecDeque;
use std::fmt::Write as _;

use crate::board::Board;
use crate::error::{NInARowError, Result};
use crate::moves::Move;
use crate::player::Player;

/// Index of a node in its [`GameTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// One explored position.
#[derive(Debug, Clone)]
pub struct BfsNode {
    board: Board,
    parent: Option<NodeId>,
    mv: Option<Move>,
    depth: usize,
    val: f64,
    pess: i32,
    opt: i32,
    children: Vec<NodeId>,
    best_known_child: Option<NodeId>,
}

impl BfsNode {
    fn new(board: Board, parent: Option<NodeId>, mv: Option<Move>, depth: usize, val: f64) -> Self {
        let black_wins = black_wins(&board);
        let depth_i = depth as i32;
        let (pess, opt, val) = if board.player_has_won(Player::Player1) {
            (black_wins - depth_i, black_wins - depth_i, f64::INFINITY)
        } else if board.player_has_won(Player::Player2) {
            (-black_wins + depth_i, -black_wins + depth_i, f64::NEG_INFINITY)
        } else if board.game_is_drawn() {
            (0, 0, 0.0)
        } else {
            (-black_wins + depth_i, black_wins - depth_i, val)
        };
        BfsNode {
            board,
            parent,
            mv,
            depth,
            val,
            pess,
            opt,
            children: Vec::new(),
            best_known_child: None,
        }
    }

    /// Board after the node's move.
    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The move leading to this node; `None` at the root.
    #[inline]
    pub fn mv(&self) -> Option<&Move> {
        self.mv.as_ref()
    }

    /// Depth in the tree; the root has depth 1.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn val(&self) -> f64 {
        self.val
    }

    #[inline]
    pub fn pess(&self) -> i32 {
        self.pess
    }

    #[inline]
    pub fn opt(&self) -> i32 {
        self.opt
    }

    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[inline]
    pub fn best_known_child(&self) -> Option<NodeId> {
        self.best_known_child
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns `true` once the bounds on the outcome have converged.
    #[inline]
    pub fn determined(&self) -> bool {
        self.pess == self.opt
    }

    #[inline]
    fn maximizing(&self) -> bool {
        self.board.active_player() == Player::Player1
    }

    /// Worst possible bound for the player to move.
    #[inline]
    fn worst_bound(&self) -> i32 {
        let black_wins = black_wins(&self.board);
        if self.maximizing() {
            -black_wins + self.depth as i32
        } else {
            black_wins - self.depth as i32
        }
    }
}

/// Bound for a win by player 1 at depth zero.
#[inline]
fn black_wins(board: &Board) -> i32 {
    board.geometry().size() as i32 + 2
}

/// Replaces `field` with `child` if it is strictly better for the player to
/// move, returning whether it did.
#[inline]
fn improve<T: PartialOrd + Copy>(maximizing: bool, child: T, field: &mut T) -> bool {
    let better = if maximizing {
        child > *field
    } else {
        child < *field
    };
    if better {
        *field = child;
    }
    better
}

/// A best-first search tree over board positions.
#[derive(Debug, Clone)]
pub struct GameTree {
    nodes: Vec<BfsNode>,
    node_budget: Option<usize>,
}

impl GameTree {
    /// Creates a tree holding only `board`.
    ///
    /// # Arguments
    /// * `board` - Root position.
    /// * `val` - Heuristic value of the root, from player 1's point of view.
    /// * `node_budget` - Maximum number of nodes below the root.
    pub fn new(board: Board, val: f64, node_budget: Option<usize>) -> GameTree {
        GameTree {
            nodes: vec![BfsNode::new(board, None, None, 1, val)],
            node_budget,
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &BfsNode {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn board(&self, id: NodeId) -> &Board {
        &self.nodes[id.index()].board
    }

    /// Adds one child per move below `id` and backpropagates the new
    /// information to the root.
    ///
    /// Either every move is added or none is. An empty move list is a no-op.
    ///
    /// # Errors
    /// * [`NInARowError::InvalidMove`] if a move is illegal on the node's board,
    ///   repeats a position, or the game at the node is over.
    /// * [`NInARowError::TreeExhausted`] if the node budget would be exceeded.
    pub fn expand(&mut self, id: NodeId, moves: &[Move]) -> Result<()> {
        if moves.is_empty() {
            return Ok(());
        }
        let node = &self.nodes[id.index()];
        if node.board.game_has_ended() {
            return Err(NInARowError::invalid_move(
                moves[0].position,
                "the game has already ended",
            ));
        }

        let mut boards = Vec::with_capacity(moves.len());
        for (i, mv) in moves.iter().enumerate() {
            let repeated = moves[..i].iter().any(|m| m.position == mv.position)
                || node
                    .children
                    .iter()
                    .any(|&c| self.nodes[c.index()].mv.map(|m| m.position) == Some(mv.position));
            if repeated {
                return Err(NInARowError::invalid_move(
                    mv.position,
                    "move already exists as a child of this node",
                ));
            }
            boards.push(node.board.with_move(mv)?);
        }

        let new_len = self.nodes.len() + moves.len();
        if let Some(budget) = self.node_budget
            && new_len - 1 > budget
        {
            return Err(NInARowError::TreeExhausted { budget });
        }
        if new_len > u32::MAX as usize {
            return Err(NInARowError::TreeExhausted {
                budget: u32::MAX as usize - 1,
            });
        }

        let (parent_val, sign, depth) = (
            node.val,
            if node.maximizing() { 1.0 } else { -1.0 },
            node.depth + 1,
        );
        for (mv, board) in moves.iter().zip(boards) {
            let child = NodeId(self.nodes.len() as u32);
            self.nodes.push(BfsNode::new(
                board,
                Some(id),
                Some(*mv),
                depth,
                parent_val + sign * mv.value,
            ));
            self.nodes[id.index()].children.push(child);
        }

        self.update_opt(id);
        self.update_pess(id);
        self.update_val(id);
        if self.nodes[id.index()].determined() {
            self.update_best_determined(id);
        }
        if let Some(parent) = self.nodes[id.index()].parent {
            self.backpropagate(parent, id);
        }
        Ok(())
    }

    fn update_opt(&mut self, id: NodeId) {
        let node = &self.nodes[id.index()];
        let maximizing = node.maximizing();
        let mut opt = node.worst_bound();
        for &c in &node.children {
            improve(maximizing, self.nodes[c.index()].opt, &mut opt);
        }
        self.nodes[id.index()].opt = opt;
    }

    fn update_pess(&mut self, id: NodeId) {
        let node = &self.nodes[id.index()];
        let maximizing = node.maximizing();
        let mut pess = node.worst_bound();
        for &c in &node.children {
            improve(maximizing, self.nodes[c.index()].pess, &mut pess);
        }
        self.nodes[id.index()].pess = pess;
    }

    /// Recomputes the value, preferring undetermined children for the best
    /// known child.
    fn update_val(&mut self, id: NodeId) {
        let node = &self.nodes[id.index()];
        let maximizing = node.maximizing();
        let mut val = if maximizing {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
        let mut best = node.best_known_child;
        for &c in &node.children {
            let child = &self.nodes[c.index()];
            if !child.determined() && improve(maximizing, child.val, &mut val) {
                best = Some(c);
            }
        }
        for &c in &node.children {
            let child = &self.nodes[c.index()];
            if child.determined() {
                improve(maximizing, child.val, &mut val);
            }
        }
        let node = &mut self.nodes[id.index()];
        node.val = val;
        node.best_known_child = best;
    }

    /// Points a determined node at the lowest-position child achieving its
    /// bound.
    fn update_best_determined(&mut self, id: NodeId) {
        let node = &self.nodes[id.index()];
        if !node.determined() {
            return;
        }
        let maximizing = node.maximizing();
        let best = node
            .children
            .iter()
            .copied()
            .filter(|&c| {
                let child = &self.nodes[c.index()];
                if maximizing {
                    child.pess == node.pess
                } else {
                    child.opt == node.opt
                }
            })
            .min_by_key(|&c| self.nodes[c.index()].mv.map_or(usize::MAX, |m| m.position));
        if best.is_some() {
            self.nodes[id.index()].best_known_child = best;
        }
    }

    fn backpropagate(&mut self, mut id: NodeId, mut child: NodeId) {
        loop {
            let c = &self.nodes[child.index()];
            let (c_opt, c_pess, c_val, c_determined) = (c.opt, c.pess, c.val, c.determined());
            let maximizing = self.nodes[id.index()].maximizing();

            if !improve(maximizing, c_opt, &mut self.nodes[id.index()].opt) {
                self.update_opt(id);
            }
            if !improve(maximizing, c_pess, &mut self.nodes[id.index()].pess) {
                self.update_pess(id);
            }
            if !c_determined && improve(maximizing, c_val, &mut self.nodes[id.index()].val) {
                self.nodes[id.index()].best_known_child = Some(child);
            } else {
                self.update_val(id);
                self.update_best_determined(id);
            }

            match self.nodes[id.index()].parent {
                Some(parent) => {
                    child = id;
                    id = parent;
                }
                None => break,
            }
        }
    }

    /// Follows best known children from `id` down to a leaf.
    pub fn select_from(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(next) = self.nodes[current.index()].best_known_child {
            current = next;
        }
        current
    }

    /// The leaf at the end of the principal variation.
    #[inline]
    pub fn select(&self) -> NodeId {
        self.select_from(self.root())
    }

    /// Best move at the root for the player to move there.
    pub fn best_move(&self) -> Result<Move> {
        self.best_move_at(self.root())
    }

    /// Best known move at `id`.
    ///
    /// A determined node answers with the child achieving its bound and the
    /// node's own value. Otherwise the child with the best value wins, ties
    /// broken by lowest position. Values are from player 1's point of view.
    ///
    /// # Errors
    /// [`NInARowError::NoLegalMoves`] if no best child is known.
    pub fn best_move_at(&self, id: NodeId) -> Result<Move> {
        let node = &self.nodes[id.index()];
        let best = node.best_known_child.ok_or(NInARowError::NoLegalMoves)?;
        let player = node.board.active_player();
        if node.determined() {
            let position = self.position_of(best);
            return Ok(Move::new(position, node.val, player));
        }

        let maximizing = node.maximizing();
        let mut val = if maximizing {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
        let mut best_position = self.position_of(node.children[0]);
        for &c in &node.children {
            let child = &self.nodes[c.index()];
            let position = self.position_of(c);
            if improve(maximizing, child.val, &mut val)
                || (child.val == val && position < best_position)
            {
                best_position = position;
            }
        }
        Ok(Move::new(best_position, val, player))
    }

    #[inline]
    fn position_of(&self, id: NodeId) -> usize {
        self.nodes[id.index()].mv.map_or(0, |m| m.position)
    }

    /// Total number of nodes, the root included.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    pub fn num_internal_nodes(&self) -> usize {
        self.node_count() - self.num_leaves()
    }

    /// Mean depth of the leaves.
    pub fn mean_depth(&self) -> f64 {
        let (sum, leaves) = self
            .nodes
            .iter()
            .filter(|n| n.is_leaf())
            .fold((0usize, 0usize), |(sum, count), n| (sum + n.depth, count + 1));
        sum as f64 / leaves as f64
    }

    /// Non-root nodes per internal node; zero for a lone root.
    pub fn average_branching_factor(&self) -> f64 {
        let internal = self.num_internal_nodes();
        if internal == 0 {
            return 0.0;
        }
        (self.node_count() - 1) as f64 / internal as f64
    }

    /// Number of moves between the root's best child and the end of the
    /// principal variation.
    pub fn depth_of_pv(&self) -> usize {
        let selected = self.select();
        if selected == self.root() {
            return 0;
        }
        self.nodes[selected.index()].depth - self.nodes[self.root().index()].depth - 1
    }

    /// Node ids in breadth-first order starting at the root.
    pub fn iter(&self) -> BreadthFirst<'_> {
        BreadthFirst {
            tree: self,
            queue: VecDeque::from([self.root()]),
        }
    }

    /// Text dump of the nodes down to `max_depth` levels below the root.
    pub fn format_nodes(&self, max_depth: usize) -> String {
        let mut out = String::new();
        for id in self.iter() {
            let node = self.node(id);
            if node.depth - 1 >= max_depth {
                break;
            }
            let (position, player) = node
                .mv
                .map_or((None, None), |m| (Some(m.position), Some(m.player)));
            let _ = writeln!(
                out,
                "{}position: {:?}, player: {:?}, depth: {}, value: {:.3}, opt: {}, pess: {}",
                "  ".repeat(node.depth - 1),
                position,
                player,
                node.depth,
                node.val,
                node.opt,
                node.pess
            );
        }
        out
    }
}

/// Breadth-first iterator over a [`GameTree`].
pub struct BreadthFirst<'a> {
    tree: &'a GameTree,
    queue: VecDeque<NodeId>,
}

impl Iterator for BreadthFirst<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.queue.pop_front()?;
        self.queue.extend(self.tree.node(id).children.iter().copied());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;

    fn p1(position: usize, value: f64) -> Move {
        Move::new(position, value, Player::Player1)
    }

    fn p2(position: usize, value: f64) -> Move {
        Move::new(position, value, Player::Player2)
    }

    #[test]
    fn test_create() {
        let g = Geometry::new(3, 3, 3).unwrap();
        let mut tree = GameTree::new(Board::new(&g), 0.0, None);
        assert_eq!(tree.num_leaves(), 1);
        assert!(!tree.node(tree.root()).determined());

        let err = tree.expand(tree.root(), &[p2(4, 0.0)]).unwrap_err();
        assert!(matches!(err, NInARowError::InvalidMove { position: 4, .. }));

        let moves: Vec<Move> = (0..9).map(|i| p1(i, 0.0)).collect();
        tree.expand(tree.root(), &moves).unwrap();

        assert!(tree.expand(tree.root(), &[p1(0, 0.0)]).is_err());
        assert!(tree.expand(tree.root(), &[p2(4, 0.0), p1(0, 0.0)]).is_err());

        assert_eq!(tree.num_leaves(), 9);
        assert!(!tree.node(tree.root()).determined());
        assert_eq!(tree.best_move().unwrap().position, 0);
    }

    #[test]
    fn test_duplicate_moves_in_one_expansion() {
        let g = Geometry::new(3, 3, 3).unwrap();
        let mut tree = GameTree::new(Board::new(&g), 0.0, None);
        assert!(tree.expand(tree.root(), &[p1(2, 0.0), p1(2, 1.0)]).is_err());
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_node_counting_functions() {
        let g = Geometry::new(3, 3, 3).unwrap();
        let mut tree = GameTree::new(Board::new(&g), 0.0, None);
        tree.expand(tree.root(), &[p1(0, 1.0), p1(1, 0.0), p1(2, -1.0)])
            .unwrap();
        assert_eq!(tree.num_leaves(), 3);

        let children = tree.node(tree.root()).children().to_vec();
        for child in children {
            tree.expand(child, &[p2(3, -3.0), p2(4, -2.0), p2(5, -1.0)])
                .unwrap();
            let grandchildren = tree.node(child).children().to_vec();
            for (i, &grandchild) in grandchildren.iter().enumerate() {
                let moves: Vec<Move> = (0..i).map(|j| p1(6 + j, 1.0)).collect();
                tree.expand(grandchild, &moves).unwrap();
            }
        }

        // 1 + 3 + 9 + 9 nodes; 3 leaves at depth 3 and 9 at depth 4.
        assert_eq!(tree.node_count(), 22);
        assert_eq!(tree.num_leaves(), 12);
        assert_eq!(tree.num_internal_nodes(), 10);
        assert_eq!(tree.mean_depth(), 3.75);
        assert_eq!(tree.average_branching_factor(), 2.1);
        assert_eq!(tree.depth_of_pv(), 2);
        assert_eq!(tree.iter().count(), 22);
    }

    #[test]
    fn test_best_move_in_solved_tree() {
        let g = Geometry::new(1, 3, 2).unwrap();
        let mut tree = GameTree::new(Board::new(&g), 0.0, None);
        let first = [p1(0, 0.0), p1(1, 1.0), p1(2, 0.0)];
        tree.expand(tree.root(), &first).unwrap();

        let children = tree.node(tree.root()).children().to_vec();
        for (i, &child) in children.iter().enumerate() {
            let second: Vec<Move> = (0..3)
                .filter(|&j| j != i)
                .map(|j| p2(j, if j == 1 { 0.0 } else { 1.0 }))
                .collect();
            tree.expand(child, &second).unwrap();

            let grandchildren = tree.node(child).children().to_vec();
            for grandchild in grandchildren {
                let taken = tree.node(grandchild).mv().unwrap().position;
                let last = p1(3 - (i + taken), if i == 1 { 1.0 } else { 0.0 });
                tree.expand(grandchild, &[last]).unwrap();
            }
        }

        assert!(tree.node(tree.root()).determined());
        for id in tree.iter() {
            let node = tree.node(id);
            match node.depth() {
                // Player 1 takes the middle to win.
                1 => assert_eq!(tree.best_move_at(id).unwrap().position, 1),
                // Player 2 blocks the middle if it is free, otherwise the lowest cell.
                2 => {
                    let expected = if node.mv().unwrap().position == 1 { 0 } else { 1 };
                    assert_eq!(tree.best_move_at(id).unwrap().position, expected);
                }
                3 => {
                    let parent = tree.node(node.parent().unwrap());
                    let expected =
                        3 - (node.mv().unwrap().position + parent.mv().unwrap().position);
                    assert_eq!(tree.best_move_at(id).unwrap().position, expected);
                }
                4 => assert!(matches!(
                    tree.best_move_at(id),
                    Err(NInARowError::NoLegalMoves)
                )),
                depth => panic!("unexpected depth {depth}"),
            }
        }
        // Player 1 wins on the third move: 5 - 4 = 1.
        assert_eq!(tree.node(tree.root()).pess(), 1);
    }

    #[test]
    fn test_terminal_bounds() {
        let g = Geometry::new(3, 3, 3).unwrap();
        let board = Board::from_cells(&g, "oo. xx. ...").unwrap();
        let mut tree = GameTree::new(board, 0.0, None);
        tree.expand(tree.root(), &[p1(2, 0.5), p1(6, 0.0)]).unwrap();

        let win = tree.node(tree.root()).children()[0];
        assert!(tree.node(win).determined());
        assert_eq!(tree.node(win).pess(), 11 - 2);
        assert_eq!(tree.node(win).val(), f64::INFINITY);

        // A proven win for the side to move settles the root.
        assert!(tree.node(tree.root()).determined());
        assert_eq!(tree.best_move().unwrap().position, 2);
        assert!(tree.expand(win, &[p2(5, 0.0)]).is_err());
    }

    #[test]
    fn test_node_budget_is_atomic() {
        let g = Geometry::new(3, 3, 3).unwrap();
        let mut tree = GameTree::new(Board::new(&g), 0.0, Some(4));
        let moves: Vec<Move> = (0..5).map(|i| p1(i, 0.0)).collect();
        assert!(matches!(
            tree.expand(tree.root(), &moves),
            Err(NInARowError::TreeExhausted { budget: 4 })
        ));
        assert_eq!(tree.node_count(), 1);
        tree.expand(tree.root(), &moves[..4]).unwrap();
        assert_eq!(tree.node_count(), 5);
    }

    #[test]
    fn test_child_values_follow_the_mover() {
        let g = Geometry::new(3, 3, 3).unwrap();
        let mut tree = GameTree::new(Board::new(&g), 0.5, None);
        tree.expand(tree.root(), &[p1(4, 2.0)]).unwrap();
        let child = tree.node(tree.root()).children()[0];
        assert_eq!(tree.node(child).val(), 2.5);
        tree.expand(child, &[p2(0, 1.0)]).unwrap();
        let grandchild = tree.node(child).children()[0];
        assert_eq!(tree.node(grandchild).val(), 1.5);
        assert_eq!(tree.select(), grandchild);
        assert_eq!(tree.depth_of_pv(), 1);
    }
}
