//! The default feature registry.
//!
//! Features are grouped so that one set of weights applies to every instance of
//! a motif in a given direction. The group order is fixed and matches the
//! layout of the heuristic parameter vector:
//!
//! | group | direction     | kind               |
//! |-------|---------------|--------------------|
//! | 0-3   | horizontal    | kinds 0-3          |
//! | 4-7   | vertical      | kinds 0-3          |
//! | 8-11  | diagonal      | kinds 0-3          |
//! | 12-15 | anti-diagonal | kinds 0-3          |
//!
//! with kinds `connected_two`, `unconnected_two`, `open_n_minus_one` and
//! `n_in_a_row`. Every feature lives inside one window of `win_length` cells:
//! its pieces are the cells the motif needs and the remaining window cells are
//! spaces that must all be empty.
//!
//! Kinds that would need fewer than two pieces, or that would repeat a lower
//! kind for short win lengths, are left empty but keep their group slot.

use crate::error::Result;
use crate::feature::HeuristicFeature;
use crate::geometry::{Direction, Geometry};
use crate::pattern::Pattern;

/// Number of feature kinds in each direction.
pub const KINDS_PER_DIRECTION: usize = 4;

/// Number of groups in the default registry.
pub const DEFAULT_GROUP_COUNT: usize = KINDS_PER_DIRECTION * Direction::ALL.len();

/// Motifs of the default registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    /// Two adjacent pieces, rest of the window empty.
    ConnectedTwo = 0,
    /// Two pieces with a gap between them, rest of the window empty.
    UnconnectedTwo = 1,
    /// All but one cell of the window held, the last one empty.
    OpenNMinusOne = 2,
    /// The whole window held.
    NInARow = 3,
}

impl FeatureKind {
    pub const ALL: [FeatureKind; KINDS_PER_DIRECTION] = [
        FeatureKind::ConnectedTwo,
        FeatureKind::UnconnectedTwo,
        FeatureKind::OpenNMinusOne,
        FeatureKind::NInARow,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            FeatureKind::ConnectedTwo => "connected_two",
            FeatureKind::UnconnectedTwo => "unconnected_two",
            FeatureKind::OpenNMinusOne => "open_n_minus_one",
            FeatureKind::NInARow => "n_in_a_row",
        }
    }

    /// Offsets within a window of `n` cells that hold the motif's pieces.
    fn piece_offsets(self, n: usize) -> Vec<Vec<usize>> {
        match self {
            FeatureKind::ConnectedTwo if n >= 3 => (0..n - 1).map(|i| vec![i, i + 1]).collect(),
            FeatureKind::UnconnectedTwo if n >= 3 => (0..n)
                .flat_map(|i| (i + 2..n).map(move |j| vec![i, j]))
                .collect(),
            FeatureKind::OpenNMinusOne if n >= 4 => (0..n)
                .map(|gap| (0..n).filter(|&i| i != gap).collect())
                .collect(),
            FeatureKind::NInARow => vec![(0..n).collect()],
            _ => Vec::new(),
        }
    }
}

/// Index of the group holding `kind` features in `direction`.
#[inline]
pub const fn group_index(direction: Direction, kind: FeatureKind) -> usize {
    direction.index() * KINDS_PER_DIRECTION + kind.index()
}

/// Name of a default group, e.g. `vertical/connected_two`.
pub fn group_name(group: usize) -> Option<String> {
    let direction = Direction::ALL.get(group / KINDS_PER_DIRECTION)?;
    let kind = FeatureKind::ALL.get(group % KINDS_PER_DIRECTION)?;
    let direction = match direction {
        Direction::Horizontal => "horizontal",
        Direction::Vertical => "vertical",
        Direction::Diagonal => "diagonal",
        Direction::AntiDiagonal => "anti_diagonal",
    };
    Some(format!("{direction}/{}", kind.name()))
}

/// Builds the default registry for `geometry`, one feature list per group.
pub fn default_feature_groups(geometry: &Geometry) -> Result<Vec<Vec<HeuristicFeature>>> {
    let n = geometry.win_length();
    let mut groups = vec![Vec::new(); DEFAULT_GROUP_COUNT];
    for direction in Direction::ALL {
        let shift = geometry.shift(direction);
        for kind in FeatureKind::ALL {
            let offsets = kind.piece_offsets(n);
            let group = &mut groups[group_index(direction, kind)];
            for start in geometry.line_starts(direction) {
                let window = Pattern::from_positions((0..n).map(|i| start + i * shift));
                for piece_offsets in &offsets {
                    let pieces =
                        Pattern::from_positions(piece_offsets.iter().map(|i| start + i * shift));
                    let spaces = window.difference(pieces);
                    group.push(HeuristicFeature::new(pieces, spaces, spaces.len())?);
                }
            }
        }
    }
    Ok(groups)
}
