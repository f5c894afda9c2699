//! Board and Tiles
//!
//! Fixed 7x6 grid stored row-major. Each tile holds at most one piece.
//! Lookups take untrusted positions and return `None` off the board.

use serde::{Serialize, Deserialize};

use crate::core::position::{Position, BOARD_WIDTH, BOARD_HEIGHT};
use crate::game::piece::{Piece, PieceId};
use crate::game::state::PlayerId;

/// Total number of tiles.
pub const TILE_COUNT: usize = (BOARD_WIDTH * BOARD_HEIGHT) as usize;

/// A board square. Its position never changes; its occupant does.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// Fixed coordinate
    pub position: Position,
    /// Current occupant
    pub piece: Option<Piece>,
}

impl Tile {
    /// Create an empty tile.
    pub fn new(position: Position) -> Self {
        Self { position, piece: None }
    }

    /// Check if a piece stands here.
    #[inline]
    pub fn is_occupied(&self) -> bool {
        self.piece.is_some()
    }
}

/// The game board.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    tiles: Vec<Tile>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Create an empty board.
    pub fn new() -> Self {
        Self {
            tiles: Position::all().map(Tile::new).collect(),
        }
    }

    /// Get a tile.
    pub fn tile(&self, pos: Position) -> Option<&Tile> {
        if !pos.is_in_bounds() {
            return None;
        }
        self.tiles.get(pos.index())
    }

    fn tile_mut(&mut self, pos: Position) -> Option<&mut Tile> {
        if !pos.is_in_bounds() {
            return None;
        }
        self.tiles.get_mut(pos.index())
    }

    /// Get the piece at a position.
    pub fn piece_at(&self, pos: Position) -> Option<&Piece> {
        self.tile(pos).and_then(|t| t.piece.as_ref())
    }

    /// Get the piece at a position mutably.
    pub fn piece_at_mut(&mut self, pos: Position) -> Option<&mut Piece> {
        self.tile_mut(pos).and_then(|t| t.piece.as_mut())
    }

    /// Remove and return the piece at a position.
    pub fn take(&mut self, pos: Position) -> Option<Piece> {
        self.tile_mut(pos).and_then(|t| t.piece.take())
    }

    /// Put a piece on a tile, returning whatever stood there.
    ///
    /// Off-board positions hand the piece straight back.
    pub fn place(&mut self, pos: Position, piece: Piece) -> Option<Piece> {
        match self.tile_mut(pos) {
            Some(tile) => tile.piece.replace(piece),
            None => Some(piece),
        }
    }

    /// Move the piece at `from` onto `to`, discarding any occupant of `to`.
    ///
    /// Returns false (and changes nothing) if `from` is empty.
    pub fn relocate(&mut self, from: Position, to: Position) -> bool {
        if !to.is_in_bounds() {
            return false;
        }
        match self.take(from) {
            Some(piece) => {
                self.place(to, piece);
                true
            }
            None => false,
        }
    }

    /// All tiles in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// All occupied positions with their pieces.
    pub fn pieces(&self) -> impl Iterator<Item = (Position, &Piece)> {
        self.tiles
            .iter()
            .filter_map(|t| t.piece.as_ref().map(|p| (t.position, p)))
    }

    /// Pieces owned by a player.
    pub fn pieces_of(&self, player: PlayerId) -> impl Iterator<Item = (Position, &Piece)> {
        self.pieces().filter(move |(_, p)| p.owner == player)
    }

    /// Locate a piece by id.
    pub fn find_piece(&self, id: PieceId) -> Option<Position> {
        self.pieces().find(|(_, p)| p.id == id).map(|(pos, _)| pos)
    }

    /// Count occupied tiles.
    pub fn piece_count(&self) -> usize {
        self.pieces().count()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> PlayerId {
        PlayerId::new([1; 16])
    }

    #[test]
    fn test_new_board_is_empty() {
        let board = Board::new();
        assert_eq!(board.tiles().count(), TILE_COUNT);
        assert_eq!(board.piece_count(), 0);
        for tile in board.tiles() {
            assert!(tile.position.is_in_bounds());
        }
    }

    #[test]
    fn test_off_board_lookups() {
        let mut board = Board::new();
        assert!(board.tile(Position::new(-1, 0)).is_none());
        assert!(board.piece_at(Position::new(7, 0)).is_none());
        assert!(board.take(Position::new(0, 6)).is_none());

        let bounced = board.place(Position::new(9, 9), Piece::new(0, owner()));
        assert_eq!(bounced.map(|p| p.id), Some(0));
        assert_eq!(board.piece_count(), 0);
    }

    #[test]
    fn test_place_and_take() {
        let mut board = Board::new();
        let pos = Position::new(2, 3);

        assert!(board.place(pos, Piece::new(5, owner())).is_none());
        assert_eq!(board.piece_at(pos).map(|p| p.id), Some(5));
        assert_eq!(board.find_piece(5), Some(pos));

        let taken = board.take(pos);
        assert_eq!(taken.map(|p| p.id), Some(5));
        assert!(!board.tile(pos).unwrap().is_occupied());
    }

    #[test]
    fn test_relocate() {
        let mut board = Board::new();
        let from = Position::new(0, 0);
        let to = Position::new(0, 1);
        board.place(from, Piece::new(1, owner()));

        assert!(board.relocate(from, to));
        assert!(board.piece_at(from).is_none());
        assert_eq!(board.piece_at(to).map(|p| p.id), Some(1));

        // Empty origin is a no-op
        assert!(!board.relocate(from, to));
        assert_eq!(board.piece_at(to).map(|p| p.id), Some(1));
    }

    #[test]
    fn test_pieces_of_filters_owner() {
        let mut board = Board::new();
        let other = PlayerId::new([2; 16]);
        board.place(Position::new(0, 0), Piece::new(0, owner()));
        board.place(Position::new(1, 0), Piece::new(1, other));
        board.place(Position::new(2, 0), Piece::new(2, owner()));

        let mine: Vec<_> = board.pieces_of(owner()).map(|(_, p)| p.id).collect();
        assert_eq!(mine, vec![0, 2]);
    }
}
