//! Rules oracle backed by shakmaty.
//!
//! Pure, stateless legality checks used for local pre-validation and
//! destination highlighting. The oracle is never the source of truth: an
//! authoritative position arriving from the server is adopted wholesale even
//! if the oracle disagrees with it (which only happens on a variant or rule
//! mismatch bug, and is logged rather than fought).

use shakmaty::{
    CastlingMode, Chess, EnPassantMode, Move, Position as _, Square, fen::Fen, san::San,
    uci::UciMove,
};
use tempo_proto::{Color, Promotion, WirePosition};

use crate::error::OracleError;

/// A complete board configuration plus the monotone move index.
///
/// Treated as an immutable value: every accepted transition replaces the
/// session's position wholesale rather than mutating it in place, so there is
/// never a question of which handler mutated last.
#[derive(Debug, Clone)]
pub struct Position {
    chess: Chess,
    move_index: u64,
}

impl Position {
    /// The standard starting position, move index zero.
    #[must_use]
    pub fn initial() -> Self {
        Self { chess: Chess::default(), move_index: 0 }
    }

    /// Parse a wire position.
    pub fn from_wire(wire: &WirePosition) -> Result<Self, OracleError> {
        let fen: Fen =
            wire.fen.parse().map_err(|e| OracleError::InvalidFen(format!("{e}")))?;
        let chess: Chess = fen
            .into_position(CastlingMode::Standard)
            .map_err(|e| OracleError::InvalidFen(format!("{e}")))?;
        Ok(Self { chess, move_index: wire.move_index })
    }

    /// Serialize back to the wire representation.
    #[must_use]
    pub fn to_wire(&self) -> WirePosition {
        WirePosition { fen: self.fen(), move_index: self.move_index }
    }

    /// Board configuration in FEN notation.
    #[must_use]
    pub fn fen(&self) -> String {
        Fen::from_position(self.chess.clone(), EnPassantMode::Legal).to_string()
    }

    /// Number of moves applied to reach this position.
    #[must_use]
    pub fn move_index(&self) -> u64 {
        self.move_index
    }

    /// Whose turn it is.
    #[must_use]
    pub fn side_to_move(&self) -> Color {
        color_to_wire(self.chess.turn())
    }

    /// Whether the side to move is in check.
    #[must_use]
    pub fn is_check(&self) -> bool {
        self.chess.is_check()
    }

    /// Legal destination squares for the piece on `from`.
    ///
    /// Pure and deterministic. Empty if the square holds no piece or the
    /// piece's color is not the side to move. Castling is reported as the
    /// king's destination square.
    #[must_use]
    pub fn legal_destinations(&self, from: Square) -> Vec<Square> {
        let color = self.chess.turn();
        self.chess
            .legal_moves()
            .iter()
            .filter(|m| m.from() == Some(from))
            .map(|m| match m.castling_side() {
                Some(side) => side.king_to(color),
                None => m.to(),
            })
            .collect()
    }

    /// Validate and apply a move, producing the successor position.
    ///
    /// Fails with [`OracleError::IllegalMove`] if the move is not legal. Used
    /// only to block a local intent before it is sent; it never invalidates a
    /// position that arrived from the server.
    pub fn apply_move(&self, request: &MoveRequest) -> Result<AppliedMove, OracleError> {
        let m = self.resolve(request)?;
        let san = San::from_move(&self.chess, &m);

        let chess = self
            .chess
            .clone()
            .play(&m)
            .map_err(|_| OracleError::IllegalMove(request.uci()))?;

        Ok(AppliedMove {
            position: Position { chess, move_index: self.move_index + 1 },
            san: san.to_string(),
        })
    }

    /// Resolve a move request against this position via its UCI form.
    ///
    /// Going through UCI lets shakmaty handle castling and promotion
    /// disambiguation.
    fn resolve(&self, request: &MoveRequest) -> Result<Move, OracleError> {
        let uci: UciMove = request
            .uci()
            .parse()
            .map_err(|_| OracleError::IllegalMove(request.uci()))?;

        let m = uci.to_move(&self.chess).map_err(|_| OracleError::IllegalMove(request.uci()))?;

        if !self.chess.is_legal(&m) {
            return Err(OracleError::IllegalMove(request.uci()));
        }

        Ok(m)
    }
}

/// A move as requested by the local player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRequest {
    /// Origin square.
    pub from: Square,
    /// Destination square.
    pub to: Square,
    /// Promotion piece, if the move promotes.
    pub promotion: Option<Promotion>,
}

impl MoveRequest {
    /// Parse a move request from square names.
    pub fn parse(
        from: &str,
        to: &str,
        promotion: Option<Promotion>,
    ) -> Result<Self, OracleError> {
        let from: Square =
            from.parse().map_err(|_| OracleError::InvalidSquare(from.to_string()))?;
        let to: Square = to.parse().map_err(|_| OracleError::InvalidSquare(to.to_string()))?;
        Ok(Self { from, to, promotion })
    }

    /// UCI notation for this request, e.g. `"e7e8q"`.
    #[must_use]
    pub fn uci(&self) -> String {
        match self.promotion {
            Some(p) => format!("{}{}{}", self.from, self.to, p.uci_char()),
            None => format!("{}{}", self.from, self.to),
        }
    }
}

/// Result of a successful [`Position::apply_move`].
#[derive(Debug, Clone)]
pub struct AppliedMove {
    /// The successor position, move index incremented by one.
    pub position: Position,
    /// The applied move in standard algebraic notation.
    pub san: String,
}

fn color_to_wire(color: shakmaty::Color) -> Color {
    match color {
        shakmaty::Color::White => Color::White,
        shakmaty::Color::Black => Color::Black,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(from: &str, to: &str) -> MoveRequest {
        MoveRequest::parse(from, to, None).unwrap()
    }

    #[test]
    fn initial_position() {
        let pos = Position::initial();
        assert_eq!(pos.move_index(), 0);
        assert_eq!(pos.side_to_move(), Color::White);
        assert!(!pos.is_check());
    }

    #[test]
    fn wire_roundtrip() {
        let wire = WirePosition {
            fen: "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1".into(),
            move_index: 1,
        };
        let pos = Position::from_wire(&wire).unwrap();
        assert_eq!(pos.side_to_move(), Color::Black);
        assert_eq!(pos.move_index(), 1);

        let back = Position::from_wire(&pos.to_wire()).unwrap();
        assert_eq!(back.side_to_move(), pos.side_to_move());
    }

    #[test]
    fn invalid_fen_rejected() {
        let wire = WirePosition { fen: "not a fen".into(), move_index: 0 };
        assert!(matches!(Position::from_wire(&wire), Err(OracleError::InvalidFen(_))));
    }

    #[test]
    fn legal_destinations_from_start() {
        let pos = Position::initial();
        let e2 = "e2".parse::<Square>().unwrap();
        let mut dests = pos.legal_destinations(e2);
        dests.sort();

        let expected: Vec<Square> =
            vec!["e3".parse::<Square>().unwrap(), "e4".parse::<Square>().unwrap()];
        assert_eq!(dests, expected);
    }

    #[test]
    fn legal_destinations_empty_square() {
        let pos = Position::initial();
        let e4 = "e4".parse::<Square>().unwrap();
        assert!(pos.legal_destinations(e4).is_empty());
    }

    #[test]
    fn legal_destinations_wrong_color() {
        let pos = Position::initial();
        // Black pawn while white is to move.
        let e7 = "e7".parse::<Square>().unwrap();
        assert!(pos.legal_destinations(e7).is_empty());
    }

    #[test]
    fn apply_move_advances_index() {
        let pos = Position::initial();
        let applied = pos.apply_move(&mv("e2", "e4")).unwrap();

        assert_eq!(applied.san, "e4");
        assert_eq!(applied.position.move_index(), 1);
        assert_eq!(applied.position.side_to_move(), Color::Black);
        // Original position untouched.
        assert_eq!(pos.move_index(), 0);
        assert_eq!(pos.side_to_move(), Color::White);
    }

    #[test]
    fn apply_illegal_move_rejected() {
        let pos = Position::initial();
        // Pawns cannot advance three squares.
        let result = pos.apply_move(&mv("e2", "e5"));
        assert!(matches!(result, Err(OracleError::IllegalMove(_))));
    }

    #[test]
    fn apply_opponent_piece_rejected() {
        let pos = Position::initial();
        let result = pos.apply_move(&mv("e7", "e5"));
        assert!(matches!(result, Err(OracleError::IllegalMove(_))));
    }

    #[test]
    fn promotion_requires_piece() {
        let wire = WirePosition { fen: "8/P7/8/8/8/8/8/4K2k w - - 0 1".into(), move_index: 10 };
        let pos = Position::from_wire(&wire).unwrap();

        let req = MoveRequest::parse("a7", "a8", Some(Promotion::Queen)).unwrap();
        let applied = pos.apply_move(&req).unwrap();
        assert_eq!(applied.san, "a8=Q");
        assert_eq!(applied.position.move_index(), 11);

        // Reaching the last rank without naming a piece is not a legal move.
        let bare = pos.apply_move(&mv("a7", "a8"));
        assert!(matches!(bare, Err(OracleError::IllegalMove(_))));
    }

    #[test]
    fn castling_reported_as_king_destination() {
        let wire = WirePosition {
            fen: "r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1".into(),
            move_index: 0,
        };
        let pos = Position::from_wire(&wire).unwrap();
        let e1 = "e1".parse::<Square>().unwrap();
        let dests = pos.legal_destinations(e1);

        let g1 = "g1".parse::<Square>().unwrap();
        let c1 = "c1".parse::<Square>().unwrap();
        assert!(dests.contains(&g1));
        assert!(dests.contains(&c1));

        let castled = pos.apply_move(&mv("e1", "g1")).unwrap();
        assert_eq!(castled.san, "O-O");
    }

    #[test]
    fn invalid_square_rejected() {
        assert!(matches!(
            MoveRequest::parse("z9", "e4", None),
            Err(OracleError::InvalidSquare(_))
        ));
    }
}
