//! Mainline SAN tokens and `[%clk]` annotations of a game's move text.
//!
//! Moves are collected as text; positions are never replayed.

use pgn_reader::{Nag, RawComment, Reader, SanPlus, Skip, Visitor};
use regex::Regex;
use smallvec::SmallVec;
use std::fmt::Write;
use std::io;
use std::ops::ControlFlow;
use std::sync::LazyLock;

use crate::error::ErrorAccumulator;

static CLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[%clk\s+([0-9:.]+)\]").expect("valid clock regex"));

#[derive(Debug, Clone, Default)]
struct Ply {
    san: String,
    clock: Option<String>,
}

type PlyList = SmallVec<[Ply; 128]>;

/// Move-derived fields. Each is `""` when it cannot be computed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveAnnotations {
    pub san_moves: String,
    pub clock_times: String,
    pub time_spent: String,
    pub move_count: String,
}

#[derive(Default)]
struct PlyVisitor {
    plies: PlyList,
    /// Leading pieces of a comment too long for the reader buffer.
    pending_comment: Vec<u8>,
}

impl Visitor for PlyVisitor {
    type Tags = ();
    type Movetext = ();
    type Output = ();

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        self.plies.clear();
        self.pending_comment.clear();
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, _tags: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        ControlFlow::Continue(())
    }

    fn san(
        &mut self,
        _movetext: &mut Self::Movetext,
        san_plus: SanPlus,
    ) -> ControlFlow<Self::Output> {
        self.plies.push(Ply {
            san: san_plus.to_string(),
            clock: None,
        });
        ControlFlow::Continue(())
    }

    fn nag(&mut self, _movetext: &mut Self::Movetext, _nag: Nag) -> ControlFlow<Self::Output> {
        ControlFlow::Continue(())
    }

    fn partial_comment(
        &mut self,
        _movetext: &mut Self::Movetext,
        comment: RawComment<'_>,
    ) -> ControlFlow<Self::Output> {
        self.pending_comment.extend_from_slice(comment.as_bytes());
        ControlFlow::Continue(())
    }

    fn comment(
        &mut self,
        _movetext: &mut Self::Movetext,
        comment: RawComment<'_>,
    ) -> ControlFlow<Self::Output> {
        let mut bytes = std::mem::take(&mut self.pending_comment);
        bytes.extend_from_slice(comment.as_bytes());
        let text = String::from_utf8_lossy(&bytes);
        if let Some(ply) = self.plies.last_mut()
            && ply.clock.is_none()
            && let Some(caps) = CLOCK.captures(&text)
        {
            ply.clock = Some(caps[1].to_string());
        }
        ControlFlow::Continue(())
    }

    fn begin_variation(
        &mut self,
        _movetext: &mut Self::Movetext,
    ) -> ControlFlow<Self::Output, Skip> {
        ControlFlow::Continue(Skip(true))
    }

    fn end_game(&mut self, _movetext: Self::Movetext) -> Self::Output {}
}

/// Reads `pgn` and derives the move fields.
///
/// `base`/`increment` are the decomposed time-control seconds; `time_spent` needs both.
pub fn annotate(
    pgn: &str,
    base: &str,
    increment: &str,
    notes: &mut ErrorAccumulator,
) -> MoveAnnotations {
    if pgn.trim().is_empty() {
        return MoveAnnotations::default();
    }

    let mut reader = Reader::new(io::Cursor::new(pgn.as_bytes()));
    let mut visitor = PlyVisitor::default();
    match reader.read_game(&mut visitor) {
        Ok(Some(())) => {}
        Ok(None) => return MoveAnnotations::default(),
        Err(e) => {
            notes.push(&format!("Parser-stage error: stage=moves; error={e}"));
            return MoveAnnotations::default();
        }
    }

    let plies = &visitor.plies;
    if plies.is_empty() {
        return MoveAnnotations::default();
    }

    MoveAnnotations {
        san_moves: join(plies.iter().map(|p| p.san.as_str())),
        clock_times: clock_times(plies),
        time_spent: time_spent(plies, base, increment).unwrap_or_default(),
        move_count: plies.len().div_ceil(2).to_string(),
    }
}

fn join<'a>(items: impl Iterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for item in items {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(item);
    }
    out
}

fn clock_times(plies: &[Ply]) -> String {
    if plies.iter().all(|p| p.clock.is_none()) {
        return String::new();
    }
    join(plies.iter().map(|p| p.clock.as_deref().unwrap_or("-")))
}

fn time_spent(plies: &[Ply], base: &str, increment: &str) -> Option<String> {
    let base = base.parse::<f64>().ok()?;
    let increment = increment.parse::<f64>().ok()?;
    let clocks = plies
        .iter()
        .map(|p| p.clock.as_deref().and_then(clock_seconds))
        .collect::<Option<Vec<f64>>>()?;

    let mut out = String::new();
    let mut previous = [base, base];
    for (idx, clock) in clocks.iter().enumerate() {
        let side = idx % 2;
        let spent = (previous[side] - clock + increment).max(0.0);
        previous[side] = *clock;
        if !out.is_empty() {
            out.push(' ');
        }
        let _ = write!(out, "{spent:.1}");
    }
    Some(out)
}

/// `H:MM:SS(.f)`, `MM:SS(.f)` or plain seconds.
fn clock_seconds(raw: &str) -> Option<f64> {
    raw.split(':')
        .try_fold(0.0, |acc, part| part.parse::<f64>().ok().map(|v| acc * 60.0 + v))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLITZ_PGN: &str = "[Event \"Live Chess\"]\n\
[TimeControl \"180+2\"]\n\
\n\
1. e4 {[%clk 0:03:01.5]} 1... e5 {[%clk 0:03:00.2]} 2. Qh5 {[%clk 0:02:58]} 2... Nc6 {[%clk 0:02:59.2]} 3. Bc4 {[%clk 0:02:55]} 3... Nf6 {[%clk 0:02:40]} 4. Qxf7# {[%clk 0:02:54]} 1-0\n";

    fn annotate_plain(pgn: &str, base: &str, inc: &str) -> MoveAnnotations {
        annotate(pgn, base, inc, &mut ErrorAccumulator::default())
    }

    #[test]
    fn test_annotate_collects_san_and_clocks() {
        let moves = annotate_plain(BLITZ_PGN, "180", "2");
        assert_eq!(moves.san_moves, "e4 e5 Qh5 Nc6 Bc4 Nf6 Qxf7#");
        assert_eq!(
            moves.clock_times,
            "0:03:01.5 0:03:00.2 0:02:58 0:02:59.2 0:02:55 0:02:40 0:02:54"
        );
        assert_eq!(moves.move_count, "4");
    }

    #[test]
    fn test_time_spent_accounts_for_increment() {
        let moves = annotate_plain(BLITZ_PGN, "180", "2");
        assert_eq!(moves.time_spent, "0.5 1.8 5.5 3.0 5.0 21.2 3.0");
    }

    #[test]
    fn test_time_spent_needs_live_time_control() {
        let moves = annotate_plain(BLITZ_PGN, "", "");
        assert_eq!(moves.time_spent, "");
        assert_eq!(moves.san_moves, "e4 e5 Qh5 Nc6 Bc4 Nf6 Qxf7#");
    }

    #[test]
    fn test_missing_clock_marks_ply_and_drops_time_spent() {
        let pgn = "[Event \"x\"]\n\n1. d4 {[%clk 0:01:00]} 1... d5 2. c4 {[%clk 0:00:58]} *\n";
        let moves = annotate_plain(pgn, "60", "0");
        assert_eq!(moves.clock_times, "0:01:00 - 0:00:58");
        assert_eq!(moves.time_spent, "");
        assert_eq!(moves.move_count, "2");
    }

    #[test]
    fn test_no_clocks_at_all() {
        let moves = annotate_plain("[Event \"x\"]\n\n1. e4 e5 2. Nf3 *\n", "600", "0");
        assert_eq!(moves.clock_times, "");
        assert_eq!(moves.san_moves, "e4 e5 Nf3");
    }

    #[test]
    fn test_clock_in_oversized_comment() {
        let padding = "x".repeat(40_000);
        let pgn = format!(
            "[Event \"x\"]\n\n1. e4 {{{padding} [%clk 0:01:00] {padding}}} 1... e5 {{[%clk 0:00:59]}} *\n"
        );
        let moves = annotate_plain(&pgn, "60", "0");
        assert_eq!(moves.san_moves, "e4 e5");
        assert_eq!(moves.clock_times, "0:01:00 0:00:59");
        assert_eq!(moves.time_spent, "0.0 1.0");
    }

    #[test]
    fn test_variations_are_skipped() {
        let moves = annotate_plain("1. e4 (1. d4 d5) 1... e5 *", "", "");
        assert_eq!(moves.san_moves, "e4 e5");
    }

    #[test]
    fn test_empty_pgn() {
        assert_eq!(annotate_plain("", "60", "0"), MoveAnnotations::default());
        assert_eq!(
            annotate_plain("[Event \"x\"]\n\n*\n", "60", "0"),
            MoveAnnotations::default()
        );
    }

    #[test]
    fn test_clock_seconds_formats() {
        assert!((clock_seconds("0:02:59.9").unwrap() - 179.9).abs() < 1e-9);
        assert_eq!(clock_seconds("1:00"), Some(60.0));
        assert_eq!(clock_seconds("42"), Some(42.0));
        assert_eq!(clock_seconds("1:xx"), None);
    }
}
