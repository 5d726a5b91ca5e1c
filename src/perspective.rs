use crate::outcome::{self, Outcome};
use crate::types::PlayerSide;

/// The player whose point of view the `my_*` / `opp_*` fields take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    username: String,
}

impl Viewer {
    pub fn new(username: impl AsRef<str>) -> Self {
        Self {
            username: username.as_ref().trim().to_lowercase(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Case-insensitive match; an empty name on either side never matches.
    pub fn is(&self, username: Option<&str>) -> bool {
        match username {
            Some(name) if !name.is_empty() && !self.username.is_empty() => {
                name.to_lowercase() == self.username
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Black => "black",
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }
}

/// One side of the board seen from the viewer, with every value already rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SideView {
    pub color: String,
    pub username: String,
    pub uuid: String,
    pub id: String,
    pub rating: String,
    pub result: String,
    pub outcome: String,
    pub score: String,
    pub expected_score: String,
}

impl SideView {
    fn project(color: Color, side: &PlayerSide, expected: Option<f64>) -> Self {
        let outcome = side.result.as_deref().and_then(outcome::classify);
        Self {
            color: color.as_str().to_string(),
            username: side.username.clone().unwrap_or_default(),
            uuid: side.uuid.clone().unwrap_or_default(),
            id: side.id.clone().unwrap_or_default(),
            rating: side.rating.map(|r| r.to_string()).unwrap_or_default(),
            result: side.result.clone().unwrap_or_default(),
            outcome: outcome.map(Outcome::as_str).unwrap_or("").to_string(),
            score: outcome.map(Outcome::score).unwrap_or("").to_string(),
            expected_score: expected.map(|e| format!("{e:.4}")).unwrap_or_default(),
        }
    }
}

/// Values of one side regardless of the viewer. The expected score is left empty.
pub fn describe(color: Color, side: &PlayerSide) -> SideView {
    SideView::project(color, side, None)
}

/// `my` and `opp` projections. Both are empty when the viewer played neither side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Perspective {
    pub viewer_color: Option<Color>,
    pub my: SideView,
    pub opp: SideView,
}

/// Elo expectation of scoring against `opponent_rating`.
pub fn expected_score(my_rating: i64, opponent_rating: i64) -> f64 {
    let diff = opponent_rating as f64 - my_rating as f64;
    1.0 / (1.0 + 10f64.powf(diff / 400.0))
}

/// Which side, if either, the viewer played. White is checked first.
pub fn viewer_color(viewer: &Viewer, white: &PlayerSide, black: &PlayerSide) -> Option<Color> {
    if viewer.is(white.username.as_deref()) {
        Some(Color::White)
    } else if viewer.is(black.username.as_deref()) {
        Some(Color::Black)
    } else {
        None
    }
}

pub fn assign(viewer: &Viewer, white: &PlayerSide, black: &PlayerSide) -> Perspective {
    let Some(color) = viewer_color(viewer, white, black) else {
        return Perspective::default();
    };

    let (mine, theirs) = match color {
        Color::White => (white, black),
        Color::Black => (black, white),
    };

    let (my_expected, opp_expected) = match (mine.rating, theirs.rating) {
        (Some(my_rating), Some(opp_rating)) => (
            Some(expected_score(my_rating, opp_rating)),
            Some(expected_score(opp_rating, my_rating)),
        ),
        _ => (None, None),
    };

    Perspective {
        viewer_color: Some(color),
        my: SideView::project(color, mine, my_expected),
        opp: SideView::project(color.opposite(), theirs, opp_expected),
    }
}
