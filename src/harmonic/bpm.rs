//! Genre-aware tempo compatibility

/// Tolerance used when neither track carries genre data (BPM)
pub const DEFAULT_TOLERANCE: f64 = 3.0;

/// Genre keyword → tolerated BPM difference. First match wins, so more
/// specific keywords come first.
const GENRE_TOLERANCES: &[(&str, f64)] = &[
    ("hip-hop", 8.0),
    ("hip hop", 8.0),
    ("hiphop", 8.0),
    ("rap", 8.0),
    ("r&b", 6.0),
    ("drum and bass", 2.0),
    ("drum & bass", 2.0),
    ("dnb", 2.0),
    ("house", 1.5),
    ("techno", 1.5),
    ("trance", 2.0),
    ("disco", 4.0),
    ("funk", 5.0),
    ("pop", 4.0),
];

/// Tolerated BPM difference for a genre label
pub fn genre_tolerance(genre: Option<&str>) -> f64 {
    let Some(genre) = genre else {
        return DEFAULT_TOLERANCE;
    };
    let genre = genre.to_lowercase();
    GENRE_TOLERANCES
        .iter()
        .find(|(keyword, _)| genre.contains(keyword))
        .map(|(_, tolerance)| *tolerance)
        .unwrap_or(DEFAULT_TOLERANCE)
}

/// Tolerance for a pair: the wider of the two genres' bands
pub fn pair_tolerance(a: Option<&str>, b: Option<&str>) -> f64 {
    genre_tolerance(a).max(genre_tolerance(b))
}

/// BPM difference accepting half/double-time relationships
///
/// Missing tempos (zero or negative) are neutral and give 0.
pub fn effective_bpm_diff(a: f64, b: f64) -> f64 {
    if a <= 0.0 || b <= 0.0 || !a.is_finite() || !b.is_finite() {
        return 0.0;
    }
    (a - b)
        .abs()
        .min((2.0 * a - b).abs())
        .min((a - 2.0 * b).abs())
}

pub fn is_bpm_compatible(diff: f64, tolerance: f64) -> bool {
    diff <= tolerance
}

/// Tempo proximity points, 0..=40, finer bands near zero difference
pub fn bpm_points(diff: f64, tolerance: f64) -> f64 {
    let ratio = if tolerance > 0.0 {
        diff / tolerance
    } else if diff == 0.0 {
        0.0
    } else {
        f64::INFINITY
    };
    if ratio <= 0.0 {
        40.0
    } else if ratio <= 0.25 {
        38.0
    } else if ratio <= 0.5 {
        35.0
    } else if ratio <= 1.0 {
        30.0
    } else if ratio <= 2.0 {
        20.0
    } else if ratio <= 4.0 {
        10.0
    } else {
        0.0
    }
}
