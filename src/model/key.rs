use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pitch-class names, index 0 = C
const PITCH_NAMES: [&str; 12] = [
    "C", "C#", "D", "Eb", "E", "F", "F#", "G", "Ab", "A", "Bb", "B",
];

/// Camelot wheel number for each major root (index = pitch class)
const MAJOR_TO_CAMELOT: [u8; 12] = [8, 3, 10, 5, 12, 7, 2, 9, 4, 11, 6, 1];

/// Camelot wheel number for each minor root (index = pitch class)
const MINOR_TO_CAMELOT: [u8; 12] = [5, 12, 7, 2, 9, 4, 11, 6, 1, 8, 3, 10];

/// Scale mode of a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Major,
    Minor,
}

/// Musical key as detected from audio (root pitch class + mode)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MusicalKey {
    /// Root pitch class, 0 = C .. 11 = B
    pub root: u8,
    pub mode: Mode,
}

impl MusicalKey {
    pub fn new(root: u8, mode: Mode) -> Self {
        Self {
            root: root % 12,
            mode,
        }
    }

    /// Get human-readable key name, e.g. "A Minor"
    pub fn name(&self) -> String {
        let mode = match self.mode {
            Mode::Major => "Major",
            Mode::Minor => "Minor",
        };
        format!("{} {}", PITCH_NAMES[self.root as usize], mode)
    }

    /// Map to Camelot notation via the fixed wheel table
    pub fn to_camelot(&self) -> CamelotKey {
        match self.mode {
            Mode::Major => CamelotKey {
                number: MAJOR_TO_CAMELOT[self.root as usize],
                letter: CamelotLetter::B,
            },
            Mode::Minor => CamelotKey {
                number: MINOR_TO_CAMELOT[self.root as usize],
                letter: CamelotLetter::A,
            },
        }
    }
}

/// Camelot letter: A = minor, B = major
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CamelotLetter {
    A,
    B,
}

/// Position on the Camelot wheel (`1A`..`12B`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CamelotKey {
    number: u8,
    letter: CamelotLetter,
}

impl CamelotKey {
    /// Build a key from wheel number (1..=12) and letter
    pub fn new(number: u8, letter: CamelotLetter) -> Option<Self> {
        if (1..=12).contains(&number) {
            Some(Self { number, letter })
        } else {
            None
        }
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn letter(&self) -> CamelotLetter {
        self.letter
    }

    pub fn is_minor(&self) -> bool {
        self.letter == CamelotLetter::A
    }

    /// All 24 wheel positions, `1A, 1B, 2A, ...`
    pub fn all() -> impl Iterator<Item = CamelotKey> {
        (1..=12u8).flat_map(|n| {
            [CamelotLetter::A, CamelotLetter::B]
                .into_iter()
                .map(move |letter| CamelotKey { number: n, letter })
        })
    }

    /// Steps clockwise from `self` to `other` (0..12), ignoring letters
    pub fn steps_to(&self, other: &CamelotKey) -> u8 {
        (other.number + 12 - self.number) % 12
    }
}

impl fmt::Display for CamelotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self.letter {
            CamelotLetter::A => 'A',
            CamelotLetter::B => 'B',
        };
        write!(f, "{}{}", self.number, letter)
    }
}

impl FromStr for CamelotKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (idx, last) = s
            .char_indices()
            .last()
            .ok_or_else(|| "empty Camelot key".to_string())?;
        let digits = &s[..idx];
        let letter = match last {
            'A' | 'a' => CamelotLetter::A,
            'B' | 'b' => CamelotLetter::B,
            _ => return Err(format!("invalid Camelot key: {:?}", s)),
        };
        let number: u8 = digits
            .parse()
            .map_err(|_| format!("invalid Camelot key: {:?}", s))?;
        CamelotKey::new(number, letter).ok_or_else(|| format!("invalid Camelot key: {:?}", s))
    }
}

impl TryFrom<String> for CamelotKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CamelotKey> for String {
    fn from(key: CamelotKey) -> Self {
        key.to_string()
    }
}
