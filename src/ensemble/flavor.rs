use strum_macros::{Display, EnumIter, EnumString};

/// Parton flavors that can appear on an ensemble grid.
#[derive(Debug, Clone, Copy, EnumIter, EnumString, Display, PartialEq, Eq, Hash)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Flavor {
    TBar,
    BBar,
    CBar,
    SBar,
    UBar,
    DBar,
    #[strum(to_string = "g", serialize = "gluon")]
    Gluon,
    D,
    U,
    S,
    C,
    B,
    T,
}

impl Flavor {
    pub fn pdg_id(&self) -> i32 {
        match self {
            Self::TBar => -6,
            Self::BBar => -5,
            Self::CBar => -4,
            Self::SBar => -3,
            Self::UBar => -2,
            Self::DBar => -1,
            Self::Gluon => 21,
            Self::D => 1,
            Self::U => 2,
            Self::S => 3,
            Self::C => 4,
            Self::B => 5,
            Self::T => 6,
        }
    }

    /// Accepts 0 as an alias for the gluon.
    pub fn from_pdg(id: i32) -> Option<Self> {
        Some(match id {
            -6 => Self::TBar,
            -5 => Self::BBar,
            -4 => Self::CBar,
            -3 => Self::SBar,
            -2 => Self::UBar,
            -1 => Self::DBar,
            0 | 21 => Self::Gluon,
            1 => Self::D,
            2 => Self::U,
            3 => Self::S,
            4 => Self::C,
            5 => Self::B,
            6 => Self::T,
            _ => return None,
        })
    }

    /// Parses either a flavor name (`ubar`, `g`) or a PDG id (`-2`, `21`).
    pub fn parse_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if let Ok(f) = label.parse::<Flavor>() {
            return Some(f);
        }
        label.parse::<i32>().ok().and_then(Self::from_pdg)
    }
}
