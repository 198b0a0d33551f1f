use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid or unsupported element symbol: '{0}'")]
pub struct ParseElementError(pub String);

/// Chemical element, discriminant equal to the atomic number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Element {
    H = 1,
    He,
    Li,
    Be,
    B,
    C,
    N,
    O,
    F,
    Ne,
    Na,
    Mg,
    Al,
    Si,
    P,
    S,
    Cl,
    Ar,
    K,
    Ca,
    Sc,
    Ti,
    V,
    Cr,
    Mn,
    Fe,
    Co,
    Ni,
    Cu,
    Zn,
    Ga,
    Ge,
    As,
    Se,
    Br,
    Kr,
    Rb,
    Sr,
    Y,
    Zr,
    Nb,
    Mo,
    Tc,
    Ru,
    Rh,
    Pd,
    Ag,
    Cd,
    In,
    Sn,
    Sb,
    Te,
    I,
    Xe,
    Cs,
    Ba,
    La,
    Ce,
    Pr,
    Nd,
    Pm,
    Sm,
    Eu,
    Gd,
    Tb,
    Dy,
    Ho,
    Er,
    Tm,
    Yb,
    Lu,
    Hf,
    Ta,
    W,
    Re,
    Os,
    Ir,
    Pt,
    Au,
    Hg,
    Tl,
    Pb,
    Bi,
    Po,
    At,
    Rn,
    Fr,
    Ra,
    Ac,
    Th,
    Pa,
    U,
    Np,
    Pu,
    Am,
    Cm,
    Bk,
    Cf,
    Es,
    Fm,
    Md,
    No,
    Lr,
    Rf,
    Db,
    Sg,
    Bh,
    Hs,
    Mt,
    Ds,
    Rg,
    Cn,
    Nh,
    Fl,
    Mc,
    Lv,
    Ts,
    Og,
}

const ALL: [Element; 118] = [
    Element::H, Element::He, Element::Li, Element::Be, Element::B, Element::C, Element::N,
    Element::O, Element::F, Element::Ne, Element::Na, Element::Mg, Element::Al, Element::Si,
    Element::P, Element::S, Element::Cl, Element::Ar, Element::K, Element::Ca, Element::Sc,
    Element::Ti, Element::V, Element::Cr, Element::Mn, Element::Fe, Element::Co, Element::Ni,
    Element::Cu, Element::Zn, Element::Ga, Element::Ge, Element::As, Element::Se, Element::Br,
    Element::Kr, Element::Rb, Element::Sr, Element::Y, Element::Zr, Element::Nb, Element::Mo,
    Element::Tc, Element::Ru, Element::Rh, Element::Pd, Element::Ag, Element::Cd, Element::In,
    Element::Sn, Element::Sb, Element::Te, Element::I, Element::Xe, Element::Cs, Element::Ba,
    Element::La, Element::Ce, Element::Pr, Element::Nd, Element::Pm, Element::Sm, Element::Eu,
    Element::Gd, Element::Tb, Element::Dy, Element::Ho, Element::Er, Element::Tm, Element::Yb,
    Element::Lu, Element::Hf, Element::Ta, Element::W, Element::Re, Element::Os, Element::Ir,
    Element::Pt, Element::Au, Element::Hg, Element::Tl, Element::Pb, Element::Bi, Element::Po,
    Element::At, Element::Rn, Element::Fr, Element::Ra, Element::Ac, Element::Th, Element::Pa,
    Element::U, Element::Np, Element::Pu, Element::Am, Element::Cm, Element::Bk, Element::Cf,
    Element::Es, Element::Fm, Element::Md, Element::No, Element::Lr, Element::Rf, Element::Db,
    Element::Sg, Element::Bh, Element::Hs, Element::Mt, Element::Ds, Element::Rg, Element::Cn,
    Element::Nh, Element::Fl, Element::Mc, Element::Lv, Element::Ts, Element::Og,
];

/// Symbol and standard atomic weight (amu), indexed by `atomic_number - 1`.
const TABLE: [(&str, f64); 118] = [
    ("H", 1.008),
    ("He", 4.0026),
    ("Li", 6.94),
    ("Be", 9.0122),
    ("B", 10.81),
    ("C", 12.011),
    ("N", 14.007),
    ("O", 15.999),
    ("F", 18.998),
    ("Ne", 20.18),
    ("Na", 22.99),
    ("Mg", 24.305),
    ("Al", 26.982),
    ("Si", 28.085),
    ("P", 30.974),
    ("S", 32.06),
    ("Cl", 35.45),
    ("Ar", 39.948),
    ("K", 39.098),
    ("Ca", 40.078),
    ("Sc", 44.956),
    ("Ti", 47.867),
    ("V", 50.942),
    ("Cr", 51.996),
    ("Mn", 54.938),
    ("Fe", 55.845),
    ("Co", 58.933),
    ("Ni", 58.693),
    ("Cu", 63.546),
    ("Zn", 65.38),
    ("Ga", 69.723),
    ("Ge", 72.63),
    ("As", 74.922),
    ("Se", 78.971),
    ("Br", 79.904),
    ("Kr", 83.798),
    ("Rb", 85.468),
    ("Sr", 87.62),
    ("Y", 88.906),
    ("Zr", 91.224),
    ("Nb", 92.906),
    ("Mo", 95.96),
    ("Tc", 98.0),
    ("Ru", 101.07),
    ("Rh", 102.91),
    ("Pd", 106.42),
    ("Ag", 107.87),
    ("Cd", 112.41),
    ("In", 114.82),
    ("Sn", 118.71),
    ("Sb", 121.76),
    ("Te", 127.6),
    ("I", 126.9),
    ("Xe", 131.29),
    ("Cs", 132.91),
    ("Ba", 137.33),
    ("La", 138.91),
    ("Ce", 140.12),
    ("Pr", 140.91),
    ("Nd", 144.24),
    ("Pm", 145.0),
    ("Sm", 150.36),
    ("Eu", 151.96),
    ("Gd", 157.25),
    ("Tb", 158.93),
    ("Dy", 162.5),
    ("Ho", 164.93),
    ("Er", 167.26),
    ("Tm", 168.93),
    ("Yb", 173.05),
    ("Lu", 174.97),
    ("Hf", 178.49),
    ("Ta", 180.95),
    ("W", 183.84),
    ("Re", 186.21),
    ("Os", 190.23),
    ("Ir", 192.22),
    ("Pt", 195.08),
    ("Au", 196.97),
    ("Hg", 200.59),
    ("Tl", 204.38),
    ("Pb", 207.2),
    ("Bi", 208.98),
    ("Po", 209.0),
    ("At", 210.0),
    ("Rn", 222.0),
    ("Fr", 223.0),
    ("Ra", 226.0),
    ("Ac", 227.0),
    ("Th", 232.04),
    ("Pa", 231.04),
    ("U", 238.03),
    ("Np", 237.0),
    ("Pu", 244.0),
    ("Am", 243.0),
    ("Cm", 247.0),
    ("Bk", 247.0),
    ("Cf", 251.0),
    ("Es", 252.0),
    ("Fm", 257.0),
    ("Md", 258.0),
    ("No", 259.0),
    ("Lr", 262.0),
    ("Rf", 267.0),
    ("Db", 270.0),
    ("Sg", 271.0),
    ("Bh", 270.0),
    ("Hs", 277.0),
    ("Mt", 276.0),
    ("Ds", 281.0),
    ("Rg", 280.0),
    ("Cn", 285.0),
    ("Nh", 284.0),
    ("Fl", 289.0),
    ("Mc", 288.0),
    ("Lv", 293.0),
    ("Ts", 294.0),
    ("Og", 294.0),
];

impl Element {
    pub fn from_atomic_number(number: u8) -> Option<Self> {
        let index = usize::from(number).checked_sub(1)?;
        ALL.get(index).copied()
    }

    pub fn atomic_number(&self) -> u8 {
        *self as u8
    }

    pub fn symbol(&self) -> &'static str {
        TABLE[self.index()].0
    }

    /// Standard atomic weight in amu.
    pub fn atomic_weight(&self) -> f64 {
        TABLE[self.index()].1
    }

    /// Mass of the most abundant isotope in amu, falling back to the standard atomic weight
    /// for elements without a tabulated isotope.
    pub fn isotope_mass(&self) -> f64 {
        match self {
            Element::H => 1.00782503207,
            Element::He => 4.00260325415,
            Element::Li => 7.016004548,
            Element::Be => 9.012182201,
            Element::B => 11.009305406,
            Element::C => 12.0,
            Element::N => 14.00307400478,
            Element::O => 15.99491461956,
            Element::F => 18.998403224,
            Element::Ne => 19.99244017542,
            Element::Na => 22.98976928087,
            Element::Mg => 23.985041699,
            Element::Al => 26.981538627,
            Element::Si => 27.97692653246,
            Element::P => 30.973761629,
            Element::S => 31.972070999,
            Element::Cl => 34.968852682,
            Element::Ar => 39.96238312251,
            Element::K => 38.963706679,
            Element::Ca => 39.962590983,
            Element::Sc => 44.955911909,
            Element::Ti => 47.947946281,
            Element::V => 50.943959507,
            Element::Cr => 51.940507472,
            Element::Mn => 54.938045141,
            Element::Fe => 55.934937475,
            Element::Co => 58.933195048,
            Element::Ni => 57.935342907,
            Element::Cu => 62.929597474,
            Element::Zn => 63.929142222,
            Element::Ga => 68.925573587,
            Element::Ge => 73.921177767,
            Element::As => 74.921596478,
            Element::Se => 79.916521271,
            Element::Br => 78.918337087,
            Element::Kr => 83.911506687,
            Element::I => 126.904472681,
            _ => self.atomic_weight(),
        }
    }

    fn index(&self) -> usize {
        usize::from(self.atomic_number()) - 1
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Element {
    type Err = ParseElementError;

    /// Parses an element symbol case-insensitively (`"CL"`, `"cl"` and `"Cl"` are chlorine).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        let normalized: String = match chars.next() {
            Some(first) => first
                .to_uppercase()
                .chain(chars.flat_map(|c| c.to_lowercase()))
                .collect(),
            None => return Err(ParseElementError(s.to_string())),
        };
        TABLE
            .iter()
            .position(|(symbol, _)| *symbol == normalized)
            .map(|index| ALL[index])
            .ok_or_else(|| ParseElementError(s.to_string()))
    }
}
