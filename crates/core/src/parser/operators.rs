//! Content-stream operator grammar.
//!
//! A closed enumeration of every operator token this core recognizes,
//! with the registered operand arity for each. Operators the dispatcher
//! performs no semantic action for are still listed so the glued-operator
//! segmenter can recognize them.

/// Registered operand count for an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many operands.
    Fixed(usize),
    /// Any operand count (wildcard grammar entry).
    Any,
}

/// A recognized content-stream operator token.
///
/// Naming follows the token casing: a doubled letter marks the lowercase
/// form where both cases exist (`Q` is the token `Q`, `Qq` is `q`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // Graphics state
    Qq, // q - save state
    Q,  // Q - restore state
    Cm, // cm - concat matrix
    Ww, // w - line width
    J,  // J - line cap
    Jj, // j - line join
    M,  // M - miter limit
    D,  // d - dash pattern
    Ri, // ri - rendering intent
    I,  // i - flatness
    Gs, // gs - ext graphics state

    // Path construction
    Mm, // m - moveto
    L,  // l - lineto
    C,  // c - curveto
    V,  // v
    Y,  // y
    H,  // h - closepath
    Re, // re - rectangle

    // Path painting
    S,      // S - stroke
    Ss,     // s - close + stroke
    F,      // F - fill (obsolete form)
    Ff,     // f - fill
    FStar,  // f*
    B,      // B - fill + stroke
    BStar,  // B*
    Bb,     // b
    BbStar, // b*
    N,      // n - no-op path end

    // Clipping
    WClip, // W
    WStar, // W*

    // Text object
    BT,
    ET,

    // Text state
    Tc,
    Tw,
    Tz,
    TL,
    Tf,
    Tr,
    Ts,

    // Text positioning
    Td,
    TD,
    Tm,
    TStar, // T*

    // Text showing
    Tj,
    TJ,
    Quote,       // '
    DoubleQuote, // "

    // Color
    CS,
    Cs, // cs
    SC,
    SCN,
    Sc,  // sc
    Scn, // scn
    G,
    Gg, // g
    RG,
    Rg, // rg
    K,
    Kk, // k

    // XObject
    Do,

    // Inline image
    BI,
    ID,
    EI,

    // Marked content
    MP,
    DP,
    BMC,
    BDC,
    EMC,

    // Shading, Type3 glyph metrics, compatibility sections
    Sh, // sh
    D0, // d0
    D1, // d1
    BX,
    EX,
}

impl Opcode {
    /// Look up an operator by its raw token bytes.
    pub fn from_token(token: &[u8]) -> Option<Self> {
        Some(match token {
            b"q" => Self::Qq,
            b"Q" => Self::Q,
            b"cm" => Self::Cm,
            b"w" => Self::Ww,
            b"J" => Self::J,
            b"j" => Self::Jj,
            b"M" => Self::M,
            b"d" => Self::D,
            b"ri" => Self::Ri,
            b"i" => Self::I,
            b"gs" => Self::Gs,
            b"m" => Self::Mm,
            b"l" => Self::L,
            b"c" => Self::C,
            b"v" => Self::V,
            b"y" => Self::Y,
            b"h" => Self::H,
            b"re" => Self::Re,
            b"S" => Self::S,
            b"s" => Self::Ss,
            b"F" => Self::F,
            b"f" => Self::Ff,
            b"f*" => Self::FStar,
            b"B" => Self::B,
            b"B*" => Self::BStar,
            b"b" => Self::Bb,
            b"b*" => Self::BbStar,
            b"n" => Self::N,
            b"W" => Self::WClip,
            b"W*" => Self::WStar,
            b"BT" => Self::BT,
            b"ET" => Self::ET,
            b"Tc" => Self::Tc,
            b"Tw" => Self::Tw,
            b"Tz" => Self::Tz,
            b"TL" => Self::TL,
            b"Tf" => Self::Tf,
            b"Tr" => Self::Tr,
            b"Ts" => Self::Ts,
            b"Td" => Self::Td,
            b"TD" => Self::TD,
            b"Tm" => Self::Tm,
            b"T*" => Self::TStar,
            b"Tj" => Self::Tj,
            b"TJ" => Self::TJ,
            b"'" => Self::Quote,
            b"\"" => Self::DoubleQuote,
            b"CS" => Self::CS,
            b"cs" => Self::Cs,
            b"SC" => Self::SC,
            b"SCN" => Self::SCN,
            b"sc" => Self::Sc,
            b"scn" => Self::Scn,
            b"G" => Self::G,
            b"g" => Self::Gg,
            b"RG" => Self::RG,
            b"rg" => Self::Rg,
            b"K" => Self::K,
            b"k" => Self::Kk,
            b"Do" => Self::Do,
            b"BI" => Self::BI,
            b"ID" => Self::ID,
            b"EI" => Self::EI,
            b"MP" => Self::MP,
            b"DP" => Self::DP,
            b"BMC" => Self::BMC,
            b"BDC" => Self::BDC,
            b"EMC" => Self::EMC,
            b"sh" => Self::Sh,
            b"d0" => Self::D0,
            b"d1" => Self::D1,
            b"BX" => Self::BX,
            b"EX" => Self::EX,
            _ => return None,
        })
    }

    /// The operator's token text.
    pub const fn token(&self) -> &'static str {
        match self {
            Self::Qq => "q",
            Self::Q => "Q",
            Self::Cm => "cm",
            Self::Ww => "w",
            Self::J => "J",
            Self::Jj => "j",
            Self::M => "M",
            Self::D => "d",
            Self::Ri => "ri",
            Self::I => "i",
            Self::Gs => "gs",
            Self::Mm => "m",
            Self::L => "l",
            Self::C => "c",
            Self::V => "v",
            Self::Y => "y",
            Self::H => "h",
            Self::Re => "re",
            Self::S => "S",
            Self::Ss => "s",
            Self::F => "F",
            Self::Ff => "f",
            Self::FStar => "f*",
            Self::B => "B",
            Self::BStar => "B*",
            Self::Bb => "b",
            Self::BbStar => "b*",
            Self::N => "n",
            Self::WClip => "W",
            Self::WStar => "W*",
            Self::BT => "BT",
            Self::ET => "ET",
            Self::Tc => "Tc",
            Self::Tw => "Tw",
            Self::Tz => "Tz",
            Self::TL => "TL",
            Self::Tf => "Tf",
            Self::Tr => "Tr",
            Self::Ts => "Ts",
            Self::Td => "Td",
            Self::TD => "TD",
            Self::Tm => "Tm",
            Self::TStar => "T*",
            Self::Tj => "Tj",
            Self::TJ => "TJ",
            Self::Quote => "'",
            Self::DoubleQuote => "\"",
            Self::CS => "CS",
            Self::Cs => "cs",
            Self::SC => "SC",
            Self::SCN => "SCN",
            Self::Sc => "sc",
            Self::Scn => "scn",
            Self::G => "G",
            Self::Gg => "g",
            Self::RG => "RG",
            Self::Rg => "rg",
            Self::K => "K",
            Self::Kk => "k",
            Self::Do => "Do",
            Self::BI => "BI",
            Self::ID => "ID",
            Self::EI => "EI",
            Self::MP => "MP",
            Self::DP => "DP",
            Self::BMC => "BMC",
            Self::BDC => "BDC",
            Self::EMC => "EMC",
            Self::Sh => "sh",
            Self::D0 => "d0",
            Self::D1 => "d1",
            Self::BX => "BX",
            Self::EX => "EX",
        }
    }

    /// The operator's registered operand arity.
    ///
    /// `SC`/`SCN` families take a color-space-dependent operand count and
    /// are registered as wildcards. `BI` opens the inline-image sub-mode
    /// and carries its operands as key/value attributes instead.
    pub const fn arity(&self) -> Arity {
        match self {
            Self::Qq
            | Self::Q
            | Self::H
            | Self::S
            | Self::Ss
            | Self::F
            | Self::Ff
            | Self::FStar
            | Self::B
            | Self::BStar
            | Self::Bb
            | Self::BbStar
            | Self::N
            | Self::WClip
            | Self::WStar
            | Self::BT
            | Self::ET
            | Self::TStar
            | Self::EMC
            | Self::ID
            | Self::EI
            | Self::BX
            | Self::EX => Arity::Fixed(0),

            Self::Ww
            | Self::J
            | Self::Jj
            | Self::M
            | Self::Ri
            | Self::I
            | Self::Gs
            | Self::Tc
            | Self::Tw
            | Self::Tz
            | Self::TL
            | Self::Tr
            | Self::Ts
            | Self::Tj
            | Self::TJ
            | Self::Quote
            | Self::CS
            | Self::Cs
            | Self::G
            | Self::Gg
            | Self::Do
            | Self::MP
            | Self::BMC
            | Self::Sh => Arity::Fixed(1),

            Self::D | Self::Mm | Self::L | Self::Td | Self::TD | Self::Tf | Self::DP
            | Self::BDC | Self::D0 => Arity::Fixed(2),

            Self::DoubleQuote | Self::RG | Self::Rg => Arity::Fixed(3),

            Self::V | Self::Y | Self::Re | Self::K | Self::Kk => Arity::Fixed(4),

            Self::Cm | Self::C | Self::Tm | Self::D1 => Arity::Fixed(6),

            Self::SC | Self::SCN | Self::Sc | Self::Scn | Self::BI => Arity::Any,
        }
    }

    /// Whether the registered arity admits `count` operands.
    pub const fn accepts(&self, count: usize) -> bool {
        match self.arity() {
            Arity::Fixed(n) => n == count,
            Arity::Any => true,
        }
    }
}

/// Longest operator token length, in bytes.
const MAX_TOKEN_LEN: usize = 3;

/// Segment a raw operator token into known operators.
///
/// Content streams from some producers glue operators together without a
/// delimiter. Segmentation is greedy left to right, preferring the
/// longest known operator at each position, and backtracks to shorter
/// segments when the remainder cannot be segmented. Returns `None` when
/// no full segmentation exists.
pub fn segment(token: &[u8]) -> Option<Vec<Opcode>> {
    if token.is_empty() {
        return None;
    }
    let mut out = Vec::new();
    if segment_into(token, &mut out) { Some(out) } else { None }
}

fn segment_into(rest: &[u8], out: &mut Vec<Opcode>) -> bool {
    if rest.is_empty() {
        return true;
    }
    let longest = rest.len().min(MAX_TOKEN_LEN);
    for len in (1..=longest).rev() {
        if let Some(op) = Opcode::from_token(&rest[..len]) {
            out.push(op);
            if segment_into(&rest[len..], out) {
                return true;
            }
            out.pop();
        }
    }
    false
}
