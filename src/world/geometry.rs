use glam::Vec2;

/// Stable identity of a wall for the lifetime of a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WallId(pub u64);

/*----------------------------- colour -------------------------------*/

/// 8-bit-per-channel straight-alpha colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgba(0x00, 0x00, 0x00, 0xFF);
    pub const WHITE: Color = Color::rgba(0xFF, 0xFF, 0xFF, 0xFF);
    pub const RED: Color = Color::rgba(0xFF, 0x00, 0x00, 0xFF);
    pub const GREEN: Color = Color::rgba(0x00, 0xFF, 0x00, 0xFF);
    pub const BLUE: Color = Color::rgba(0x00, 0x00, 0xFF, 0xFF);
    pub const YELLOW: Color = Color::rgba(0xFF, 0xFF, 0x00, 0xFF);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Frame-buffer pixel in `0x00RRGGBB`.
    #[inline]
    pub fn to_rgb_u32(self) -> u32 {
        (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }
}

/// Pack a colour into one `f32` whose memory layout is `[r, g, b, a]`.
///
/// The vertex layout carries position and colour in the same float stream;
/// the backend reinterprets the last four bytes of every vertex as normalised
/// `u8`s. Bit 24 (lowest alpha bit) is cleared so the result can never be a
/// NaN or infinity, which keeps `==` meaningful on packed tokens.
#[inline]
pub fn pack_color(c: Color) -> f32 {
    let bits = (c.a as u32) << 24 | (c.b as u32) << 16 | (c.g as u32) << 8 | c.r as u32;
    f32::from_bits(bits & 0xFEFF_FFFF)
}

/// Inverse of [`pack_color`] (alpha keeps its cleared low bit).
#[inline]
pub fn unpack_color(token: f32) -> Color {
    let [r, g, b, a] = token.to_bits().to_le_bytes();
    Color { r, g, b, a }
}

/// Write `value` into `buffer[index]`, raising `changed` only when the slot
/// actually held something else.
///
/// Comparison is on the bit pattern so `-0.0` vs `0.0` and repeated NaNs are
/// treated exactly.
#[inline]
pub fn set_slot(buffer: &mut [f32], index: usize, value: f32, changed: &mut bool) {
    if buffer[index].to_bits() != value.to_bits() {
        buffer[index] = value;
        *changed = true;
    }
}

/*--------------------------- line segments ---------------------------*/

/// Footprint of a wall on the floor plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineSegment {
    pub p1: Vec2,
    pub p2: Vec2,
}

impl LineSegment {
    pub const fn new(p1: Vec2, p2: Vec2) -> Self {
        Self { p1, p2 }
    }

    #[inline]
    pub fn magnitude(&self) -> f32 {
        (self.p2 - self.p1).length()
    }

    /// Direction from `p1` to `p2` in degrees, `(-180, 180]`.
    #[inline]
    pub fn angle_deg(&self) -> f32 {
        let d = self.p2 - self.p1;
        d.y.atan2(d.x).to_degrees()
    }
}

/*------------------------------- walls -------------------------------*/

/// A vertical wall of uniform height standing on the floor.
#[derive(Clone, Debug, PartialEq)]
pub struct Wall {
    pub id: WallId,
    pub line: LineSegment,
    pub height: f32, // world units above the floor
    pub color: Color,
    pub scale: Vec2, // render scale fed to the model matrix
}

impl Wall {
    pub fn new(id: WallId, line: LineSegment, height: f32, color: Color) -> Self {
        Self {
            id,
            line,
            height,
            color,
            scale: Vec2::ONE,
        }
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
