//! Colour values for the indicator LED.
//!
//! Colours are plain 8-bit RGB triples. Remote peers address the LED with a
//! compact 15-bit encoding (five bits per channel), see
//! [`Colour::from_rgb15`].

/// An 8-bit-per-channel RGB colour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Colour {
    /// Red channel (0-255).
    pub r: u8,
    /// Green channel (0-255).
    pub g: u8,
    /// Blue channel (0-255).
    pub b: u8,
}

impl Colour {
    /// All channels off.
    pub const BLACK: Colour = Colour::new(0, 0, 0);
    /// All channels fully on.
    pub const WHITE: Colour = Colour::new(255, 255, 255);
    /// Full red.
    pub const RED: Colour = Colour::new(255, 0, 0);
    /// Full green.
    pub const GREEN: Colour = Colour::new(0, 255, 0);
    /// Full blue.
    pub const BLUE: Colour = Colour::new(0, 0, 255);

    /// Create a colour from its channels.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Expand a 15-bit colour into 24 bits.
    ///
    /// Layout: red in bits 0-4, green in bits 5-9, blue in bits 10-14. Each
    /// 5-bit channel is shifted left by three, so `0x1F` becomes `248`.
    /// Bit 15 is ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use wallpanel::Colour;
    ///
    /// assert_eq!(Colour::from_rgb15(0x001F), Colour::new(248, 0, 0));
    /// assert_eq!(Colour::from_rgb15(0x03E0), Colour::new(0, 248, 0));
    /// assert_eq!(Colour::from_rgb15(0x7C00), Colour::new(0, 0, 248));
    /// ```
    pub const fn from_rgb15(encoded: u16) -> Self {
        Self {
            r: ((encoded & 0x1F) << 3) as u8,
            g: (((encoded >> 5) & 0x1F) << 3) as u8,
            b: (((encoded >> 10) & 0x1F) << 3) as u8,
        }
    }

    /// Pack into the 15-bit encoding, dropping the three low bits of each
    /// channel.
    pub const fn to_rgb15(self) -> u16 {
        ((self.b as u16 >> 3) << 10) | ((self.g as u16 >> 3) << 5) | (self.r as u16 >> 3)
    }

    /// Channels as an array, red first.
    #[inline]
    pub const fn channels(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Build a colour from a red-first channel array.
    #[inline]
    pub const fn from_channels(c: [u8; 3]) -> Self {
        Self::new(c[0], c[1], c[2])
    }

    /// The duty values for an active-low (common-anode) LED: `255 - value`
    /// per channel.
    #[inline]
    pub const fn inverted(self) -> Self {
        Self::new(255 - self.r, 255 - self.g, 255 - self.b)
    }
}
