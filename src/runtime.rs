// Copyright (c) 2026 glowveil contributors

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMode {
    Mono,
    #[allow(dead_code)]
    Color16,
    Color256,
    TrueColor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlyphMode {
    Braille,
    Blocks,
}

impl GlyphMode {
    pub fn cycled(self) -> Self {
        match self {
            GlyphMode::Braille => GlyphMode::Blocks,
            GlyphMode::Blocks => GlyphMode::Braille,
        }
    }
}
