use rgb::RGB8;

/// Set one physical pixel to a color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaintCommand {
    pub position: u8,
    pub color: RGB8,
}

impl PaintCommand {
    pub const fn new(position: u8, color: RGB8) -> Self {
        Self { position, color }
    }

    /// Serialized form as understood by the matrix firmware, e.g. `[37,255,0,128]`.
    pub fn to_wire(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for PaintCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{},{},{},{}]",
            self.position, self.color.r, self.color.g, self.color.b
        )
    }
}

#[cfg(test)]
mod tests {
    use rgb::RGB8;

    use super::PaintCommand;

    #[test]
    fn test_wire_format() {
        let cmd = PaintCommand::new(37, RGB8::new(255, 0, 128));
        insta::assert_snapshot!(cmd.to_wire(), @"[37,255,0,128]");
    }

    #[test]
    fn test_wire_format_no_padding() {
        let cmd = PaintCommand::new(0, RGB8::new(0, 7, 10));
        insta::assert_snapshot!(cmd.to_wire(), @"[0,0,7,10]");
    }

    #[test]
    fn test_wire_format_red_corner() {
        let cmd = PaintCommand::new(255, RGB8::new(255, 0, 0));
        assert_eq!(cmd.to_wire().as_bytes(), b"[255,255,0,0]");
    }
}
