use super::{CharDisplay, DisplayError, CMD_CLEAR, ROWS};

/// One operation observed by [`FakeDisplay`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayOp {
    Clear,
    Command(u8),
    Line { row: u8, text: String },
}

impl DisplayOp {
    pub fn line(row: u8, text: &str) -> Self {
        Self::Line {
            row,
            text: text.to_string(),
        }
    }

    /// True for a raw clear instruction or a full clear
    pub fn is_clear(&self) -> bool {
        matches!(self, Self::Clear | Self::Command(CMD_CLEAR))
    }
}

/// In-memory display used in tests to record writes.
#[derive(Debug, Default)]
pub struct FakeDisplay {
    ops: Vec<DisplayOp>,
}

impl FakeDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[DisplayOp] {
        &self.ops
    }

    /// Drain the recorded operations
    pub fn take_ops(&mut self) -> Vec<DisplayOp> {
        std::mem::take(&mut self.ops)
    }
}

impl CharDisplay for FakeDisplay {
    fn clear(&mut self) -> Result<(), DisplayError> {
        self.ops.push(DisplayOp::Clear);
        Ok(())
    }

    fn write_command(&mut self, code: u8) -> Result<(), DisplayError> {
        self.ops.push(DisplayOp::Command(code));
        Ok(())
    }

    fn write_line(&mut self, text: &str, row: u8) -> Result<(), DisplayError> {
        if row == 0 || row > ROWS {
            return Err(DisplayError::InvalidRow(row));
        }
        self.ops.push(DisplayOp::line(row, text));
        Ok(())
    }
}
