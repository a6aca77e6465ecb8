/// Run outcome determining the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every input produced a record without error (exit 0).
    AllParsed,
    /// At least one input failed (exit 1).
    Partial,
    /// Bad configuration, no inputs, or output failure (exit 2).
    Refusal,
}

impl Outcome {
    pub fn exit_code(self) -> u8 {
        match self {
            Outcome::AllParsed => 0,
            Outcome::Partial => 1,
            Outcome::Refusal => 2,
        }
    }

    /// `AllParsed` when `failures` is zero, otherwise `Partial`.
    pub fn from_failures(failures: usize) -> Self {
        if failures == 0 {
            Outcome::AllParsed
        } else {
            Outcome::Partial
        }
    }
}
