pub mod check;
pub mod config;
pub mod simulate;

/// Text to print and whether the command succeeded
#[derive(Debug)]
pub struct Outcome {
    pub output: String,
    pub success: bool,
}

impl Outcome {
    pub fn ok(output: String) -> Self {
        Self { output, success: true }
    }
}
