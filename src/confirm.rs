/// Gate for destructive operations.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Agrees to everything; for `--yes` and tests.
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}
