/// Sink for values emitted by `out` instructions.
///
/// Values arrive in execution order, one call per executed `out`.
pub trait Output {
    fn emit(&mut self, value: i32);
}

/// Prints each emitted value on its own line to stdout.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdOutput;

impl Output for StdOutput {
    fn emit(&mut self, value: i32) {
        println!("{value}");
    }
}

/// Collects emitted values in memory.
impl Output for Vec<i32> {
    fn emit(&mut self, value: i32) {
        self.push(value);
    }
}
