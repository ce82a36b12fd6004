pub trait ConfigT {
    const DEBUG: bool;
    const CHECK_INVARIANTS: bool; // re-validate the whole tree after every mutation
}

pub struct DefaultConfig {}
pub struct DebugConfig {}

impl ConfigT for DefaultConfig {
    const DEBUG: bool = false;
    const CHECK_INVARIANTS: bool = false;
}

impl ConfigT for DebugConfig {
    const DEBUG: bool = true;
    const CHECK_INVARIANTS: bool = true;
}
