//! Admin privilege gate.
//!
//! The authentication layer is external; all the budget editor needs from it
//! is a yes/no answer, asked again at every gated call.

/// Answers whether the current caller may edit budgets.
pub trait PrivilegeGate {
    /// Whether the caller is privileged right now.
    fn is_privileged(&self) -> bool;
}

impl<F> PrivilegeGate for F
where
    F: Fn() -> bool,
{
    fn is_privileged(&self) -> bool {
        self()
    }
}

/// A gate with a fixed answer, e.g. resolved once per HTTP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticPrivilege(pub bool);

impl PrivilegeGate for StaticPrivilege {
    fn is_privileged(&self) -> bool {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_closure_gate_is_reevaluated() {
        let admin = Cell::new(false);
        let gate = || admin.get();
        assert!(!gate.is_privileged());
        admin.set(true);
        assert!(gate.is_privileged());
    }

    #[test]
    fn test_static_gate() {
        assert!(StaticPrivilege(true).is_privileged());
        assert!(!StaticPrivilege(false).is_privileged());
    }
}
