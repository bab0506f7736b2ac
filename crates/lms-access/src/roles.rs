//! Role Priority Routing
//!
//! Combines independently-sourced role signals into one routing
//! destination: admin beats teacher beats classroom-student beats the
//! plain-user default. Signals carry an explicit loading state so the
//! resolver can defer instead of racing to a wrong low-priority default
//! while a higher-priority signal is still in flight.

use serde::{Deserialize, Serialize};

/// Three-valued role signal: a query still in flight is `Unknown`, never
/// an implicit `No`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    /// Query still in flight
    Unknown,
    /// Resolved: the user holds the role
    Yes,
    /// Resolved: the user does not hold the role
    No,
}

impl Signal {
    /// Lift a resolved query result
    pub fn from_bool(value: bool) -> Self {
        if value {
            Self::Yes
        } else {
            Self::No
        }
    }

    /// Query has completed, either way
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// The three independent role facts for one user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSignals {
    /// Admin flag
    pub admin: Signal,
    /// Teacher link (invitation claimed or role granted)
    pub teacher: Signal,
    /// Active classroom membership
    pub classroom_student: Signal,
}

impl RoleSignals {
    /// All signals still loading
    pub fn unknown() -> Self {
        Self {
            admin: Signal::Unknown,
            teacher: Signal::Unknown,
            classroom_student: Signal::Unknown,
        }
    }
}

/// Routing destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    /// Admin dashboard
    Admin,
    /// Teacher workspace
    Teacher,
    /// Classroom-student view
    Student,
    /// Default user view
    User,
}

/// Resolver output: either a destination or "not yet"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// A signal that could still outrank the current best is in flight.
    Pending,
    /// All outranking signals resolved; route here.
    Routed(Destination),
}

impl Resolution {
    /// Destination, if routing has settled
    pub fn destination(&self) -> Option<Destination> {
        match self {
            Self::Routed(d) => Some(*d),
            Self::Pending => None,
        }
    }
}

/// Resolve the routing destination by strict priority.
///
/// A `Yes` routes immediately regardless of lower-priority signals still
/// loading; an `Unknown` defers every destination it outranks. Pure and
/// deterministic; callers re-resolve whenever a signal transitions out of
/// `Unknown`.
pub fn resolve(signals: &RoleSignals) -> Resolution {
    match signals.admin {
        Signal::Unknown => return Resolution::Pending,
        Signal::Yes => return Resolution::Routed(Destination::Admin),
        Signal::No => {}
    }

    match signals.teacher {
        Signal::Unknown => return Resolution::Pending,
        Signal::Yes => return Resolution::Routed(Destination::Teacher),
        Signal::No => {}
    }

    match signals.classroom_student {
        Signal::Unknown => return Resolution::Pending,
        Signal::Yes => return Resolution::Routed(Destination::Student),
        Signal::No => {}
    }

    Resolution::Routed(Destination::User)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(admin: Signal, teacher: Signal, student: Signal) -> RoleSignals {
        RoleSignals {
            admin,
            teacher,
            classroom_student: student,
        }
    }

    #[test]
    fn test_admin_beats_everything() {
        let r = resolve(&signals(Signal::Yes, Signal::Yes, Signal::Yes));
        assert_eq!(r, Resolution::Routed(Destination::Admin));
    }

    #[test]
    fn test_priority_order() {
        assert_eq!(
            resolve(&signals(Signal::No, Signal::Yes, Signal::Yes)),
            Resolution::Routed(Destination::Teacher)
        );
        assert_eq!(
            resolve(&signals(Signal::No, Signal::No, Signal::Yes)),
            Resolution::Routed(Destination::Student)
        );
        assert_eq!(
            resolve(&signals(Signal::No, Signal::No, Signal::No)),
            Resolution::Routed(Destination::User)
        );
    }

    #[test]
    fn test_defers_while_higher_priority_signal_loads() {
        // Teacher says yes, but the admin check is still in flight: routing
        // as teacher now could misroute an admin.
        assert_eq!(
            resolve(&signals(Signal::Unknown, Signal::Yes, Signal::No)),
            Resolution::Pending
        );
        assert_eq!(
            resolve(&signals(Signal::No, Signal::Unknown, Signal::Yes)),
            Resolution::Pending
        );
        assert_eq!(
            resolve(&signals(Signal::No, Signal::No, Signal::Unknown)),
            Resolution::Pending
        );
    }

    #[test]
    fn test_yes_routes_despite_lower_signals_loading() {
        assert_eq!(
            resolve(&signals(Signal::Yes, Signal::Unknown, Signal::Unknown)),
            Resolution::Routed(Destination::Admin)
        );
        assert_eq!(
            resolve(&signals(Signal::No, Signal::Yes, Signal::Unknown)),
            Resolution::Routed(Destination::Teacher)
        );
    }

    #[test]
    fn test_all_unknown_is_pending() {
        assert_eq!(resolve(&RoleSignals::unknown()), Resolution::Pending);
        assert!(resolve(&RoleSignals::unknown()).destination().is_none());
    }
}
