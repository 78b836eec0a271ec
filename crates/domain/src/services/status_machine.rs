//! Device status machine.
//!
//! Every status mutation goes through [`plan_status_change`]. The function is
//! pure: it decides legality and produces the transition to persist, while
//! the persistence layer applies it and appends the audit entry.

use thiserror::Error;

use crate::models::DeviceStatus;

/// A legal status transition ready to be persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTransition {
    pub from: DeviceStatus,
    pub to: DeviceStatus,
}

/// Rejection reasons for a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("device is in terminal state {current} and cannot change status")]
    Terminal { current: DeviceStatus },

    #[error("transition from {from} to {to} is not allowed")]
    NotAllowed {
        from: DeviceStatus,
        to: DeviceStatus,
    },

    #[error("cannot move device to {target} while an active assignment is unresolved")]
    UnresolvedAssignment { target: DeviceStatus },
}

/// Whether the `(from, to)` pair appears in the transition table.
///
/// | From          | To                                                    |
/// |---------------|-------------------------------------------------------|
/// | DISPONIBLE    | ASIGNADO, MANTENIMIENTO, BAJA                         |
/// | ASIGNADO      | MANTENIMIENTO, DISPONIBLE, BAJA, ROBO                 |
/// | MANTENIMIENTO | DISPONIBLE, ASIGNADO (urgent-maintenance only), BAJA  |
/// | BAJA          | — (terminal)                                          |
/// | ROBO          | — (terminal)                                          |
pub fn is_transition_allowed(from: DeviceStatus, to: DeviceStatus) -> bool {
    use DeviceStatus::*;
    matches!(
        (from, to),
        (Disponible, Asignado)
            | (Disponible, Mantenimiento)
            | (Disponible, Baja)
            | (Asignado, Mantenimiento)
            | (Asignado, Disponible)
            | (Asignado, Baja)
            | (Asignado, Robo)
            | (Mantenimiento, Disponible)
            | (Mantenimiento, Asignado)
            | (Mantenimiento, Baja)
    )
}

/// Decides a status change.
///
/// Returns `Ok(None)` when `target == current`: the change is an idempotent
/// no-op and no audit entry must be written. `has_active_assignment` reflects
/// the device's unresolved active assignment count *after* whatever the
/// caller's cascade resolves: callers that finalize the assignment atomically
/// with the transition pass `false`.
pub fn plan_status_change(
    current: DeviceStatus,
    target: DeviceStatus,
    has_active_assignment: bool,
) -> Result<Option<StatusTransition>, TransitionError> {
    if current == target {
        return Ok(None);
    }
    if current.is_terminal() {
        return Err(TransitionError::Terminal { current });
    }
    if !is_transition_allowed(current, target) {
        return Err(TransitionError::NotAllowed {
            from: current,
            to: target,
        });
    }
    // Terminal targets require the active assignment to be resolved first, and
    // leaving urgent maintenance back to ASIGNADO requires one to still exist.
    if target.is_terminal() && has_active_assignment {
        return Err(TransitionError::UnresolvedAssignment { target });
    }
    if current == DeviceStatus::Mantenimiento
        && target == DeviceStatus::Asignado
        && !has_active_assignment
    {
        return Err(TransitionError::NotAllowed {
            from: current,
            to: target,
        });
    }

    Ok(Some(StatusTransition {
        from: current,
        to: target,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use DeviceStatus::*;

    #[test]
    fn test_same_status_is_noop() {
        for status in DeviceStatus::all() {
            assert_eq!(plan_status_change(status, status, false), Ok(None));
        }
    }

    #[test]
    fn test_terminal_states_admit_nothing() {
        for current in [Baja, Robo] {
            for target in DeviceStatus::all() {
                if target == current {
                    continue;
                }
                assert_eq!(
                    plan_status_change(current, target, false),
                    Err(TransitionError::Terminal { current })
                );
            }
        }
    }

    #[test]
    fn test_every_pair_outside_the_table_fails() {
        for from in DeviceStatus::all() {
            for to in DeviceStatus::all() {
                if from == to || from.is_terminal() {
                    continue;
                }
                let result = plan_status_change(from, to, from == Mantenimiento && to == Asignado);
                if is_transition_allowed(from, to) {
                    assert!(result.is_ok(), "{from} -> {to} should be allowed");
                } else {
                    assert_eq!(
                        result,
                        Err(TransitionError::NotAllowed { from, to }),
                        "{from} -> {to} should be rejected"
                    );
                }
            }
        }
    }

    #[test]
    fn test_disponible_transitions() {
        assert!(plan_status_change(Disponible, Asignado, false).unwrap().is_some());
        assert!(plan_status_change(Disponible, Mantenimiento, false).unwrap().is_some());
        assert!(plan_status_change(Disponible, Baja, false).unwrap().is_some());
        assert_eq!(
            plan_status_change(Disponible, Robo, false),
            Err(TransitionError::NotAllowed {
                from: Disponible,
                to: Robo
            })
        );
    }

    #[test]
    fn test_terminal_target_requires_resolved_assignment() {
        assert_eq!(
            plan_status_change(Asignado, Robo, true),
            Err(TransitionError::UnresolvedAssignment { target: Robo })
        );
        assert_eq!(
            plan_status_change(Asignado, Baja, true),
            Err(TransitionError::UnresolvedAssignment { target: Baja })
        );
        // Resolved atomically by the caller's cascade.
        assert!(plan_status_change(Asignado, Robo, false).unwrap().is_some());
    }

    #[test]
    fn test_return_from_urgent_maintenance_needs_active_assignment() {
        assert!(plan_status_change(Mantenimiento, Asignado, true).unwrap().is_some());
        assert_eq!(
            plan_status_change(Mantenimiento, Asignado, false),
            Err(TransitionError::NotAllowed {
                from: Mantenimiento,
                to: Asignado
            })
        );
    }
}
