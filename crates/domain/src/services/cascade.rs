//! Lifecycle cascade planning.
//!
//! Creating an assignment or a return, or reporting a device lost or retired,
//! ripples across the device, the originating request and the assignment
//! itself. The planners here compute those cross-entity effects as plain
//! data; the persistence layer executes a plan inside one transaction so the
//! whole cascade commits or none of it does.
//!
//! Cascades against a device already in a terminal state are tolerated: the
//! device step is skipped and reported back as a warning instead of failing
//! the operation.

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Assignment, Device, DeviceCondition, DeviceSnapshot, DeviceStatus, LetterStatus, RequestStatus,
};
use crate::services::status_machine::{plan_status_change, StatusTransition, TransitionError};

/// Rejection reasons for lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("device {device_id} is not available for assignment (status {status})")]
    DeviceUnavailable {
        device_id: Uuid,
        status: DeviceStatus,
    },

    #[error("assignment {assignment_id} is not active")]
    AssignmentNotActive { assignment_id: Uuid },

    #[error("assignment {assignment_id} already has a return")]
    ReturnAlreadyExists { assignment_id: Uuid },

    #[error("return date {return_date} is before the delivery date {delivery_date}")]
    ReturnDateBeforeDelivery {
        return_date: NaiveDate,
        delivery_date: NaiveDate,
    },

    #[error("letter for assignment {assignment_id} is {status}, not pending signature")]
    LetterNotPending {
        assignment_id: Uuid,
        status: LetterStatus,
    },

    #[error("device {device_id} has no active assignment")]
    NoActiveAssignment { device_id: Uuid },

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Effects of creating an `ACTIVA` assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentCascade {
    /// Device transition to apply, when the device is not already assigned.
    pub device_transition: Option<StatusTransition>,

    /// Whether the referenced request must be flipped to `COMPLETADA`.
    pub complete_request: bool,

    /// Set when the device sits in a terminal state: the device step is
    /// skipped and a warning logged instead of failing the creation.
    pub skipped_terminal_status: Option<DeviceStatus>,
}

/// Plans the cascade for creating an assignment.
///
/// `has_active_assignment` is the device's current unresolved assignment
/// count, evaluated under the device row lock so two concurrent creations
/// cannot both pass the availability check.
pub fn plan_assignment_creation(
    device_id: Uuid,
    device_status: DeviceStatus,
    has_active_assignment: bool,
    request_status: Option<RequestStatus>,
) -> Result<AssignmentCascade, LifecycleError> {
    if has_active_assignment || device_status == DeviceStatus::Asignado {
        return Err(LifecycleError::DeviceUnavailable {
            device_id,
            status: device_status,
        });
    }

    // Tolerated: the original system allows closing paperwork against a
    // device already lost or retired. The device keeps its terminal state.
    let (device_transition, skipped_terminal_status) = if device_status.is_terminal() {
        (None, Some(device_status))
    } else {
        // The assignment being created satisfies the active-assignment
        // condition of the MANTENIMIENTO -> ASIGNADO edge.
        (
            plan_status_change(device_status, DeviceStatus::Asignado, true)?,
            None,
        )
    };

    Ok(AssignmentCascade {
        device_transition,
        complete_request: request_status == Some(RequestStatus::Pendiente),
        skipped_terminal_status,
    })
}

/// Effects of filing a return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnCascade {
    /// Device transition mapped from the returned condition, `None` when the
    /// device is already in the target state.
    pub device_transition: Option<StatusTransition>,

    /// Set when the device sits in a terminal state: the device step is
    /// skipped, the assignment still finalizes.
    pub skipped_terminal_status: Option<DeviceStatus>,
}

/// State a return is planned against, read under the device row lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnContext {
    pub assignment_id: Uuid,
    pub assignment_active: bool,
    pub has_existing_return: bool,
    pub delivery_date: NaiveDate,
    pub return_date: NaiveDate,
    pub condition: DeviceCondition,
    pub device_status: DeviceStatus,
}

/// Plans the cascade for filing a return against an assignment.
pub fn plan_return_creation(ctx: ReturnContext) -> Result<ReturnCascade, LifecycleError> {
    if !ctx.assignment_active {
        return Err(LifecycleError::AssignmentNotActive {
            assignment_id: ctx.assignment_id,
        });
    }
    if ctx.has_existing_return {
        return Err(LifecycleError::ReturnAlreadyExists {
            assignment_id: ctx.assignment_id,
        });
    }
    if ctx.return_date < ctx.delivery_date {
        return Err(LifecycleError::ReturnDateBeforeDelivery {
            return_date: ctx.return_date,
            delivery_date: ctx.delivery_date,
        });
    }

    let target = ctx.condition.target_device_status();
    let (device_transition, skipped_terminal_status) = if ctx.device_status.is_terminal() {
        (None, Some(ctx.device_status))
    } else {
        // The assignment finalizes in the same transaction, so the device no
        // longer counts an unresolved active assignment.
        (plan_status_change(ctx.device_status, target, false)?, None)
    };

    Ok(ReturnCascade {
        device_transition,
        skipped_terminal_status,
    })
}

/// An assignment to finalize as part of a loss/retirement cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizeAssignment {
    pub assignment_id: Uuid,
    /// Full replacement notes text with the automatic timestamped line
    /// appended.
    pub notes: String,
    pub return_date: NaiveDate,
}

/// Effects of reporting a device lost (`ROBO`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LossCascade {
    pub device_transition: StatusTransition,
    pub finalize: FinalizeAssignment,
    /// Snapshot captured at the moment of the terminal transition, embedded
    /// into the assignment's discount data.
    pub snapshot: DeviceSnapshot,
}

/// Plans the loss (`ROBO`) cascade.
///
/// Requires an active assignment: the loss is reported through the employee
/// responsibility process, and the snapshot must land in that assignment's
/// discount data before the device can ever be removed from the catalog.
pub fn plan_device_loss(
    device: &Device,
    active_assignment: Option<&Assignment>,
    now: DateTime<Utc>,
    context: &str,
) -> Result<LossCascade, LifecycleError> {
    let assignment = active_assignment.ok_or(LifecycleError::NoActiveAssignment {
        device_id: device.id,
    })?;

    let device_transition = match plan_status_change(device.status, DeviceStatus::Robo, false)? {
        Some(transition) => transition,
        // A same-status no-op here means the device is already ROBO.
        None => {
            return Err(LifecycleError::Transition(TransitionError::Terminal {
                current: device.status,
            }))
        }
    };

    let note = format!("Assignment closed automatically: device reported as ROBO. {context}");
    Ok(LossCascade {
        device_transition,
        finalize: FinalizeAssignment {
            assignment_id: assignment.id,
            notes: assignment.appended_note(now, &note),
            return_date: now.date_naive(),
        },
        snapshot: device.snapshot(),
    })
}

/// Effects of retiring a device (`BAJA`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetirementCascade {
    /// `None` when the device is already retired (idempotent no-op).
    pub device_transition: Option<StatusTransition>,
    pub finalize: Option<FinalizeAssignment>,
}

/// Plans the retirement (`BAJA`) cascade.
///
/// Allowed from `DISPONIBLE`, `ASIGNADO` and `MANTENIMIENTO`; an active
/// assignment is finalized as part of the same operation.
pub fn plan_device_retirement(
    device: &Device,
    active_assignment: Option<&Assignment>,
    now: DateTime<Utc>,
    reason: &str,
) -> Result<RetirementCascade, LifecycleError> {
    let device_transition = plan_status_change(device.status, DeviceStatus::Baja, false)?;

    let finalize = active_assignment.map(|assignment| {
        let note = format!("Assignment closed automatically: device retired (BAJA). {reason}");
        FinalizeAssignment {
            assignment_id: assignment.id,
            notes: assignment.appended_note(now, &note),
            return_date: now.date_naive(),
        }
    });

    Ok(RetirementCascade {
        device_transition,
        finalize,
    })
}

/// Validates that an assignment's delivery letter can be signed.
pub fn plan_letter_signature(
    assignment_id: Uuid,
    assignment_active: bool,
    letter_status: LetterStatus,
) -> Result<(), LifecycleError> {
    if !assignment_active {
        return Err(LifecycleError::AssignmentNotActive { assignment_id });
    }
    if letter_status != LetterStatus::Pendiente {
        return Err(LifecycleError::LetterNotPending {
            assignment_id,
            status: letter_status,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssignmentStatus, DeliveryType, DeviceType};
    use chrono::TimeZone;

    fn device(status: DeviceStatus) -> Device {
        Device {
            id: Uuid::new_v4(),
            device_type: DeviceType::Laptop,
            brand: "Lenovo".to_string(),
            model: Some("ThinkPad T14".to_string()),
            serial_number: Some("PF-3XK1T9".to_string()),
            imei: None,
            phone_number: None,
            invoice_number: None,
            branch_id: Uuid::new_v4(),
            intake_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            initial_value: None,
            depreciated_value: None,
            manual_value: false,
            status,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn active_assignment(device_id: Uuid) -> Assignment {
        Assignment {
            id: Uuid::new_v4(),
            request_id: None,
            employee_id: Uuid::new_v4(),
            device_id,
            delivery_type: DeliveryType::Permanente,
            delivery_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            return_date: None,
            letter_status: LetterStatus::Pendiente,
            letter_signed_at: None,
            letter_signed_by: None,
            status: AssignmentStatus::Activa,
            notes: None,
            discount_data: None,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap()
    }

    fn return_ctx(device_status: DeviceStatus) -> ReturnContext {
        ReturnContext {
            assignment_id: Uuid::new_v4(),
            assignment_active: true,
            has_existing_return: false,
            delivery_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            return_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            condition: DeviceCondition::Optimo,
            device_status,
        }
    }

    #[test]
    fn test_assignment_from_available_device() {
        let cascade = plan_assignment_creation(
            Uuid::new_v4(),
            DeviceStatus::Disponible,
            false,
            Some(RequestStatus::Pendiente),
        )
        .unwrap();

        assert_eq!(
            cascade.device_transition,
            Some(StatusTransition {
                from: DeviceStatus::Disponible,
                to: DeviceStatus::Asignado,
            })
        );
        assert!(cascade.complete_request);
        assert!(cascade.skipped_terminal_status.is_none());
    }

    #[test]
    fn test_assignment_completes_only_pending_requests() {
        for (status, expected) in [
            (Some(RequestStatus::Pendiente), true),
            (Some(RequestStatus::Aprobada), false),
            (Some(RequestStatus::Completada), false),
            (None, false),
        ] {
            let cascade =
                plan_assignment_creation(Uuid::new_v4(), DeviceStatus::Disponible, false, status)
                    .unwrap();
            assert_eq!(cascade.complete_request, expected, "status {status:?}");
        }
    }

    #[test]
    fn test_assignment_rejected_when_device_unavailable() {
        // The race guard: the loser of two concurrent creations observes the
        // device assigned (or its active assignment) under the row lock.
        let device_id = Uuid::new_v4();
        let err = plan_assignment_creation(device_id, DeviceStatus::Asignado, true, None)
            .unwrap_err();
        assert_eq!(
            err,
            LifecycleError::DeviceUnavailable {
                device_id,
                status: DeviceStatus::Asignado,
            }
        );

        // Stale device row with an active assignment still counts as taken.
        let err = plan_assignment_creation(device_id, DeviceStatus::Disponible, true, None)
            .unwrap_err();
        assert!(matches!(err, LifecycleError::DeviceUnavailable { .. }));
    }

    #[test]
    fn test_assignment_against_terminal_device_is_tolerated() {
        let cascade =
            plan_assignment_creation(Uuid::new_v4(), DeviceStatus::Baja, false, None).unwrap();
        assert!(cascade.device_transition.is_none());
        assert_eq!(cascade.skipped_terminal_status, Some(DeviceStatus::Baja));
    }

    #[test]
    fn test_assignment_during_urgent_maintenance_reassigns() {
        let cascade =
            plan_assignment_creation(Uuid::new_v4(), DeviceStatus::Mantenimiento, false, None)
                .unwrap();
        assert_eq!(
            cascade.device_transition,
            Some(StatusTransition {
                from: DeviceStatus::Mantenimiento,
                to: DeviceStatus::Asignado,
            })
        );
    }

    #[test]
    fn test_return_normal_flow() {
        let cascade = plan_return_creation(return_ctx(DeviceStatus::Asignado)).unwrap();

        assert_eq!(
            cascade.device_transition,
            Some(StatusTransition {
                from: DeviceStatus::Asignado,
                to: DeviceStatus::Disponible,
            })
        );
        assert!(cascade.skipped_terminal_status.is_none());
    }

    #[test]
    fn test_return_with_damage_routes_to_maintenance() {
        for condition in [DeviceCondition::ConDanos, DeviceCondition::NoFuncional] {
            let cascade = plan_return_creation(ReturnContext {
                condition,
                ..return_ctx(DeviceStatus::Asignado)
            })
            .unwrap();
            assert_eq!(
                cascade.device_transition.map(|t| t.to),
                Some(DeviceStatus::Mantenimiento)
            );
        }
    }

    #[test]
    fn test_return_rejections() {
        let id = Uuid::new_v4();

        let err = plan_return_creation(ReturnContext {
            assignment_id: id,
            assignment_active: false,
            ..return_ctx(DeviceStatus::Disponible)
        })
        .unwrap_err();
        assert_eq!(err, LifecycleError::AssignmentNotActive { assignment_id: id });

        let err = plan_return_creation(ReturnContext {
            assignment_id: id,
            has_existing_return: true,
            ..return_ctx(DeviceStatus::Asignado)
        })
        .unwrap_err();
        assert_eq!(err, LifecycleError::ReturnAlreadyExists { assignment_id: id });

        let early = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let ctx = ReturnContext {
            return_date: early,
            ..return_ctx(DeviceStatus::Asignado)
        };
        let err = plan_return_creation(ctx).unwrap_err();
        assert_eq!(
            err,
            LifecycleError::ReturnDateBeforeDelivery {
                return_date: early,
                delivery_date: ctx.delivery_date,
            }
        );
    }

    #[test]
    fn test_return_against_terminal_device_skips_device_step() {
        // Stale assignment against a retired device: the return succeeds and
        // finalizes the assignment, the device stays BAJA.
        let cascade = plan_return_creation(return_ctx(DeviceStatus::Baja)).unwrap();
        assert!(cascade.device_transition.is_none());
        assert_eq!(cascade.skipped_terminal_status, Some(DeviceStatus::Baja));
    }

    #[test]
    fn test_return_when_device_already_in_target_state() {
        // Urgent-maintenance device returned CON_DANOS: already MANTENIMIENTO.
        let cascade = plan_return_creation(ReturnContext {
            condition: DeviceCondition::ConDanos,
            ..return_ctx(DeviceStatus::Mantenimiento)
        })
        .unwrap();
        assert!(cascade.device_transition.is_none());
        assert!(cascade.skipped_terminal_status.is_none());
    }

    #[test]
    fn test_loss_requires_active_assignment() {
        let d = device(DeviceStatus::Asignado);
        let err = plan_device_loss(&d, None, now(), "stolen from vehicle").unwrap_err();
        assert_eq!(err, LifecycleError::NoActiveAssignment { device_id: d.id });
    }

    #[test]
    fn test_loss_captures_snapshot_and_finalizes() {
        let d = device(DeviceStatus::Asignado);
        let a = active_assignment(d.id);
        let cascade = plan_device_loss(&d, Some(&a), now(), "stolen from vehicle").unwrap();

        assert_eq!(cascade.device_transition.to, DeviceStatus::Robo);
        assert_eq!(cascade.finalize.assignment_id, a.id);
        assert_eq!(cascade.finalize.return_date, now().date_naive());
        assert!(cascade.finalize.notes.contains("reported as ROBO"));
        assert!(cascade.finalize.notes.contains("stolen from vehicle"));
        assert_eq!(cascade.snapshot, d.snapshot());
    }

    #[test]
    fn test_loss_from_terminal_device_fails() {
        let d = device(DeviceStatus::Robo);
        let a = active_assignment(d.id);
        let err = plan_device_loss(&d, Some(&a), now(), "duplicate report").unwrap_err();
        assert_eq!(
            err,
            LifecycleError::Transition(TransitionError::Terminal {
                current: DeviceStatus::Robo
            })
        );
    }

    #[test]
    fn test_retirement_finalizes_active_assignment() {
        let d = device(DeviceStatus::Asignado);
        let a = active_assignment(d.id);
        let cascade = plan_device_retirement(&d, Some(&a), now(), "warranty expired").unwrap();

        assert_eq!(
            cascade.device_transition.map(|t| t.to),
            Some(DeviceStatus::Baja)
        );
        let finalize = cascade.finalize.unwrap();
        assert_eq!(finalize.assignment_id, a.id);
        assert!(finalize.notes.contains("retired (BAJA)"));
        assert!(finalize.notes.contains("warranty expired"));
    }

    #[test]
    fn test_retirement_from_available_device() {
        let d = device(DeviceStatus::Disponible);
        let cascade = plan_device_retirement(&d, None, now(), "obsolete").unwrap();
        assert!(cascade.device_transition.is_some());
        assert!(cascade.finalize.is_none());
    }

    #[test]
    fn test_retirement_already_retired_is_noop() {
        let d = device(DeviceStatus::Baja);
        let cascade = plan_device_retirement(&d, None, now(), "again").unwrap();
        assert!(cascade.device_transition.is_none());
        assert!(cascade.finalize.is_none());
    }

    #[test]
    fn test_retirement_of_stolen_device_fails() {
        let d = device(DeviceStatus::Robo);
        let err = plan_device_retirement(&d, None, now(), "cleanup").unwrap_err();
        assert_eq!(
            err,
            LifecycleError::Transition(TransitionError::Terminal {
                current: DeviceStatus::Robo
            })
        );
    }

    #[test]
    fn test_letter_signature_rules() {
        let id = Uuid::new_v4();
        assert!(plan_letter_signature(id, true, LetterStatus::Pendiente).is_ok());
        assert_eq!(
            plan_letter_signature(id, false, LetterStatus::Pendiente).unwrap_err(),
            LifecycleError::AssignmentNotActive { assignment_id: id }
        );
        assert_eq!(
            plan_letter_signature(id, true, LetterStatus::Firmada).unwrap_err(),
            LifecycleError::LetterNotPending {
                assignment_id: id,
                status: LetterStatus::Firmada,
            }
        );
    }

    /// Full walk of the normal lifecycle at the planning level: available
    /// device, pending request, assignment, clean return.
    #[test]
    fn test_scenario_normal_flow() {
        let mut device_status = DeviceStatus::Disponible;
        let mut request_status = RequestStatus::Pendiente;
        let mut assignment_active = false;

        // Create assignment.
        let cascade = plan_assignment_creation(
            Uuid::new_v4(),
            device_status,
            assignment_active,
            Some(request_status),
        )
        .unwrap();
        if let Some(t) = cascade.device_transition {
            device_status = t.to;
        }
        if cascade.complete_request {
            request_status = RequestStatus::Completada;
        }
        assignment_active = true;

        assert_eq!(device_status, DeviceStatus::Asignado);
        assert_eq!(request_status, RequestStatus::Completada);

        // File return in optimal condition.
        let cascade = plan_return_creation(ReturnContext {
            assignment_active,
            return_date: NaiveDate::from_ymd_opt(2024, 8, 1).unwrap(),
            ..return_ctx(device_status)
        })
        .unwrap();
        assignment_active = false;
        if let Some(t) = cascade.device_transition {
            device_status = t.to;
        }

        assert_eq!(device_status, DeviceStatus::Disponible);
        assert!(!assignment_active);
    }
}
