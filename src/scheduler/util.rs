use super::SchedError;
use crate::directory::Directory;
use crate::ledger::Ledger;
use crate::model::{DutyKind, EmployeeId, InstanceId, ShiftInstance, CLOSED_WEEKDAY};
use chrono::{Datelike, NaiveDate};

pub(super) fn ensure_open_day(date: NaiveDate) -> Result<(), SchedError> {
    if date.weekday() == CLOSED_WEEKDAY {
        return Err(SchedError::validation(format!(
            "{date} is a Tuesday: the library is closed"
        )));
    }
    Ok(())
}

/// Vérifie qu'un employé existe, est actif et peut tenir un service `kind`.
pub(super) fn ensure_eligible(
    directory: &dyn Directory,
    employee: EmployeeId,
    kind: DutyKind,
) -> Result<(), SchedError> {
    let found = directory
        .employee(employee)
        .ok_or_else(|| SchedError::not_found("employee", employee))?;
    if !found.active {
        return Err(SchedError::validation(format!(
            "employee {} ({}) is not active",
            employee, found.full_name
        )));
    }
    let allowed = match kind {
        DutyKind::Fixed => true,
        DutyKind::RotatingBlock => directory.is_eligible_for_rotating(employee),
        DutyKind::SundayRotation => directory.is_eligible_for_sunday(employee),
    };
    if !allowed {
        return Err(SchedError::validation(format!(
            "employee {} is not eligible for {} duty",
            employee, kind
        )));
    }
    Ok(())
}

pub(super) fn load_instance(ledger: &Ledger, id: &InstanceId) -> Result<ShiftInstance, SchedError> {
    ledger
        .instance(id)
        .cloned()
        .ok_or_else(|| SchedError::not_found("instance", id))
}

/// Autre moitié d'un bloc tournant : lien explicite, sinon le jour voisin
/// tenu par le même employé.
pub(super) fn block_partner(ledger: &Ledger, instance: &ShiftInstance) -> Option<ShiftInstance> {
    if instance.kind != DutyKind::RotatingBlock {
        return None;
    }
    if let Some(partner) = instance.partner.as_ref().and_then(|id| ledger.instance(id)) {
        return Some(partner.clone());
    }
    let neighbour = match instance.weekday {
        chrono::Weekday::Fri => instance.date.succ_opt()?,
        chrono::Weekday::Sat => instance.date.pred_opt()?,
        _ => return None,
    };
    ledger
        .instances()
        .iter()
        .find(|i| {
            i.kind == DutyKind::RotatingBlock
                && i.date == neighbour
                && i.department == instance.department
                && i.employee == instance.employee
        })
        .cloned()
}
