use super::{EffectiveShift, MonthKey, SchedError};
use crate::ledger::Ledger;
use crate::model::{Department, DutyKind, InstanceId, ShiftException, ShiftInstance};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// Superpose l'exception active (si elle existe) à l'instance. L'instance
/// elle-même n'est jamais modifiée.
pub fn effective(instance: &ShiftInstance, active: Option<&ShiftException>) -> EffectiveShift {
    let base = EffectiveShift {
        instance: instance.id.clone(),
        date: instance.date,
        weekday: instance.weekday,
        department: instance.department,
        window: instance.window,
        employee: instance.employee,
        kind: instance.kind,
        template: instance.template.clone(),
        exception: None,
        scheduled_employee: instance.employee,
        has_swap: instance.has_swap,
        note: None,
    };
    match active.filter(|e| e.active) {
        Some(exception) => EffectiveShift {
            date: exception.date,
            weekday: exception.date.weekday(),
            department: exception.department,
            window: exception.window,
            employee: exception.employee,
            exception: Some(exception.id.clone()),
            note: Some(exception.note.clone()).filter(|n| !n.is_empty()),
            ..base
        },
        None => base,
    }
}

pub(super) fn effective_instance(
    ledger: &Ledger,
    id: &InstanceId,
) -> Result<EffectiveShift, SchedError> {
    let instance = ledger
        .instance(id)
        .ok_or_else(|| SchedError::not_found("instance", id))?;
    Ok(effective(instance, ledger.active_exception(id)))
}

/// Services effectifs de `[from, to]` (date et service lus après
/// application de l'exception active), regroupés par mois.
pub(super) fn list_instances(
    ledger: &Ledger,
    from: NaiveDate,
    to: NaiveDate,
    department: Option<Department>,
    kind: Option<DutyKind>,
) -> BTreeMap<MonthKey, Vec<EffectiveShift>> {
    let mut shifts: Vec<EffectiveShift> = ledger
        .instances()
        .iter()
        .filter(|i| kind.map_or(true, |k| i.kind == k))
        .map(|i| effective(i, ledger.active_exception(&i.id)))
        .filter(|s| s.date >= from && s.date <= to)
        .filter(|s| department.map_or(true, |d| s.department == d))
        .collect();
    shifts.sort_by(|a, b| {
        (a.date, a.window.start, a.department)
            .cmp(&(b.date, b.window.start, b.department))
            .then_with(|| a.employee.cmp(&b.employee))
    });

    let mut out: BTreeMap<MonthKey, Vec<EffectiveShift>> = BTreeMap::new();
    for shift in shifts {
        let key = MonthKey {
            year: shift.date.year(),
            month: shift.date.month(),
        };
        out.entry(key).or_default().push(shift);
    }
    out
}
