use super::{util, SchedError};
use crate::directory::Directory;
use crate::ledger::Ledger;
use crate::model::{
    Assignee, Department, DutyKind, EmployeeId, ShiftTemplate, TemplateId, TemplateRule,
    TimeWindow, CLOSED_WEEKDAY,
};
use chrono::{Utc, Weekday};
use tracing::info;

/// Créneau du vendredi d'un bloc tournant.
pub(super) fn friday_block_window() -> TimeWindow {
    TimeWindow::hm((13, 0), (16, 0))
}

/// Créneau du samedi d'un bloc tournant.
pub(super) fn saturday_block_window() -> TimeWindow {
    TimeWindow::hm((9, 0), (11, 0))
}

fn ensure_window(window: &TimeWindow) -> Result<(), SchedError> {
    if window.end <= window.start {
        return Err(SchedError::validation(format!(
            "invalid time window {window}: end must be after start"
        )));
    }
    Ok(())
}

pub(super) fn create_fixed(
    ledger: &mut Ledger,
    directory: &dyn Directory,
    department: Department,
    weekday: Weekday,
    window: TimeWindow,
    assignees: Vec<Assignee>,
) -> Result<TemplateId, SchedError> {
    if weekday == CLOSED_WEEKDAY {
        return Err(SchedError::validation(
            "fixed duty cannot be planned on Tuesday (closed day)",
        ));
    }
    if assignees.is_empty() {
        return Err(SchedError::validation(
            "fixed template requires at least one assignee",
        ));
    }
    ensure_window(&window)?;
    for assignee in &assignees {
        util::ensure_eligible(directory, assignee.employee, DutyKind::Fixed)?;
        if let Some(own) = assignee.window.as_ref() {
            ensure_window(own)?;
        }
    }

    let template = ShiftTemplate {
        id: TemplateId::random(),
        department,
        weekday,
        window,
        rule: TemplateRule::Fixed { assignees },
        active: true,
        created_at: Utc::now(),
    };
    let id = template.id.clone();
    info!(template = %id, %department, ?weekday, "fixed template created");
    ledger.insert_template(template);
    Ok(id)
}

/// Le jour est toujours ramené au dimanche, quelle que soit l'entrée.
pub(super) fn create_sunday_rotation(
    ledger: &mut Ledger,
    directory: &dyn Directory,
    department: Department,
    weekday: Weekday,
    window: TimeWindow,
    rotation: Vec<EmployeeId>,
) -> Result<TemplateId, SchedError> {
    if rotation.is_empty() {
        return Err(SchedError::validation(
            "sunday rotation requires at least one employee",
        ));
    }
    ensure_window(&window)?;
    for employee in &rotation {
        util::ensure_eligible(directory, *employee, DutyKind::SundayRotation)?;
    }
    if weekday != Weekday::Sun {
        tracing::debug!(?weekday, "sunday rotation weekday forced to Sunday");
    }

    let template = ShiftTemplate {
        id: TemplateId::random(),
        department,
        weekday: Weekday::Sun,
        window,
        rule: TemplateRule::SundayRotation { rotation },
        active: true,
        created_at: Utc::now(),
    };
    let id = template.id.clone();
    info!(template = %id, %department, "sunday rotation template created");
    ledger.insert_template(template);
    Ok(id)
}

pub(super) fn create_rotating_block(ledger: &mut Ledger, department: Department) -> TemplateId {
    let template = ShiftTemplate {
        id: TemplateId::random(),
        department,
        weekday: Weekday::Fri,
        window: friday_block_window(),
        rule: TemplateRule::RotatingBlock,
        active: true,
        created_at: Utc::now(),
    };
    let id = template.id.clone();
    info!(template = %id, %department, "rotating block template created");
    ledger.insert_template(template);
    id
}

/// Supprime toutes les instances du gabarit (et leurs exceptions), puis
/// désactive le gabarit.
pub(super) fn delete(ledger: &mut Ledger, id: &TemplateId) -> Result<usize, SchedError> {
    match ledger.template(id) {
        Some(t) if t.active => {}
        _ => return Err(SchedError::not_found("template", id)),
    }

    let doomed: Vec<_> = ledger
        .instances_for_template(id)
        .map(|i| i.id.clone())
        .collect();
    for instance in &doomed {
        ledger.purge_exceptions(instance);
        ledger.remove_instance(instance);
    }

    if let Some(template) = ledger.template_mut(id) {
        template.active = false;
    }
    info!(template = %id, removed = doomed.len(), "template deleted");
    Ok(doomed.len())
}
