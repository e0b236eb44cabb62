use super::templates::{friday_block_window, saturday_block_window};
use super::{util, BlockAssignment, EngineOptions, GenerationReport, SchedError};
use crate::directory::Directory;
use crate::ledger::Ledger;
use crate::model::{
    Assignee, Department, DutyKind, EmployeeId, InstanceId, ShiftInstance, ShiftTemplate,
    TemplateId, TemplateRule, TimeWindow, CLOSED_WEEKDAY,
};
use chrono::{Datelike, NaiveDate, Weekday};
use tracing::{debug, info};

/// Jours ouverts de `[start, end]` (le mardi est retiré).
fn open_days(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    std::iter::successors(Some(start), |d| d.succ_opt())
        .take_while(move |d| *d <= end)
        .filter(|d| d.weekday() != CLOSED_WEEKDAY)
}

/// Développe un gabarit sur `[start, end]`, sans jamais dupliquer une
/// instance `(gabarit, date, employé)` existante.
pub(super) fn generate(
    ledger: &mut Ledger,
    directory: &dyn Directory,
    opts: EngineOptions,
    id: &TemplateId,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<GenerationReport, SchedError> {
    if end < start {
        return Err(SchedError::validation("end date must be after start date"));
    }
    let span = end.signed_duration_since(start).num_days();
    if span > i64::from(opts.horizon_days) {
        return Err(SchedError::validation(format!(
            "range of {span} days exceeds the {} days horizon",
            opts.horizon_days
        )));
    }

    let template = ledger
        .template(id)
        .filter(|t| t.active)
        .cloned()
        .ok_or_else(|| SchedError::not_found("template", id))?;

    let mut report = GenerationReport::default();
    match &template.rule {
        TemplateRule::Fixed { assignees } => {
            for assignee in assignees {
                util::ensure_eligible(directory, assignee.employee, DutyKind::Fixed)?;
            }
            expand_fixed(ledger, &template, assignees, start, end, &mut report)?;
        }
        TemplateRule::SundayRotation { rotation } => {
            for employee in rotation {
                util::ensure_eligible(directory, *employee, DutyKind::SundayRotation)?;
            }
            expand_sunday(ledger, &template, rotation, start, end, &mut report)?;
        }
        TemplateRule::RotatingBlock => {
            debug!(template = %id, "rotating block templates are assigned, not expanded");
        }
    }

    info!(
        template = %id,
        %start,
        %end,
        created = report.created.len(),
        skipped = report.skipped,
        "template expanded"
    );
    Ok(report)
}

fn expand_fixed(
    ledger: &mut Ledger,
    template: &ShiftTemplate,
    assignees: &[Assignee],
    start: NaiveDate,
    end: NaiveDate,
    report: &mut GenerationReport,
) -> Result<(), SchedError> {
    for day in open_days(start, end).filter(|d| d.weekday() == template.weekday) {
        for assignee in assignees {
            if ledger
                .find_instance(Some(&template.id), day, assignee.employee)
                .is_some()
            {
                report.skipped += 1;
                continue;
            }
            let instance = ShiftInstance::new(
                day,
                template.department,
                assignee.window.unwrap_or(template.window),
                assignee.employee,
                DutyKind::Fixed,
                Some(template.id.clone()),
            );
            debug!(instance = %instance.id, %day, employee = %assignee.employee, "fixed instance");
            report.created.push(instance.id.clone());
            ledger.insert_instance(instance)?;
        }
    }
    Ok(())
}

/// La rotation reprend après l'employé de la dernière instance antérieure
/// à `start` ; un dimanche déjà couvert recale le curseur sans rien créer.
fn expand_sunday(
    ledger: &mut Ledger,
    template: &ShiftTemplate,
    rotation: &[EmployeeId],
    start: NaiveDate,
    end: NaiveDate,
    report: &mut GenerationReport,
) -> Result<(), SchedError> {
    if rotation.is_empty() {
        return Err(SchedError::validation(format!(
            "template {} has an empty rotation",
            template.id
        )));
    }
    let total = rotation.len();
    let after = |employee: EmployeeId| {
        rotation
            .iter()
            .position(|e| *e == employee)
            .map(|idx| (idx + 1) % total)
    };

    let mut cursor = ledger
        .last_instance_before(&template.id, start)
        .and_then(|last| after(last.employee))
        .unwrap_or(0);

    for day in open_days(start, end).filter(|d| d.weekday() == Weekday::Sun) {
        let existing = ledger
            .instances_for_template(&template.id)
            .find(|i| i.date == day)
            .map(|i| i.employee);
        if let Some(employee) = existing {
            cursor = after(employee).unwrap_or(cursor);
            report.skipped += 1;
            continue;
        }

        let employee = rotation[cursor];
        let instance = ShiftInstance::new(
            day,
            template.department,
            template.window,
            employee,
            DutyKind::SundayRotation,
            Some(template.id.clone()),
        );
        debug!(instance = %instance.id, %day, %employee, "sunday instance");
        report.created.push(instance.id.clone());
        ledger.insert_instance(instance)?;
        cursor = (cursor + 1) % total;
    }
    Ok(())
}

/// Crée la paire vendredi 13:00-16:00 + samedi 09:00-11:00, ou rien si
/// l'employé tient déjà ce bloc.
pub(super) fn assign_rotating_block(
    ledger: &mut Ledger,
    directory: &dyn Directory,
    friday: NaiveDate,
    department: Department,
    employee: EmployeeId,
    template: Option<&TemplateId>,
) -> Result<BlockAssignment, SchedError> {
    if friday.weekday() != Weekday::Fri {
        return Err(SchedError::validation(format!(
            "rotating block must start on a Friday, got {friday}"
        )));
    }
    util::ensure_eligible(directory, employee, DutyKind::RotatingBlock)?;
    if let Some(id) = template {
        let t = ledger
            .template(id)
            .filter(|t| t.active)
            .ok_or_else(|| SchedError::not_found("template", id))?;
        if t.kind() != DutyKind::RotatingBlock || t.department != department {
            return Err(SchedError::validation(format!(
                "template {id} is not a rotating block of department {department}"
            )));
        }
    }
    let saturday = friday
        .succ_opt()
        .ok_or_else(|| SchedError::validation("date overflow"))?;

    let existing = ledger
        .instances()
        .iter()
        .find(|i| {
            i.kind == DutyKind::RotatingBlock
                && i.date == friday
                && i.department == department
                && i.employee == employee
        })
        .cloned();
    if let Some(fri) = existing {
        let Some(sat) = util::block_partner(ledger, &fri) else {
            return Err(SchedError::State(format!(
                "rotating block {} has no Saturday half",
                fri.id
            )));
        };
        return Ok(BlockAssignment {
            friday: fri.id,
            saturday: sat.id,
            created: false,
        });
    }

    let mut fri = ShiftInstance::new(
        friday,
        department,
        friday_block_window(),
        employee,
        DutyKind::RotatingBlock,
        template.cloned(),
    );
    let mut sat = ShiftInstance::new(
        saturday,
        department,
        saturday_block_window(),
        employee,
        DutyKind::RotatingBlock,
        template.cloned(),
    );
    fri.partner = Some(sat.id.clone());
    sat.partner = Some(fri.id.clone());

    let out = BlockAssignment {
        friday: fri.id.clone(),
        saturday: sat.id.clone(),
        created: true,
    };
    ledger.insert_instance(fri)?;
    ledger.insert_instance(sat)?;
    info!(%friday, %department, %employee, "rotating block assigned");
    Ok(out)
}

pub(super) fn create_manual(
    ledger: &mut Ledger,
    directory: &dyn Directory,
    date: NaiveDate,
    department: Department,
    window: TimeWindow,
    employee: EmployeeId,
    kind: DutyKind,
) -> Result<InstanceId, SchedError> {
    util::ensure_open_day(date)?;
    if kind == DutyKind::RotatingBlock {
        return Err(SchedError::validation(
            "rotating block instances are created in pairs by assign_rotating_block",
        ));
    }
    if window.end <= window.start {
        return Err(SchedError::validation(format!("invalid time window {window}")));
    }
    util::ensure_eligible(directory, employee, kind)?;

    let instance = ShiftInstance::new(date, department, window, employee, kind, None);
    let id = instance.id.clone();
    ledger.insert_instance(instance)?;
    info!(instance = %id, %date, %employee, "manual instance created");
    Ok(id)
}

/// Modification manuelle ; les deux moitiés d'un bloc gardent le même employé.
pub(super) fn update_instance(
    ledger: &mut Ledger,
    directory: &dyn Directory,
    id: &InstanceId,
    window: Option<TimeWindow>,
    employee: Option<EmployeeId>,
) -> Result<(), SchedError> {
    let current = util::load_instance(ledger, id)?;
    let partner = util::block_partner(ledger, &current);
    let mut updated = current.clone();

    if let Some(window) = window {
        if current.kind == DutyKind::RotatingBlock {
            return Err(SchedError::validation("rotating block hours are fixed"));
        }
        if window.end <= window.start {
            return Err(SchedError::validation(format!("invalid time window {window}")));
        }
        updated.window = window;
    }
    if let Some(employee) = employee {
        util::ensure_eligible(directory, employee, current.kind)?;
        updated.employee = employee;
    }
    let mut batch = vec![updated];
    if let (Some(mut partner), Some(employee)) = (partner, employee) {
        partner.employee = employee;
        batch.push(partner);
    }
    ledger.update_instances(batch)?;
    info!(instance = %id, "instance updated");
    Ok(())
}

pub(super) fn delete_instance(
    ledger: &mut Ledger,
    id: &InstanceId,
) -> Result<Vec<InstanceId>, SchedError> {
    let current = util::load_instance(ledger, id)?;
    let mut removed = vec![current.id.clone()];
    if let Some(partner) = util::block_partner(ledger, &current) {
        removed.push(partner.id);
    }
    for instance in &removed {
        ledger.purge_exceptions(instance);
        ledger.remove_instance(instance);
    }
    info!(instance = %id, removed = removed.len(), "instance deleted");
    Ok(removed)
}
