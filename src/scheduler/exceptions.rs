use super::{util, ExceptionRequest, SchedError};
use crate::directory::Directory;
use crate::ledger::Ledger;
use crate::model::{ActorId, ExceptionId, ShiftException};
use chrono::Utc;
use tracing::{debug, info};

/// Enregistre un remplacement : les exceptions actives de l'instance sont
/// désactivées, la nouvelle devient la seule active.
pub(super) fn create(
    ledger: &mut Ledger,
    directory: &dyn Directory,
    request: ExceptionRequest,
    actor: ActorId,
) -> Result<ExceptionId, SchedError> {
    let instance = util::load_instance(ledger, &request.instance)?;
    util::ensure_open_day(request.date)?;
    if request.window.end <= request.window.start {
        return Err(SchedError::validation(format!(
            "invalid time window {}",
            request.window
        )));
    }
    util::ensure_eligible(directory, request.substitute, instance.kind)?;

    let replaced = ledger.deactivate_exceptions(&instance.id);
    if replaced > 0 {
        debug!(instance = %instance.id, replaced, "previous exceptions deactivated");
    }

    let exception = ShiftException {
        id: ExceptionId::random(),
        instance: instance.id.clone(),
        date: request.date,
        department: request.department,
        window: request.window,
        employee: request.substitute,
        note: request.note,
        created_by: actor,
        created_at: Utc::now(),
        active: true,
    };
    let id = exception.id.clone();
    ledger.insert_exception(exception);

    let mut flagged = instance;
    flagged.has_exception = true;
    let instance_id = flagged.id.clone();
    ledger.update_instance(flagged)?;

    info!(exception = %id, instance = %instance_id, substitute = %request.substitute, "exception created");
    Ok(id)
}

/// Désactive l'exception. Une exception déjà inactive est laissée telle
/// quelle et renvoie `false`.
pub(super) fn delete(ledger: &mut Ledger, id: &ExceptionId) -> Result<bool, SchedError> {
    let exception = ledger
        .exception_mut(id)
        .ok_or_else(|| SchedError::not_found("exception", id))?;
    if !exception.active {
        return Ok(false);
    }
    exception.active = false;
    let instance_id = exception.instance.clone();

    if ledger.active_exception(&instance_id).is_none() {
        if let Some(instance) = ledger.instance(&instance_id).cloned() {
            let mut cleared = instance;
            cleared.has_exception = false;
            ledger.update_instance(cleared)?;
        }
    }
    info!(exception = %id, instance = %instance_id, "exception deactivated");
    Ok(true)
}
