use super::{util, SchedError};
use crate::directory::Directory;
use crate::ledger::Ledger;
use crate::model::{ActorId, DutyKind, EmployeeId, InstanceId, ShiftInstance, ShiftSwap, SwapId};
use chrono::Utc;
use tracing::{info, warn};

/// Un bloc tournant ne s'échange qu'avec un autre bloc tournant.
fn ensure_compatible(
    ledger: &Ledger,
    a: &ShiftInstance,
    b: &ShiftInstance,
) -> Result<(), SchedError> {
    let a_block = a.kind == DutyKind::RotatingBlock;
    let b_block = b.kind == DutyKind::RotatingBlock;
    if a_block != b_block {
        return Err(SchedError::validation(format!(
            "cannot swap {} duty with {} duty",
            a.kind, b.kind
        )));
    }
    if a_block && util::block_partner(ledger, a).is_some_and(|p| p.id == b.id) {
        return Err(SchedError::validation(
            "both instances belong to the same rotating block",
        ));
    }
    Ok(())
}

fn load_pair(
    ledger: &Ledger,
    a: &InstanceId,
    b: &InstanceId,
) -> Result<(ShiftInstance, ShiftInstance), SchedError> {
    if a == b {
        return Err(SchedError::validation("cannot swap an instance with itself"));
    }
    let ia = util::load_instance(ledger, a)?;
    let ib = util::load_instance(ledger, b)?;
    ensure_compatible(ledger, &ia, &ib)?;
    Ok((ia, ib))
}

/// Place `employee_b` sur A et `employee_a` sur B ; les moitiés de bloc
/// suivent leur instance. Le lot est écrit d'un coup, pour que deux
/// instances d'un même gabarit et d'un même jour puissent s'échanger.
fn exchange(
    ledger: &mut Ledger,
    directory: &dyn Directory,
    a: &InstanceId,
    b: &InstanceId,
    employee_a: EmployeeId,
    employee_b: EmployeeId,
) -> Result<(), SchedError> {
    let (ia, ib) = load_pair(ledger, a, b)?;
    util::ensure_eligible(directory, employee_b, ia.kind)?;
    util::ensure_eligible(directory, employee_a, ib.kind)?;

    let partner_a = util::block_partner(ledger, &ia);
    let partner_b = util::block_partner(ledger, &ib);

    let moves = [
        (Some(ia), employee_b),
        (partner_a, employee_b),
        (Some(ib), employee_a),
        (partner_b, employee_a),
    ];
    let batch = moves
        .into_iter()
        .filter_map(|(instance, employee)| {
            let mut instance = instance?;
            instance.employee = employee;
            instance.has_swap = true;
            Some(instance)
        })
        .collect();
    ledger.update_instances(batch)?;
    Ok(())
}

pub(super) fn create(
    ledger: &mut Ledger,
    directory: &dyn Directory,
    a: &InstanceId,
    b: &InstanceId,
    note: &str,
    actor: ActorId,
) -> Result<SwapId, SchedError> {
    let (ia, ib) = load_pair(ledger, a, b)?;
    util::ensure_eligible(directory, ib.employee, ia.kind)?;
    util::ensure_eligible(directory, ia.employee, ib.kind)?;

    let swap = ShiftSwap {
        id: SwapId::random(),
        instance_a: ia.id,
        instance_b: ib.id,
        original_employee_a: ia.employee,
        original_employee_b: ib.employee,
        note: note.to_string(),
        created_by: actor,
        created_at: Utc::now(),
        approved: false,
        approved_at: None,
    };
    let id = swap.id.clone();
    ledger.insert_swap(swap);
    info!(swap = %id, "swap requested");
    Ok(id)
}

/// Transition unique : une seconde approbation est une erreur d'état.
pub(super) fn approve(
    ledger: &mut Ledger,
    directory: &dyn Directory,
    id: &SwapId,
) -> Result<(), SchedError> {
    let swap = ledger
        .swap(id)
        .cloned()
        .ok_or_else(|| SchedError::not_found("swap", id))?;
    if swap.approved {
        warn!(swap = %id, "swap already approved");
        return Err(SchedError::State(format!("swap {id} is already approved")));
    }

    exchange(
        ledger,
        directory,
        &swap.instance_a,
        &swap.instance_b,
        swap.original_employee_a,
        swap.original_employee_b,
    )?;

    if let Some(stored) = ledger.swap_mut(id) {
        stored.approved = true;
        stored.approved_at = Some(Utc::now());
    }
    info!(swap = %id, "swap approved");
    Ok(())
}

/// Échange direct, enregistré déjà approuvé.
pub(super) fn immediate(
    ledger: &mut Ledger,
    directory: &dyn Directory,
    a: &InstanceId,
    b: &InstanceId,
    note: &str,
    actor: ActorId,
) -> Result<SwapId, SchedError> {
    let (ia, ib) = load_pair(ledger, a, b)?;
    exchange(ledger, directory, a, b, ia.employee, ib.employee)?;

    let now = Utc::now();
    let swap = ShiftSwap {
        id: SwapId::random(),
        instance_a: ia.id,
        instance_b: ib.id,
        original_employee_a: ia.employee,
        original_employee_b: ib.employee,
        note: note.to_string(),
        created_by: actor,
        created_at: now,
        approved: true,
        approved_at: Some(now),
    };
    let id = swap.id.clone();
    ledger.insert_swap(swap);
    info!(swap = %id, "immediate swap applied");
    Ok(id)
}

pub(super) fn cancel(ledger: &mut Ledger, id: &SwapId) -> Result<(), SchedError> {
    let swap = ledger
        .swap(id)
        .ok_or_else(|| SchedError::not_found("swap", id))?;
    if swap.approved {
        return Err(SchedError::State(format!(
            "swap {id} is already approved and cannot be cancelled"
        )));
    }
    ledger.remove_swap(id);
    info!(swap = %id, "swap cancelled");
    Ok(())
}
