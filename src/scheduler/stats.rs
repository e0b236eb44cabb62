use super::{EmployeeStatistics, HourBucket};
use crate::ledger::Ledger;
use crate::model::{DutyKind, EmployeeId};
use chrono::{Datelike, NaiveDate};

/// Période de référence des compteurs semaine / mois.
struct Period {
    year: i32,
    today: NaiveDate,
}

impl Period {
    fn same_week(&self, date: NaiveDate) -> bool {
        date.iso_week() == self.today.iso_week()
    }

    fn same_month(&self, date: NaiveDate) -> bool {
        date.year() == self.today.year() && date.month() == self.today.month()
    }
}

impl HourBucket {
    fn add(&mut self, hours: f64, date: NaiveDate, period: &Period) {
        if date.year() != period.year {
            return;
        }
        self.year += hours;
        self.count += 1;
        if period.same_month(date) {
            self.month += hours;
        }
        if period.same_week(date) {
            self.week += hours;
        }
    }
}

/// Heures travaillées de `employee` sur l'année `year`.
///
/// Une instance sans exception active compte pour son employé ; une
/// exception active compte pour le remplaçant, dans la catégorie de
/// l'instance d'origine.
pub(super) fn statistics(
    ledger: &Ledger,
    employee: EmployeeId,
    year: i32,
    today: NaiveDate,
) -> EmployeeStatistics {
    let period = Period { year, today };
    let mut out = EmployeeStatistics {
        employee,
        year,
        fixed: HourBucket::default(),
        rotating: HourBucket::default(),
        sunday: HourBucket::default(),
        total: HourBucket::default(),
    };

    let mut record = |kind: DutyKind, hours: f64, date: NaiveDate| {
        let bucket = match kind {
            DutyKind::Fixed => &mut out.fixed,
            DutyKind::RotatingBlock => &mut out.rotating,
            DutyKind::SundayRotation => &mut out.sunday,
        };
        bucket.add(hours, date, &period);
        out.total.add(hours, date, &period);
    };

    for instance in ledger
        .instances()
        .iter()
        .filter(|i| i.employee == employee && i.date.year() == year)
    {
        if ledger.active_exception(&instance.id).is_some() {
            continue;
        }
        record(instance.kind, instance.hours(), instance.date);
    }

    for exception in ledger
        .exceptions()
        .iter()
        .filter(|e| e.active && e.employee == employee && e.date.year() == year)
    {
        // l'exception ne porte pas de catégorie : celle de l'instance fait foi
        let Some(original) = ledger.instance(&exception.instance) else {
            continue;
        };
        record(original.kind, exception.hours(), exception.date);
    }

    out
}
