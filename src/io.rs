use crate::directory::StaffMember;
use crate::model::{weekday_index, EmployeeId};
use crate::scheduler::{EffectiveShift, EmployeeStatistics, HourBucket, MonthKey};
use anyhow::{bail, Context};
use csv::{ReaderBuilder, WriterBuilder};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

/// Import de l'annuaire depuis CSV: header `id,full_name[,active][,rotating][,sunday]`
pub fn import_staff_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<StaffMember>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let id = rec.get(0).context("missing id")?.trim();
        let name = rec.get(1).context("missing full_name")?.trim();
        if id.is_empty() || name.is_empty() {
            bail!("invalid staff row (empty)");
        }
        let id: u32 = id.parse().with_context(|| format!("invalid employee id: {id}"))?;
        let mut member = StaffMember::new(id, name);
        if let Some(flag) = optional(rec.get(2)) {
            member.active = parse_bool(flag)
                .with_context(|| format!("invalid active value for employee {id}"))?;
        }
        if let Some(flag) = optional(rec.get(3)) {
            member.rotating = parse_bool(flag)
                .with_context(|| format!("invalid rotating value for employee {id}"))?;
        }
        if let Some(flag) = optional(rec.get(4)) {
            member.sunday = parse_bool(flag)
                .with_context(|| format!("invalid sunday value for employee {id}"))?;
        }
        out.push(member);
    }
    Ok(out)
}

fn optional(field: Option<&str>) -> Option<&str> {
    field.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_bool(s: &str) -> anyhow::Result<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "ano" => Ok(true),
        "false" | "0" | "no" | "n" | "ne" => Ok(false),
        _ => bail!("expected boolean"),
    }
}

/// Export CSV du calendrier effectif:
/// header `instance,date,weekday,department,kind,start,end,employee,scheduled_employee,exception`
pub fn export_calendar_csv<P: AsRef<Path>>(
    path: P,
    calendar: &BTreeMap<MonthKey, Vec<EffectiveShift>>,
) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record([
        "instance",
        "date",
        "weekday",
        "department",
        "kind",
        "start",
        "end",
        "employee",
        "scheduled_employee",
        "exception",
    ])?;
    let mut ids = itoa::Buffer::new();
    let mut weekday = itoa::Buffer::new();
    for shift in calendar.values().flatten() {
        let date = shift.date.to_string();
        let start = shift.window.start.format("%H:%M").to_string();
        let end = shift.window.end.format("%H:%M").to_string();
        let scheduled = shift.scheduled_employee.0.to_string();
        w.write_record([
            shift.instance.as_str(),
            date.as_str(),
            weekday.format(weekday_index(shift.weekday)),
            shift.department.as_str(),
            shift.kind.as_str(),
            start.as_str(),
            end.as_str(),
            ids.format(shift.employee.0),
            scheduled.as_str(),
            shift.exception.as_ref().map(|e| e.as_str()).unwrap_or(""),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Tableau texte des statistiques d'un employé.
pub fn format_statistics(stats: &EmployeeStatistics, name: Option<&str>) -> String {
    let mut out = String::new();
    let who = match name {
        Some(name) => format!("{name} (#{})", stats.employee),
        None => format!("#{}", stats.employee),
    };
    let _ = writeln!(out, "Statistiques {} pour {}", stats.year, who);
    let _ = writeln!(
        out,
        "{:<10}{:>8}{:>8}{:>9}{:>7}",
        "type", "semaine", "mois", "année", "nb"
    );
    let rows: [(&str, &HourBucket); 4] = [
        ("fixed", &stats.fixed),
        ("rotating", &stats.rotating),
        ("sunday", &stats.sunday),
        ("total", &stats.total),
    ];
    for (label, bucket) in rows {
        let _ = writeln!(
            out,
            "{:<10}{:>8.2}{:>8.2}{:>9.2}{:>7}",
            label, bucket.week, bucket.month, bucket.year, bucket.count
        );
    }
    out
}

/// Nom d'un employé pour l'affichage, si l'annuaire le connaît.
pub fn staff_name(staff: &[StaffMember], id: EmployeeId) -> Option<&str> {
    staff
        .iter()
        .find(|m| m.id == id)
        .map(|m| m.full_name.as_str())
}
