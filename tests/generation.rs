#![forbid(unsafe_code)]
use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use sluzby::{
    Assignee, Department, DutyKind, EmployeeId, SchedError, Scheduler, StaffMember,
    StaticDirectory, TimeWindow,
};
use std::collections::HashSet;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn window(start: &str, end: &str) -> TimeWindow {
    TimeWindow::parse(start, end).unwrap()
}

fn staff() -> StaticDirectory {
    StaticDirectory::new(vec![
        StaffMember::new(1, "Alena").sunday().rotating(),
        StaffMember::new(2, "Bohdan").sunday().rotating(),
        StaffMember::new(3, "Cyril").sunday(),
        StaffMember::new(7, "Jana"),
        StaffMember::new(9, "Petr"),
        StaffMember::new(11, "Ota").inactive(),
    ])
}

#[test]
fn fixed_friday_template_over_january() {
    let mut s = Scheduler::new(staff());
    let id = s
        .create_fixed_template(
            Department::Adults,
            Weekday::Fri,
            window("08:00", "16:00"),
            vec![Assignee::with_window(EmployeeId(7), window("08:00", "16:00"))],
        )
        .unwrap();

    let report = s.generate(&id, date(2026, 1, 1), date(2026, 1, 31)).unwrap();
    assert_eq!(report.created.len(), 5);
    assert_eq!(report.skipped, 0);

    let mut dates: Vec<NaiveDate> = s.ledger().instances().iter().map(|i| i.date).collect();
    dates.sort();
    assert_eq!(
        dates,
        vec![
            date(2026, 1, 2),
            date(2026, 1, 9),
            date(2026, 1, 16),
            date(2026, 1, 23),
            date(2026, 1, 30)
        ]
    );
    for instance in s.ledger().instances() {
        assert_eq!(instance.hours(), 8.0);
        assert_eq!(instance.weekday, Weekday::Fri);
        assert_eq!(instance.employee, EmployeeId(7));
        assert_eq!(instance.kind, DutyKind::Fixed);
        assert_eq!(instance.template.as_ref(), Some(&id));
    }
}

#[test]
fn tuesday_is_never_scheduled() {
    let mut s = Scheduler::new(staff());
    let err = s
        .create_fixed_template(
            Department::Children,
            Weekday::Tue,
            window("09:00", "12:00"),
            vec![Assignee::new(EmployeeId(7))],
        )
        .unwrap_err();
    assert!(matches!(err, SchedError::Validation(_)));
    assert!(s.templates().next().is_none());

    for day in [Weekday::Mon, Weekday::Wed, Weekday::Sat] {
        let id = s
            .create_fixed_template(
                Department::Children,
                day,
                window("09:00", "12:00"),
                vec![Assignee::new(EmployeeId(7))],
            )
            .unwrap();
        s.generate(&id, date(2026, 3, 1), date(2026, 5, 31)).unwrap();
    }
    assert!(!s.ledger().instances().is_empty());
    assert!(s
        .ledger()
        .instances()
        .iter()
        .all(|i| i.date.weekday() != Weekday::Tue));

    let err = s
        .create_manual_instance(
            date(2026, 1, 6),
            Department::Adults,
            window("10:00", "12:00"),
            EmployeeId(7),
            DutyKind::Fixed,
        )
        .unwrap_err();
    assert!(matches!(err, SchedError::Validation(_)));
}

#[test]
fn overlapping_generations_do_not_duplicate() {
    let mut s = Scheduler::new(staff());
    let id = s
        .create_fixed_template(
            Department::Adults,
            Weekday::Fri,
            window("08:00", "16:00"),
            vec![Assignee::new(EmployeeId(7)), Assignee::new(EmployeeId(9))],
        )
        .unwrap();

    s.generate(&id, date(2026, 1, 1), date(2026, 1, 31)).unwrap();
    let second = s.generate(&id, date(2026, 1, 15), date(2026, 2, 28)).unwrap();
    // 16, 23 et 30 janvier déjà couverts pour les deux employés
    assert_eq!(second.skipped, 6);
    assert_eq!(second.created.len(), 8);

    let mut keys = HashSet::new();
    for i in s.ledger().instances() {
        assert!(keys.insert((i.template.clone(), i.date, i.employee)));
    }
    assert_eq!(keys.len(), 18);
}

#[test]
fn fixed_template_supports_co_staffing_with_own_hours() {
    let mut s = Scheduler::new(staff());
    let id = s
        .create_fixed_template(
            Department::Children,
            Weekday::Wed,
            window("12:00", "18:00"),
            vec![
                Assignee::with_window(EmployeeId(7), window("08:00", "12:00")),
                Assignee::new(EmployeeId(9)),
            ],
        )
        .unwrap();
    s.generate(&id, date(2026, 1, 7), date(2026, 1, 7)).unwrap();

    let instances = s.ledger().instances();
    assert_eq!(instances.len(), 2);
    let jana = instances.iter().find(|i| i.employee == EmployeeId(7)).unwrap();
    let petr = instances.iter().find(|i| i.employee == EmployeeId(9)).unwrap();
    assert_eq!(jana.window.start, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
    assert_eq!(petr.window, window("12:00", "18:00"));
    assert_eq!(jana.date, petr.date);
}

#[test]
fn fixed_template_validates_assignees() {
    let mut s = Scheduler::new(staff());
    let empty = s.create_fixed_template(
        Department::Adults,
        Weekday::Mon,
        window("08:00", "16:00"),
        Vec::new(),
    );
    assert!(matches!(empty, Err(SchedError::Validation(_))));

    let unknown = s.create_fixed_template(
        Department::Adults,
        Weekday::Mon,
        window("08:00", "16:00"),
        vec![Assignee::new(EmployeeId(404))],
    );
    assert!(matches!(unknown, Err(SchedError::NotFound { .. })));

    let inactive = s.create_fixed_template(
        Department::Adults,
        Weekday::Mon,
        window("08:00", "16:00"),
        vec![Assignee::new(EmployeeId(11))],
    );
    assert!(matches!(inactive, Err(SchedError::Validation(_))));
}

#[test]
fn sunday_rotation_round_robin() {
    let mut s = Scheduler::new(staff());
    let id = s
        .create_sunday_rotation_template(
            Department::Adults,
            Weekday::Sun,
            window("13:00", "17:00"),
            vec![EmployeeId(1), EmployeeId(2), EmployeeId(3)],
        )
        .unwrap();

    s.generate(&id, date(2026, 1, 4), date(2026, 1, 25)).unwrap();
    let mut instances: Vec<_> = s.ledger().instances().to_vec();
    instances.sort_by_key(|i| i.date);
    let order: Vec<u32> = instances.iter().map(|i| i.employee.0).collect();
    assert_eq!(order, vec![1, 2, 3, 1]);
    assert!(instances.iter().all(|i| i.weekday == Weekday::Sun));
}

#[test]
fn sunday_rotation_continues_after_previous_generation() {
    let mut s = Scheduler::new(staff());
    let id = s
        .create_sunday_rotation_template(
            Department::Children,
            Weekday::Sun,
            window("13:00", "17:00"),
            vec![EmployeeId(1), EmployeeId(2), EmployeeId(3)],
        )
        .unwrap();

    s.generate(&id, date(2026, 1, 1), date(2026, 1, 31)).unwrap();
    s.generate(&id, date(2026, 2, 1), date(2026, 2, 28)).unwrap();
    // janvier : 1, 2, 3, 1 ; février reprend à 2
    let mut feb: Vec<_> = s
        .ledger()
        .instances()
        .iter()
        .filter(|i| i.date.month() == 2)
        .collect();
    feb.sort_by_key(|i| i.date);
    let order: Vec<u32> = feb.iter().map(|i| i.employee.0).collect();
    assert_eq!(order, vec![2, 3, 1, 2]);

    // regénérer un intervalle déjà couvert ne change rien
    let again = s.generate(&id, date(2026, 1, 10), date(2026, 2, 15)).unwrap();
    assert!(again.created.is_empty());
    assert_eq!(s.ledger().instances().len(), 8);
}

#[test]
fn sunday_rotation_forces_sunday_and_checks_eligibility() {
    let mut s = Scheduler::new(staff());
    let id = s
        .create_sunday_rotation_template(
            Department::Adults,
            Weekday::Mon,
            window("13:00", "17:00"),
            vec![EmployeeId(1)],
        )
        .unwrap();
    assert_eq!(s.template(&id).unwrap().weekday, Weekday::Sun);

    let err = s
        .create_sunday_rotation_template(
            Department::Adults,
            Weekday::Sun,
            window("13:00", "17:00"),
            vec![EmployeeId(1), EmployeeId(7)],
        )
        .unwrap_err();
    assert!(matches!(err, SchedError::Validation(_)));
}

#[test]
fn rotating_block_is_created_and_deleted_in_pairs() {
    let mut s = Scheduler::new(staff());
    let block = s
        .assign_rotating_block(date(2026, 1, 9), Department::Adults, EmployeeId(1), None)
        .unwrap();
    assert!(block.created);
    assert_eq!(s.ledger().instances().len(), 2);

    let fri = s.ledger().instance(&block.friday).unwrap();
    let sat = s.ledger().instance(&block.saturday).unwrap();
    assert_eq!(fri.window, window("13:00", "16:00"));
    assert_eq!(sat.window, window("09:00", "11:00"));
    assert_eq!(sat.date, date(2026, 1, 10));
    assert_eq!(fri.employee, sat.employee);

    let again = s
        .assign_rotating_block(date(2026, 1, 9), Department::Adults, EmployeeId(1), None)
        .unwrap();
    assert!(!again.created);
    assert_eq!(again.friday, block.friday);
    assert_eq!(s.ledger().instances().len(), 2);

    let removed = s.delete_instance(&block.saturday).unwrap();
    assert_eq!(removed.len(), 2);
    assert!(s.ledger().instances().is_empty());
}

#[test]
fn rotating_block_validation() {
    let mut s = Scheduler::new(staff());
    let not_friday =
        s.assign_rotating_block(date(2026, 1, 8), Department::Adults, EmployeeId(1), None);
    assert!(matches!(not_friday, Err(SchedError::Validation(_))));

    let not_eligible =
        s.assign_rotating_block(date(2026, 1, 9), Department::Adults, EmployeeId(3), None);
    assert!(matches!(not_eligible, Err(SchedError::Validation(_))));
    assert!(s.ledger().instances().is_empty());
}

#[test]
fn rotating_block_template_is_never_expanded() {
    let mut s = Scheduler::new(staff());
    let id = s.create_rotating_block_template(Department::Children).unwrap();
    let report = s.generate(&id, date(2026, 1, 1), date(2026, 3, 31)).unwrap();
    assert!(report.created.is_empty());
    assert!(s.ledger().instances().is_empty());

    let block = s
        .assign_rotating_block(date(2026, 1, 16), Department::Children, EmployeeId(2), Some(&id))
        .unwrap();
    assert_eq!(
        s.ledger().instance(&block.friday).unwrap().template.as_ref(),
        Some(&id)
    );

    let wrong_department =
        s.assign_rotating_block(date(2026, 1, 16), Department::Adults, EmployeeId(2), Some(&id));
    assert!(matches!(wrong_department, Err(SchedError::Validation(_))));
}

#[test]
fn delete_template_cascades_to_instances() {
    let mut s = Scheduler::new(staff());
    let id = s
        .create_fixed_template(
            Department::Adults,
            Weekday::Thu,
            window("08:00", "12:00"),
            vec![Assignee::new(EmployeeId(7))],
        )
        .unwrap();
    s.generate(&id, date(2026, 1, 1), date(2026, 1, 31)).unwrap();
    let manual = s
        .create_manual_instance(
            date(2026, 1, 8),
            Department::Adults,
            window("12:00", "14:00"),
            EmployeeId(9),
            DutyKind::Fixed,
        )
        .unwrap();

    let removed = s.delete_template(&id).unwrap();
    assert_eq!(removed, 5);
    assert_eq!(s.ledger().instances().len(), 1);
    assert!(s.ledger().instance(&manual).is_some());
    assert!(s.template(&id).is_none());
    assert!(!s.ledger().template(&id).unwrap().active);

    let again = s.generate(&id, date(2026, 2, 1), date(2026, 2, 28));
    assert!(matches!(again, Err(SchedError::NotFound { .. })));
    assert!(matches!(
        s.delete_template(&id),
        Err(SchedError::NotFound { .. })
    ));
}

#[test]
fn generation_range_is_bounded() {
    let mut s = Scheduler::new(staff());
    let id = s
        .create_fixed_template(
            Department::Adults,
            Weekday::Mon,
            window("08:00", "12:00"),
            vec![Assignee::new(EmployeeId(7))],
        )
        .unwrap();

    let reversed = s.generate(&id, date(2026, 2, 1), date(2026, 1, 1));
    assert!(matches!(reversed, Err(SchedError::Validation(_))));
    let too_long = s.generate(&id, date(2026, 1, 1), date(2027, 6, 1));
    assert!(matches!(too_long, Err(SchedError::Validation(_))));

    let report = s.generate_horizon(&id, date(2026, 1, 5)).unwrap();
    // 53 lundis du 5 janvier 2026 au 5 janvier 2027 inclus
    assert_eq!(report.created.len(), 53);
}

#[test]
fn manual_edit_keeps_rotating_pair_consistent() {
    let mut s = Scheduler::new(staff());
    let block = s
        .assign_rotating_block(date(2026, 2, 6), Department::Adults, EmployeeId(1), None)
        .unwrap();
    s.update_instance(&block.friday, None, Some(EmployeeId(2)))
        .unwrap();
    assert_eq!(
        s.ledger().instance(&block.saturday).unwrap().employee,
        EmployeeId(2)
    );

    let hours = s.update_instance(&block.friday, Some(window("10:00", "12:00")), None);
    assert!(matches!(hours, Err(SchedError::Validation(_))));

    let not_eligible = s.update_instance(&block.friday, None, Some(EmployeeId(7)));
    assert!(matches!(not_eligible, Err(SchedError::Validation(_))));
    assert_eq!(
        s.ledger().instance(&block.friday).unwrap().employee,
        EmployeeId(2)
    );
}

#[test]
fn generation_rechecks_fixed_assignees() {
    let mut s = Scheduler::new(staff());
    let id = s
        .create_fixed_template(
            Department::Children,
            Weekday::Mon,
            window("09:00", "12:00"),
            vec![Assignee::new(EmployeeId(7)), Assignee::new(EmployeeId(9))],
        )
        .unwrap();
    s.generate(&id, date(2026, 1, 1), date(2026, 1, 31)).unwrap();
    assert_eq!(s.ledger().instances().len(), 8);

    // Jana a quitté la bibliothèque depuis
    let directory = StaticDirectory::new(vec![
        StaffMember::new(7, "Jana").inactive(),
        StaffMember::new(9, "Petr"),
    ]);
    let mut s = Scheduler::with_ledger(s.into_ledger(), directory);
    let err = s
        .generate(&id, date(2026, 2, 1), date(2026, 2, 28))
        .unwrap_err();
    assert!(matches!(err, SchedError::Validation(_)));
    assert_eq!(s.ledger().instances().len(), 8);
}

#[test]
fn empty_rotation_in_stored_ledger_is_rejected() {
    let mut s = Scheduler::new(staff());
    let id = s
        .create_sunday_rotation_template(
            Department::Adults,
            Weekday::Sun,
            window("13:00", "17:00"),
            vec![EmployeeId(1)],
        )
        .unwrap();

    let mut raw = serde_json::to_value(s.ledger()).unwrap();
    raw["templates"][0]["rule"]["rotation"] = serde_json::json!([]);
    let ledger = serde_json::from_value(raw).unwrap();
    let mut s = Scheduler::with_ledger(ledger, staff());

    let err = s
        .generate(&id, date(2026, 1, 1), date(2026, 1, 31))
        .unwrap_err();
    assert!(matches!(err, SchedError::Validation(_)));
    assert!(s.ledger().instances().is_empty());
}
