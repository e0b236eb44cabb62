//! Annuaire du personnel, consulté en lecture seule.

use crate::model::EmployeeId;
use serde::{Deserialize, Serialize};

/// Identité d'un employé telle que vue par le moteur.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub full_name: String,
    pub active: bool,
}

/// Source externe des employés et de leurs habilitations.
pub trait Directory {
    fn employee(&self, id: EmployeeId) -> Option<Employee>;
    fn is_eligible_for_rotating(&self, id: EmployeeId) -> bool;
    fn is_eligible_for_sunday(&self, id: EmployeeId) -> bool;
}

impl<D: Directory + ?Sized> Directory for &D {
    fn employee(&self, id: EmployeeId) -> Option<Employee> {
        (**self).employee(id)
    }
    fn is_eligible_for_rotating(&self, id: EmployeeId) -> bool {
        (**self).is_eligible_for_rotating(id)
    }
    fn is_eligible_for_sunday(&self, id: EmployeeId) -> bool {
        (**self).is_eligible_for_sunday(id)
    }
}

/// Fiche d'annuaire complète (identité + habilitations).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: EmployeeId,
    pub full_name: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub rotating: bool,
    #[serde(default)]
    pub sunday: bool,
}

fn default_active() -> bool {
    true
}

impl StaffMember {
    pub fn new<N: Into<String>>(id: u32, full_name: N) -> Self {
        Self {
            id: EmployeeId(id),
            full_name: full_name.into(),
            active: true,
            rotating: false,
            sunday: false,
        }
    }

    pub fn rotating(mut self) -> Self {
        self.rotating = true;
        self
    }

    pub fn sunday(mut self) -> Self {
        self.sunday = true;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// Annuaire en mémoire (tests, CLI alimentée par CSV).
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    staff: Vec<StaffMember>,
}

impl StaticDirectory {
    pub fn new(staff: Vec<StaffMember>) -> Self {
        Self { staff }
    }

    pub fn staff(&self) -> &[StaffMember] {
        &self.staff
    }

    fn member(&self, id: EmployeeId) -> Option<&StaffMember> {
        self.staff.iter().find(|m| m.id == id)
    }
}

impl Directory for StaticDirectory {
    fn employee(&self, id: EmployeeId) -> Option<Employee> {
        self.member(id).map(|m| Employee {
            id: m.id,
            full_name: m.full_name.clone(),
            active: m.active,
        })
    }

    fn is_eligible_for_rotating(&self, id: EmployeeId) -> bool {
        self.member(id).is_some_and(|m| m.rotating)
    }

    fn is_eligible_for_sunday(&self, id: EmployeeId) -> bool {
        self.member(id).is_some_and(|m| m.sunday)
    }
}
