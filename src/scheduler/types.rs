use crate::ledger::StoreError;
use crate::model::{
    Department, DutyKind, EmployeeId, ExceptionId, InstanceId, TemplateId, TimeWindow,
};
use chrono::{NaiveDate, Weekday};
use serde::Serialize;
use thiserror::Error;

/// Options du moteur
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    /// Horizon de génération par défaut, et étendue maximale d'un appel.
    pub horizon_days: u32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self { horizon_days: 365 }
    }
}

#[derive(Error, Debug)]
pub enum SchedError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unknown {entity}: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("invalid state: {0}")]
    State(String),
    #[error(transparent)]
    Conflict(#[from] StoreError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SchedError {
    pub(crate) fn validation<S: Into<String>>(msg: S) -> Self {
        SchedError::Validation(msg.into())
    }

    pub(crate) fn not_found<I: ToString>(entity: &'static str, id: I) -> Self {
        SchedError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Résultat d'une expansion de gabarit.
#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    pub created: Vec<InstanceId>,
    /// Jours déjà couverts, laissés intacts.
    pub skipped: usize,
}

/// Résultat d'une affectation de bloc vendredi + samedi.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockAssignment {
    pub friday: InstanceId,
    pub saturday: InstanceId,
    /// `false` si le bloc existait déjà pour cet employé.
    pub created: bool,
}

/// Demande de remplacement ponctuel.
#[derive(Debug, Clone)]
pub struct ExceptionRequest {
    pub instance: InstanceId,
    pub date: NaiveDate,
    pub department: Department,
    pub window: TimeWindow,
    pub substitute: EmployeeId,
    pub note: String,
}

/// Vue effective d'une instance, exception active appliquée.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectiveShift {
    pub instance: InstanceId,
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub department: Department,
    pub window: TimeWindow,
    pub employee: EmployeeId,
    pub kind: DutyKind,
    pub template: Option<TemplateId>,
    /// Exception appliquée, le cas échéant.
    pub exception: Option<ExceptionId>,
    /// Employé planifié avant remplacement.
    pub scheduled_employee: EmployeeId,
    pub has_swap: bool,
    pub note: Option<String>,
}

impl EffectiveShift {
    pub fn hours(&self) -> f64 {
        self.window.hours()
    }
}

/// Clé de regroupement année-mois du calendrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

/// Heures cumulées pour la semaine, le mois et l'année.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HourBucket {
    pub week: f64,
    pub month: f64,
    pub year: f64,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeStatistics {
    pub employee: EmployeeId,
    pub year: i32,
    pub fixed: HourBucket,
    pub rotating: HourBucket,
    pub sunday: HourBucket,
    pub total: HourBucket,
}

impl EmployeeStatistics {
    pub fn bucket(&self, kind: DutyKind) -> &HourBucket {
        match kind {
            DutyKind::Fixed => &self.fixed,
            DutyKind::RotatingBlock => &self.rotating,
            DutyKind::SundayRotation => &self.sunday,
        }
    }
}
