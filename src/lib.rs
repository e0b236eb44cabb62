#![forbid(unsafe_code)]
//! Sluzby — moteur de planification des services d'une bibliothèque.
//!
//! - Gabarits récurrents (fixe, bloc vendredi + samedi, rotation du dimanche).
//! - Génération idempotente sur un horizon borné ; le mardi est fermé.
//! - Exceptions non destructives, échanges avec approbation.
//! - Statistiques d'heures par employé.

pub mod directory;
pub mod io;
pub mod ledger;
pub mod model;
pub mod scheduler;
pub mod storage;

pub use directory::{Directory, Employee, StaffMember, StaticDirectory};
pub use ledger::{Ledger, StoreError};
pub use model::{
    hours_between, ActorId, Assignee, Department, DutyKind, EmployeeId, ExceptionId, InstanceId,
    ShiftException, ShiftInstance, ShiftSwap, ShiftTemplate, SwapId, TemplateId, TemplateRule,
    TimeWindow, CLOSED_WEEKDAY,
};
pub use scheduler::{
    effective, BlockAssignment, EffectiveShift, EmployeeStatistics, EngineOptions,
    ExceptionRequest, GenerationReport, HourBucket, MonthKey, SchedError, Scheduler,
};
pub use storage::{JsonStorage, Storage};
