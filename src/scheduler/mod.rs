mod calendar;
mod exceptions;
mod generate;
mod stats;
mod swaps;
mod templates;
mod types;
mod util;

pub use calendar::effective;
pub use types::{
    BlockAssignment, EffectiveShift, EmployeeStatistics, EngineOptions, ExceptionRequest,
    GenerationReport, HourBucket, MonthKey, SchedError,
};

use crate::directory::Directory;
use crate::ledger::Ledger;
use crate::model::{
    ActorId, Assignee, Department, DutyKind, EmployeeId, ExceptionId, InstanceId, ShiftException,
    ShiftSwap, ShiftTemplate, SwapId, TemplateId, TimeWindow,
};
use chrono::{Duration, Local, NaiveDate, Weekday};
use std::collections::BTreeMap;

/// Scheduler : encapsule le ledger et l'annuaire du personnel.
///
/// Chaque opération d'écriture s'exécute dans une transaction du ledger :
/// en cas d'erreur, rien n'est conservé.
#[derive(Debug, Default)]
pub struct Scheduler<D> {
    ledger: Ledger,
    directory: D,
    opts: EngineOptions,
}

impl<D: Directory> Scheduler<D> {
    pub fn new(directory: D) -> Self {
        Self::with_ledger(Ledger::default(), directory)
    }

    pub fn with_ledger(ledger: Ledger, directory: D) -> Self {
        Self {
            ledger,
            directory,
            opts: EngineOptions::default(),
        }
    }

    pub fn with_options(mut self, opts: EngineOptions) -> Self {
        self.opts = opts;
        self
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }
    pub fn into_ledger(self) -> Ledger {
        self.ledger
    }
    pub fn directory(&self) -> &D {
        &self.directory
    }
    pub fn options(&self) -> EngineOptions {
        self.opts
    }

    // --- gabarits ---

    pub fn create_fixed_template(
        &mut self,
        department: Department,
        weekday: Weekday,
        window: TimeWindow,
        assignees: Vec<Assignee>,
    ) -> Result<TemplateId, SchedError> {
        let directory = &self.directory;
        self.ledger.transaction(|tx| {
            templates::create_fixed(tx, directory, department, weekday, window, assignees)
        })
    }

    pub fn create_sunday_rotation_template(
        &mut self,
        department: Department,
        weekday: Weekday,
        window: TimeWindow,
        rotation: Vec<EmployeeId>,
    ) -> Result<TemplateId, SchedError> {
        let directory = &self.directory;
        self.ledger.transaction(|tx| {
            templates::create_sunday_rotation(tx, directory, department, weekday, window, rotation)
        })
    }

    pub fn create_rotating_block_template(
        &mut self,
        department: Department,
    ) -> Result<TemplateId, SchedError> {
        self.ledger
            .transaction(|tx| Ok(templates::create_rotating_block(tx, department)))
    }

    /// Supprime les instances du gabarit puis le désactive ; renvoie le
    /// nombre d'instances supprimées.
    pub fn delete_template(&mut self, id: &TemplateId) -> Result<usize, SchedError> {
        self.ledger.transaction(|tx| templates::delete(tx, id))
    }

    pub fn template(&self, id: &TemplateId) -> Option<&ShiftTemplate> {
        self.ledger.template(id).filter(|t| t.active)
    }

    pub fn templates(&self) -> impl Iterator<Item = &ShiftTemplate> {
        self.ledger.templates().iter().filter(|t| t.active)
    }

    // --- génération ---

    pub fn generate(
        &mut self,
        id: &TemplateId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<GenerationReport, SchedError> {
        let directory = &self.directory;
        let opts = self.opts;
        self.ledger
            .transaction(|tx| generate::generate(tx, directory, opts, id, start, end))
    }

    /// Génère de `today` jusqu'à l'horizon configuré.
    pub fn generate_horizon(
        &mut self,
        id: &TemplateId,
        today: NaiveDate,
    ) -> Result<GenerationReport, SchedError> {
        let end = today + Duration::days(i64::from(self.opts.horizon_days));
        self.generate(id, today, end)
    }

    pub fn assign_rotating_block(
        &mut self,
        friday: NaiveDate,
        department: Department,
        employee: EmployeeId,
        template: Option<&TemplateId>,
    ) -> Result<BlockAssignment, SchedError> {
        let directory = &self.directory;
        self.ledger.transaction(|tx| {
            generate::assign_rotating_block(tx, directory, friday, department, employee, template)
        })
    }

    pub fn create_manual_instance(
        &mut self,
        date: NaiveDate,
        department: Department,
        window: TimeWindow,
        employee: EmployeeId,
        kind: DutyKind,
    ) -> Result<InstanceId, SchedError> {
        let directory = &self.directory;
        self.ledger.transaction(|tx| {
            generate::create_manual(tx, directory, date, department, window, employee, kind)
        })
    }

    pub fn update_instance(
        &mut self,
        id: &InstanceId,
        window: Option<TimeWindow>,
        employee: Option<EmployeeId>,
    ) -> Result<(), SchedError> {
        let directory = &self.directory;
        self.ledger
            .transaction(|tx| generate::update_instance(tx, directory, id, window, employee))
    }

    /// Supprime une instance (ou les deux moitiés d'un bloc) ; renvoie les
    /// identifiants supprimés.
    pub fn delete_instance(&mut self, id: &InstanceId) -> Result<Vec<InstanceId>, SchedError> {
        self.ledger.transaction(|tx| generate::delete_instance(tx, id))
    }

    // --- exceptions ---

    pub fn create_exception(
        &mut self,
        request: ExceptionRequest,
        actor: ActorId,
    ) -> Result<ExceptionId, SchedError> {
        let directory = &self.directory;
        self.ledger
            .transaction(|tx| exceptions::create(tx, directory, request, actor))
    }

    /// Désactive une exception ; `false` si elle l'était déjà.
    pub fn delete_exception(&mut self, id: &ExceptionId) -> Result<bool, SchedError> {
        self.ledger.transaction(|tx| exceptions::delete(tx, id))
    }

    pub fn exceptions_for(&self, instance: &InstanceId) -> Vec<&ShiftException> {
        self.ledger.exceptions_for_instance(instance).collect()
    }

    pub fn effective_instance(&self, id: &InstanceId) -> Result<EffectiveShift, SchedError> {
        calendar::effective_instance(&self.ledger, id)
    }

    // --- échanges ---

    pub fn create_swap(
        &mut self,
        a: &InstanceId,
        b: &InstanceId,
        note: &str,
        actor: ActorId,
    ) -> Result<SwapId, SchedError> {
        let directory = &self.directory;
        self.ledger
            .transaction(|tx| swaps::create(tx, directory, a, b, note, actor))
    }

    pub fn approve_swap(&mut self, id: &SwapId) -> Result<(), SchedError> {
        let directory = &self.directory;
        self.ledger.transaction(|tx| swaps::approve(tx, directory, id))
    }

    pub fn immediate_swap(
        &mut self,
        a: &InstanceId,
        b: &InstanceId,
        note: &str,
        actor: ActorId,
    ) -> Result<SwapId, SchedError> {
        let directory = &self.directory;
        self.ledger
            .transaction(|tx| swaps::immediate(tx, directory, a, b, note, actor))
    }

    pub fn cancel_swap(&mut self, id: &SwapId) -> Result<(), SchedError> {
        self.ledger.transaction(|tx| swaps::cancel(tx, id))
    }

    pub fn pending_swaps(&self) -> Vec<&ShiftSwap> {
        self.ledger.swaps().iter().filter(|s| !s.approved).collect()
    }

    // --- lecture ---

    pub fn list_instances(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        department: Option<Department>,
        kind: Option<DutyKind>,
    ) -> BTreeMap<MonthKey, Vec<EffectiveShift>> {
        calendar::list_instances(&self.ledger, from, to, department, kind)
    }

    /// Statistiques de l'année ; semaine et mois relatifs à la date du jour.
    pub fn employee_statistics(&self, employee: EmployeeId, year: i32) -> EmployeeStatistics {
        self.employee_statistics_at(employee, year, Local::now().date_naive())
    }

    pub fn employee_statistics_at(
        &self,
        employee: EmployeeId,
        year: i32,
        today: NaiveDate,
    ) -> EmployeeStatistics {
        stats::statistics(&self.ledger, employee, year, today)
    }
}
