//! Schéma de stockage typé et unité de travail.
//!
//! Le `Ledger` tient les quatre tables (gabarits, instances, exceptions,
//! échanges) et porte les contraintes que la couche domaine ne doit pas
//! être seule à garantir : unicité `(gabarit, date, employé)` et version
//! optimiste des instances.

use crate::model::{
    EmployeeId, ExceptionId, InstanceId, ShiftException, ShiftInstance, ShiftSwap, ShiftTemplate,
    SwapId, TemplateId,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("duplicate instance for template {template} on {date} (employee {employee})")]
    DuplicateInstance {
        template: TemplateId,
        date: NaiveDate,
        employee: EmployeeId,
    },
    #[error("instance {0} was modified concurrently")]
    StaleVersion(InstanceId),
    #[error("unknown instance: {0}")]
    MissingInstance(InstanceId),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(default)]
    templates: Vec<ShiftTemplate>,
    #[serde(default)]
    instances: Vec<ShiftInstance>,
    #[serde(default)]
    exceptions: Vec<ShiftException>,
    #[serde(default)]
    swaps: Vec<ShiftSwap>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exécute `f` sur une copie de travail ; la copie ne remplace le ledger
    /// qu'en cas de succès.
    pub fn transaction<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Ledger) -> Result<T, E>,
    {
        let mut scratch = self.clone();
        let out = f(&mut scratch)?;
        *self = scratch;
        Ok(out)
    }

    // --- gabarits ---

    pub fn templates(&self) -> &[ShiftTemplate] {
        &self.templates
    }

    pub fn template(&self, id: &TemplateId) -> Option<&ShiftTemplate> {
        self.templates.iter().find(|t| &t.id == id)
    }

    pub fn template_mut(&mut self, id: &TemplateId) -> Option<&mut ShiftTemplate> {
        self.templates.iter_mut().find(|t| &t.id == id)
    }

    pub fn insert_template(&mut self, template: ShiftTemplate) {
        self.templates.push(template);
    }

    // --- instances ---

    pub fn instances(&self) -> &[ShiftInstance] {
        &self.instances
    }

    pub fn instance(&self, id: &InstanceId) -> Option<&ShiftInstance> {
        self.instances.iter().find(|i| &i.id == id)
    }

    pub fn instances_for_template<'a>(
        &'a self,
        template: &TemplateId,
    ) -> impl Iterator<Item = &'a ShiftInstance> + 'a {
        let template = template.clone();
        self.instances
            .iter()
            .filter(move |i| i.template.as_ref() == Some(&template))
    }

    /// Recherche par clé d'unicité ; `template = None` vise les instances
    /// créées hors gabarit.
    pub fn find_instance(
        &self,
        template: Option<&TemplateId>,
        date: NaiveDate,
        employee: EmployeeId,
    ) -> Option<&ShiftInstance> {
        self.instances
            .iter()
            .find(|i| i.template.as_ref() == template && i.date == date && i.employee == employee)
    }

    /// Dernière instance du gabarit strictement avant `date`.
    pub fn last_instance_before(
        &self,
        template: &TemplateId,
        date: NaiveDate,
    ) -> Option<&ShiftInstance> {
        self.instances
            .iter()
            .filter(|i| i.template.as_ref() == Some(template) && i.date < date)
            .max_by_key(|i| (i.date, i.window.start))
    }

    /// Insère une instance ; rejette un doublon `(gabarit, date, employé)`.
    pub fn insert_instance(&mut self, instance: ShiftInstance) -> Result<(), StoreError> {
        if let Some(template) = instance.template.as_ref() {
            if self
                .find_instance(Some(template), instance.date, instance.employee)
                .is_some()
            {
                return Err(StoreError::DuplicateInstance {
                    template: template.clone(),
                    date: instance.date,
                    employee: instance.employee,
                });
            }
        }
        self.instances.push(instance);
        Ok(())
    }

    /// Remplace une instance si sa version n'a pas bougé depuis la lecture,
    /// puis incrémente la version.
    pub fn update_instance(&mut self, instance: ShiftInstance) -> Result<(), StoreError> {
        self.update_instances(vec![instance])
    }

    /// Remplace un lot d'instances d'un seul tenant. L'unicité
    /// `(gabarit, date, employé)` est vérifiée sur l'état final du lot : deux
    /// instances peuvent ainsi échanger leurs employés. En cas d'erreur, rien
    /// n'est modifié.
    pub fn update_instances(&mut self, batch: Vec<ShiftInstance>) -> Result<(), StoreError> {
        let mut slots = Vec::with_capacity(batch.len());
        for instance in &batch {
            let Some(pos) = self.instances.iter().position(|i| i.id == instance.id) else {
                return Err(StoreError::MissingInstance(instance.id.clone()));
            };
            if self.instances[pos].version != instance.version {
                return Err(StoreError::StaleVersion(instance.id.clone()));
            }
            slots.push(pos);
        }

        let mut previous = Vec::with_capacity(batch.len());
        for (pos, mut instance) in slots.into_iter().zip(batch) {
            instance.version += 1;
            previous.push((pos, std::mem::replace(&mut self.instances[pos], instance)));
        }

        let clash = previous.iter().find_map(|(pos, _)| self.clash(*pos));
        if let Some(err) = clash {
            for (pos, old) in previous.into_iter().rev() {
                self.instances[pos] = old;
            }
            return Err(err);
        }
        Ok(())
    }

    fn clash(&self, pos: usize) -> Option<StoreError> {
        let instance = &self.instances[pos];
        let template = instance.template.as_ref()?;
        let duplicate = self.instances.iter().enumerate().any(|(other, i)| {
            other != pos
                && i.template.as_ref() == Some(template)
                && i.date == instance.date
                && i.employee == instance.employee
        });
        duplicate.then(|| StoreError::DuplicateInstance {
            template: template.clone(),
            date: instance.date,
            employee: instance.employee,
        })
    }

    pub fn remove_instance(&mut self, id: &InstanceId) -> Option<ShiftInstance> {
        let pos = self.instances.iter().position(|i| &i.id == id)?;
        Some(self.instances.remove(pos))
    }

    // --- exceptions ---

    pub fn exceptions(&self) -> &[ShiftException] {
        &self.exceptions
    }

    pub fn exception(&self, id: &ExceptionId) -> Option<&ShiftException> {
        self.exceptions.iter().find(|e| &e.id == id)
    }

    pub fn exception_mut(&mut self, id: &ExceptionId) -> Option<&mut ShiftException> {
        self.exceptions.iter_mut().find(|e| &e.id == id)
    }

    pub fn exceptions_for_instance<'a>(
        &'a self,
        instance: &InstanceId,
    ) -> impl Iterator<Item = &'a ShiftException> + 'a {
        let instance = instance.clone();
        self.exceptions.iter().filter(move |e| e.instance == instance)
    }

    pub fn active_exception(&self, instance: &InstanceId) -> Option<&ShiftException> {
        self.exceptions
            .iter()
            .find(|e| &e.instance == instance && e.active)
    }

    /// Désactive toutes les exceptions actives de l'instance ; renvoie leur nombre.
    pub fn deactivate_exceptions(&mut self, instance: &InstanceId) -> usize {
        let mut count = 0;
        for e in self.exceptions.iter_mut().filter(|e| &e.instance == instance && e.active) {
            e.active = false;
            count += 1;
        }
        count
    }

    pub fn insert_exception(&mut self, exception: ShiftException) {
        self.exceptions.push(exception);
    }

    pub fn purge_exceptions(&mut self, instance: &InstanceId) {
        self.exceptions.retain(|e| &e.instance != instance);
    }

    // --- échanges ---

    pub fn swaps(&self) -> &[ShiftSwap] {
        &self.swaps
    }

    pub fn swap(&self, id: &SwapId) -> Option<&ShiftSwap> {
        self.swaps.iter().find(|s| &s.id == id)
    }

    pub fn swap_mut(&mut self, id: &SwapId) -> Option<&mut ShiftSwap> {
        self.swaps.iter_mut().find(|s| &s.id == id)
    }

    pub fn insert_swap(&mut self, swap: ShiftSwap) {
        self.swaps.push(swap);
    }

    pub fn remove_swap(&mut self, id: &SwapId) -> Option<ShiftSwap> {
        let pos = self.swaps.iter().position(|s| &s.id == id)?;
        Some(self.swaps.remove(pos))
    }
}
