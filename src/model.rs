use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Jour fermé : aucune instance n'est jamais créée un mardi.
pub const CLOSED_WEEKDAY: Weekday = Weekday::Tue;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new<S: AsRef<str>>(s: S) -> Self {
                Self(s.as_ref().to_owned())
            }
            pub fn random() -> Self {
                Self(Uuid::new_v4().to_string())
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifiant fort pour un gabarit
    TemplateId
);
string_id!(
    /// Identifiant fort pour une instance de service
    InstanceId
);
string_id!(ExceptionId);
string_id!(SwapId);

/// Identifiant d'employé, fourni par l'annuaire externe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EmployeeId(pub u32);

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Auteur d'une action (champ d'audit), fourni par le contexte appelant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u32);

/// Section de la bibliothèque couverte par un service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Department {
    Children,
    Adults,
}

impl Department {
    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Children => "children",
            Department::Adults => "adults",
        }
    }
}

impl FromStr for Department {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "children" | "detske" | "deti" => Ok(Department::Children),
            "adults" | "dospele" | "dospeli" => Ok(Department::Adults),
            other => Err(format!("unknown department: {other}")),
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Nature d'un service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DutyKind {
    Fixed,
    RotatingBlock,
    SundayRotation,
}

impl DutyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DutyKind::Fixed => "fixed",
            DutyKind::RotatingBlock => "rotating",
            DutyKind::SundayRotation => "sunday",
        }
    }
}

impl FromStr for DutyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" | "fixni" => Ok(DutyKind::Fixed),
            "rotating" | "rotujici" => Ok(DutyKind::RotatingBlock),
            "sunday" | "nedele" => Ok(DutyKind::SundayRotation),
            other => Err(format!("unknown duty kind: {other}")),
        }
    }
}

impl fmt::Display for DutyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Plage horaire d'un service (granularité HH:MM, `end > start`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    /// Crée une plage en validant que `end > start`.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, String> {
        if end <= start {
            return Err("end must be strictly after start".to_string());
        }
        Ok(Self { start, end })
    }

    /// Construit une plage depuis deux heures `HH:MM`.
    pub fn parse(start: &str, end: &str) -> Result<Self, String> {
        let start = parse_hhmm(start).ok_or_else(|| format!("invalid time: {start}"))?;
        let end = parse_hhmm(end).ok_or_else(|| format!("invalid time: {end}"))?;
        Self::new(start, end)
    }

    /// Raccourci pour les plages fixes connues à la compilation.
    pub(crate) fn hm(start: (u32, u32), end: (u32, u32)) -> Self {
        Self {
            start: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap_or_default(),
            end: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap_or_default(),
        }
    }

    /// Durée en heures décimales.
    pub fn hours(&self) -> f64 {
        let minutes = (self.end - self.start).num_minutes();
        if minutes <= 0 {
            0.0
        } else {
            minutes as f64 / 60.0
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

pub fn parse_hhmm(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").ok()
}

/// Heures entre deux horaires bruts ; un horaire illisible compte pour 0.
pub fn hours_between(start: &str, end: &str) -> f64 {
    match (parse_hhmm(start), parse_hhmm(end)) {
        (Some(start), Some(end)) => TimeWindow { start, end }.hours(),
        _ => 0.0,
    }
}

/// Numéro du jour, lundi = 0.
pub fn weekday_index(day: Weekday) -> u8 {
    day.num_days_from_monday() as u8
}

pub fn weekday_from_index(idx: u8) -> Option<Weekday> {
    match idx {
        0 => Some(Weekday::Mon),
        1 => Some(Weekday::Tue),
        2 => Some(Weekday::Wed),
        3 => Some(Weekday::Thu),
        4 => Some(Weekday::Fri),
        5 => Some(Weekday::Sat),
        6 => Some(Weekday::Sun),
        _ => None,
    }
}

/// Membre d'un service fixe, avec ses propres horaires éventuels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignee {
    pub employee: EmployeeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<TimeWindow>,
}

impl Assignee {
    pub fn new(employee: EmployeeId) -> Self {
        Self { employee, window: None }
    }

    pub fn with_window(employee: EmployeeId, window: TimeWindow) -> Self {
        Self { employee, window: Some(window) }
    }
}

/// Règle de génération d'un gabarit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TemplateRule {
    Fixed { assignees: Vec<Assignee> },
    RotatingBlock,
    SundayRotation { rotation: Vec<EmployeeId> },
}

impl TemplateRule {
    pub fn kind(&self) -> DutyKind {
        match self {
            TemplateRule::Fixed { .. } => DutyKind::Fixed,
            TemplateRule::RotatingBlock => DutyKind::RotatingBlock,
            TemplateRule::SundayRotation { .. } => DutyKind::SundayRotation,
        }
    }
}

/// Gabarit récurrent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftTemplate {
    pub id: TemplateId,
    pub department: Department,
    pub weekday: Weekday,
    pub window: TimeWindow,
    pub rule: TemplateRule,
    #[serde(default = "default_true")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl ShiftTemplate {
    pub fn kind(&self) -> DutyKind {
        self.rule.kind()
    }
}

/// Service concret daté.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftInstance {
    pub id: InstanceId,
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub department: Department,
    pub window: TimeWindow,
    pub employee: EmployeeId,
    pub kind: DutyKind,
    #[serde(default)]
    pub template: Option<TemplateId>,
    /// Autre moitié d'un bloc vendredi + samedi.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner: Option<InstanceId>,
    #[serde(default)]
    pub has_exception: bool,
    #[serde(default)]
    pub has_swap: bool,
    #[serde(default)]
    pub version: u64,
}

impl ShiftInstance {
    pub fn new(
        date: NaiveDate,
        department: Department,
        window: TimeWindow,
        employee: EmployeeId,
        kind: DutyKind,
        template: Option<TemplateId>,
    ) -> Self {
        Self {
            id: InstanceId::random(),
            date,
            weekday: date.weekday(),
            department,
            window,
            employee,
            kind,
            template,
            partner: None,
            has_exception: false,
            has_swap: false,
            version: 0,
        }
    }

    pub fn hours(&self) -> f64 {
        self.window.hours()
    }
}

/// Remplacement ponctuel d'une instance, sans la modifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftException {
    pub id: ExceptionId,
    pub instance: InstanceId,
    pub date: NaiveDate,
    pub department: Department,
    pub window: TimeWindow,
    /// Remplaçant
    pub employee: EmployeeId,
    #[serde(default)]
    pub note: String,
    pub created_by: ActorId,
    pub created_at: DateTime<Utc>,
    pub active: bool,
}

impl ShiftException {
    pub fn hours(&self) -> f64 {
        self.window.hours()
    }
}

/// Échange d'employés entre deux instances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftSwap {
    pub id: SwapId,
    pub instance_a: InstanceId,
    pub instance_b: InstanceId,
    pub original_employee_a: EmployeeId,
    pub original_employee_b: EmployeeId,
    #[serde(default)]
    pub note: String,
    pub created_by: ActorId,
    pub created_at: DateTime<Utc>,
    pub approved: bool,
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
}
