#![forbid(unsafe_code)]
use anyhow::{anyhow, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use sluzby::{
    io,
    model::{weekday_from_index, weekday_index},
    ActorId, Assignee, Department, DutyKind, EmployeeId, EngineOptions, ExceptionId,
    ExceptionRequest, InstanceId, JsonStorage, Scheduler, StaticDirectory, Storage, SwapId,
    TemplateId, TemplateRule, TimeWindow,
};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI du planning des services de la bibliothèque
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON du planning
    #[arg(long, global = true, default_value = "sluzby.json")]
    ledger: String,

    /// Annuaire CSV `id,full_name,active,rotating,sunday`
    #[arg(long, global = true)]
    staff: Option<String>,

    /// Horizon de génération (jours)
    #[arg(long, global = true, default_value_t = 365)]
    horizon_days: u32,

    /// Identifiant de l'auteur des modifications
    #[arg(long, global = true, default_value_t = 0)]
    actor: u32,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Créer un gabarit de service fixe
    CreateFixed {
        #[arg(long)]
        department: String,
        /// Jour de la semaine, lundi = 0
        #[arg(long)]
        weekday: u8,
        /// HH:MM
        #[arg(long)]
        start: String,
        /// HH:MM
        #[arg(long)]
        end: String,
        /// `id` ou `id@HH:MM-HH:MM`, répétable
        #[arg(long = "assignee", required = true)]
        assignees: Vec<String>,
    },

    /// Créer une rotation du dimanche
    CreateSunday {
        #[arg(long)]
        department: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        /// liste "id1,id2,..." dans l'ordre de rotation
        #[arg(long)]
        rotation: String,
    },

    /// Créer un gabarit de bloc vendredi + samedi
    CreateBlock {
        #[arg(long)]
        department: String,
    },

    /// Supprimer un gabarit et ses instances
    DeleteTemplate {
        #[arg(long)]
        template: String,
    },

    /// Lister les gabarits actifs
    Templates,

    /// Générer les instances d'un gabarit
    Generate {
        #[arg(long)]
        template: String,
        /// AAAA-MM-JJ (défaut : aujourd'hui)
        #[arg(long)]
        from: Option<String>,
        /// AAAA-MM-JJ (défaut : fin de l'horizon)
        #[arg(long)]
        to: Option<String>,
    },

    /// Affecter un bloc vendredi + samedi
    AssignBlock {
        /// AAAA-MM-JJ, un vendredi
        #[arg(long)]
        friday: String,
        #[arg(long)]
        department: String,
        #[arg(long)]
        employee: u32,
        #[arg(long)]
        template: Option<String>,
    },

    /// Créer une instance hors gabarit
    AddInstance {
        #[arg(long)]
        date: String,
        #[arg(long)]
        department: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        #[arg(long)]
        employee: u32,
        #[arg(long, default_value = "fixed")]
        kind: String,
    },

    /// Modifier les horaires ou l'employé d'une instance
    EditInstance {
        #[arg(long)]
        instance: String,
        #[arg(long, requires = "end")]
        start: Option<String>,
        #[arg(long, requires = "start")]
        end: Option<String>,
        #[arg(long)]
        employee: Option<u32>,
    },

    /// Supprimer une instance (les deux moitiés d'un bloc)
    DeleteInstance {
        #[arg(long)]
        instance: String,
    },

    /// Enregistrer un remplacement ponctuel
    Except {
        #[arg(long)]
        instance: String,
        #[arg(long)]
        substitute: u32,
        /// défaut : horaires de l'instance
        #[arg(long, requires = "end")]
        start: Option<String>,
        #[arg(long, requires = "start")]
        end: Option<String>,
        #[arg(long, default_value = "")]
        note: String,
    },

    /// Annuler un remplacement
    Unexcept {
        #[arg(long)]
        exception: String,
    },

    /// Demander (ou appliquer avec --now) un échange entre deux instances
    Swap {
        #[arg(long)]
        a: String,
        #[arg(long)]
        b: String,
        #[arg(long, default_value = "")]
        note: String,
        #[arg(long)]
        now: bool,
    },

    /// Approuver un échange en attente
    Approve {
        #[arg(long)]
        swap: String,
    },

    /// Annuler un échange en attente
    CancelSwap {
        #[arg(long)]
        swap: String,
    },

    /// Lister les échanges en attente
    Pending,

    /// Lister le calendrier effectif
    List {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        kind: Option<String>,
        #[arg(long)]
        out_csv: Option<String>,
    },

    /// Statistiques d'heures d'un employé
    Stats {
        #[arg(long)]
        employee: u32,
        #[arg(long)]
        year: i32,
    },
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").with_context(|| format!("invalid date: {raw}"))
}

fn parse_department(raw: &str) -> Result<Department> {
    raw.parse().map_err(anyhow::Error::msg)
}

fn parse_window(start: &str, end: &str) -> Result<TimeWindow> {
    TimeWindow::parse(start, end).map_err(anyhow::Error::msg)
}

fn parse_ids(raw: &str) -> Result<Vec<EmployeeId>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse()
                .map(EmployeeId)
                .with_context(|| format!("invalid employee id: {s}"))
        })
        .collect()
}

/// `7` ou `7@08:00-16:00`
fn parse_assignee(raw: &str) -> Result<Assignee> {
    let (id, window) = match raw.split_once('@') {
        Some((id, window)) => (id, Some(window)),
        None => (raw, None),
    };
    let employee = EmployeeId(
        id.trim()
            .parse()
            .with_context(|| format!("invalid employee id: {id}"))?,
    );
    match window {
        None => Ok(Assignee::new(employee)),
        Some(w) => {
            let (start, end) = w
                .split_once('-')
                .ok_or_else(|| anyhow!("expected HH:MM-HH:MM, got {w}"))?;
            Ok(Assignee::with_window(employee, parse_window(start, end)?))
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let staff = match &cli.staff {
        Some(path) => io::import_staff_csv(path)?,
        None => Vec::new(),
    };
    let storage = JsonStorage::open(&cli.ledger)?;
    let ledger = storage.load_or_default()?;
    let mut scheduler = Scheduler::with_ledger(ledger, StaticDirectory::new(staff))
        .with_options(EngineOptions {
            horizon_days: cli.horizon_days,
        });
    let actor = ActorId(cli.actor);

    let dirty = match cli.cmd {
        Commands::CreateFixed {
            department,
            weekday,
            start,
            end,
            assignees,
        } => {
            let weekday =
                weekday_from_index(weekday).ok_or_else(|| anyhow!("weekday must be 0..=6"))?;
            let assignees = assignees
                .iter()
                .map(|a| parse_assignee(a))
                .collect::<Result<Vec<_>>>()?;
            let id = scheduler.create_fixed_template(
                parse_department(&department)?,
                weekday,
                parse_window(&start, &end)?,
                assignees,
            )?;
            println!("template {id}");
            true
        }
        Commands::CreateSunday {
            department,
            start,
            end,
            rotation,
        } => {
            let id = scheduler.create_sunday_rotation_template(
                parse_department(&department)?,
                chrono::Weekday::Sun,
                parse_window(&start, &end)?,
                parse_ids(&rotation)?,
            )?;
            println!("template {id}");
            true
        }
        Commands::CreateBlock { department } => {
            let id = scheduler.create_rotating_block_template(parse_department(&department)?)?;
            println!("template {id}");
            true
        }
        Commands::DeleteTemplate { template } => {
            let removed = scheduler.delete_template(&TemplateId::new(template))?;
            println!("removed {removed} instance(s)");
            true
        }
        Commands::Templates => {
            for t in scheduler.templates() {
                let members = match &t.rule {
                    TemplateRule::Fixed { assignees } => assignees
                        .iter()
                        .map(|a| a.employee.to_string())
                        .collect::<Vec<_>>()
                        .join(","),
                    TemplateRule::SundayRotation { rotation } => rotation
                        .iter()
                        .map(|e| e.to_string())
                        .collect::<Vec<_>>()
                        .join(","),
                    TemplateRule::RotatingBlock => "-".to_string(),
                };
                println!(
                    "{} | {} | {} | day {} | {} | {}",
                    t.id,
                    t.kind(),
                    t.department,
                    weekday_index(t.weekday),
                    t.window,
                    members
                );
            }
            false
        }
        Commands::Generate { template, from, to } => {
            let id = TemplateId::new(template);
            let report = match (from, to) {
                (None, None) => scheduler.generate_horizon(&id, Local::now().date_naive())?,
                (from, to) => {
                    let from = match from {
                        Some(f) => parse_date(&f)?,
                        None => Local::now().date_naive(),
                    };
                    let to = match to {
                        Some(t) => parse_date(&t)?,
                        None => from + chrono::Duration::days(i64::from(cli.horizon_days)),
                    };
                    scheduler.generate(&id, from, to)?
                }
            };
            println!(
                "created {} instance(s), skipped {}",
                report.created.len(),
                report.skipped
            );
            true
        }
        Commands::AssignBlock {
            friday,
            department,
            employee,
            template,
        } => {
            let template = template.map(TemplateId::new);
            let block = scheduler.assign_rotating_block(
                parse_date(&friday)?,
                parse_department(&department)?,
                EmployeeId(employee),
                template.as_ref(),
            )?;
            if block.created {
                println!("block {} + {}", block.friday, block.saturday);
            } else {
                println!("block already assigned ({} + {})", block.friday, block.saturday);
            }
            block.created
        }
        Commands::AddInstance {
            date,
            department,
            start,
            end,
            employee,
            kind,
        } => {
            let kind: DutyKind = kind.parse().map_err(anyhow::Error::msg)?;
            let id = scheduler.create_manual_instance(
                parse_date(&date)?,
                parse_department(&department)?,
                parse_window(&start, &end)?,
                EmployeeId(employee),
                kind,
            )?;
            println!("instance {id}");
            true
        }
        Commands::EditInstance {
            instance,
            start,
            end,
            employee,
        } => {
            let window = match (start, end) {
                (Some(s), Some(e)) => Some(parse_window(&s, &e)?),
                _ => None,
            };
            scheduler.update_instance(&InstanceId::new(instance), window, employee.map(EmployeeId))?;
            true
        }
        Commands::DeleteInstance { instance } => {
            let removed = scheduler.delete_instance(&InstanceId::new(instance))?;
            println!("removed {} instance(s)", removed.len());
            true
        }
        Commands::Except {
            instance,
            substitute,
            start,
            end,
            note,
        } => {
            let id = InstanceId::new(instance);
            let current = scheduler
                .ledger()
                .instance(&id)
                .cloned()
                .ok_or_else(|| anyhow!("unknown instance: {id}"))?;
            let window = match (start, end) {
                (Some(s), Some(e)) => parse_window(&s, &e)?,
                _ => current.window,
            };
            let exception = scheduler.create_exception(
                ExceptionRequest {
                    instance: id,
                    date: current.date,
                    department: current.department,
                    window,
                    substitute: EmployeeId(substitute),
                    note,
                },
                actor,
            )?;
            println!("exception {exception}");
            true
        }
        Commands::Unexcept { exception } => {
            if scheduler.delete_exception(&ExceptionId::new(exception))? {
                println!("exception deactivated");
                true
            } else {
                println!("exception already inactive");
                false
            }
        }
        Commands::Swap { a, b, note, now } => {
            let a = InstanceId::new(a);
            let b = InstanceId::new(b);
            let id = if now {
                scheduler.immediate_swap(&a, &b, &note, actor)?
            } else {
                scheduler.create_swap(&a, &b, &note, actor)?
            };
            println!("swap {id}");
            true
        }
        Commands::Approve { swap } => {
            scheduler.approve_swap(&SwapId::new(swap))?;
            true
        }
        Commands::CancelSwap { swap } => {
            scheduler.cancel_swap(&SwapId::new(swap))?;
            true
        }
        Commands::Pending => {
            for s in scheduler.pending_swaps() {
                println!(
                    "{} | {} ({}) <-> {} ({}) | {}",
                    s.id,
                    s.instance_a,
                    s.original_employee_a,
                    s.instance_b,
                    s.original_employee_b,
                    s.note
                );
            }
            false
        }
        Commands::List {
            from,
            to,
            department,
            kind,
            out_csv,
        } => {
            let department = department.as_deref().map(parse_department).transpose()?;
            let kind = kind
                .as_deref()
                .map(|k| k.parse::<DutyKind>().map_err(anyhow::Error::msg))
                .transpose()?;
            let calendar =
                scheduler.list_instances(parse_date(&from)?, parse_date(&to)?, department, kind);
            if let Some(path) = out_csv {
                io::export_calendar_csv(path, &calendar)?;
            }
            // impression compacte
            for (month, shifts) in &calendar {
                println!("== {:04}-{:02}", month.year, month.month);
                for s in shifts {
                    let name = io::staff_name(scheduler.directory().staff(), s.employee)
                        .unwrap_or("-");
                    let marker = if s.exception.is_some() { " (remplacement)" } else { "" };
                    println!(
                        "{} | {} | {} | {} | {} | {} {}{}",
                        s.instance, s.date, s.department, s.kind, s.window, s.employee, name, marker
                    );
                }
            }
            false
        }
        Commands::Stats { employee, year } => {
            let id = EmployeeId(employee);
            let stats = scheduler.employee_statistics(id, year);
            let name = io::staff_name(scheduler.directory().staff(), id);
            print!("{}", io::format_statistics(&stats, name));
            false
        }
    };

    if dirty {
        storage.save(scheduler.ledger())?;
    }
    Ok(())
}
